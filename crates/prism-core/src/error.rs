//! Unified error types for the Prism binding core.
//!
//! Every failure raised while reading, converting or transforming a message is
//! a [`BindingError`]. All of them are terminal for the message being
//! processed: nothing in this crate retries.

use thiserror::Error;

use crate::event::ValueKind;
use crate::message::Encoding;

// =============================================================================
// Binding Errors
// =============================================================================

/// Errors that can occur while handling event messages.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BindingError {
    /// A value's runtime kind does not match the attribute's declared kind.
    #[error("attribute '{attribute}' expects a {expected} value, got {actual}")]
    InvalidValueKind {
        /// The attribute being written.
        attribute: String,
        /// The kind declared by the attribute spec.
        expected: ValueKind,
        /// The kind of the supplied value.
        actual: ValueKind,
    },

    /// An extension name collides with a reserved attribute name.
    #[error("extension name '{name}' is reserved")]
    ReservedName {
        /// The rejected extension name.
        name: String,
    },

    /// An extension name contains characters outside `[a-z0-9]`.
    #[error("invalid extension name '{name}': only lowercase ASCII letters and digits are allowed")]
    InvalidExtensionName {
        /// The rejected extension name.
        name: String,
    },

    /// The wrong read method was invoked for a message variant.
    #[error("cannot read {requested} from a {actual} message")]
    UnsupportedEncoding {
        /// The representation the caller asked for.
        requested: Encoding,
        /// The representation the message actually has.
        actual: Encoding,
    },

    /// Structured bytes could not be decoded.
    #[error("failed to decode {media_type} event: {reason} (input starts with {excerpt:?})")]
    DecodeError {
        /// Media type of the structured format.
        media_type: String,
        /// What went wrong.
        reason: String,
        /// A lossy prefix of the offending bytes, for diagnostics.
        excerpt: String,
    },

    /// An event could not be encoded into a structured format.
    #[error("failed to encode {media_type} event: {reason}")]
    EncodeError {
        /// Media type of the structured format.
        media_type: String,
        /// What went wrong.
        reason: String,
    },

    /// A binary writer rejected a mutated observation.
    #[error("binary writer rejected '{name}': {source}")]
    WriteError {
        /// The attribute or extension being written.
        name: String,
        /// The writer's own error.
        #[source]
        source: Box<BindingError>,
    },

    /// A version conversion would lose a required attribute.
    #[error(
        "attribute '{attribute}' is required but cannot be represented in spec version {version}"
    )]
    Unrepresentable {
        /// Name of the attribute in the source version.
        attribute: String,
        /// The target spec version.
        version: String,
    },

    /// The attribute does not exist in the context's spec version.
    #[error("attribute '{attribute}' is not defined in spec version {version}")]
    UnknownAttribute {
        /// The attribute name or kind.
        attribute: String,
        /// The spec version that was searched.
        version: String,
    },

    /// The attribute cannot be written directly.
    #[error("attribute '{attribute}' is read-only")]
    ReadOnlyAttribute {
        /// Name of the attribute.
        attribute: String,
    },

    /// A required attribute cannot be removed.
    #[error("attribute '{attribute}' is required and cannot be removed")]
    RequiredAttribute {
        /// Name of the attribute.
        attribute: String,
    },

    /// A required attribute is absent.
    #[error("required attribute '{attribute}' is missing")]
    MissingRequired {
        /// Name of the attribute.
        attribute: String,
    },

    /// The spec version is not registered.
    #[error("unknown spec version '{0}'")]
    UnknownSpecVersion(String),

    /// A binary observation sequence did not start with `specversion`.
    #[error("binary observations must start with 'specversion', got '{first}'")]
    MissingSpecVersion {
        /// The first observed name.
        first: String,
    },

    /// A string could not be parsed into the requested value kind.
    #[error("cannot parse {input:?} as {kind}: {reason}")]
    InvalidValue {
        /// The target kind.
        kind: ValueKind,
        /// The raw input.
        input: String,
        /// Why parsing failed.
        reason: String,
    },
}

impl BindingError {
    /// Creates an invalid value kind error.
    pub fn invalid_value_kind(
        attribute: impl Into<String>,
        expected: ValueKind,
        actual: ValueKind,
    ) -> Self {
        Self::InvalidValueKind {
            attribute: attribute.into(),
            expected,
            actual,
        }
    }

    /// Creates an unsupported encoding error.
    pub fn unsupported(requested: Encoding, actual: Encoding) -> Self {
        Self::UnsupportedEncoding { requested, actual }
    }

    /// Creates a decode error, keeping a short prefix of the input.
    pub fn decode(media_type: impl Into<String>, reason: impl ToString, input: &[u8]) -> Self {
        const EXCERPT_LEN: usize = 64;
        let end = input.len().min(EXCERPT_LEN);
        Self::DecodeError {
            media_type: media_type.into(),
            reason: reason.to_string(),
            excerpt: String::from_utf8_lossy(&input[..end]).into_owned(),
        }
    }

    /// Creates an encode error.
    pub fn encode(media_type: impl Into<String>, reason: impl ToString) -> Self {
        Self::EncodeError {
            media_type: media_type.into(),
            reason: reason.to_string(),
        }
    }

    /// Wraps a writer failure for the binary path.
    ///
    /// Errors that already are write errors are returned unchanged so that
    /// stacked interceptors do not nest them.
    pub fn write(name: impl Into<String>, source: BindingError) -> Self {
        match source {
            err @ Self::WriteError { .. } => err,
            other => Self::WriteError {
                name: name.into(),
                source: Box::new(other),
            },
        }
    }

    /// Creates an unknown attribute error.
    pub fn unknown_attribute(attribute: impl Into<String>, version: impl ToString) -> Self {
        Self::UnknownAttribute {
            attribute: attribute.into(),
            version: version.to_string(),
        }
    }
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for binding operations.
pub type BindingResult<T> = Result<T, BindingError>;
