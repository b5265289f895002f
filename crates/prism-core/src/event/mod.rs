//! The decoded event model.
//!
//! - [`Value`] / [`ValueKind`] - Typed attribute and extension values
//! - [`Context`] - Versioned attributes plus extensions
//! - [`Event`] - A context plus an optional payload
//! - [`EventBuilder`] - Convenient construction of valid events
//!
//! An [`Event`] dereferences to its [`Context`], so attribute accessors can
//! be called on it directly:
//!
//! ```rust
//! use prism_core::event::Event;
//! use prism_core::spec::AttributeKind;
//!
//! let mut event = Event::builder()
//!     .id("aaa")
//!     .source("/sensors/1")
//!     .ty("com.example.reading")
//!     .build()
//!     .unwrap();
//!
//! event.set(AttributeKind::Subject, "temperature").unwrap();
//! assert_eq!(event.subject(), Some("temperature"));
//! ```

mod builder;
mod context;
mod value;

use std::ops::{Deref, DerefMut};

use tracing::warn;

use crate::spec::{AttributeKind, SpecVersion};

pub use builder::EventBuilder;
pub use context::Context;
pub(crate) use context::validate_extension_name;
pub use value::{Value, ValueKind};

// ============================================================================
// Event
// ============================================================================

/// A decoded event: a versioned context plus an optional payload.
///
/// The payload is opaque bytes; its content type is the context's
/// `datacontenttype` attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    context: Context,
    data: Option<Vec<u8>>,
}

impl Event {
    /// Creates an event with an empty context of the given version.
    pub fn new(version: SpecVersion) -> Self {
        Self {
            context: Context::new(version),
            data: None,
        }
    }

    /// Creates an event from an existing context and payload.
    pub fn from_parts(context: Context, data: Option<Vec<u8>>) -> Self {
        Self { context, data }
    }

    /// Starts building a 1.0 event.
    pub fn builder() -> EventBuilder {
        EventBuilder::new(SpecVersion::V10)
    }

    /// Returns the context.
    pub fn context(&self) -> &Context {
        &self.context
    }

    /// Returns the context mutably.
    pub fn context_mut(&mut self) -> &mut Context {
        &mut self.context
    }

    /// Returns the payload bytes, if any.
    pub fn data(&self) -> Option<&[u8]> {
        self.data.as_deref()
    }

    /// Replaces the payload and its content type.
    ///
    /// Passing `None` as content type leaves `datacontenttype` untouched.
    pub fn set_data(&mut self, content_type: Option<&str>, data: impl Into<Vec<u8>>) {
        if let Some(content_type) = content_type {
            if let Err(e) = self.context.set(AttributeKind::DataContentType, content_type) {
                warn!(error = %e, "Payload content type not recorded");
            }
        }
        self.data = Some(data.into());
    }

    /// Removes and returns the payload.
    pub fn take_data(&mut self) -> Option<Vec<u8>> {
        self.data.take()
    }

    /// Consumes the event, returning its context and payload.
    pub fn into_parts(self) -> (Context, Option<Vec<u8>>) {
        (self.context, self.data)
    }

    /// Converts the event to another spec version.
    ///
    /// See [`Context::as_version`].
    pub fn into_version(self, version: SpecVersion) -> crate::BindingResult<Event> {
        let context = self.context.as_version(version)?;
        Ok(Self {
            context,
            data: self.data,
        })
    }
}

impl Deref for Event {
    type Target = Context;

    fn deref(&self) -> &Self::Target {
        &self.context
    }
}

impl DerefMut for Event {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.context
    }
}
