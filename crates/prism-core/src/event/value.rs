//! Typed attribute and extension values.

use std::fmt;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{BindingError, BindingResult};

// ============================================================================
// Value Kind
// ============================================================================

/// The type system of context attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ValueKind {
    Boolean,
    Integer,
    String,
    Binary,
    Uri,
    UriRef,
    Timestamp,
}

impl ValueKind {
    /// Returns true for kinds stored as text (`String`, `Uri`, `UriRef`).
    pub fn is_textual(self) -> bool {
        matches!(self, ValueKind::String | ValueKind::Uri | ValueKind::UriRef)
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueKind::Boolean => "Boolean",
            ValueKind::Integer => "Integer",
            ValueKind::String => "String",
            ValueKind::Binary => "Binary",
            ValueKind::Uri => "URI",
            ValueKind::UriRef => "URI-reference",
            ValueKind::Timestamp => "Timestamp",
        };
        f.write_str(name)
    }
}

// ============================================================================
// Value
// ============================================================================

/// A single attribute or extension value.
///
/// Every value has a canonical string form (see the `Display` impl), which
/// is what binary-mode transports put on the wire, and can be recovered from
/// it with [`Value::parse`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Value {
    Boolean(bool),
    Integer(i32),
    String(String),
    Binary(Vec<u8>),
    /// An absolute URI.
    Uri(String),
    /// A URI reference, possibly relative.
    UriRef(String),
    Timestamp(DateTime<Utc>),
}

impl Value {
    /// Creates an absolute URI value.
    pub fn uri(uri: impl Into<String>) -> Self {
        Value::Uri(uri.into())
    }

    /// Creates a URI reference value.
    pub fn uri_ref(uri: impl Into<String>) -> Self {
        Value::UriRef(uri.into())
    }

    /// Returns the runtime kind of this value.
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Boolean(_) => ValueKind::Boolean,
            Value::Integer(_) => ValueKind::Integer,
            Value::String(_) => ValueKind::String,
            Value::Binary(_) => ValueKind::Binary,
            Value::Uri(_) => ValueKind::Uri,
            Value::UriRef(_) => ValueKind::UriRef,
            Value::Timestamp(_) => ValueKind::Timestamp,
        }
    }

    /// Returns the text of `String`, `Uri` and `UriRef` values.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) | Value::Uri(s) | Value::UriRef(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the timestamp of a `Timestamp` value.
    pub fn as_timestamp(&self) -> Option<&DateTime<Utc>> {
        match self {
            Value::Timestamp(t) => Some(t),
            _ => None,
        }
    }

    /// Returns the form this value takes when stored as an extension.
    ///
    /// Extensions hold `Boolean`, `Integer` and `String` values; any other
    /// kind is kept in its canonical string form, which is what structured
    /// and binary encodings carry for extensions.
    pub fn into_extension(self) -> Value {
        match self {
            Value::Boolean(_) | Value::Integer(_) | Value::String(_) => self,
            other => Value::String(other.to_string()),
        }
    }

    /// Parses the canonical string form of a value of the given kind.
    pub fn parse(kind: ValueKind, input: &str) -> BindingResult<Value> {
        let invalid = |reason: &dyn fmt::Display| BindingError::InvalidValue {
            kind,
            input: input.to_string(),
            reason: reason.to_string(),
        };

        match kind {
            ValueKind::Boolean => match input {
                "true" => Ok(Value::Boolean(true)),
                "false" => Ok(Value::Boolean(false)),
                _ => Err(invalid(&"expected 'true' or 'false'")),
            },
            ValueKind::Integer => input
                .parse::<i32>()
                .map(Value::Integer)
                .map_err(|e| invalid(&e)),
            ValueKind::String => Ok(Value::String(input.to_string())),
            ValueKind::Binary => BASE64
                .decode(input)
                .map(Value::Binary)
                .map_err(|e| invalid(&e)),
            ValueKind::Uri => {
                if has_scheme(input) {
                    Ok(Value::Uri(input.to_string()))
                } else {
                    Err(invalid(&"missing URI scheme"))
                }
            }
            ValueKind::UriRef => {
                if input.is_empty() {
                    Err(invalid(&"empty URI reference"))
                } else {
                    Ok(Value::UriRef(input.to_string()))
                }
            }
            ValueKind::Timestamp => DateTime::parse_from_rfc3339(input)
                .map(|t| Value::Timestamp(t.with_timezone(&Utc)))
                .map_err(|e| invalid(&e)),
        }
    }

    /// Converts this value to another kind without going through its string
    /// form.
    ///
    /// Only conversions between the textual kinds are supported; converting
    /// to `Uri` still requires a scheme.
    pub fn coerce(self, kind: ValueKind) -> BindingResult<Value> {
        if self.kind() == kind {
            return Ok(self);
        }
        let actual = self.kind();
        match self {
            Value::String(s) | Value::Uri(s) | Value::UriRef(s) if kind.is_textual() => {
                Value::parse(kind, &s)
            }
            _ => Err(BindingError::invalid_value_kind(kind.to_string(), kind, actual)),
        }
    }
}

/// Returns whether `input` starts with an RFC 3986 scheme followed by `:`.
fn has_scheme(input: &str) -> bool {
    let Some((scheme, _)) = input.split_once(':') else {
        return false;
    };
    let mut chars = scheme.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Boolean(b) => write!(f, "{b}"),
            Value::Integer(i) => write!(f, "{i}"),
            Value::String(s) | Value::Uri(s) | Value::UriRef(s) => f.write_str(s),
            Value::Binary(bytes) => f.write_str(&BASE64.encode(bytes)),
            Value::Timestamp(t) => f.write_str(&t.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Boolean(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Integer(value)
    }
}

impl From<Vec<u8>> for Value {
    fn from(value: Vec<u8>) -> Self {
        Value::Binary(value)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(value: DateTime<Utc>) -> Self {
        Value::Timestamp(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_string_round_trip() {
        let time = DateTime::parse_from_rfc3339("2020-03-21T12:34:56.780Z")
            .unwrap()
            .with_timezone(&Utc);
        let values = [
            Value::Boolean(true),
            Value::Integer(-42),
            Value::from("hello"),
            Value::Binary(vec![0, 159, 146, 150]),
            Value::uri("https://example.com/schema"),
            Value::uri_ref("/relative"),
            Value::Timestamp(time),
        ];

        for value in values {
            let parsed = Value::parse(value.kind(), &value.to_string()).unwrap();
            assert_eq!(parsed, value);
        }
    }

    #[test]
    fn test_timestamp_keeps_subsecond_precision() {
        let time = Utc::now();
        let text = Value::Timestamp(time).to_string();
        assert_eq!(Value::parse(ValueKind::Timestamp, &text).unwrap(), Value::Timestamp(time));
    }

    #[test]
    fn test_uri_requires_scheme() {
        assert!(Value::parse(ValueKind::Uri, "/relative/path").is_err());
        assert!(Value::parse(ValueKind::Uri, "urn:example:1").is_ok());
        assert!(Value::parse(ValueKind::UriRef, "/relative/path").is_ok());
    }

    #[test]
    fn test_coerce_between_textual_kinds() {
        let value = Value::uri_ref("http://example.com");
        assert_eq!(
            value.clone().coerce(ValueKind::Uri).unwrap(),
            Value::uri("http://example.com")
        );
        assert!(Value::uri_ref("relative").coerce(ValueKind::Uri).is_err());
        assert!(matches!(
            Value::Integer(1).coerce(ValueKind::String),
            Err(BindingError::InvalidValueKind { .. })
        ));
    }

    #[test]
    fn test_invalid_boolean() {
        let err = Value::parse(ValueKind::Boolean, "yes").unwrap_err();
        assert!(matches!(err, BindingError::InvalidValue { kind: ValueKind::Boolean, .. }));
    }
}
