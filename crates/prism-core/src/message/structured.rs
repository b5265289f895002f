use std::fmt;

use crate::error::BindingResult;
use crate::event::Event;
use crate::format::BoxedFormat;

/// A message whose whole event is one encoded document.
///
/// Construction never decodes; malformed bytes surface only when the
/// message is converted to an [`Event`].
#[derive(Clone)]
pub struct StructuredMessage {
    format: BoxedFormat,
    bytes: Vec<u8>,
}

impl StructuredMessage {
    /// Wraps encoded bytes together with their format.
    pub fn new(format: BoxedFormat, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            format,
            bytes: bytes.into(),
        }
    }

    /// Encodes an event with the given format.
    pub fn from_event(format: BoxedFormat, event: &Event) -> BindingResult<Self> {
        let bytes = format.marshal(event)?;
        Ok(Self { format, bytes })
    }

    /// Returns the format.
    pub fn format(&self) -> &BoxedFormat {
        &self.format
    }

    /// Returns the encoded bytes.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Consumes the message, returning its format and bytes.
    pub fn into_parts(self) -> (BoxedFormat, Vec<u8>) {
        (self.format, self.bytes)
    }

    /// Decodes the message.
    pub fn into_event(self) -> BindingResult<Event> {
        self.format.unmarshal(&self.bytes)
    }
}

impl fmt::Debug for StructuredMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StructuredMessage")
            .field("media_type", &self.format.media_type())
            .field("len", &self.bytes.len())
            .finish()
    }
}
