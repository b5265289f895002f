//! Representation-agnostic event messages.
//!
//! A [`Message`] is one event in exactly one of three representations:
//!
//! | Variant      | Carries                                  | Produced by                |
//! |--------------|------------------------------------------|----------------------------|
//! | `Structured` | a [`Format`] plus encoded bytes          | structured-mode transports |
//! | `Binary`     | a one-shot [`BinaryReader`]              | binary-mode transports     |
//! | `Event`      | a decoded [`Event`]                      | in-process producers       |
//!
//! Messages are consumed by reading them. Reading a representation the
//! message does not have fails with
//! [`BindingError::UnsupportedEncoding`]; the `into_*` helpers convert
//! instead.
//!
//! [`Format`]: crate::format::Format
//!
//! # Example
//!
//! ```rust
//! use prism_core::event::Event;
//! use prism_core::format;
//! use prism_core::message::{Encoding, Message};
//!
//! let event = Event::builder().id("aaa").source("/s").ty("t").build().unwrap();
//! let message = Message::from(event.clone());
//! assert_eq!(message.encoding(), Encoding::Event);
//!
//! let structured = message.into_structured(&format::json()).unwrap();
//! assert_eq!(structured.encoding(), Encoding::Structured);
//! assert_eq!(structured.into_event().unwrap(), event);
//! ```

mod binary;
mod structured;
mod writer;

use std::fmt;
use std::sync::Arc;

use tracing::trace;

use crate::error::{BindingError, BindingResult};
use crate::event::Event;
use crate::format::BoxedFormat;

pub use binary::{BinaryMessage, BinaryReader, BinaryVisitor, replay_event};
pub use structured::StructuredMessage;
pub use writer::EventWriter;

// ============================================================================
// Encoding
// ============================================================================

/// The representation a [`Message`] currently has.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Encoding {
    Structured,
    Binary,
    Event,
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Encoding::Structured => "structured",
            Encoding::Binary => "binary",
            Encoding::Event => "event",
        };
        f.write_str(name)
    }
}

// ============================================================================
// Event Message
// ============================================================================

/// A message that already holds a decoded event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventMessage(Event);

impl EventMessage {
    /// Returns the event.
    pub fn event(&self) -> &Event {
        &self.0
    }

    /// Returns the event mutably.
    pub fn event_mut(&mut self) -> &mut Event {
        &mut self.0
    }

    /// Consumes the message, returning the event.
    pub fn into_event(self) -> Event {
        self.0
    }
}

impl From<Event> for EventMessage {
    fn from(event: Event) -> Self {
        Self(event)
    }
}

// ============================================================================
// Message
// ============================================================================

/// One event in one of three representations.
pub enum Message {
    Structured(StructuredMessage),
    Binary(BinaryMessage),
    Event(EventMessage),
}

impl Message {
    /// Returns the current representation.
    pub fn encoding(&self) -> Encoding {
        match self {
            Message::Structured(_) => Encoding::Structured,
            Message::Binary(_) => Encoding::Binary,
            Message::Event(_) => Encoding::Event,
        }
    }

    /// Returns the format and encoded bytes of a structured message.
    pub fn read_structured(self) -> BindingResult<(BoxedFormat, Vec<u8>)> {
        match self {
            Message::Structured(message) => Ok(message.into_parts()),
            other => Err(BindingError::unsupported(Encoding::Structured, other.encoding())),
        }
    }

    /// Pushes the observations of a binary or event message into `visitor`.
    ///
    /// Event messages are replayed; structured messages are rejected
    /// because reading them requires decoding.
    pub fn read_binary(self, visitor: &mut dyn BinaryVisitor) -> BindingResult<()> {
        match self {
            Message::Binary(message) => message.read_binary(visitor),
            Message::Event(message) => replay_event(message.into_event(), visitor),
            Message::Structured(_) => Err(BindingError::unsupported(
                Encoding::Binary,
                Encoding::Structured,
            )),
        }
    }

    /// Returns the event of an event message.
    pub fn read_event(self) -> BindingResult<Event> {
        match self {
            Message::Event(message) => Ok(message.into_event()),
            other => Err(BindingError::unsupported(Encoding::Event, other.encoding())),
        }
    }

    /// Converts any message into a decoded event.
    ///
    /// Event messages are returned as is. Structured messages are decoded
    /// with their format, binary messages are replayed into an
    /// [`EventWriter`].
    pub fn into_event(self) -> BindingResult<Event> {
        match self {
            Message::Event(message) => Ok(message.into_event()),
            Message::Structured(message) => message.into_event(),
            Message::Binary(message) => {
                let mut writer = EventWriter::new();
                message.read_binary(&mut writer)?;
                writer.finish()
            }
        }
    }

    /// Converts any message into a structured message of the given format.
    ///
    /// Structured messages with the same media type pass through unchanged.
    pub fn into_structured(self, format: &BoxedFormat) -> BindingResult<Message> {
        if let Message::Structured(message) = &self {
            if message.format().media_type() == format.media_type() {
                trace!(media_type = format.media_type(), "Structured message passes through");
                return Ok(self);
            }
        }
        let event = self.into_event()?;
        let message = StructuredMessage::from_event(Arc::clone(format), &event)?;
        Ok(Message::Structured(message))
    }
}

impl From<Event> for Message {
    fn from(event: Event) -> Self {
        Message::Event(EventMessage(event))
    }
}

impl From<EventMessage> for Message {
    fn from(message: EventMessage) -> Self {
        Message::Event(message)
    }
}

impl From<StructuredMessage> for Message {
    fn from(message: StructuredMessage) -> Self {
        Message::Structured(message)
    }
}

impl From<BinaryMessage> for Message {
    fn from(message: BinaryMessage) -> Self {
        Message::Binary(message)
    }
}

impl fmt::Debug for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Message::Structured(message) => f.debug_tuple("Structured").field(message).finish(),
            Message::Binary(message) => f.debug_tuple("Binary").field(message).finish(),
            Message::Event(message) => f.debug_tuple("Event").field(message).finish(),
        }
    }
}
