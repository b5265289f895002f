//! Message transformers.
//!
//! A [`Transformer`] mutates the context of an event. It works on two paths:
//!
//! - **event path**: [`Transformer::transform_event`] edits a decoded event
//!   in place;
//! - **binary path**: [`Transformer::transform_binary`] wraps the downstream
//!   visitor in an interceptor that rewrites observations as they stream by,
//!   so the payload is never decoded.
//!
//! [`apply`] picks the path from the message's representation. Structured
//! messages are decoded first and come back as event messages.
//!
//! # Example
//!
//! ```rust
//! use prism_core::event::Event;
//! use prism_core::message::Message;
//! use prism_core::spec::AttributeKind;
//! use prism_core::transformer::{self, Transformers};
//!
//! let transformers = Transformers::new()
//!     .with(transformer::add_attribute(AttributeKind::Subject, "orders"))
//!     .with(transformer::add_extension("tenant", "acme"));
//!
//! let event = Event::builder().id("aaa").source("/s").ty("t").build().unwrap();
//! let event = transformers.apply(Message::from(event)).unwrap().into_event().unwrap();
//!
//! assert_eq!(event.subject(), Some("orders"));
//! assert_eq!(event.extension("tenant").and_then(|v| v.as_str()), Some("acme"));
//! ```

mod metadata;
mod version;

use std::fmt::Debug;
use std::sync::Arc;

use tracing::{debug, trace};

use crate::error::BindingResult;
use crate::event::Event;
use crate::message::{BinaryMessage, BinaryReader, BinaryVisitor, EventMessage, Message};

pub use metadata::{
    add_attribute, add_extension, delete_attribute, delete_extension, set_attribute, set_extension,
};
pub use version::{VersionTransformer, version};

// ============================================================================
// Transformer Trait
// ============================================================================

/// A mutation of an event's context, applicable to every representation.
pub trait Transformer: Send + Sync + Debug {
    /// Mutates a decoded event in place.
    fn transform_event(&self, event: &mut Event) -> BindingResult<()>;

    /// Wraps `next` in a visitor that applies this transformation to the
    /// observations passing through it.
    fn transform_binary<'a>(
        &'a self,
        next: &'a mut dyn BinaryVisitor,
    ) -> Box<dyn BinaryVisitor + 'a>;
}

/// A shareable transformer trait object.
pub type BoxedTransformer = Arc<dyn Transformer>;

/// Applies one transformer to a message.
///
/// Event messages are mutated directly. Structured messages are decoded and
/// returned as event messages. Binary messages are wrapped lazily; mutation
/// errors surface as [`BindingError::WriteError`](crate::BindingError::WriteError)
/// when the returned message is read.
pub fn apply(transformer: &BoxedTransformer, message: Message) -> BindingResult<Message> {
    match message {
        Message::Event(mut message) => {
            transformer.transform_event(message.event_mut())?;
            Ok(Message::Event(message))
        }
        Message::Structured(message) => {
            debug!(
                media_type = message.format().media_type(),
                transformer = ?transformer,
                "Decoding structured message to apply transformer"
            );
            let mut event = message.into_event()?;
            transformer.transform_event(&mut event)?;
            Ok(Message::Event(EventMessage::from(event)))
        }
        Message::Binary(source) => {
            trace!(transformer = ?transformer, "Wrapping binary message");
            Ok(Message::Binary(BinaryMessage::new(TransformedBinary {
                source,
                transformer: Arc::clone(transformer),
            })))
        }
    }
}

/// A binary message read through a transformer's interceptor.
struct TransformedBinary {
    source: BinaryMessage,
    transformer: BoxedTransformer,
}

impl BinaryReader for TransformedBinary {
    fn read_binary(self: Box<Self>, visitor: &mut dyn BinaryVisitor) -> BindingResult<()> {
        let TransformedBinary { source, transformer } = *self;
        let mut interceptor = transformer.transform_binary(visitor);
        source.read_binary(interceptor.as_mut())
    }
}

// ============================================================================
// Transformer Chain
// ============================================================================

/// An ordered, cloneable sequence of transformers.
#[derive(Debug, Clone, Default)]
pub struct Transformers(Vec<BoxedTransformer>);

impl Transformers {
    /// Creates an empty sequence.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a transformer.
    pub fn push(&mut self, transformer: BoxedTransformer) {
        self.0.push(transformer);
    }

    /// Appends a transformer, builder style.
    pub fn with(mut self, transformer: BoxedTransformer) -> Self {
        self.push(transformer);
        self
    }

    /// Returns the number of transformers.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns whether the sequence is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over the transformers in application order.
    pub fn iter(&self) -> impl Iterator<Item = &BoxedTransformer> {
        self.0.iter()
    }

    /// Applies every transformer in order, stopping at the first error.
    pub fn apply(&self, message: Message) -> BindingResult<Message> {
        self.0
            .iter()
            .try_fold(message, |message, transformer| apply(transformer, message))
    }

    /// Applies every transformer to a decoded event, stopping at the first error.
    pub fn transform_event(&self, event: &mut Event) -> BindingResult<()> {
        self.0
            .iter()
            .try_for_each(|transformer| transformer.transform_event(event))
    }
}

impl FromIterator<BoxedTransformer> for Transformers {
    fn from_iter<I: IntoIterator<Item = BoxedTransformer>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl From<Vec<BoxedTransformer>> for Transformers {
    fn from(transformers: Vec<BoxedTransformer>) -> Self {
        Self(transformers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BindingError;
    use crate::format;
    use crate::message::{Encoding, EventWriter, StructuredMessage};
    use crate::spec::AttributeKind;

    fn event() -> Event {
        Event::builder()
            .id("aaa")
            .source("/source")
            .ty("t")
            .data("application/json", r#"{"n":1}"#)
            .build()
            .unwrap()
    }

    #[test]
    fn test_apply_keeps_binary_representation() {
        let transformer = add_attribute(AttributeKind::Subject, "sub");
        let message = apply(&transformer, Message::from(BinaryMessage::new(event()))).unwrap();
        assert_eq!(message.encoding(), Encoding::Binary);

        let mut writer = EventWriter::new();
        message.read_binary(&mut writer).unwrap();
        let result = writer.finish().unwrap();
        assert_eq!(result.subject(), Some("sub"));
        assert_eq!(result.data(), event().data());
    }

    #[test]
    fn test_apply_decodes_structured() {
        let transformer = add_extension("tenant", "acme");
        let message = StructuredMessage::from_event(format::json(), &event()).unwrap();
        let message = apply(&transformer, Message::from(message)).unwrap();
        assert_eq!(message.encoding(), Encoding::Event);
        assert!(message.read_event().unwrap().extension("tenant").is_some());
    }

    #[test]
    fn test_chain_stops_at_first_error() {
        let chain = Transformers::new()
            .with(add_extension("data", "reserved"))
            .with(add_attribute(AttributeKind::Subject, "sub"));
        assert_eq!(chain.len(), 2);

        let err = chain.apply(Message::from(event())).unwrap_err();
        assert!(matches!(err, BindingError::ReservedName { name } if name == "data"));
    }

    #[test]
    fn test_chain_transform_event() {
        let chain: Transformers = vec![
            add_attribute(AttributeKind::Subject, "first"),
            add_attribute(AttributeKind::Subject, "second"),
        ]
        .into();
        let mut event = event();
        chain.transform_event(&mut event).unwrap();
        assert_eq!(event.subject(), Some("first"));
    }
}
