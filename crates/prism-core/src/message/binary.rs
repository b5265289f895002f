//! Binary-mode messages: push-style attribute observations.

use std::fmt;

use crate::error::BindingResult;
use crate::event::{Event, Value};
use crate::spec::{AttributeKind, AttributeSpec};

// ============================================================================
// Visitor
// ============================================================================

/// Receives the observations of a binary-mode message.
///
/// Readers call [`observe`](Self::observe) for every populated attribute,
/// `specversion` first, then [`observe_extension`](Self::observe_extension)
/// for every extension, then [`observe_payload`](Self::observe_payload)
/// exactly once. Returning an error stops the read.
pub trait BinaryVisitor {
    /// Observes one context attribute.
    fn observe(&mut self, attribute: &AttributeSpec, value: Value) -> BindingResult<()>;

    /// Observes one extension.
    fn observe_extension(&mut self, name: &str, value: Value) -> BindingResult<()>;

    /// Observes the payload together with its content type.
    ///
    /// This is always the last observation.
    fn observe_payload(
        &mut self,
        data: Option<Vec<u8>>,
        content_type: Option<&str>,
    ) -> BindingResult<()>;
}

impl<V: BinaryVisitor + ?Sized> BinaryVisitor for &mut V {
    fn observe(&mut self, attribute: &AttributeSpec, value: Value) -> BindingResult<()> {
        (**self).observe(attribute, value)
    }

    fn observe_extension(&mut self, name: &str, value: Value) -> BindingResult<()> {
        (**self).observe_extension(name, value)
    }

    fn observe_payload(
        &mut self,
        data: Option<Vec<u8>>,
        content_type: Option<&str>,
    ) -> BindingResult<()> {
        (**self).observe_payload(data, content_type)
    }
}

// ============================================================================
// Reader
// ============================================================================

/// A source of binary-mode observations.
///
/// Transports implement this over their native representation (headers plus
/// body). Reading consumes the reader, so a message can be read only once.
pub trait BinaryReader: Send {
    /// Pushes every observation of the message into `visitor`.
    fn read_binary(self: Box<Self>, visitor: &mut dyn BinaryVisitor) -> BindingResult<()>;
}

impl BinaryReader for Event {
    fn read_binary(self: Box<Self>, visitor: &mut dyn BinaryVisitor) -> BindingResult<()> {
        replay_event(*self, visitor)
    }
}

/// Replays a decoded event as binary observations.
///
/// The content type handed to `observe_payload` is the event's
/// `datacontenttype`, which has also been observed as an attribute.
pub fn replay_event(event: Event, visitor: &mut dyn BinaryVisitor) -> BindingResult<()> {
    let (context, data) = event.into_parts();
    for (spec, value) in context.attributes() {
        visitor.observe(spec, value.clone())?;
    }
    for (name, value) in context.extensions() {
        visitor.observe_extension(name, value.clone())?;
    }
    let content_type = context
        .get(AttributeKind::DataContentType)
        .and_then(Value::as_str);
    visitor.observe_payload(data, content_type)
}

// ============================================================================
// Message
// ============================================================================

/// A message whose context travels as separate attributes.
pub struct BinaryMessage {
    reader: Box<dyn BinaryReader>,
}

impl BinaryMessage {
    /// Wraps a transport-specific reader.
    pub fn new(reader: impl BinaryReader + 'static) -> Self {
        Self {
            reader: Box::new(reader),
        }
    }

    /// Wraps an already boxed reader.
    pub fn from_boxed(reader: Box<dyn BinaryReader>) -> Self {
        Self { reader }
    }

    /// Pushes the message's observations into `visitor`, consuming it.
    pub fn read_binary(self, visitor: &mut dyn BinaryVisitor) -> BindingResult<()> {
        self.reader.read_binary(visitor)
    }
}

impl fmt::Debug for BinaryMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BinaryMessage").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::SpecVersion;

    #[derive(Default)]
    struct Recorder {
        seen: Vec<String>,
    }

    impl BinaryVisitor for Recorder {
        fn observe(&mut self, attribute: &AttributeSpec, value: Value) -> BindingResult<()> {
            self.seen.push(format!("{}={value}", attribute.name));
            Ok(())
        }

        fn observe_extension(&mut self, name: &str, value: Value) -> BindingResult<()> {
            self.seen.push(format!("ext:{name}={value}"));
            Ok(())
        }

        fn observe_payload(
            &mut self,
            data: Option<Vec<u8>>,
            content_type: Option<&str>,
        ) -> BindingResult<()> {
            self.seen.push(format!(
                "payload:{}:{}",
                content_type.unwrap_or("-"),
                data.map(|d| d.len()).unwrap_or_default()
            ));
            Ok(())
        }
    }

    #[test]
    fn test_replay_order() {
        let event = Event::builder()
            .id("aaa")
            .source("/source")
            .ty("t")
            .extension("zz", "last")
            .data("text/plain", "hi")
            .build()
            .unwrap();

        let mut recorder = Recorder::default();
        BinaryMessage::new(event).read_binary(&mut recorder).unwrap();

        assert_eq!(
            recorder.seen,
            vec![
                "specversion=1.0",
                "id=aaa",
                "source=/source",
                "type=t",
                "datacontenttype=text/plain",
                "ext:zz=last",
                "payload:text/plain:2",
            ]
        );
    }

    #[test]
    fn test_replay_without_payload() {
        let event = Event::new(SpecVersion::V03);
        let mut recorder = Recorder::default();
        replay_event(event, &mut recorder).unwrap();
        assert_eq!(recorder.seen, vec!["specversion=0.3", "payload:-:0"]);
    }
}
