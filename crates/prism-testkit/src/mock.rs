use prism_core::format;
use prism_core::message::replay_event;
use prism_core::spec::AttributeSpec;
use prism_core::{
    BinaryMessage, BinaryReader, BinaryVisitor, BindingResult, Event, Message, StructuredMessage,
    Value,
};

/// A binary-mode message backed by a decoded event.
///
/// Observations are replayed in canonical order: `specversion` first, then
/// the other attributes, the extensions and finally the payload.
#[derive(Debug, Clone)]
pub struct MockBinaryMessage {
    event: Event,
}

impl MockBinaryMessage {
    /// Wraps an event.
    pub fn new(event: Event) -> Self {
        Self { event }
    }

    /// Turns the mock into a binary [`Message`].
    pub fn into_message(self) -> Message {
        Message::Binary(BinaryMessage::new(self))
    }
}

impl BinaryReader for MockBinaryMessage {
    fn read_binary(self: Box<Self>, visitor: &mut dyn BinaryVisitor) -> BindingResult<()> {
        replay_event(self.event, visitor)
    }
}

impl From<MockBinaryMessage> for Message {
    fn from(mock: MockBinaryMessage) -> Self {
        mock.into_message()
    }
}

/// JSON-encodes an event into a structured [`Message`].
pub fn mock_structured_message(event: &Event) -> Message {
    let message = StructuredMessage::from_event(format::json(), event)
        .expect("fixture events encode to JSON");
    Message::Structured(message)
}

/// One binary-mode observation.
#[derive(Debug, Clone, PartialEq)]
pub enum Observation {
    Attribute(String, Value),
    Extension(String, Value),
    Payload(Option<Vec<u8>>, Option<String>),
}

/// A [`BinaryVisitor`] that records every observation it receives.
#[derive(Debug, Default)]
pub struct RecordingVisitor {
    observations: Vec<Observation>,
}

impl RecordingVisitor {
    /// Creates an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the recorded observations in arrival order.
    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    /// Returns the recorded payload observation, if any.
    pub fn payload(&self) -> Option<(Option<&[u8]>, Option<&str>)> {
        self.observations.iter().find_map(|o| match o {
            Observation::Payload(data, content_type) => {
                Some((data.as_deref(), content_type.as_deref()))
            }
            _ => None,
        })
    }
}

impl BinaryVisitor for RecordingVisitor {
    fn observe(&mut self, attribute: &AttributeSpec, value: Value) -> BindingResult<()> {
        self.observations
            .push(Observation::Attribute(attribute.name.to_string(), value));
        Ok(())
    }

    fn observe_extension(&mut self, name: &str, value: Value) -> BindingResult<()> {
        self.observations
            .push(Observation::Extension(name.to_string(), value));
        Ok(())
    }

    fn observe_payload(
        &mut self,
        data: Option<Vec<u8>>,
        content_type: Option<&str>,
    ) -> BindingResult<()> {
        self.observations
            .push(Observation::Payload(data, content_type.map(str::to_string)));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::full_event;

    #[test]
    fn test_mock_binary_replays_in_order() {
        let mut recorder = RecordingVisitor::new();
        MockBinaryMessage::new(full_event())
            .into_message()
            .read_binary(&mut recorder)
            .unwrap();

        let observations = recorder.observations();
        assert_eq!(
            observations.first(),
            Some(&Observation::Attribute("specversion".to_string(), Value::from("1.0")))
        );
        assert!(matches!(observations.last(), Some(Observation::Payload(..))));
        assert_eq!(
            recorder.payload(),
            Some((Some(&br#"{"hello":"world"}"#[..]), Some("application/json")))
        );
    }

    #[test]
    fn test_mock_structured_decodes_back() {
        let message = mock_structured_message(&full_event());
        assert_eq!(message.into_event().unwrap(), full_event());
    }
}
