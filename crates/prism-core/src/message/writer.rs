use crate::error::{BindingError, BindingResult};
use crate::event::{Context, Event, Value};
use crate::spec::{AttributeKind, AttributeSpec, SpecVersion};

use super::BinaryVisitor;

/// A [`BinaryVisitor`] that assembles an [`Event`].
///
/// The first observation must be `specversion`; it selects the catalog used
/// for every following attribute.
///
/// # Example
///
/// ```rust
/// use prism_core::event::Event;
/// use prism_core::message::{BinaryMessage, EventWriter};
///
/// let event = Event::builder().id("aaa").source("/s").ty("t").build().unwrap();
///
/// let mut writer = EventWriter::new();
/// BinaryMessage::new(event.clone()).read_binary(&mut writer).unwrap();
/// assert_eq!(writer.finish().unwrap(), event);
/// ```
#[derive(Debug, Default)]
pub struct EventWriter {
    context: Option<Context>,
    data: Option<Vec<u8>>,
}

impl EventWriter {
    /// Creates an empty writer.
    pub fn new() -> Self {
        Self::default()
    }

    fn context_mut(&mut self, first: &str) -> BindingResult<&mut Context> {
        self.context.as_mut().ok_or_else(|| BindingError::MissingSpecVersion {
            first: first.to_string(),
        })
    }

    /// Returns the assembled event.
    ///
    /// Fails with [`BindingError::MissingSpecVersion`] when nothing was observed.
    pub fn finish(self) -> BindingResult<Event> {
        let context = self.context.ok_or_else(|| BindingError::MissingSpecVersion {
            first: "<nothing>".to_string(),
        })?;
        Ok(Event::from_parts(context, self.data))
    }
}

impl BinaryVisitor for EventWriter {
    fn observe(&mut self, attribute: &AttributeSpec, value: Value) -> BindingResult<()> {
        if attribute.kind == AttributeKind::SpecVersion {
            let version: SpecVersion = value
                .as_str()
                .ok_or_else(|| {
                    BindingError::invalid_value_kind(
                        attribute.name,
                        attribute.value_kind,
                        value.kind(),
                    )
                })?
                .parse()?;
            self.context = Some(Context::new(version));
            return Ok(());
        }
        self.context_mut(attribute.name)?.set(attribute.kind, value)?;
        Ok(())
    }

    fn observe_extension(&mut self, name: &str, value: Value) -> BindingResult<()> {
        self.context_mut(name)?.set_extension(name, value)?;
        Ok(())
    }

    fn observe_payload(
        &mut self,
        data: Option<Vec<u8>>,
        content_type: Option<&str>,
    ) -> BindingResult<()> {
        let context = self.context_mut("payload")?;
        if let Some(content_type) = content_type {
            if !context.contains(AttributeKind::DataContentType) {
                context.set(AttributeKind::DataContentType, content_type)?;
            }
        }
        self.data = data;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_requires_spec_version_first() {
        let mut writer = EventWriter::new();
        let id = SpecVersion::V10.spec().attribute("id").unwrap();
        let err = writer.observe(id, Value::from("aaa")).unwrap_err();
        assert!(matches!(err, BindingError::MissingSpecVersion { first } if first == "id"));
    }

    #[test]
    fn test_payload_content_type_fills_attribute() {
        let spec = SpecVersion::V10.spec();
        let mut writer = EventWriter::new();
        writer
            .observe(spec.attribute("specversion").unwrap(), Value::from("1.0"))
            .unwrap();
        writer
            .observe_payload(Some(b"{}".to_vec()), Some("application/json"))
            .unwrap();

        let event = writer.finish().unwrap();
        assert_eq!(event.data_content_type(), Some("application/json"));
        assert_eq!(event.data(), Some(&b"{}"[..]));
    }

    #[test]
    fn test_rejects_unknown_version() {
        let mut writer = EventWriter::new();
        let err = writer
            .observe(SpecVersion::V10.spec().attribute("specversion").unwrap(), Value::from("2.0"))
            .unwrap_err();
        assert!(matches!(err, BindingError::UnknownSpecVersion(v) if v == "2.0"));
    }
}
