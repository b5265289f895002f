use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::{BindingError, BindingResult};
use crate::spec::{AttributeKind, SpecVersion};

use super::{Context, Event, Value};

/// A builder for [`Event`]s.
///
/// Textual attributes are converted to the kind the target version declares,
/// so `data_schema` works for both 0.3 (`schemaurl`, URI reference) and 1.0
/// (`dataschema`, absolute URI). When no id is given a random UUID is used.
///
/// # Example
///
/// ```rust
/// use prism_core::event::EventBuilder;
/// use prism_core::spec::SpecVersion;
///
/// let event = EventBuilder::new(SpecVersion::V03)
///     .source("https://example.com/orders")
///     .ty("com.example.order.created")
///     .extension("tenant", "acme")
///     .data("application/json", br#"{"order":42}"#.to_vec())
///     .build()
///     .unwrap();
///
/// assert!(event.id().is_some());
/// assert_eq!(event.data_content_type(), Some("application/json"));
/// ```
#[derive(Debug, Clone)]
pub struct EventBuilder {
    version: SpecVersion,
    attributes: Vec<(AttributeKind, Value)>,
    extensions: Vec<(String, Value)>,
    data: Option<Vec<u8>>,
}

impl EventBuilder {
    /// Creates a builder for the given version.
    pub fn new(version: SpecVersion) -> Self {
        Self {
            version,
            attributes: Vec::new(),
            extensions: Vec::new(),
            data: None,
        }
    }

    /// Sets any attribute.
    pub fn attribute(mut self, kind: AttributeKind, value: impl Into<Value>) -> Self {
        self.attributes.push((kind, value.into()));
        self
    }

    /// Sets the `id` attribute.
    pub fn id(self, id: impl Into<String>) -> Self {
        self.attribute(AttributeKind::Id, Value::String(id.into()))
    }

    /// Sets the `source` attribute.
    pub fn source(self, source: impl Into<String>) -> Self {
        self.attribute(AttributeKind::Source, Value::UriRef(source.into()))
    }

    /// Sets the `type` attribute.
    pub fn ty(self, ty: impl Into<String>) -> Self {
        self.attribute(AttributeKind::Type, Value::String(ty.into()))
    }

    /// Sets the `subject` attribute.
    pub fn subject(self, subject: impl Into<String>) -> Self {
        self.attribute(AttributeKind::Subject, Value::String(subject.into()))
    }

    /// Sets the `time` attribute.
    pub fn time(self, time: DateTime<Utc>) -> Self {
        self.attribute(AttributeKind::Time, Value::Timestamp(time))
    }

    /// Sets the data schema attribute.
    pub fn data_schema(self, schema: impl Into<String>) -> Self {
        self.attribute(AttributeKind::DataSchema, Value::Uri(schema.into()))
    }

    /// Adds an extension.
    pub fn extension(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extensions.push((name.into(), value.into()));
        self
    }

    /// Sets the payload and its content type.
    pub fn data(mut self, content_type: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        self.data = Some(data.into());
        self.attribute(
            AttributeKind::DataContentType,
            Value::String(content_type.into()),
        )
    }

    /// Builds the event, checking every value and required attribute.
    pub fn build(self) -> BindingResult<Event> {
        let mut context = Context::new(self.version);
        let spec = self.version.spec();

        if !self.attributes.iter().any(|(kind, _)| *kind == AttributeKind::Id) {
            context.set(AttributeKind::Id, Uuid::new_v4().to_string())?;
        }

        for (kind, value) in self.attributes {
            let attribute = spec
                .attribute_by_kind(kind)
                .ok_or_else(|| BindingError::unknown_attribute(kind.to_string(), self.version))?;
            let actual = value.kind();
            let value = value.coerce(attribute.value_kind).map_err(|_| {
                BindingError::invalid_value_kind(attribute.name, attribute.value_kind, actual)
            })?;
            context.set(kind, value)?;
        }

        for (name, value) in self.extensions {
            context.set_extension(name, value)?;
        }

        context.validate()?;
        Ok(Event::from_parts(context, self.data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::ValueKind;

    #[test]
    fn test_build_generates_id() {
        let event = EventBuilder::new(SpecVersion::V10)
            .source("/source")
            .ty("t")
            .build()
            .unwrap();
        let id = event.id().unwrap();
        assert!(Uuid::parse_str(id).is_ok());
    }

    #[test]
    fn test_build_requires_source_and_type() {
        let err = EventBuilder::new(SpecVersion::V10).id("aaa").build().unwrap_err();
        assert!(matches!(
            err,
            BindingError::MissingRequired { attribute } if attribute == "source"
        ));
    }

    #[test]
    fn test_data_schema_follows_version() {
        let v03 = EventBuilder::new(SpecVersion::V03)
            .source("/source")
            .ty("t")
            .data_schema("relative/schema.json")
            .build()
            .unwrap();
        assert_eq!(
            v03.get(AttributeKind::DataSchema).map(Value::kind),
            Some(ValueKind::UriRef)
        );

        let err = EventBuilder::new(SpecVersion::V10)
            .source("/source")
            .ty("t")
            .data_schema("relative/schema.json")
            .build()
            .unwrap_err();
        assert!(matches!(err, BindingError::InvalidValueKind { .. }));
    }
}
