use tracing::trace;

use crate::error::{BindingError, BindingResult};
use crate::event::{Event, Value};
use crate::message::BinaryVisitor;
use crate::spec::{AttributeKind, AttributeSpec, SpecVersion};

use super::{BoxedTransformer, Transformer};

/// Converts events to another spec version.
pub fn version(target: SpecVersion) -> BoxedTransformer {
    std::sync::Arc::new(VersionTransformer::new(target))
}

/// Converts the context of every event to a fixed spec version.
///
/// Attributes are mapped by kind and renamed to the target catalog's names.
/// Optional attributes the target does not define are dropped; a required
/// one fails with [`BindingError::Unrepresentable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VersionTransformer {
    target: SpecVersion,
}

impl VersionTransformer {
    /// Creates a transformer converting to `target`.
    pub fn new(target: SpecVersion) -> Self {
        Self { target }
    }

    /// Returns the target version.
    pub fn target(&self) -> SpecVersion {
        self.target
    }
}

impl Transformer for VersionTransformer {
    fn transform_event(&self, event: &mut Event) -> BindingResult<()> {
        if event.spec_version() != self.target {
            let converted = event.context().as_version(self.target)?;
            *event.context_mut() = converted;
        }
        Ok(())
    }

    fn transform_binary<'a>(
        &'a self,
        next: &'a mut dyn BinaryVisitor,
    ) -> Box<dyn BinaryVisitor + 'a> {
        Box::new(VersionInterceptor {
            target: self.target,
            source: None,
            next,
        })
    }
}

struct VersionInterceptor<'a> {
    target: SpecVersion,
    source: Option<SpecVersion>,
    next: &'a mut dyn BinaryVisitor,
}

impl VersionInterceptor<'_> {
    fn convert(&mut self, attribute: &AttributeSpec, value: Value) -> BindingResult<()> {
        let Some(spec) = self.target.spec().attribute_by_kind(attribute.kind) else {
            if attribute.required {
                return Err(BindingError::write(
                    attribute.name,
                    BindingError::Unrepresentable {
                        attribute: attribute.name.to_string(),
                        version: self.target.to_string(),
                    },
                ));
            }
            trace!(
                attribute = attribute.name,
                version = %self.target,
                "Dropping unmapped attribute"
            );
            return Ok(());
        };
        let actual = value.kind();
        value
            .coerce(spec.value_kind)
            .map_err(|_| BindingError::invalid_value_kind(spec.name, spec.value_kind, actual))
            .and_then(|value| self.next.observe(spec, value))
            .map_err(|e| BindingError::write(spec.name, e))
    }
}

impl BinaryVisitor for VersionInterceptor<'_> {
    fn observe(&mut self, attribute: &AttributeSpec, value: Value) -> BindingResult<()> {
        if attribute.kind == AttributeKind::SpecVersion {
            let source: SpecVersion = value
                .as_str()
                .ok_or_else(|| {
                    BindingError::invalid_value_kind(
                        attribute.name,
                        attribute.value_kind,
                        value.kind(),
                    )
                })?
                .parse()?;
            self.source = Some(source);
            let spec = self
                .target
                .spec()
                .attribute_by_kind(AttributeKind::SpecVersion)
                .unwrap_or(attribute);
            return self
                .next
                .observe(spec, Value::String(self.target.as_str().to_string()))
                .map_err(|e| BindingError::write(spec.name, e));
        }
        match self.source {
            None => Err(BindingError::MissingSpecVersion {
                first: attribute.name.to_string(),
            }),
            Some(source) if source == self.target => self.next.observe(attribute, value),
            Some(_) => self.convert(attribute, value),
        }
    }

    fn observe_extension(&mut self, name: &str, value: Value) -> BindingResult<()> {
        self.next.observe_extension(name, value)
    }

    fn observe_payload(
        &mut self,
        data: Option<Vec<u8>>,
        content_type: Option<&str>,
    ) -> BindingResult<()> {
        self.next.observe_payload(data, content_type)
    }
}
