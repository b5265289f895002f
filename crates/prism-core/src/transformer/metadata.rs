//! Attribute and extension transformers.
//!
//! Every factory here builds the same [`MetadataTransformer`]: a target
//! (one attribute or one extension) plus an edit function that looks at the
//! current value and decides whether to keep, replace or remove it.
//!
//! | Factory              | Present value        | Absent value     |
//! |----------------------|----------------------|------------------|
//! | [`add_attribute`]    | kept                 | set              |
//! | [`add_extension`]    | kept                 | set              |
//! | [`set_attribute`]    | updater decides      | updater decides  |
//! | [`set_extension`]    | updater decides      | updater decides  |
//! | [`delete_attribute`] | removed              | nothing          |
//! | [`delete_extension`] | removed              | nothing          |

use std::fmt;
use std::sync::Arc;

use crate::error::{BindingError, BindingResult};
use crate::event::{Event, Value, validate_extension_name};
use crate::message::BinaryVisitor;
use crate::spec::{AttributeKind, AttributeSpec, SpecVersion};

use super::{BoxedTransformer, Transformer};

// ============================================================================
// Factories
// ============================================================================

/// Sets an attribute unless it already has a value.
///
/// Textual values are converted to the attribute's kind, so
/// `add_attribute(AttributeKind::Source, "/orders")` yields a URI reference.
pub fn add_attribute(kind: AttributeKind, value: impl Into<Value>) -> BoxedTransformer {
    let value = value.into();
    MetadataTransformer::boxed("add_attribute", Target::Attribute(kind), move |current| {
        Ok(match current {
            Some(_) => Edit::Keep,
            None => Edit::Replace(value.clone()),
        })
    })
}

/// Sets an extension unless it already has a value.
pub fn add_extension(name: impl Into<String>, value: impl Into<Value>) -> BoxedTransformer {
    let value = value.into();
    MetadataTransformer::boxed("add_extension", Target::Extension(name.into()), move |current| {
        Ok(match current {
            Some(_) => Edit::Keep,
            None => Edit::Replace(value.clone()),
        })
    })
}

/// Rewrites an attribute with `updater`.
///
/// The updater receives the current value; returning `None` removes the
/// attribute, which fails for required attributes.
pub fn set_attribute<F>(kind: AttributeKind, updater: F) -> BoxedTransformer
where
    F: Fn(Option<&Value>) -> BindingResult<Option<Value>> + Send + Sync + 'static,
{
    MetadataTransformer::boxed("set_attribute", Target::Attribute(kind), move |current| {
        updater(current).map(|updated| Edit::from_update(current, updated))
    })
}

/// Rewrites an extension with `updater`; returning `None` removes it.
pub fn set_extension<F>(name: impl Into<String>, updater: F) -> BoxedTransformer
where
    F: Fn(Option<&Value>) -> BindingResult<Option<Value>> + Send + Sync + 'static,
{
    MetadataTransformer::boxed("set_extension", Target::Extension(name.into()), move |current| {
        updater(current).map(|updated| Edit::from_update(current, updated))
    })
}

/// Removes an optional attribute.
pub fn delete_attribute(kind: AttributeKind) -> BoxedTransformer {
    MetadataTransformer::boxed("delete_attribute", Target::Attribute(kind), |current| {
        Ok(Edit::remove_if_present(current))
    })
}

/// Removes an extension.
pub fn delete_extension(name: impl Into<String>) -> BoxedTransformer {
    MetadataTransformer::boxed("delete_extension", Target::Extension(name.into()), |current| {
        Ok(Edit::remove_if_present(current))
    })
}

// ============================================================================
// Transformer
// ============================================================================

enum Edit {
    Keep,
    Replace(Value),
    Remove,
}

impl Edit {
    fn from_update(current: Option<&Value>, updated: Option<Value>) -> Self {
        match (current, updated) {
            (_, Some(value)) => Edit::Replace(value),
            (Some(_), None) => Edit::Remove,
            (None, None) => Edit::Keep,
        }
    }

    fn remove_if_present(current: Option<&Value>) -> Self {
        if current.is_some() { Edit::Remove } else { Edit::Keep }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Target {
    Attribute(AttributeKind),
    Extension(String),
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Attribute(kind) => write!(f, "{kind}"),
            Target::Extension(name) => f.write_str(name),
        }
    }
}

type EditFn = dyn Fn(Option<&Value>) -> BindingResult<Edit> + Send + Sync;

/// Edits a single attribute or extension.
pub struct MetadataTransformer {
    label: &'static str,
    target: Target,
    edit: Arc<EditFn>,
}

impl MetadataTransformer {
    fn boxed<F>(label: &'static str, target: Target, edit: F) -> BoxedTransformer
    where
        F: Fn(Option<&Value>) -> BindingResult<Edit> + Send + Sync + 'static,
    {
        Arc::new(Self {
            label,
            target,
            edit: Arc::new(edit),
        })
    }
}

impl fmt::Debug for MetadataTransformer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MetadataTransformer")
            .field("label", &self.label)
            .field("target", &self.target)
            .finish_non_exhaustive()
    }
}

impl Transformer for MetadataTransformer {
    fn transform_event(&self, event: &mut Event) -> BindingResult<()> {
        match &self.target {
            Target::Attribute(kind) => match (self.edit)(event.get(*kind))? {
                Edit::Keep => {}
                Edit::Replace(value) => {
                    let spec = event
                        .spec_version()
                        .spec()
                        .attribute_by_kind(*kind)
                        .ok_or_else(|| {
                            BindingError::unknown_attribute(kind.to_string(), event.spec_version())
                        })?;
                    event.set(*kind, coerce_to(spec, value)?)?;
                }
                Edit::Remove => {
                    event.remove(*kind)?;
                }
            },
            Target::Extension(name) => {
                validate_extension_name(name)?;
                match (self.edit)(event.extension(name))? {
                    Edit::Keep => {}
                    Edit::Replace(value) => {
                        event.set_extension(name.clone(), value)?;
                    }
                    Edit::Remove => {
                        event.remove_extension(name);
                    }
                }
            }
        }
        Ok(())
    }

    fn transform_binary<'a>(
        &'a self,
        next: &'a mut dyn BinaryVisitor,
    ) -> Box<dyn BinaryVisitor + 'a> {
        Box::new(MetadataInterceptor {
            transformer: self,
            next,
            version: None,
            seen: false,
            content_type: None,
        })
    }
}

/// Converts a replacement value to the attribute's declared kind.
fn coerce_to(spec: &AttributeSpec, value: Value) -> BindingResult<Value> {
    if !spec.mutable {
        return Err(BindingError::ReadOnlyAttribute {
            attribute: spec.name.to_string(),
        });
    }
    let actual = value.kind();
    value
        .coerce(spec.value_kind)
        .map_err(|_| BindingError::invalid_value_kind(spec.name, spec.value_kind, actual))
}

// ============================================================================
// Binary Interceptor
// ============================================================================

struct MetadataInterceptor<'a> {
    transformer: &'a MetadataTransformer,
    next: &'a mut dyn BinaryVisitor,
    version: Option<SpecVersion>,
    seen: bool,
    /// Set when the edit touched `datacontenttype`, so the payload
    /// observation carries the new content type.
    content_type: Option<Option<String>>,
}

impl MetadataInterceptor<'_> {
    fn edit(&self, current: Option<&Value>) -> BindingResult<Edit> {
        (self.transformer.edit)(current)
            .map_err(|e| BindingError::write(self.transformer.target.to_string(), e))
    }

    fn apply_attribute(
        &mut self,
        spec: &AttributeSpec,
        current: Option<Value>,
        edit: Edit,
    ) -> BindingResult<()> {
        let write_err = |e| BindingError::write(spec.name, e);
        match edit {
            Edit::Keep => match current {
                Some(value) => self.next.observe(spec, value),
                None => Ok(()),
            },
            Edit::Replace(value) => {
                let value = coerce_to(spec, value).map_err(write_err)?;
                if spec.kind == AttributeKind::DataContentType {
                    self.content_type = Some(value.as_str().map(str::to_string));
                }
                self.next.observe(spec, value).map_err(write_err)
            }
            Edit::Remove => {
                if spec.required {
                    return Err(write_err(BindingError::RequiredAttribute {
                        attribute: spec.name.to_string(),
                    }));
                }
                if spec.kind == AttributeKind::DataContentType {
                    self.content_type = Some(None);
                }
                Ok(())
            }
        }
    }

    fn apply_extension(
        &mut self,
        name: &str,
        current: Option<Value>,
        edit: Edit,
    ) -> BindingResult<()> {
        match edit {
            Edit::Keep => match current {
                Some(value) => self.next.observe_extension(name, value),
                None => Ok(()),
            },
            Edit::Replace(value) => validate_extension_name(name)
                .and_then(|()| self.next.observe_extension(name, value.into_extension()))
                .map_err(|e| BindingError::write(name, e)),
            Edit::Remove => Ok(()),
        }
    }

    /// Applies the edit to a target that was never observed.
    fn inject(&mut self) -> BindingResult<()> {
        let edit = self.edit(None)?;
        if matches!(edit, Edit::Keep) {
            return Ok(());
        }
        let transformer = self.transformer;
        match &transformer.target {
            Target::Attribute(kind) => {
                let version = self.version.ok_or_else(|| BindingError::MissingSpecVersion {
                    first: "payload".to_string(),
                })?;
                let spec = version.spec().attribute_by_kind(*kind).ok_or_else(|| {
                    BindingError::write(
                        kind.to_string(),
                        BindingError::unknown_attribute(kind.to_string(), version),
                    )
                })?;
                self.apply_attribute(spec, None, edit)
            }
            Target::Extension(name) => self.apply_extension(name, None, edit),
        }
    }
}

impl BinaryVisitor for MetadataInterceptor<'_> {
    fn observe(&mut self, attribute: &AttributeSpec, value: Value) -> BindingResult<()> {
        if attribute.kind == AttributeKind::SpecVersion {
            self.version = value.as_str().and_then(|v| v.parse().ok());
        }
        match &self.transformer.target {
            Target::Attribute(kind) if *kind == attribute.kind => {
                self.seen = true;
                let edit = self.edit(Some(&value))?;
                self.apply_attribute(attribute, Some(value), edit)
            }
            _ => self.next.observe(attribute, value),
        }
    }

    fn observe_extension(&mut self, name: &str, value: Value) -> BindingResult<()> {
        match &self.transformer.target {
            Target::Extension(target) if target == name => {
                self.seen = true;
                let edit = self.edit(Some(&value))?;
                self.apply_extension(name, Some(value), edit)
            }
            _ => self.next.observe_extension(name, value),
        }
    }

    fn observe_payload(
        &mut self,
        data: Option<Vec<u8>>,
        content_type: Option<&str>,
    ) -> BindingResult<()> {
        if !self.seen {
            self.seen = true;
            self.inject()?;
        }
        let content_type = match &self.content_type {
            Some(overridden) => overridden.as_deref(),
            None => content_type,
        };
        self.next.observe_payload(data, content_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::{BinaryMessage, EventWriter};

    fn event() -> Event {
        Event::builder()
            .id("aaa")
            .source("/source")
            .ty("t")
            .data("text/plain", "payload")
            .build()
            .unwrap()
    }

    fn via_binary(transformer: &BoxedTransformer, event: Event) -> BindingResult<Event> {
        let mut writer = EventWriter::new();
        {
            let mut interceptor = transformer.transform_binary(&mut writer);
            BinaryMessage::new(event).read_binary(interceptor.as_mut())?;
        }
        writer.finish()
    }

    #[test]
    fn test_add_attribute_is_set_if_absent() {
        let transformer = add_attribute(AttributeKind::Id, "bbb");
        let mut e = event();
        transformer.transform_event(&mut e).unwrap();
        assert_eq!(e, event());
        assert_eq!(via_binary(&transformer, event()).unwrap(), event());

        let transformer = add_attribute(AttributeKind::Subject, "sub");
        let mut e = event();
        transformer.transform_event(&mut e).unwrap();
        assert_eq!(e.subject(), Some("sub"));
        assert_eq!(via_binary(&transformer, event()).unwrap(), e);
    }

    #[test]
    fn test_add_attribute_coerces_textual_values() {
        let transformer = add_attribute(AttributeKind::DataSchema, "https://example.com/schema");
        let mut e = event();
        transformer.transform_event(&mut e).unwrap();
        assert_eq!(
            e.get(AttributeKind::DataSchema),
            Some(&Value::uri("https://example.com/schema"))
        );
    }

    #[test]
    fn test_add_attribute_rejects_wrong_kind() {
        let transformer = add_attribute(AttributeKind::Time, "yesterday");
        let err = transformer.transform_event(&mut event()).unwrap_err();
        assert!(matches!(
            err,
            BindingError::InvalidValueKind { ref attribute, .. } if attribute == "time"
        ));

        let err = via_binary(&transformer, event()).unwrap_err();
        assert!(matches!(err, BindingError::WriteError { ref name, .. } if name == "time"));
    }

    #[test]
    fn test_add_extension_is_set_if_absent() {
        let transformer = add_extension("aaa", "bbb");
        let mut e = event();
        transformer.transform_event(&mut e).unwrap();
        assert_eq!(e.extension("aaa"), Some(&Value::from("bbb")));
        assert_eq!(via_binary(&transformer, event()).unwrap(), e);

        let again = add_extension("aaa", "zzz");
        let mut unchanged = e.clone();
        again.transform_event(&mut unchanged).unwrap();
        assert_eq!(unchanged, e);
        assert_eq!(via_binary(&again, e.clone()).unwrap(), e);
    }

    #[test]
    fn test_extension_name_validation() {
        let err = add_extension("data", "x").transform_event(&mut event()).unwrap_err();
        assert!(matches!(err, BindingError::ReservedName { .. }));

        let err = via_binary(&add_extension("Bad-Name", "x"), event()).unwrap_err();
        assert!(matches!(
            err,
            BindingError::WriteError { ref source, .. }
                if matches!(**source, BindingError::InvalidExtensionName { .. })
        ));
    }

    #[test]
    fn test_set_and_delete() {
        let upper = set_attribute(AttributeKind::Type, |current| {
            Ok(current.and_then(Value::as_str).map(|t| Value::from(t.to_uppercase())))
        });
        let mut e = event();
        upper.transform_event(&mut e).unwrap();
        assert_eq!(e.ty(), Some("T"));
        assert_eq!(via_binary(&upper, event()).unwrap(), e);

        let delete = delete_attribute(AttributeKind::DataContentType);
        let mut e = event();
        delete.transform_event(&mut e).unwrap();
        assert!(e.data_content_type().is_none());
        let binary = via_binary(&delete, event()).unwrap();
        assert!(binary.data_content_type().is_none());
        assert_eq!(binary.data(), Some(&b"payload"[..]));

        let err = delete_attribute(AttributeKind::Id)
            .transform_event(&mut event())
            .unwrap_err();
        assert!(matches!(err, BindingError::RequiredAttribute { .. }));

        let mut e = event();
        e.set_extension("tenant", "acme").unwrap();
        delete_extension("tenant").transform_event(&mut e).unwrap();
        assert!(e.extension("tenant").is_none());
    }

    #[test]
    fn test_set_extension_counter() {
        let bump = set_extension("count", |current| {
            let n = match current {
                Some(Value::Integer(n)) => *n,
                _ => 0,
            };
            Ok(Some(Value::Integer(n + 1)))
        });
        let mut e = event();
        bump.transform_event(&mut e).unwrap();
        bump.transform_event(&mut e).unwrap();
        assert_eq!(e.extension("count"), Some(&Value::Integer(2)));
        assert_eq!(
            via_binary(&bump, event()).unwrap().extension("count"),
            Some(&Value::Integer(1))
        );
    }

    #[test]
    fn test_unknown_attribute_for_version() {
        let transformer = add_attribute(AttributeKind::DataContentEncoding, "base64");
        let err = transformer.transform_event(&mut event()).unwrap_err();
        assert!(matches!(err, BindingError::UnknownAttribute { .. }));

        let err = via_binary(&transformer, event()).unwrap_err();
        assert!(matches!(err, BindingError::WriteError { .. }));
    }
}
