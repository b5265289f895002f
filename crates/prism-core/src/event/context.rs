//! Versioned event context: attributes plus extensions.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use tracing::trace;

use crate::error::{BindingError, BindingResult};
use crate::spec::{AttributeKind, AttributeSpec, SpecVersion, Versions};

use super::value::Value;

/// The attributes and extensions of one event, under one spec version.
///
/// A `Context` upholds two invariants:
///
/// - every populated attribute's value has the kind declared by its
///   [`AttributeSpec`] in this context's version;
/// - extension names are lowercase ASCII alphanumerics and never collide
///   with a reserved name.
///
/// `specversion` is always populated and can only change through
/// [`as_version`](Self::as_version).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Context {
    version: SpecVersion,
    attributes: BTreeMap<AttributeKind, Value>,
    extensions: BTreeMap<String, Value>,
}

impl Context {
    /// Creates an empty context for the given version.
    pub fn new(version: SpecVersion) -> Self {
        let mut attributes = BTreeMap::new();
        attributes.insert(
            AttributeKind::SpecVersion,
            Value::String(version.as_str().to_string()),
        );
        Self {
            version,
            attributes,
            extensions: BTreeMap::new(),
        }
    }

    /// Returns the spec version of this context.
    pub fn spec_version(&self) -> SpecVersion {
        self.version
    }

    // ------------------------------------------------------------------------
    // Attributes
    // ------------------------------------------------------------------------

    /// Returns the value of an attribute, if populated.
    pub fn get(&self, kind: AttributeKind) -> Option<&Value> {
        self.attributes.get(&kind)
    }

    /// Returns whether an attribute is populated.
    pub fn contains(&self, kind: AttributeKind) -> bool {
        self.attributes.contains_key(&kind)
    }

    /// Sets an attribute, returning the previous value.
    ///
    /// # Errors
    ///
    /// - [`BindingError::UnknownAttribute`] if this version has no such attribute
    /// - [`BindingError::ReadOnlyAttribute`] for `specversion`
    /// - [`BindingError::InvalidValueKind`] if the value has the wrong kind
    pub fn set(
        &mut self,
        kind: AttributeKind,
        value: impl Into<Value>,
    ) -> BindingResult<Option<Value>> {
        let value = value.into();
        let spec = self.spec_for(kind)?;
        if !spec.mutable {
            return Err(BindingError::ReadOnlyAttribute {
                attribute: spec.name.to_string(),
            });
        }
        if value.kind() != spec.value_kind {
            return Err(BindingError::invalid_value_kind(
                spec.name,
                spec.value_kind,
                value.kind(),
            ));
        }
        Ok(self.attributes.insert(kind, value))
    }

    /// Removes an optional attribute, returning its value.
    pub fn remove(&mut self, kind: AttributeKind) -> BindingResult<Option<Value>> {
        let spec = self.spec_for(kind)?;
        if spec.required {
            return Err(BindingError::RequiredAttribute {
                attribute: spec.name.to_string(),
            });
        }
        Ok(self.attributes.remove(&kind))
    }

    /// Iterates over populated attributes in canonical order, `specversion` first.
    pub fn attributes(&self) -> impl Iterator<Item = (&'static AttributeSpec, &Value)> {
        let version = self.version.spec();
        self.attributes.iter().filter_map(move |(kind, value)| {
            version.attribute_by_kind(*kind).map(|spec| (spec, value))
        })
    }

    fn spec_for(&self, kind: AttributeKind) -> BindingResult<&'static AttributeSpec> {
        self.version
            .spec()
            .attribute_by_kind(kind)
            .ok_or_else(|| BindingError::unknown_attribute(kind.to_string(), self.version))
    }

    // ------------------------------------------------------------------------
    // Extensions
    // ------------------------------------------------------------------------

    /// Returns the value of an extension, if present.
    pub fn extension(&self, name: &str) -> Option<&Value> {
        self.extensions.get(name)
    }

    /// Sets an extension, returning the previous value.
    ///
    /// Values that are not `Boolean`, `Integer` or `String` are stored in
    /// their canonical string form (see [`Value::into_extension`]).
    ///
    /// # Errors
    ///
    /// - [`BindingError::ReservedName`] if the name is an attribute name
    /// - [`BindingError::InvalidExtensionName`] if the name is empty or not
    ///   lowercase alphanumeric
    pub fn set_extension(
        &mut self,
        name: impl Into<String>,
        value: impl Into<Value>,
    ) -> BindingResult<Option<Value>> {
        let name = name.into();
        validate_extension_name(&name)?;
        Ok(self.extensions.insert(name, value.into().into_extension()))
    }

    /// Removes an extension, returning its value.
    pub fn remove_extension(&mut self, name: &str) -> Option<Value> {
        self.extensions.remove(name)
    }

    /// Iterates over extensions sorted by name.
    pub fn extensions(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.extensions.iter().map(|(name, value)| (name.as_str(), value))
    }

    // ------------------------------------------------------------------------
    // Versioning and validation
    // ------------------------------------------------------------------------

    /// Produces the same context under a different spec version.
    ///
    /// Attributes are mapped by kind. Optional attributes without a
    /// counterpart are dropped; a required one makes the conversion fail
    /// with [`BindingError::Unrepresentable`].
    pub fn as_version(&self, target: SpecVersion) -> BindingResult<Context> {
        if target == self.version {
            return Ok(self.clone());
        }

        let source_spec = self.version.spec();
        let target_spec = target.spec();
        let mut converted = Context::new(target);

        for (kind, value) in &self.attributes {
            if *kind == AttributeKind::SpecVersion {
                continue;
            }
            match target_spec.attribute_by_kind(*kind) {
                Some(spec) => {
                    let value = value.clone().coerce(spec.value_kind).map_err(|_| {
                        BindingError::invalid_value_kind(spec.name, spec.value_kind, value.kind())
                    })?;
                    converted.attributes.insert(*kind, value);
                }
                None => {
                    let name = source_spec
                        .attribute_by_kind(*kind)
                        .map_or("", |spec| spec.name);
                    if source_spec.attribute_by_kind(*kind).is_some_and(|spec| spec.required) {
                        return Err(BindingError::Unrepresentable {
                            attribute: name.to_string(),
                            version: target.to_string(),
                        });
                    }
                    trace!(attribute = name, version = %target, "Dropping unmapped attribute");
                }
            }
        }

        converted.extensions = self.extensions.clone();
        Ok(converted)
    }

    /// Checks that every required attribute is populated.
    pub fn validate(&self) -> BindingResult<()> {
        match self.version.spec().required().find(|spec| !self.contains(spec.kind)) {
            Some(spec) => Err(BindingError::MissingRequired {
                attribute: spec.name.to_string(),
            }),
            None => Ok(()),
        }
    }

    // ------------------------------------------------------------------------
    // Typed accessors
    // ------------------------------------------------------------------------

    /// The `id` attribute.
    pub fn id(&self) -> Option<&str> {
        self.get_str(AttributeKind::Id)
    }

    /// The `source` attribute.
    pub fn source(&self) -> Option<&str> {
        self.get_str(AttributeKind::Source)
    }

    /// The `type` attribute.
    pub fn ty(&self) -> Option<&str> {
        self.get_str(AttributeKind::Type)
    }

    /// The `subject` attribute.
    pub fn subject(&self) -> Option<&str> {
        self.get_str(AttributeKind::Subject)
    }

    /// The `datacontenttype` attribute.
    pub fn data_content_type(&self) -> Option<&str> {
        self.get_str(AttributeKind::DataContentType)
    }

    /// The `dataschema` (1.0) or `schemaurl` (0.3) attribute.
    pub fn data_schema(&self) -> Option<&str> {
        self.get_str(AttributeKind::DataSchema)
    }

    /// The `time` attribute.
    pub fn time(&self) -> Option<&DateTime<Utc>> {
        self.get(AttributeKind::Time).and_then(Value::as_timestamp)
    }

    fn get_str(&self, kind: AttributeKind) -> Option<&str> {
        self.get(kind).and_then(Value::as_str)
    }
}

/// Checks an extension name against the naming and reservation rules.
pub(crate) fn validate_extension_name(name: &str) -> BindingResult<()> {
    if Versions::standard().is_reserved(name) {
        return Err(BindingError::ReservedName {
            name: name.to_string(),
        });
    }
    if name.is_empty()
        || !name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
    {
        return Err(BindingError::InvalidExtensionName {
            name: name.to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::ValueKind;

    fn v1_context() -> Context {
        let mut ctx = Context::new(SpecVersion::V10);
        ctx.set(AttributeKind::Id, "aaa").unwrap();
        ctx.set(AttributeKind::Source, Value::uri_ref("/source")).unwrap();
        ctx.set(AttributeKind::Type, "com.example.created").unwrap();
        ctx
    }

    #[test]
    fn test_set_and_get() {
        let mut ctx = v1_context();
        assert_eq!(ctx.subject(), None);
        assert_eq!(ctx.set(AttributeKind::Subject, "sub").unwrap(), None);
        assert_eq!(ctx.subject(), Some("sub"));
        assert_eq!(
            ctx.get(AttributeKind::SpecVersion),
            Some(&Value::from("1.0"))
        );
    }

    #[test]
    fn test_set_rejects_wrong_kind() {
        let mut ctx = v1_context();
        let err = ctx.set(AttributeKind::Time, "yesterday").unwrap_err();
        assert_eq!(
            err,
            BindingError::invalid_value_kind("time", ValueKind::Timestamp, ValueKind::String)
        );
        assert!(ctx.time().is_none());
    }

    #[test]
    fn test_set_rejects_specversion_and_unknown_attributes() {
        let mut ctx = v1_context();
        assert!(matches!(
            ctx.set(AttributeKind::SpecVersion, "0.3"),
            Err(BindingError::ReadOnlyAttribute { .. })
        ));
        assert!(matches!(
            ctx.set(AttributeKind::DataContentEncoding, "base64"),
            Err(BindingError::UnknownAttribute { .. })
        ));
    }

    #[test]
    fn test_remove_required_fails() {
        let mut ctx = v1_context();
        assert!(matches!(
            ctx.remove(AttributeKind::Id),
            Err(BindingError::RequiredAttribute { .. })
        ));
        ctx.set(AttributeKind::Subject, "sub").unwrap();
        assert_eq!(ctx.remove(AttributeKind::Subject).unwrap(), Some(Value::from("sub")));
    }

    #[test]
    fn test_extension_names() {
        let mut ctx = v1_context();
        assert!(ctx.set_extension("traceparent", "00-abc").is_ok());
        assert!(matches!(
            ctx.set_extension("subject", "x"),
            Err(BindingError::ReservedName { .. })
        ));
        assert!(matches!(
            ctx.set_extension("schemaurl", "x"),
            Err(BindingError::ReservedName { .. })
        ));
        assert!(matches!(
            ctx.set_extension("Trace-Parent", "x"),
            Err(BindingError::InvalidExtensionName { .. })
        ));
        assert!(matches!(
            ctx.set_extension("", "x"),
            Err(BindingError::InvalidExtensionName { .. })
        ));
    }

    #[test]
    fn test_extension_values_are_stored_as_scalars() {
        let mut ctx = v1_context();
        let time = DateTime::from_timestamp(1_577_836_800, 5).unwrap();
        ctx.set_extension("ts", time).unwrap();
        ctx.set_extension("bin", vec![1u8, 2, 3]).unwrap();
        ctx.set_extension("link", Value::uri("https://example.com")).unwrap();
        ctx.set_extension("flag", true).unwrap();
        ctx.set_extension("count", 7).unwrap();

        assert_eq!(
            ctx.extension("ts"),
            Some(&Value::from("2020-01-01T00:00:00.000000005Z"))
        );
        assert_eq!(ctx.extension("bin"), Some(&Value::from("AQID")));
        assert_eq!(ctx.extension("link"), Some(&Value::from("https://example.com")));
        assert_eq!(ctx.extension("flag"), Some(&Value::Boolean(true)));
        assert_eq!(ctx.extension("count"), Some(&Value::Integer(7)));
    }

    #[test]
    fn test_attributes_are_in_canonical_order() {
        let mut ctx = v1_context();
        ctx.set(AttributeKind::Time, Utc::now()).unwrap();
        ctx.set(AttributeKind::Subject, "sub").unwrap();
        let names: Vec<_> = ctx.attributes().map(|(spec, _)| spec.name).collect();
        assert_eq!(names, vec!["specversion", "id", "source", "type", "subject", "time"]);
    }

    #[test]
    fn test_as_version_renames_and_drops() {
        let mut ctx = Context::new(SpecVersion::V03);
        ctx.set(AttributeKind::Id, "aaa").unwrap();
        ctx.set(AttributeKind::Source, Value::uri_ref("/source")).unwrap();
        ctx.set(AttributeKind::Type, "t").unwrap();
        ctx.set(AttributeKind::DataSchema, Value::uri_ref("http://example.com/schema")).unwrap();
        ctx.set(AttributeKind::DataContentEncoding, "base64").unwrap();
        ctx.set_extension("ext", 7).unwrap();

        let v1 = ctx.as_version(SpecVersion::V10).unwrap();
        assert_eq!(v1.spec_version(), SpecVersion::V10);
        assert_eq!(
            v1.get(AttributeKind::DataSchema),
            Some(&Value::uri("http://example.com/schema"))
        );
        assert!(!v1.contains(AttributeKind::DataContentEncoding));
        assert_eq!(v1.extension("ext"), Some(&Value::Integer(7)));
        assert_eq!(v1.get(AttributeKind::SpecVersion), Some(&Value::from("1.0")));

        let back = v1.as_version(SpecVersion::V03).unwrap();
        assert_eq!(
            back.attributes()
                .find(|(spec, _)| spec.kind == AttributeKind::DataSchema)
                .map(|(spec, _)| spec.name),
            Some("schemaurl")
        );
    }

    #[test]
    fn test_validate() {
        assert!(v1_context().validate().is_ok());
        let ctx = Context::new(SpecVersion::V10);
        assert_eq!(
            ctx.validate(),
            Err(BindingError::MissingRequired {
                attribute: "id".to_string()
            })
        );
    }
}
