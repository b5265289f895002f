//! Attribute catalog for every supported spec version.
//!
//! This module provides the static description of event context attributes:
//!
//! - [`SpecVersion`] - The spec versions Prism knows how to represent
//! - [`AttributeKind`] - Version-independent identity of an attribute
//! - [`AttributeSpec`] - Name, value kind, and presence rules for one attribute
//! - [`Version`] - The catalog of attributes for one spec version
//! - [`Versions`] - The spec version provider, looking up catalogs by name
//!
//! Catalogs are built once and never change afterwards. Lookups are
//! case-sensitive and do not allocate.
//!
//! # Example
//!
//! ```rust
//! use prism_core::spec::{AttributeKind, SpecVersion, Versions};
//!
//! let v1 = Versions::standard().version("1.0").unwrap();
//! let schema = v1.attribute("dataschema").unwrap();
//! assert_eq!(schema.kind, AttributeKind::DataSchema);
//!
//! // The same kind has a different name in 0.3.
//! let v03 = SpecVersion::V03.spec();
//! assert_eq!(v03.attribute_by_kind(AttributeKind::DataSchema).unwrap().name, "schemaurl");
//! ```

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use serde::{Deserialize, Serialize};

use crate::error::{BindingError, BindingResult};
use crate::event::ValueKind;

/// Names that can never be used as extensions, on top of attribute names.
const RESERVED_PAYLOAD_NAMES: [&str; 2] = ["data", "data_base64"];

// ============================================================================
// Spec Version
// ============================================================================

/// A spec version of the event envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SpecVersion {
    /// Version 0.3.
    #[serde(rename = "0.3")]
    V03,
    /// Version 1.0.
    #[serde(rename = "1.0")]
    V10,
}

impl SpecVersion {
    /// Returns the wire name of this version.
    pub const fn as_str(self) -> &'static str {
        match self {
            SpecVersion::V03 => "0.3",
            SpecVersion::V10 => "1.0",
        }
    }

    /// Returns the attribute catalog of this version.
    pub fn spec(self) -> &'static Version {
        match self {
            SpecVersion::V03 => &V03,
            SpecVersion::V10 => &V10,
        }
    }
}

impl fmt::Display for SpecVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SpecVersion {
    type Err = BindingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "0.3" => Ok(SpecVersion::V03),
            "1.0" => Ok(SpecVersion::V10),
            other => Err(BindingError::UnknownSpecVersion(other.to_string())),
        }
    }
}

// ============================================================================
// Attribute Kind
// ============================================================================

/// Version-independent identity of a context attribute.
///
/// The declaration order is the canonical observation order: `specversion`
/// always comes first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AttributeKind {
    SpecVersion,
    Id,
    Source,
    Type,
    DataContentType,
    DataSchema,
    DataContentEncoding,
    Subject,
    Time,
}

impl fmt::Display for AttributeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AttributeKind::SpecVersion => "SpecVersion",
            AttributeKind::Id => "ID",
            AttributeKind::Source => "Source",
            AttributeKind::Type => "Type",
            AttributeKind::DataContentType => "DataContentType",
            AttributeKind::DataSchema => "DataSchema",
            AttributeKind::DataContentEncoding => "DataContentEncoding",
            AttributeKind::Subject => "Subject",
            AttributeKind::Time => "Time",
        };
        f.write_str(name)
    }
}

// ============================================================================
// Attribute Spec
// ============================================================================

/// Static description of one attribute within one spec version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AttributeSpec {
    /// Version-independent identity.
    pub kind: AttributeKind,
    /// Canonical wire name in this version.
    pub name: &'static str,
    /// The kind every value of this attribute must have.
    pub value_kind: ValueKind,
    /// Whether every event of this version must carry the attribute.
    pub required: bool,
    /// Whether the attribute can be written through [`Context::set`](crate::event::Context::set).
    pub mutable: bool,
}

impl AttributeSpec {
    const fn required(kind: AttributeKind, name: &'static str, value_kind: ValueKind) -> Self {
        Self {
            kind,
            name,
            value_kind,
            required: true,
            mutable: true,
        }
    }

    const fn optional(kind: AttributeKind, name: &'static str, value_kind: ValueKind) -> Self {
        Self {
            kind,
            name,
            value_kind,
            required: false,
            mutable: true,
        }
    }

    const fn spec_version() -> Self {
        Self {
            kind: AttributeKind::SpecVersion,
            name: "specversion",
            value_kind: ValueKind::String,
            required: true,
            mutable: false,
        }
    }
}

// ============================================================================
// Version Catalog
// ============================================================================

/// The attribute catalog of a single spec version.
#[derive(Debug, Clone)]
pub struct Version {
    spec_version: SpecVersion,
    attributes: Vec<AttributeSpec>,
    by_name: HashMap<&'static str, usize>,
    by_kind: HashMap<AttributeKind, usize>,
}

impl Version {
    /// Creates a catalog from a list of attribute specs.
    ///
    /// Attributes are kept in canonical order regardless of input order.
    pub fn new(spec_version: SpecVersion, mut attributes: Vec<AttributeSpec>) -> Self {
        attributes.sort_by_key(|attr| attr.kind);
        let by_name = attributes
            .iter()
            .enumerate()
            .map(|(index, attr)| (attr.name, index))
            .collect();
        let by_kind = attributes
            .iter()
            .enumerate()
            .map(|(index, attr)| (attr.kind, index))
            .collect();
        Self {
            spec_version,
            attributes,
            by_name,
            by_kind,
        }
    }

    /// The 0.3 catalog.
    pub fn v03() -> Self {
        Self::new(
            SpecVersion::V03,
            vec![
                AttributeSpec::spec_version(),
                AttributeSpec::required(AttributeKind::Id, "id", ValueKind::String),
                AttributeSpec::required(AttributeKind::Source, "source", ValueKind::UriRef),
                AttributeSpec::required(AttributeKind::Type, "type", ValueKind::String),
                AttributeSpec::optional(
                    AttributeKind::DataContentType,
                    "datacontenttype",
                    ValueKind::String,
                ),
                AttributeSpec::optional(AttributeKind::DataSchema, "schemaurl", ValueKind::UriRef),
                AttributeSpec::optional(
                    AttributeKind::DataContentEncoding,
                    "datacontentencoding",
                    ValueKind::String,
                ),
                AttributeSpec::optional(AttributeKind::Subject, "subject", ValueKind::String),
                AttributeSpec::optional(AttributeKind::Time, "time", ValueKind::Timestamp),
            ],
        )
    }

    /// The 1.0 catalog.
    pub fn v10() -> Self {
        Self::new(
            SpecVersion::V10,
            vec![
                AttributeSpec::spec_version(),
                AttributeSpec::required(AttributeKind::Id, "id", ValueKind::String),
                AttributeSpec::required(AttributeKind::Source, "source", ValueKind::UriRef),
                AttributeSpec::required(AttributeKind::Type, "type", ValueKind::String),
                AttributeSpec::optional(
                    AttributeKind::DataContentType,
                    "datacontenttype",
                    ValueKind::String,
                ),
                AttributeSpec::optional(AttributeKind::DataSchema, "dataschema", ValueKind::Uri),
                AttributeSpec::optional(AttributeKind::Subject, "subject", ValueKind::String),
                AttributeSpec::optional(AttributeKind::Time, "time", ValueKind::Timestamp),
            ],
        )
    }

    /// Returns the version this catalog describes.
    pub fn spec_version(&self) -> SpecVersion {
        self.spec_version
    }

    /// Looks up an attribute by its wire name.
    pub fn attribute(&self, name: &str) -> Option<&AttributeSpec> {
        self.by_name.get(name).map(|&index| &self.attributes[index])
    }

    /// Looks up an attribute by kind.
    pub fn attribute_by_kind(&self, kind: AttributeKind) -> Option<&AttributeSpec> {
        self.by_kind.get(&kind).map(|&index| &self.attributes[index])
    }

    /// Returns all attributes in canonical order.
    pub fn attributes(&self) -> &[AttributeSpec] {
        &self.attributes
    }

    /// Returns the attributes every event of this version must carry.
    pub fn required(&self) -> impl Iterator<Item = &AttributeSpec> {
        self.attributes.iter().filter(|attr| attr.required)
    }
}

static V03: LazyLock<Version> = LazyLock::new(Version::v03);
static V10: LazyLock<Version> = LazyLock::new(Version::v10);
static STANDARD: LazyLock<Versions> =
    LazyLock::new(|| Versions::new([V03.clone(), V10.clone()]));

// ============================================================================
// Spec Version Provider
// ============================================================================

/// The set of spec versions registered with the process.
///
/// # Example
///
/// ```rust
/// use prism_core::spec::{Version, Versions};
///
/// let only_v1 = Versions::new([Version::v10()]);
/// assert!(only_v1.version("0.3").is_err());
/// assert!(only_v1.is_reserved("source"));
/// ```
#[derive(Debug, Clone)]
pub struct Versions {
    versions: Vec<Version>,
    reserved: HashSet<&'static str>,
}

impl Versions {
    /// Creates a provider from the given catalogs.
    pub fn new(versions: impl IntoIterator<Item = Version>) -> Self {
        let versions: Vec<Version> = versions.into_iter().collect();
        let reserved = versions
            .iter()
            .flat_map(|version| version.attributes().iter().map(|attr| attr.name))
            .chain(RESERVED_PAYLOAD_NAMES)
            .collect();
        Self { versions, reserved }
    }

    /// Returns the process-wide provider registering 0.3 and 1.0.
    pub fn standard() -> &'static Versions {
        &STANDARD
    }

    /// Returns the catalog for a version, if registered.
    pub fn get(&self, spec_version: SpecVersion) -> BindingResult<&Version> {
        self.versions
            .iter()
            .find(|version| version.spec_version() == spec_version)
            .ok_or_else(|| BindingError::UnknownSpecVersion(spec_version.to_string()))
    }

    /// Returns the catalog for a version's wire name, if registered.
    pub fn version(&self, name: &str) -> BindingResult<&Version> {
        self.get(name.parse()?)
    }

    /// Searches all registered versions for an attribute name.
    pub fn attribute(&self, name: &str) -> Option<&AttributeSpec> {
        self.versions
            .iter()
            .find_map(|version| version.attribute(name))
    }

    /// Returns whether a name is reserved and cannot be used for extensions.
    pub fn is_reserved(&self, name: &str) -> bool {
        self.reserved.contains(name)
    }

    /// Iterates over the registered catalogs.
    pub fn iter(&self) -> impl Iterator<Item = &Version> {
        self.versions.iter()
    }
}
