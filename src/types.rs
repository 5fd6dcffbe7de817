use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};

/// Distinct values observed for one sub-property of an array/object path
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Property {
    /// Rendered scalar values, in first-seen order
    pub values: IndexSet<String>,

    /// Set once too many distinct values were seen; never reset
    pub limited: bool,
}

/// Sub-property name -> collected values
pub type Properties = IndexMap<String, Property>;

/// Shape descriptor collected for a single field path
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Header {
    /// The path always held a value that fits in a single cell
    Scalar,

    /// Array path: `count` is the longest array seen, `properties` the scalar
    /// properties of its object elements
    Array {
        count: usize,
        #[serde(default)]
        properties: Properties,
    },

    /// Object path whose values were all scalars so far
    Object {
        #[serde(default)]
        properties: Properties,
    },

    /// Object path that held non-scalar values at least once. Its children
    /// are expanded key by key and it never becomes named/grouped material.
    Degenerate,
}

impl Header {
    pub fn empty_array() -> Self {
        Header::Array {
            count: 0,
            properties: Properties::new(),
        }
    }

    pub fn empty_object() -> Self {
        Header::Object {
            properties: Properties::new(),
        }
    }

    /// Element count for array paths
    pub fn count(&self) -> Option<usize> {
        match self {
            Header::Array { count, .. } => Some(*count),
            _ => None,
        }
    }

    pub fn properties(&self) -> Option<&Properties> {
        match self {
            Header::Array { properties, .. } | Header::Object { properties } => Some(properties),
            _ => None,
        }
    }

    pub fn properties_mut(&mut self) -> Option<&mut Properties> {
        match self {
            Header::Array { properties, .. } | Header::Object { properties } => Some(properties),
            _ => None,
        }
    }

    /// Non-empty collected properties, the precondition for `named` options
    pub fn has_properties(&self) -> bool {
        self.properties().is_some_and(|p| !p.is_empty())
    }

    /// Paths that never produced any column content
    pub fn is_unpopulated(&self) -> bool {
        matches!(self, Header::Array { count: 0, .. } | Header::Degenerate)
    }

    /// Name used when reporting a type change
    pub fn kind(&self) -> &'static str {
        match self {
            Header::Scalar => "scalar",
            Header::Array { .. } => "array",
            Header::Object { .. } | Header::Degenerate => "object",
        }
    }
}

/// Field path -> shape descriptor, in first-seen order
pub type Stats = IndexMap<String, Header>;

/// Field path -> reason the path's data is considered invalid
pub type InvalidProperties = IndexMap<String, String>;

/// Result of a collection pass, ready to be handed to an exporter
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectedStats {
    pub stats: Stats,
    pub invalid_properties: InvalidProperties,
}

/// Per-field formatting options.
///
/// - `named`: create one column per value of the `name` property, so runtime
///   values become part of the column names.
/// - `grouped`: fit all data of the field into a single cell (or one cell per
///   property for arrays of objects).
/// - both: collect every named element into one cell.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldOption {
    pub name: Option<String>,
    pub named: bool,
    pub grouped: bool,
    /// Header -> separator overriding the exporter's grouped separator
    pub grouped_separators: IndexMap<String, String>,
}

impl FieldOption {
    pub fn named(name: impl Into<String>) -> Self {
        FieldOption {
            name: Some(name.into()),
            named: true,
            ..Default::default()
        }
    }

    pub fn grouped() -> Self {
        FieldOption {
            grouped: true,
            ..Default::default()
        }
    }

    pub fn named_and_grouped(name: impl Into<String>) -> Self {
        FieldOption {
            name: Some(name.into()),
            named: true,
            grouped: true,
            ..Default::default()
        }
    }

    pub fn with_separator(mut self, header: impl Into<String>, separator: impl Into<String>) -> Self {
        self.grouped_separators.insert(header.into(), separator.into());
        self
    }

    /// Name property for named options (empty names count as missing)
    pub fn name_property(&self) -> Option<&str> {
        self.name.as_deref().filter(|n| !n.is_empty())
    }
}
