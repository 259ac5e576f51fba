//! Expression library schema definitions.

use fc_core::ValueKind;
use fc_expr::GeomDomain;
use serde::{Deserialize, Serialize};

/// An expression library file: declared quantities and geometries plus
/// named expressions in definition order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Library {
    pub version: u32,
    pub name: String,
    #[serde(default)]
    pub quantities: Vec<QuantityDef>,
    #[serde(default)]
    pub geometries: Vec<GeometryDef>,
    #[serde(default)]
    pub expressions: Vec<NamedExpressionDef>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QuantityDef {
    pub name: String,
    /// Required at the current version; absent only in unmigrated
    /// version-1 geometry entries.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<ValueKind>,
    /// Version-1 files declared geometries inline here; migration moves
    /// them to `geometries`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<GeomDomain>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GeometryDef {
    pub name: String,
    pub domain: GeomDomain,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NamedExpressionDef {
    pub name: String,
    pub expr: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Library {
    /// Empty library at the current schema version.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            version: crate::migrate::LATEST_VERSION,
            name: name.into(),
            quantities: Vec::new(),
            geometries: Vec::new(),
            expressions: Vec::new(),
        }
    }
}
