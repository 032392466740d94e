use serde::Deserialize;

use super::schema::{FieldType, TableKind};
use crate::query::Operator;

/// The raw, serde-facing shape of a schema before validation. `Database`
/// is built from this via `TryFrom`.
#[derive(Debug, Deserialize)]
pub struct PrimitiveSchema {
    pub tables: Vec<PrimitiveTable>,
    #[serde(default)]
    pub links: Vec<PrimitiveLink>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrimitiveTable {
    pub name: String,
    /// Display alias; empty or absent means "same as name".
    #[serde(default)]
    pub alias: Option<String>,
    #[serde(default)]
    pub kind: TableKind,
    pub fields: Vec<PrimitiveField>,
    /// Names of the fields used for default ordering.
    #[serde(default)]
    pub order_fields: Vec<String>,
    /// Pointer field names, required for linker tables.
    #[serde(default)]
    pub a_ptr: Option<String>,
    #[serde(default)]
    pub b_ptr: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrimitiveField {
    pub name: String,
    #[serde(rename = "type", default)]
    pub field_type: FieldType,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default = "searchable_default")]
    pub searchable: bool,
    #[serde(default)]
    pub preset_values: Option<Vec<serde_json::Value>>,
    /// Explicit allowed-operator override; absent means "derived from type".
    #[serde(default)]
    pub operators: Option<Vec<Operator>>,
    /// Target table name for `link` fields.
    #[serde(default)]
    pub target: Option<String>,
}

fn searchable_default() -> bool {
    true
}

#[derive(Debug, Deserialize)]
pub struct PrimitiveLink {
    pub name: String,
    pub branches: Vec<String>,
}
