use std::collections::hash_map::Entry::{Occupied, Vacant};
use std::collections::HashMap;

use serde::Deserialize;

use super::primitive_schema::{PrimitiveField, PrimitiveSchema, PrimitiveTable};
use crate::errors::msg;
use crate::locale::Locale;
use crate::query::Operator;
use crate::values::Value;

pub type TableName = String;
pub type FieldName = String;
pub type TableId = usize;
pub type FieldId = usize;
pub type LinkId = usize;

/// Field expression key standing for a row's record id.
pub const REC_ID: &str = "recId";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TableKind {
    #[default]
    Table,
    /// A many-to-many association table carrying two pointer fields.
    Linker,
}

/// Semantic type of a field, driving WHERE value formatting and the
/// allowed-operator table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    String,
    Date,
    Time,
    Boolean,
    Number,
    Link,
    #[default]
    Undefined,
}

#[derive(Debug)]
pub struct Database {
    pub tables: Vec<Table>,
    pub table_lookup: HashMap<TableName, TableId>,
    pub links: Vec<Link>,
}

impl Database {
    pub fn from_json(schema_json: &str) -> Result<Database, String> {
        let primitive = serde_json::from_str::<PrimitiveSchema>(schema_json)
            .map_err(|_| msg::schema_not_json())?;
        Database::try_from(primitive)
    }

    pub fn table(&self, id: TableId) -> &Table {
        &self.tables[id]
    }

    pub fn table_named(&self, name: &str) -> Option<&Table> {
        self.table_lookup.get(name).map(|&id| &self.tables[id])
    }

    pub fn link(&self, id: LinkId) -> &Link {
        &self.links[id]
    }

    pub fn linker_tables(&self) -> impl Iterator<Item = &Table> {
        self.tables.iter().filter(|t| t.kind == TableKind::Linker)
    }
}

#[derive(Debug)]
pub struct Table {
    pub id: TableId,
    pub name: TableName,
    /// Short alias used to qualify field references; equals `name` when the
    /// schema declares none.
    pub alias: String,
    pub kind: TableKind,
    pub fields: Vec<Field>,
    pub field_lookup: HashMap<FieldName, FieldId>,
    /// Fields exposed to searching, in declaration order.
    pub searchable: Vec<FieldId>,
    /// Fields used for a table's default ordering.
    pub order_fields: Vec<FieldId>,
    /// Pointer fields, present iff `kind == Linker`.
    pub pointers: Option<Pointers>,
}

#[derive(Debug, Clone, Copy)]
pub struct Pointers {
    pub a: FieldId,
    pub b: FieldId,
}

impl Table {
    /// Synthetic output alias for the table's record id, `{alias}_recId`.
    pub fn rec_id_alias(&self) -> String {
        format!("{}_{}", self.alias, REC_ID)
    }

    pub fn display_name<'a>(&'a self, locale: &'a Locale) -> &'a str {
        locale.translate(&self.name)
    }

    pub fn field(&self, id: FieldId) -> &Field {
        &self.fields[id]
    }

    /// Look up a searchable field by exact, case-sensitive name.
    pub fn searchable_field(&self, name: &str) -> Option<&Field> {
        self.searchable
            .iter()
            .map(|&id| &self.fields[id])
            .find(|f| f.name == name)
    }

    fn expect_pointers(&self) -> Pointers {
        self.pointers
            .unwrap_or_else(|| panic!("table `{}` is not a linker", self.name))
    }

    /// Whether one of this linker's pointers targets `table`.
    pub fn is_pointer_to(&self, table: TableId) -> bool {
        let pointers = self.expect_pointers();
        self.fields[pointers.a].target == Some(table) || self.fields[pointers.b].target == Some(table)
    }

    /// The side of this linker that is not `known`.
    pub fn other_target(&self, known: TableId) -> TableId {
        let pointers = self.expect_pointers();
        let a = self.fields[pointers.a].target.expect("pointer without target");
        let b = self.fields[pointers.b].target.expect("pointer without target");
        if a == known {
            b
        } else {
            a
        }
    }

    /// The pointer field of this linker targeting `table`, if any.
    pub fn pointer_at(&self, table: TableId) -> Option<&Field> {
        let pointers = self.expect_pointers();
        [pointers.a, pointers.b]
            .into_iter()
            .map(|id| &self.fields[id])
            .find(|f| f.target == Some(table))
    }
}

#[derive(Debug)]
pub struct Field {
    /// Back-reference to the owning table.
    pub table: TableId,
    pub name: FieldName,
    pub field_type: FieldType,
    pub label: String,
    /// Fixed choice set offered by editors, if any.
    pub preset_values: Option<Vec<Value>>,
    /// Explicit allowed-operator override.
    pub operators: Option<Vec<Operator>>,
    /// Target table of a `link` field.
    pub target: Option<TableId>,
}

impl Field {
    /// The operators a predicate over this field may use: the explicit
    /// override when present, else the table derived from the field type.
    pub fn allowed_operators(&self) -> &[Operator] {
        self.operators
            .as_deref()
            .unwrap_or_else(|| self.field_type.allowed_operators())
    }
}

#[derive(Debug)]
pub struct Link {
    pub id: LinkId,
    pub name: String,
    /// The tables this link connects.
    pub branches: Vec<TableId>,
}

impl Link {
    /// The linker table pointed at by this link, if any branch is one.
    pub fn linker<'a>(&self, db: &'a Database) -> Option<&'a Table> {
        self.branches
            .iter()
            .map(|&id| db.table(id))
            .find(|t| t.kind == TableKind::Linker)
    }

    /// The branch of a two-branch link that is not `known`.
    pub fn other_table(&self, known: TableId) -> Option<TableId> {
        assert!(
            self.branches.len() == 2,
            "wrong number of branches in link `{}`",
            self.name
        );
        self.branches.iter().copied().find(|&t| t != known)
    }

    pub fn is_between(&self, a: TableId, b: TableId) -> bool {
        self.branches.contains(&a) && self.branches.contains(&b)
    }
}

fn convert_preset_values(
    values: Option<Vec<serde_json::Value>>,
    field_name: &str,
) -> Result<Option<Vec<Value>>, String> {
    let Some(values) = values else { return Ok(None) };
    let mut converted = Vec::with_capacity(values.len());
    for value in values {
        match value {
            serde_json::Value::String(s) => converted.push(Value::Str(s)),
            serde_json::Value::Number(n) => {
                converted.push(Value::Number(n.as_f64().unwrap_or_default()))
            }
            serde_json::Value::Bool(b) => converted.push(Value::Bool(b)),
            _ => return Err(msg::unsupported_value(field_name)),
        }
    }
    Ok(Some(converted))
}

fn make_table(id: TableId, primitive: PrimitiveTable) -> Result<Table, String> {
    let alias = match primitive.alias {
        Some(alias) if !alias.is_empty() => alias,
        _ => primitive.name.clone(),
    };

    let mut fields = Vec::with_capacity(primitive.fields.len());
    let mut field_lookup = HashMap::new();
    let mut searchable = Vec::new();
    for (field_id, primitive_field) in primitive.fields.into_iter().enumerate() {
        let PrimitiveField {
            name,
            field_type,
            label,
            searchable: is_searchable,
            preset_values,
            operators,
            ..
        } = primitive_field;
        let preset_values = convert_preset_values(preset_values, &name)?;
        field_lookup.insert(name.clone(), field_id);
        if is_searchable {
            searchable.push(field_id);
        }
        fields.push(Field {
            table: id,
            label: label.unwrap_or_else(|| name.clone()),
            name,
            field_type,
            preset_values,
            operators,
            target: None,
        });
    }

    let mut order_fields = Vec::with_capacity(primitive.order_fields.len());
    for name in &primitive.order_fields {
        let field_id = field_lookup
            .get(name)
            .copied()
            .ok_or_else(|| msg::unknown_field(name, &primitive.name))?;
        order_fields.push(field_id);
    }

    Ok(Table {
        id,
        name: primitive.name,
        alias,
        kind: primitive.kind,
        fields,
        field_lookup,
        searchable,
        order_fields,
        pointers: None,
    })
}

impl TryFrom<PrimitiveSchema> for Database {
    type Error = String;

    fn try_from(primitive_schema: PrimitiveSchema) -> Result<Database, String> {
        // First pass: tables and fields, keeping the raw pointer names and
        // link-target names around for resolution once every table has an id.
        let mut field_targets: Vec<Vec<Option<String>>> = Vec::new();
        let mut pointer_names: Vec<(Option<String>, Option<String>)> = Vec::new();
        let mut tables = Vec::with_capacity(primitive_schema.tables.len());
        let mut table_lookup = HashMap::new();

        for (id, primitive_table) in primitive_schema.tables.into_iter().enumerate() {
            field_targets.push(
                primitive_table
                    .fields
                    .iter()
                    .map(|f| f.target.clone())
                    .collect(),
            );
            pointer_names.push((primitive_table.a_ptr.clone(), primitive_table.b_ptr.clone()));
            let table = make_table(id, primitive_table)?;
            match table_lookup.entry(table.name.clone()) {
                Occupied(_) => return Err(msg::duplicate_table(&table.name)),
                Vacant(e) => {
                    e.insert(id);
                }
            }
            tables.push(table);
        }

        // Second pass: resolve link-field targets and linker pointers.
        for table_id in 0..tables.len() {
            for (field_id, target) in field_targets[table_id].iter().enumerate() {
                if let Some(target_name) = target {
                    let target_id = *table_lookup
                        .get(target_name)
                        .ok_or_else(|| msg::unknown_table(target_name))?;
                    tables[table_id].fields[field_id].target = Some(target_id);
                }
            }

            let (a_ptr, b_ptr) = &pointer_names[table_id];
            let table = &tables[table_id];
            if table.kind == TableKind::Linker {
                let resolve = |name: &Option<String>| -> Result<FieldId, String> {
                    let name = name
                        .as_ref()
                        .ok_or_else(|| msg::linker_without_pointers(&table.name))?;
                    let field_id = table
                        .field_lookup
                        .get(name)
                        .copied()
                        .ok_or_else(|| msg::unknown_field(name, &table.name))?;
                    let field = &table.fields[field_id];
                    if field.field_type != FieldType::Link || field.target.is_none() {
                        return Err(msg::pointer_is_not_a_link(name, &table.name));
                    }
                    Ok(field_id)
                };
                let pointers = Pointers {
                    a: resolve(a_ptr)?,
                    b: resolve(b_ptr)?,
                };
                tables[table_id].pointers = Some(pointers);
            }
        }

        let mut links = Vec::with_capacity(primitive_schema.links.len());
        for (id, primitive_link) in primitive_schema.links.into_iter().enumerate() {
            if primitive_link.branches.len() < 2 {
                return Err(msg::link_needs_branches(&primitive_link.name));
            }
            let mut branches = Vec::with_capacity(primitive_link.branches.len());
            for name in &primitive_link.branches {
                let table_id = *table_lookup
                    .get(name)
                    .ok_or_else(|| msg::unknown_table(name))?;
                branches.push(table_id);
            }
            links.push(Link {
                id,
                name: primitive_link.name,
                branches,
            });
        }

        Ok(Database {
            tables,
            table_lookup,
            links,
        })
    }
}
