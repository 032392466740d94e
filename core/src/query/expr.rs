use std::hash::{Hash, Hasher};

use itertools::Itertools;

use super::operators::{JoinType, LogicalOperator, Operator};
use crate::locale::Locale;
use crate::schema::{Database, FieldType, Link, LinkId, TableId, REC_ID};
use crate::utils::OrderedSet;
use crate::values::{bool_value, date_value, number_string, number_value, Value};

/// Everything expression rendering needs to resolve schema references and
/// format values.
pub struct Scope<'a> {
    pub db: &'a Database,
    pub locale: &'a Locale,
}

/// A query expression. At minimum it can reference a table, and it renders
/// to one SQL clause fragment.
pub trait Expression {
    /// The table the expression is related to, if any.
    fn table(&self) -> Option<TableId>;

    /// The expression rendered as a SQL fragment.
    fn expression(&self, scope: &Scope) -> String;
}

/// Tokens that qualify with the table alias without naming a real field.
const WILDCARDS: [&str; 3] = ["RECID", "*", "**"];

/// An expression that represents a table field, optionally renamed in the
/// output through an alias.
pub trait FieldExpression: Expression {
    fn field_expression(&self) -> &str;
    fn field_alias(&self) -> Option<&str>;

    /// The alias used to qualify the field expression. Unless the expression
    /// is a record-id or wildcard token it must name a searchable field of
    /// the table to be qualified at all.
    fn table_alias<'a>(&self, scope: &'a Scope) -> Option<&'a str> {
        let table = scope.db.table(self.table()?);
        if !WILDCARDS.contains(&self.field_expression().to_uppercase().as_str()) {
            table.searchable_field(self.field_expression())?;
        }
        Some(&table.alias)
    }

    /// The output alias for a projected field: the explicit alias when given,
    /// else the table's record-id alias for a record-id expression.
    fn select_alias(&self, scope: &Scope) -> Option<String> {
        if let Some(alias) = self.field_alias() {
            return Some(alias.to_string());
        }
        let table = scope.db.table(self.table()?);
        self.field_expression()
            .eq_ignore_ascii_case(REC_ID)
            .then(|| table.rec_id_alias())
    }
}

/// Case-insensitive, table-scoped identity of a field expression; used both
/// for equality and for dedup inside ordered sets.
fn field_expression_eq<T: FieldExpression>(lhs: &T, rhs: &T) -> bool {
    lhs.table() == rhs.table()
        && lhs.field_expression().to_uppercase() == rhs.field_expression().to_uppercase()
}

fn field_expression_hash<T: FieldExpression, H: Hasher>(expr: &T, state: &mut H) {
    expr.table().hash(state);
    expr.field_expression().to_uppercase().hash(state);
}

/// A projected column of the SELECT clause.
#[derive(Debug, Clone, Default)]
pub struct Select {
    pub field_expression: String,
    pub table: Option<TableId>,
    pub field_alias: Option<String>,
}

impl Select {
    pub fn new(field_expression: impl Into<String>, table: Option<TableId>) -> Self {
        Self {
            field_expression: field_expression.into(),
            table,
            field_alias: None,
        }
    }
}

impl Expression for Select {
    fn table(&self) -> Option<TableId> {
        self.table
    }

    fn expression(&self, scope: &Scope) -> String {
        let table_alias = self
            .table_alias(scope)
            .map(|alias| format!("{alias}."))
            .unwrap_or_default();
        let select_alias = self
            .select_alias(scope)
            .map(|alias| format!(" as [{alias}]"))
            .unwrap_or_default();
        format!("{table_alias}{}{select_alias}", self.field_expression)
    }
}

impl FieldExpression for Select {
    fn field_expression(&self) -> &str {
        &self.field_expression
    }

    fn field_alias(&self) -> Option<&str> {
        self.field_alias.as_deref()
    }
}

impl PartialEq for Select {
    fn eq(&self, other: &Self) -> bool {
        field_expression_eq(self, other)
    }
}

impl Eq for Select {}

impl Hash for Select {
    fn hash<H: Hasher>(&self, state: &mut H) {
        field_expression_hash(self, state);
    }
}

/// The table list of a FROM clause.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct From {
    /// The tables needed to satisfy joins and extract data.
    pub tables: OrderedSet<TableId>,
}

impl From {
    pub fn new(tables: OrderedSet<TableId>) -> Self {
        Self { tables }
    }
}

impl Expression for From {
    fn table(&self) -> Option<TableId> {
        self.tables.first().copied()
    }

    fn expression(&self, scope: &Scope) -> String {
        self.tables
            .iter()
            .map(|&id| {
                let table = scope.db.table(id);
                if table.name == table.alias {
                    format!("[{}]", table.name)
                } else {
                    format!("[{}] {}", table.name, table.alias)
                }
            })
            .join(", ")
    }
}

/// A join chain over schema links, rendered as root table plus one JOIN row
/// per further branch.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FromLinks {
    pub table: Option<TableId>,
    pub links: OrderedSet<LinkId>,
    /// Static join type applied to every branch.
    pub join_type: JoinType,
}

impl FromLinks {
    pub fn new(table: Option<TableId>, links: OrderedSet<LinkId>, join_type: JoinType) -> Self {
        Self {
            table,
            links,
            join_type,
        }
    }
}

impl Expression for FromLinks {
    fn table(&self) -> Option<TableId> {
        self.table
    }

    fn expression(&self, scope: &Scope) -> String {
        if self.links.is_empty() {
            return String::new();
        }
        let join = self.join_type.sql();
        let mut processed: Vec<TableId> = Vec::new();
        let mut parts: Vec<String> = Vec::new();

        let join_part = |link: &Link, table_id: TableId, processed: &mut Vec<TableId>| {
            if processed.contains(&table_id) {
                return None;
            }
            processed.push(table_id);
            let table = scope.db.table(table_id);
            Some(format!("{join} [{}] {} ON {}", table.name, table.alias, link.name))
        };

        let mut link_ids = self.links.iter().copied();
        let first = scope.db.link(link_ids.next().unwrap());
        let mut branches = first.branches.iter().copied();
        let root_id = branches.next().expect("link has no branches");
        let root = scope.db.table(root_id);
        parts.push(format!("[{}] {}", root.name, root.alias));
        processed.push(root_id);
        for branch in branches {
            parts.extend(join_part(first, branch, &mut processed));
        }
        for id in link_ids {
            let link = scope.db.link(id);
            for branch in link.branches.iter().copied() {
                parts.extend(join_part(link, branch, &mut processed));
            }
        }
        parts.join("\n")
    }
}

/// A grouping expression of the GROUP BY clause.
#[derive(Debug, Clone, Default)]
pub struct Group {
    pub field_expression: String,
    pub table: Option<TableId>,
    pub field_alias: Option<String>,
}

impl Group {
    pub fn new(field_expression: impl Into<String>, table: Option<TableId>) -> Self {
        Self {
            field_expression: field_expression.into(),
            table,
            field_alias: None,
        }
    }
}

/// Shared resolution for grouping and ordering targets: an explicit alias
/// wins, then a table reference (alias for real fields, else the table
/// name), then the raw expression.
fn group_order_target<T: FieldExpression>(expr: &T, scope: &Scope) -> String {
    if let Some(alias) = expr.field_alias() {
        return format!("[{alias}]");
    }
    let table_reference = expr
        .table_alias(scope)
        .map(str::to_string)
        .or_else(|| expr.table().map(|id| scope.db.table(id).name.clone()));
    match table_reference {
        Some(reference) => format!("{reference}.{}", expr.field_expression()),
        None => expr.field_expression().to_string(),
    }
}

impl Expression for Group {
    fn table(&self) -> Option<TableId> {
        self.table
    }

    fn expression(&self, scope: &Scope) -> String {
        group_order_target(self, scope)
    }
}

impl FieldExpression for Group {
    fn field_expression(&self) -> &str {
        &self.field_expression
    }

    fn field_alias(&self) -> Option<&str> {
        self.field_alias.as_deref()
    }
}

impl PartialEq for Group {
    fn eq(&self, other: &Self) -> bool {
        field_expression_eq(self, other)
    }
}

impl Eq for Group {}

impl Hash for Group {
    fn hash<H: Hasher>(&self, state: &mut H) {
        field_expression_hash(self, state);
    }
}

/// An ordering expression of the ORDER BY clause.
#[derive(Debug, Clone, Default)]
pub struct Order {
    pub field_expression: String,
    pub table: Option<TableId>,
    pub field_alias: Option<String>,
    pub descending: bool,
}

impl Order {
    pub fn new(field_expression: impl Into<String>, table: Option<TableId>) -> Self {
        Self {
            field_expression: field_expression.into(),
            table,
            field_alias: None,
            descending: false,
        }
    }
}

impl Expression for Order {
    fn table(&self) -> Option<TableId> {
        self.table
    }

    fn expression(&self, scope: &Scope) -> String {
        let target = group_order_target(self, scope);
        if self.descending {
            format!("{target} DESC")
        } else {
            target
        }
    }
}

impl FieldExpression for Order {
    fn field_expression(&self) -> &str {
        &self.field_expression
    }

    fn field_alias(&self) -> Option<&str> {
        self.field_alias.as_deref()
    }
}

impl PartialEq for Order {
    fn eq(&self, other: &Self) -> bool {
        field_expression_eq(self, other) && self.descending == other.descending
    }
}

impl Eq for Order {}

impl Hash for Order {
    fn hash<H: Hasher>(&self, state: &mut H) {
        field_expression_hash(self, state);
        self.descending.hash(state);
    }
}

/// A predicate of the WHERE clause: field or free-form expression on the
/// left, a typed literal on the right, chained by a logical operator.
#[derive(Debug, Clone, Default)]
pub struct Where {
    /// The field name or free-form fragment used as the left argument. An
    /// empty string reads as a record-id request.
    pub field_expression: String,
    pub value: Option<Value>,
    pub operator: Operator,
    pub logical: LogicalOperator,
    pub table: Option<TableId>,
    pub field_alias: Option<String>,
    /// Overrides the inferred field type when set to anything but
    /// `Undefined`.
    pub preferred_type: Option<FieldType>,
}

impl Where {
    pub fn new(
        field_expression: impl Into<String>,
        value: Option<Value>,
        operator: Operator,
        table: Option<TableId>,
    ) -> Self {
        Self {
            field_expression: field_expression.into(),
            value,
            operator,
            table,
            ..Self::default()
        }
    }

    fn field_type(&self, scope: &Scope) -> Option<FieldType> {
        let table = scope.db.table(self.table?);
        table
            .searchable_field(&self.field_expression)
            .map(|f| f.field_type)
    }

    /// Resolve the left argument and the inferred type, in precedence order:
    /// explicit alias, record-id request, field lookup, free-form fragment.
    fn left_argument(&self, scope: &Scope) -> (String, FieldType) {
        if let Some(alias) = self.field_alias() {
            let inferred = self.field_type(scope).unwrap_or(if self.field_expression.is_empty() {
                FieldType::Number
            } else {
                FieldType::String
            });
            return (format!("[{alias}]"), inferred);
        }
        if self.field_expression.is_empty() {
            let left = match self.table {
                Some(id) => format!("[{}]", scope.db.table(id).rec_id_alias()),
                None => REC_ID.to_string(),
            };
            return (left, FieldType::Number);
        }
        match self.field_type(scope) {
            Some(inferred) => {
                let prefix = self
                    .table_alias(scope)
                    .map(|alias| format!("{alias}."))
                    .unwrap_or_default();
                (format!("{prefix}{}", self.field_expression), inferred)
            }
            None => (self.field_expression.clone(), FieldType::String),
        }
    }

    fn render(&self, left: String, field_type: FieldType, scope: &Scope) -> String {
        let mut left = left;
        let mut op = self.operator.sql();
        let right = match field_type {
            FieldType::String => {
                let value_string = match &self.value {
                    Some(Value::Str(s)) => s.clone(),
                    _ => String::new(),
                };
                let mut right = format!("'{}'", self.escaped(&value_string));
                match self.operator {
                    Operator::BeginsWith => {
                        left = format!("LEFT({left}, {})", value_string.chars().count());
                        op = "=";
                    }
                    Operator::EndsWith => {
                        left = format!("RIGHT({left}, {})", value_string.chars().count());
                        op = "=";
                    }
                    Operator::Contains => {
                        right = format!("'%{}%'", self.escaped(&value_string));
                        op = "LIKE";
                    }
                    _ => {}
                }
                right
            }
            FieldType::Date | FieldType::Time => {
                match self.value.as_ref().and_then(|v| date_value(v, scope.locale)) {
                    Some(date) => format!("'{}'", scope.locale.format_date(date)),
                    // An unparseable date leaves the right-hand side empty,
                    // yielding a malformed fragment rather than a crash.
                    None => String::new(),
                }
            }
            FieldType::Boolean => {
                let truthy = self
                    .value
                    .as_ref()
                    .and_then(|v| bool_value(v, scope.locale))
                    .unwrap_or(false);
                let literal = if truthy { "TRUE" } else { "FALSE" };
                literal.to_string()
            }
            FieldType::Number | FieldType::Link => {
                let number = self
                    .value
                    .as_ref()
                    .and_then(|v| number_value(v, scope.locale))
                    .unwrap_or(0.0);
                number_string(number)
            }
            FieldType::Undefined => return format!("{left} IS NULL"),
        };
        format!("{left} {op} {right}")
    }

    /// Escaping follows the original operator, not the rewritten one.
    fn escaped(&self, value: &str) -> String {
        match self.operator {
            Operator::Like => escape_for_like(value),
            Operator::Regex => regex::escape(value),
            _ => value.to_string(),
        }
    }
}

/// Escape LIKE wildcard characters in bracket style.
fn escape_for_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '[' | '%' | '_' => {
                escaped.push('[');
                escaped.push(c);
                escaped.push(']');
            }
            _ => escaped.push(c),
        }
    }
    escaped
}

impl Expression for Where {
    fn table(&self) -> Option<TableId> {
        self.table
    }

    fn expression(&self, scope: &Scope) -> String {
        let (left, inferred) = self.left_argument(scope);
        let field_type = match self.preferred_type {
            Some(preferred) if preferred != FieldType::Undefined => preferred,
            _ => inferred,
        };
        self.render(left, field_type, scope)
    }
}

impl FieldExpression for Where {
    fn field_expression(&self) -> &str {
        &self.field_expression
    }

    fn field_alias(&self) -> Option<&str> {
        self.field_alias.as_deref()
    }
}

impl PartialEq for Where {
    fn eq(&self, other: &Self) -> bool {
        field_expression_eq(self, other)
            && self.value == other.value
            && self.operator == other.operator
            && self.logical == other.logical
    }
}

impl Eq for Where {}

impl Hash for Where {
    fn hash<H: Hasher>(&self, state: &mut H) {
        field_expression_hash(self, state);
        self.value.hash(state);
        self.operator.hash(state);
        self.logical.hash(state);
    }
}
