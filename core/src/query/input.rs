use serde::Deserialize;

use super::expr::{Group, Order, Select, Where};
use super::operators::{LogicalOperator, Operator};
use super::query::Query;
use crate::errors::msg;
use crate::schema::{Database, FieldType};
use crate::values::Value;

/// A declarative search description, the serde-facing stand-in for an
/// embedding editor driving the query API row by row.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryDescription {
    /// Name of the table being searched.
    pub table: String,
    #[serde(default)]
    pub distinct: bool,
    #[serde(default)]
    pub one_route_only: bool,
    #[serde(default)]
    pub select: Vec<SelectRow>,
    #[serde(default, rename = "where")]
    pub conditions: Vec<WhereRow>,
    #[serde(default)]
    pub group: Vec<GroupRow>,
    #[serde(default)]
    pub order: Vec<OrderRow>,
    /// Apply the table's declared default order fields.
    #[serde(default)]
    pub default_order: bool,
}

#[derive(Debug, Deserialize)]
pub struct SelectRow {
    pub field: String,
    #[serde(default)]
    pub alias: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WhereRow {
    #[serde(default)]
    pub field: String,
    #[serde(default)]
    pub value: serde_json::Value,
    #[serde(default)]
    pub op: Operator,
    #[serde(default)]
    pub conjunction: Conjunction,
    #[serde(default)]
    pub negated: bool,
    #[serde(default)]
    pub alias: Option<String>,
    #[serde(rename = "type", default)]
    pub preferred_type: Option<FieldType>,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Conjunction {
    #[default]
    And,
    Or,
}

#[derive(Debug, Deserialize)]
pub struct GroupRow {
    pub field: String,
    #[serde(default)]
    pub alias: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct OrderRow {
    pub field: String,
    #[serde(default)]
    pub alias: Option<String>,
    #[serde(default)]
    pub descending: bool,
}

fn logical_operator(conjunction: Conjunction, negated: bool) -> LogicalOperator {
    match conjunction {
        Conjunction::And => LogicalOperator::And { assertive: !negated },
        Conjunction::Or => LogicalOperator::Or { assertive: !negated },
    }
}

fn value_from_json(value: &serde_json::Value, context: &str) -> Result<Option<Value>, String> {
    match value {
        serde_json::Value::Null => Ok(None),
        serde_json::Value::String(s) => Ok(Some(Value::Str(s.clone()))),
        serde_json::Value::Number(n) => Ok(Some(Value::Number(n.as_f64().unwrap_or_default()))),
        serde_json::Value::Bool(b) => Ok(Some(Value::Bool(*b))),
        _ => Err(msg::unsupported_value(context)),
    }
}

impl QueryDescription {
    pub fn from_json(description_json: &str) -> Result<QueryDescription, String> {
        serde_json::from_str(description_json).map_err(|_| msg::description_not_json())
    }

    /// Build a query against `db` from this description. The projection
    /// defaults to the whole table when no select rows are given.
    pub fn build<'a>(&self, db: &'a Database) -> Result<Query<'a>, String> {
        let table = db
            .table_named(&self.table)
            .ok_or_else(|| msg::unknown_table(&self.table))?
            .id;

        let mut query = Query::new(db);
        query.distinct = self.distinct;
        query.one_route_only = self.one_route_only;
        query.main_tables.append(table);

        if self.select.is_empty() {
            query.select_fields.append(Select::new("*", Some(table)));
        }
        for row in &self.select {
            query.select_fields.append(Select {
                field_expression: row.field.clone(),
                table: Some(table),
                field_alias: row.alias.clone(),
            });
        }

        for row in &self.conditions {
            query.where_expressions.append(Where {
                field_expression: row.field.clone(),
                value: value_from_json(&row.value, &row.field)?,
                operator: row.op,
                logical: logical_operator(row.conjunction, row.negated),
                table: Some(table),
                field_alias: row.alias.clone(),
                preferred_type: row.preferred_type,
            });
        }

        for row in &self.group {
            query.group_fields.append(Group {
                field_expression: row.field.clone(),
                table: Some(table),
                field_alias: row.alias.clone(),
            });
        }

        for row in &self.order {
            query.order_by.append(Order {
                field_expression: row.field.clone(),
                table: Some(table),
                field_alias: row.alias.clone(),
                descending: row.descending,
            });
        }
        if self.default_order {
            query.set_order_fields(table);
        }

        Ok(query)
    }
}

#[cfg(test)]
mod tests {
    use crate::utils::get_test_resource;

    use super::*;

    fn music_db() -> Database {
        Database::from_json(&get_test_resource("music_schema.json")).unwrap()
    }

    #[test]
    fn test_build_from_description() {
        let db = music_db();
        let description = QueryDescription::from_json(
            r#"{
                "table": "Artists",
                "distinct": true,
                "select": [{ "field": "name", "alias": "artist name" }],
                "where": [
                    { "field": "name", "op": "beginsWith", "value": "Dylan" },
                    { "field": "opus", "op": "greaterOrEqual", "value": 7, "conjunction": "or" }
                ],
                "order": [{ "field": "name", "descending": true }]
            }"#,
        )
        .unwrap();
        let query = description.build(&db).unwrap();
        assert!(query.distinct);
        assert_eq!(query.select_fields.len(), 1);
        assert_eq!(query.where_expressions.len(), 2);
        assert_eq!(query.order_by.len(), 1);

        let sql = query.sql_string().unwrap();
        let expected = "SELECT DISTINCT a.name as [artist name], a.name DESC\n\
            FROM [Artists] a\n\
            WHERE LEFT(a.name, 5) = 'Dylan' OR a.opus >= 7\n\
            ORDER BY a.name DESC";
        assert_eq!(sql, expected);
    }

    #[test]
    fn test_build_defaults_projection_to_whole_table() {
        let db = music_db();
        let description = QueryDescription::from_json(r#"{ "table": "Albums" }"#).unwrap();
        let query = description.build(&db).unwrap();
        assert_eq!(
            query.sql_string().as_deref(),
            Some("SELECT Albums.*\nFROM [Albums]")
        );
    }

    #[test]
    fn test_build_rejects_unknown_table_and_structured_values() {
        let db = music_db();
        let err = QueryDescription::from_json(r#"{ "table": "Nope" }"#)
            .unwrap()
            .build(&db)
            .unwrap_err();
        assert_eq!(err, msg::unknown_table("Nope"));

        let err = QueryDescription::from_json(
            r#"{ "table": "Artists", "where": [{ "field": "name", "value": ["a", "b"] }] }"#,
        )
        .unwrap()
        .build(&db)
        .unwrap_err();
        assert_eq!(err, msg::unsupported_value("name"));

        assert_eq!(
            QueryDescription::from_json("nonsense").unwrap_err(),
            msg::description_not_json()
        );
    }

    #[test]
    fn test_build_applies_default_order() {
        let db = music_db();
        let description = QueryDescription::from_json(
            r#"{ "table": "Artists", "defaultOrder": true, "select": [{ "field": "opus" }] }"#,
        )
        .unwrap();
        let query = description.build(&db).unwrap();
        assert_eq!(query.order_by.len(), 1);
        assert_eq!(query.order_by.first().unwrap().field_expression, "name");
        assert!(!query.order_by.first().unwrap().descending);
    }
}
