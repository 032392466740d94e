use itertools::Itertools;

use super::expr::{Expression, From, FromLinks, Group, Order, Scope, Select, Where};
use super::operators::JoinType;
use crate::locale::Locale;
use crate::schema::{Database, LinkId, TableId};
use crate::utils::OrderedSet;

/// The mutable aggregate of a query under construction. Expressions and
/// table references accumulate through the append/merge API; `sql_string`
/// assembles the final statement on demand.
#[derive(Debug)]
pub struct Query<'a> {
    db: &'a Database,
    pub locale: Locale,
    /// Whether only one route should be walked to fulfill the query.
    pub one_route_only: bool,
    /// Whether duplicate results should be filtered out.
    pub distinct: bool,
    /// Default join type for link-based FROM expressions.
    pub join_type: JoinType,
    /// The most significant tables in the query.
    pub main_tables: OrderedSet<TableId>,
    /// Tables referred to by the FROM clause.
    pub from_tables: OrderedSet<TableId>,
    /// Linker tables needed to join the tables referred to by the query.
    pub linker_tables: OrderedSet<TableId>,
    /// Links directly joining the tables referred to by the query.
    pub direct_links: OrderedSet<LinkId>,
    pub from_expressions: OrderedSet<From>,
    pub from_links_expressions: OrderedSet<FromLinks>,
    pub where_expressions: OrderedSet<Where>,
    pub select_fields: OrderedSet<Select>,
    pub group_fields: OrderedSet<Group>,
    pub order_by: OrderedSet<Order>,
}

/// The tables referenced by the expressions of a set, in expression order.
fn referenced_tables<E: Expression + std::hash::Hash + Eq>(
    set: &OrderedSet<E>,
) -> impl Iterator<Item = TableId> + '_ {
    set.iter().filter_map(|e| e.table())
}

impl<'a> Query<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self {
            db,
            locale: Locale::default(),
            one_route_only: false,
            distinct: false,
            join_type: JoinType::Inner,
            main_tables: OrderedSet::new(),
            from_tables: OrderedSet::new(),
            linker_tables: OrderedSet::new(),
            direct_links: OrderedSet::new(),
            from_expressions: OrderedSet::new(),
            from_links_expressions: OrderedSet::new(),
            where_expressions: OrderedSet::new(),
            select_fields: OrderedSet::new(),
            group_fields: OrderedSet::new(),
            order_by: OrderedSet::new(),
        }
    }

    pub fn db(&self) -> &'a Database {
        self.db
    }

    /// Append one ascending Order expression per declared order field of
    /// `table`.
    pub fn set_order_fields(&mut self, table: TableId) {
        let order_fields = self.db.table(table).order_fields.clone();
        for field_id in order_fields {
            let name = self.db.table(table).field(field_id).name.clone();
            self.order_by.append(Order::new(name, Some(table)));
        }
    }

    /// All the tables required to run the query: main tables, FROM tables,
    /// linker tables, then every table referenced by a where/select/group/
    /// order expression, first occurrence winning.
    pub fn required_tables(&self) -> OrderedSet<TableId> {
        let mut all = self.main_tables.clone();
        all += &self.from_tables;
        all += &self.linker_tables;
        all.append_all(referenced_tables(&self.where_expressions));
        all.append_all(referenced_tables(&self.select_fields));
        all.append_all(referenced_tables(&self.group_fields));
        all.append_all(referenced_tables(&self.order_by));
        all
    }

    /// Combine this query with another one: where expressions, FROM tables
    /// and linker tables are appended (duplicates skipped) and the flags are
    /// ORed. Select, group and order lists are deliberately left alone; this
    /// partial merge is the supported contract.
    pub fn merge(&mut self, other: &Query<'_>) {
        self.where_expressions += &other.where_expressions;
        self.from_tables += &other.from_tables;
        self.linker_tables += &other.linker_tables;

        self.one_route_only = self.one_route_only || other.one_route_only;
        self.distinct = self.distinct || other.distinct;
    }

    /// The FROM expressions the query will render: the caller-supplied ones,
    /// plus a synthesized single-table expression (carrying the linker
    /// tables along) when exactly one table is required. Multi-table FROM
    /// resolution across link routes is out of scope.
    fn resolved_from_expressions(&self) -> Option<OrderedSet<From>> {
        let required = self.required_tables();
        required.first()?;

        let mut from_expressions = self.from_expressions.clone();
        if required.len() == 1 {
            from_expressions.append(From::new(required + &self.linker_tables));
        }
        (!from_expressions.is_empty()).then_some(from_expressions)
    }

    fn select_clause(&self, scope: &Scope) -> Option<String> {
        // Order expressions project into SELECT too, so that ORDER BY
        // targets are always selected.
        let fields = self
            .select_fields
            .iter()
            .map(|s| s.expression(scope))
            .chain(self.order_by.iter().map(|o| o.expression(scope)))
            .join(", ");
        if fields.is_empty() {
            return None;
        }
        let distinct = if self.distinct { "DISTINCT " } else { "" };
        Some(format!("SELECT {distinct}{fields}"))
    }

    fn where_clause(&self, scope: &Scope) -> String {
        let conditions = self
            .where_expressions
            .iter()
            .fold(String::new(), |mut clause, where_expression| {
                let expression = where_expression.expression(scope);
                if expression.is_empty() {
                    return clause;
                }
                let prefix = where_expression.logical.rendered(clause.is_empty());
                clause.push_str(&prefix);
                clause.push_str(&expression);
                clause
            });
        if conditions.is_empty() {
            return String::new();
        }
        format!("\nWHERE {conditions}")
    }

    fn group_clause(&self, scope: &Scope) -> String {
        let fields = self.group_fields.iter().map(|g| g.expression(scope)).join(", ");
        if fields.is_empty() {
            return String::new();
        }
        format!("\nGROUP BY {fields}")
    }

    fn order_clause(&self, scope: &Scope) -> String {
        let fields = self.order_by.iter().map(|o| o.expression(scope)).join(", ");
        if fields.is_empty() {
            return String::new();
        }
        format!("\nORDER BY {fields}")
    }

    /// The whole SQL statement, or None when the query cannot be rendered
    /// (no required tables, or nothing to select). Rendering is pure:
    /// repeated calls without mutation yield identical strings.
    pub fn sql_string(&self) -> Option<String> {
        let scope = Scope {
            db: self.db,
            locale: &self.locale,
        };
        let from_expressions = self.resolved_from_expressions()?;
        let select_clause = self.select_clause(&scope)?;

        let where_clause = self.where_clause(&scope);
        let group_clause = self.group_clause(&scope);
        let order_clause = self.order_clause(&scope);

        let mut sql = String::new();
        for (index, from) in from_expressions.iter().enumerate() {
            let block = format!(
                "{select_clause}\nFROM {}{where_clause}{group_clause}",
                from.expression(&scope)
            );
            if index == 0 {
                sql.push_str(&block);
            } else {
                sql.push_str(&format!("\nUNION\n({block})"));
            }
        }
        sql.push_str(&order_clause);
        Some(sql)
    }
}

#[cfg(test)]
mod tests {
    use crate::query::operators::{LogicalOperator, Operator};
    use crate::utils::get_test_resource;
    use crate::values::Value;

    use super::*;

    fn music_db() -> Database {
        Database::from_json(&get_test_resource("music_schema.json")).unwrap()
    }

    fn artists_query(db: &Database) -> Query<'_> {
        let artists = db.table_named("Artists").unwrap().id;
        let mut query = Query::new(db);
        query.main_tables.append(artists);
        query.select_fields.append(Select::new("name", Some(artists)));
        query
    }

    #[test]
    fn test_sql_string_assembles_all_clauses() {
        let db = music_db();
        let artists = db.table_named("Artists").unwrap().id;
        let mut query = artists_query(&db);
        query.distinct = true;
        query.where_expressions.append(Where::new(
            "opus",
            Some(Value::from(7)),
            Operator::GreaterOrEqual,
            Some(artists),
        ));
        query.group_fields.append(Group::new("name", Some(artists)));
        query.set_order_fields(artists);

        let expected = "SELECT DISTINCT a.name, a.name\n\
            FROM [Artists] a\n\
            WHERE a.opus >= 7\n\
            GROUP BY a.name\n\
            ORDER BY a.name";
        assert_eq!(query.sql_string().as_deref(), Some(expected));
    }

    #[test]
    fn test_sql_string_is_idempotent() {
        let db = music_db();
        let mut query = artists_query(&db);
        query.where_expressions.append(Where::new(
            "name",
            Some(Value::from("Dylan")),
            Operator::BeginsWith,
            Some(db.table_named("Artists").unwrap().id),
        ));
        let first = query.sql_string();
        let second = query.sql_string();
        assert!(first.is_some());
        assert_eq!(first, second);
    }

    #[test]
    fn test_sql_string_requires_tables_and_selection() {
        let db = music_db();
        let empty = Query::new(&db);
        assert_eq!(empty.sql_string(), None);

        // A table without anything to select still cannot render.
        let mut no_selection = Query::new(&db);
        no_selection
            .main_tables
            .append(db.table_named("Artists").unwrap().id);
        assert_eq!(no_selection.sql_string(), None);
    }

    #[test]
    fn test_order_fields_alone_satisfy_selection() {
        let db = music_db();
        let artists = db.table_named("Artists").unwrap().id;
        let mut query = Query::new(&db);
        query.main_tables.append(artists);
        query.set_order_fields(artists);
        let expected = "SELECT a.name\nFROM [Artists] a\nORDER BY a.name";
        assert_eq!(query.sql_string().as_deref(), Some(expected));
    }

    #[test]
    fn test_linker_tables_count_toward_required_tables() {
        let db = music_db();
        let artists = db.table_named("Artists").unwrap().id;
        let linker = db.table_named("ArtistsAlbums").unwrap().id;
        let mut query = artists_query(&db);
        query.linker_tables.append(linker);
        // Linker tables are part of the required set, so their presence
        // leaves more than one required table and nothing can be resolved
        // without a caller-supplied FROM expression.
        assert_eq!(query.sql_string(), None);

        // Duplicated references to the one main table still resolve.
        let mut query = artists_query(&db);
        query.from_tables.append(artists);
        let sql = query.sql_string().unwrap();
        assert!(sql.contains("FROM [Artists] a"));
    }

    #[test]
    fn test_where_chain_omits_leading_logical_keyword() {
        let db = music_db();
        let artists = db.table_named("Artists").unwrap().id;
        let mut query = artists_query(&db);
        query.where_expressions.append(Where {
            logical: LogicalOperator::or(),
            ..Where::new("name", Some(Value::from("Bob")), Operator::Equal, Some(artists))
        });
        query.where_expressions.append(Where {
            logical: LogicalOperator::or_not(),
            ..Where::new("male", Some(Value::from(true)), Operator::Equal, Some(artists))
        });
        let sql = query.sql_string().unwrap();
        assert!(sql.contains("\nWHERE a.name = 'Bob' OR NOT a.male = TRUE"));
    }

    #[test]
    fn test_merge_appends_wheres_and_ors_flags() {
        let db = music_db();
        let artists = db.table_named("Artists").unwrap().id;
        let shared = Where::new("name", Some(Value::from("Bob")), Operator::Equal, Some(artists));

        let mut q = artists_query(&db);
        q.where_expressions.append(shared.clone());

        let mut r = Query::new(&db);
        r.distinct = true;
        r.where_expressions.append(shared.clone());
        r.where_expressions.append(Where {
            logical: LogicalOperator::or(),
            ..Where::new("opus", Some(Value::from(7)), Operator::Greater, Some(artists))
        });
        r.from_tables.append(artists);
        r.select_fields.append(Select::new("opus", Some(artists)));

        q.merge(&r);

        // The duplicate where (same field, same table, same operator chain)
        // is elided, the new one is appended after Q's originals.
        assert_eq!(q.where_expressions.len(), 2);
        assert_eq!(
            q.where_expressions.get(0).unwrap().field_expression,
            "name"
        );
        assert_eq!(q.where_expressions.get(1).unwrap().field_expression, "opus");
        assert!(q.distinct);
        assert!(!q.one_route_only);
        assert!(q.from_tables.contains(&artists));
        // Select lists are not merged.
        assert_eq!(q.select_fields.len(), 1);
    }

    #[test]
    fn test_required_tables_traversal_order() {
        let db = music_db();
        let artists = db.table_named("Artists").unwrap().id;
        let albums = db.table_named("Albums").unwrap().id;
        let linker = db.table_named("ArtistsAlbums").unwrap().id;

        let mut query = Query::new(&db);
        query.select_fields.append(Select::new("title", Some(albums)));
        query.linker_tables.append(linker);
        query.main_tables.append(artists);
        query.where_expressions.append(Where::new(
            "title",
            Some(Value::from("Blonde")),
            Operator::Equal,
            Some(albums),
        ));

        let required = query.required_tables();
        // Main tables first, then linkers, then expression references (the
        // where's Albums arrives before the select scan re-offers it).
        assert_eq!(
            required.iter().copied().collect::<Vec<_>>(),
            vec![artists, linker, albums]
        );
    }

    #[test]
    fn test_caller_supplied_from_expression_renders_unions() {
        let db = music_db();
        let artists = db.table_named("Artists").unwrap().id;
        let albums = db.table_named("Albums").unwrap().id;
        let mut query = Query::new(&db);
        query.select_fields.append(Select::new("*", Some(artists)));
        query
            .from_expressions
            .append(From::new([artists].into_iter().collect()));
        query
            .from_expressions
            .append(From::new([albums].into_iter().collect()));

        let sql = query.sql_string().unwrap();
        let expected = "SELECT a.*\nFROM [Artists] a\nUNION\n(SELECT a.*\nFROM [Albums])";
        assert_eq!(sql, expected);
    }
}
