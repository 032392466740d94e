mod errors;
mod locale;
mod query;
mod schema;
mod utils;
mod values;

pub use locale::Locale;
pub use query::{
    Conjunction, Expression, FieldExpression, From, FromLinks, Group, GroupRow, JoinType,
    LogicalOperator, Operator, Order, OrderRow, Predicate, PredicateOperator, Query,
    QueryDescription, Scope, Select, SelectRow, Where, WhereRow,
};
pub use schema::{
    Database, Field, FieldId, FieldType, Link, LinkId, Pointers, PrimitiveField, PrimitiveLink,
    PrimitiveSchema, PrimitiveTable, Table, TableId, TableKind, REC_ID,
};
pub use utils::OrderedSet;
pub use values::{bool_value, date_value, number_string, number_value, string_value, Value};
