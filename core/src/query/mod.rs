mod expr;
mod input;
mod operators;
mod predicate;
mod query;

pub use expr::{Expression, FieldExpression, From, FromLinks, Group, Order, Scope, Select, Where};
pub use input::{Conjunction, GroupRow, OrderRow, QueryDescription, SelectRow, WhereRow};
pub use operators::{JoinType, LogicalOperator, Operator};
pub use predicate::{Predicate, PredicateOperator};
pub use query::Query;
