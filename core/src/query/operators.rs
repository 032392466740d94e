use serde::Deserialize;

use crate::schema::FieldType;

/// All possible comparison operators a query can handle. `sql()` is the
/// fragment spliced into the WHERE text; the substring operators carry
/// internal tokens and are rewritten during rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Operator {
    BeginsWith,
    #[default]
    Equal,
    Contains,
    EndsWith,
    Greater,
    GreaterOrEqual,
    Less,
    LessOrEqual,
    NotEqual,
    Like,
    NotLike,
    Regex,
}

impl Operator {
    pub const ALL: [Operator; 12] = [
        Operator::BeginsWith,
        Operator::Equal,
        Operator::Contains,
        Operator::EndsWith,
        Operator::Greater,
        Operator::GreaterOrEqual,
        Operator::Less,
        Operator::LessOrEqual,
        Operator::NotEqual,
        Operator::Like,
        Operator::NotLike,
        Operator::Regex,
    ];

    pub fn sql(&self) -> &'static str {
        match self {
            Operator::BeginsWith => "|=",
            Operator::Equal => "=",
            Operator::Contains => "|=|",
            Operator::EndsWith => "=|",
            Operator::Greater => ">",
            Operator::GreaterOrEqual => ">=",
            Operator::Less => "<",
            Operator::LessOrEqual => "<=",
            Operator::NotEqual => "<>",
            Operator::Like => "LIKE",
            Operator::NotLike => "NOT LIKE",
            Operator::Regex => "REGEX",
        }
    }

    /// Human-readable label, to be passed through the embedder's translation
    /// collaborator for display.
    pub fn label(&self) -> &'static str {
        match self {
            Operator::BeginsWith => "begins with",
            Operator::Equal => "is",
            Operator::Contains => "contains",
            Operator::EndsWith => "ends with",
            Operator::Greater => "is greater than",
            Operator::GreaterOrEqual => "is greater or equal than",
            Operator::Less => "is lesser than",
            Operator::LessOrEqual => "is lesser or equal than",
            Operator::NotEqual => "is not",
            Operator::Like => "like",
            Operator::NotLike => "not like",
            Operator::Regex => "regex",
        }
    }
}

impl FieldType {
    /// The operators that fit a field type. Rendering a WHERE with an
    /// operator outside this set is a caller contract violation, not checked
    /// at the type level.
    pub fn allowed_operators(&self) -> &'static [Operator] {
        match self {
            FieldType::String => &[
                Operator::BeginsWith,
                Operator::Contains,
                Operator::Equal,
                Operator::EndsWith,
                Operator::NotEqual,
                Operator::Like,
                Operator::NotLike,
            ],
            FieldType::Number => &[
                Operator::Equal,
                Operator::Greater,
                Operator::GreaterOrEqual,
                Operator::Less,
                Operator::LessOrEqual,
                Operator::NotEqual,
                Operator::Like,
                Operator::NotLike,
            ],
            FieldType::Boolean => &[Operator::Equal, Operator::NotEqual],
            FieldType::Date | FieldType::Time => &[
                Operator::Equal,
                Operator::Greater,
                Operator::GreaterOrEqual,
                Operator::Less,
                Operator::LessOrEqual,
                Operator::NotEqual,
            ],
            _ => &[],
        }
    }
}

/// Chaining operator between WHERE expressions. The `assertive` flag flips
/// the condition into its negated `AND NOT`/`OR NOT` form when false.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogicalOperator {
    And { assertive: bool },
    Or { assertive: bool },
}

impl LogicalOperator {
    pub fn and() -> Self {
        LogicalOperator::And { assertive: true }
    }

    pub fn and_not() -> Self {
        LogicalOperator::And { assertive: false }
    }

    pub fn or() -> Self {
        LogicalOperator::Or { assertive: true }
    }

    pub fn or_not() -> Self {
        LogicalOperator::Or { assertive: false }
    }

    pub fn keyword(&self) -> &'static str {
        match self {
            LogicalOperator::And { .. } => "AND",
            LogicalOperator::Or { .. } => "OR",
        }
    }

    /// True if the operator does not involve a negation.
    pub fn assertive(&self) -> bool {
        match self {
            LogicalOperator::And { assertive } | LogicalOperator::Or { assertive } => *assertive,
        }
    }

    /// The operator rendered as the prefix of its condition. The keyword is
    /// omitted for the first condition of a chain.
    pub fn rendered(&self, at_beginning: bool) -> String {
        let logical = if at_beginning {
            String::new()
        } else {
            format!(" {} ", self.keyword())
        };
        let negation = if self.assertive() { "" } else { "NOT " };
        format!("{logical}{negation}")
    }
}

impl Default for LogicalOperator {
    fn default() -> Self {
        LogicalOperator::and()
    }
}

/// Supported SQL JOIN types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum JoinType {
    #[default]
    Inner,
    LeftOuter,
    RightOuter,
    FullOuter,
}

impl JoinType {
    pub fn sql(&self) -> &'static str {
        match self {
            JoinType::Inner => "INNER JOIN",
            JoinType::LeftOuter => "LEFT OUTER JOIN",
            JoinType::RightOuter => "RIGHT OUTER JOIN",
            JoinType::FullOuter => "FULL OUTER JOIN",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allowed_operators_by_type() {
        assert_eq!(FieldType::String.allowed_operators().len(), 7);
        assert!(FieldType::String
            .allowed_operators()
            .contains(&Operator::BeginsWith));
        assert!(!FieldType::Number
            .allowed_operators()
            .contains(&Operator::BeginsWith));
        assert_eq!(
            FieldType::Boolean.allowed_operators(),
            &[Operator::Equal, Operator::NotEqual]
        );
        assert!(FieldType::Link.allowed_operators().is_empty());
        assert!(FieldType::Undefined.allowed_operators().is_empty());
    }

    #[test]
    fn test_logical_operator_rendering() {
        assert_eq!(LogicalOperator::and().rendered(false), " AND ");
        assert_eq!(LogicalOperator::and().rendered(true), "");
        assert_eq!(LogicalOperator::and_not().rendered(false), " AND NOT ");
        assert_eq!(LogicalOperator::or_not().rendered(true), "NOT ");
        assert_eq!(LogicalOperator::or().rendered(false), " OR ");
    }

    #[test]
    fn test_operator_sql_fragments() {
        assert_eq!(Operator::Equal.sql(), "=");
        assert_eq!(Operator::NotEqual.sql(), "<>");
        assert_eq!(Operator::NotLike.sql(), "NOT LIKE");
        assert_eq!(Operator::ALL.len(), 12);
    }
}
