use super::expr::Where;
use super::operators::Operator;
use crate::schema::TableId;
use crate::values::Value;

/// A comparison predicate as produced by embedding editors: a key path, a
/// constant value and one of the operators of the host predicate system.
#[derive(Debug, Clone)]
pub struct Predicate {
    pub key_path: String,
    pub value: Option<Value>,
    pub operator: PredicateOperator,
}

/// Operator vocabulary of the host predicate system. It is wider than the
/// query model's: the unsupported members have no SQL translation here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PredicateOperator {
    LessThan,
    LessThanOrEqualTo,
    GreaterThan,
    GreaterThanOrEqualTo,
    EqualTo,
    NotEqualTo,
    Matches,
    Like,
    BeginsWith,
    EndsWith,
    In,
    Contains,
    Between,
}

impl std::convert::From<PredicateOperator> for Operator {
    /// Translate a host predicate operator. This is a collaborator-facing
    /// adapter: an operator with no translation is a contract violation and
    /// fails loudly rather than guessing.
    fn from(operator: PredicateOperator) -> Operator {
        match operator {
            PredicateOperator::BeginsWith => Operator::BeginsWith,
            PredicateOperator::EndsWith => Operator::EndsWith,
            PredicateOperator::Contains => Operator::Contains,
            PredicateOperator::EqualTo => Operator::Equal,
            PredicateOperator::GreaterThan => Operator::Greater,
            PredicateOperator::GreaterThanOrEqualTo => Operator::GreaterOrEqual,
            PredicateOperator::LessThan => Operator::Less,
            PredicateOperator::LessThanOrEqualTo => Operator::LessOrEqual,
            PredicateOperator::NotEqualTo => Operator::NotEqual,
            _ => panic!("unsupported predicate operator: {operator:?}"),
        }
    }
}

impl Where {
    /// Convert a host predicate into a WHERE expression bound to `table`.
    pub fn from_predicate(table: Option<TableId>, predicate: Predicate) -> Where {
        Where::new(
            predicate.key_path,
            predicate.value,
            predicate.operator.into(),
            table,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_supported_operators_translate() {
        assert_eq!(Operator::from(PredicateOperator::BeginsWith), Operator::BeginsWith);
        assert_eq!(Operator::from(PredicateOperator::EqualTo), Operator::Equal);
        assert_eq!(
            Operator::from(PredicateOperator::GreaterThanOrEqualTo),
            Operator::GreaterOrEqual
        );
        assert_eq!(Operator::from(PredicateOperator::NotEqualTo), Operator::NotEqual);
    }

    #[test]
    #[should_panic(expected = "unsupported predicate operator")]
    fn test_unsupported_operator_is_fatal() {
        let _ = Operator::from(PredicateOperator::Between);
    }

    #[test]
    fn test_where_from_predicate() {
        let predicate = Predicate {
            key_path: "name".to_string(),
            value: Some(Value::from("Dylan")),
            operator: PredicateOperator::BeginsWith,
        };
        let where_expression = Where::from_predicate(Some(3), predicate);
        assert_eq!(where_expression.field_expression, "name");
        assert_eq!(where_expression.operator, Operator::BeginsWith);
        assert_eq!(where_expression.table, Some(3));
        assert_eq!(where_expression.value, Some(Value::from("Dylan")));
    }
}
