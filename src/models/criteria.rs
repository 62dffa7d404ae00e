// Criteria nodes of the command tree

use serde::{Deserialize, Serialize};

use crate::models::expression::Expression;

/// Comparison operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompareOperator {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl CompareOperator {
    /// SQL token for this operator
    pub fn as_sql(&self) -> &'static str {
        match self {
            CompareOperator::Eq => "=",
            CompareOperator::Ne => "<>",
            CompareOperator::Lt => "<",
            CompareOperator::Le => "<=",
            CompareOperator::Gt => ">",
            CompareOperator::Ge => ">=",
        }
    }
}

/// Logical connective for compound criteria
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompoundOperator {
    And,
    Or,
}

impl CompoundOperator {
    pub fn as_sql(&self) -> &'static str {
        match self {
            CompoundOperator::And => "AND",
            CompoundOperator::Or => "OR",
        }
    }
}

/// A predicate subtree
///
/// `Compound` members must number at least two; renderers reject shorter
/// lists as a translation error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Criteria {
    Compare {
        left: Expression,
        operator: CompareOperator,
        right: Expression,
    },
    Compound {
        operator: CompoundOperator,
        criteria: Vec<Criteria>,
    },
    In {
        expression: Expression,
        values: Vec<Expression>,
        negated: bool,
    },
    Like {
        expression: Expression,
        pattern: Expression,
        escape: Option<char>,
        negated: bool,
    },
    IsNull {
        expression: Expression,
    },
}

impl Criteria {
    pub fn compare(left: Expression, operator: CompareOperator, right: Expression) -> Self {
        Criteria::Compare {
            left,
            operator,
            right,
        }
    }

    /// Binary AND
    pub fn and(left: Criteria, right: Criteria) -> Self {
        Criteria::Compound {
            operator: CompoundOperator::And,
            criteria: vec![left, right],
        }
    }

    /// Binary OR
    pub fn or(left: Criteria, right: Criteria) -> Self {
        Criteria::Compound {
            operator: CompoundOperator::Or,
            criteria: vec![left, right],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::expression::ColumnReference;
    use crate::models::types::{TypeCode, Value};

    #[test]
    fn test_binary_constructors() {
        let a = Criteria::compare(
            Expression::Column(ColumnReference::new("intkey", TypeCode::Integer)),
            CompareOperator::Gt,
            Expression::literal(Value::Integer(10), TypeCode::Integer),
        );
        let b = Criteria::IsNull {
            expression: Expression::Column(ColumnReference::new("stringkey", TypeCode::String)),
        };

        match Criteria::and(a, b) {
            Criteria::Compound { operator, criteria } => {
                assert_eq!(operator, CompoundOperator::And);
                assert_eq!(criteria.len(), 2);
            }
            other => panic!("expected compound, got {:?}", other),
        }
    }

    #[test]
    fn test_operator_sql_tokens() {
        assert_eq!(CompareOperator::Ne.as_sql(), "<>");
        assert_eq!(CompoundOperator::Or.as_sql(), "OR");
    }
}
