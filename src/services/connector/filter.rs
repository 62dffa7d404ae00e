// Row filter
//
// Evaluates a pushed-down criteria tree against one row of values. The file
// backend applies this while reading records, before any row reaches the
// iteration buffer, so callers never see rows that violate a pushed-down
// predicate.

use std::cmp::Ordering;
use std::collections::HashMap;

use regex::Regex;

use crate::error::ConnectorError;
use crate::models::criteria::{CompareOperator, CompoundOperator, Criteria};
use crate::models::expression::Expression;
use crate::models::types::Value;

/// A row keyed by lower-cased column name
pub type Row = HashMap<String, Value>;

/// Evaluate a criteria tree against a row
///
/// SQL three-valued logic is reduced to match/no-match: comparisons against
/// NULL never match.
pub fn matches(criteria: &Criteria, row: &Row) -> Result<bool, ConnectorError> {
    match criteria {
        Criteria::Compare {
            left,
            operator,
            right,
        } => {
            let left = resolve(left, row)?;
            let right = resolve(right, row)?;
            Ok(match compare_values(&left, &right) {
                Some(ordering) => ordering_matches(*operator, ordering),
                None => false,
            })
        }
        Criteria::Compound { operator, criteria } => {
            if criteria.len() < 2 {
                return Err(ConnectorError::Translation(format!(
                    "Compound criteria requires at least two members, got {}",
                    criteria.len()
                )));
            }
            match operator {
                CompoundOperator::And => {
                    for child in criteria {
                        if !matches(child, row)? {
                            return Ok(false);
                        }
                    }
                    Ok(true)
                }
                CompoundOperator::Or => {
                    for child in criteria {
                        if matches(child, row)? {
                            return Ok(true);
                        }
                    }
                    Ok(false)
                }
            }
        }
        Criteria::In {
            expression,
            values,
            negated,
        } => {
            let target = resolve(expression, row)?;
            let mut found = false;
            for value in values {
                let candidate = resolve(value, row)?;
                if compare_values(&target, &candidate) == Some(Ordering::Equal) {
                    found = true;
                    break;
                }
            }
            Ok(found != *negated)
        }
        Criteria::Like {
            expression,
            pattern,
            escape,
            negated,
        } => {
            let target = resolve(expression, row)?;
            let pattern = resolve(pattern, row)?;
            let matched = match (&target, &pattern) {
                (Value::String(text), Value::String(pattern)) => {
                    like_matches(text, pattern, *escape)?
                }
                // NULL on either side never matches
                _ => false,
            };
            Ok(matched != *negated)
        }
        Criteria::IsNull { expression } => Ok(resolve(expression, row)?.is_null()),
    }
}

/// Resolve an expression to a value for this row
fn resolve(expression: &Expression, row: &Row) -> Result<Value, ConnectorError> {
    match expression {
        Expression::Column(column) => Ok(row
            .get(&column.name.to_ascii_lowercase())
            .cloned()
            .unwrap_or(Value::Null)),
        Expression::Literal(literal) => Ok(literal.value.clone()),
        Expression::Function(function) => Err(ConnectorError::Translation(format!(
            "Function '{}' cannot be evaluated by the file backend",
            function.name
        ))),
        Expression::Parameter(_) => Err(ConnectorError::Translation(
            "Parameters cannot be evaluated by the file backend".to_string(),
        )),
    }
}

fn ordering_matches(operator: CompareOperator, ordering: Ordering) -> bool {
    match operator {
        CompareOperator::Eq => ordering == Ordering::Equal,
        CompareOperator::Ne => ordering != Ordering::Equal,
        CompareOperator::Lt => ordering == Ordering::Less,
        CompareOperator::Le => ordering != Ordering::Greater,
        CompareOperator::Gt => ordering == Ordering::Greater,
        CompareOperator::Ge => ordering != Ordering::Less,
    }
}

/// Compare two values, `None` when incomparable or either side is NULL
pub fn compare_values(left: &Value, right: &Value) -> Option<Ordering> {
    if left.is_null() || right.is_null() {
        return None;
    }
    // numeric kinds compare across widths
    if let (Some(l), Some(r)) = (left.as_f64(), right.as_f64()) {
        return l.partial_cmp(&r);
    }
    match (left, right) {
        (Value::String(l), Value::String(r)) => Some(l.cmp(r)),
        (Value::Char(l), Value::Char(r)) => Some(l.cmp(r)),
        (Value::Boolean(l), Value::Boolean(r)) => Some(l.cmp(r)),
        (Value::Date(l), Value::Date(r)) => Some(l.cmp(r)),
        (Value::Time(l), Value::Time(r)) => Some(l.cmp(r)),
        (Value::Timestamp(l), Value::Timestamp(r)) => Some(l.cmp(r)),
        _ => None,
    }
}

/// SQL LIKE evaluation via an anchored regex
fn like_matches(text: &str, pattern: &str, escape: Option<char>) -> Result<bool, ConnectorError> {
    let mut regex = String::from("^");
    let mut chars = pattern.chars().peekable();
    while let Some(ch) = chars.next() {
        if Some(ch) == escape {
            match chars.next() {
                Some(escaped) => regex.push_str(&regex::escape(&escaped.to_string())),
                None => {
                    return Err(ConnectorError::Translation(format!(
                        "LIKE pattern '{}' ends with its escape character",
                        pattern
                    )))
                }
            }
            continue;
        }
        match ch {
            '%' => regex.push_str(".*"),
            '_' => regex.push('.'),
            other => regex.push_str(&regex::escape(&other.to_string())),
        }
    }
    regex.push('$');

    let compiled = Regex::new(&regex).map_err(|e| {
        ConnectorError::Translation(format!("LIKE pattern '{}' is invalid: {}", pattern, e))
    })?;
    Ok(compiled.is_match(text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::expression::ColumnReference;
    use crate::models::types::TypeCode;

    fn row(pairs: &[(&str, Value)]) -> Row {
        pairs
            .iter()
            .map(|(name, value)| (name.to_string(), value.clone()))
            .collect()
    }

    fn col(name: &str, type_code: TypeCode) -> Expression {
        Expression::Column(ColumnReference::new(name, type_code))
    }

    #[test]
    fn test_compare_across_numeric_widths() {
        let row = row(&[("intkey", Value::Integer(5))]);
        let criteria = Criteria::compare(
            col("intkey", TypeCode::Integer),
            CompareOperator::Gt,
            Expression::literal(Value::Double(4.5), TypeCode::Double),
        );
        assert!(matches(&criteria, &row).unwrap());
    }

    #[test]
    fn test_null_never_matches_comparison() {
        let row = row(&[("intkey", Value::Null)]);
        let criteria = Criteria::compare(
            col("intkey", TypeCode::Integer),
            CompareOperator::Eq,
            Expression::literal(Value::Integer(5), TypeCode::Integer),
        );
        assert!(!matches(&criteria, &row).unwrap());

        let is_null = Criteria::IsNull {
            expression: col("intkey", TypeCode::Integer),
        };
        assert!(matches(&is_null, &row).unwrap());
    }

    #[test]
    fn test_in_with_negation() {
        let row = row(&[("stringkey", Value::String("20".into()))]);
        let criteria = Criteria::In {
            expression: col("stringkey", TypeCode::String),
            values: vec![
                Expression::literal(Value::String("10".into()), TypeCode::String),
                Expression::literal(Value::String("20".into()), TypeCode::String),
            ],
            negated: false,
        };
        assert!(matches(&criteria, &row).unwrap());

        let negated = Criteria::In {
            expression: col("stringkey", TypeCode::String),
            values: vec![Expression::literal(
                Value::String("10".into()),
                TypeCode::String,
            )],
            negated: true,
        };
        assert!(matches(&negated, &row).unwrap());
    }

    #[test]
    fn test_like_wildcards_and_escape() {
        let row = row(&[("stringkey", Value::String("25%".into()))]);

        let prefix = Criteria::Like {
            expression: col("stringkey", TypeCode::String),
            pattern: Expression::literal(Value::String("2_%".into()), TypeCode::String),
            escape: None,
            negated: false,
        };
        assert!(matches(&prefix, &row).unwrap());

        // escaped % matches only a literal percent sign
        let escaped = Criteria::Like {
            expression: col("stringkey", TypeCode::String),
            pattern: Expression::literal(Value::String("25\\%".into()), TypeCode::String),
            escape: Some('\\'),
            negated: false,
        };
        assert!(matches(&escaped, &row).unwrap());

        let not_matching = Criteria::Like {
            expression: col("stringkey", TypeCode::String),
            pattern: Expression::literal(Value::String("26\\%".into()), TypeCode::String),
            escape: Some('\\'),
            negated: false,
        };
        assert!(!matches(&not_matching, &row).unwrap());
    }

    #[test]
    fn test_like_special_characters_are_literal() {
        let row = row(&[("name", Value::String("a.c".into()))]);
        let criteria = Criteria::Like {
            expression: col("name", TypeCode::String),
            pattern: Expression::literal(Value::String("a.c".into()), TypeCode::String),
            escape: None,
            negated: false,
        };
        assert!(matches(&criteria, &row).unwrap());

        // the dot must not behave as a regex wildcard
        let row2 = row_abc();
        assert!(!matches(&criteria, &row2).unwrap());
    }

    fn row_abc() -> Row {
        [("name".to_string(), Value::String("abc".into()))]
            .into_iter()
            .collect()
    }

    #[test]
    fn test_compound_and_or() {
        let row = row(&[
            ("intkey", Value::Integer(5)),
            ("stringkey", Value::String("20".into())),
        ]);
        let both = Criteria::and(
            Criteria::compare(
                col("intkey", TypeCode::Integer),
                CompareOperator::Ge,
                Expression::literal(Value::Integer(5), TypeCode::Integer),
            ),
            Criteria::compare(
                col("stringkey", TypeCode::String),
                CompareOperator::Eq,
                Expression::literal(Value::String("20".into()), TypeCode::String),
            ),
        );
        assert!(matches(&both, &row).unwrap());

        let either = Criteria::or(
            Criteria::compare(
                col("intkey", TypeCode::Integer),
                CompareOperator::Lt,
                Expression::literal(Value::Integer(0), TypeCode::Integer),
            ),
            Criteria::IsNull {
                expression: col("missing", TypeCode::String),
            },
        );
        assert!(matches(&either, &row).unwrap());
    }
}
