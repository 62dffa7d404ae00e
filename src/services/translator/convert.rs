// CONVERT rewrite for the SQL-Server dialect family
//
// Dispatches on the (source-type, target-type) pair of the conversion. Each
// supported pairing emits a native convert() call; date/time values routed
// through strings use the engine's fixed style codes (101 date, 108 time,
// 109 timestamp). Unknown targets and unsupported pairings fall back to
// dropping the function and passing the source expression through, so a
// convert rewrite never fails.

use crate::error::ConnectorError;
use crate::models::expression::{Expression, Function};
use crate::models::types::TypeCode;
use crate::services::translator::modifiers::{
    DropFunctionModifier, FunctionModifier, Part, Rewritten,
};

const STYLE_DATE: u16 = 101;
const STYLE_TIME: u16 = 108;
const STYLE_TIMESTAMP: u16 = 109;

/// CONVERT(expr, 'typename') rewrite
pub struct ConvertModifier;

impl ConvertModifier {
    /// Native type name used when casting to the given canonical type
    fn native_type_name(target: TypeCode) -> &'static str {
        match target {
            TypeCode::String => "varchar",
            TypeCode::Char => "char(1)",
            TypeCode::Boolean => "bit",
            TypeCode::Byte => "tinyint",
            TypeCode::Short => "smallint",
            TypeCode::Integer => "int",
            TypeCode::Long => "numeric(19,0)",
            TypeCode::BigInteger => "numeric(38,0)",
            TypeCode::Float => "real",
            TypeCode::Double => "float",
            TypeCode::BigDecimal => "numeric(38,19)",
            TypeCode::Date | TypeCode::Time | TypeCode::Timestamp => "datetime",
        }
    }

    /// String style code for rendering a temporal value as text
    fn style_for(temporal: TypeCode) -> Option<u16> {
        match temporal {
            TypeCode::Date => Some(STYLE_DATE),
            TypeCode::Time => Some(STYLE_TIME),
            TypeCode::Timestamp => Some(STYLE_TIMESTAMP),
            _ => None,
        }
    }

    /// `convert(<native>, expr)`
    fn cast(target: TypeCode, expr: &Expression) -> Rewritten {
        Rewritten::Parts(vec![
            Part::fragment(format!("convert({}, ", Self::native_type_name(target))),
            Part::Expression(expr.clone()),
            Part::fragment(")"),
        ])
    }

    /// `convert(varchar, expr, <style>)`
    fn cast_to_styled_string(style: u16, expr: &Expression) -> Rewritten {
        Rewritten::Parts(vec![
            Part::fragment("convert(varchar, "),
            Part::Expression(expr.clone()),
            Part::fragment(format!(", {})", style)),
        ])
    }

    /// `convert(datetime, convert(varchar, expr, <style>))`
    ///
    /// Cross-conversions inside the date/time family go through an
    /// intermediate string so the unused datetime half is truncated.
    fn recast_through_string(style: u16, expr: &Expression) -> Rewritten {
        Rewritten::Parts(vec![
            Part::fragment("convert(datetime, convert(varchar, "),
            Part::Expression(expr.clone()),
            Part::fragment(format!(", {}))", style)),
        ])
    }

    fn drop(function: &Function) -> Result<Rewritten, ConnectorError> {
        DropFunctionModifier.modify(function)
    }

    /// Target type named by the second argument's string literal
    fn target_type(function: &Function) -> Option<TypeCode> {
        match function.args.get(1) {
            Some(Expression::Literal(lit)) => match &lit.value {
                crate::models::types::Value::String(name) => TypeCode::from_type_name(name),
                _ => None,
            },
            _ => None,
        }
    }
}

impl FunctionModifier for ConvertModifier {
    fn modify(&self, function: &Function) -> Result<Rewritten, ConnectorError> {
        let source_expr = match function.args.first() {
            Some(expr) => expr,
            None => {
                return Err(ConnectorError::Translation(
                    "CONVERT requires a source expression".to_string(),
                ))
            }
        };
        let target = match Self::target_type(function) {
            Some(target) => target,
            // unknown target literal: documented drop fallback
            None => return Self::drop(function),
        };
        let source = source_expr.value_type();

        if source == target {
            return Self::drop(function);
        }

        let rewritten = match target {
            TypeCode::String => match Self::style_for(source) {
                Some(style) => Self::cast_to_styled_string(style, source_expr),
                None => Self::cast(TypeCode::String, source_expr),
            },
            TypeCode::Char => match source {
                TypeCode::String => Self::cast(TypeCode::Char, source_expr),
                _ => return Self::drop(function),
            },
            TypeCode::Boolean => {
                if source.is_numeric() || source == TypeCode::String {
                    Self::cast(TypeCode::Boolean, source_expr)
                } else {
                    return Self::drop(function);
                }
            }
            TypeCode::Byte
            | TypeCode::Short
            | TypeCode::Integer
            | TypeCode::Long
            | TypeCode::BigInteger
            | TypeCode::Float
            | TypeCode::Double
            | TypeCode::BigDecimal => {
                let castable = source.is_numeric()
                    || source == TypeCode::String
                    || source == TypeCode::Char
                    || source == TypeCode::Boolean;
                if castable {
                    Self::cast(target, source_expr)
                } else {
                    // temporal-to-numeric has no native form
                    return Self::drop(function);
                }
            }
            TypeCode::Date => match source {
                TypeCode::String => Self::cast(TypeCode::Date, source_expr),
                TypeCode::Timestamp => Self::recast_through_string(STYLE_DATE, source_expr),
                _ => return Self::drop(function),
            },
            TypeCode::Time => match source {
                TypeCode::String => Self::cast(TypeCode::Time, source_expr),
                TypeCode::Timestamp => Self::recast_through_string(STYLE_TIME, source_expr),
                _ => return Self::drop(function),
            },
            TypeCode::Timestamp => match source {
                TypeCode::String | TypeCode::Date | TypeCode::Time => {
                    Self::cast(TypeCode::Timestamp, source_expr)
                }
                _ => return Self::drop(function),
            },
        };
        Ok(rewritten)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::expression::ColumnReference;
    use crate::models::types::Value;

    const ALL_TYPES: [TypeCode; 14] = [
        TypeCode::String,
        TypeCode::Char,
        TypeCode::Boolean,
        TypeCode::Byte,
        TypeCode::Short,
        TypeCode::Integer,
        TypeCode::Long,
        TypeCode::BigInteger,
        TypeCode::Float,
        TypeCode::Double,
        TypeCode::BigDecimal,
        TypeCode::Date,
        TypeCode::Time,
        TypeCode::Timestamp,
    ];

    fn convert_call(source: TypeCode, target_name: &str) -> Function {
        Function::new(
            "convert",
            vec![
                Expression::Column(ColumnReference::new("col", source)),
                Expression::literal(Value::String(target_name.to_string()), TypeCode::String),
            ],
            TypeCode::from_type_name(target_name).unwrap_or(TypeCode::String),
        )
    }

    fn parts_text(rewritten: &Rewritten) -> String {
        match rewritten {
            Rewritten::Parts(parts) => parts
                .iter()
                .map(|p| match p {
                    Part::Fragment(s) => s.clone(),
                    Part::Expression(_) => "<expr>".to_string(),
                })
                .collect(),
            Rewritten::Expression(_) => "<passthrough>".to_string(),
        }
    }

    #[test]
    fn test_every_pairing_produces_a_rewrite() {
        // supported pairings cast, unsupported ones drop; none may fail
        for source in ALL_TYPES {
            for target in ALL_TYPES {
                let func = convert_call(source, target.as_str());
                let result = ConvertModifier.modify(&func);
                assert!(
                    result.is_ok(),
                    "convert {:?} -> {:?} failed: {:?}",
                    source,
                    target,
                    result
                );
            }
        }
    }

    #[test]
    fn test_temporal_to_string_uses_style_codes() {
        let date = ConvertModifier
            .modify(&convert_call(TypeCode::Date, "string"))
            .unwrap();
        assert_eq!(parts_text(&date), "convert(varchar, <expr>, 101)");

        let time = ConvertModifier
            .modify(&convert_call(TypeCode::Time, "string"))
            .unwrap();
        assert_eq!(parts_text(&time), "convert(varchar, <expr>, 108)");

        let ts = ConvertModifier
            .modify(&convert_call(TypeCode::Timestamp, "string"))
            .unwrap();
        assert_eq!(parts_text(&ts), "convert(varchar, <expr>, 109)");
    }

    #[test]
    fn test_timestamp_to_date_nests_through_string() {
        let rewritten = ConvertModifier
            .modify(&convert_call(TypeCode::Timestamp, "date"))
            .unwrap();
        assert_eq!(
            parts_text(&rewritten),
            "convert(datetime, convert(varchar, <expr>, 101))"
        );

        let to_time = ConvertModifier
            .modify(&convert_call(TypeCode::Timestamp, "time"))
            .unwrap();
        assert_eq!(
            parts_text(&to_time),
            "convert(datetime, convert(varchar, <expr>, 108))"
        );
    }

    #[test]
    fn test_numeric_cast_uses_native_type_names() {
        let rewritten = ConvertModifier
            .modify(&convert_call(TypeCode::Integer, "long"))
            .unwrap();
        assert_eq!(parts_text(&rewritten), "convert(numeric(19,0), <expr>)");

        let to_double = ConvertModifier
            .modify(&convert_call(TypeCode::String, "double"))
            .unwrap();
        assert_eq!(parts_text(&to_double), "convert(float, <expr>)");
    }

    #[test]
    fn test_unsupported_pairing_drops() {
        // date -> integer has no native form
        let rewritten = ConvertModifier
            .modify(&convert_call(TypeCode::Date, "integer"))
            .unwrap();
        assert!(matches!(rewritten, Rewritten::Expression(Expression::Column(_))));
    }

    #[test]
    fn test_unknown_target_drops() {
        let func = convert_call(TypeCode::Integer, "clob");
        let rewritten = ConvertModifier.modify(&func).unwrap();
        assert!(matches!(rewritten, Rewritten::Expression(Expression::Column(_))));
    }

    #[test]
    fn test_same_type_drops() {
        let rewritten = ConvertModifier
            .modify(&convert_call(TypeCode::Integer, "integer"))
            .unwrap();
        assert!(matches!(rewritten, Rewritten::Expression(Expression::Column(_))));
    }
}
