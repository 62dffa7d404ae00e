// SQL renderer
//
// Renders a command tree to native SQL text, applying the owning dialect's
// function modifiers along the way. The renderer is deliberately dumb about
// semantics: whatever the rewrite engine hands it (expressions or verbatim
// parts) is emitted in order.

use std::collections::HashMap;

use crate::error::ConnectorError;
use crate::models::command::{
    Command, Delete, Group, Insert, Limit, OrderBy, Procedure, Query, QueryExpression, SetQuery,
    Update,
};
use crate::models::criteria::Criteria;
use crate::models::expression::{Expression, Function, Literal, ParameterDirection};
use crate::models::types::Value;
use crate::services::translator::modifiers::{FunctionModifier, Part, Rewritten};

/// Keyword used to invoke a stored procedure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallStyle {
    Exec,
    Call,
}

/// Dialect-specific rendering options
#[derive(Debug, Clone, Copy)]
pub struct RenderOptions {
    /// Render booleans as 1/0 (bit) instead of TRUE/FALSE
    pub boolean_as_bit: bool,
    pub call_style: CallStyle,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            boolean_as_bit: false,
            call_style: CallStyle::Call,
        }
    }
}

const INFIX_OPERATORS: [&str; 6] = ["+", "-", "*", "/", "%", "||"];

/// Command-tree to SQL-text renderer
pub struct SqlRenderer<'a> {
    modifiers: &'a HashMap<String, Box<dyn FunctionModifier>>,
    options: RenderOptions,
}

impl<'a> SqlRenderer<'a> {
    pub fn new(
        modifiers: &'a HashMap<String, Box<dyn FunctionModifier>>,
        options: RenderOptions,
    ) -> Self {
        Self { modifiers, options }
    }

    pub fn render_command(&self, command: &Command) -> Result<String, ConnectorError> {
        match command {
            Command::Select(query) => self.render_query(query),
            Command::SetQuery(set) => self.render_set_query(set),
            Command::Insert(insert) => self.render_insert(insert),
            Command::Update(update) => self.render_update(update),
            Command::Delete(delete) => self.render_delete(delete),
            Command::Call(procedure) => self.render_call(procedure),
        }
    }

    pub fn render_query(&self, query: &Query) -> Result<String, ConnectorError> {
        let mut sql = String::from("SELECT ");
        if query.select.is_empty() {
            sql.push('*');
        } else {
            sql.push_str(&self.render_expression_list(&query.select)?);
        }

        sql.push_str(" FROM ");
        let groups: Vec<String> = query.from.iter().map(|g| self.render_group(g)).collect();
        sql.push_str(&groups.join(", "));

        if let Some(criteria) = &query.criteria {
            sql.push_str(" WHERE ");
            sql.push_str(&self.render_criteria(criteria)?);
        }
        if let Some(order_by) = &query.order_by {
            sql.push(' ');
            sql.push_str(&self.render_order_by(order_by)?);
        }
        if let Some(limit) = &query.limit {
            sql.push(' ');
            sql.push_str(&Self::render_limit(limit));
        }
        Ok(sql)
    }

    pub fn render_set_query(&self, set: &SetQuery) -> Result<String, ConnectorError> {
        let mut sql = self.render_query_expression(&set.left)?;
        sql.push(' ');
        sql.push_str(set.operation.as_sql());
        if set.all {
            sql.push_str(" ALL");
        }
        sql.push(' ');
        sql.push_str(&self.render_query_expression(&set.right)?);

        if let Some(order_by) = &set.order_by {
            sql.push(' ');
            sql.push_str(&self.render_order_by(order_by)?);
        }
        if let Some(limit) = &set.limit {
            sql.push(' ');
            sql.push_str(&Self::render_limit(limit));
        }
        Ok(sql)
    }

    pub fn render_query_expression(&self, qe: &QueryExpression) -> Result<String, ConnectorError> {
        match qe {
            QueryExpression::Query(q) => self.render_query(q),
            QueryExpression::Set(s) => {
                // parenthesize nested set operations to keep precedence explicit
                Ok(format!("({})", self.render_set_query(s)?))
            }
        }
    }

    fn render_insert(&self, insert: &Insert) -> Result<String, ConnectorError> {
        let columns: Vec<&str> = insert.columns.iter().map(|c| c.name.as_str()).collect();
        let values: Vec<String> = insert
            .values
            .iter()
            .map(|v| self.render_expression(v))
            .collect::<Result<_, _>>()?;
        Ok(format!(
            "INSERT INTO {} ({}) VALUES ({})",
            self.render_group(&insert.group),
            columns.join(", "),
            values.join(", ")
        ))
    }

    fn render_update(&self, update: &Update) -> Result<String, ConnectorError> {
        let changes: Vec<String> = update
            .changes
            .iter()
            .map(|c| Ok(format!("{} = {}", c.symbol.name, self.render_expression(&c.value)?)))
            .collect::<Result<_, ConnectorError>>()?;
        let mut sql = format!(
            "UPDATE {} SET {}",
            self.render_group(&update.group),
            changes.join(", ")
        );
        if let Some(criteria) = &update.criteria {
            sql.push_str(" WHERE ");
            sql.push_str(&self.render_criteria(criteria)?);
        }
        Ok(sql)
    }

    fn render_delete(&self, delete: &Delete) -> Result<String, ConnectorError> {
        let mut sql = format!("DELETE FROM {}", self.render_group(&delete.group));
        if let Some(criteria) = &delete.criteria {
            sql.push_str(" WHERE ");
            sql.push_str(&self.render_criteria(criteria)?);
        }
        Ok(sql)
    }

    fn render_call(&self, procedure: &Procedure) -> Result<String, ConnectorError> {
        let placeholders: Vec<&str> = procedure
            .parameters
            .iter()
            .filter(|p| {
                matches!(
                    p.direction(),
                    ParameterDirection::In | ParameterDirection::InOut
                )
            })
            .map(|_| "?")
            .collect();
        match self.options.call_style {
            CallStyle::Exec => Ok(format!("EXEC {} {}", procedure.name, placeholders.join(", "))
                .trim_end()
                .to_string()),
            CallStyle::Call => Ok(format!(
                "{{call {}({})}}",
                procedure.name,
                placeholders.join(", ")
            )),
        }
    }

    pub fn render_group(&self, group: &Group) -> String {
        match &group.definition {
            Some(definition) => format!("{} AS {}", definition, group.context),
            None => group.context.clone(),
        }
    }

    pub fn render_criteria(&self, criteria: &Criteria) -> Result<String, ConnectorError> {
        match criteria {
            Criteria::Compare {
                left,
                operator,
                right,
            } => Ok(format!(
                "{} {} {}",
                self.render_expression(left)?,
                operator.as_sql(),
                self.render_expression(right)?
            )),
            Criteria::Compound { operator, criteria } => {
                if criteria.len() < 2 {
                    return Err(ConnectorError::Translation(format!(
                        "Compound criteria requires at least two members, got {}",
                        criteria.len()
                    )));
                }
                let rendered: Vec<String> = criteria
                    .iter()
                    .map(|c| {
                        let text = self.render_criteria(c)?;
                        Ok(match c {
                            Criteria::Compound { .. } => format!("({})", text),
                            _ => text,
                        })
                    })
                    .collect::<Result<_, ConnectorError>>()?;
                Ok(rendered.join(&format!(" {} ", operator.as_sql())))
            }
            Criteria::In {
                expression,
                values,
                negated,
            } => {
                let rendered: Vec<String> = values
                    .iter()
                    .map(|v| self.render_expression(v))
                    .collect::<Result<_, _>>()?;
                Ok(format!(
                    "{} {}IN ({})",
                    self.render_expression(expression)?,
                    if *negated { "NOT " } else { "" },
                    rendered.join(", ")
                ))
            }
            Criteria::Like {
                expression,
                pattern,
                escape,
                negated,
            } => {
                let mut sql = format!(
                    "{} {}LIKE {}",
                    self.render_expression(expression)?,
                    if *negated { "NOT " } else { "" },
                    self.render_expression(pattern)?
                );
                if let Some(escape) = escape {
                    sql.push_str(&format!(" ESCAPE '{}'", escape));
                }
                Ok(sql)
            }
            Criteria::IsNull { expression } => {
                Ok(format!("{} IS NULL", self.render_expression(expression)?))
            }
        }
    }

    pub fn render_order_by(&self, order_by: &OrderBy) -> Result<String, ConnectorError> {
        let items: Vec<String> = order_by
            .items
            .iter()
            .map(|item| {
                let rendered = self.render_expression(&item.expression)?;
                Ok(if item.ascending {
                    rendered
                } else {
                    format!("{} DESC", rendered)
                })
            })
            .collect::<Result<_, ConnectorError>>()?;
        Ok(format!("ORDER BY {}", items.join(", ")))
    }

    pub fn render_limit(limit: &Limit) -> String {
        if limit.offset > 0 {
            format!("LIMIT {} OFFSET {}", limit.row_limit, limit.offset)
        } else {
            format!("LIMIT {}", limit.row_limit)
        }
    }

    fn render_expression_list(&self, expressions: &[Expression]) -> Result<String, ConnectorError> {
        let rendered: Vec<String> = expressions
            .iter()
            .map(|e| self.render_expression(e))
            .collect::<Result<_, _>>()?;
        Ok(rendered.join(", "))
    }

    pub fn render_expression(&self, expression: &Expression) -> Result<String, ConnectorError> {
        match expression {
            Expression::Column(column) => Ok(match &column.group {
                Some(group) => format!("{}.{}", group.context, column.name),
                None => column.name.clone(),
            }),
            Expression::Literal(literal) => Ok(self.render_literal(literal)),
            Expression::Function(function) => self.render_function(function, true),
            Expression::Parameter(_) => Ok("?".to_string()),
        }
    }

    fn render_function(
        &self,
        function: &Function,
        allow_modify: bool,
    ) -> Result<String, ConnectorError> {
        let key = function.name.to_ascii_lowercase();
        if allow_modify {
            if let Some(modifier) = self.modifiers.get(&key) {
                return match modifier.modify(function)? {
                    Rewritten::Expression(Expression::Function(rewritten))
                        if rewritten.name.eq_ignore_ascii_case(&function.name) =>
                    {
                        // modifier kept the name; render natively to avoid
                        // re-entering the same rewrite
                        self.render_function(&rewritten, false)
                    }
                    Rewritten::Expression(expression) => self.render_expression(&expression),
                    Rewritten::Parts(parts) => self.render_parts(&parts),
                };
            }
        }

        if INFIX_OPERATORS.contains(&function.name.as_str()) && function.args.len() == 2 {
            return Ok(format!(
                "({} {} {})",
                self.render_expression(&function.args[0])?,
                function.name,
                self.render_expression(&function.args[1])?
            ));
        }

        let args: Vec<String> = function
            .args
            .iter()
            .map(|a| self.render_expression(a))
            .collect::<Result<_, _>>()?;
        Ok(format!("{}({})", function.name, args.join(", ")))
    }

    fn render_parts(&self, parts: &[Part]) -> Result<String, ConnectorError> {
        let mut sql = String::new();
        for part in parts {
            match part {
                Part::Fragment(text) => sql.push_str(text),
                Part::Expression(expression) => sql.push_str(&self.render_expression(expression)?),
            }
        }
        Ok(sql)
    }

    pub fn render_literal(&self, literal: &Literal) -> String {
        match &literal.value {
            Value::Null => "NULL".to_string(),
            Value::String(s) => format!("'{}'", s.replace('\'', "''")),
            Value::Char(c) => format!("'{}'", if *c == '\'' { "''".to_string() } else { c.to_string() }),
            Value::Boolean(b) => {
                if self.options.boolean_as_bit {
                    if *b { "1" } else { "0" }.to_string()
                } else {
                    if *b { "TRUE" } else { "FALSE" }.to_string()
                }
            }
            Value::Byte(v) => v.to_string(),
            Value::Short(v) => v.to_string(),
            Value::Integer(v) => v.to_string(),
            Value::Long(v) => v.to_string(),
            Value::BigInteger(v) => v.to_string(),
            Value::Float(v) => v.to_string(),
            Value::Double(v) => v.to_string(),
            Value::BigDecimal(v) => v.to_string(),
            Value::Date(v) => format!("'{}'", v.format("%Y-%m-%d")),
            Value::Time(v) => format!("'{}'", v.format("%H:%M:%S")),
            Value::Timestamp(v) => format!("'{}'", v.format("%Y-%m-%d %H:%M:%S%.f")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::command::{Group, Limit, OrderBy, Query};
    use crate::models::criteria::{CompareOperator, Criteria};
    use crate::models::expression::ColumnReference;
    use crate::models::types::{TypeCode, Value};

    fn renderer_with(
        modifiers: &HashMap<String, Box<dyn FunctionModifier>>,
    ) -> SqlRenderer<'_> {
        SqlRenderer::new(modifiers, RenderOptions::default())
    }

    fn no_modifiers() -> HashMap<String, Box<dyn FunctionModifier>> {
        HashMap::new()
    }

    #[test]
    fn test_render_basic_query() {
        let modifiers = no_modifiers();
        let renderer = renderer_with(&modifiers);

        let query = Query::new(
            vec![Expression::Column(ColumnReference::new(
                "intkey",
                TypeCode::Integer,
            ))],
            vec![Group::new("bqt1.smalla")],
        )
        .with_criteria(Criteria::compare(
            Expression::Column(ColumnReference::new("stringkey", TypeCode::String)),
            CompareOperator::Eq,
            Expression::literal(Value::String("20".into()), TypeCode::String),
        ))
        .with_order_by(OrderBy::ascending(Expression::Column(
            ColumnReference::new("intkey", TypeCode::Integer),
        )))
        .with_limit(Limit::rows(10));

        let sql = renderer.render_query(&query).unwrap();
        assert_eq!(
            sql,
            "SELECT intkey FROM bqt1.smalla WHERE stringkey = '20' ORDER BY intkey LIMIT 10"
        );
    }

    #[test]
    fn test_render_aliased_group() {
        let modifiers = no_modifiers();
        let renderer = renderer_with(&modifiers);
        assert_eq!(
            renderer.render_group(&Group::aliased("a", "bqt1.smalla")),
            "bqt1.smalla AS a"
        );
    }

    #[test]
    fn test_render_infix_operator() {
        let modifiers = no_modifiers();
        let renderer = renderer_with(&modifiers);
        let expr = Expression::Function(Function::new(
            "%",
            vec![
                Expression::Column(ColumnReference::new("x", TypeCode::Integer)),
                Expression::literal(Value::Integer(2), TypeCode::Integer),
            ],
            TypeCode::Integer,
        ));
        assert_eq!(renderer.render_expression(&expr).unwrap(), "(x % 2)");
    }

    #[test]
    fn test_render_string_literal_escapes_quotes() {
        let modifiers = no_modifiers();
        let renderer = renderer_with(&modifiers);
        let rendered = renderer.render_literal(&Literal {
            value: Value::String("O'Brien".into()),
            value_type: TypeCode::String,
        });
        assert_eq!(rendered, "'O''Brien'");
    }

    #[test]
    fn test_compound_with_one_member_is_translation_error() {
        let modifiers = no_modifiers();
        let renderer = renderer_with(&modifiers);
        let criteria = Criteria::Compound {
            operator: crate::models::criteria::CompoundOperator::And,
            criteria: vec![Criteria::IsNull {
                expression: Expression::Column(ColumnReference::new("x", TypeCode::String)),
            }],
        };
        let err = renderer.render_criteria(&criteria).unwrap_err();
        assert!(matches!(err, ConnectorError::Translation(_)));
    }

    #[test]
    fn test_nested_compound_is_parenthesized() {
        let modifiers = no_modifiers();
        let renderer = renderer_with(&modifiers);
        let inner = Criteria::or(
            Criteria::IsNull {
                expression: Expression::Column(ColumnReference::new("a", TypeCode::String)),
            },
            Criteria::IsNull {
                expression: Expression::Column(ColumnReference::new("b", TypeCode::String)),
            },
        );
        let outer = Criteria::and(
            Criteria::IsNull {
                expression: Expression::Column(ColumnReference::new("c", TypeCode::String)),
            },
            inner,
        );
        assert_eq!(
            renderer.render_criteria(&outer).unwrap(),
            "c IS NULL AND (a IS NULL OR b IS NULL)"
        );
    }

    #[test]
    fn test_render_in_and_like() {
        let modifiers = no_modifiers();
        let renderer = renderer_with(&modifiers);
        let criteria = Criteria::In {
            expression: Expression::Column(ColumnReference::new("intkey", TypeCode::Integer)),
            values: vec![
                Expression::literal(Value::Integer(1), TypeCode::Integer),
                Expression::literal(Value::Integer(2), TypeCode::Integer),
            ],
            negated: true,
        };
        assert_eq!(
            renderer.render_criteria(&criteria).unwrap(),
            "intkey NOT IN (1, 2)"
        );

        let like = Criteria::Like {
            expression: Expression::Column(ColumnReference::new("stringkey", TypeCode::String)),
            pattern: Expression::literal(Value::String("2%".into()), TypeCode::String),
            escape: Some('\\'),
            negated: false,
        };
        assert_eq!(
            renderer.render_criteria(&like).unwrap(),
            "stringkey LIKE '2%' ESCAPE '\\'"
        );
    }
}
