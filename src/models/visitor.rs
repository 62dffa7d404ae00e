// Tree walkers
//
// Free functions with exhaustive matches over the closed node enums. Adding
// a node variant forces every walker to handle it at compile time.

use crate::models::command::{Command, Group, Query, QueryExpression, SetQuery};
use crate::models::criteria::Criteria;
use crate::models::expression::Expression;

/// Pre-order walk over an expression subtree
pub fn visit_expression<F: FnMut(&Expression)>(expression: &Expression, f: &mut F) {
    f(expression);
    match expression {
        Expression::Function(func) => {
            for arg in &func.args {
                visit_expression(arg, f);
            }
        }
        Expression::Column(_) | Expression::Literal(_) | Expression::Parameter(_) => {}
    }
}

/// Pre-order walk over the criteria nodes themselves
pub fn visit_criteria<F: FnMut(&Criteria)>(criteria: &Criteria, f: &mut F) {
    f(criteria);
    if let Criteria::Compound { criteria, .. } = criteria {
        for child in criteria {
            visit_criteria(child, f);
        }
    }
}

/// Walk every criteria node in a command
pub fn visit_command_criteria<F: FnMut(&Criteria)>(command: &Command, f: &mut F) {
    fn visit_query_expression<F: FnMut(&Criteria)>(qe: &QueryExpression, f: &mut F) {
        match qe {
            QueryExpression::Query(q) => {
                if let Some(criteria) = &q.criteria {
                    visit_criteria(criteria, f);
                }
            }
            QueryExpression::Set(s) => {
                visit_query_expression(&s.left, f);
                visit_query_expression(&s.right, f);
            }
        }
    }

    match command {
        Command::Select(q) => {
            if let Some(criteria) = &q.criteria {
                visit_criteria(criteria, f);
            }
        }
        Command::SetQuery(s) => {
            visit_query_expression(&s.left, f);
            visit_query_expression(&s.right, f);
        }
        Command::Update(update) => {
            if let Some(criteria) = &update.criteria {
                visit_criteria(criteria, f);
            }
        }
        Command::Delete(delete) => {
            if let Some(criteria) = &delete.criteria {
                visit_criteria(criteria, f);
            }
        }
        Command::Insert(_) | Command::Call(_) => {}
    }
}

/// Walk every expression referenced by a criteria subtree
pub fn visit_criteria_expressions<F: FnMut(&Expression)>(criteria: &Criteria, f: &mut F) {
    match criteria {
        Criteria::Compare { left, right, .. } => {
            visit_expression(left, f);
            visit_expression(right, f);
        }
        Criteria::Compound { criteria, .. } => {
            for child in criteria {
                visit_criteria_expressions(child, f);
            }
        }
        Criteria::In {
            expression, values, ..
        } => {
            visit_expression(expression, f);
            for value in values {
                visit_expression(value, f);
            }
        }
        Criteria::Like {
            expression, pattern, ..
        } => {
            visit_expression(expression, f);
            visit_expression(pattern, f);
        }
        Criteria::IsNull { expression } => visit_expression(expression, f),
    }
}

fn visit_query_expressions<F: FnMut(&Expression)>(query: &Query, f: &mut F) {
    for expr in &query.select {
        visit_expression(expr, f);
    }
    if let Some(criteria) = &query.criteria {
        visit_criteria_expressions(criteria, f);
    }
    if let Some(order_by) = &query.order_by {
        for item in &order_by.items {
            visit_expression(&item.expression, f);
        }
    }
}

fn visit_set_query_expressions<F: FnMut(&Expression)>(set: &SetQuery, f: &mut F) {
    visit_query_expression_expressions(&set.left, f);
    visit_query_expression_expressions(&set.right, f);
    if let Some(order_by) = &set.order_by {
        for item in &order_by.items {
            visit_expression(&item.expression, f);
        }
    }
}

fn visit_query_expression_expressions<F: FnMut(&Expression)>(qe: &QueryExpression, f: &mut F) {
    match qe {
        QueryExpression::Query(q) => visit_query_expressions(q, f),
        QueryExpression::Set(s) => visit_set_query_expressions(s, f),
    }
}

/// Walk every expression in a command
pub fn visit_command_expressions<F: FnMut(&Expression)>(command: &Command, f: &mut F) {
    match command {
        Command::Select(q) => visit_query_expressions(q, f),
        Command::SetQuery(s) => visit_set_query_expressions(s, f),
        Command::Insert(insert) => {
            for value in &insert.values {
                visit_expression(value, f);
            }
        }
        Command::Update(update) => {
            for change in &update.changes {
                visit_expression(&change.value, f);
            }
            if let Some(criteria) = &update.criteria {
                visit_criteria_expressions(criteria, f);
            }
        }
        Command::Delete(delete) => {
            if let Some(criteria) = &delete.criteria {
                visit_criteria_expressions(criteria, f);
            }
        }
        Command::Call(_) => {}
    }
}

/// Walk every group referenced by a command
pub fn visit_command_groups<F: FnMut(&Group)>(command: &Command, f: &mut F) {
    match command {
        Command::Select(q) => {
            for group in &q.from {
                f(group);
            }
        }
        Command::SetQuery(s) => {
            visit_query_expression_groups(&s.left, f);
            visit_query_expression_groups(&s.right, f);
        }
        Command::Insert(insert) => f(&insert.group),
        Command::Update(update) => f(&update.group),
        Command::Delete(delete) => f(&delete.group),
        Command::Call(_) => {}
    }
}

fn visit_query_expression_groups<F: FnMut(&Group)>(qe: &QueryExpression, f: &mut F) {
    match qe {
        QueryExpression::Query(q) => {
            for group in &q.from {
                f(group);
            }
        }
        QueryExpression::Set(s) => {
            visit_query_expression_groups(&s.left, f);
            visit_query_expression_groups(&s.right, f);
        }
    }
}
