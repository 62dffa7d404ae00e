// Command tree
//
// One pushdown-able operation as handed over by the planner. The tree is a
// closed sum type; translators and renderers walk it with exhaustive
// matches.

use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::models::criteria::Criteria;
use crate::models::expression::{ColumnReference, Expression, Parameter};
use crate::models::metadata::MetadataId;
use crate::models::types::TypeCode;

/// Table reference: the context name used in SQL text plus the underlying
/// definition when the context is an alias
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Group {
    /// Name the query text refers to the group by (the alias when aliased)
    pub context: String,
    /// Actual table name when `context` is an alias; `None` when unaliased
    pub definition: Option<String>,
    pub metadata_id: Option<MetadataId>,
}

impl Group {
    pub fn new(context: impl Into<String>) -> Self {
        Self {
            context: context.into(),
            definition: None,
            metadata_id: None,
        }
    }

    pub fn aliased(context: impl Into<String>, definition: impl Into<String>) -> Self {
        Self {
            context: context.into(),
            definition: Some(definition.into()),
            metadata_id: None,
        }
    }

    pub fn with_metadata_id(mut self, id: MetadataId) -> Self {
        self.metadata_id = Some(id);
        self
    }

    /// True when the group carries an alias
    pub fn is_aliased(&self) -> bool {
        self.definition.is_some()
    }
}

// Equality follows SQL identifier semantics: context names compare
// case-insensitively. Two groups are never equal when one carries an alias
// and the other does not, even with matching context names. Callers rely on
// this alias-presence parity; keep it when touching this impl.
impl PartialEq for Group {
    fn eq(&self, other: &Self) -> bool {
        if self.definition.is_some() != other.definition.is_some() {
            return false;
        }
        self.context.eq_ignore_ascii_case(&other.context)
    }
}

impl Eq for Group {}

impl Hash for Group {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.context.to_ascii_lowercase().hash(state);
        self.definition.is_some().hash(state);
    }
}

/// Row limit and offset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Limit {
    pub row_limit: u64,
    pub offset: u64,
}

impl Limit {
    pub fn rows(row_limit: u64) -> Self {
        Self {
            row_limit,
            offset: 0,
        }
    }
}

/// ORDER BY clause
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderBy {
    pub items: Vec<OrderByItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderByItem {
    pub expression: Expression,
    pub ascending: bool,
}

impl OrderBy {
    pub fn ascending(expression: Expression) -> Self {
        Self {
            items: vec![OrderByItem {
                expression,
                ascending: true,
            }],
        }
    }
}

/// Plain SELECT query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Query {
    pub select: Vec<Expression>,
    pub from: Vec<Group>,
    pub criteria: Option<Criteria>,
    pub order_by: Option<OrderBy>,
    pub limit: Option<Limit>,
}

impl Query {
    pub fn new(select: Vec<Expression>, from: Vec<Group>) -> Self {
        Self {
            select,
            from,
            criteria: None,
            order_by: None,
            limit: None,
        }
    }

    pub fn with_criteria(mut self, criteria: Criteria) -> Self {
        self.criteria = Some(criteria);
        self
    }

    pub fn with_order_by(mut self, order_by: OrderBy) -> Self {
        self.order_by = Some(order_by);
        self
    }

    pub fn with_limit(mut self, limit: Limit) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Declared types of the projected columns
    pub fn output_types(&self) -> Vec<TypeCode> {
        self.select.iter().map(|e| e.value_type()).collect()
    }
}

/// Set operation kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SetOperation {
    Union,
    Intersect,
    Except,
}

impl SetOperation {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SetOperation::Union => "UNION",
            SetOperation::Intersect => "INTERSECT",
            SetOperation::Except => "EXCEPT",
        }
    }
}

/// Either branch of a set query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum QueryExpression {
    Query(Query),
    Set(Box<SetQuery>),
}

impl QueryExpression {
    /// Projection types, taken from the leftmost plain query
    pub fn output_types(&self) -> Vec<TypeCode> {
        match self {
            QueryExpression::Query(q) => q.output_types(),
            QueryExpression::Set(s) => s.left.output_types(),
        }
    }
}

/// UNION / INTERSECT / EXCEPT of two query expressions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetQuery {
    pub operation: SetOperation,
    pub all: bool,
    pub left: QueryExpression,
    pub right: QueryExpression,
    pub order_by: Option<OrderBy>,
    pub limit: Option<Limit>,
}

/// INSERT
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insert {
    pub group: Group,
    pub columns: Vec<ColumnReference>,
    pub values: Vec<Expression>,
}

/// One SET clause of an UPDATE
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetClause {
    pub symbol: ColumnReference,
    pub value: Expression,
}

/// UPDATE
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Update {
    pub group: Group,
    pub changes: Vec<SetClause>,
    pub criteria: Option<Criteria>,
}

/// DELETE
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Delete {
    pub group: Group,
    pub criteria: Option<Criteria>,
}

/// Stored-procedure call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Procedure {
    pub name: String,
    pub parameters: Vec<Parameter>,
    pub metadata_id: Option<MetadataId>,
}

/// A pushdown-able operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Command {
    Select(Query),
    SetQuery(SetQuery),
    Insert(Insert),
    Update(Update),
    Delete(Delete),
    Call(Procedure),
}

impl Command {
    /// The row limit carried by this command, if any
    pub fn limit(&self) -> Option<&Limit> {
        match self {
            Command::Select(q) => q.limit.as_ref(),
            Command::SetQuery(s) => s.limit.as_ref(),
            Command::Insert(_) | Command::Update(_) | Command::Delete(_) | Command::Call(_) => {
                None
            }
        }
    }

    /// True for data-modification commands
    pub fn is_update_command(&self) -> bool {
        matches!(
            self,
            Command::Insert(_) | Command::Update(_) | Command::Delete(_)
        )
    }

    /// Declared types of the command's output columns; empty for
    /// data-modification commands and procedure calls without result sets
    pub fn output_types(&self) -> Vec<TypeCode> {
        match self {
            Command::Select(q) => q.output_types(),
            Command::SetQuery(s) => s.left.output_types(),
            Command::Insert(_) | Command::Update(_) | Command::Delete(_) | Command::Call(_) => {
                Vec::new()
            }
        }
    }

    /// Freeze every procedure parameter against further binds
    pub fn freeze_parameters(&mut self) {
        if let Command::Call(proc) = self {
            for param in &mut proc.parameters {
                param.freeze();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_equality_case_insensitive() {
        let a = Group::new("BQT1.SmallA");
        let b = Group::new("bqt1.smalla");
        assert_eq!(a, b);
    }

    #[test]
    fn test_group_equality_alias_parity() {
        // identical context, differing alias presence: never equal
        let plain = Group::new("smalla");
        let aliased = Group::aliased("smalla", "bqt1.smalla");
        assert_ne!(plain, aliased);
        assert_ne!(aliased, plain);

        // both aliased, contexts differing only in case: equal
        let aliased_upper = Group::aliased("SMALLA", "bqt1.smalla");
        assert_eq!(aliased, aliased_upper);
    }

    #[test]
    fn test_command_limit_only_on_queries() {
        let query = Query::new(vec![], vec![Group::new("t")]).with_limit(Limit::rows(10));
        assert_eq!(Command::Select(query).limit(), Some(&Limit::rows(10)));

        let delete = Delete {
            group: Group::new("t"),
            criteria: None,
        };
        assert_eq!(Command::Delete(delete).limit(), None);
    }

    #[test]
    fn test_is_update_command() {
        let insert = Insert {
            group: Group::new("t"),
            columns: vec![],
            values: vec![],
        };
        assert!(Command::Insert(insert).is_update_command());

        let query = Query::new(vec![], vec![Group::new("t")]);
        assert!(!Command::Select(query).is_update_command());
    }
}
