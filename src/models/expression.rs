// Expression nodes of the command tree
//
// A closed sum type: rewrite and rendering dispatch on the variant with
// exhaustive matches instead of downcasting through an open interface
// hierarchy.

use serde::{Deserialize, Serialize};

use crate::error::ConnectorError;
use crate::models::command::Group;
use crate::models::metadata::MetadataId;
use crate::models::types::{TypeCode, Value};

/// One expression subtree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expression {
    Column(ColumnReference),
    Literal(Literal),
    Function(Function),
    Parameter(Parameter),
}

impl Expression {
    /// Declared runtime type of this expression
    pub fn value_type(&self) -> TypeCode {
        match self {
            Expression::Column(c) => c.value_type,
            Expression::Literal(l) => l.value_type,
            Expression::Function(f) => f.return_type,
            Expression::Parameter(p) => p.value_type(),
        }
    }

    /// Convenience constructor for a typed literal
    pub fn literal(value: Value, value_type: TypeCode) -> Self {
        Expression::Literal(Literal { value, value_type })
    }
}

/// Reference to a column of some group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnReference {
    pub name: String,
    pub group: Option<Group>,
    pub metadata_id: Option<MetadataId>,
    pub value_type: TypeCode,
}

impl ColumnReference {
    pub fn new(name: impl Into<String>, value_type: TypeCode) -> Self {
        Self {
            name: name.into(),
            group: None,
            metadata_id: None,
            value_type,
        }
    }

    pub fn with_group(mut self, group: Group) -> Self {
        self.group = Some(group);
        self
    }

    pub fn with_metadata_id(mut self, id: MetadataId) -> Self {
        self.metadata_id = Some(id);
        self
    }
}

/// Typed literal value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Literal {
    pub value: Value,
    pub value_type: TypeCode,
}

/// Portable function call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Function {
    pub name: String,
    pub args: Vec<Expression>,
    pub return_type: TypeCode,
}

impl Function {
    pub fn new(name: impl Into<String>, args: Vec<Expression>, return_type: TypeCode) -> Self {
        Self {
            name: name.into(),
            args,
            return_type,
        }
    }
}

/// Direction of a procedure parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterDirection {
    In,
    Out,
    InOut,
    ReturnValue,
}

impl ParameterDirection {
    /// True when the backend populates a value for this parameter
    pub fn is_output(&self) -> bool {
        matches!(
            self,
            ParameterDirection::Out | ParameterDirection::InOut | ParameterDirection::ReturnValue
        )
    }
}

/// Procedure-call parameter
///
/// Constructed at translation time, bindable through `set_value` until the
/// owning execution starts. `execute()` freezes every parameter; later
/// binds are protocol errors. `value_specified` distinguishes an explicit
/// bind (including an explicit NULL) from a defaulted parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    index: usize,
    direction: ParameterDirection,
    value: Option<Value>,
    value_type: TypeCode,
    metadata_id: Option<MetadataId>,
    value_specified: bool,
    frozen: bool,
}

impl Parameter {
    pub fn new(index: usize, direction: ParameterDirection, value_type: TypeCode) -> Self {
        Self {
            index,
            direction,
            value: None,
            value_type,
            metadata_id: None,
            value_specified: false,
            frozen: false,
        }
    }

    pub fn with_value(mut self, value: Value) -> Self {
        self.value = Some(value);
        self.value_specified = true;
        self
    }

    pub fn with_metadata_id(mut self, id: MetadataId) -> Self {
        self.metadata_id = Some(id);
        self
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn direction(&self) -> ParameterDirection {
        self.direction
    }

    pub fn value(&self) -> Option<&Value> {
        self.value.as_ref()
    }

    pub fn value_type(&self) -> TypeCode {
        self.value_type
    }

    pub fn metadata_id(&self) -> Option<&MetadataId> {
        self.metadata_id.as_ref()
    }

    /// True when a value was explicitly bound rather than defaulted
    pub fn value_specified(&self) -> bool {
        self.value_specified
    }

    /// Bind a value
    ///
    /// # Errors
    /// Returns `InvalidState` once the owning execution has started.
    pub fn set_value(&mut self, value: Value) -> Result<(), ConnectorError> {
        if self.frozen {
            return Err(ConnectorError::InvalidState(format!(
                "Parameter {} is frozen; values cannot change after execution start",
                self.index
            )));
        }
        self.value = Some(value);
        self.value_specified = true;
        Ok(())
    }

    /// Freeze the parameter against further binds. Called by `execute()`.
    pub fn freeze(&mut self) {
        self.frozen = true;
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }
}
