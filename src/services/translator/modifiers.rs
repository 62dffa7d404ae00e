// Function modifiers
//
// A modifier rewrites one portable function call into backend-native form:
// either a replacement expression subtree or an ordered list of "parts"
// (verbatim SQL fragments interleaved with expressions) that the renderer
// concatenates.

use crate::error::ConnectorError;
use crate::models::expression::{Expression, Function};
use crate::models::types::TypeCode;

/// One fragment of a rewritten function call
#[derive(Debug, Clone)]
pub enum Part {
    /// Verbatim SQL text
    Fragment(String),
    /// An expression rendered in place
    Expression(Expression),
}

impl Part {
    pub fn fragment(text: impl Into<String>) -> Self {
        Part::Fragment(text.into())
    }
}

/// Result of rewriting a function call
#[derive(Debug, Clone)]
pub enum Rewritten {
    /// A replacement expression, rendered through the normal pipeline
    Expression(Expression),
    /// Backend-native fragments concatenated verbatim
    Parts(Vec<Part>),
}

/// Rewrite rule for one portable function
pub trait FunctionModifier: Send + Sync {
    fn modify(&self, function: &Function) -> Result<Rewritten, ConnectorError>;
}

/// Fallback rewrite: drop the function and pass its first argument through
///
/// Used wherever a pairing or target is not natively representable; by
/// contract this never fails.
pub struct DropFunctionModifier;

impl FunctionModifier for DropFunctionModifier {
    fn modify(&self, function: &Function) -> Result<Rewritten, ConnectorError> {
        match function.args.first() {
            Some(arg) => Ok(Rewritten::Expression(arg.clone())),
            None => Err(ConnectorError::Translation(format!(
                "Function '{}' has no argument to pass through",
                function.name
            ))),
        }
    }
}

/// Rename a function call, keeping its arguments
pub struct AliasModifier {
    target: String,
}

impl AliasModifier {
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
        }
    }
}

impl FunctionModifier for AliasModifier {
    fn modify(&self, function: &Function) -> Result<Rewritten, ConnectorError> {
        Ok(Rewritten::Expression(Expression::Function(Function::new(
            self.target.clone(),
            function.args.clone(),
            function.return_type,
        ))))
    }
}

/// MOD rewrite
///
/// Emits the native `%` operator only when BOTH operands are INTEGER-typed.
/// Any other typing rewrites to `x - floor(x / y) * y`, composed as
/// divide -> floor -> multiply -> subtract with subtract outermost.
pub struct ModFunctionModifier;

impl FunctionModifier for ModFunctionModifier {
    fn modify(&self, function: &Function) -> Result<Rewritten, ConnectorError> {
        if function.args.len() != 2 {
            return Err(ConnectorError::Translation(format!(
                "MOD takes two arguments, got {}",
                function.args.len()
            )));
        }
        let x = function.args[0].clone();
        let y = function.args[1].clone();

        if x.value_type() == TypeCode::Integer && y.value_type() == TypeCode::Integer {
            return Ok(Rewritten::Expression(Expression::Function(Function::new(
                "%",
                vec![x, y],
                TypeCode::Integer,
            ))));
        }

        let result_type = function.return_type;
        let divide = Function::new("/", vec![x.clone(), y.clone()], result_type);
        let floor = Function::new("floor", vec![Expression::Function(divide)], result_type);
        let multiply = Function::new("*", vec![Expression::Function(floor), y], result_type);
        let subtract = Function::new("-", vec![x, Expression::Function(multiply)], result_type);
        Ok(Rewritten::Expression(Expression::Function(subtract)))
    }
}
