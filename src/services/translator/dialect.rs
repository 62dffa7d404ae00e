// Dialect translators
//
// Defines the trait and implementations for translating command trees into
// backend-native SQL. Each backend family supplies its capabilities, its
// function modifiers and its rendering options; shared emulation logic
// (TOP-based row limiting) lives here.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::ConnectorError;
use crate::models::command::Command;
use crate::models::criteria::Criteria;
use crate::models::expression::{Expression, ParameterDirection};
use crate::models::types::Value;
use crate::models::visitor::{
    visit_command_criteria, visit_command_expressions, visit_command_groups,
};
use crate::services::capabilities::{
    Capabilities, LoopbackCapabilities, SqlFeature, SqlServerCapabilities,
};
use crate::services::translator::convert::ConvertModifier;
use crate::services::translator::modifiers::{
    AliasModifier, FunctionModifier, ModFunctionModifier,
};
use crate::services::translator::renderer::{CallStyle, RenderOptions, SqlRenderer};

/// A command translated to backend-native SQL
#[derive(Debug, Clone, PartialEq)]
pub struct TranslatedCommand {
    pub sql: String,
    /// IN/INOUT procedure parameter values, in declaration order
    pub bind_values: Vec<Value>,
}

/// Trait for translating command trees to a backend dialect
#[async_trait]
pub trait DialectTranslator: Send + Sync {
    /// Get the name of this dialect (e.g., "SQLServer", "Sybase")
    fn dialect_name(&self) -> &str;

    /// Capability descriptor shared with the planner
    fn capabilities(&self) -> Arc<dyn Capabilities>;

    /// Translate a command to the target dialect
    ///
    /// # Errors
    /// Returns `Translation` only for constructs with no fallback form;
    /// per-function fallbacks are resolved internally and never surface.
    async fn translate(&self, command: &Command) -> Result<TranslatedCommand, ConnectorError>;
}

/// Function-name operators never validated against the capability list
fn is_operator(name: &str) -> bool {
    matches!(name, "+" | "-" | "*" | "/" | "%" | "||")
}

/// Reject constructs the backend can neither execute nor emulate
fn validate_pushdown(
    command: &Command,
    capabilities: &dyn Capabilities,
    modifiers: &HashMap<String, Box<dyn FunctionModifier>>,
    dialect: &str,
) -> Result<(), ConnectorError> {
    let mut unsupported: Option<String> = None;
    visit_command_expressions(command, &mut |expr| {
        if let Expression::Function(func) = expr {
            let key = func.name.to_ascii_lowercase();
            if !is_operator(&func.name)
                && !modifiers.contains_key(&key)
                && !capabilities.supported_functions().contains(&key)
                && unsupported.is_none()
            {
                unsupported = Some(func.name.clone());
            }
        }
    });
    if let Some(name) = unsupported {
        return Err(ConnectorError::Translation(format!(
            "Function '{}' cannot be pushed down to {}",
            name, dialect
        )));
    }

    let max_groups = capabilities.max_from_groups();
    if max_groups > 0 {
        let mut count = 0usize;
        visit_command_groups(command, &mut |_| count += 1);
        if count > max_groups as usize {
            return Err(ConnectorError::Translation(format!(
                "{} FROM groups exceed the {} supported by {}",
                count, max_groups, dialect
            )));
        }
    }

    let max_in = capabilities.max_in_criteria_size();
    if max_in > 0 {
        let mut oversized = false;
        visit_command_criteria(command, &mut |criteria| {
            if let Criteria::In { values, .. } = criteria {
                if values.len() > max_in as usize {
                    oversized = true;
                }
            }
        });
        if oversized {
            return Err(ConnectorError::Translation(format!(
                "IN predicate exceeds the {} values supported by {}",
                max_in, dialect
            )));
        }
    }

    if let Command::SetQuery(set) = command {
        let feature = match set.operation {
            crate::models::command::SetOperation::Union => SqlFeature::Unions,
            crate::models::command::SetOperation::Intersect => SqlFeature::Intersect,
            crate::models::command::SetOperation::Except => SqlFeature::Except,
        };
        if !capabilities.supports_feature(feature) {
            return Err(ConnectorError::Translation(format!(
                "{} is not supported by {}",
                set.operation.as_sql(),
                dialect
            )));
        }
    }

    Ok(())
}

/// Render a command for a dialect without native LIMIT syntax
///
/// A row-limited query is wrapped as
/// `SELECT TOP n * FROM (<inner>) AS X [ORDER BY ...]`: the Limit and
/// OrderBy nodes are removed from the inner query and the OrderBy, when
/// present, is reattached to the outer wrapper.
fn render_with_top_wrapping(
    command: &Command,
    renderer: &SqlRenderer<'_>,
    dialect: &str,
) -> Result<String, ConnectorError> {
    let limit = match command.limit() {
        Some(limit) => *limit,
        None => return renderer.render_command(command),
    };
    if limit.offset > 0 {
        return Err(ConnectorError::Translation(format!(
            "{} has no native row offset",
            dialect
        )));
    }

    let (inner_sql, order_by) = match command {
        Command::Select(query) => {
            let mut inner = query.clone();
            let order_by = inner.order_by.take();
            inner.limit = None;
            (renderer.render_query(&inner)?, order_by)
        }
        Command::SetQuery(set) => {
            let mut inner = set.clone();
            let order_by = inner.order_by.take();
            inner.limit = None;
            (renderer.render_set_query(&inner)?, order_by)
        }
        // limit() is only populated for queries
        _ => return renderer.render_command(command),
    };

    let mut sql = format!("SELECT TOP {} * FROM ({}) AS X", limit.row_limit, inner_sql);
    if let Some(order_by) = order_by {
        sql.push(' ');
        sql.push_str(&renderer.render_order_by(&order_by)?);
    }
    tracing::debug!("Rewrote row limit to TOP wrapper for {}", dialect);
    Ok(sql)
}

/// Collect IN/INOUT procedure parameter values for binding
fn collect_bind_values(command: &Command) -> Vec<Value> {
    match command {
        Command::Call(procedure) => procedure
            .parameters
            .iter()
            .filter(|p| {
                matches!(
                    p.direction(),
                    ParameterDirection::In | ParameterDirection::InOut
                )
            })
            .map(|p| p.value().cloned().unwrap_or(Value::Null))
            .collect(),
        _ => Vec::new(),
    }
}

/// Modifiers shared by the SQL-Server family dialects
fn sql_server_family_modifiers() -> HashMap<String, Box<dyn FunctionModifier>> {
    let mut modifiers: HashMap<String, Box<dyn FunctionModifier>> = HashMap::new();
    modifiers.insert("mod".to_string(), Box::new(ModFunctionModifier));
    modifiers.insert("convert".to_string(), Box::new(ConvertModifier));
    modifiers.insert("ucase".to_string(), Box::new(AliasModifier::new("upper")));
    modifiers.insert("lcase".to_string(), Box::new(AliasModifier::new("lower")));
    modifiers.insert("concat".to_string(), Box::new(AliasModifier::new("+")));
    modifiers
}

/// SQL Server dialect translator
pub struct SqlServerTranslator {
    capabilities: Arc<dyn Capabilities>,
    modifiers: HashMap<String, Box<dyn FunctionModifier>>,
}

impl SqlServerTranslator {
    pub fn new() -> Self {
        Self {
            capabilities: Arc::new(SqlServerCapabilities::new()),
            modifiers: sql_server_family_modifiers(),
        }
    }

    fn render_options() -> RenderOptions {
        RenderOptions {
            boolean_as_bit: true,
            call_style: CallStyle::Exec,
        }
    }
}

impl Default for SqlServerTranslator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DialectTranslator for SqlServerTranslator {
    fn dialect_name(&self) -> &str {
        "SQLServer"
    }

    fn capabilities(&self) -> Arc<dyn Capabilities> {
        self.capabilities.clone()
    }

    async fn translate(&self, command: &Command) -> Result<TranslatedCommand, ConnectorError> {
        validate_pushdown(command, &*self.capabilities, &self.modifiers, self.dialect_name())?;
        let renderer = SqlRenderer::new(&self.modifiers, Self::render_options());
        let sql = render_with_top_wrapping(command, &renderer, self.dialect_name())?;
        Ok(TranslatedCommand {
            sql,
            bind_values: collect_bind_values(command),
        })
    }
}

/// Sybase dialect translator
///
/// Shares the SQL Server convert table and TOP-based limit emulation; kept
/// separate so capability drift between the two products stays isolated.
pub struct SybaseTranslator {
    capabilities: Arc<dyn Capabilities>,
    modifiers: HashMap<String, Box<dyn FunctionModifier>>,
}

impl SybaseTranslator {
    pub fn new() -> Self {
        Self {
            capabilities: Arc::new(SqlServerCapabilities::new()),
            modifiers: sql_server_family_modifiers(),
        }
    }
}

impl Default for SybaseTranslator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DialectTranslator for SybaseTranslator {
    fn dialect_name(&self) -> &str {
        "Sybase"
    }

    fn capabilities(&self) -> Arc<dyn Capabilities> {
        self.capabilities.clone()
    }

    async fn translate(&self, command: &Command) -> Result<TranslatedCommand, ConnectorError> {
        validate_pushdown(command, &*self.capabilities, &self.modifiers, self.dialect_name())?;
        let renderer = SqlRenderer::new(&self.modifiers, SqlServerTranslator::render_options());
        let sql = render_with_top_wrapping(command, &renderer, self.dialect_name())?;
        Ok(TranslatedCommand {
            sql,
            bind_values: collect_bind_values(command),
        })
    }
}

/// Generic dialect translator (pass-through rendering)
///
/// Used for backends that accept portable SQL unchanged, including the
/// loopback test backend.
pub struct GenericTranslator {
    capabilities: Arc<dyn Capabilities>,
    modifiers: HashMap<String, Box<dyn FunctionModifier>>,
}

impl GenericTranslator {
    pub fn new() -> Self {
        Self {
            capabilities: Arc::new(LoopbackCapabilities::new()),
            modifiers: HashMap::new(),
        }
    }
}

impl Default for GenericTranslator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DialectTranslator for GenericTranslator {
    fn dialect_name(&self) -> &str {
        "Generic"
    }

    fn capabilities(&self) -> Arc<dyn Capabilities> {
        self.capabilities.clone()
    }

    async fn translate(&self, command: &Command) -> Result<TranslatedCommand, ConnectorError> {
        validate_pushdown(command, &*self.capabilities, &self.modifiers, self.dialect_name())?;
        let renderer = SqlRenderer::new(&self.modifiers, RenderOptions::default());
        let sql = renderer.render_command(command)?;
        Ok(TranslatedCommand {
            sql,
            bind_values: collect_bind_values(command),
        })
    }
}
