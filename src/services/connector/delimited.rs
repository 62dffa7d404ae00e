// Delimited-file connector
//
// Serves SELECT pushdowns from delimited text files, one file per group.
// Pushed-down criteria are applied while records are read, before anything
// reaches the iteration buffer, and the row limit stops the read early.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use crate::config::ConnectorProperties;
use crate::error::ConnectorError;
use crate::models::command::{Command, Query};
use crate::models::expression::Expression;
use crate::models::metadata::RuntimeMetadata;
use crate::models::types::{TypeCode, Value};
use crate::models::visitor::visit_criteria_expressions;
use crate::services::capabilities::{
    Capabilities, CapabilitiesRegistry, DelimitedFileCapabilities,
};
use crate::services::connector::filter;
use crate::services::connector::Connector;
use crate::services::execution::{Execution, ExecutionContext, ExecutionState, NextResult};

/// Directory containing the data files; required
pub const PROP_ROOT_DIRECTORY: &str = "RootDirectory";
/// Field delimiter, a single character; defaults to a comma
pub const PROP_DELIMITER: &str = "Delimiter";
/// Name of a registered capabilities implementation to use instead of the
/// default
pub const PROP_CAPABILITIES_CLASS: &str = "CapabilitiesClass";

/// Connection facade over a directory of delimited files
pub struct DelimitedFileConnector {
    properties: ConnectorProperties,
    capabilities: Arc<dyn Capabilities>,
    closed: bool,
}

impl std::fmt::Debug for DelimitedFileConnector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DelimitedFileConnector")
            .field("properties", &self.properties)
            .field("closed", &self.closed)
            .finish_non_exhaustive()
    }
}

impl DelimitedFileConnector {
    /// # Errors
    /// Returns `Configuration` when `RootDirectory` is missing.
    pub fn new(
        properties: ConnectorProperties,
        registry: &CapabilitiesRegistry,
    ) -> Result<Self, ConnectorError> {
        if properties.get(PROP_ROOT_DIRECTORY).is_none() {
            return Err(ConnectorError::Configuration(format!(
                "Property '{}' is required",
                PROP_ROOT_DIRECTORY
            )));
        }
        let capabilities = registry.resolve_or_default(
            properties.get(PROP_CAPABILITIES_CLASS),
            || Arc::new(DelimitedFileCapabilities::new()),
        );
        Ok(Self {
            properties,
            capabilities,
            closed: false,
        })
    }

    pub fn capabilities(&self) -> Arc<dyn Capabilities> {
        self.capabilities.clone()
    }
}

#[async_trait]
impl Connector for DelimitedFileConnector {
    async fn create_execution(
        &self,
        command: Command,
        context: ExecutionContext,
        metadata: Arc<dyn RuntimeMetadata>,
    ) -> Result<Box<dyn Execution>, ConnectorError> {
        if self.closed {
            return Err(ConnectorError::Backend(
                "Connection is closed".to_string(),
            ));
        }
        Ok(Box::new(DelimitedFileExecution::new(
            command,
            self.properties.clone(),
            context,
            metadata,
        )))
    }

    fn is_alive(&self) -> bool {
        if self.closed {
            return false;
        }
        // uncertainty must read as dead rather than raising
        match self.properties.get(PROP_ROOT_DIRECTORY) {
            Some(root) => std::path::Path::new(root).is_dir(),
            None => false,
        }
    }

    fn close(&mut self) {
        if !self.closed {
            self.closed = true;
            tracing::debug!("Delimited-file connection closed");
        }
    }
}

/// One SELECT against one delimited file
pub struct DelimitedFileExecution {
    command: Command,
    properties: ConnectorProperties,
    context: ExecutionContext,
    metadata: Arc<dyn RuntimeMetadata>,
    state: ExecutionState,
    cancelled: Arc<AtomicBool>,
    /// Filtered, projected rows in file order
    rows: std::collections::VecDeque<Vec<Value>>,
}

impl DelimitedFileExecution {
    pub fn new(
        command: Command,
        properties: ConnectorProperties,
        context: ExecutionContext,
        metadata: Arc<dyn RuntimeMetadata>,
    ) -> Self {
        Self {
            command,
            properties,
            context,
            metadata,
            state: ExecutionState::Created,
            cancelled: Arc::new(AtomicBool::new(false)),
            rows: std::collections::VecDeque::new(),
        }
    }

    /// Column name -> declared type, collected from projection and criteria
    fn column_types(query: &Query) -> std::collections::HashMap<String, TypeCode> {
        let mut types = std::collections::HashMap::new();
        let mut record = |expr: &Expression| {
            if let Expression::Column(column) = expr {
                types.insert(column.name.to_ascii_lowercase(), column.value_type);
            }
        };
        for expr in &query.select {
            record(expr);
        }
        if let Some(criteria) = &query.criteria {
            visit_criteria_expressions(criteria, &mut record);
        }
        types
    }

    /// Parse one cell according to the declared column type
    fn parse_cell(raw: &str, type_code: TypeCode) -> Result<Value, ConnectorError> {
        if raw.is_empty() {
            return Ok(Value::Null);
        }
        let parse_err = |kind: &str| {
            ConnectorError::Backend(format!("Cell '{}' is not a valid {}", raw, kind))
        };
        match type_code {
            TypeCode::String => Ok(Value::String(raw.to_string())),
            TypeCode::Char => raw
                .chars()
                .next()
                .map(Value::Char)
                .ok_or_else(|| parse_err("char")),
            TypeCode::Boolean => match raw.to_ascii_lowercase().as_str() {
                "true" | "1" => Ok(Value::Boolean(true)),
                "false" | "0" => Ok(Value::Boolean(false)),
                _ => Err(parse_err("boolean")),
            },
            TypeCode::Byte => raw.parse().map(Value::Byte).map_err(|_| parse_err("byte")),
            TypeCode::Short => raw.parse().map(Value::Short).map_err(|_| parse_err("short")),
            TypeCode::Integer => raw
                .parse()
                .map(Value::Integer)
                .map_err(|_| parse_err("integer")),
            TypeCode::Long => raw.parse().map(Value::Long).map_err(|_| parse_err("long")),
            TypeCode::BigInteger => raw
                .parse()
                .map(Value::BigInteger)
                .map_err(|_| parse_err("biginteger")),
            TypeCode::Float => raw.parse().map(Value::Float).map_err(|_| parse_err("float")),
            TypeCode::Double => raw
                .parse()
                .map(Value::Double)
                .map_err(|_| parse_err("double")),
            TypeCode::BigDecimal => raw
                .parse()
                .map(Value::BigDecimal)
                .map_err(|_| parse_err("bigdecimal")),
            TypeCode::Date => chrono::NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .map(Value::Date)
                .map_err(|_| parse_err("date")),
            TypeCode::Time => chrono::NaiveTime::parse_from_str(raw, "%H:%M:%S")
                .map(Value::Time)
                .map_err(|_| parse_err("time")),
            TypeCode::Timestamp => {
                chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
                    .map(Value::Timestamp)
                    .map_err(|_| parse_err("timestamp"))
            }
        }
    }

    /// Resolve the file backing the queried group
    fn data_file(&self, query: &Query) -> Result<PathBuf, ConnectorError> {
        let group = match query.from.as_slice() {
            [group] => group,
            groups => {
                return Err(ConnectorError::Translation(format!(
                    "The file backend reads exactly one group per query, got {}",
                    groups.len()
                )))
            }
        };
        let file_name = match &group.metadata_id {
            Some(id) => self.metadata.source_name(id)?,
            None => {
                let base = group.definition.as_deref().unwrap_or(&group.context);
                format!("{}.csv", base)
            }
        };
        let root = self.properties.get_string(PROP_ROOT_DIRECTORY, "");
        Ok(PathBuf::from(root).join(file_name))
    }

    fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Execution for DelimitedFileExecution {
    async fn execute(&mut self) -> Result<(), ConnectorError> {
        if self.state != ExecutionState::Created {
            return Err(ConnectorError::InvalidState(
                "execute() may only be called once".to_string(),
            ));
        }
        let query = match &self.command {
            Command::Select(query) => query.clone(),
            _ => {
                return Err(ConnectorError::Translation(
                    "The file backend only executes SELECT commands".to_string(),
                ))
            }
        };

        let delimiter = self.properties.get_string(PROP_DELIMITER, ",");
        let delimiter = match delimiter.as_bytes() {
            [byte] => *byte,
            _ => {
                return Err(ConnectorError::Configuration(format!(
                    "Property '{}' must be a single character, got '{}'",
                    PROP_DELIMITER, delimiter
                )))
            }
        };

        let path = self.data_file(&query)?;
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .from_path(&path)
            .map_err(|e| {
                ConnectorError::Backend(format!("Cannot open '{}': {}", path.display(), e))
            })?;
        let headers: Vec<String> = reader
            .headers()?
            .iter()
            .map(|h| h.trim().to_ascii_lowercase())
            .collect();

        let types = Self::column_types(&query);
        let projection: Vec<(String, TypeCode)> = query
            .select
            .iter()
            .map(|expr| match expr {
                Expression::Column(column) => {
                    Ok((column.name.to_ascii_lowercase(), column.value_type))
                }
                _ => Err(ConnectorError::Translation(
                    "The file backend projects plain columns only".to_string(),
                )),
            })
            .collect::<Result<_, _>>()?;
        for (name, _) in &projection {
            if !headers.contains(name) {
                return Err(ConnectorError::NotResolvable(format!(
                    "Column '{}' is not present in '{}'",
                    name,
                    path.display()
                )));
            }
        }

        let row_limit = query.limit.map(|l| l.row_limit);
        for record in reader.records() {
            if let Some(limit) = row_limit {
                if self.rows.len() as u64 >= limit {
                    break;
                }
            }
            let record = record?;

            // typed view of the record for predicate evaluation
            let mut row: filter::Row = std::collections::HashMap::new();
            for (index, header) in headers.iter().enumerate() {
                let raw = record.get(index).unwrap_or("");
                let value = match types.get(header) {
                    Some(type_code) => Self::parse_cell(raw, *type_code)?,
                    None => {
                        if raw.is_empty() {
                            Value::Null
                        } else {
                            Value::String(raw.to_string())
                        }
                    }
                };
                row.insert(header.clone(), value);
            }

            // the pushed-down filter runs before the row is buffered
            if let Some(criteria) = &query.criteria {
                if !filter::matches(criteria, &row)? {
                    continue;
                }
            }

            let projected: Vec<Value> = projection
                .iter()
                .map(|(name, _)| row.get(name).cloned().unwrap_or(Value::Null))
                .collect();
            self.rows.push_back(projected);
        }

        tracing::debug!(
            request_id = %self.context.request_id,
            file = %path.display(),
            rows = self.rows.len(),
            "Delimited-file execution started"
        );
        self.state = ExecutionState::Executing;
        Ok(())
    }

    async fn next(&mut self) -> Result<NextResult, ConnectorError> {
        if self.is_cancelled() {
            if self.state != ExecutionState::Closed {
                self.state = ExecutionState::Cancelled;
            }
            return Ok(NextResult::Exhausted);
        }
        match self.state {
            ExecutionState::Created => {
                return Err(ConnectorError::InvalidState(
                    "next() called before execute()".to_string(),
                ))
            }
            ExecutionState::Exhausted | ExecutionState::Closed | ExecutionState::Cancelled => {
                return Ok(NextResult::Exhausted)
            }
            _ => {}
        }

        self.state = ExecutionState::Streaming;
        match self.rows.pop_front() {
            Some(row) => Ok(NextResult::Row(row)),
            None => {
                self.state = ExecutionState::Exhausted;
                Ok(NextResult::Exhausted)
            }
        }
    }

    fn update_counts(&self) -> Result<Vec<i64>, ConnectorError> {
        Err(ConnectorError::InvalidState(
            "The file backend is read-only".to_string(),
        ))
    }

    fn output_parameter_values(&self) -> Result<Vec<Value>, ConnectorError> {
        Err(ConnectorError::InvalidState(
            "The file backend does not execute procedures".to_string(),
        ))
    }

    fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    fn close(&mut self) {
        if self.state != ExecutionState::Closed {
            self.state = ExecutionState::Closed;
            self.rows.clear();
            tracing::debug!(
                request_id = %self.context.request_id,
                "Delimited-file execution closed"
            );
        }
    }

    fn state(&self) -> ExecutionState {
        if self.is_cancelled() && self.state != ExecutionState::Closed {
            ExecutionState::Cancelled
        } else {
            self.state
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::command::{Group, Limit};
    use crate::models::criteria::{CompareOperator, Criteria};
    use crate::models::expression::ColumnReference;
    use crate::models::metadata::InMemoryMetadata;
    use std::io::Write;

    fn write_data_file(dir: &std::path::Path) {
        let mut file = std::fs::File::create(dir.join("smalla.csv")).unwrap();
        writeln!(file, "intkey,stringkey,floatnum").unwrap();
        writeln!(file, "1,a,1.5").unwrap();
        writeln!(file, "2,b,2.5").unwrap();
        writeln!(file, "3,,3.5").unwrap();
        writeln!(file, "4,d,4.5").unwrap();
    }

    fn select(criteria: Option<Criteria>, limit: Option<u64>) -> Command {
        let mut query = Query::new(
            vec![
                Expression::Column(ColumnReference::new("intkey", TypeCode::Integer)),
                Expression::Column(ColumnReference::new("stringkey", TypeCode::String)),
            ],
            vec![Group::new("smalla")],
        );
        if let Some(criteria) = criteria {
            query = query.with_criteria(criteria);
        }
        if let Some(rows) = limit {
            query = query.with_limit(Limit::rows(rows));
        }
        Command::Select(query)
    }

    async fn run(command: Command, dir: &std::path::Path) -> Vec<Vec<Value>> {
        let registry = CapabilitiesRegistry::with_defaults();
        let props = ConnectorProperties::from_pairs([(
            PROP_ROOT_DIRECTORY,
            dir.to_string_lossy().to_string(),
        )]);
        let connector = DelimitedFileConnector::new(props, &registry).unwrap();
        let mut execution = connector
            .create_execution(
                command,
                ExecutionContext::new(),
                Arc::new(InMemoryMetadata::new()),
            )
            .await
            .unwrap();
        execution.execute().await.unwrap();

        let mut rows = Vec::new();
        loop {
            match execution.next().await.unwrap() {
                NextResult::Row(row) => rows.push(row),
                NextResult::Exhausted => break,
                NextResult::NotYetAvailable { .. } => unreachable!("file reads are synchronous"),
            }
        }
        rows
    }

    #[tokio::test]
    async fn test_scan_projects_in_file_order() {
        let dir = tempfile::tempdir().unwrap();
        write_data_file(dir.path());

        let rows = run(select(None, None), dir.path()).await;
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[0], vec![Value::Integer(1), Value::String("a".into())]);
        // empty cells read back as NULL
        assert_eq!(rows[2], vec![Value::Integer(3), Value::Null]);
    }

    #[tokio::test]
    async fn test_pushed_down_filter_runs_before_iteration() {
        let dir = tempfile::tempdir().unwrap();
        write_data_file(dir.path());

        let criteria = Criteria::compare(
            Expression::Column(ColumnReference::new("floatnum", TypeCode::Double)),
            CompareOperator::Gt,
            Expression::literal(Value::Double(2.0), TypeCode::Double),
        );
        let rows = run(select(Some(criteria), None), dir.path()).await;
        // no delivered row may violate the pushed-down predicate
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0][0], Value::Integer(2));
    }

    #[tokio::test]
    async fn test_limit_stops_the_read_early() {
        let dir = tempfile::tempdir().unwrap();
        write_data_file(dir.path());

        let rows = run(select(None, Some(2)), dir.path()).await;
        assert_eq!(rows.len(), 2);
    }

    #[tokio::test]
    async fn test_filter_combines_with_limit() {
        let dir = tempfile::tempdir().unwrap();
        write_data_file(dir.path());

        let criteria = Criteria::compare(
            Expression::Column(ColumnReference::new("intkey", TypeCode::Integer)),
            CompareOperator::Ge,
            Expression::literal(Value::Integer(2), TypeCode::Integer),
        );
        let rows = run(select(Some(criteria), Some(2)), dir.path()).await;
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0][0], Value::Integer(2));
        assert_eq!(rows[1][0], Value::Integer(3));
    }

    #[tokio::test]
    async fn test_missing_root_directory_is_configuration_error() {
        let registry = CapabilitiesRegistry::with_defaults();
        let err = DelimitedFileConnector::new(ConnectorProperties::new(), &registry).unwrap_err();
        assert!(matches!(err, ConnectorError::Configuration(_)));
    }

    #[tokio::test]
    async fn test_unknown_column_is_not_resolvable() {
        let dir = tempfile::tempdir().unwrap();
        write_data_file(dir.path());

        let command = Command::Select(Query::new(
            vec![Expression::Column(ColumnReference::new(
                "no_such_column",
                TypeCode::String,
            ))],
            vec![Group::new("smalla")],
        ));

        let registry = CapabilitiesRegistry::with_defaults();
        let props = ConnectorProperties::from_pairs([(
            PROP_ROOT_DIRECTORY,
            dir.path().to_string_lossy().to_string(),
        )]);
        let connector = DelimitedFileConnector::new(props, &registry).unwrap();
        let mut execution = connector
            .create_execution(
                command,
                ExecutionContext::new(),
                Arc::new(InMemoryMetadata::new()),
            )
            .await
            .unwrap();
        let err = execution.execute().await.unwrap_err();
        assert!(matches!(err, ConnectorError::NotResolvable(_)));
    }

    #[tokio::test]
    async fn test_metadata_resolves_file_name() {
        let dir = tempfile::tempdir().unwrap();
        write_data_file(dir.path());

        let group = Group::new("virtual.smalla")
            .with_metadata_id(crate::models::metadata::MetadataId::new("g1"));
        let command = Command::Select(Query::new(
            vec![Expression::Column(ColumnReference::new(
                "intkey",
                TypeCode::Integer,
            ))],
            vec![group],
        ));
        let metadata = InMemoryMetadata::new().with_record("g1", "smalla.csv", None);

        let registry = CapabilitiesRegistry::with_defaults();
        let props = ConnectorProperties::from_pairs([(
            PROP_ROOT_DIRECTORY,
            dir.path().to_string_lossy().to_string(),
        )]);
        let connector = DelimitedFileConnector::new(props, &registry).unwrap();
        let mut execution = connector
            .create_execution(command, ExecutionContext::new(), Arc::new(metadata))
            .await
            .unwrap();
        execution.execute().await.unwrap();
        assert!(matches!(
            execution.next().await.unwrap(),
            NextResult::Row(_)
        ));
    }

    #[tokio::test]
    async fn test_is_alive_never_throws() {
        let registry = CapabilitiesRegistry::with_defaults();
        let props = ConnectorProperties::from_pairs([(PROP_ROOT_DIRECTORY, "/no/such/dir")]);
        let mut connector = DelimitedFileConnector::new(props, &registry).unwrap();
        // a missing directory reads as dead, not as an error
        assert!(!connector.is_alive());
        connector.close();
        assert!(!connector.is_alive());
    }
}
