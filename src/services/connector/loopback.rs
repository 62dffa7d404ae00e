// Loopback connector
//
// Test/reference backend that synthesizes rows instead of talking to a real
// source. Exercises the full execution contract: configurable row counts,
// simulated first-row latency in both blocking and poll modes, forced
// failures, and capability overrides.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use rand::Rng;

use crate::config::ConnectorProperties;
use crate::error::ConnectorError;
use crate::models::command::Command;
use crate::models::metadata::RuntimeMetadata;
use crate::models::types::{TypeCode, Value};
use crate::services::capabilities::{Capabilities, CapabilitiesRegistry, LoopbackCapabilities};
use crate::services::connector::Connector;
use crate::services::execution::{Execution, ExecutionContext, ExecutionState, NextResult};

/// Max random delay before the first row, in milliseconds
pub const PROP_WAIT_TIME: &str = "WaitTime";
/// Rows to synthesize; an explicit smaller query limit wins
pub const PROP_ROW_COUNT: &str = "RowCount";
/// Fail `execute()` immediately when true
pub const PROP_ERROR: &str = "Error";
/// Poll interval in milliseconds; absent means synchronous waits
pub const PROP_POLL_INTERVAL: &str = "PollInterval";
/// Name of a registered capabilities implementation to use instead of the
/// default
pub const PROP_CAPABILITIES_CLASS: &str = "CapabilitiesClass";

/// Connection facade over the synthetic backend
pub struct LoopbackConnector {
    properties: ConnectorProperties,
    capabilities: Arc<dyn Capabilities>,
    closed: bool,
}

impl LoopbackConnector {
    pub fn new(properties: ConnectorProperties, registry: &CapabilitiesRegistry) -> Self {
        let capabilities = registry.resolve_or_default(
            properties.get(PROP_CAPABILITIES_CLASS),
            || Arc::new(LoopbackCapabilities::new()),
        );
        Self {
            properties,
            capabilities,
            closed: false,
        }
    }

    /// Capability descriptor handed to the planner
    pub fn capabilities(&self) -> Arc<dyn Capabilities> {
        self.capabilities.clone()
    }
}

#[async_trait]
impl Connector for LoopbackConnector {
    async fn create_execution(
        &self,
        command: Command,
        context: ExecutionContext,
        _metadata: Arc<dyn RuntimeMetadata>,
    ) -> Result<Box<dyn Execution>, ConnectorError> {
        if self.closed {
            return Err(ConnectorError::Backend(
                "Connection is closed".to_string(),
            ));
        }
        Ok(Box::new(LoopbackExecution::new(
            command,
            self.properties.clone(),
            context,
        )))
    }

    fn is_alive(&self) -> bool {
        !self.closed
    }

    fn close(&mut self) {
        if !self.closed {
            self.closed = true;
            tracing::debug!("Loopback connection closed");
        }
    }
}

/// Synthetic per-command execution
pub struct LoopbackExecution {
    command: Command,
    properties: ConnectorProperties,
    context: ExecutionContext,
    state: ExecutionState,
    cancelled: Arc<AtomicBool>,
    /// Row template repeated for every delivered row
    row: Vec<Value>,
    rows_needed: u64,
    rows_returned: u64,
    wait_time: u64,
    poll_interval: Option<u64>,
    /// Set before any wait outcome is reported so a second `next()` never
    /// recomputes the random delay
    waited: bool,
}

impl LoopbackExecution {
    pub fn new(
        command: Command,
        properties: ConnectorProperties,
        context: ExecutionContext,
    ) -> Self {
        Self {
            command,
            properties,
            context,
            state: ExecutionState::Created,
            cancelled: Arc::new(AtomicBool::new(false)),
            row: Vec::new(),
            rows_needed: 0,
            rows_returned: 0,
            wait_time: 0,
            poll_interval: None,
            waited: false,
        }
    }

    /// Template value for one output column
    fn sample_value(type_code: TypeCode) -> Value {
        match type_code {
            TypeCode::String => Value::String("ABCDEFGHIJ".to_string()),
            TypeCode::Char => Value::Char('c'),
            TypeCode::Boolean => Value::Boolean(false),
            TypeCode::Byte => Value::Byte(0),
            TypeCode::Short => Value::Short(0),
            TypeCode::Integer => Value::Integer(0),
            TypeCode::Long => Value::Long(0),
            TypeCode::BigInteger => Value::BigInteger(0),
            TypeCode::Float => Value::Float(0.0),
            TypeCode::Double => Value::Double(0.0),
            TypeCode::BigDecimal => Value::BigDecimal(0.0),
            TypeCode::Date => Value::Date(Default::default()),
            TypeCode::Time => Value::Time(Default::default()),
            TypeCode::Timestamp => Value::Timestamp(Default::default()),
        }
    }

    fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Execution for LoopbackExecution {
    async fn execute(&mut self) -> Result<(), ConnectorError> {
        if self.state != ExecutionState::Created {
            return Err(ConnectorError::InvalidState(
                "execute() may only be called once".to_string(),
            ));
        }

        // all property parsing happens here: malformed values are fatal for
        // the command before any row exists
        self.wait_time = self.properties.get_int(PROP_WAIT_TIME, 0)?.max(0) as u64;
        let row_count = self.properties.get_int(PROP_ROW_COUNT, 1)?.max(0) as u64;
        let simulate_error = self.properties.get_bool(PROP_ERROR, false)?;
        self.poll_interval = self
            .properties
            .get_opt_int(PROP_POLL_INTERVAL)?
            .map(|v| v.max(0) as u64);

        if simulate_error {
            return Err(ConnectorError::Backend(
                "Failure was requested by the Error property".to_string(),
            ));
        }

        self.rows_needed = match self.command.limit() {
            Some(limit) => row_count.min(limit.row_limit),
            None => row_count,
        };
        self.row = self
            .command
            .output_types()
            .into_iter()
            .map(Self::sample_value)
            .collect();
        self.command.freeze_parameters();

        tracing::debug!(
            request_id = %self.context.request_id,
            rows = self.rows_needed,
            "Loopback execution started"
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

        if self.wait_time > 0 && !self.waited {
            let delay = rand::thread_rng().gen_range(0..self.wait_time);
            match self.poll_interval {
                Some(interval) if delay > interval => {
                    // flag first: the retry call must not roll a new delay
                    self.waited = true;
                    self.state = ExecutionState::WaitingAsync;
                    return Ok(NextResult::NotYetAvailable {
                        retry_after_ms: delay,
                    });
                }
                _ => {
                    self.waited = true;
                    tokio::time::sleep(std::time::Duration::from_millis(delay)).await;
                }
            }
        }

        self.state = ExecutionState::Streaming;
        if self.rows_returned < self.rows_needed {
            self.rows_returned += 1;
            Ok(NextResult::Row(self.row.clone()))
        } else {
            self.state = ExecutionState::Exhausted;
            Ok(NextResult::Exhausted)
        }
    }

    fn update_counts(&self) -> Result<Vec<i64>, ConnectorError> {
        if !self.command.is_update_command() {
            return Err(ConnectorError::InvalidState(
                "update_counts() is only valid for data-modification commands".to_string(),
            ));
        }
        if self.state == ExecutionState::Created {
            return Err(ConnectorError::InvalidState(
                "update_counts() called before execute()".to_string(),
            ));
        }
        // the synthetic backend reports a fixed placeholder count
        Ok(vec![0])
    }

    fn output_parameter_values(&self) -> Result<Vec<Value>, ConnectorError> {
        let procedure = match &self.command {
            Command::Call(procedure) => procedure,
            _ => {
                return Err(ConnectorError::InvalidState(
                    "output_parameter_values() is only valid for procedure executions".to_string(),
                ))
            }
        };
        if self.state == ExecutionState::Created {
            return Err(ConnectorError::InvalidState(
                "output_parameter_values() called before execute()".to_string(),
            ));
        }
        Ok(procedure
            .parameters
            .iter()
            .filter(|p| p.direction().is_output())
            .map(|p| Self::sample_value(p.value_type()))
            .collect())
    }

    fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    fn close(&mut self) {
        if self.state != ExecutionState::Closed {
            self.state = ExecutionState::Closed;
            tracing::debug!(
                request_id = %self.context.request_id,
                "Loopback execution closed"
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
