// Execution contract
//
// One execution drives exactly one command against one backend connection
// for its whole lifetime. Row delivery is pull-based; asynchronous backends
// signal "not yet available" through the result type instead of blocking
// the calling thread.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::ConnectorError;
use crate::models::types::Value;

/// Lifecycle states of an execution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionState {
    Created,
    Executing,
    Streaming,
    WaitingAsync,
    Exhausted,
    Closed,
    Cancelled,
}

impl ExecutionState {
    /// True once no further rows can be produced
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ExecutionState::Exhausted | ExecutionState::Closed | ExecutionState::Cancelled
        )
    }
}

/// Outcome of one `next()` call
///
/// "Not yet available" is an ordinary variant rather than an error so
/// callers cannot mistake a retry signal for a failure.
#[derive(Debug, Clone, PartialEq)]
pub enum NextResult {
    /// The next row; fixed width matching the command's output types
    Row(Vec<Value>),
    /// No data yet; re-poll after the suggested delay. Returned without
    /// blocking the calling thread.
    NotYetAvailable { retry_after_ms: u64 },
    /// No more rows will be produced
    Exhausted,
}

/// Identifiers carried alongside a command for one request
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    pub request_id: String,
    pub part_id: String,
    pub execution_count: u64,
    /// Security subject for transactional backends
    pub security_subject: Option<String>,
}

impl ExecutionContext {
    pub fn new() -> Self {
        Self {
            request_id: Uuid::new_v4().to_string(),
            part_id: "0".to_string(),
            execution_count: 0,
            security_subject: None,
        }
    }

    pub fn with_part_id(mut self, part_id: impl Into<String>) -> Self {
        self.part_id = part_id.into();
        self
    }

    pub fn with_execution_count(mut self, count: u64) -> Self {
        self.execution_count = count;
        self
    }

    pub fn with_security_subject(mut self, subject: impl Into<String>) -> Self {
        self.security_subject = Some(subject.into());
        self
    }
}

impl Default for ExecutionContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Per-command execution object
///
/// Never reused across commands. `cancel` takes `&self` so a second thread
/// can interrupt a `next()` in flight; both `cancel` and `close` are
/// idempotent and safe after terminal states.
#[async_trait]
pub trait Execution: Send {
    /// Validate configuration and start the command
    ///
    /// # Errors
    /// Configuration errors and simulated/real backend failures are raised
    /// here, before any row is produced. A failed execute aborts the
    /// command; no partial rows are ever delivered.
    async fn execute(&mut self) -> Result<(), ConnectorError>;

    /// Pull the next row
    ///
    /// After cancellation this reports `Exhausted` rather than an error.
    async fn next(&mut self) -> Result<NextResult, ConnectorError>;

    /// Per-statement affected-row counts
    ///
    /// # Errors
    /// `InvalidState` unless `execute()` ran on a data-modification
    /// command.
    fn update_counts(&self) -> Result<Vec<i64>, ConnectorError>;

    /// Values of OUT/INOUT/RETURN parameters
    ///
    /// # Errors
    /// `InvalidState` unless `execute()` ran on a procedure call.
    fn output_parameter_values(&self) -> Result<Vec<Value>, ConnectorError>;

    /// Request cancellation; safe to call from another thread and after
    /// terminal states
    fn cancel(&self);

    /// Release backend resources; safe to call repeatedly
    fn close(&mut self);

    /// Current lifecycle state
    fn state(&self) -> ExecutionState;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_states() {
        assert!(ExecutionState::Exhausted.is_terminal());
        assert!(ExecutionState::Closed.is_terminal());
        assert!(ExecutionState::Cancelled.is_terminal());
        assert!(!ExecutionState::Streaming.is_terminal());
        assert!(!ExecutionState::WaitingAsync.is_terminal());
    }

    #[test]
    fn test_context_builder() {
        let context = ExecutionContext::new()
            .with_part_id("3")
            .with_execution_count(7)
            .with_security_subject("app_user");
        assert_eq!(context.part_id, "3");
        assert_eq!(context.execution_count, 7);
        assert_eq!(context.security_subject.as_deref(), Some("app_user"));
        assert!(!context.request_id.is_empty());
    }
}
