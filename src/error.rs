// Connector error taxonomy
//
// One variant per failure class the translation and execution layers can
// surface. "Data not yet available" is intentionally NOT here: it is a
// control-flow signal carried by `NextResult`, not an error.

use thiserror::Error;

/// Errors raised by translators, connectors and executions
#[derive(Debug, Error)]
pub enum ConnectorError {
    /// Malformed or missing backend configuration. Raised synchronously at
    /// `execute()` time, never mid-stream.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A construct that cannot be expressed in the target dialect and has
    /// no documented fallback form.
    #[error("Translation error: {0}")]
    Translation(String),

    /// Backend communication or execution failure. This layer never
    /// retries; retry policy belongs to the orchestrating caller.
    #[error("Backend error: {0}")]
    Backend(String),

    /// A metadata or cross-reference lookup could not be resolved. Kept
    /// distinct from generic I/O failures.
    #[error("Objects not resolvable: {0}")]
    NotResolvable(String),

    /// Protocol misuse, e.g. reading update counts before `execute()` or
    /// binding a parameter after execution start.
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// The execution was cancelled. `next()` reports cancellation as row
    /// exhaustion; this variant exists for callers that must distinguish.
    #[error("Execution cancelled")]
    Cancelled,
}

impl From<std::io::Error> for ConnectorError {
    fn from(err: std::io::Error) -> Self {
        ConnectorError::Backend(err.to_string())
    }
}

impl From<csv::Error> for ConnectorError {
    fn from(err: csv::Error) -> Self {
        ConnectorError::Backend(err.to_string())
    }
}
