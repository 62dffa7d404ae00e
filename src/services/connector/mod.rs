// Connection facades for the supported backends
pub mod delimited;
pub mod filter;
pub mod loopback;

pub use delimited::DelimitedFileConnector;
pub use loopback::LoopbackConnector;

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::ConnectorProperties;
use crate::error::ConnectorError;
use crate::models::command::Command;
use crate::models::metadata::RuntimeMetadata;
use crate::services::capabilities::CapabilitiesRegistry;
use crate::services::execution::{Execution, ExecutionContext};

/// Minimal connection contract consumed by executions
///
/// A connector handle is used by one command at a time; pooling and reuse
/// across commands belong to the resource-management layer above.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Create the execution object for one command
    async fn create_execution(
        &self,
        command: Command,
        context: ExecutionContext,
        metadata: Arc<dyn RuntimeMetadata>,
    ) -> Result<Box<dyn Execution>, ConnectorError>;

    /// Liveness check for pooling layers. Never raises: internal
    /// uncertainty reads as dead so the handle can be safely evicted.
    fn is_alive(&self) -> bool;

    /// Release the underlying resource; a no-op when already closed
    fn close(&mut self);
}

/// Connector kind enum
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectorKind {
    Loopback,
    DelimitedFile,
}

impl ConnectorKind {
    pub fn from_str(s: &str) -> Result<Self, ConnectorError> {
        match s.to_lowercase().as_str() {
            "loopback" => Ok(ConnectorKind::Loopback),
            "delimited" | "file" => Ok(ConnectorKind::DelimitedFile),
            _ => Err(ConnectorError::Configuration(format!(
                "Unsupported connector kind: {}",
                s
            ))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectorKind::Loopback => "loopback",
            ConnectorKind::DelimitedFile => "delimited",
        }
    }
}

/// Factory function to create the appropriate connector
pub fn create_connector(
    kind: ConnectorKind,
    properties: ConnectorProperties,
    registry: &CapabilitiesRegistry,
) -> Result<Box<dyn Connector>, ConnectorError> {
    match kind {
        ConnectorKind::Loopback => Ok(Box::new(LoopbackConnector::new(properties, registry))),
        ConnectorKind::DelimitedFile => Ok(Box::new(DelimitedFileConnector::new(
            properties, registry,
        )?)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_parsing() {
        assert_eq!(
            ConnectorKind::from_str("Loopback").unwrap(),
            ConnectorKind::Loopback
        );
        assert_eq!(
            ConnectorKind::from_str("file").unwrap(),
            ConnectorKind::DelimitedFile
        );
        assert!(ConnectorKind::from_str("jdbc").is_err());
    }

    #[test]
    fn test_factory_checks_configuration() {
        let registry = CapabilitiesRegistry::with_defaults();
        let connector = create_connector(
            ConnectorKind::Loopback,
            ConnectorProperties::new(),
            &registry,
        );
        assert!(connector.is_ok());

        // the file connector requires a root directory
        let err = create_connector(
            ConnectorKind::DelimitedFile,
            ConnectorProperties::new(),
            &registry,
        );
        assert!(err.is_err());
    }
}
