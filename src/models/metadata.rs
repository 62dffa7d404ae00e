// Runtime metadata lookup
//
// The planner resolves virtual names; this layer only needs to map a
// metadata id back to the backend-native source name and declared runtime
// type. The lookup itself is owned by an excluded collaborator, consumed
// here through the `RuntimeMetadata` trait.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::ConnectorError;
use crate::models::types::TypeCode;

/// Opaque identifier of a metadata object (group, element, procedure)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MetadataId(pub String);

impl MetadataId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl std::fmt::Display for MetadataId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Resolved metadata for one object
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetadataRecord {
    /// Backend-native name, e.g. a quoted physical table or column
    pub source_name: String,
    /// Declared runtime type; groups and procedures carry `None`
    pub runtime_type: Option<TypeCode>,
}

/// Lookup contract consumed by translators and executions
pub trait RuntimeMetadata: Send + Sync {
    /// Resolve a metadata id to its backend-native source name
    ///
    /// # Errors
    /// Returns `NotResolvable` when the id is unknown.
    fn source_name(&self, id: &MetadataId) -> Result<String, ConnectorError>;

    /// Resolve a metadata id to its declared runtime type
    ///
    /// # Errors
    /// Returns `NotResolvable` when the id is unknown or carries no type.
    fn runtime_type(&self, id: &MetadataId) -> Result<TypeCode, ConnectorError>;
}

/// In-memory metadata store used by tests and the file-backed connector
#[derive(Debug, Clone, Default)]
pub struct InMemoryMetadata {
    records: HashMap<MetadataId, MetadataRecord>,
}

impl InMemoryMetadata {
    pub fn new() -> Self {
        Self {
            records: HashMap::new(),
        }
    }

    /// Register an object, builder style
    pub fn with_record(
        mut self,
        id: impl Into<String>,
        source_name: impl Into<String>,
        runtime_type: Option<TypeCode>,
    ) -> Self {
        self.records.insert(
            MetadataId::new(id),
            MetadataRecord {
                source_name: source_name.into(),
                runtime_type,
            },
        );
        self
    }

    pub fn insert(&mut self, id: MetadataId, record: MetadataRecord) {
        self.records.insert(id, record);
    }
}

impl RuntimeMetadata for InMemoryMetadata {
    fn source_name(&self, id: &MetadataId) -> Result<String, ConnectorError> {
        self.records
            .get(id)
            .map(|r| r.source_name.clone())
            .ok_or_else(|| {
                ConnectorError::NotResolvable(format!("No metadata record for '{}'", id))
            })
    }

    fn runtime_type(&self, id: &MetadataId) -> Result<TypeCode, ConnectorError> {
        self.records
            .get(id)
            .and_then(|r| r.runtime_type)
            .ok_or_else(|| {
                ConnectorError::NotResolvable(format!("No runtime type for '{}'", id))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_resolves() {
        let metadata = InMemoryMetadata::new()
            .with_record("bqt1.smalla.intkey", "SmallA.IntKey", Some(TypeCode::Integer));

        let id = MetadataId::new("bqt1.smalla.intkey");
        assert_eq!(metadata.source_name(&id).unwrap(), "SmallA.IntKey");
        assert_eq!(metadata.runtime_type(&id).unwrap(), TypeCode::Integer);
    }

    #[test]
    fn test_unknown_id_is_not_resolvable() {
        let metadata = InMemoryMetadata::new();
        let err = metadata.source_name(&MetadataId::new("missing")).unwrap_err();
        assert!(matches!(err, ConnectorError::NotResolvable(_)));
    }
}
