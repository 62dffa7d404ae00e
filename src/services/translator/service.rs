// Translation Service
//
// Provides the high-level service for translating commands between source
// dialects. Coordinates dialect translators and provides caching for
// repeated translations of the same command.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};

use crate::models::command::Command;
use crate::services::translator::dialect::{
    DialectTranslator, GenericTranslator, SqlServerTranslator, SybaseTranslator, TranslatedCommand,
};

/// Source systems known to the translation service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceSystem {
    SqlServer,
    Sybase,
    Generic,
}

impl SourceSystem {
    /// Parse a source system from string
    pub fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "sqlserver" | "mssql" => Ok(SourceSystem::SqlServer),
            "sybase" => Ok(SourceSystem::Sybase),
            "generic" | "loopback" => Ok(SourceSystem::Generic),
            _ => Err(anyhow!("Unsupported source system: {}", s)),
        }
    }

    /// Get the source system name
    pub fn as_str(&self) -> &str {
        match self {
            SourceSystem::SqlServer => "SQLServer",
            SourceSystem::Sybase => "Sybase",
            SourceSystem::Generic => "Generic",
        }
    }
}

/// Service for managing command translations
///
/// Maintains a registry of dialect translators and an optional cache of
/// translation results keyed by the serialized command.
pub struct TranslationService {
    /// Registry of dialect translators by source system
    translators: HashMap<SourceSystem, Arc<dyn DialectTranslator>>,
    /// Optional translation cache (serialized command -> translated command)
    cache: Option<Arc<tokio::sync::RwLock<HashMap<(String, SourceSystem), TranslatedCommand>>>>,
}

impl TranslationService {
    /// Create a new translation service with default translators
    pub fn new() -> Self {
        let mut translators: HashMap<SourceSystem, Arc<dyn DialectTranslator>> = HashMap::new();
        translators.insert(SourceSystem::SqlServer, Arc::new(SqlServerTranslator::new()));
        translators.insert(SourceSystem::Sybase, Arc::new(SybaseTranslator::new()));
        translators.insert(SourceSystem::Generic, Arc::new(GenericTranslator::new()));

        Self {
            translators,
            cache: None,
        }
    }

    /// Create a new translation service with caching enabled
    pub fn with_cache() -> Self {
        let mut service = Self::new();
        service.cache = Some(Arc::new(tokio::sync::RwLock::new(HashMap::new())));
        service
    }

    /// Register a custom dialect translator, overriding any default
    pub fn register_translator(
        &mut self,
        system: SourceSystem,
        translator: Arc<dyn DialectTranslator>,
    ) {
        self.translators.insert(system, translator);
    }

    /// Translate a command for a target source system
    ///
    /// # Errors
    /// Returns an error if no translator is registered for the system or
    /// the command contains constructs the dialect cannot express.
    pub async fn translate_command(
        &self,
        command: &Command,
        system: SourceSystem,
    ) -> Result<TranslatedCommand> {
        let cache_key = if self.cache.is_some() {
            Some(
                serde_json::to_string(command)
                    .context("Failed to serialize command for caching")?,
            )
        } else {
            None
        };

        if let (Some(cache), Some(key)) = (&self.cache, &cache_key) {
            let cache_read = cache.read().await;
            if let Some(cached) = cache_read.get(&(key.clone(), system)) {
                tracing::debug!("Cache hit for command translation to {}", system.as_str());
                return Ok(cached.clone());
            }
        }

        let translator = self
            .translators
            .get(&system)
            .ok_or_else(|| anyhow!("No translator registered for {:?}", system))?;

        let translated = translator
            .translate(command)
            .await
            .with_context(|| format!("Failed to translate command to {} dialect", system.as_str()))?;

        if let (Some(cache), Some(key)) = (&self.cache, cache_key) {
            let mut cache_write = cache.write().await;
            cache_write.insert((key, system), translated.clone());
            tracing::debug!("Cached translation result for {}", system.as_str());
        }

        Ok(translated)
    }

    /// Get the translator for a specific source system
    pub fn get_translator(&self, system: SourceSystem) -> Option<Arc<dyn DialectTranslator>> {
        self.translators.get(&system).cloned()
    }

    /// List all registered source systems
    pub fn supported_systems(&self) -> Vec<SourceSystem> {
        self.translators.keys().copied().collect()
    }

    /// Clear the translation cache
    pub async fn clear_cache(&self) {
        if let Some(cache) = &self.cache {
            let mut cache_write = cache.write().await;
            cache_write.clear();
            tracing::info!("Translation cache cleared");
        }
    }

    /// Number of cached translations, if caching is enabled
    pub async fn cache_size(&self) -> Option<usize> {
        if let Some(cache) = &self.cache {
            let cache_read = cache.read().await;
            Some(cache_read.len())
        } else {
            None
        }
    }
}

impl Default for TranslationService {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::command::{Group, Query};
    use crate::models::expression::{ColumnReference, Expression};
    use crate::models::types::TypeCode;

    fn simple_command() -> Command {
        Command::Select(Query::new(
            vec![Expression::Column(ColumnReference::new(
                "intkey",
                TypeCode::Integer,
            ))],
            vec![Group::new("bqt1.smalla")],
        ))
    }

    #[test]
    fn test_source_system_parsing() {
        assert_eq!(
            SourceSystem::from_str("sqlserver").unwrap(),
            SourceSystem::SqlServer
        );
        assert_eq!(SourceSystem::from_str("Sybase").unwrap(), SourceSystem::Sybase);
        assert_eq!(
            SourceSystem::from_str("loopback").unwrap(),
            SourceSystem::Generic
        );
        assert!(SourceSystem::from_str("oracle9").is_err());
    }

    #[tokio::test]
    async fn test_service_registers_defaults() {
        let service = TranslationService::new();
        let supported = service.supported_systems();
        assert!(supported.contains(&SourceSystem::SqlServer));
        assert!(supported.contains(&SourceSystem::Sybase));
        assert!(supported.contains(&SourceSystem::Generic));
        assert_eq!(supported.len(), 3);
    }

    #[tokio::test]
    async fn test_translate_simple_command() {
        let service = TranslationService::new();
        let translated = service
            .translate_command(&simple_command(), SourceSystem::Generic)
            .await
            .unwrap();
        assert_eq!(translated.sql, "SELECT intkey FROM bqt1.smalla");
        assert!(translated.bind_values.is_empty());
    }

    #[tokio::test]
    async fn test_caching_returns_identical_sql() {
        let service = TranslationService::with_cache();
        let command = simple_command();

        let first = service
            .translate_command(&command, SourceSystem::SqlServer)
            .await
            .unwrap();
        assert_eq!(service.cache_size().await, Some(1));

        let second = service
            .translate_command(&command, SourceSystem::SqlServer)
            .await
            .unwrap();
        assert_eq!(first, second);
        assert_eq!(service.cache_size().await, Some(1));

        service.clear_cache().await;
        assert_eq!(service.cache_size().await, Some(0));
    }

    #[tokio::test]
    async fn test_custom_translator_registration() {
        let mut service = TranslationService::new();
        service.register_translator(SourceSystem::SqlServer, Arc::new(GenericTranslator::new()));

        let translated = service
            .translate_command(&simple_command(), SourceSystem::SqlServer)
            .await
            .unwrap();
        assert_eq!(translated.sql, "SELECT intkey FROM bqt1.smalla");
    }
}
