// Backend connector configuration
//
// Connectors are configured through an ordered list of string properties.
// Typed accessors parse on demand; malformed values are fatal configuration
// errors surfaced when the owning execution starts, never during row
// iteration.

use crate::error::ConnectorError;

/// Ordered mapping of string property names to string values
///
/// Property names are matched exactly (case-sensitive). Setting an existing
/// name replaces the value in place so the original ordering is preserved.
#[derive(Debug, Clone, Default)]
pub struct ConnectorProperties {
    entries: Vec<(String, String)>,
}

impl ConnectorProperties {
    /// Create an empty property set
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Build a property set from name/value pairs, preserving order
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut props = Self::new();
        for (name, value) in pairs {
            props.set(name, value);
        }
        props
    }

    /// Set a property, replacing any existing value for the same name
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        if let Some(entry) = self.entries.iter_mut().find(|(n, _)| *n == name) {
            entry.1 = value;
        } else {
            self.entries.push((name, value));
        }
    }

    /// Get the raw string value of a property
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Get a string property, falling back to a default when absent
    pub fn get_string(&self, name: &str, default: &str) -> String {
        self.get(name).unwrap_or(default).to_string()
    }

    /// Parse an integer property
    ///
    /// # Errors
    /// Returns `Configuration` if the value is present but not a valid
    /// integer.
    pub fn get_int(&self, name: &str, default: i64) -> Result<i64, ConnectorError> {
        match self.get(name) {
            Some(raw) => raw.trim().parse::<i64>().map_err(|_| {
                ConnectorError::Configuration(format!(
                    "Property '{}' must be an integer, got '{}'",
                    name, raw
                ))
            }),
            None => Ok(default),
        }
    }

    /// Parse an optional integer property, `None` when absent
    pub fn get_opt_int(&self, name: &str) -> Result<Option<i64>, ConnectorError> {
        match self.get(name) {
            Some(raw) => raw.trim().parse::<i64>().map(Some).map_err(|_| {
                ConnectorError::Configuration(format!(
                    "Property '{}' must be an integer, got '{}'",
                    name, raw
                ))
            }),
            None => Ok(None),
        }
    }

    /// Parse a boolean property ("true"/"false", case-insensitive)
    pub fn get_bool(&self, name: &str, default: bool) -> Result<bool, ConnectorError> {
        match self.get(name) {
            Some(raw) => match raw.trim().to_ascii_lowercase().as_str() {
                "true" => Ok(true),
                "false" => Ok(false),
                _ => Err(ConnectorError::Configuration(format!(
                    "Property '{}' must be 'true' or 'false', got '{}'",
                    name, raw
                ))),
            },
            None => Ok(default),
        }
    }

    /// Iterate properties in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    /// Number of properties
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no properties are set
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_preserves_order() {
        let mut props = ConnectorProperties::new();
        props.set("WaitTime", "100");
        props.set("RowCount", "5");
        props.set("WaitTime", "200");

        let names: Vec<&str> = props.iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["WaitTime", "RowCount"]);
        assert_eq!(props.get("WaitTime"), Some("200"));
    }

    #[test]
    fn test_get_int_default_and_parse() {
        let props = ConnectorProperties::from_pairs([("RowCount", "7")]);
        assert_eq!(props.get_int("RowCount", 1).unwrap(), 7);
        assert_eq!(props.get_int("WaitTime", 0).unwrap(), 0);
    }

    #[test]
    fn test_get_int_malformed_is_configuration_error() {
        let props = ConnectorProperties::from_pairs([("RowCount", "abc")]);
        let err = props.get_int("RowCount", 1).unwrap_err();
        assert!(matches!(err, ConnectorError::Configuration(_)));
    }

    #[test]
    fn test_get_bool() {
        let props = ConnectorProperties::from_pairs([("Error", "TRUE"), ("Bad", "yes")]);
        assert!(props.get_bool("Error", false).unwrap());
        assert!(!props.get_bool("Missing", false).unwrap());
        assert!(props.get_bool("Bad", false).is_err());
    }

    #[test]
    fn test_opt_int_absent() {
        let props = ConnectorProperties::new();
        assert_eq!(props.get_opt_int("PollInterval").unwrap(), None);
    }
}
