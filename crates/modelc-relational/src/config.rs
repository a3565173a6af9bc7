//! Relational derivation configuration.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Default suffix appended to a base table id to name its extension table.
pub const DEFAULT_EXTENSION_TABLE_SUFFIX: &str = "Extension";

/// Configuration for the relational plugin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelationalConfig {
    /// Suffix for extension table ids.
    pub extension_table_suffix: String,
    /// Sort table columns after building.
    pub sort_columns: bool,
    /// Schema names by namespace name.
    pub schema_name_overrides: BTreeMap<String, String>,
}

impl Default for RelationalConfig {
    fn default() -> Self {
        Self {
            extension_table_suffix: DEFAULT_EXTENSION_TABLE_SUFFIX.to_string(),
            sort_columns: true,
            schema_name_overrides: BTreeMap::new(),
        }
    }
}

impl RelationalConfig {
    /// Create a configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the extension table suffix.
    pub fn with_extension_table_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.extension_table_suffix = suffix.into();
        self
    }

    /// Enable or disable column sorting.
    pub fn with_sort_columns(mut self, sort: bool) -> Self {
        self.sort_columns = sort;
        self
    }

    /// Map a namespace to an explicit schema name.
    pub fn with_schema_name(mut self, namespace: impl Into<String>, schema: impl Into<String>) -> Self {
        self.schema_name_overrides.insert(namespace.into(), schema.into());
        self
    }

    /// Schema name for a namespace: the override if present, otherwise the
    /// lower-cased namespace name.
    pub fn schema_for(&self, namespace: &str) -> String {
        self.schema_name_overrides
            .get(namespace)
            .cloned()
            .unwrap_or_else(|| namespace.to_lowercase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RelationalConfig::default();
        assert_eq!(config.extension_table_suffix, "Extension");
        assert!(config.sort_columns);
        assert_eq!(config.schema_for("EdFi"), "edfi");
    }

    #[test]
    fn test_schema_override() {
        let config = RelationalConfig::new()
            .with_schema_name("Sample", "sample_ext")
            .with_sort_columns(false)
            .with_extension_table_suffix("Ext");
        assert_eq!(config.schema_for("Sample"), "sample_ext");
        assert_eq!(config.schema_for("EdFi"), "edfi");
        assert!(!config.sort_columns);
        assert_eq!(config.extension_table_suffix, "Ext");
    }
}
