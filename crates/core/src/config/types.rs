use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

use crate::converter::CommandConverterConfig;
use crate::engine::EngineConfig;
use crate::registry::{ConverterSource, DuplicatePolicy, RegistryConfig};

/// Top-level configuration.
///
/// Every field has a default, so an empty file is a valid configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Maximum input size in megabytes.
    #[serde(default = "default_max_file_size_mb", alias = "maxFileSizeMB")]
    pub max_file_size_mb: f64,

    /// Keep workspaces after each conversion.
    #[serde(default, alias = "preserveTempFiles")]
    pub preserve_temp_files: bool,

    /// Parent directory for workspaces. Defaults to the system temp dir.
    #[serde(default, alias = "tempDir")]
    pub temp_dir: Option<PathBuf>,

    /// Enable/disable flags keyed by converter category.
    #[serde(default, alias = "enabledCategories")]
    pub enabled_categories: HashMap<String, bool>,

    /// Upper bound on the number of steps in a plan.
    #[serde(default, alias = "maxChainLength")]
    pub max_chain_length: Option<usize>,

    /// Policy for converters competing for the same format pair.
    #[serde(default, alias = "duplicatePolicy")]
    pub duplicate_policy: DuplicatePolicy,

    /// External tools registered as converters.
    #[serde(default, alias = "commandConverters")]
    pub command_converters: Vec<CommandConverterConfig>,
}

fn default_max_file_size_mb() -> f64 {
    100.0
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_file_size_mb: default_max_file_size_mb(),
            preserve_temp_files: false,
            temp_dir: None,
            enabled_categories: HashMap::new(),
            max_chain_length: None,
            duplicate_policy: DuplicatePolicy::default(),
            command_converters: Vec::new(),
        }
    }
}

impl Config {
    /// Engine settings derived from this configuration.
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            max_file_size_mb: self.max_file_size_mb,
            preserve_temp_files: self.preserve_temp_files,
            temp_dir: self.temp_dir.clone(),
            max_chain_length: self.max_chain_length,
        }
    }

    /// Registry settings derived from this configuration.
    pub fn registry_config(&self) -> RegistryConfig {
        RegistryConfig {
            enabled_categories: self.enabled_categories.clone(),
            duplicate_policy: self.duplicate_policy,
        }
    }

    /// Discovery sources for the configured command converters.
    pub fn command_sources(&self) -> Vec<ConverterSource> {
        self.command_converters
            .iter()
            .cloned()
            .map(ConverterSource::from_command)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derived_views() {
        let config = Config {
            max_file_size_mb: 5.0,
            max_chain_length: Some(2),
            enabled_categories: HashMap::from([("image".to_string(), false)]),
            command_converters: vec![CommandConverterConfig::new(
                "pandoc",
                "pandoc",
                &["md"],
                &["html"],
            )],
            ..Config::default()
        };

        let engine = config.engine_config();
        assert_eq!(engine.max_file_size_mb, 5.0);
        assert_eq!(engine.max_chain_length, Some(2));

        let registry = config.registry_config();
        assert!(!registry.is_category_enabled("image"));
        assert_eq!(registry.duplicate_policy, DuplicatePolicy::FirstWins);

        let sources = config.command_sources();
        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].category(), "command");
    }
}
