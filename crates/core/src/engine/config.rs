//! Configuration for the conversion engine.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for the conversion engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Maximum input size in megabytes.
    #[serde(default = "default_max_file_size_mb")]
    pub max_file_size_mb: f64,

    /// Keep workspaces after the call instead of removing them.
    #[serde(default)]
    pub preserve_temp_files: bool,

    /// Parent directory for workspaces. `None` uses the system temp dir.
    #[serde(default)]
    pub temp_dir: Option<PathBuf>,

    /// Upper bound on the number of steps in a plan.
    #[serde(default)]
    pub max_chain_length: Option<usize>,
}

fn default_max_file_size_mb() -> f64 {
    100.0
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_file_size_mb: default_max_file_size_mb(),
            preserve_temp_files: false,
            temp_dir: None,
            max_chain_length: None,
        }
    }
}

impl EngineConfig {
    /// Maximum input size in bytes.
    pub fn max_file_size_bytes(&self) -> u64 {
        (self.max_file_size_mb * 1024.0 * 1024.0) as u64
    }

    /// Parent directory for workspaces.
    pub fn workspace_root(&self) -> PathBuf {
        self.temp_dir.clone().unwrap_or_else(std::env::temp_dir)
    }

    /// Sets the workspace parent directory.
    pub fn with_temp_dir(mut self, temp_dir: impl Into<PathBuf>) -> Self {
        self.temp_dir = Some(temp_dir.into());
        self
    }

    /// Sets the maximum input size.
    pub fn with_max_file_size_mb(mut self, max_file_size_mb: f64) -> Self {
        self.max_file_size_mb = max_file_size_mb;
        self
    }

    /// Sets whether workspaces are kept.
    pub fn with_preserve_temp_files(mut self, preserve: bool) -> Self {
        self.preserve_temp_files = preserve;
        self
    }

    /// Sets the plan length bound.
    pub fn with_max_chain_length(mut self, max_chain_length: Option<usize>) -> Self {
        self.max_chain_length = max_chain_length;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.max_file_size_mb, 100.0);
        assert_eq!(config.max_file_size_bytes(), 100 * 1024 * 1024);
        assert!(!config.preserve_temp_files);
        assert_eq!(config.workspace_root(), std::env::temp_dir());
    }

    #[test]
    fn test_fractional_size_limit() {
        let config = EngineConfig::default().with_max_file_size_mb(0.5);
        assert_eq!(config.max_file_size_bytes(), 512 * 1024);
    }

    #[test]
    fn test_deserialize_partial() {
        let config: EngineConfig =
            serde_json::from_str(r#"{"preserve_temp_files": true, "temp_dir": "/scratch"}"#)
                .unwrap();
        assert!(config.preserve_temp_files);
        assert_eq!(config.workspace_root(), PathBuf::from("/scratch"));
        assert_eq!(config.max_file_size_mb, 100.0);
    }
}
