//! Configuration for the converter registry.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// What to do when two converters claim the same (input, output) pair.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    /// Keep both. Direct lookups pick the highest priority, then the first registered.
    #[default]
    FirstWins,
    /// Refuse the second registration.
    Reject,
}

/// Configuration for the converter registry.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Enable/disable flags keyed by converter category. Missing means enabled.
    #[serde(default)]
    pub enabled_categories: HashMap<String, bool>,

    /// Policy for competing converters.
    #[serde(default)]
    pub duplicate_policy: DuplicatePolicy,
}

impl RegistryConfig {
    /// Whether converters of a category may be indexed.
    pub fn is_category_enabled(&self, category: &str) -> bool {
        self.enabled_categories
            .get(category)
            .copied()
            .unwrap_or(true)
    }

    /// Sets the enabled flag for a category.
    pub fn with_category(mut self, category: impl Into<String>, enabled: bool) -> Self {
        self.enabled_categories.insert(category.into(), enabled);
        self
    }

    /// Sets the duplicate policy.
    pub fn with_duplicate_policy(mut self, policy: DuplicatePolicy) -> Self {
        self.duplicate_policy = policy;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categories_default_to_enabled() {
        let config = RegistryConfig::default().with_category("image", false);
        assert!(config.is_category_enabled("document"));
        assert!(!config.is_category_enabled("image"));
    }

    #[test]
    fn test_config_serialization() {
        let config = RegistryConfig::default()
            .with_category("archive", false)
            .with_duplicate_policy(DuplicatePolicy::Reject);
        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains("\"reject\""));

        let parsed: RegistryConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.duplicate_policy, DuplicatePolicy::Reject);
        assert!(!parsed.is_category_enabled("archive"));
    }
}
