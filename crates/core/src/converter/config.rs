//! Configuration for command-line tool converters.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::format::Format;

use super::types::{ConverterCapability, ParamSpec};

/// Configuration for a converter that delegates to an external program.
///
/// Arguments may contain the placeholders `{input}`, `{output}`,
/// `{workspace}` and `{param:NAME}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandConverterConfig {
    /// Converter name.
    pub name: String,

    /// Category used by the enable/disable configuration.
    #[serde(default = "default_category")]
    pub category: String,

    /// Program to run.
    pub program: PathBuf,

    /// Argument template.
    #[serde(default)]
    pub args: Vec<String>,

    /// Formats accepted as input.
    pub inputs: Vec<String>,

    /// Formats produced as output.
    pub outputs: Vec<String>,

    /// Extensions per format. A format without an entry uses its own name.
    #[serde(default)]
    pub extensions: BTreeMap<String, Vec<String>>,

    /// Parameters per output format.
    #[serde(default)]
    pub parameters: BTreeMap<String, BTreeMap<String, ParamSpec>>,

    /// Timeout for a single invocation in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Priority when several converters claim the same format pair.
    #[serde(default)]
    pub priority: i32,
}

fn default_category() -> String {
    "command".to_string()
}

fn default_timeout() -> u64 {
    600 // 10 minutes
}

impl CommandConverterConfig {
    /// Creates a config for a program with the given formats.
    pub fn new(
        name: impl Into<String>,
        program: impl Into<PathBuf>,
        inputs: &[&str],
        outputs: &[&str],
    ) -> Self {
        Self {
            name: name.into(),
            category: default_category(),
            program: program.into(),
            args: Vec::new(),
            inputs: inputs.iter().map(|s| s.to_string()).collect(),
            outputs: outputs.iter().map(|s| s.to_string()).collect(),
            extensions: BTreeMap::new(),
            parameters: BTreeMap::new(),
            timeout_secs: default_timeout(),
            priority: 0,
        }
    }

    /// Sets the argument template.
    pub fn with_args(mut self, args: &[&str]) -> Self {
        self.args = args.iter().map(|s| s.to_string()).collect();
        self
    }

    /// Sets the category.
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    /// Sets the timeout in seconds.
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// Builds the declared capability.
    pub fn capability(&self) -> ConverterCapability {
        let mut capability = ConverterCapability::new(&self.name, &self.category)
            .with_inputs(self.inputs.iter().map(String::as_str))
            .with_outputs(self.outputs.iter().map(String::as_str));

        let declared: Vec<Format> = capability.declared_formats().cloned().collect();
        for format in declared {
            let extensions = self
                .extensions
                .iter()
                .find(|(name, _)| Format::new(name) == format)
                .map(|(_, exts)| exts.clone())
                .unwrap_or_else(|| vec![format.to_string()]);
            capability = capability.with_extensions(format, extensions);
        }

        for (format, params) in &self.parameters {
            for (name, spec) in params {
                capability = capability.with_parameter(format.as_str(), name, spec.clone());
            }
        }

        capability
    }
}
