//! Converter that delegates to an external command-line tool.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex_lite::{Captures, Regex};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::path::Path;
use std::process::Stdio;
use std::time::Instant;
use tokio::process::Command;
use tokio::time::{timeout, Duration};
use tracing::debug;

use crate::format::{extension_candidates, normalize_extension, Format};

use super::config::CommandConverterConfig;
use super::error::ConverterError;
use super::traits::Converter;
use super::types::{ConverterCapability, Metadata, ParameterSchema, Parameters};

static PLACEHOLDER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\{(?:(input|output|workspace)|param:([A-Za-z0-9_.-]+))\}")
        .expect("placeholder pattern is valid")
});

/// Maximum number of stderr bytes kept in a failure report.
const STDERR_LIMIT: usize = 4096;

/// Runs an external program once per conversion step.
pub struct CommandConverter {
    config: CommandConverterConfig,
    capability: ConverterCapability,
}

impl CommandConverter {
    /// Creates a new command converter with the given configuration.
    pub fn new(config: CommandConverterConfig) -> Self {
        let capability = config.capability();
        Self { config, capability }
    }

    /// Returns the configuration.
    pub fn config(&self) -> &CommandConverterConfig {
        &self.config
    }

    /// Expands the argument template for one invocation.
    ///
    /// Every placeholder is substituted in a single pass, so a substituted
    /// value is never expanded again.
    fn build_args(
        &self,
        input: &Path,
        output: &Path,
        workspace: &Path,
        parameters: &Parameters,
    ) -> Result<Vec<String>, ConverterError> {
        let input = input.to_string_lossy();
        let output_format = self.output_format_for(output);
        let output_str = output.to_string_lossy();
        let workspace = workspace.to_string_lossy();

        let mut args = Vec::with_capacity(self.config.args.len());
        for template in &self.config.args {
            let mut values: HashMap<String, String> = HashMap::new();
            for caps in PLACEHOLDER.captures_iter(template) {
                let Some(name) = caps.get(2).map(|m| m.as_str()) else {
                    continue;
                };
                let value = self
                    .parameter_value(name, output_format, parameters)
                    .ok_or_else(|| {
                        ConverterError::invalid_parameter(name, "no value supplied and no default")
                    })?;
                values.insert(name.to_string(), value);
            }

            let expanded = PLACEHOLDER.replace_all(template, |caps: &Captures<'_>| {
                match caps.get(1).map(|m| m.as_str()) {
                    Some("input") => input.to_string(),
                    Some("output") => output_str.to_string(),
                    Some("workspace") => workspace.to_string(),
                    _ => values.get(&caps[2]).cloned().unwrap_or_default(),
                }
            });
            args.push(expanded.into_owned());
        }

        Ok(args)
    }

    /// The declared output format written to `output`, judged by its extension.
    fn output_format_for(&self, output: &Path) -> Option<&Format> {
        let outputs = &self.capability.output_formats;
        let candidates = extension_candidates(output);
        candidates
            .iter()
            .find_map(|candidate| {
                outputs.iter().find(|format| {
                    self.capability
                        .extensions_for(format)
                        .iter()
                        .any(|ext| normalize_extension(ext) == *candidate)
                })
            })
            .or_else(|| match outputs.as_slice() {
                [only] => Some(only),
                _ => None,
            })
    }

    /// Looks a parameter up in the caller's map, then in the defaults declared
    /// for the output format being produced.
    fn parameter_value(
        &self,
        name: &str,
        output_format: Option<&Format>,
        parameters: &Parameters,
    ) -> Option<String> {
        let value = parameters.get(name).cloned().or_else(|| {
            self.capability
                .parameter_schema
                .get(output_format?)
                .and_then(|specs| specs.get(name))
                .and_then(|spec| spec.default.clone())
        })?;

        Some(match value {
            Value::String(s) => s,
            Value::Null => String::new(),
            other => other.to_string(),
        })
    }
}

#[async_trait]
impl Converter for CommandConverter {
    fn name(&self) -> &str {
        &self.config.name
    }

    fn input_formats(&self) -> Vec<Format> {
        self.capability.input_formats.clone()
    }

    fn output_formats(&self) -> Vec<Format> {
        self.capability.output_formats.clone()
    }

    fn extensions_for(&self, format: &Format) -> Vec<String> {
        self.capability.extensions_for(format).to_vec()
    }

    fn parameters(&self) -> ParameterSchema {
        self.capability.parameter_schema.clone()
    }

    async fn convert(
        &self,
        input: &Path,
        output: &Path,
        workspace: &Path,
        parameters: &Parameters,
    ) -> Result<Metadata, ConverterError> {
        if !tokio::fs::try_exists(input).await? {
            return Err(ConverterError::InputNotFound {
                path: input.to_path_buf(),
            });
        }

        let args = self.build_args(input, output, workspace, parameters)?;
        debug!(
            "Running {} {:?} for converter {}",
            self.config.program.display(),
            args,
            self.config.name
        );

        let started = Instant::now();
        let child = Command::new(&self.config.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    ConverterError::ToolNotFound {
                        program: self.config.program.clone(),
                    }
                } else {
                    ConverterError::Io(e)
                }
            })?;

        // Dropping the pending future on timeout kills the child.
        let timeout_duration = Duration::from_secs(self.config.timeout_secs);
        let result = match timeout(timeout_duration, child.wait_with_output()).await {
            Ok(result) => result?,
            Err(_) => {
                return Err(ConverterError::Timeout {
                    timeout_secs: self.config.timeout_secs,
                })
            }
        };

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            let stderr = stderr.trim();
            let stderr: String = stderr.chars().take(STDERR_LIMIT).collect();
            return Err(ConverterError::conversion_failed(
                format!(
                    "{} exited with code: {:?}",
                    self.config.program.display(),
                    result.status.code()
                ),
                if stderr.is_empty() { None } else { Some(stderr) },
            ));
        }

        let output_meta = tokio::fs::metadata(output)
            .await
            .map_err(|_| ConverterError::conversion_failed("Output file not created", None))?;

        let mut metadata = Metadata::new();
        metadata.insert("tool".to_string(), json!(self.config.program.to_string_lossy()));
        metadata.insert("exit_code".to_string(), json!(result.status.code()));
        metadata.insert("output_size_bytes".to_string(), json!(output_meta.len()));
        metadata.insert(
            "duration_ms".to_string(),
            json!(started.elapsed().as_millis() as u64),
        );
        Ok(metadata)
    }
}
