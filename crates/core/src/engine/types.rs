//! Request and result types for the conversion engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};

use crate::converter::{Metadata, ParameterSchema, Parameters};
use crate::format::Format;
use crate::resolver::PlanStepSummary;

/// A single conversion request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionRequest {
    /// File to convert.
    pub input: PathBuf,
    /// Where the final output is written.
    pub output: PathBuf,
    /// Parameters passed to every step.
    #[serde(default)]
    pub parameters: Parameters,
    /// Overrides the format derived from the input extension.
    #[serde(default)]
    pub input_format: Option<Format>,
    /// Overrides the format derived from the output extension.
    #[serde(default)]
    pub output_format: Option<Format>,
    /// Overrides the engine's workspace preservation setting for this call.
    #[serde(default)]
    pub preserve_workspace: Option<bool>,
}

impl ConversionRequest {
    pub fn new(input: impl Into<PathBuf>, output: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            output: output.into(),
            parameters: Parameters::new(),
            input_format: None,
            output_format: None,
            preserve_workspace: None,
        }
    }

    pub fn with_parameters(mut self, parameters: Parameters) -> Self {
        self.parameters = parameters;
        self
    }

    pub fn with_parameter(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.parameters.insert(name.into(), value.into());
        self
    }

    pub fn with_input_format(mut self, format: impl Into<Format>) -> Self {
        self.input_format = Some(format.into());
        self
    }

    pub fn with_output_format(mut self, format: impl Into<Format>) -> Self {
        self.output_format = Some(format.into());
        self
    }

    pub fn with_preserve_workspace(mut self, preserve: bool) -> Self {
        self.preserve_workspace = Some(preserve);
        self
    }
}

/// Outcome of a successful conversion.
#[derive(Debug, Clone, Serialize)]
pub struct ConversionResult {
    pub input_format: Format,
    pub output_format: Format,
    pub input_path: PathBuf,
    pub output_path: PathBuf,
    /// Executed steps, in order.
    pub plan: Vec<PlanStepSummary>,
    /// Metadata returned by each step, in order.
    pub step_metadata: Vec<Metadata>,
    /// Workspace left on disk, only set when preservation was requested.
    pub workspace: Option<PathBuf>,
    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,
}

impl ConversionResult {
    /// Number of executed steps.
    pub fn step_count(&self) -> usize {
        self.plan.len()
    }

    /// Output path as a `Path`.
    pub fn output(&self) -> &Path {
        &self.output_path
    }
}

/// Description of how a conversion would run, without running it.
#[derive(Debug, Clone, Serialize)]
pub struct ConversionInfo {
    pub input_format: Format,
    pub output_format: Format,
    /// Planned steps, in order.
    pub plan: Vec<PlanStepSummary>,
    /// Every format along the chain, starting with the input.
    pub format_chain: Vec<Format>,
    /// Parameters accepted by each step, keyed by the step's output format.
    pub parameters: ParameterSchema,
}
