//! Mock converter for testing.

use async_trait::async_trait;
use serde_json::json;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::converter::{Converter, ConverterError, Metadata, ParamSpec, ParameterSchema, Parameters};
use crate::format::Format;

/// A recorded converter call for test assertions.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub input: PathBuf,
    pub output: PathBuf,
    pub workspace: PathBuf,
    pub parameters: Parameters,
    /// Whether the call succeeded.
    pub success: bool,
}

/// Mock implementation of the Converter trait.
///
/// Provides controllable behavior for testing:
/// - Declare any input/output formats, extensions and parameters
/// - Track calls for assertions
/// - Simulate failures, optionally leaving a partial output behind
/// - Simulate slow conversions
///
/// A successful call writes the input bytes followed by a marker line naming
/// the converter. Clones share recorded state, so a test can keep one handle
/// while the registry owns another.
///
/// # Example
///
/// ```rust,ignore
/// use fileconv_core::testing::MockConverter;
///
/// let converter = MockConverter::new("md-html", &["md"], &["html"])
///     .with_extensions("md", &["md", "markdown"]);
///
/// // Fail the next call
/// converter.set_next_error(ConverterError::conversion_failed("boom", None)).await;
///
/// // Check what was converted
/// let calls = converter.recorded_calls().await;
/// assert_eq!(calls.len(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct MockConverter {
    name: String,
    inputs: Vec<Format>,
    outputs: Vec<Format>,
    extensions: BTreeMap<Format, Vec<String>>,
    parameters: ParameterSchema,
    /// Recorded calls.
    calls: Arc<RwLock<Vec<RecordedCall>>>,
    /// If set, the next call will fail with this error.
    next_error: Arc<RwLock<Option<ConverterError>>>,
    /// If set, every call fails with this reason.
    failure: Arc<RwLock<Option<String>>>,
    /// Whether a failing call first writes a partial output file.
    partial_output_on_failure: Arc<RwLock<bool>>,
    /// Simulated conversion duration in milliseconds.
    delay_ms: Arc<RwLock<u64>>,
}

impl MockConverter {
    /// Create a mock converter declaring the given formats.
    pub fn new(name: &str, inputs: &[&str], outputs: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            inputs: inputs.iter().map(|f| Format::new(f)).collect(),
            outputs: outputs.iter().map(|f| Format::new(f)).collect(),
            extensions: BTreeMap::new(),
            parameters: ParameterSchema::new(),
            calls: Arc::new(RwLock::new(Vec::new())),
            next_error: Arc::new(RwLock::new(None)),
            failure: Arc::new(RwLock::new(None)),
            partial_output_on_failure: Arc::new(RwLock::new(false)),
            delay_ms: Arc::new(RwLock::new(0)),
        }
    }

    /// Declare the extensions of a format. Formats without an entry use their own name.
    pub fn with_extensions(mut self, format: &str, extensions: &[&str]) -> Self {
        self.extensions.insert(
            Format::new(format),
            extensions.iter().map(|e| e.to_string()).collect(),
        );
        self
    }

    /// Declare a parameter accepted when producing `format`.
    pub fn with_parameter(mut self, format: &str, name: &str, spec: ParamSpec) -> Self {
        self.parameters
            .entry(Format::new(format))
            .or_default()
            .insert(name.to_string(), spec);
        self
    }

    /// Get all recorded calls.
    pub async fn recorded_calls(&self) -> Vec<RecordedCall> {
        self.calls.read().await.clone()
    }

    /// Get the number of calls made.
    pub async fn call_count(&self) -> usize {
        self.calls.read().await.len()
    }

    /// Clear recorded calls.
    pub async fn clear_recorded(&self) {
        self.calls.write().await.clear();
    }

    /// Configure the next call to fail with the given error.
    pub async fn set_next_error(&self, error: ConverterError) {
        *self.next_error.write().await = Some(error);
    }

    /// Make every call fail with the given reason, or succeed again with `None`.
    pub async fn set_failure(&self, reason: Option<String>) {
        *self.failure.write().await = reason;
    }

    /// Write a partial output file before failing.
    pub async fn set_partial_output_on_failure(&self, partial: bool) {
        *self.partial_output_on_failure.write().await = partial;
    }

    /// Set the simulated conversion duration.
    pub async fn set_delay(&self, delay: Duration) {
        *self.delay_ms.write().await = delay.as_millis() as u64;
    }

    async fn take_error(&self) -> Option<ConverterError> {
        if let Some(error) = self.next_error.write().await.take() {
            return Some(error);
        }
        self.failure
            .read()
            .await
            .clone()
            .map(|reason| ConverterError::conversion_failed(reason, None))
    }

    async fn record(
        &self,
        input: &Path,
        output: &Path,
        workspace: &Path,
        parameters: &Parameters,
        success: bool,
    ) {
        self.calls.write().await.push(RecordedCall {
            input: input.to_path_buf(),
            output: output.to_path_buf(),
            workspace: workspace.to_path_buf(),
            parameters: parameters.clone(),
            success,
        });
    }
}

#[async_trait]
impl Converter for MockConverter {
    fn name(&self) -> &str {
        &self.name
    }

    fn input_formats(&self) -> Vec<Format> {
        self.inputs.clone()
    }

    fn output_formats(&self) -> Vec<Format> {
        self.outputs.clone()
    }

    fn extensions_for(&self, format: &Format) -> Vec<String> {
        self.extensions
            .get(format)
            .cloned()
            .unwrap_or_else(|| vec![format.to_string()])
    }

    fn parameters(&self) -> ParameterSchema {
        self.parameters.clone()
    }

    async fn convert(
        &self,
        input: &Path,
        output: &Path,
        workspace: &Path,
        parameters: &Parameters,
    ) -> Result<Metadata, ConverterError> {
        let delay_ms = *self.delay_ms.read().await;
        if delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(delay_ms)).await;
        }

        if let Some(error) = self.take_error().await {
            if *self.partial_output_on_failure.read().await {
                tokio::fs::write(output, b"partial").await?;
            }
            self.record(input, output, workspace, parameters, false).await;
            return Err(error);
        }

        let mut contents = match tokio::fs::read(input).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                self.record(input, output, workspace, parameters, false).await;
                return Err(ConverterError::InputNotFound {
                    path: input.to_path_buf(),
                });
            }
            Err(e) => return Err(e.into()),
        };
        let input_bytes = contents.len();
        contents.extend_from_slice(format!("\n[converted by {}]\n", self.name).as_bytes());
        tokio::fs::write(output, &contents).await?;
        self.record(input, output, workspace, parameters, true).await;

        let mut metadata = Metadata::new();
        metadata.insert("converter".to_string(), json!(self.name));
        metadata.insert("input_bytes".to_string(), json!(input_bytes));
        metadata.insert("output_bytes".to_string(), json!(contents.len()));
        Ok(metadata)
    }
}
