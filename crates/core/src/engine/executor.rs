//! Conversion engine: validation, planning and step execution.

use chrono::Utc;
use std::collections::{BTreeMap, BTreeSet};
use std::io::ErrorKind;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::config::{validate_config, Config, ConfigError};
use crate::converter::{ConverterError, Parameters};
use crate::format::{extension_candidates, Format};
use crate::metrics;
use crate::registry::{ConverterRegistry, ConverterSource, DiscoveryReport, RegistrySnapshot};
use crate::resolver::{ConversionPlan, PathResolver};

use super::config::EngineConfig;
use super::error::ConversionError;
use super::types::{ConversionInfo, ConversionRequest, ConversionResult};
use super::workspace::Workspace;

/// Runs conversion requests against a converter registry.
///
/// The engine holds no per-request state and can be shared across tasks in
/// an `Arc`. Every call plans against one registry snapshot and works in its
/// own workspace.
pub struct ConversionEngine {
    registry: Arc<ConverterRegistry>,
    resolver: PathResolver,
    config: EngineConfig,
}

impl ConversionEngine {
    /// Creates an engine over an existing registry.
    pub fn new(registry: Arc<ConverterRegistry>, config: EngineConfig) -> Self {
        let resolver = PathResolver::new().with_max_steps(config.max_chain_length);
        Self {
            registry,
            resolver,
            config,
        }
    }

    /// Validates the configuration, builds the registry from the bootstrap
    /// list plus the configured command converters, then wraps it in an engine.
    pub fn bootstrap(
        config: &Config,
        mut sources: Vec<ConverterSource>,
    ) -> Result<(Self, DiscoveryReport), ConfigError> {
        validate_config(config)?;
        sources.extend(config.command_sources());

        let (registry, report) = ConverterRegistry::discover(config.registry_config(), &sources);
        Ok((Self::new(Arc::new(registry), config.engine_config()), report))
    }

    /// Returns the registry.
    pub fn registry(&self) -> &Arc<ConverterRegistry> {
        &self.registry
    }

    /// Returns the engine configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Converts one file.
    pub async fn convert(
        &self,
        request: ConversionRequest,
    ) -> Result<ConversionResult, ConversionError> {
        let start = Instant::now();
        let result = self.run(request, start).await;

        let label = match &result {
            Ok(_) => "success",
            Err(e) => e.kind(),
        };
        metrics::CONVERSIONS_TOTAL.with_label_values(&[label]).inc();
        metrics::CONVERSION_DURATION
            .with_label_values(&[label])
            .observe(start.elapsed().as_secs_f64());

        if let Err(e) = &result {
            warn!("Conversion failed ({}): {}", e.kind(), e);
        }
        result
    }

    /// Converts one file from a thread that is not running an async runtime.
    ///
    /// Panics if called from within a tokio runtime, like any `block_on`.
    pub fn convert_blocking(
        &self,
        request: ConversionRequest,
    ) -> Result<ConversionResult, ConversionError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(ConversionError::Runtime)?;
        runtime.block_on(self.convert(request))
    }

    /// Every input format mapped to all formats reachable from it.
    pub fn supported_conversions(&self) -> BTreeMap<Format, BTreeSet<Format>> {
        let snapshot = self.registry.snapshot();
        snapshot
            .input_formats()
            .into_iter()
            .filter_map(|input| {
                let reachable = self.resolver.reachable_from(&snapshot, &input);
                (!reachable.is_empty()).then_some((input, reachable))
            })
            .collect()
    }

    /// Describes the plan for a conversion without running it.
    pub fn describe_conversion(&self, input: &Format, output: &Format) -> Option<ConversionInfo> {
        let plan = self.resolver.resolve(&self.registry, input, output)?;

        let mut parameters = BTreeMap::new();
        for step in plan.steps() {
            if let Some(schema) = step
                .converter
                .capability()
                .parameter_schema
                .get(&step.output_format)
            {
                parameters
                    .entry(step.output_format.clone())
                    .or_insert_with(BTreeMap::new)
                    .extend(schema.clone());
            }
        }

        Some(ConversionInfo {
            input_format: input.clone(),
            output_format: output.clone(),
            plan: plan.summaries(),
            format_chain: plan.format_chain(),
            parameters,
        })
    }

    async fn run(
        &self,
        request: ConversionRequest,
        start: Instant,
    ) -> Result<ConversionResult, ConversionError> {
        let started_at = Utc::now();
        let snapshot = self.registry.snapshot();

        self.validate(&request).await?;

        let input_format =
            Self::detect_format(&snapshot, &request.input, request.input_format.as_ref())?;
        let output_format =
            Self::detect_format(&snapshot, &request.output, request.output_format.as_ref())?;

        let plan = self
            .resolver
            .resolve_in(&snapshot, &input_format, &output_format)
            .ok_or_else(|| ConversionError::NoConversionPath {
                from: input_format.clone(),
                to: output_format.clone(),
            })?;

        Self::check_parameters(&plan, &request.parameters)?;

        info!(
            "Converting {} to {} via {} ({} steps)",
            request.input.display(),
            request.output.display(),
            plan,
            plan.len()
        );

        let preserve = request
            .preserve_workspace
            .unwrap_or(self.config.preserve_temp_files);
        let mut workspace = Workspace::create(&self.config.workspace_root(), preserve).await?;
        // An output whose existence cannot be checked is never deleted.
        let output_state = tokio::fs::try_exists(&request.output).await;
        let output_existed = output_state.as_ref().map_or(true, |exists| *exists);
        let stash_previous = matches!(output_state, Ok(true));

        metrics::CONVERSION_STEPS.observe(plan.len() as f64);

        let total_steps = plan.len();
        let mut step_metadata = Vec::with_capacity(total_steps);
        let mut current_input = request.input.clone();

        for (index, step) in plan.steps().iter().enumerate() {
            let is_last = index + 1 == total_steps;
            let step_output = if is_last {
                if stash_previous {
                    workspace.stash_output(&request.output).await?;
                }
                request.output.clone()
            } else {
                workspace.step_path(index, &snapshot.primary_extension(&step.output_format))
            };

            debug!(
                "Step {}/{}: {} ({} -> {}) writing {}",
                index + 1,
                total_steps,
                step.converter.name(),
                step.input_format,
                step.output_format,
                step_output.display()
            );

            let outcome: Result<_, ConverterError> = match step.converter.instance() {
                Ok(converter) => {
                    converter
                        .convert(
                            &current_input,
                            &step_output,
                            workspace.path(),
                            &request.parameters,
                        )
                        .await
                }
                Err(e) => Err(e),
            };

            match outcome {
                Ok(metadata) => step_metadata.push(metadata),
                Err(source) => {
                    warn!(
                        "Step {}/{} ({}) failed: {}",
                        index + 1,
                        total_steps,
                        step.converter.name(),
                        source
                    );
                    metrics::STEP_FAILURES
                        .with_label_values(&[step.converter.name()])
                        .inc();

                    if is_last {
                        if output_existed {
                            workspace.restore_output().await;
                        } else {
                            Self::remove_partial_output(&request.output).await;
                        }
                    }

                    return Err(ConversionError::Execution {
                        step: index,
                        total_steps,
                        converter: step.converter.name().to_string(),
                        input_format: step.input_format.clone(),
                        output_format: step.output_format.clone(),
                        workspace: workspace.finish().await,
                        source,
                    });
                }
            }

            current_input = step_output;
        }

        let workspace = workspace.commit().await;
        let duration_ms = start.elapsed().as_millis() as u64;

        info!(
            "Converted {} to {} in {}ms",
            request.input.display(),
            request.output.display(),
            duration_ms
        );

        Ok(ConversionResult {
            input_format,
            output_format,
            input_path: request.input,
            output_path: request.output,
            plan: plan.summaries(),
            step_metadata,
            workspace,
            started_at,
            duration_ms,
        })
    }

    async fn validate(&self, request: &ConversionRequest) -> Result<(), ConversionError> {
        let input = &request.input;
        let metadata = match tokio::fs::metadata(input).await {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(ConversionError::validation(format!(
                    "Input file does not exist: {}",
                    input.display()
                )))
            }
            Err(e) => {
                return Err(ConversionError::validation(format!(
                    "Cannot access input file {}: {}",
                    input.display(),
                    e
                )))
            }
        };

        if !metadata.is_file() {
            return Err(ConversionError::validation(format!(
                "Input path is not a file: {}",
                input.display()
            )));
        }

        let limit = self.config.max_file_size_bytes();
        if metadata.len() > limit {
            return Err(ConversionError::validation(format!(
                "Input file is too large: {} bytes (limit: {} MB)",
                metadata.len(),
                self.config.max_file_size_mb
            )));
        }

        if let Err(e) = tokio::fs::File::open(input).await {
            return Err(ConversionError::validation(format!(
                "Input file is not readable: {}: {}",
                input.display(),
                e
            )));
        }

        let same_file = match (
            tokio::fs::canonicalize(input).await,
            tokio::fs::canonicalize(&request.output).await,
        ) {
            (Ok(a), Ok(b)) => a == b,
            _ => input == &request.output,
        };
        if same_file {
            return Err(ConversionError::validation(
                "Output path must differ from the input path",
            ));
        }

        if let Some(parent) = request
            .output
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
        {
            let is_dir = tokio::fs::metadata(parent)
                .await
                .map(|m| m.is_dir())
                .unwrap_or(false);
            if !is_dir {
                return Err(ConversionError::validation(format!(
                    "Output directory does not exist: {}",
                    parent.display()
                )));
            }
        }

        Ok(())
    }

    fn detect_format(
        snapshot: &RegistrySnapshot,
        path: &Path,
        explicit: Option<&Format>,
    ) -> Result<Format, ConversionError> {
        if let Some(format) = explicit {
            if snapshot.is_known(format) {
                return Ok(format.clone());
            }
            return Err(ConversionError::UnsupportedFormat {
                extension: format.to_string(),
            });
        }

        let candidates = extension_candidates(path);
        candidates
            .iter()
            .find_map(|extension| snapshot.format_for_extension(extension))
            .ok_or_else(|| ConversionError::UnsupportedFormat {
                extension: candidates.last().cloned().unwrap_or_default(),
            })
    }

    fn check_parameters(
        plan: &ConversionPlan,
        parameters: &Parameters,
    ) -> Result<(), ConversionError> {
        for step in plan.steps() {
            let Some(schema) = step
                .converter
                .capability()
                .parameter_schema
                .get(&step.output_format)
            else {
                continue;
            };

            for (name, value) in parameters {
                if let Some(spec) = schema.get(name) {
                    spec.check(value).map_err(|reason| {
                        ConversionError::validation(format!(
                            "Invalid parameter '{}' for {} -> {}: {}",
                            name, step.input_format, step.output_format, reason
                        ))
                    })?;
                }
            }
        }

        Ok(())
    }

    async fn remove_partial_output(output: &Path) {
        match tokio::fs::remove_file(output).await {
            Ok(()) => debug!("Removed partial output {}", output.display()),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => warn!("Failed to remove partial output {}: {}", output.display(), e),
        }
    }
}
