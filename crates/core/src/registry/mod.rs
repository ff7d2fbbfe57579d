//! Converter registry.
//!
//! The registry owns every known converter and answers capability queries:
//! which converter serves a direct `input -> output` pair, which outputs an
//! input can reach in one step, and which format an extension maps to.
//!
//! The indexed state lives in an immutable [`RegistrySnapshot`]. Registration
//! and rescans build a new snapshot and swap it in, so concurrent readers
//! never observe a half-built index.
//!
//! # Example
//!
//! ```ignore
//! use fileconv_core::registry::{ConverterRegistry, ConverterSource, RegistryConfig};
//!
//! let sources = vec![ConverterSource::from_command(pandoc_config)];
//! let (registry, report) = ConverterRegistry::discover(RegistryConfig::default(), &sources);
//! println!("{} converters, {} skipped", report.registered.len(), report.skipped.len());
//!
//! let outputs = registry.supported_outputs(&"md".into());
//! ```

mod config;
mod entry;
mod error;
mod snapshot;

pub use config::{DuplicatePolicy, RegistryConfig};
pub use entry::{ConverterFactory, ConverterRegistration, ConverterSource, RegisteredConverter};
pub use error::RegistryError;
pub use snapshot::{Edge, RegistrySnapshot};

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, info, warn};

use crate::converter::{Converter, ConverterCapability};
use crate::format::Format;
use crate::metrics;

/// A converter source left out during discovery.
#[derive(Debug, Clone, Serialize)]
pub struct SkippedConverter {
    /// Category of the source.
    pub category: String,
    /// Converter name, when it got far enough to declare one.
    pub converter: Option<String>,
    /// Why it was skipped.
    pub reason: String,
}

/// Outcome of a discovery pass.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DiscoveryReport {
    /// Names of indexed converters, in discovery order.
    pub registered: Vec<String>,
    /// Sources that failed to load or validate.
    pub skipped: Vec<SkippedConverter>,
    /// Number of sources left out because their category is disabled.
    pub disabled: usize,
}

/// Registry of converters and their capabilities.
pub struct ConverterRegistry {
    config: RegistryConfig,
    state: RwLock<Arc<RegistrySnapshot>>,
    identity: Arc<RegisteredConverter>,
}

impl ConverterRegistry {
    /// Creates an empty registry.
    pub fn new(config: RegistryConfig) -> Self {
        let identity = Arc::new(RegisteredConverter::identity());
        let snapshot = RegistrySnapshot::with_identity(Arc::clone(&identity));
        Self {
            config,
            state: RwLock::new(Arc::new(snapshot)),
            identity,
        }
    }

    /// Creates a registry by loading every source of the bootstrap list.
    ///
    /// A source that cannot be loaded is logged and skipped. Discovery itself
    /// never fails.
    pub fn discover(config: RegistryConfig, sources: &[ConverterSource]) -> (Self, DiscoveryReport) {
        let registry = Self::new(config);
        let report = registry.rescan(sources);
        (registry, report)
    }

    /// Returns the registry configuration.
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Returns the current snapshot.
    pub fn snapshot(&self) -> Arc<RegistrySnapshot> {
        let guard = self.state.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&guard)
    }

    /// Registers one converter.
    ///
    /// Returns `Ok(false)` when the converter's category is disabled.
    pub fn register(&self, registration: ConverterRegistration) -> Result<bool, RegistryError> {
        let capability = registration.capability();
        if !self.config.is_category_enabled(&capability.category) {
            info!(
                "Category {} is disabled, not registering converter {}",
                capability.category, capability.name
            );
            return Ok(false);
        }

        capability
            .validate()
            .map_err(|reason| RegistryError::InvalidCapability {
                converter: capability.name.clone(),
                reason,
            })?;

        let mut guard = self.state.write().unwrap_or_else(PoisonError::into_inner);
        guard.check(capability, self.config.duplicate_policy)?;

        let mut next = RegistrySnapshot::clone(&guard);
        let name = capability.name.clone();
        let entry = RegisteredConverter::from_registration(registration, next.len());
        next.insert(Arc::new(entry));
        *guard = Arc::new(next);

        debug!("Registered converter {}", name);
        Ok(true)
    }

    /// Rebuilds the index from a bootstrap list and swaps it in atomically.
    ///
    /// Converters registered individually before the rescan are dropped.
    pub fn rescan(&self, sources: &[ConverterSource]) -> DiscoveryReport {
        let mut report = DiscoveryReport::default();
        let mut next = RegistrySnapshot::with_identity(Arc::clone(&self.identity));

        for source in sources {
            if !self.config.is_category_enabled(source.category()) {
                info!("Skipping converter source of disabled category {}", source.category());
                report.disabled += 1;
                continue;
            }

            let registration = match source.load() {
                Ok(registration) => registration,
                Err(e) => {
                    report.skip(source.category(), None, e.to_string());
                    continue;
                }
            };

            let capability = registration.capability();
            let checked = capability
                .validate()
                .map_err(|reason| RegistryError::InvalidCapability {
                    converter: capability.name.clone(),
                    reason,
                })
                .and_then(|()| next.check(capability, self.config.duplicate_policy));
            if let Err(e) = checked {
                report.skip(source.category(), Some(capability.name.clone()), e.to_string());
                continue;
            }

            report.registered.push(capability.name.clone());
            let entry = RegisteredConverter::from_registration(registration, next.len());
            next.insert(Arc::new(entry));
        }

        info!(
            "Converter discovery finished: {} registered, {} skipped, {} disabled",
            report.registered.len(),
            report.skipped.len(),
            report.disabled
        );

        let mut guard = self.state.write().unwrap_or_else(PoisonError::into_inner);
        *guard = Arc::new(next);
        report
    }

    /// Returns the converter for a direct conversion, if one is registered.
    pub fn get_converter(&self, input: &Format, output: &Format) -> Option<Arc<dyn Converter>> {
        self.snapshot().get_converter(input, output)
    }

    /// Direct output formats of an input format.
    pub fn supported_outputs(&self, input: &Format) -> Vec<Format> {
        self.snapshot().supported_outputs(input)
    }

    /// All declared capabilities in discovery order.
    pub fn all_capabilities(&self) -> Vec<ConverterCapability> {
        self.snapshot().capabilities()
    }

    /// Maps an extension to its format.
    pub fn format_for_extension(&self, extension: &str) -> Option<Format> {
        self.snapshot().format_for_extension(extension)
    }

    /// Extensions of a format, primary first.
    pub fn extensions_for(&self, format: &Format) -> Vec<String> {
        self.snapshot().extensions_for(format).to_vec()
    }

    /// Declared formats grouped by converter category.
    pub fn formats_by_category(&self) -> BTreeMap<String, BTreeSet<Format>> {
        self.snapshot().formats_by_category().clone()
    }

    /// Direct conversions per input format.
    pub fn conversion_map(&self) -> BTreeMap<Format, BTreeSet<Format>> {
        let snapshot = self.snapshot();
        snapshot
            .input_formats()
            .into_iter()
            .map(|input| {
                let outputs = snapshot.supported_outputs(&input).into_iter().collect();
                (input, outputs)
            })
            .collect()
    }
}

impl DiscoveryReport {
    fn skip(&mut self, category: &str, converter: Option<String>, reason: String) {
        warn!(
            "Skipping converter {} of category {}: {}",
            converter.as_deref().unwrap_or("<unknown>"),
            category,
            reason
        );
        metrics::REGISTRY_SKIPPED.inc();
        self.skipped.push(SkippedConverter {
            category: category.to_string(),
            converter,
            reason,
        });
    }
}
