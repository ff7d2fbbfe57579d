//! Immutable view of the registry's capability graph.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::converter::{Converter, ConverterCapability};
use crate::format::{normalize_extension, Format};

use super::config::DuplicatePolicy;
use super::entry::RegisteredConverter;
use super::error::RegistryError;

/// A directed capability edge `source -> target`, served by one converter.
#[derive(Debug, Clone)]
pub struct Edge {
    /// Target format.
    pub target: Format,
    /// Converter providing the edge.
    pub converter: Arc<RegisteredConverter>,
}

/// Converters and derived indexes at one point in time.
///
/// A snapshot never changes after it is built. The registry replaces its
/// snapshot as a whole, so readers holding one always see a consistent graph.
#[derive(Debug, Clone)]
pub struct RegistrySnapshot {
    entries: Vec<Arc<RegisteredConverter>>,
    edges: HashMap<Format, Vec<Edge>>,
    extensions: HashMap<Format, Vec<String>>,
    extension_index: HashMap<String, Format>,
    categories: BTreeMap<String, BTreeSet<Format>>,
    identity: Arc<RegisteredConverter>,
}

impl RegistrySnapshot {
    /// An empty snapshot.
    pub fn empty() -> Self {
        Self {
            entries: Vec::new(),
            edges: HashMap::new(),
            extensions: HashMap::new(),
            extension_index: HashMap::new(),
            categories: BTreeMap::new(),
            identity: Arc::new(RegisteredConverter::identity()),
        }
    }

    /// An empty snapshot sharing the given identity entry.
    pub(crate) fn with_identity(identity: Arc<RegisteredConverter>) -> Self {
        Self {
            identity,
            ..Self::empty()
        }
    }

    /// Checks that indexing `capability` is allowed under `policy`.
    pub(crate) fn check(
        &self,
        capability: &ConverterCapability,
        policy: DuplicatePolicy,
    ) -> Result<(), RegistryError> {
        if policy == DuplicatePolicy::FirstWins {
            return Ok(());
        }

        for input in &capability.input_formats {
            for output in &capability.output_formats {
                if input == output {
                    continue;
                }
                if let Some(existing) = self.entry(input, output) {
                    return Err(RegistryError::DuplicateCapability {
                        input: input.clone(),
                        output: output.clone(),
                        existing: existing.name().to_string(),
                        incoming: capability.name.clone(),
                    });
                }
            }
        }

        Ok(())
    }

    /// Indexes an entry after the existing ones.
    ///
    /// For a pair that is already served, the newcomer takes over only with a
    /// strictly higher priority. The edge keeps its enumeration position.
    pub(crate) fn insert(&mut self, entry: Arc<RegisteredConverter>) {
        let capability = entry.capability();

        for input in &capability.input_formats {
            for output in &capability.output_formats {
                if input == output {
                    continue;
                }

                let edges = self.edges.entry(input.clone()).or_default();
                match edges.iter_mut().find(|edge| &edge.target == output) {
                    Some(existing) => {
                        if entry.outranks(&existing.converter) {
                            debug!(
                                "Converter {} takes over {} -> {} from {} (priority {} > {})",
                                entry.name(),
                                input,
                                output,
                                existing.converter.name(),
                                entry.priority(),
                                existing.converter.priority()
                            );
                            existing.converter = Arc::clone(&entry);
                        }
                    }
                    None => {
                        debug!(
                            "Registered converter {} for {} -> {}",
                            entry.name(),
                            input,
                            output
                        );
                        edges.push(Edge {
                            target: output.clone(),
                            converter: Arc::clone(&entry),
                        });
                    }
                }
            }
        }

        for format in capability.declared_formats() {
            let known = self.extensions.entry(format.clone()).or_default();
            for extension in capability.extensions_for(format) {
                if !known.contains(extension) {
                    known.push(extension.clone());
                }
                let owner = self
                    .extension_index
                    .entry(extension.clone())
                    .or_insert_with(|| format.clone());
                if owner != format {
                    warn!(
                        "Extension .{} of format {} is already mapped to {}",
                        extension, format, owner
                    );
                }
            }

            self.categories
                .entry(capability.category.clone())
                .or_default()
                .insert(format.clone());
        }

        self.entries.push(entry);
    }

    /// Returns the registered entries in discovery order.
    pub fn entries(&self) -> &[Arc<RegisteredConverter>] {
        &self.entries
    }

    /// Returns all declared capabilities in discovery order.
    pub fn capabilities(&self) -> Vec<ConverterCapability> {
        self.entries
            .iter()
            .map(|entry| entry.capability().clone())
            .collect()
    }

    /// Returns the entry serving a direct conversion.
    ///
    /// `f -> f` yields the built-in identity converter for any known format.
    pub fn entry(&self, input: &Format, output: &Format) -> Option<Arc<RegisteredConverter>> {
        if input == output {
            return self.is_known(input).then(|| Arc::clone(&self.identity));
        }

        self.edges
            .get(input)?
            .iter()
            .find(|edge| &edge.target == output)
            .map(|edge| Arc::clone(&edge.converter))
    }

    /// Returns the converter instance for a direct conversion.
    pub fn get_converter(&self, input: &Format, output: &Format) -> Option<Arc<dyn Converter>> {
        let entry = self.entry(input, output)?;
        match entry.instance() {
            Ok(converter) => Some(converter),
            Err(e) => {
                warn!(
                    "Converter {} for {} -> {} could not be instantiated: {}",
                    entry.name(),
                    input,
                    output,
                    e
                );
                None
            }
        }
    }

    /// Outgoing edges of a format, in enumeration order.
    pub fn edges_from(&self, format: &Format) -> &[Edge] {
        self.edges.get(format).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Direct output formats of an input format, in enumeration order.
    pub fn supported_outputs(&self, input: &Format) -> Vec<Format> {
        self.edges_from(input)
            .iter()
            .map(|edge| edge.target.clone())
            .collect()
    }

    /// Formats with at least one outgoing edge.
    pub fn input_formats(&self) -> BTreeSet<Format> {
        self.edges
            .iter()
            .filter(|(_, edges)| !edges.is_empty())
            .map(|(format, _)| format.clone())
            .collect()
    }

    /// All declared formats.
    pub fn formats(&self) -> BTreeSet<Format> {
        self.extensions.keys().cloned().collect()
    }

    /// Whether some converter declares the format.
    pub fn is_known(&self, format: &Format) -> bool {
        self.extensions.contains_key(format)
    }

    /// Extensions of a format, primary first.
    pub fn extensions_for(&self, format: &Format) -> &[String] {
        self.extensions
            .get(format)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// The extension used for files of this format.
    pub fn primary_extension(&self, format: &Format) -> String {
        self.extensions_for(format)
            .first()
            .cloned()
            .unwrap_or_else(|| format.to_string())
    }

    /// Maps an extension to its format.
    pub fn format_for_extension(&self, extension: &str) -> Option<Format> {
        self.extension_index
            .get(&normalize_extension(extension))
            .cloned()
    }

    /// Declared formats grouped by converter category.
    pub fn formats_by_category(&self) -> &BTreeMap<String, BTreeSet<Format>> {
        &self.categories
    }

    /// Number of indexed converters.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no converter is indexed.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
