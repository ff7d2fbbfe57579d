//! Error types for the registry module.

use thiserror::Error;

use crate::format::Format;

/// Errors raised when registering a converter.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Another converter already claims the pair and the policy forbids sharing.
    #[error("Converter '{incoming}' duplicates {input} -> {output}, already provided by '{existing}'")]
    DuplicateCapability {
        input: Format,
        output: Format,
        existing: String,
        incoming: String,
    },

    /// The declared capability cannot be indexed.
    #[error("Invalid capability for converter '{converter}': {reason}")]
    InvalidCapability { converter: String, reason: String },
}
