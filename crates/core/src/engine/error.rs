//! Error types for the conversion engine.

use std::path::PathBuf;
use thiserror::Error;

use crate::converter::ConverterError;
use crate::format::Format;

/// Errors returned by a conversion request.
#[derive(Debug, Error)]
pub enum ConversionError {
    /// The request is malformed or its input is missing, unreadable or too large.
    #[error("Validation failed: {reason}")]
    Validation { reason: String },

    /// An extension or explicit format does not map to any known format.
    #[error("Unsupported format: '{extension}'")]
    UnsupportedFormat { extension: String },

    /// Both formats are known but no chain of converters connects them.
    #[error("No conversion path from {from} to {to}")]
    NoConversionPath { from: Format, to: Format },

    /// A plan step failed.
    #[error(
        "Step {}/{total_steps} ({converter}: {input_format} -> {output_format}) failed: {source}",
        .step + 1
    )]
    Execution {
        /// Zero-based index of the failing step.
        step: usize,
        total_steps: usize,
        converter: String,
        input_format: Format,
        output_format: Format,
        /// The workspace directory, when it was preserved for inspection.
        workspace: Option<PathBuf>,
        #[source]
        source: ConverterError,
    },

    /// The scoped workspace could not be created or prepared.
    #[error("Workspace error at {path}: {source}")]
    Workspace {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// No async runtime could be built for a blocking call.
    #[error("Failed to start runtime: {0}")]
    Runtime(#[source] std::io::Error),
}

impl ConversionError {
    pub(crate) fn validation(reason: impl Into<String>) -> Self {
        Self::Validation {
            reason: reason.into(),
        }
    }

    /// Stable snake_case name of the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "validation",
            Self::UnsupportedFormat { .. } => "unsupported_format",
            Self::NoConversionPath { .. } => "no_conversion_path",
            Self::Execution { .. } => "execution",
            Self::Workspace { .. } => "workspace",
            Self::Runtime(_) => "runtime",
        }
    }
}
