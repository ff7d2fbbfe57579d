//! Error types for the converter module.

use std::path::PathBuf;
use thiserror::Error;

/// Errors a converter plugin can report.
#[derive(Debug, Error)]
pub enum ConverterError {
    /// External tool binary not found.
    #[error("Conversion tool not found: {program}")]
    ToolNotFound { program: PathBuf },

    /// Input file not found.
    #[error("Input file not found: {path}")]
    InputNotFound { path: PathBuf },

    /// Conversion failed.
    #[error("Conversion failed: {reason}")]
    ConversionFailed {
        reason: String,
        stderr: Option<String>,
    },

    /// A parameter value could not be used.
    #[error("Invalid parameter '{name}': {reason}")]
    InvalidParameter { name: String, reason: String },

    /// Conversion timed out.
    #[error("Conversion timed out after {timeout_secs} seconds")]
    Timeout { timeout_secs: u64 },

    /// The converter factory could not build an instance.
    #[error("Failed to instantiate converter '{converter}': {reason}")]
    Instantiation { converter: String, reason: String },

    /// I/O error during conversion.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Any other plugin-specific failure.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ConverterError {
    /// Creates a new conversion failed error with optional stderr output.
    pub fn conversion_failed(reason: impl Into<String>, stderr: Option<String>) -> Self {
        Self::ConversionFailed {
            reason: reason.into(),
            stderr,
        }
    }

    /// Creates a new invalid parameter error.
    pub fn invalid_parameter(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Creates a new instantiation error.
    pub fn instantiation(converter: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Instantiation {
            converter: converter.into(),
            reason: reason.into(),
        }
    }

    /// Whether a caller-side retry could plausibly succeed.
    ///
    /// The engine never retries on its own.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Timeout { .. } | Self::Io(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = ConverterError::conversion_failed("bad header", Some("stderr".to_string()));
        assert_eq!(err.to_string(), "Conversion failed: bad header");

        let err = ConverterError::invalid_parameter("quality", "must be a number");
        assert_eq!(
            err.to_string(),
            "Invalid parameter 'quality': must be a number"
        );
    }

    #[test]
    fn test_retryable() {
        assert!(ConverterError::Timeout { timeout_secs: 5 }.is_retryable());
        assert!(ConverterError::Io(std::io::Error::other("disk")).is_retryable());
        assert!(!ConverterError::conversion_failed("x", None).is_retryable());
    }

    #[test]
    fn test_anyhow_is_transparent() {
        let err: ConverterError = anyhow::anyhow!("codec exploded").into();
        assert_eq!(err.to_string(), "codec exploded");
    }
}
