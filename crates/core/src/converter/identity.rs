//! Pass-through converter used when input and output formats are equal.

use async_trait::async_trait;
use serde_json::json;
use std::path::Path;

use crate::format::Format;

use super::error::ConverterError;
use super::traits::Converter;
use super::types::{Metadata, Parameters};

/// Name reported by the identity converter.
pub const IDENTITY_CONVERTER_NAME: &str = "identity";

/// Copies the input file to the output path unchanged.
///
/// It declares no formats of its own. The registry hands it out for any
/// known format `f` when asked for `f -> f`, and it never becomes an edge
/// of the capability graph.
#[derive(Debug, Default, Clone, Copy)]
pub struct IdentityConverter;

#[async_trait]
impl Converter for IdentityConverter {
    fn name(&self) -> &str {
        IDENTITY_CONVERTER_NAME
    }

    fn input_formats(&self) -> Vec<Format> {
        Vec::new()
    }

    fn output_formats(&self) -> Vec<Format> {
        Vec::new()
    }

    fn extensions_for(&self, _format: &Format) -> Vec<String> {
        Vec::new()
    }

    async fn convert(
        &self,
        input: &Path,
        output: &Path,
        _workspace: &Path,
        _parameters: &Parameters,
    ) -> Result<Metadata, ConverterError> {
        if !tokio::fs::try_exists(input).await? {
            return Err(ConverterError::InputNotFound {
                path: input.to_path_buf(),
            });
        }

        let bytes = tokio::fs::copy(input, output).await?;

        let mut metadata = Metadata::new();
        metadata.insert("bytes_copied".to_string(), json!(bytes));
        Ok(metadata)
    }
}
