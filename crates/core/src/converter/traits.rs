//! Trait definitions for the converter module.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::Path;

use crate::format::Format;

use super::error::ConverterError;
use super::types::{Metadata, ParameterSchema, Parameters};

/// A converter that transforms files between formats.
///
/// Instances are cached by the registry and shared across concurrent
/// conversions, so implementations must not keep request-scoped state: paths
/// and parameters arrive as arguments on every call.
#[async_trait]
pub trait Converter: Send + Sync {
    /// Returns the name of this converter implementation.
    fn name(&self) -> &str;

    /// Returns the formats this converter reads.
    fn input_formats(&self) -> Vec<Format>;

    /// Returns the formats this converter writes.
    fn output_formats(&self) -> Vec<Format>;

    /// Returns the file extensions for a declared format, primary first.
    fn extensions_for(&self, format: &Format) -> Vec<String>;

    /// Returns the accepted parameters, keyed by output format.
    fn parameters(&self) -> ParameterSchema {
        BTreeMap::new()
    }

    /// Converts `input` into `output`.
    ///
    /// `workspace` is a scratch directory owned by the current request. The
    /// returned map describes the conversion.
    async fn convert(
        &self,
        input: &Path,
        output: &Path,
        workspace: &Path,
        parameters: &Parameters,
    ) -> Result<Metadata, ConverterError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::converter::{ConverterCapability, ParamSpec};
    use serde_json::json;

    struct UppercaseConverter;

    #[async_trait]
    impl Converter for UppercaseConverter {
        fn name(&self) -> &str {
            "uppercase"
        }

        fn input_formats(&self) -> Vec<Format> {
            vec![Format::new("txt")]
        }

        fn output_formats(&self) -> Vec<Format> {
            vec![Format::new("shout")]
        }

        fn extensions_for(&self, format: &Format) -> Vec<String> {
            vec![format.to_string()]
        }

        fn parameters(&self) -> ParameterSchema {
            let mut shout = BTreeMap::new();
            shout.insert(
                "exclaim".to_string(),
                ParamSpec::boolean("Append an exclamation mark").with_default(false),
            );
            let mut schema = BTreeMap::new();
            schema.insert(Format::new("shout"), shout);
            schema
        }

        async fn convert(
            &self,
            input: &Path,
            output: &Path,
            _workspace: &Path,
            parameters: &Parameters,
        ) -> Result<Metadata, ConverterError> {
            let text = tokio::fs::read_to_string(input).await?;
            let mut shouted = text.to_uppercase();
            if parameters.get("exclaim").and_then(|v| v.as_bool()) == Some(true) {
                shouted.push('!');
            }
            tokio::fs::write(output, &shouted).await?;

            let mut metadata = Metadata::new();
            metadata.insert("characters".to_string(), json!(shouted.len()));
            Ok(metadata)
        }
    }

    #[tokio::test]
    async fn test_converter_convert() {
        let dir = tempfile::TempDir::new().unwrap();
        let input = dir.path().join("in.txt");
        let output = dir.path().join("out.shout");
        std::fs::write(&input, "hello").unwrap();

        let mut params = Parameters::new();
        params.insert("exclaim".to_string(), json!(true));

        let metadata = UppercaseConverter
            .convert(&input, &output, dir.path(), &params)
            .await
            .unwrap();

        assert_eq!(std::fs::read_to_string(&output).unwrap(), "HELLO!");
        assert_eq!(metadata["characters"], 6);
    }

    #[test]
    fn test_describe_capability() {
        let capability = ConverterCapability::describe(&UppercaseConverter, "text");
        assert_eq!(capability.name, "uppercase");
        assert_eq!(capability.category, "text");
        assert!(capability.supports(&Format::new("txt"), &Format::new("shout")));
        assert_eq!(capability.extensions_for(&Format::new("shout")), &["shout"]);
        assert!(capability.parameter_schema[&Format::new("shout")].contains_key("exclaim"));
        assert!(capability.validate().is_ok());
    }
}
