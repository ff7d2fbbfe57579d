//! Types for the converter module.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::format::{normalize_extension, Format};

use super::traits::Converter;

/// Caller-supplied conversion parameters, passed unchanged to every step.
pub type Parameters = serde_json::Map<String, Value>;

/// Metadata returned by one converter call.
pub type Metadata = serde_json::Map<String, Value>;

/// Parameter specifications keyed by output format, then parameter name.
pub type ParameterSchema = BTreeMap<Format, BTreeMap<String, ParamSpec>>;

/// Value type of a converter parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamType {
    String,
    Number,
    Boolean,
}

impl ParamType {
    fn matches(&self, value: &Value) -> bool {
        match self {
            Self::String => value.is_string(),
            Self::Number => value.is_number(),
            Self::Boolean => value.is_boolean(),
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Boolean => "boolean",
        }
    }
}

/// Description of one converter parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamSpec {
    /// Expected value type.
    #[serde(rename = "type")]
    pub kind: ParamType,
    /// Value the converter uses when the parameter is absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    /// Lower bound for numbers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    /// Upper bound for numbers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    /// Allowed values, if restricted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<Value>>,
    /// Human-readable description.
    #[serde(default)]
    pub description: String,
}

impl ParamSpec {
    fn of(kind: ParamType, description: impl Into<String>) -> Self {
        Self {
            kind,
            default: None,
            min: None,
            max: None,
            options: None,
            description: description.into(),
        }
    }

    /// A string parameter.
    pub fn string(description: impl Into<String>) -> Self {
        Self::of(ParamType::String, description)
    }

    /// A numeric parameter.
    pub fn number(description: impl Into<String>) -> Self {
        Self::of(ParamType::Number, description)
    }

    /// A boolean parameter.
    pub fn boolean(description: impl Into<String>) -> Self {
        Self::of(ParamType::Boolean, description)
    }

    /// Sets the default value.
    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.default = Some(default.into());
        self
    }

    /// Sets inclusive numeric bounds.
    pub fn with_range(mut self, min: f64, max: f64) -> Self {
        self.min = Some(min);
        self.max = Some(max);
        self
    }

    /// Restricts the parameter to a fixed set of values.
    pub fn with_options<I, V>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.options = Some(options.into_iter().map(Into::into).collect());
        self
    }

    /// Checks a value against the type, bounds and allowed options.
    pub fn check(&self, value: &Value) -> Result<(), String> {
        if !self.kind.matches(value) {
            return Err(format!("expected a {}, got {}", self.kind.name(), value));
        }

        if let Some(n) = value.as_f64() {
            if let Some(min) = self.min {
                if n < min {
                    return Err(format!("{} is below the minimum {}", n, min));
                }
            }
            if let Some(max) = self.max {
                if n > max {
                    return Err(format!("{} is above the maximum {}", n, max));
                }
            }
        }

        if let Some(options) = &self.options {
            let allowed = options.iter().any(|option| match (option.as_f64(), value.as_f64()) {
                (Some(a), Some(b)) => a == b,
                _ => option == value,
            });
            if !allowed {
                return Err(format!("{} is not one of the allowed values", value));
            }
        }

        Ok(())
    }
}

/// The declared capability of one converter.
///
/// Format lists keep declaration order with duplicates removed. The first
/// extension for a format is its primary extension.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConverterCapability {
    /// Converter name.
    pub name: String,
    /// Category used by the enable/disable configuration.
    pub category: String,
    /// Formats accepted as input.
    pub input_formats: Vec<Format>,
    /// Formats produced as output.
    pub output_formats: Vec<Format>,
    /// File extensions for each declared format.
    pub extensions_by_format: BTreeMap<Format, Vec<String>>,
    /// Parameters accepted per output format.
    #[serde(default)]
    pub parameter_schema: ParameterSchema,
}

impl ConverterCapability {
    /// Creates an empty capability.
    pub fn new(name: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            category: category.into(),
            input_formats: Vec::new(),
            output_formats: Vec::new(),
            extensions_by_format: BTreeMap::new(),
            parameter_schema: BTreeMap::new(),
        }
    }

    /// Reads the declared capability of a converter instance.
    pub fn describe(converter: &dyn Converter, category: impl Into<String>) -> Self {
        let mut capability = Self::new(converter.name(), category)
            .with_inputs(converter.input_formats())
            .with_outputs(converter.output_formats());

        let declared: Vec<Format> = capability.declared_formats().cloned().collect();
        for format in declared {
            let extensions = converter.extensions_for(&format);
            capability = capability.with_extensions(format, extensions);
        }

        capability.parameter_schema = converter.parameters();
        capability
    }

    /// Adds input formats.
    pub fn with_inputs<I, F>(mut self, formats: I) -> Self
    where
        I: IntoIterator<Item = F>,
        F: Into<Format>,
    {
        push_unique(&mut self.input_formats, formats);
        self
    }

    /// Adds output formats.
    pub fn with_outputs<I, F>(mut self, formats: I) -> Self
    where
        I: IntoIterator<Item = F>,
        F: Into<Format>,
    {
        push_unique(&mut self.output_formats, formats);
        self
    }

    /// Adds extensions for a format.
    pub fn with_extensions<I, S>(mut self, format: impl Into<Format>, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let entry = self.extensions_by_format.entry(format.into()).or_default();
        for extension in extensions {
            let extension = normalize_extension(extension.as_ref());
            if !extension.is_empty() && !entry.contains(&extension) {
                entry.push(extension);
            }
        }
        self
    }

    /// Declares a parameter for an output format.
    pub fn with_parameter(
        mut self,
        format: impl Into<Format>,
        name: impl Into<String>,
        spec: ParamSpec,
    ) -> Self {
        self.parameter_schema
            .entry(format.into())
            .or_default()
            .insert(name.into(), spec);
        self
    }

    /// All declared formats, inputs first.
    pub fn declared_formats(&self) -> impl Iterator<Item = &Format> {
        let mut seen = Vec::new();
        self.input_formats
            .iter()
            .chain(self.output_formats.iter())
            .filter(move |f| {
                if seen.contains(f) {
                    false
                } else {
                    seen.push(*f);
                    true
                }
            })
    }

    /// Extensions declared for a format.
    pub fn extensions_for(&self, format: &Format) -> &[String] {
        self.extensions_by_format
            .get(format)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Whether this converter declares the exact pair.
    pub fn supports(&self, input: &Format, output: &Format) -> bool {
        self.input_formats.contains(input) && self.output_formats.contains(output)
    }

    /// Checks that the declaration is usable for indexing.
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("converter name is empty".to_string());
        }
        if self.input_formats.is_empty() {
            return Err("no input formats declared".to_string());
        }
        if self.output_formats.is_empty() {
            return Err("no output formats declared".to_string());
        }

        for format in self.declared_formats() {
            if !format.is_valid() {
                return Err(format!("invalid format name '{}'", format));
            }
            if self.extensions_for(format).is_empty() {
                return Err(format!("no file extensions declared for format '{}'", format));
            }
        }

        for format in self.parameter_schema.keys() {
            if !self.output_formats.contains(format) {
                return Err(format!(
                    "parameters declared for '{}', which is not an output format",
                    format
                ));
            }
        }

        Ok(())
    }
}

fn push_unique<I, F>(target: &mut Vec<Format>, formats: I)
where
    I: IntoIterator<Item = F>,
    F: Into<Format>,
{
    for format in formats {
        let format = format.into();
        if !target.contains(&format) {
            target.push(format);
        }
    }
}
