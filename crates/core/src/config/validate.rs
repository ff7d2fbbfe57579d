use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - max_file_size_mb is a positive, finite number
/// - max_chain_length, when set, is at least 1
/// - Every command converter has a name, a program and both format lists
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if !config.max_file_size_mb.is_finite() || config.max_file_size_mb <= 0.0 {
        return Err(ConfigError::ValidationError(format!(
            "max_file_size_mb must be a positive number, got {}",
            config.max_file_size_mb
        )));
    }

    if config.max_chain_length == Some(0) {
        return Err(ConfigError::ValidationError(
            "max_chain_length must be at least 1".to_string(),
        ));
    }

    for (index, converter) in config.command_converters.iter().enumerate() {
        if converter.name.trim().is_empty() {
            return Err(ConfigError::ValidationError(format!(
                "command_converters[{}].name cannot be empty",
                index
            )));
        }
        if converter.program.as_os_str().is_empty() {
            return Err(ConfigError::ValidationError(format!(
                "command_converters[{}] ({}) has no program",
                index, converter.name
            )));
        }
        if converter.inputs.is_empty() || converter.outputs.is_empty() {
            return Err(ConfigError::ValidationError(format!(
                "command_converters[{}] ({}) must declare inputs and outputs",
                index, converter.name
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::converter::CommandConverterConfig;

    #[test]
    fn test_validate_default_config() {
        assert!(validate_config(&Config::default()).is_ok());
    }

    #[test]
    fn test_validate_size_limit() {
        for bad in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let config = Config {
                max_file_size_mb: bad,
                ..Config::default()
            };
            let result = validate_config(&config);
            assert!(matches!(result, Err(ConfigError::ValidationError(_))));
        }
    }

    #[test]
    fn test_validate_chain_length_zero_fails() {
        let config = Config {
            max_chain_length: Some(0),
            ..Config::default()
        };
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_command_converter_without_outputs() {
        let config = Config {
            command_converters: vec![CommandConverterConfig::new("tool", "tool", &["md"], &[])],
            ..Config::default()
        };
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("tool"));
    }

    #[test]
    fn test_validate_command_converter_without_program() {
        let config = Config {
            command_converters: vec![CommandConverterConfig::new("tool", "", &["md"], &["html"])],
            ..Config::default()
        };
        assert!(validate_config(&config).is_err());
    }
}
