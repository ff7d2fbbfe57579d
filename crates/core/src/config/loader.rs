use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde_json::{Map, Value};
use std::path::Path;

use super::{types::Config, ConfigError};

/// Prefix of environment variables overriding file settings.
pub const ENV_PREFIX: &str = "FILECONV_";

/// Load configuration from file with environment variable overrides.
///
/// Nested keys are separated by a double underscore, e.g.
/// `FILECONV_ENABLED_CATEGORIES__IMAGE=false`.
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::FileNotFound(path.display().to_string()));
    }

    let config: Config = Figment::new()
        .merge(Toml::file(path))
        .merge(Env::prefixed(ENV_PREFIX).split("__"))
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))?;

    Ok(config)
}

/// Load configuration from TOML string (useful for testing)
pub fn load_config_from_str(toml_str: &str) -> Result<Config, ConfigError> {
    toml::from_str(toml_str).map_err(|e| ConfigError::ParseError(e.to_string()))
}

/// Build configuration from an already resolved key/value map.
pub fn config_from_map(map: &Map<String, Value>) -> Result<Config, ConfigError> {
    serde_json::from_value(Value::Object(map.clone()))
        .map_err(|e| ConfigError::ParseError(e.to_string()))
}
