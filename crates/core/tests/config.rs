//! Configuration integration tests.
//!
//! Environment overrides are process-wide, so every test touching
//! `FILECONV_` variables lives in this file and uses distinct keys.

use std::io::Write;

use tempfile::{NamedTempFile, TempDir};

use fileconv_core::{
    config::{config_from_map, load_config, load_config_from_str, validate_config, Config, ConfigError},
    engine::{ConversionEngine, ConversionRequest},
    testing::{fixtures, MockConverter},
    DuplicatePolicy, Format,
};

#[test]
fn test_env_overrides_file_values() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
max_file_size_mb = 10
duplicate_policy = "first_wins"

[enabled_categories]
image = true
"#
    )
    .unwrap();

    std::env::set_var("FILECONV_MAX_FILE_SIZE_MB", "2.5");
    std::env::set_var("FILECONV_ENABLED_CATEGORIES__IMAGE", "false");
    let config = load_config(file.path()).unwrap();
    std::env::remove_var("FILECONV_MAX_FILE_SIZE_MB");
    std::env::remove_var("FILECONV_ENABLED_CATEGORIES__IMAGE");

    assert_eq!(config.max_file_size_mb, 2.5);
    assert_eq!(config.duplicate_policy, DuplicatePolicy::FirstWins);
    assert!(!config.registry_config().is_category_enabled("image"));
    assert!(validate_config(&config).is_ok());
}

#[test]
fn test_bootstrap_combines_sources_and_config() {
    let toml = r#"
max_chain_length = 2

[enabled_categories]
image = false
"#;
    let config: Config = load_config_from_str(toml).unwrap();

    let sources = vec![
        fixtures::mock_source("document", &MockConverter::new("a-b", &["a"], &["b"])),
        fixtures::mock_source("document", &MockConverter::new("b-c", &["b"], &["c"])),
        fixtures::mock_source("document", &MockConverter::new("c-d", &["c"], &["d"])),
        fixtures::mock_source("image", &MockConverter::new("png-jpg", &["png"], &["jpg"])),
    ];
    let (engine, report) = ConversionEngine::bootstrap(&config, sources).unwrap();

    assert_eq!(report.registered.len(), 3);
    assert_eq!(report.disabled, 1);
    assert_eq!(engine.config().max_chain_length, Some(2));

    let reachable = &engine.supported_conversions()[&Format::new("a")];
    assert!(reachable.contains(&Format::new("c")));
    assert!(!reachable.contains(&Format::new("d")));
}

#[cfg(unix)]
#[tokio::test]
async fn test_command_converter_from_config() {
    let dir = TempDir::new().unwrap();
    let toml = format!(
        r#"
temp_dir = "{}"

[[command_converters]]
name = "copy-backup"
category = "utility"
program = "cp"
args = ["{{input}}", "{{output}}"]
inputs = ["txt"]
outputs = ["bak"]
"#,
        dir.path().join("work").display()
    );
    let config = load_config_from_str(&toml).unwrap();
    validate_config(&config).unwrap();

    let (engine, report) = ConversionEngine::bootstrap(&config, Vec::new()).unwrap();
    assert_eq!(report.registered, vec!["copy-backup"]);

    let input = fixtures::write_file(dir.path(), "notes.txt", "remember the milk");
    let output = dir.path().join("notes.bak");
    let result = engine
        .convert(ConversionRequest::new(&input, &output))
        .await
        .unwrap();

    assert_eq!(std::fs::read_to_string(&output).unwrap(), "remember the milk");
    assert_eq!(result.step_metadata[0]["exit_code"], serde_json::json!(0));
    assert_eq!(fixtures::workspace_residue(&dir.path().join("work")), 0);
}

#[test]
fn test_bootstrap_rejects_invalid_config() {
    let map = serde_json::json!({ "maxChainLength": 0 });
    let config = config_from_map(map.as_object().unwrap()).unwrap();

    let result = ConversionEngine::bootstrap(&config, Vec::new());
    assert!(matches!(result, Err(ConfigError::ValidationError(_))));

    let config = Config {
        max_file_size_mb: -1.0,
        ..Config::default()
    };
    assert!(ConversionEngine::bootstrap(&config, Vec::new()).is_err());
}
