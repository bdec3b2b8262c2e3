//! Integration tests for configuration loading and validation

use modelmux_core::config::{
    load_from_json, load_from_yaml, ConfigError, ValidationErrorKind, DEFAULT_MAX_TOKENS_CEILING,
};
use modelmux_core::providers::ProviderRegistry;
use modelmux_core::routing::CompletionRouter;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

/// Helper to create a test config file
fn create_test_file(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path
}

#[test]
fn test_load_valid_yaml_config() {
    std::env::set_var("MODELMUX_TEST_HISTORY_TOKEN", "history-secret");

    let yaml = r#"
version: "0.1"
default_provider: anthropic
default_model: claude-3-5-haiku
cost_optimization:
  enabled: true
  cheap_tasks: [summarize]
  expensive_tasks: [plan]
  cheap_model: llama3.1
fallback:
  providers: [anthropic, openai, ollama]
timeouts:
  provider_timeout_ms: 30000
usage:
  endpoint: https://history.example.com/v1/usage
  api_key: ${MODELMUX_TEST_HISTORY_TOKEN}
pricing:
  - provider: anthropic
    model: claude-3-5-haiku
    input_per_1k: 0.0008
    output_per_1k: 0.004
"#;

    let dir = TempDir::new().unwrap();
    let path = create_test_file(&dir, "router.yaml", yaml);
    let config = load_from_yaml(&path).unwrap();

    assert_eq!(config.default_provider, "anthropic");
    assert_eq!(config.max_tokens_ceiling, DEFAULT_MAX_TOKENS_CEILING);
    assert!(config.fallback.enabled);
    assert_eq!(config.fallback.providers.len(), 3);
    assert_eq!(config.timeouts.provider_timeout_ms, 30_000);
    assert_eq!(config.timeouts.stream_idle_timeout_ms, 60_000);
    assert_eq!(config.cost_optimization.cheap_model, "llama3.1");
    assert_eq!(
        config.usage.api_key.as_ref().map(|k| k.expose_secret()),
        Some("history-secret")
    );

    // The secret never shows up in debug output
    assert!(!format!("{:?}", config).contains("history-secret"));

    let router = CompletionRouter::from_config(config, ProviderRegistry::new()).unwrap();
    assert_eq!(router.config().default_model, "claude-3-5-haiku");
}

#[test]
fn test_load_valid_json_config() {
    let json = r#"{
        "version": "0.1",
        "default_provider": "openai",
        "default_model": "gpt-4o-mini",
        "max_tokens_ceiling": 8192,
        "fallback": { "enabled": false }
    }"#;

    let dir = TempDir::new().unwrap();
    let path = create_test_file(&dir, "router.json", json);
    let config = load_from_json(&path).unwrap();

    assert_eq!(config.max_tokens_ceiling, 8192);
    assert!(!config.fallback.enabled);
    assert!(config.usage.endpoint.is_none());
}

#[test]
fn test_missing_file() {
    let err = load_from_yaml("/nonexistent/router.yaml").unwrap_err();
    assert!(matches!(err, ConfigError::IoError { .. }));
}

#[test]
fn test_missing_env_var() {
    let yaml = r#"
version: "0.1"
default_provider: openai
default_model: gpt-4o-mini
usage:
  endpoint: https://history.example.com
  api_key: ${MODELMUX_TEST_DEFINITELY_UNSET}
"#;

    let dir = TempDir::new().unwrap();
    let path = create_test_file(&dir, "router.yaml", yaml);

    match load_from_yaml(&path) {
        Err(ConfigError::EnvVarNotFound { var }) => {
            assert_eq!(var, "MODELMUX_TEST_DEFINITELY_UNSET");
        }
        other => panic!("expected EnvVarNotFound, got {:?}", other),
    }
}

#[test]
fn test_invalid_version() {
    let yaml = r#"
version: "2.0"
default_provider: openai
default_model: gpt-4o-mini
"#;

    let dir = TempDir::new().unwrap();
    let path = create_test_file(&dir, "router.yaml", yaml);

    match load_from_yaml(&path) {
        Err(ConfigError::ValidationError(e)) => {
            assert_eq!(e.field_path, "version");
            assert!(matches!(e.kind, ValidationErrorKind::InvalidVersion { .. }));
        }
        other => panic!("expected validation error, got {:?}", other),
    }
}

#[test]
fn test_duplicate_fallback_provider() {
    let yaml = r#"
version: "0.1"
default_provider: openai
default_model: gpt-4o-mini
fallback:
  providers: [openai, anthropic, openai]
"#;

    let dir = TempDir::new().unwrap();
    let path = create_test_file(&dir, "router.yaml", yaml);

    match load_from_yaml(&path) {
        Err(ConfigError::ValidationError(e)) => {
            assert_eq!(e.field_path, "fallback.providers[2]");
            assert!(matches!(e.kind, ValidationErrorKind::DuplicateValue { .. }));
        }
        other => panic!("expected validation error, got {:?}", other),
    }
}

#[test]
fn test_invalid_usage_endpoint() {
    let yaml = r#"
version: "0.1"
default_provider: openai
default_model: gpt-4o-mini
usage:
  endpoint: ftp://history.example.com
"#;

    let dir = TempDir::new().unwrap();
    let path = create_test_file(&dir, "router.yaml", yaml);

    match load_from_yaml(&path) {
        Err(ConfigError::ValidationError(e)) => {
            assert_eq!(e.field_path, "usage.endpoint");
            assert!(matches!(e.kind, ValidationErrorKind::InvalidUrl { .. }));
        }
        other => panic!("expected validation error, got {:?}", other),
    }
}

#[test]
fn test_task_type_in_both_lists() {
    let yaml = r#"
version: "0.1"
default_provider: openai
default_model: gpt-4o-mini
cost_optimization:
  enabled: true
  cheap_tasks: [summarize, classify]
  expensive_tasks: [plan, classify]
"#;

    let dir = TempDir::new().unwrap();
    let path = create_test_file(&dir, "router.yaml", yaml);

    match load_from_yaml(&path) {
        Err(ConfigError::ValidationError(e)) => {
            assert_eq!(e.field_path, "cost_optimization.expensive_tasks[1]");
        }
        other => panic!("expected validation error, got {:?}", other),
    }
}
