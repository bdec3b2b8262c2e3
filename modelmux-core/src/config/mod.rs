//! Configuration module for the completion router
//!
//! This module provides the router configuration schema, file loading with
//! environment interpolation, and validation.

mod env;
mod error;
mod schema;
mod secrets;
mod validator;

pub use error::{ConfigError, ConfigResult, ValidationError, ValidationErrorKind};
pub use schema::{
    CostOptimizationPolicy, FallbackPolicy, PricingEntry, RouterConfig, TimeoutConfig,
    UsageConfig, DEFAULT_MAX_TOKENS_CEILING,
};
pub use secrets::SecretString;
pub use validator::ConfigValidator;

use std::fs;
use std::path::Path;

/// Load a configuration from a YAML file
pub fn load_from_yaml<P: AsRef<Path>>(path: P) -> ConfigResult<RouterConfig> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|e| ConfigError::IoError {
        path: path.to_string_lossy().to_string(),
        source: e,
    })?;
    from_yaml_str(&content, &path.to_string_lossy())
}

/// Load a configuration from a JSON file
pub fn load_from_json<P: AsRef<Path>>(path: P) -> ConfigResult<RouterConfig> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|e| ConfigError::IoError {
        path: path.to_string_lossy().to_string(),
        source: e,
    })?;
    from_json_str(&content, &path.to_string_lossy())
}

/// Parse and validate a YAML configuration held in memory
///
/// `origin` is only used in error messages.
pub fn from_yaml_str(content: &str, origin: &str) -> ConfigResult<RouterConfig> {
    // Interpolate environment variables before parsing
    let interpolated = env::interpolate_env_vars(content)?;

    let mut config: RouterConfig =
        serde_yaml::from_str(&interpolated).map_err(|e| ConfigError::ParseError {
            path: origin.to_string(),
            line: e.location().map(|l| l.line()),
            column: e.location().map(|l| l.column()),
            message: e.to_string(),
        })?;

    finish(&mut config)?;
    Ok(config)
}

/// Parse and validate a JSON configuration held in memory
pub fn from_json_str(content: &str, origin: &str) -> ConfigResult<RouterConfig> {
    let interpolated = env::interpolate_env_vars(content)?;

    let mut config: RouterConfig =
        serde_json::from_str(&interpolated).map_err(|e| ConfigError::ParseError {
            path: origin.to_string(),
            line: Some(e.line()),
            column: Some(e.column()),
            message: e.to_string(),
        })?;

    finish(&mut config)?;
    Ok(config)
}

fn finish(config: &mut RouterConfig) -> ConfigResult<()> {
    // Additional interpolation for any remaining env vars
    env::interpolate_config_env_vars(config)?;

    ConfigValidator::new().validate(config)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_yaml() {
        let yaml = r#"
version: "0.1"
default_provider: openai
default_model: gpt-4o-mini
max_tokens_ceiling: 16384
cost_optimization:
  enabled: true
  cheap_tasks: [summarize, classify]
  expensive_tasks: [plan]
fallback:
  enabled: true
  providers: [openai, anthropic]
pricing:
  - model: gpt-4o-mini
    input_per_1k: 0.00015
    output_per_1k: 0.0006
"#;
        let config = from_yaml_str(yaml, "inline").unwrap();
        assert_eq!(config.max_tokens_ceiling, 16384);
        assert_eq!(config.default_max_tokens, 4096);
        assert_eq!(config.fallback.providers, vec!["openai", "anthropic"]);
        assert_eq!(config.cost_optimization.cheap_model, "gpt-4o-mini");
        assert_eq!(config.pricing.len(), 1);
    }

    #[test]
    fn test_unknown_field_rejected() {
        let yaml = r#"
version: "0.1"
default_provider: openai
default_model: gpt-4o-mini
strategy: round_robin
"#;
        let err = from_yaml_str(yaml, "inline").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
    }
}
