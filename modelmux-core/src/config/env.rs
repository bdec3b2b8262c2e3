//! Environment variable interpolation for configuration

use super::error::ConfigError;
use super::schema::RouterConfig;
use super::secrets::SecretString;
use regex::Regex;
use std::env;
use std::sync::LazyLock;

pub(super) static ENV_VAR_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}").expect("valid env var pattern"));

/// Interpolate environment variables in a configuration string
///
/// Fails on the first referenced variable that is not set.
pub fn interpolate_env_vars(content: &str) -> Result<String, ConfigError> {
    let mut missing = None;
    let result = ENV_VAR_PATTERN.replace_all(content, |cap: &regex::Captures<'_>| {
        match env::var(&cap[1]) {
            Ok(value) => value,
            Err(_) => {
                missing.get_or_insert_with(|| cap[1].to_string());
                String::new()
            }
        }
    });

    match missing {
        Some(var) => Err(ConfigError::EnvVarNotFound { var }),
        None => Ok(result.into_owned()),
    }
}

/// Interpolate environment variables in the secret-bearing fields of a loaded
/// config. Values that arrive through deserialization of already-interpolated
/// text pass through unchanged.
pub fn interpolate_config_env_vars(config: &mut RouterConfig) -> Result<(), ConfigError> {
    if let Some(endpoint) = &config.usage.endpoint {
        if ENV_VAR_PATTERN.is_match(endpoint) {
            config.usage.endpoint = Some(interpolate_env_vars(endpoint)?);
        }
    }

    if let Some(api_key) = &config.usage.api_key {
        let raw = api_key.expose_secret();
        if ENV_VAR_PATTERN.is_match(raw) {
            config.usage.api_key = Some(SecretString::new(interpolate_env_vars(raw)?));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interpolate_env_vars() {
        env::set_var("MODELMUX_TEST_VAR", "test_value");

        let content = "api_key: ${MODELMUX_TEST_VAR}";
        let result = interpolate_env_vars(content).unwrap();
        assert_eq!(result, "api_key: test_value");

        env::remove_var("MODELMUX_TEST_VAR");
    }

    #[test]
    fn test_missing_env_var() {
        let content = "api_key: ${MODELMUX_MISSING_VAR}";
        let result = interpolate_env_vars(content);

        match result {
            Err(ConfigError::EnvVarNotFound { var }) => assert_eq!(var, "MODELMUX_MISSING_VAR"),
            other => panic!("Expected EnvVarNotFound error, got {:?}", other),
        }
    }

    #[test]
    fn test_multiple_env_vars() {
        env::set_var("MODELMUX_VAR1", "value1");
        env::set_var("MODELMUX_VAR2", "value2");

        let content = "key1: ${MODELMUX_VAR1}, key2: ${MODELMUX_VAR2}";
        let result = interpolate_env_vars(content).unwrap();
        assert_eq!(result, "key1: value1, key2: value2");

        env::remove_var("MODELMUX_VAR1");
        env::remove_var("MODELMUX_VAR2");
    }

    #[test]
    fn test_config_fields_interpolated() {
        env::set_var("MODELMUX_USAGE_KEY", "sk-usage-secret-key");

        let mut config = RouterConfig::new("openai", "gpt-4o-mini");
        config.usage.api_key = Some(SecretString::new("${MODELMUX_USAGE_KEY}"));
        interpolate_config_env_vars(&mut config).unwrap();

        assert_eq!(
            config.usage.api_key.as_ref().map(|k| k.expose_secret()),
            Some("sk-usage-secret-key")
        );

        env::remove_var("MODELMUX_USAGE_KEY");
    }
}
