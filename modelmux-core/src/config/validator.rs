//! Configuration validation utilities

use super::env::ENV_VAR_PATTERN;
use super::error::ValidationError;
use super::schema::RouterConfig;
use tracing::warn;

/// Configuration validator with cross-field rules on top of the schema checks
#[derive(Debug, Default)]
pub struct ConfigValidator;

impl ConfigValidator {
    /// Create a new validator
    pub fn new() -> Self {
        Self
    }

    /// Validate a configuration with extended rules
    pub fn validate(&self, config: &RouterConfig) -> Result<(), ValidationError> {
        // First run the built-in validation
        config.validate()?;

        self.validate_task_lists(config)?;
        self.validate_fallback_order(config);
        self.validate_unresolved_placeholders(config)?;

        Ok(())
    }

    /// A task type cannot be both cheap and expensive
    fn validate_task_lists(&self, config: &RouterConfig) -> Result<(), ValidationError> {
        let policy = &config.cost_optimization;
        for (i, task) in policy.expensive_tasks.iter().enumerate() {
            if policy.is_cheap(task) {
                return Err(ValidationError::incompatible(
                    format!("cost_optimization.expensive_tasks[{}]", i),
                    format!("task type '{}' is also listed in cheap_tasks", task),
                ));
            }
        }
        Ok(())
    }

    /// An enabled fallback with no providers degenerates to a single attempt
    fn validate_fallback_order(&self, config: &RouterConfig) {
        if config.fallback.enabled && config.fallback.providers.is_empty() {
            warn!("Fallback is enabled but no fallback providers are configured");
        }
    }

    /// Placeholders must have been interpolated before validation
    fn validate_unresolved_placeholders(&self, config: &RouterConfig) -> Result<(), ValidationError> {
        if let Some(api_key) = &config.usage.api_key {
            if let Some(var) = self.extract_env_vars(api_key.expose_secret()).into_iter().next() {
                return Err(ValidationError::required("usage.api_key")
                    .with_context(format!("unresolved environment variable '{}'", var)));
            }
        }
        Ok(())
    }

    /// Extract environment variables from a string
    pub fn extract_env_vars(&self, text: &str) -> Vec<String> {
        ENV_VAR_PATTERN
            .captures_iter(text)
            .map(|cap| cap[1].to_string())
            .collect()
    }
}
