//! Configuration schema structures with serde support

use super::error::{ValidationError, ValidationErrorKind};
use super::secrets::SecretString;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Ceiling applied to `max_tokens` when none is configured
pub const DEFAULT_MAX_TOKENS_CEILING: u32 = 32_768;

/// Root router configuration
///
/// Constructed once at startup and never mutated afterwards.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RouterConfig {
    /// Schema version (required - no default)
    pub version: String,

    /// Provider used when neither the model nor the task type decides
    pub default_provider: String,

    /// Model filled into requests that do not name one
    pub default_model: String,

    /// Upper bound for `max_tokens` on every outgoing request
    #[serde(default = "default_ceiling")]
    pub max_tokens_ceiling: u32,

    /// `max_tokens` used when the caller leaves it unset
    #[serde(default = "default_max_tokens")]
    pub default_max_tokens: u32,

    /// Task-type driven model selection
    #[serde(default)]
    pub cost_optimization: CostOptimizationPolicy,

    /// Cross-provider fallback
    #[serde(default)]
    pub fallback: FallbackPolicy,

    /// Timeouts applied around provider calls
    #[serde(default)]
    pub timeouts: TimeoutConfig,

    /// Usage-history submission
    #[serde(default)]
    pub usage: UsageConfig,

    /// Per-model pricing rows
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pricing: Vec<PricingEntry>,
}

/// Cost-optimization policy
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CostOptimizationPolicy {
    /// Whether task-type hints influence selection
    #[serde(default)]
    pub enabled: bool,

    /// Task types served by the cheap model
    #[serde(default)]
    pub cheap_tasks: Vec<String>,

    /// Task types served by the expensive model
    #[serde(default)]
    pub expensive_tasks: Vec<String>,

    /// Model id used for cheap tasks
    #[serde(default = "default_cheap_model")]
    pub cheap_model: String,

    /// Model id used for expensive tasks
    #[serde(default = "default_expensive_model")]
    pub expensive_model: String,
}

impl Default for CostOptimizationPolicy {
    fn default() -> Self {
        Self {
            enabled: false,
            cheap_tasks: Vec::new(),
            expensive_tasks: Vec::new(),
            cheap_model: default_cheap_model(),
            expensive_model: default_expensive_model(),
        }
    }
}

/// Fallback policy configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct FallbackPolicy {
    /// Enable fallback to other providers
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Provider names tried after the selected one, in order
    #[serde(default)]
    pub providers: Vec<String>,
}

impl Default for FallbackPolicy {
    fn default() -> Self {
        Self {
            enabled: true,
            providers: Vec::new(),
        }
    }
}

/// Timeout configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TimeoutConfig {
    /// Bound on one non-streaming provider attempt, in milliseconds
    #[serde(default = "default_provider_timeout")]
    pub provider_timeout_ms: u64,

    /// Bound on the wait for the next stream chunk, in milliseconds
    #[serde(default = "default_stream_idle_timeout")]
    pub stream_idle_timeout_ms: u64,

    /// Bound on one provider's model listing, in milliseconds
    #[serde(default = "default_introspection_timeout")]
    pub introspection_timeout_ms: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            provider_timeout_ms: default_provider_timeout(),
            stream_idle_timeout_ms: default_stream_idle_timeout(),
            introspection_timeout_ms: default_introspection_timeout(),
        }
    }
}

/// Usage-history endpoint configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct UsageConfig {
    /// Endpoint receiving usage records; no submission when absent
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Bearer token (supports environment variable interpolation)
    #[serde(default)]
    pub api_key: Option<SecretString>,

    /// HTTP timeout for one submission, in milliseconds
    #[serde(default = "default_usage_timeout")]
    pub timeout_ms: u64,
}

impl Default for UsageConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            api_key: None,
            timeout_ms: default_usage_timeout(),
        }
    }
}

/// One pricing row
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct PricingEntry {
    /// Provider this price applies to; any provider when absent
    #[serde(default)]
    pub provider: Option<String>,

    /// Model identifier
    pub model: String,

    /// Cost per 1K input tokens (in USD)
    pub input_per_1k: f64,

    /// Cost per 1K output tokens (in USD)
    pub output_per_1k: f64,
}

// Default value functions for serde
fn default_true() -> bool { true }
fn default_ceiling() -> u32 { DEFAULT_MAX_TOKENS_CEILING }
fn default_max_tokens() -> u32 { 4096 }
fn default_cheap_model() -> String { "gpt-4o-mini".to_string() }
fn default_expensive_model() -> String { "claude-sonnet-4-20250514".to_string() }
fn default_provider_timeout() -> u64 { 120_000 }
fn default_stream_idle_timeout() -> u64 { 60_000 }
fn default_introspection_timeout() -> u64 { 5_000 }
fn default_usage_timeout() -> u64 { 5_000 }

impl RouterConfig {
    /// Minimal configuration with defaults for everything optional
    pub fn new(default_provider: impl Into<String>, default_model: impl Into<String>) -> Self {
        Self {
            version: "0.1".to_string(),
            default_provider: default_provider.into(),
            default_model: default_model.into(),
            max_tokens_ceiling: default_ceiling(),
            default_max_tokens: default_max_tokens(),
            cost_optimization: CostOptimizationPolicy::default(),
            fallback: FallbackPolicy::default(),
            timeouts: TimeoutConfig::default(),
            usage: UsageConfig::default(),
            pricing: Vec::new(),
        }
    }

    /// Set the fallback order and enable fallback
    pub fn with_fallback(mut self, providers: Vec<String>) -> Self {
        self.fallback = FallbackPolicy {
            enabled: true,
            providers,
        };
        self
    }

    /// Disable fallback
    pub fn without_fallback(mut self) -> Self {
        self.fallback.enabled = false;
        self
    }

    /// Set the cost-optimization policy
    pub fn with_cost_optimization(mut self, policy: CostOptimizationPolicy) -> Self {
        self.cost_optimization = policy;
        self
    }

    /// Set the max-tokens ceiling
    pub fn with_max_tokens_ceiling(mut self, ceiling: u32) -> Self {
        self.max_tokens_ceiling = ceiling;
        self
    }

    /// Set the timeouts
    pub fn with_timeouts(mut self, timeouts: TimeoutConfig) -> Self {
        self.timeouts = timeouts;
        self
    }

    /// Add a pricing row
    pub fn with_pricing(mut self, entry: PricingEntry) -> Self {
        self.pricing.push(entry);
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.version.is_empty() {
            return Err(ValidationError::required("version"));
        }

        if self.version != "0.1" {
            return Err(ValidationError::new(
                "version",
                ValidationErrorKind::InvalidVersion {
                    expected: "0.1".to_string(),
                    actual: self.version.clone(),
                },
            ));
        }

        if self.default_provider.is_empty() {
            return Err(ValidationError::required("default_provider"));
        }

        if self.default_model.is_empty() {
            return Err(ValidationError::required("default_model"));
        }

        if self.max_tokens_ceiling == 0 {
            return Err(ValidationError::not_positive("max_tokens_ceiling"));
        }

        if self.default_max_tokens == 0 {
            return Err(ValidationError::not_positive("default_max_tokens"));
        }

        self.cost_optimization.validate("cost_optimization")?;
        self.fallback.validate("fallback")?;
        self.timeouts.validate("timeouts")?;
        self.usage.validate("usage")?;

        let mut seen = HashSet::new();
        for (i, entry) in self.pricing.iter().enumerate() {
            let path = format!("pricing[{}]", i);
            entry.validate(&path)?;
            if !seen.insert((entry.provider.as_deref(), entry.model.as_str())) {
                return Err(ValidationError::duplicate(
                    format!("{}.model", path),
                    &entry.model,
                ));
            }
        }

        Ok(())
    }
}

impl CostOptimizationPolicy {
    /// Validate cost-optimization settings
    pub fn validate(&self, path: &str) -> Result<(), ValidationError> {
        if !self.enabled {
            return Ok(());
        }

        if self.cheap_model.is_empty() {
            return Err(ValidationError::required(format!("{}.cheap_model", path))
                .with_context("Required when cost optimization is enabled"));
        }

        if self.expensive_model.is_empty() {
            return Err(ValidationError::required(format!("{}.expensive_model", path))
                .with_context("Required when cost optimization is enabled"));
        }

        Ok(())
    }

    /// Whether a task type is routed to the cheap model
    pub fn is_cheap(&self, task_type: &str) -> bool {
        self.cheap_tasks.iter().any(|t| t == task_type)
    }

    /// Whether a task type is routed to the expensive model
    pub fn is_expensive(&self, task_type: &str) -> bool {
        self.expensive_tasks.iter().any(|t| t == task_type)
    }
}

impl FallbackPolicy {
    /// Validate fallback settings
    pub fn validate(&self, path: &str) -> Result<(), ValidationError> {
        let mut seen = HashSet::new();
        for (i, name) in self.providers.iter().enumerate() {
            if name.is_empty() {
                return Err(ValidationError::required(format!("{}.providers[{}]", path, i)));
            }
            if !seen.insert(name) {
                return Err(ValidationError::duplicate(
                    format!("{}.providers[{}]", path, i),
                    name,
                ));
            }
        }
        Ok(())
    }
}

impl TimeoutConfig {
    /// Validate timeouts
    pub fn validate(&self, path: &str) -> Result<(), ValidationError> {
        let fields = [
            ("provider_timeout_ms", self.provider_timeout_ms),
            ("stream_idle_timeout_ms", self.stream_idle_timeout_ms),
            ("introspection_timeout_ms", self.introspection_timeout_ms),
        ];
        for (name, value) in fields {
            if value == 0 {
                return Err(ValidationError::not_positive(format!("{}.{}", path, name)));
            }
        }
        Ok(())
    }
}

impl UsageConfig {
    /// Validate usage endpoint settings
    pub fn validate(&self, path: &str) -> Result<(), ValidationError> {
        if self.timeout_ms == 0 {
            return Err(ValidationError::not_positive(format!("{}.timeout_ms", path)));
        }

        let Some(endpoint) = &self.endpoint else {
            return Ok(());
        };

        let url = url::Url::parse(endpoint)
            .map_err(|e| ValidationError::invalid_url(format!("{}.endpoint", path), e.to_string()))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ValidationError::invalid_url(
                format!("{}.endpoint", path),
                format!("scheme must be http or https, got '{}'", url.scheme()),
            ));
        }

        Ok(())
    }
}

impl PricingEntry {
    /// Validate a pricing row
    pub fn validate(&self, path: &str) -> Result<(), ValidationError> {
        if self.model.is_empty() {
            return Err(ValidationError::required(format!("{}.model", path)));
        }

        if self.input_per_1k < 0.0 {
            return Err(ValidationError::out_of_range(
                format!("{}.input_per_1k", path),
                "must not be negative",
            ));
        }

        if self.output_per_1k < 0.0 {
            return Err(ValidationError::out_of_range(
                format!("{}.output_per_1k", path),
                "must not be negative",
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config_is_valid() {
        let config = RouterConfig::new("openai", "gpt-4o-mini");
        assert!(config.validate().is_ok());
        assert_eq!(config.max_tokens_ceiling, DEFAULT_MAX_TOKENS_CEILING);
        assert!(config.fallback.enabled);
    }

    #[test]
    fn test_duplicate_fallback_provider_rejected() {
        let config = RouterConfig::new("openai", "gpt-4o-mini")
            .with_fallback(vec!["openai".to_string(), "openai".to_string()]);
        let err = config.validate().unwrap_err();
        assert_eq!(err.field_path, "fallback.providers[1]");
    }

    #[test]
    fn test_usage_endpoint_must_be_http() {
        let mut config = RouterConfig::new("openai", "gpt-4o-mini");
        config.usage.endpoint = Some("ftp://usage.example.com".to_string());
        let err = config.validate().unwrap_err();
        assert_eq!(err.field_path, "usage.endpoint");
    }

    #[test]
    fn test_negative_price_rejected() {
        let config = RouterConfig::new("openai", "gpt-4o-mini").with_pricing(PricingEntry {
            provider: None,
            model: "gpt-4o-mini".to_string(),
            input_per_1k: -0.1,
            output_per_1k: 0.6,
        });
        let err = config.validate().unwrap_err();
        assert_eq!(err.field_path, "pricing[0].input_per_1k");
    }

    #[test]
    fn test_task_membership() {
        let policy = CostOptimizationPolicy {
            enabled: true,
            cheap_tasks: vec!["summarize".to_string()],
            expensive_tasks: vec!["plan".to_string()],
            ..Default::default()
        };
        assert!(policy.is_cheap("summarize"));
        assert!(!policy.is_cheap("plan"));
        assert!(policy.is_expensive("plan"));
    }
}
