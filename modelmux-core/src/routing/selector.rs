//! Provider selection
//!
//! First match wins: an explicit model, then a task-type hint under cost
//! optimization, then the configured default provider, then whatever is
//! registered first.

use crate::config::RouterConfig;
use crate::protocol::types::CompletionRequest;
use crate::providers::{Provider, ProviderRegistry};
use std::sync::Arc;
use tracing::{debug, warn};

/// Aggregator that serves namespaced `vendor/model` ids
pub const AGGREGATOR_PROVIDER: &str = "openrouter";

/// Providers tried, in order, when the cheap model cannot be resolved
pub const CHEAP_PROVIDER_ORDER: &[&str] = &[
    "ollama",
    "deepseek",
    "google",
    "openai",
    "anthropic",
    "openrouter",
];

/// Providers tried, in order, when the expensive model cannot be resolved
pub const CAPABLE_PROVIDER_ORDER: &[&str] = &["anthropic", "openai", "google", "openrouter"];

/// Model-name prefixes and the provider that serves them
const PREFIX_RULES: &[(&str, &str)] = &[
    ("gpt-", "openai"),
    ("o1", "openai"),
    ("o3", "openai"),
    ("o4", "openai"),
    ("chatgpt-", "openai"),
    ("text-embedding", "openai"),
    ("claude", "anthropic"),
    ("gemini", "google"),
    ("deepseek", "deepseek"),
    ("mistral", "mistral"),
    ("mixtral", "mistral"),
    ("codestral", "mistral"),
    ("llama", "ollama"),
    ("qwen", "ollama"),
    ("phi", "ollama"),
    ("gemma", "ollama"),
    ("grok", "xai"),
];

/// Provider conventionally serving `model`, judged by name prefix alone
pub fn provider_for_prefix(model: &str) -> Option<&'static str> {
    let lower = model.to_ascii_lowercase();
    PREFIX_RULES
        .iter()
        .find(|(prefix, _)| lower.starts_with(prefix))
        .map(|&(_, provider)| provider)
}

/// Chooses the provider that should serve a request
#[derive(Debug, Clone, Copy)]
pub struct Selector<'a> {
    registry: &'a ProviderRegistry,
    config: &'a RouterConfig,
}

impl<'a> Selector<'a> {
    /// Create a selector over a registry and configuration
    pub fn new(registry: &'a ProviderRegistry, config: &'a RouterConfig) -> Self {
        Self { registry, config }
    }

    /// Resolve a model id to the name of a provider that can serve it
    ///
    /// Namespaced ids (`vendor/model`) go to the aggregator when it is
    /// registered, then to a registered provider named by the namespace, then
    /// through the prefix rules on the bare model name. The returned name is
    /// not necessarily registered.
    pub fn provider_for_model(&self, model: &str) -> Option<String> {
        if let Some((namespace, bare)) = model.split_once('/') {
            if self.registry.contains(AGGREGATOR_PROVIDER) {
                return Some(AGGREGATOR_PROVIDER.to_string());
            }
            if self.registry.contains(namespace) {
                return Some(namespace.to_string());
            }
            return provider_for_prefix(bare).map(str::to_string);
        }

        provider_for_prefix(model).map(str::to_string)
    }

    /// Select a provider, possibly filling in `request.model`
    ///
    /// `request.model` is only written when the caller left it unset and a
    /// cost-optimization rule picked the model.
    pub fn select(
        &self,
        request: &mut CompletionRequest,
        task_type: Option<&str>,
    ) -> Option<Arc<dyn Provider>> {
        if let Some(model) = request.model() {
            if let Some(provider) = self
                .provider_for_model(model)
                .and_then(|name| self.registry.get(&name))
            {
                debug!(provider = %provider.name(), model = %model, "Selected provider by model");
                return Some(provider);
            }
        }

        if let Some(provider) = task_type.and_then(|task| self.select_for_task(request, task)) {
            return Some(provider);
        }

        if let Some(provider) = self.registry.get(&self.config.default_provider) {
            debug!(provider = %provider.name(), "Selected default provider");
            return Some(provider);
        }

        let provider = self.registry.first()?;
        warn!(
            provider = %provider.name(),
            default_provider = %self.config.default_provider,
            "Default provider not registered; using first registered provider"
        );
        Some(provider)
    }

    fn select_for_task(
        &self,
        request: &mut CompletionRequest,
        task_type: &str,
    ) -> Option<Arc<dyn Provider>> {
        let policy = &self.config.cost_optimization;
        if !policy.enabled {
            return None;
        }

        let (model, preference) = if policy.is_cheap(task_type) {
            (&policy.cheap_model, CHEAP_PROVIDER_ORDER)
        } else if policy.is_expensive(task_type) {
            (&policy.expensive_model, CAPABLE_PROVIDER_ORDER)
        } else {
            return None;
        };

        let provider = self
            .provider_for_model(model)
            .and_then(|name| self.registry.get(&name))
            .or_else(|| preference.iter().find_map(|name| self.registry.get(name)))?;

        if request.model().is_none() {
            request.model = Some(model.clone());
        }

        debug!(
            provider = %provider.name(),
            task_type = %task_type,
            model = %model,
            "Selected provider by task type"
        );
        Some(provider)
    }
}
