//! The completion router
//!
//! Selects a provider, clamps the token budget, runs the request across the
//! fallback candidates and attaches cost to whatever comes back.

use crate::config::RouterConfig;
use crate::cost::{CostAccountant, PricingCatalog, PricingTable};
use crate::protocol::types::{CompletionRequest, LlmResponse, ToolCompletionRequest};
use crate::providers::{Provider, ProviderRegistry};
use crate::routing::budget;
use crate::routing::error::{RouterError, RouterResult};
use crate::routing::fallback::{self, with_timeout, CandidateList};
use crate::routing::selector::Selector;
use crate::routing::stream::{RoutedStream, StreamCall};
use crate::usage::{HttpUsageSink, UsageError, UsageSink};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// Availability of one registered provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderInfo {
    /// Provider name
    pub name: String,
    /// Whether its model listing succeeded
    pub available: bool,
    /// Models it reported; empty when unavailable
    pub models: Vec<String>,
}

/// Routes completion requests across registered providers
///
/// Holds no per-call state, so one instance may serve any number of
/// concurrent calls behind an `Arc`.
#[derive(Clone)]
pub struct CompletionRouter {
    config: Arc<RouterConfig>,
    registry: ProviderRegistry,
    pricing: Arc<dyn PricingCatalog>,
    usage_sink: Option<Arc<dyn UsageSink>>,
}

impl CompletionRouter {
    /// Create a router that prices from `config.pricing` and persists nothing
    pub fn new(config: RouterConfig, registry: ProviderRegistry) -> Self {
        let pricing = PricingTable::from_entries(&config.pricing);
        Self {
            config: Arc::new(config),
            registry,
            pricing: Arc::new(pricing),
            usage_sink: None,
        }
    }

    /// Create a router whose usage sink is built from `config.usage`
    pub fn from_config(
        config: RouterConfig,
        registry: ProviderRegistry,
    ) -> Result<Self, UsageError> {
        let sink = HttpUsageSink::from_config(&config.usage)?;
        let router = Self::new(config, registry);

        Ok(match sink {
            Some(sink) => {
                debug!(endpoint = %sink.endpoint(), "Usage history enabled");
                router.with_usage_sink(Arc::new(sink))
            }
            None => router,
        })
    }

    /// Replace the pricing catalog
    pub fn with_pricing(mut self, pricing: Arc<dyn PricingCatalog>) -> Self {
        self.pricing = pricing;
        self
    }

    /// Persist usage records to `sink`
    pub fn with_usage_sink(mut self, sink: Arc<dyn UsageSink>) -> Self {
        self.usage_sink = Some(sink);
        self
    }

    /// Register a provider after construction
    ///
    /// Needs exclusive access, so it cannot race with calls in flight.
    pub fn register_provider(&mut self, provider: Arc<dyn Provider>) {
        self.registry.register(provider);
    }

    /// Router configuration
    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    /// Registered providers
    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    /// Complete a request, falling back across providers on failure
    #[instrument(skip(self, request), fields(model = request.model().unwrap_or_default()))]
    pub async fn route(
        &self,
        mut request: CompletionRequest,
        task_type: Option<&str>,
    ) -> RouterResult<LlmResponse> {
        let candidates = self.prepare(&mut request, task_type)?;

        let (provider, mut response) =
            fallback::execute(&candidates, self.attempt_timeout(), |provider| {
                let request = request.clone();
                async move { provider.complete(request).await }
            })
            .await?;

        self.accountant().settle_response(
            provider.name(),
            request.model().unwrap_or_default(),
            &mut response,
        );
        Ok(response)
    }

    /// Complete a tool-calling request, falling back across providers on failure
    #[instrument(
        skip(self, request),
        fields(model = request.request.model().unwrap_or_default(), tools = request.tools.len())
    )]
    pub async fn route_with_tools(
        &self,
        mut request: ToolCompletionRequest,
        task_type: Option<&str>,
    ) -> RouterResult<LlmResponse> {
        let candidates = self.prepare(&mut request.request, task_type)?;

        let (provider, mut response) =
            fallback::execute(&candidates, self.attempt_timeout(), |provider| {
                let request = request.clone();
                async move { provider.complete_with_tools(request).await }
            })
            .await?;

        self.accountant().settle_response(
            provider.name(),
            request.request.model().unwrap_or_default(),
            &mut response,
        );
        Ok(response)
    }

    /// Stream a request
    ///
    /// With fallback enabled the returned stream delivers one candidate's
    /// complete output and nothing from candidates that failed part way.
    #[instrument(skip(self, request), fields(model = request.model().unwrap_or_default()))]
    pub fn route_stream(
        &self,
        mut request: CompletionRequest,
        task_type: Option<&str>,
    ) -> RouterResult<RoutedStream> {
        let candidates = self.prepare(&mut request, task_type)?;

        Ok(StreamCall {
            candidates,
            request,
            idle_timeout: Duration::from_millis(self.config.timeouts.stream_idle_timeout_ms),
            accountant: self.accountant(),
        }
        .into_stream())
    }

    /// Models of every available provider, keyed by provider name
    pub async fn get_available_models(&self) -> HashMap<String, Vec<String>> {
        self.get_providers()
            .await
            .into_iter()
            .filter(|info| info.available)
            .map(|info| (info.name, info.models))
            .collect()
    }

    /// Query every provider's models concurrently
    ///
    /// A provider whose listing fails or times out is reported unavailable
    /// without affecting the others.
    #[instrument(skip(self))]
    pub async fn get_providers(&self) -> Vec<ProviderInfo> {
        let limit = Duration::from_millis(self.config.timeouts.introspection_timeout_ms);

        let probes = self.registry.iter().map(|provider| {
            let provider = Arc::clone(provider);
            async move {
                let name = provider.name().to_string();
                match with_timeout(limit, provider.list_models()).await {
                    Ok(models) => ProviderInfo {
                        name,
                        available: true,
                        models,
                    },
                    Err(e) => {
                        warn!(provider = %name, error = %e, "Model listing failed");
                        ProviderInfo {
                            name,
                            available: false,
                            models: Vec::new(),
                        }
                    }
                }
            }
        });

        join_all(probes).await
    }

    /// Select, fill the model and clamp the budget
    fn prepare(
        &self,
        request: &mut CompletionRequest,
        task_type: Option<&str>,
    ) -> RouterResult<CandidateList> {
        let selected = Selector::new(&self.registry, &self.config)
            .select(request, task_type)
            .ok_or(RouterError::NoProviderAvailable)?;

        if request.model().is_none() {
            request.model = Some(self.config.default_model.clone());
        }
        budget::clamp(request, &self.config);

        let candidates = CandidateList::build(selected, &self.registry, &self.config.fallback);
        debug!(
            candidates = ?candidates.names(),
            model = request.model().unwrap_or_default(),
            max_tokens = ?request.max_tokens,
            "Prepared request"
        );
        Ok(candidates)
    }

    fn attempt_timeout(&self) -> Duration {
        Duration::from_millis(self.config.timeouts.provider_timeout_ms)
    }

    fn accountant(&self) -> CostAccountant {
        CostAccountant::new(Arc::clone(&self.pricing), self.usage_sink.clone())
    }
}

impl fmt::Debug for CompletionRouter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompletionRouter")
            .field("default_provider", &self.config.default_provider)
            .field("registry", &self.registry)
            .field("persists_usage", &self.usage_sink.is_some())
            .finish()
    }
}
