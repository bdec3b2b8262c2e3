//! Candidate lists and the non-streaming fallback executor

use crate::config::FallbackPolicy;
use crate::protocol::types::LlmResponse;
use crate::providers::{Provider, ProviderError, ProviderRegistry, ProviderResult};
use crate::routing::error::{RouterError, RouterResult};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Ordered providers attempted for one logical request
///
/// The selected provider comes first, followed by the configured fallback
/// names in order. Duplicates and unregistered names are skipped. With
/// fallback disabled the list holds only the selected provider.
#[derive(Clone)]
pub struct CandidateList {
    providers: Vec<Arc<dyn Provider>>,
    fallback_enabled: bool,
}

impl CandidateList {
    /// Build the candidate list for a selected provider
    pub fn build(
        selected: Arc<dyn Provider>,
        registry: &ProviderRegistry,
        policy: &FallbackPolicy,
    ) -> Self {
        let mut providers = vec![selected];

        if policy.enabled {
            for name in &policy.providers {
                if providers.iter().any(|p| p.name() == name) {
                    continue;
                }
                match registry.get(name) {
                    Some(provider) => providers.push(provider),
                    None => debug!(provider = %name, "Fallback provider not registered; skipping"),
                }
            }
        }

        Self {
            providers,
            fallback_enabled: policy.enabled,
        }
    }

    /// Whether candidates after the first may be attempted
    pub fn fallback_enabled(&self) -> bool {
        self.fallback_enabled
    }

    /// The selected provider
    pub fn selected(&self) -> &Arc<dyn Provider> {
        &self.providers[0]
    }

    /// Candidates in attempt order
    pub fn providers(&self) -> &[Arc<dyn Provider>] {
        &self.providers
    }

    /// Candidate names in attempt order
    pub fn names(&self) -> Vec<String> {
        self.providers.iter().map(|p| p.name().to_string()).collect()
    }
}

/// Bound a provider call, mapping expiry to `ProviderError::Timeout`
pub async fn with_timeout<T, F>(limit: Duration, call: F) -> ProviderResult<T>
where
    F: Future<Output = ProviderResult<T>>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => Err(ProviderError::Timeout(limit.as_millis() as u64)),
    }
}

/// Run a non-streaming call against each candidate until one succeeds
///
/// Returns the serving provider along with its response. With fallback
/// disabled only the selected provider is called and its error propagates
/// as `RouterError::Provider`.
pub async fn execute<F, Fut>(
    candidates: &CandidateList,
    attempt_timeout: Duration,
    call: F,
) -> RouterResult<(Arc<dyn Provider>, LlmResponse)>
where
    F: Fn(Arc<dyn Provider>) -> Fut,
    Fut: Future<Output = ProviderResult<LlmResponse>>,
{
    if !candidates.fallback_enabled() {
        let provider = Arc::clone(candidates.selected());
        let response = with_timeout(attempt_timeout, call(Arc::clone(&provider))).await?;
        return Ok((provider, response));
    }

    let mut attempted = Vec::with_capacity(candidates.providers().len());
    let mut last_error = None;

    for (idx, provider) in candidates.providers().iter().enumerate() {
        let name = provider.name().to_string();
        attempted.push(name.clone());

        match with_timeout(attempt_timeout, call(Arc::clone(provider))).await {
            Ok(response) => {
                if idx > 0 {
                    info!(
                        provider = %name,
                        failed_provider = %attempted[0],
                        attempts = idx + 1,
                        "Request served by fallback provider"
                    );
                }
                return Ok((Arc::clone(provider), response));
            }
            Err(e) => {
                warn!(provider = %name, error = %e, "Provider attempt failed");
                last_error = Some(e);
            }
        }
    }

    let last_error = last_error
        .unwrap_or_else(|| ProviderError::Other("no candidate providers".to_string()));
    error!(attempted = ?attempted, error = %last_error, "All providers failed");
    Err(RouterError::AllProvidersFailed {
        attempted,
        last_error,
    })
}
