//! Cost attribution and usage persistence for completed requests

use crate::cost::pricing::{CostResult, PricingCatalog};
use crate::protocol::types::{CompletionRequest, LlmResponse, Usage};
use crate::providers::estimate_tokens;
use crate::usage::{submit_detached, UsageRecord, UsageSink};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Attaches cost to results and ships usage records in the background
#[derive(Clone)]
pub struct CostAccountant {
    pricing: Arc<dyn PricingCatalog>,
    sink: Option<Arc<dyn UsageSink>>,
}

/// Token usage settled for a finished stream
#[derive(Debug, Clone, PartialEq)]
pub struct StreamAccounting {
    /// Reported or estimated usage
    pub usage: Usage,
    /// True when `usage` was estimated from character counts
    pub estimated: bool,
    /// Cost computed from `usage`
    pub cost: CostResult,
}

impl CostAccountant {
    /// Create an accountant; without a sink nothing is persisted
    pub fn new(pricing: Arc<dyn PricingCatalog>, sink: Option<Arc<dyn UsageSink>>) -> Self {
        Self { pricing, sink }
    }

    /// Attach cost to a non-streaming response and persist its usage
    ///
    /// `provider` is the provider that actually served the response. An empty
    /// `response.model` is filled with `request_model` first. A record is only
    /// submitted when the provider reported usage.
    pub fn settle_response(&self, provider: &str, request_model: &str, response: &mut LlmResponse) {
        if response.model.is_empty() {
            response.model = request_model.to_string();
        }

        let usage = response.usage.unwrap_or_default();
        let cost = self.pricing.calculate_cost(
            provider,
            &response.model,
            usage.prompt_tokens,
            usage.completion_tokens,
        );

        if response.usage.is_some() {
            self.persist(&cost, false);
        } else {
            debug!(provider = %provider, model = %response.model, "No usage reported; skipping usage record");
        }

        response.cost = Some(cost);
    }

    /// Settle usage and cost for a fully delivered stream
    ///
    /// Uses the terminal chunk's usage when the provider reported it,
    /// otherwise estimates both sides from character counts.
    pub fn settle_stream(
        &self,
        provider: &str,
        model: &str,
        request: &CompletionRequest,
        emitted_text: &str,
        reported: Option<Usage>,
    ) -> StreamAccounting {
        let (usage, estimated) = match reported {
            Some(usage) => (usage, false),
            None => (estimate_usage(request, emitted_text), true),
        };

        let cost =
            self.pricing
                .calculate_cost(provider, model, usage.prompt_tokens, usage.completion_tokens);
        self.persist(&cost, estimated);

        StreamAccounting {
            usage,
            estimated,
            cost,
        }
    }

    fn persist(&self, cost: &CostResult, estimated: bool) {
        if let Some(sink) = &self.sink {
            submit_detached(Arc::clone(sink), UsageRecord::from_cost(cost, estimated));
        }
    }
}

impl fmt::Debug for CostAccountant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CostAccountant")
            .field("persists_usage", &self.sink.is_some())
            .finish()
    }
}

/// Estimate usage at roughly four characters per token
pub fn estimate_usage(request: &CompletionRequest, emitted_text: &str) -> Usage {
    let prompt_chars: usize = request.messages.iter().map(|m| m.content.text_len()).sum();
    let completion_chars = emitted_text.chars().count();

    Usage::new(
        to_u32(estimate_tokens(prompt_chars)),
        to_u32(estimate_tokens(completion_chars)),
    )
}

fn to_u32(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}
