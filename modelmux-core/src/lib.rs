//! ModelMux Core Library
//!
//! Routes text-completion requests across interchangeable LLM providers:
//! picks a provider per request, enforces a token budget, falls back to other
//! providers on failure (including mid-stream, without mixing output) and
//! attributes cost to whichever provider actually served the request.
//!
//! Provider adapters are supplied by the embedding application through the
//! [`Provider`] trait and collected in a [`ProviderRegistry`].

pub mod config;
pub mod cost;
pub mod protocol;
pub mod providers;
pub mod routing;
pub mod usage;

pub use config::RouterConfig;
pub use cost::{CostResult, PricingCatalog, PricingTable};
pub use protocol::{CompletionRequest, LlmResponse, StreamChunk, ToolCompletionRequest, Usage};
pub use providers::{Provider, ProviderError, ProviderRegistry};
pub use routing::{
    CompletionRouter, ProviderInfo, RoutedStream, RouterError, StreamFallbackMeta, StreamSummary,
};
pub use usage::{HttpUsageSink, UsageRecord, UsageSink};

/// Returns the version of the ModelMux Core library.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
