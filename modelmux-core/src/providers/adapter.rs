//! Provider contract
//!
//! Defines the capability interface every backend must satisfy. Concrete
//! adapters (vendor wire formats) live outside this crate and are handed to
//! the router through a [`ProviderRegistry`](super::ProviderRegistry).

use crate::protocol::types::{CompletionRequest, LlmResponse, StreamChunk, ToolCompletionRequest};
use crate::providers::error::ProviderResult;
use async_trait::async_trait;
use futures::stream::BoxStream;

/// Sequence of chunks produced by one provider stream
///
/// A failure to open the stream is reported as its first item.
pub type ChunkStream = BoxStream<'static, ProviderResult<StreamChunk>>;

/// Approximate characters per token used by estimators
pub const CHARS_PER_TOKEN: usize = 4;

/// Core provider trait that all backends must implement
#[async_trait]
pub trait Provider: Send + Sync {
    /// Unique provider name (registry key)
    fn name(&self) -> &str;

    /// Complete a conversation (text only)
    async fn complete(&self, request: CompletionRequest) -> ProviderResult<LlmResponse>;

    /// Stream a completion chunk by chunk
    fn stream(&self, request: CompletionRequest) -> ChunkStream;

    /// Complete a conversation with tools
    async fn complete_with_tools(&self, request: ToolCompletionRequest)
        -> ProviderResult<LlmResponse>;

    /// Count tokens in a piece of text
    fn count_tokens(&self, text: &str) -> usize {
        estimate_tokens(text.chars().count())
    }

    /// Maximum output tokens the provider accepts for a model
    fn max_tokens_for_model(&self, model: &str) -> u32;

    /// Models this provider can serve
    async fn list_models(&self) -> ProviderResult<Vec<String>>;
}

/// Estimate a token count from a character count (rounded up)
pub fn estimate_tokens(chars: usize) -> usize {
    chars.div_ceil(CHARS_PER_TOKEN)
}
