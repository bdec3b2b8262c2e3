//! Routing Demo - Fallback, Streaming and Cost Attribution
//!
//! This example wires two in-process providers into a router:
//! - "local" fails every call, and its streams break after two chunks
//! - "echo" answers by echoing the last user message
//!
//! Run with: RUST_LOG=modelmux_core=debug cargo run --example routing_demo

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use modelmux_core::config::{PricingEntry, RouterConfig};
use modelmux_core::protocol::{
    CompletionRequest, LlmResponse, Message, StreamChunk, ToolCompletionRequest, Usage,
};
use modelmux_core::providers::{ChunkStream, Provider, ProviderError, ProviderResult};
use modelmux_core::{CompletionRouter, ProviderRegistry};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Provider that is always broken
struct FlakyProvider;

#[async_trait]
impl Provider for FlakyProvider {
    fn name(&self) -> &str {
        "local"
    }

    async fn complete(&self, _request: CompletionRequest) -> ProviderResult<LlmResponse> {
        Err(ProviderError::Unavailable("model is still loading".into()))
    }

    fn stream(&self, _request: CompletionRequest) -> ChunkStream {
        stream::iter(vec![
            Ok(StreamChunk::text("half an ")),
            Ok(StreamChunk::text("answ")),
            Err(ProviderError::Network("connection reset by peer".into())),
        ])
        .boxed()
    }

    async fn complete_with_tools(
        &self,
        _request: ToolCompletionRequest,
    ) -> ProviderResult<LlmResponse> {
        Err(ProviderError::InvalidRequest("tools are not supported".into()))
    }

    fn max_tokens_for_model(&self, _model: &str) -> u32 {
        2048
    }

    async fn list_models(&self) -> ProviderResult<Vec<String>> {
        Err(ProviderError::Unavailable("model is still loading".into()))
    }
}

/// Provider that repeats the last user message
struct EchoProvider;

impl EchoProvider {
    fn reply(request: &CompletionRequest) -> String {
        let last = request
            .messages
            .iter()
            .rev()
            .find_map(|m| m.content.as_text())
            .unwrap_or_default();
        format!("You said: {}", last)
    }
}

#[async_trait]
impl Provider for EchoProvider {
    fn name(&self) -> &str {
        "echo"
    }

    async fn complete(&self, request: CompletionRequest) -> ProviderResult<LlmResponse> {
        let content = Self::reply(&request);
        let prompt_tokens: usize = request
            .messages
            .iter()
            .filter_map(|m| m.content.as_text())
            .map(|text| self.count_tokens(text))
            .sum();
        let usage = Usage::new(prompt_tokens as u32, self.count_tokens(&content) as u32);
        Ok(LlmResponse::text(content, "echo-1").with_usage(usage))
    }

    fn stream(&self, request: CompletionRequest) -> ChunkStream {
        let reply = Self::reply(&request);
        let mut chunks: Vec<ProviderResult<StreamChunk>> = reply
            .split_inclusive(' ')
            .map(|word| Ok(StreamChunk::text(word)))
            .collect();
        chunks.push(Ok(StreamChunk::done(None)));
        stream::iter(chunks).boxed()
    }

    async fn complete_with_tools(
        &self,
        request: ToolCompletionRequest,
    ) -> ProviderResult<LlmResponse> {
        self.complete(request.request).await
    }

    fn max_tokens_for_model(&self, _model: &str) -> u32 {
        8192
    }

    async fn list_models(&self) -> ProviderResult<Vec<String>> {
        Ok(vec!["echo-1".into(), "echo-2".into()])
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    println!("\n🚀 ModelMux Routing Demo\n");

    let config = RouterConfig::new("local", "echo-1")
        .with_fallback(vec!["local".into(), "echo".into()])
        .with_max_tokens_ceiling(1024)
        .with_pricing(PricingEntry {
            provider: Some("echo".into()),
            model: "echo-1".into(),
            input_per_1k: 0.25,
            output_per_1k: 1.25,
        });

    let registry = ProviderRegistry::builder()
        .provider(Arc::new(FlakyProvider))
        .provider(Arc::new(EchoProvider))
        .build();
    let router = CompletionRouter::new(config, registry);

    // Example 1: non-streaming fallback
    println!("📝 Example 1: Non-streaming request");
    let request = CompletionRequest::new(vec![
        Message::system("You are a parrot"),
        Message::user("What is a monad?"),
    ]);
    let response = router.route(request, None).await?;
    println!("  Content: {}", response.content);
    if let Some(cost) = &response.cost {
        println!(
            "  Cost:    {:.6} {} charged to {} ({} + {} tokens)",
            cost.total_cost, cost.currency, cost.provider, cost.prompt_tokens, cost.completion_tokens
        );
    }

    // Example 2: streaming fallback never mixes output
    println!("\n📡 Example 2: Streaming request");
    let request = CompletionRequest::new(vec![Message::user("stream this back to me")]);
    let mut stream = router.route_stream(request, None)?;
    print!("  Chunks: ");
    while let Some(chunk) = stream.next().await {
        if let Some(text) = chunk?.content {
            print!("[{}]", text);
        }
    }
    println!();

    if let Some(summary) = stream.finish().await {
        println!(
            "  Served by {} (fallback: {}, failed first: {})",
            summary.meta.active_provider,
            summary.meta.is_fallback,
            summary.meta.failed_provider.as_deref().unwrap_or("-")
        );
        println!(
            "  Usage:   {} tokens{}",
            summary.usage.total_tokens,
            if summary.usage_estimated { " (estimated)" } else { "" }
        );
    }

    // Example 3: introspection
    println!("\n🔎 Example 3: Provider availability");
    for info in router.get_providers().await {
        let status = if info.available { "✅" } else { "❌" };
        println!("  {} {:<6} {:?}", status, info.name, info.models);
    }

    println!();
    Ok(())
}
