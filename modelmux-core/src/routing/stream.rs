//! Streaming multiplexer
//!
//! With fallback enabled each candidate's stream is drained into a private
//! buffer. A failure at any point discards that buffer and moves on; only a
//! candidate that finishes cleanly has its buffer replayed to the caller.
//! Output from two providers is therefore never mixed, at the cost of
//! delivering nothing until one attempt has completed.
//!
//! With fallback disabled the selected provider's stream is forwarded chunk
//! by chunk as it arrives and its error, if any, is surfaced unchanged.
//!
//! Per-call outcome (which provider served, what was discarded, usage and
//! cost) travels with the returned [`RoutedStream`], never through shared
//! router state.

use crate::cost::{CostAccountant, CostResult};
use crate::protocol::types::{CompletionRequest, StreamChunk, Usage};
use crate::providers::{ChunkStream, Provider, ProviderError, ProviderResult};
use crate::routing::error::{DiscardedAttempt, RouterError, RouterResult};
use crate::routing::fallback::CandidateList;
use async_stream::stream;
use futures::stream::{BoxStream, Stream, StreamExt};
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::sync::oneshot;
use tracing::{debug, error, info, warn};

/// Which provider served a stream and whether it was a fallback
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamFallbackMeta {
    /// Provider whose output was delivered
    pub active_provider: String,
    /// First provider that failed before the active one, if any
    pub failed_provider: Option<String>,
    /// True when `failed_provider` is set
    pub is_fallback: bool,
}

impl StreamFallbackMeta {
    fn new(active_provider: impl Into<String>, failed_provider: Option<String>) -> Self {
        Self {
            active_provider: active_provider.into(),
            is_fallback: failed_provider.is_some(),
            failed_provider,
        }
    }
}

/// Outcome of a fully delivered stream
#[derive(Debug, Clone, PartialEq)]
pub struct StreamSummary {
    /// Serving provider and fallback details
    pub meta: StreamFallbackMeta,
    /// Reported or estimated token usage
    pub usage: Usage,
    /// True when `usage` was estimated from character counts
    pub usage_estimated: bool,
    /// Cost attributed to the serving provider
    pub cost: CostResult,
}

/// Chunk stream returned by `CompletionRouter::route_stream`
///
/// Yields the chunks of exactly one provider attempt. Once the terminal
/// chunk (or the end of the sequence) has been received,
/// [`RoutedStream::finish`] returns the call's summary.
pub struct RoutedStream {
    inner: BoxStream<'static, RouterResult<StreamChunk>>,
    summary: oneshot::Receiver<StreamSummary>,
}

impl RoutedStream {
    /// Summary of the delivered stream
    ///
    /// `None` when the stream failed or was dropped before its terminal chunk.
    pub async fn finish(self) -> Option<StreamSummary> {
        let Self { inner, summary } = self;
        drop(inner);
        summary.await.ok()
    }
}

impl Stream for RoutedStream {
    type Item = RouterResult<StreamChunk>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.poll_next_unpin(cx)
    }
}

/// Text and usage observed across delivered chunks
#[derive(Debug, Default)]
struct Delivered {
    text: String,
    usage: Option<Usage>,
}

impl Delivered {
    fn observe(&mut self, chunk: &StreamChunk) {
        if let Some(content) = &chunk.content {
            self.text.push_str(content);
        }
        if chunk.usage.is_some() {
            self.usage = chunk.usage;
        }
    }
}

/// Everything a streaming call needs, owned by the generator
pub(crate) struct StreamCall {
    pub candidates: CandidateList,
    pub request: CompletionRequest,
    pub idle_timeout: Duration,
    pub accountant: CostAccountant,
}

impl StreamCall {
    /// Start the call; nothing runs until the stream is polled
    pub fn into_stream(self) -> RoutedStream {
        let (tx, rx) = oneshot::channel();
        let inner = if self.candidates.fallback_enabled() {
            self.buffered(tx)
        } else {
            self.pass_through(tx)
        };

        RoutedStream { inner, summary: rx }
    }

    fn pass_through(
        self,
        tx: oneshot::Sender<StreamSummary>,
    ) -> BoxStream<'static, RouterResult<StreamChunk>> {
        let Self {
            candidates,
            request,
            idle_timeout,
            accountant,
        } = self;

        stream! {
            let provider = Arc::clone(candidates.selected());
            let meta = StreamFallbackMeta::new(provider.name(), None);
            let mut upstream = provider.stream(request.clone());
            let mut delivered = Delivered::default();
            let mut tx = Some(tx);

            loop {
                match next_chunk(&mut upstream, idle_timeout).await {
                    Ok(Some(chunk)) => {
                        delivered.observe(&chunk);
                        if chunk.done {
                            settle(&accountant, &request, &meta, &delivered, &mut tx);
                        }
                        yield Ok(chunk);
                    }
                    Ok(None) => break,
                    Err(e) => {
                        warn!(provider = %provider.name(), error = %e, "Stream failed with fallback disabled");
                        yield Err(RouterError::Provider(e));
                        return;
                    }
                }
            }

            // Upstream ended without a terminal chunk
            settle(&accountant, &request, &meta, &delivered, &mut tx);
        }
        .boxed()
    }

    fn buffered(
        self,
        tx: oneshot::Sender<StreamSummary>,
    ) -> BoxStream<'static, RouterResult<StreamChunk>> {
        let Self {
            candidates,
            request,
            idle_timeout,
            accountant,
        } = self;

        stream! {
            let mut attempted = Vec::new();
            let mut discarded: Vec<DiscardedAttempt> = Vec::new();
            let mut served = None;

            for provider in candidates.providers() {
                let name = provider.name().to_string();
                attempted.push(name.clone());

                match drain(provider.as_ref(), &request, idle_timeout).await {
                    Ok(buffer) => {
                        served = Some((name, buffer));
                        break;
                    }
                    Err((chunks_discarded, e)) => {
                        warn!(
                            provider = %name,
                            chunks_discarded,
                            error = %e,
                            "Stream attempt failed; discarding buffered output"
                        );
                        discarded.push(DiscardedAttempt {
                            provider: name,
                            chunks_discarded,
                            error: e,
                        });
                    }
                }
            }

            let Some((active, buffer)) = served else {
                let last_error = discarded
                    .last()
                    .map(|d| d.error.clone())
                    .unwrap_or_else(|| ProviderError::Other("no candidate providers".to_string()));
                error!(attempted = ?attempted, error = %last_error, "All providers failed to stream");
                yield Err(RouterError::StreamAllProvidersFailed {
                    attempted,
                    discarded,
                    last_error,
                });
                return;
            };

            let failed_provider = discarded.first().map(|d| d.provider.clone());
            if let Some(failed) = &failed_provider {
                info!(
                    provider = %active,
                    failed_provider = %failed,
                    chunks = buffer.len(),
                    "Stream served by fallback provider"
                );
            }

            let meta = StreamFallbackMeta::new(active, failed_provider);
            let mut delivered = Delivered::default();
            buffer.iter().for_each(|chunk| delivered.observe(chunk));

            // The buffer is complete, so settle before the final chunk leaves
            let mut tx = Some(tx);
            let last = buffer.len().saturating_sub(1);
            for (i, chunk) in buffer.into_iter().enumerate() {
                if chunk.done || i == last {
                    settle(&accountant, &request, &meta, &delivered, &mut tx);
                }
                yield Ok(chunk);
            }
            settle(&accountant, &request, &meta, &delivered, &mut tx);
        }
        .boxed()
    }
}

/// Pull the next chunk, bounded by the idle timeout
async fn next_chunk(
    upstream: &mut ChunkStream,
    limit: Duration,
) -> ProviderResult<Option<StreamChunk>> {
    match tokio::time::timeout(limit, upstream.next()).await {
        Err(_) => Err(ProviderError::Timeout(limit.as_millis() as u64)),
        Ok(None) => Ok(None),
        Ok(Some(item)) => item.map(Some),
    }
}

/// Drain one candidate into a buffer
///
/// On failure returns how many chunks were buffered before it.
async fn drain(
    provider: &dyn Provider,
    request: &CompletionRequest,
    idle_timeout: Duration,
) -> Result<Vec<StreamChunk>, (usize, ProviderError)> {
    let mut upstream = provider.stream(request.clone());
    let mut buffer = Vec::new();

    loop {
        match next_chunk(&mut upstream, idle_timeout).await {
            Ok(Some(chunk)) => buffer.push(chunk),
            Ok(None) => break,
            Err(e) => return Err((buffer.len(), e)),
        }
    }

    debug!(provider = %provider.name(), chunks = buffer.len(), "Stream attempt completed");
    Ok(buffer)
}

/// Compute the call's accounting and publish its summary, at most once
fn settle(
    accountant: &CostAccountant,
    request: &CompletionRequest,
    meta: &StreamFallbackMeta,
    delivered: &Delivered,
    tx: &mut Option<oneshot::Sender<StreamSummary>>,
) {
    let Some(tx) = tx.take() else {
        return;
    };

    let model = request.model().unwrap_or_default();
    let settled = accountant.settle_stream(
        &meta.active_provider,
        model,
        request,
        &delivered.text,
        delivered.usage,
    );

    // Receiver may already be gone
    let _ = tx.send(StreamSummary {
        meta: meta.clone(),
        usage: settled.usage,
        usage_estimated: settled.estimated,
        cost: settled.cost,
    });
}
