//! Shared test providers and sinks

#![allow(dead_code)]

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use modelmux_core::protocol::{
    CompletionRequest, LlmResponse, StreamChunk, ToolCompletionRequest, Usage,
};
use modelmux_core::providers::{ChunkStream, Provider, ProviderError, ProviderResult};
use modelmux_core::usage::{UsageError, UsageRecord, UsageSink};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;

/// Install a test subscriber honouring `RUST_LOG`
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// How a scripted call behaves
#[derive(Clone)]
pub enum Outcome<T> {
    Succeed(T),
    Fail(ProviderError),
    Hang,
}

/// Provider whose every answer is fixed up front
pub struct ScriptedProvider {
    name: String,
    complete: Outcome<LlmResponse>,
    chunks: Vec<StreamChunk>,
    stream_error: Option<ProviderError>,
    stream_hangs: bool,
    models: Outcome<Vec<String>>,
    calls: AtomicUsize,
    streams_opened: AtomicUsize,
    last_request: Mutex<Option<CompletionRequest>>,
}

impl ScriptedProvider {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            complete: Outcome::Succeed(LlmResponse::text(format!("from {}", name), "")),
            chunks: vec![StreamChunk::done(Some(format!("from {}", name)))],
            stream_error: None,
            stream_hangs: false,
            models: Outcome::Succeed(vec![format!("{}-model", name)]),
            calls: AtomicUsize::new(0),
            streams_opened: AtomicUsize::new(0),
            last_request: Mutex::new(None),
        }
    }

    pub fn replying(mut self, response: LlmResponse) -> Self {
        self.complete = Outcome::Succeed(response);
        self
    }

    pub fn failing(mut self, error: ProviderError) -> Self {
        self.complete = Outcome::Fail(error);
        self
    }

    pub fn hanging(mut self) -> Self {
        self.complete = Outcome::Hang;
        self
    }

    /// Emit `chunks` and finish cleanly
    pub fn streaming(mut self, chunks: Vec<StreamChunk>) -> Self {
        self.chunks = chunks;
        self.stream_error = None;
        self
    }

    /// Emit `chunks` and then raise `error`
    pub fn streaming_then_failing(mut self, chunks: Vec<StreamChunk>, error: ProviderError) -> Self {
        self.chunks = chunks;
        self.stream_error = Some(error);
        self
    }

    /// Emit `chunks` and then never yield again
    pub fn streaming_then_hanging(mut self, chunks: Vec<StreamChunk>) -> Self {
        self.chunks = chunks;
        self.stream_hangs = true;
        self
    }

    pub fn with_models(mut self, models: Vec<&str>) -> Self {
        self.models = Outcome::Succeed(models.into_iter().map(String::from).collect());
        self
    }

    pub fn models_failing(mut self) -> Self {
        self.models = Outcome::Fail(ProviderError::Unavailable("listing down".into()));
        self
    }

    pub fn models_hanging(mut self) -> Self {
        self.models = Outcome::Hang;
        self
    }

    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// Non-streaming calls received
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Streams opened
    pub fn streams_opened(&self) -> usize {
        self.streams_opened.load(Ordering::SeqCst)
    }

    /// Most recent request seen by any method
    pub fn last_request(&self) -> Option<CompletionRequest> {
        self.last_request.lock().unwrap().clone()
    }

    fn record(&self, request: &CompletionRequest) {
        *self.last_request.lock().unwrap() = Some(request.clone());
    }

    async fn answer(&self) -> ProviderResult<LlmResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.complete {
            Outcome::Succeed(response) => Ok(response.clone()),
            Outcome::Fail(error) => Err(error.clone()),
            Outcome::Hang => futures::future::pending().await,
        }
    }
}

#[async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(&self, request: CompletionRequest) -> ProviderResult<LlmResponse> {
        self.record(&request);
        self.answer().await
    }

    fn stream(&self, request: CompletionRequest) -> ChunkStream {
        self.record(&request);
        self.streams_opened.fetch_add(1, Ordering::SeqCst);

        let head = stream::iter(self.chunks.clone().into_iter().map(Ok));
        match (&self.stream_error, self.stream_hangs) {
            (Some(error), _) => head.chain(stream::iter(vec![Err(error.clone())])).boxed(),
            (None, true) => head.chain(stream::pending()).boxed(),
            (None, false) => head.boxed(),
        }
    }

    async fn complete_with_tools(
        &self,
        request: ToolCompletionRequest,
    ) -> ProviderResult<LlmResponse> {
        self.record(&request.request);
        self.answer().await
    }

    fn max_tokens_for_model(&self, _model: &str) -> u32 {
        8192
    }

    async fn list_models(&self) -> ProviderResult<Vec<String>> {
        match &self.models {
            Outcome::Succeed(models) => Ok(models.clone()),
            Outcome::Fail(error) => Err(error.clone()),
            Outcome::Hang => futures::future::pending().await,
        }
    }
}

/// Sink forwarding every record to a channel
pub struct RecordingSink {
    tx: mpsc::UnboundedSender<UsageRecord>,
}

impl RecordingSink {
    pub fn new() -> (Arc<Self>, mpsc::UnboundedReceiver<UsageRecord>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Arc::new(Self { tx }), rx)
    }
}

#[async_trait]
impl UsageSink for RecordingSink {
    async fn submit(&self, record: UsageRecord) -> Result<(), UsageError> {
        let _ = self.tx.send(record);
        Ok(())
    }
}

/// Sink that always fails
pub struct RejectingSink;

#[async_trait]
impl UsageSink for RejectingSink {
    async fn submit(&self, _record: UsageRecord) -> Result<(), UsageError> {
        Err(UsageError::Rejected {
            status: 503,
            body: "history store offline".into(),
        })
    }
}

/// Wait briefly for the next record
pub async fn next_record(rx: &mut mpsc::UnboundedReceiver<UsageRecord>) -> Option<UsageRecord> {
    tokio::time::timeout(Duration::from_secs(2), rx.recv())
        .await
        .ok()
        .flatten()
}

/// Assert no record arrives within a short window
pub async fn assert_no_record(rx: &mut mpsc::UnboundedReceiver<UsageRecord>) {
    let outcome = tokio::time::timeout(Duration::from_millis(100), rx.recv()).await;
    assert!(outcome.is_err(), "unexpected usage record: {:?}", outcome);
}

pub fn usage(prompt: u32, completion: u32) -> Usage {
    Usage::new(prompt, completion)
}
