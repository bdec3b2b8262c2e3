//! Usage sink that POSTs records to an HTTP endpoint using reqwest

use crate::config::{SecretString, UsageConfig};
use crate::usage::record::UsageRecord;
use crate::usage::sink::{UsageError, UsageSink};
use async_trait::async_trait;
use reqwest::{Client, ClientBuilder};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

/// Default user agent
const USER_AGENT: &str = concat!("modelmux/", env!("CARGO_PKG_VERSION"));

/// Error bodies longer than this are truncated before being reported
const MAX_ERROR_BODY: usize = 512;

/// Usage sink backed by a pooled HTTP client
#[derive(Clone)]
pub struct HttpUsageSink {
    client: Client,
    endpoint: String,
    api_key: Option<SecretString>,
}

impl HttpUsageSink {
    /// Create a sink for `endpoint` with the given request timeout
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, UsageError> {
        let client = ClientBuilder::new()
            .pool_max_idle_per_host(4)
            .pool_idle_timeout(Duration::from_secs(90))
            .connect_timeout(timeout)
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .gzip(true)
            .build()
            .map_err(|e| UsageError::Network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
            api_key: None,
        })
    }

    /// Create a sink from configuration; `None` when no endpoint is set
    pub fn from_config(config: &UsageConfig) -> Result<Option<Self>, UsageError> {
        let Some(endpoint) = &config.endpoint else {
            return Ok(None);
        };

        let mut sink = Self::new(endpoint.clone(), Duration::from_millis(config.timeout_ms))?;
        sink.api_key = config.api_key.clone().filter(|k| !k.is_empty());
        Ok(Some(sink))
    }

    /// Send a bearer token with every submission
    pub fn with_api_key(mut self, api_key: SecretString) -> Self {
        self.api_key = Some(api_key);
        self
    }

    /// Endpoint records are posted to
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl UsageSink for HttpUsageSink {
    async fn submit(&self, record: UsageRecord) -> Result<(), UsageError> {
        debug!(
            endpoint = %self.endpoint,
            record_id = %record.id,
            auth = %self.api_key.as_ref().map(|k| k.partial_redact()).unwrap_or_default(),
            "Submitting usage record"
        );

        let mut req_builder = self
            .client
            .post(&self.endpoint)
            .header("X-Request-ID", record.id.to_string())
            .json(&record);

        if let Some(api_key) = &self.api_key {
            req_builder = req_builder.bearer_auth(api_key.expose_secret());
        }

        let response = req_builder.send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(UsageError::Rejected {
                status: status.as_u16(),
                body: error_message(&body),
            });
        }

        debug!(record_id = %record.id, status = %status, "Usage record accepted");
        Ok(())
    }
}

/// Pull a readable message out of an error body
///
/// Understands `{"error": {"message": ..}}`, `{"message": ..}` and
/// `{"error": ".."}`; anything else is returned truncated.
fn error_message(body: &str) -> String {
    let parsed = serde_json::from_str::<Value>(body).ok();
    let extracted = parsed.as_ref().and_then(|json| {
        json.get("error")
            .and_then(|e| e.get("message"))
            .or_else(|| json.get("message"))
            .or_else(|| json.get("error"))
            .and_then(|v| v.as_str())
            .map(str::to_string)
    });

    extracted.unwrap_or_else(|| body.chars().take(MAX_ERROR_BODY).collect())
}
