//! Usage sink abstraction and error types

use crate::usage::record::UsageRecord;
use async_trait::async_trait;
use thiserror::Error;

/// Failure to persist a usage record
///
/// Never surfaced to router callers; submissions log and drop it.
#[derive(Debug, Error)]
pub enum UsageError {
    /// Transport failure
    #[error("usage submission failed: {0}")]
    Network(String),

    /// The endpoint answered with a non-success status
    #[error("usage endpoint rejected record with status {status}: {body}")]
    Rejected { status: u16, body: String },

    /// The record could not be encoded
    #[error("failed to encode usage record: {0}")]
    Serialize(String),
}

impl From<reqwest::Error> for UsageError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_builder() || err.is_body() {
            UsageError::Serialize(err.to_string())
        } else {
            UsageError::Network(err.to_string())
        }
    }
}

/// Destination for usage records
#[async_trait]
pub trait UsageSink: Send + Sync {
    /// Persist one record
    async fn submit(&self, record: UsageRecord) -> Result<(), UsageError>;
}
