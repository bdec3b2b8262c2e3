//! Caller-visible routing failures

use crate::providers::ProviderError;
use std::fmt;
use thiserror::Error;

/// A streaming attempt whose buffered output was thrown away
#[derive(Debug, Clone, PartialEq)]
pub struct DiscardedAttempt {
    /// Provider that failed mid-attempt
    pub provider: String,
    /// Chunks buffered before the failure; never forwarded
    pub chunks_discarded: usize,
    /// Failure that ended the attempt
    pub error: ProviderError,
}

impl fmt::Display for DiscardedAttempt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({} chunks discarded: {})",
            self.provider, self.chunks_discarded, self.error
        )
    }
}

/// Errors returned by the router's entry points
#[derive(Debug, Clone, Error)]
pub enum RouterError {
    /// No registered provider could be selected
    #[error("No provider available to serve the request")]
    NoProviderAvailable,

    /// Every candidate of a non-streaming request failed
    #[error("All providers failed ({}): {last_error}", attempted.join(", "))]
    AllProvidersFailed {
        /// Candidates in the order they were tried
        attempted: Vec<String>,
        /// Error from the last candidate
        last_error: ProviderError,
    },

    /// Every candidate of a streaming request failed
    #[error("All providers failed to stream ({}): {last_error}", attempted.join(", "))]
    StreamAllProvidersFailed {
        /// Candidates in the order they were tried
        attempted: Vec<String>,
        /// Buffered output discarded per failed candidate
        discarded: Vec<DiscardedAttempt>,
        /// Error from the last candidate
        last_error: ProviderError,
    },

    /// Raw provider failure, surfaced only when fallback is disabled
    #[error(transparent)]
    Provider(#[from] ProviderError),
}

impl RouterError {
    /// Underlying provider error, if this failure carries one
    pub fn provider_error(&self) -> Option<&ProviderError> {
        match self {
            Self::NoProviderAvailable => None,
            Self::AllProvidersFailed { last_error, .. }
            | Self::StreamAllProvidersFailed { last_error, .. } => Some(last_error),
            Self::Provider(e) => Some(e),
        }
    }
}

/// Result type for routing operations
pub type RouterResult<T> = Result<T, RouterError>;
