//! Request routing
//!
//! # Module Structure
//!
//! - `selector`: picks the provider for a request
//! - `budget`: clamps `max_tokens` to the configured ceiling
//! - `fallback`: candidate lists and the non-streaming executor
//! - `stream`: the buffering stream multiplexer
//! - `router`: `CompletionRouter`, tying the above together

pub mod budget;
pub mod error;
pub mod fallback;
pub mod router;
pub mod selector;
pub mod stream;

pub use error::{DiscardedAttempt, RouterError, RouterResult};
pub use fallback::CandidateList;
pub use router::{CompletionRouter, ProviderInfo};
pub use selector::{provider_for_prefix, Selector};
pub use stream::{RoutedStream, StreamFallbackMeta, StreamSummary};
