//! Provider abstraction
//!
//! This module defines the contract every backend satisfies, the error type
//! backends raise, and the registry the router selects from.

pub mod adapter;
pub mod error;
pub mod registry;

pub use adapter::{estimate_tokens, ChunkStream, Provider, CHARS_PER_TOKEN};
pub use error::{ProviderError, ProviderResult};
pub use registry::{ProviderRegistry, RegistryBuilder};
