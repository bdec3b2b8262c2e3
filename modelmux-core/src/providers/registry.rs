//! Name-keyed collection of live provider instances
//!
//! The registry is populated by the embedding application (which owns
//! credentials and adapter construction) and handed to the router. Iteration
//! order is registration order.

use crate::providers::adapter::Provider;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Ordered, name-keyed provider registry
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    providers: Vec<Arc<dyn Provider>>,
    index: HashMap<String, usize>,
}

impl ProviderRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Start building a registry
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    /// Register a provider under its own name
    ///
    /// Re-registering a name replaces the previous instance but keeps its
    /// position in iteration order.
    pub fn register(&mut self, provider: Arc<dyn Provider>) {
        let name = provider.name().to_string();
        match self.index.get(&name) {
            Some(&slot) => {
                debug!(provider = %name, "Replacing registered provider");
                self.providers[slot] = provider;
            }
            None => {
                debug!(provider = %name, "Registering provider");
                self.index.insert(name, self.providers.len());
                self.providers.push(provider);
            }
        }
    }

    /// Look up a provider by name
    pub fn get(&self, name: &str) -> Option<Arc<dyn Provider>> {
        self.index.get(name).map(|&slot| Arc::clone(&self.providers[slot]))
    }

    /// Whether a provider with this name is registered
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// First registered provider, if any
    pub fn first(&self) -> Option<Arc<dyn Provider>> {
        self.providers.first().cloned()
    }

    /// Iterate providers in registration order
    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Provider>> {
        self.providers.iter()
    }

    /// Registered provider names, in registration order
    pub fn names(&self) -> Vec<String> {
        self.providers.iter().map(|p| p.name().to_string()).collect()
    }

    /// Number of registered providers
    pub fn len(&self) -> usize {
        self.providers.len()
    }

    /// Whether the registry is empty
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

impl fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("providers", &self.names())
            .finish()
    }
}

/// Builder for creating a provider registry
#[derive(Default)]
pub struct RegistryBuilder {
    registry: ProviderRegistry,
}

impl RegistryBuilder {
    /// Create a new registry builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a provider
    pub fn provider(mut self, provider: Arc<dyn Provider>) -> Self {
        self.registry.register(provider);
        self
    }

    /// Build the registry
    pub fn build(self) -> ProviderRegistry {
        self.registry
    }
}
