//! Cost computation from token counts
//!
//! The router treats pricing as an external collaborator behind
//! [`PricingCatalog`]. [`PricingTable`] is the implementation built from the
//! `pricing` rows of the router configuration.

use crate::config::PricingEntry;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Monetary cost of one completion, with the inputs that justify it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostResult {
    /// Provider that served the request
    pub provider: String,
    /// Model the tokens were billed against
    pub model: String,
    /// Prompt tokens billed
    pub prompt_tokens: u32,
    /// Completion tokens billed
    pub completion_tokens: u32,
    /// Cost of the prompt tokens
    pub input_cost: f64,
    /// Cost of the completion tokens
    pub output_cost: f64,
    /// `input_cost + output_cost`
    pub total_cost: f64,
    /// ISO 4217 currency code
    pub currency: String,
    /// False when no price was known and the cost is a zero placeholder
    pub priced: bool,
}

/// Pure cost lookup, no I/O
pub trait PricingCatalog: Send + Sync {
    /// Compute the cost of a completion
    fn calculate_cost(
        &self,
        provider: &str,
        model: &str,
        prompt_tokens: u32,
        completion_tokens: u32,
    ) -> CostResult;
}

/// Per-1K token rates for one model
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelRates {
    /// Cost per 1K input tokens (in USD)
    pub input_per_1k: f64,
    /// Cost per 1K output tokens (in USD)
    pub output_per_1k: f64,
}

impl ModelRates {
    fn cost(&self, prompt_tokens: u32, completion_tokens: u32) -> (f64, f64) {
        (
            prompt_tokens as f64 / 1000.0 * self.input_per_1k,
            completion_tokens as f64 / 1000.0 * self.output_per_1k,
        )
    }
}

/// Table-driven pricing in USD
///
/// Lookup order: exact (provider, model), then model for any provider.
/// Unknown models cost zero and are reported with `priced = false`.
#[derive(Debug, Clone, Default)]
pub struct PricingTable {
    by_provider: HashMap<(String, String), ModelRates>,
    by_model: HashMap<String, ModelRates>,
}

impl PricingTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table from configuration rows
    pub fn from_entries(entries: &[PricingEntry]) -> Self {
        let mut table = Self::new();
        for entry in entries {
            let rates = ModelRates {
                input_per_1k: entry.input_per_1k,
                output_per_1k: entry.output_per_1k,
            };
            match &entry.provider {
                Some(provider) => table.insert_for_provider(provider, &entry.model, rates),
                None => table.insert(&entry.model, rates),
            }
        }
        table
    }

    /// Price a model for every provider
    pub fn insert(&mut self, model: &str, rates: ModelRates) {
        self.by_model.insert(model.to_string(), rates);
    }

    /// Price a model for one provider only
    pub fn insert_for_provider(&mut self, provider: &str, model: &str, rates: ModelRates) {
        self.by_provider
            .insert((provider.to_string(), model.to_string()), rates);
    }

    /// Rates for a provider/model pair, if known
    pub fn rates(&self, provider: &str, model: &str) -> Option<ModelRates> {
        self.by_provider
            .get(&(provider.to_string(), model.to_string()))
            .or_else(|| self.by_model.get(model))
            .copied()
    }
}

impl PricingCatalog for PricingTable {
    fn calculate_cost(
        &self,
        provider: &str,
        model: &str,
        prompt_tokens: u32,
        completion_tokens: u32,
    ) -> CostResult {
        let rates = self.rates(provider, model);
        let (input_cost, output_cost) = rates
            .map(|r| r.cost(prompt_tokens, completion_tokens))
            .unwrap_or((0.0, 0.0));

        CostResult {
            provider: provider.to_string(),
            model: model.to_string(),
            prompt_tokens,
            completion_tokens,
            input_cost,
            output_cost,
            total_cost: input_cost + output_cost,
            currency: "USD".to_string(),
            priced: rates.is_some(),
        }
    }
}
