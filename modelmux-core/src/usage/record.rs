//! Usage record shipped to the usage-history store

use crate::cost::CostResult;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Type tag carried by every record
pub const USAGE_RECORD_TYPE: &str = "llm_usage";

/// One completed request's token usage and cost
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageRecord {
    /// Always [`USAGE_RECORD_TYPE`]
    #[serde(rename = "type")]
    pub record_type: String,
    /// Unique record id
    pub id: Uuid,
    /// Provider that served the request
    pub provider: String,
    /// Model that served the request
    pub model: String,
    /// Prompt tokens
    pub prompt_tokens: u32,
    /// Completion tokens
    pub completion_tokens: u32,
    /// Total tokens
    pub total_tokens: u32,
    /// Total cost
    pub cost: f64,
    /// Currency of `cost`
    pub currency: String,
    /// True when the token counts were estimated rather than reported
    pub estimated: bool,
    /// When the request completed
    pub timestamp: DateTime<Utc>,
}

impl UsageRecord {
    /// Build a record from a computed cost
    pub fn from_cost(cost: &CostResult, estimated: bool) -> Self {
        Self {
            record_type: USAGE_RECORD_TYPE.to_string(),
            id: Uuid::new_v4(),
            provider: cost.provider.clone(),
            model: cost.model.clone(),
            prompt_tokens: cost.prompt_tokens,
            completion_tokens: cost.completion_tokens,
            total_tokens: cost.prompt_tokens.saturating_add(cost.completion_tokens),
            cost: cost.total_cost,
            currency: cost.currency.clone(),
            estimated,
            timestamp: Utc::now(),
        }
    }
}
