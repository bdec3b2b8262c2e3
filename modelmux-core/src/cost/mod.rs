//! Cost & usage accounting
//!
//! # Module Structure
//!
//! - `pricing`: `CostResult`, the `PricingCatalog` seam and `PricingTable`
//! - `accountant`: attaches cost to results and ships usage records

mod accountant;
mod pricing;

pub use accountant::{estimate_usage, CostAccountant, StreamAccounting};
pub use pricing::{CostResult, ModelRates, PricingCatalog, PricingTable};
