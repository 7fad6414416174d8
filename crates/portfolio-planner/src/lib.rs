//! Position planning: average-cost repricing and category rebalancing.

pub mod models;
pub mod rebalancing;
pub mod reprice;

pub use models::*;
pub use rebalancing::calculate_rebalance;
pub use reprice::{reprice_by_shares, reprice_by_target, shares_for_target_average};
