//! Inputs and results for repricing and rebalancing.

use calc_core::{try_add, try_mul, try_sub, CalcResult};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A holding in one stock, as used for repricing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub current_shares: Decimal,
    pub average_price: Decimal,
    pub market_price: Decimal,
}

impl Position {
    pub fn new(current_shares: Decimal, average_price: Decimal, market_price: Decimal) -> Self {
        Self {
            current_shares,
            average_price,
            market_price,
        }
    }

    /// What was paid for the current shares
    pub fn total_cost(&self) -> CalcResult<Decimal> {
        try_mul(self.current_shares, self.average_price)
    }

    pub fn market_value(&self) -> CalcResult<Decimal> {
        try_mul(self.current_shares, self.market_price)
    }

    pub fn unrealized_pnl(&self) -> CalcResult<Decimal> {
        try_sub(self.market_value()?, self.total_cost()?)
    }
}

/// Before/after view of a position around an additional purchase
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScenarioSummary {
    pub initial_total_cost: Decimal,
    pub current_value: Decimal,
    pub initial_pnl: Decimal,
    pub total_investment_after: Decimal,
    pub portfolio_value_after: Decimal,
    pub pnl_after: Decimal,
}

impl ScenarioSummary {
    pub fn new(position: &Position, additional_shares: Decimal) -> CalcResult<Self> {
        let additional_cost = try_mul(additional_shares, position.market_price)?;
        let total_investment_after = try_add(position.total_cost()?, additional_cost)?;
        let portfolio_value_after = try_mul(
            try_add(position.current_shares, additional_shares)?,
            position.market_price,
        )?;
        Ok(Self {
            initial_total_cost: position.total_cost()?,
            current_value: position.market_value()?,
            initial_pnl: position.unrealized_pnl()?,
            total_investment_after,
            portfolio_value_after,
            pnl_after: try_sub(portfolio_value_after, total_investment_after)?,
        })
    }
}

/// Result of buying a fixed number of extra shares
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepriceByShares {
    pub new_average_price: Decimal,
    pub total_shares: Decimal,
    pub additional_investment: Decimal,
    pub summary: ScenarioSummary,
}

/// Result of solving for the shares needed to reach a target average
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepriceByTarget {
    pub additional_shares_needed: Decimal,
    pub total_shares: Decimal,
    pub additional_investment: Decimal,
    pub summary: ScenarioSummary,
}

/// A holding tagged with the category it counts towards
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RebalanceHolding {
    pub symbol: String,
    pub value: Decimal,
    pub category: String,
}

/// Desired share of the portfolio for a category, in whole percent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryTarget {
    pub name: String,
    #[serde(alias = "target")]
    pub target_percent: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RebalanceAction {
    Buy,
    Sell,
    Hold,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryRebalance {
    pub category: String,
    pub symbols: Vec<String>,
    pub current_value: Decimal,
    pub current_percent: Decimal,
    pub target_percent: Decimal,
    pub target_value: Decimal,
    /// Target minus current; positive means buy
    pub difference: Decimal,
    pub action: RebalanceAction,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RebalanceProposal {
    pub total_value: Decimal,
    pub categories: Vec<CategoryRebalance>,
    /// Value that has to change hands (half the sum of absolute differences)
    pub turnover: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_scenario_summary() {
        let pos = Position::new(dec!(10), dec!(20), dec!(15));
        let summary = ScenarioSummary::new(&pos, dec!(10)).unwrap();
        assert_eq!(summary.initial_total_cost, dec!(200));
        assert_eq!(summary.initial_pnl, dec!(-50));
        assert_eq!(summary.total_investment_after, dec!(350));
        assert_eq!(summary.portfolio_value_after, dec!(300));
        assert_eq!(summary.pnl_after, dec!(-50));
    }

    #[test]
    fn test_position_overflow_is_an_error() {
        let pos = Position::new(Decimal::MAX, dec!(2), dec!(1));
        assert!(pos.total_cost().is_err());
        assert!(pos.unrealized_pnl().is_err());
        assert!(ScenarioSummary::new(&Position::new(dec!(1), dec!(1), Decimal::MAX), dec!(1))
            .is_err());
    }

    #[test]
    fn test_category_target_accepts_short_field_name() {
        let t: CategoryTarget = serde_json::from_str(r#"{"name":"Tech","target":40}"#).unwrap();
        assert_eq!(t.target_percent, 40);
        let action = serde_json::to_string(&RebalanceAction::Hold).unwrap();
        assert_eq!(action, r#""hold""#);
    }
}
