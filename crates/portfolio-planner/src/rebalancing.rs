//! Category rebalancing against whole-percent targets.

use crate::models::*;
use calc_core::{try_add, try_div, try_mul, try_sum, CalcError, CalcResult};
use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashSet};

const HUNDRED: Decimal = Decimal::ONE_HUNDRED;

/// Calculate the buys and sells that bring each category to its target share.
///
/// Targets are whole percentages that must sum to 100. Categories held but
/// not targeted get a target of 0 and are listed after the targeted ones.
pub fn calculate_rebalance(
    holdings: &[RebalanceHolding],
    targets: &[CategoryTarget],
) -> CalcResult<RebalanceProposal> {
    validate_targets(targets)?;

    let mut current: BTreeMap<&str, (Decimal, Vec<String>)> = BTreeMap::new();
    for h in holdings {
        if h.value < Decimal::ZERO {
            return Err(CalcError::invalid(format!(
                "holding {} has a negative value ({})",
                h.symbol, h.value
            )));
        }
        let entry = current
            .entry(h.category.as_str())
            .or_insert_with(|| (Decimal::ZERO, Vec::new()));
        entry.0 = try_add(entry.0, h.value)?;
        entry.1.push(h.symbol.clone());
    }

    let total_value = try_sum(holdings.iter().map(|h| h.value))?;

    let targeted: Vec<(&str, Decimal)> = targets
        .iter()
        .map(|t| (t.name.as_str(), Decimal::from(t.target_percent)))
        .collect();
    let untargeted: Vec<(&str, Decimal)> = current
        .keys()
        .filter(|name| !targets.iter().any(|t| t.name == **name))
        .map(|name| (*name, Decimal::ZERO))
        .collect();

    let mut categories = Vec::with_capacity(targeted.len() + untargeted.len());
    let mut absolute_moves = Decimal::ZERO;

    for (name, target_percent) in targeted.into_iter().chain(untargeted) {
        let (current_value, symbols) = current
            .get(name)
            .cloned()
            .unwrap_or_else(|| (Decimal::ZERO, Vec::new()));

        let (current_percent, target_value) = if total_value > Decimal::ZERO {
            (
                current_value / total_value * HUNDRED,
                try_div(try_mul(total_value, target_percent)?, HUNDRED)?,
            )
        } else {
            (Decimal::ZERO, Decimal::ZERO)
        };

        let difference = target_value - current_value;
        let action = if difference > Decimal::ZERO {
            RebalanceAction::Buy
        } else if difference < Decimal::ZERO {
            RebalanceAction::Sell
        } else {
            RebalanceAction::Hold
        };
        absolute_moves = try_add(absolute_moves, difference.abs())?;

        categories.push(CategoryRebalance {
            category: name.to_string(),
            symbols,
            current_value,
            current_percent,
            target_percent,
            target_value,
            difference,
            action,
        });
    }

    let turnover = absolute_moves / Decimal::TWO;
    tracing::debug!(%total_value, %turnover, categories = categories.len(), "Rebalance calculated");

    Ok(RebalanceProposal {
        total_value,
        categories,
        turnover,
    })
}

fn validate_targets(targets: &[CategoryTarget]) -> CalcResult<()> {
    let mut seen = HashSet::new();
    let mut sum = 0u32;
    for t in targets {
        if t.target_percent > 100 {
            return Err(CalcError::invalid(format!(
                "target for {} must be between 0 and 100, got {}",
                t.name, t.target_percent
            )));
        }
        if !seen.insert(t.name.as_str()) {
            return Err(CalcError::invalid(format!(
                "category {} is targeted more than once",
                t.name
            )));
        }
        sum += t.target_percent;
    }
    if sum != 100 {
        return Err(CalcError::invalid(format!(
            "category targets must add up to 100, got {sum}"
        )));
    }
    Ok(())
}
