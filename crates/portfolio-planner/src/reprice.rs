//! Average-cost repricing: what buying more shares at market does to the
//! average price, and how many shares a target average needs.

use crate::models::*;
use calc_core::{try_add, try_div, try_mul, CalcError, CalcResult};
use rust_decimal::Decimal;

/// New average price after buying `additional_shares` at the market price.
pub fn reprice_by_shares(
    position: &Position,
    additional_shares: Decimal,
) -> CalcResult<RepriceByShares> {
    let operands = [
        ("current shares", position.current_shares),
        ("average price", position.average_price),
        ("market price", position.market_price),
        ("additional shares", additional_shares),
    ];
    for (name, value) in operands {
        if value < Decimal::ZERO {
            return Err(CalcError::invalid(format!(
                "{name} cannot be negative, got {value}"
            )));
        }
    }

    let additional_investment = try_mul(additional_shares, position.market_price)?;
    let total_shares = try_add(position.current_shares, additional_shares)?;
    let total_cost = try_add(position.total_cost()?, additional_investment)?;

    let new_average_price = if total_shares > Decimal::ZERO {
        try_div(total_cost, total_shares)?
    } else {
        Decimal::ZERO
    };

    tracing::debug!(%additional_shares, %new_average_price, "Repriced by shares");

    Ok(RepriceByShares {
        new_average_price,
        total_shares,
        additional_investment,
        summary: ScenarioSummary::new(position, additional_shares)?,
    })
}

/// Shares to buy at market so the average price becomes `target_price`.
///
/// Averaging down needs `market < average` and `target > market`; averaging
/// up needs `market > average` and `target < market`. A target equal to the
/// current average is rejected.
pub fn reprice_by_target(position: &Position, target_price: Decimal) -> CalcResult<RepriceByTarget> {
    let Position {
        current_shares,
        average_price,
        market_price,
    } = *position;

    if market_price <= Decimal::ZERO {
        return Err(CalcError::invalid(format!(
            "market price must be positive, got {market_price}"
        )));
    }
    if current_shares < Decimal::ZERO || average_price < Decimal::ZERO {
        return Err(CalcError::invalid(
            "current shares and average price cannot be negative",
        ));
    }

    if target_price < average_price {
        if market_price >= average_price {
            return Err(CalcError::unreachable(format!(
                "cannot average down: market price ({market_price}) is not below average price ({average_price})"
            )));
        }
        if target_price <= market_price {
            return Err(CalcError::unreachable(format!(
                "target price ({target_price}) must be higher than market price ({market_price}) to average down"
            )));
        }
    } else if target_price > average_price {
        if market_price <= average_price {
            return Err(CalcError::unreachable(format!(
                "cannot average up: market price ({market_price}) is not above average price ({average_price})"
            )));
        }
        if target_price >= market_price {
            return Err(CalcError::unreachable(format!(
                "target price ({target_price}) must be lower than market price ({market_price}) to average up"
            )));
        }
    } else {
        return Err(CalcError::unreachable(format!(
            "target price ({target_price}) is the same as the current average price"
        )));
    }

    let additional_shares_needed =
        shares_for_target_average(current_shares, average_price, market_price, target_price)?;
    let additional_investment = try_mul(additional_shares_needed, market_price)?;
    let total_shares = try_add(current_shares, additional_shares_needed)?;

    tracing::debug!(%target_price, %additional_shares_needed, "Repriced by target");

    Ok(RepriceByTarget {
        additional_shares_needed,
        total_shares,
        additional_investment,
        summary: ScenarioSummary::new(position, additional_shares_needed)?,
    })
}

/// Closed form `cs × (ap − target) / (target − mp)` with no feasibility
/// checks. A target equal to the market price has no solution.
pub fn shares_for_target_average(
    current_shares: Decimal,
    average_price: Decimal,
    market_price: Decimal,
    target_price: Decimal,
) -> CalcResult<Decimal> {
    let denominator = target_price - market_price;
    if denominator.is_zero() {
        return Err(CalcError::DivisionByZero(format!(
            "target price ({target_price}) equals market price"
        )));
    }
    let numerator = try_mul(current_shares, average_price - target_price)?;
    try_div(numerator, denominator)
}
