//! FIFO Cost Basis
//!
//! Works out which purchase lots a sale draws from, oldest first, and the
//! cost and fees attributable to the shares sold.

use crate::lots::PurchaseLot;
use calc_core::{try_add, try_mul, try_sum, CalcError, CalcResult};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

/// Portion of one lot consumed by a sale
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LotConsumption {
    /// Index of the lot in the caller's slice
    pub lot_index: usize,
    pub date: NaiveDate,
    /// Shares taken from this lot
    pub quantity: Decimal,
    pub price: Decimal,
    /// quantity × price
    pub cost: Decimal,
    /// Fees carried over from the lot (full or prorated)
    pub fees: Decimal,
    /// Whether the whole lot was used up
    pub fully_consumed: bool,
}

/// Result of a FIFO cost basis calculation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CostBasis {
    pub cost_basis: Decimal,
    pub attributable_fees: Decimal,
    /// Consumed lots in the order they were drawn
    pub consumed: Vec<LotConsumption>,
}

impl CostBasis {
    /// Cost basis plus attributable purchase fees
    pub fn total_cost(&self) -> CalcResult<Decimal> {
        try_add(self.cost_basis, self.attributable_fees)
    }

    /// Sum of the quantities drawn from all lots
    pub fn consumed_quantity(&self) -> Decimal {
        self.consumed.iter().map(|c| c.quantity).sum()
    }

    /// Purchase date of the newest lot drawn from, if any
    pub fn latest_purchase_date(&self) -> Option<NaiveDate> {
        self.consumed.iter().map(|c| c.date).max()
    }
}

/// Total quantity held across a set of lots
pub fn total_quantity(lots: &[PurchaseLot]) -> CalcResult<Decimal> {
    try_sum(lots.iter().map(PurchaseLot::quantity))
}

/// Compute the cost basis of `sold_quantity` shares using FIFO.
///
/// Lots are walked oldest first; lots sharing a date keep their input order.
/// The caller's slice is not reordered.
pub fn compute_fifo_cost_basis(
    lots: &[PurchaseLot],
    sold_quantity: Decimal,
) -> CalcResult<CostBasis> {
    if sold_quantity < Decimal::ZERO {
        return Err(CalcError::invalid(format!(
            "sold quantity cannot be negative, got {sold_quantity}"
        )));
    }

    let available = total_quantity(lots)?;
    if sold_quantity > available {
        return Err(CalcError::InsufficientQuantity {
            requested: sold_quantity,
            available,
        });
    }

    let mut order: Vec<usize> = (0..lots.len()).collect();
    order.sort_by_key(|&i| lots[i].date());

    let mut cost_basis = Decimal::ZERO;
    let mut attributable_fees = Decimal::ZERO;
    let mut consumed = Vec::new();
    let mut remaining = sold_quantity;

    for index in order {
        if remaining <= Decimal::ZERO {
            break;
        }

        let lot = &lots[index];
        if lot.quantity() <= Decimal::ZERO {
            continue;
        }

        let (quantity, fees, fully_consumed) = if lot.quantity() <= remaining {
            (lot.quantity(), lot.fees(), true)
        } else {
            // fee per share first, then scale by the partial quantity
            (remaining, try_mul(remaining, lot.fees_per_share()?)?, false)
        };

        let cost = try_mul(quantity, lot.price())?;
        cost_basis = try_add(cost_basis, cost)?;
        attributable_fees = try_add(attributable_fees, fees)?;
        remaining -= quantity;

        consumed.push(LotConsumption {
            lot_index: index,
            date: lot.date(),
            quantity,
            price: lot.price(),
            cost,
            fees,
            fully_consumed,
        });
    }

    tracing::debug!(
        %sold_quantity,
        %cost_basis,
        %attributable_fees,
        lots_used = consumed.len(),
        "FIFO cost basis computed"
    );

    Ok(CostBasis {
        cost_basis,
        attributable_fees,
        consumed,
    })
}
