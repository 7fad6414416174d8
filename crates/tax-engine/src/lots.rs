//! Purchase lots and sale events.

use calc_core::{try_div, try_mul, try_sub, CalcError, CalcResult};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A single buy transaction. Fields are private so a lot cannot be
/// mutated after validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PurchaseLot {
    date: NaiveDate,
    quantity: Decimal,
    price: Decimal,
    fees: Decimal,
}

impl PurchaseLot {
    /// Create a lot. Quantity, price and fees must be non-negative.
    ///
    /// A zero-quantity lot is accepted; it contributes nothing to a sale.
    pub fn new(
        date: NaiveDate,
        quantity: Decimal,
        price: Decimal,
        fees: Decimal,
    ) -> CalcResult<Self> {
        ensure_non_negative("lot quantity", quantity)?;
        ensure_non_negative("lot price", price)?;
        ensure_non_negative("lot fees", fees)?;
        Ok(Self {
            date,
            quantity,
            price,
            fees,
        })
    }

    /// Create a lot with no fees
    pub fn without_fees(date: NaiveDate, quantity: Decimal, price: Decimal) -> CalcResult<Self> {
        Self::new(date, quantity, price, Decimal::ZERO)
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn quantity(&self) -> Decimal {
        self.quantity
    }

    pub fn price(&self) -> Decimal {
        self.price
    }

    pub fn fees(&self) -> Decimal {
        self.fees
    }

    /// Fee attributable to one share of this lot; zero for an empty lot.
    pub fn fees_per_share(&self) -> CalcResult<Decimal> {
        if self.quantity > Decimal::ZERO {
            try_div(self.fees, self.quantity)
        } else {
            Ok(Decimal::ZERO)
        }
    }
}

/// The disposal being taxed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SaleEvent {
    date: NaiveDate,
    quantity: Decimal,
    price: Decimal,
    fees: Decimal,
}

impl SaleEvent {
    pub fn new(
        date: NaiveDate,
        quantity: Decimal,
        price: Decimal,
        fees: Decimal,
    ) -> CalcResult<Self> {
        if quantity <= Decimal::ZERO {
            return Err(CalcError::invalid(format!(
                "sale quantity must be positive, got {quantity}"
            )));
        }
        ensure_non_negative("sale price", price)?;
        ensure_non_negative("sale fees", fees)?;
        Ok(Self {
            date,
            quantity,
            price,
            fees,
        })
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn quantity(&self) -> Decimal {
        self.quantity
    }

    pub fn price(&self) -> Decimal {
        self.price
    }

    pub fn fees(&self) -> Decimal {
        self.fees
    }

    /// Sale value net of the sale's own fees
    pub fn net_proceeds(&self) -> CalcResult<Decimal> {
        try_sub(try_mul(self.quantity, self.price)?, self.fees)
    }
}

/// Unvalidated wire shape shared by lots and sales. `fees` defaults to zero.
#[derive(Debug, Clone, Deserialize)]
pub struct TransactionInput {
    pub date: NaiveDate,
    pub quantity: Decimal,
    pub price: Decimal,
    #[serde(default)]
    pub fees: Decimal,
}

impl TryFrom<TransactionInput> for PurchaseLot {
    type Error = CalcError;

    fn try_from(input: TransactionInput) -> CalcResult<Self> {
        PurchaseLot::new(input.date, input.quantity, input.price, input.fees)
    }
}

impl TryFrom<TransactionInput> for SaleEvent {
    type Error = CalcError;

    fn try_from(input: TransactionInput) -> CalcResult<Self> {
        SaleEvent::new(input.date, input.quantity, input.price, input.fees)
    }
}

fn ensure_non_negative(field: &str, value: Decimal) -> CalcResult<()> {
    if value < Decimal::ZERO {
        return Err(CalcError::invalid(format!(
            "{field} cannot be negative, got {value}"
        )));
    }
    Ok(())
}
