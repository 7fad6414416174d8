//! Capital Gains Estimate
//!
//! Ties FIFO cost basis, holding period and jurisdiction tax together for a
//! single sale.

use crate::cost_basis::{compute_fifo_cost_basis, CostBasis};
use crate::holding::{classify_holding, HoldingClassification};
use crate::lots::{PurchaseLot, SaleEvent};
use crate::tax_calculator::{TaxCalculator, TaxJurisdiction, TaxProfile};
use calc_core::{try_sub, CalcResult};
use rust_decimal::Decimal;
use serde::Serialize;

/// Full breakdown of a sale's gain and estimated tax
#[derive(Debug, Clone, Serialize)]
pub struct CapitalGainsEstimate {
    pub jurisdiction: TaxJurisdiction,
    pub quantity_sold: Decimal,
    /// Cost basis plus attributable purchase fees
    pub total_purchase_cost: Decimal,
    pub cost_basis: CostBasis,
    /// Sale value less sale fees
    pub total_sale_proceeds: Decimal,
    pub gross_gain_loss: Decimal,
    pub holding: HoldingClassification,
    pub estimated_tax: Decimal,
    pub net_gain_loss: Decimal,
}

impl CapitalGainsEstimate {
    pub fn is_gain(&self) -> bool {
        self.gross_gain_loss > Decimal::ZERO
    }
}

/// Estimate the tax due on a sale drawn FIFO from `lots`.
///
/// The holding period runs from the newest lot the sale draws on, so a sale
/// that touches any short-term shares is treated as short-term.
pub fn estimate_capital_gains(
    lots: &[PurchaseLot],
    sale: &SaleEvent,
    profile: &TaxProfile,
    calculator: &TaxCalculator,
) -> CalcResult<CapitalGainsEstimate> {
    let cost_basis = compute_fifo_cost_basis(lots, sale.quantity())?;

    // rejects a sale dated before any lot it draws on
    let holding = classify_holding(cost_basis.latest_purchase_date(), Some(sale.date()))?;

    let total_purchase_cost = cost_basis.total_cost()?;
    let total_sale_proceeds = sale.net_proceeds()?;
    let gross_gain_loss = try_sub(total_sale_proceeds, total_purchase_cost)?;

    let estimated_tax = calculator.tax_for(profile, gross_gain_loss, holding.gain_type)?;
    let net_gain_loss = gross_gain_loss - estimated_tax;

    tracing::debug!(
        jurisdiction = %profile.jurisdiction(),
        %gross_gain_loss,
        %estimated_tax,
        gain_type = %holding.gain_type,
        "Capital gains estimated"
    );

    Ok(CapitalGainsEstimate {
        jurisdiction: profile.jurisdiction(),
        quantity_sold: sale.quantity(),
        total_purchase_cost,
        cost_basis,
        total_sale_proceeds,
        gross_gain_loss,
        holding,
        estimated_tax,
        net_gain_loss,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::holding::GainType;
    use calc_core::CalcError;
    use crate::tax_calculator::FilingStatus;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_uk_single_lot_estimate() {
        let lots = vec![PurchaseLot::new(day(2023, 1, 1), dec!(100), dec!(150), dec!(5)).unwrap()];
        let sale = SaleEvent::new(day(2024, 1, 1), dec!(100), dec!(230), dec!(5)).unwrap();
        let profile = TaxProfile::uk(dec!(30000)).unwrap();

        let est = estimate_capital_gains(&lots, &sale, &profile, &TaxCalculator::default())
            .unwrap();

        assert_eq!(est.total_purchase_cost, dec!(15005));
        assert_eq!(est.total_sale_proceeds, dec!(22995));
        assert_eq!(est.gross_gain_loss, dec!(7990));
        // 4990 taxable, all basic band
        assert_eq!(est.estimated_tax, dec!(499.00));
        assert_eq!(est.net_gain_loss, dec!(7491.00));
        assert_eq!(est.holding.gain_type, GainType::LongTerm);
    }

    #[test]
    fn test_us_newest_consumed_lot_drives_classification() {
        let lots = vec![
            PurchaseLot::without_fees(day(2022, 1, 10), dec!(10), dec!(100)).unwrap(),
            PurchaseLot::without_fees(day(2024, 3, 1), dec!(10), dec!(120)).unwrap(),
        ];
        let profile = TaxProfile::us(dec!(75000), FilingStatus::Single).unwrap();
        let calc = TaxCalculator::default();

        // only the 2022 lot is touched → long-term
        let sale = SaleEvent::new(day(2024, 6, 1), dec!(10), dec!(150), dec!(0)).unwrap();
        let est = estimate_capital_gains(&lots, &sale, &profile, &calc).unwrap();
        assert_eq!(est.holding.gain_type, GainType::LongTerm);
        assert_eq!(est.gross_gain_loss, dec!(500));
        assert_eq!(est.estimated_tax, dec!(75.00));

        // reaching into the 2024 lot makes it short-term
        let sale = SaleEvent::new(day(2024, 6, 1), dec!(15), dec!(150), dec!(0)).unwrap();
        let est = estimate_capital_gains(&lots, &sale, &profile, &calc).unwrap();
        assert_eq!(est.holding.gain_type, GainType::ShortTerm);
        assert_eq!(est.gross_gain_loss, dec!(650));
        assert_eq!(est.estimated_tax, dec!(143.00));
    }

    #[test]
    fn test_oversized_proceeds_are_an_error() {
        let lots = vec![PurchaseLot::without_fees(day(2023, 1, 1), dec!(2), dec!(1)).unwrap()];
        let sale = SaleEvent::new(day(2023, 2, 1), dec!(2), Decimal::MAX, dec!(0)).unwrap();
        let profile = TaxProfile::uk(dec!(0)).unwrap();

        let err = estimate_capital_gains(&lots, &sale, &profile, &TaxCalculator::default())
            .unwrap_err();
        assert_eq!(err, CalcError::out_of_range());
    }

    #[test]
    fn test_loss_has_no_tax() {
        let lots = vec![PurchaseLot::without_fees(day(2023, 1, 1), dec!(10), dec!(50)).unwrap()];
        let sale = SaleEvent::new(day(2023, 2, 1), dec!(10), dec!(40), dec!(1)).unwrap();
        let profile = TaxProfile::uk(dec!(20000)).unwrap();

        let est = estimate_capital_gains(&lots, &sale, &profile, &TaxCalculator::default())
            .unwrap();
        assert_eq!(est.gross_gain_loss, dec!(-101));
        assert_eq!(est.estimated_tax, Decimal::ZERO);
        assert_eq!(est.net_gain_loss, dec!(-101));
        assert!(!est.is_gain());
    }

    #[test]
    fn test_sale_before_purchase_rejected() {
        let lots = vec![PurchaseLot::without_fees(day(2024, 1, 1), dec!(10), dec!(10)).unwrap()];
        let sale = SaleEvent::new(day(2023, 12, 31), dec!(5), dec!(12), dec!(0)).unwrap();
        let profile = TaxProfile::uk(dec!(0)).unwrap();

        let err = estimate_capital_gains(&lots, &sale, &profile, &TaxCalculator::default())
            .unwrap_err();
        assert!(matches!(err, CalcError::InvalidInput(_)));
    }

    #[test]
    fn test_oversell_propagates() {
        let lots = vec![PurchaseLot::without_fees(day(2024, 1, 1), dec!(10), dec!(10)).unwrap()];
        let sale = SaleEvent::new(day(2024, 5, 1), dec!(11), dec!(12), dec!(0)).unwrap();
        let profile = TaxProfile::uk(dec!(0)).unwrap();

        let err = estimate_capital_gains(&lots, &sale, &profile, &TaxCalculator::default())
            .unwrap_err();
        assert_eq!(err.kind(), "insufficient_quantity");
    }
}
