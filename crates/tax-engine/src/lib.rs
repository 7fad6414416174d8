//! Tax Engine
//!
//! FIFO cost basis, holding-period classification and simplified UK/US
//! capital gains tax. Every function here is pure; amounts are exact
//! decimals and only tax payable is rounded to the minor unit.

pub mod cost_basis;
pub mod gains;
pub mod holding;
pub mod lots;
pub mod tax_calculator;

pub use cost_basis::{compute_fifo_cost_basis, total_quantity, CostBasis, LotConsumption};
pub use gains::{estimate_capital_gains, CapitalGainsEstimate};
pub use holding::{classify_holding, long_term_date, GainType, HoldingClassification, HoldingSpan};
pub use lots::{PurchaseLot, SaleEvent, TransactionInput};
pub use tax_calculator::{
    compute_uk_cgt, compute_us_cgt, FilingStatus, LongTermBracket, LongTermPolicy,
    LongTermTables, OrdinaryBracket, TaxCalculator, TaxJurisdiction, TaxProfile, TaxRules,
    UkCgtRules, UsCgtRules,
};
