//! JSON request/response shapes for the CLI.
//!
//! Decimals come in as strings or numbers and go out as fixed-precision
//! strings so no float formatting leaks into the output.

use calc_core::{format_money, format_percent, format_shares, CalcError, CalcResult};
use chrono::NaiveDate;
use portfolio_planner::{
    calculate_rebalance, reprice_by_shares, reprice_by_target, CategoryTarget, Position,
    RebalanceAction, RebalanceHolding, ScenarioSummary,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tax_engine::{
    classify_holding, estimate_capital_gains, long_term_date, FilingStatus, GainType,
    PurchaseLot, SaleEvent, TaxCalculator, TaxJurisdiction, TaxProfile, TransactionInput,
};

#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CalcRequest {
    CapitalGains(CapitalGainsRequest),
    Reprice(RepriceRequest),
    Rebalance(RebalanceRequest),
    Holding(HoldingRequest),
}

#[derive(Debug, Deserialize)]
pub struct CapitalGainsRequest {
    pub jurisdiction: String,
    pub annual_income: Decimal,
    /// Required for US; unknown values fall back to single
    #[serde(default)]
    pub filing_status: Option<String>,
    pub purchases: Vec<TransactionInput>,
    pub sale: TransactionInput,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum RepriceRequest {
    Shares {
        current_shares: Decimal,
        average_price: Decimal,
        market_price: Decimal,
        additional_shares: Decimal,
    },
    Price {
        current_shares: Decimal,
        average_price: Decimal,
        market_price: Decimal,
        target_price: Decimal,
    },
}

#[derive(Debug, Deserialize)]
pub struct RebalanceRequest {
    pub holdings: Vec<RebalanceHolding>,
    pub categories: Vec<CategoryTarget>,
}

#[derive(Debug, Deserialize)]
pub struct HoldingRequest {
    #[serde(default)]
    pub purchase_date: Option<NaiveDate>,
    #[serde(default)]
    pub sale_date: Option<NaiveDate>,
}

impl CalcRequest {
    pub fn kind(&self) -> &'static str {
        match self {
            CalcRequest::CapitalGains(_) => "capital_gains",
            CalcRequest::Reprice(_) => "reprice",
            CalcRequest::Rebalance(_) => "rebalance",
            CalcRequest::Holding(_) => "holding",
        }
    }

    pub fn execute(self, calculator: &TaxCalculator) -> CalcResult<CalcResponse> {
        match self {
            CalcRequest::CapitalGains(req) => req.execute(calculator).map(CalcResponse::CapitalGains),
            CalcRequest::Reprice(req) => req.execute(),
            CalcRequest::Rebalance(req) => req.execute().map(CalcResponse::Rebalance),
            CalcRequest::Holding(req) => req.execute().map(CalcResponse::Holding),
        }
    }
}

fn parse_jurisdiction(code: &str) -> CalcResult<TaxJurisdiction> {
    match code.trim().to_uppercase().as_str() {
        "UK" | "GB" => Ok(TaxJurisdiction::UK),
        "US" | "USA" => Ok(TaxJurisdiction::US),
        other => Err(CalcError::invalid(format!("unsupported jurisdiction '{other}'"))),
    }
}

impl CapitalGainsRequest {
    fn execute(self, calculator: &TaxCalculator) -> CalcResult<CapitalGainsResponse> {
        let profile = match parse_jurisdiction(&self.jurisdiction)? {
            TaxJurisdiction::UK => TaxProfile::uk(self.annual_income)?,
            TaxJurisdiction::US => {
                // unknown statuses fall back to single; a missing one is rejected
                let status = self.filing_status.as_deref().map(FilingStatus::parse_or_single);
                TaxProfile::new(TaxJurisdiction::US, self.annual_income, status)?
            }
        };

        let lots = self
            .purchases
            .into_iter()
            .map(PurchaseLot::try_from)
            .collect::<CalcResult<Vec<_>>>()?;
        let sale = SaleEvent::try_from(self.sale)?;

        let estimate = estimate_capital_gains(&lots, &sale, &profile, calculator)?;

        Ok(CapitalGainsResponse {
            jurisdiction: estimate.jurisdiction.to_string(),
            currency: estimate.jurisdiction.currency_symbol(),
            filing_status: profile.filing_status(),
            quantity_sold: format_shares(estimate.quantity_sold),
            cost_basis: format_money(estimate.cost_basis.cost_basis),
            purchase_fees: format_money(estimate.cost_basis.attributable_fees),
            total_purchase_cost: format_money(estimate.total_purchase_cost),
            total_sale_proceeds: format_money(estimate.total_sale_proceeds),
            gross_gain_loss: format_money(estimate.gross_gain_loss),
            holding_period: estimate.holding.description.clone(),
            gain_type: estimate.holding.gain_type,
            estimated_tax: format_money(estimate.estimated_tax),
            net_gain_loss: format_money(estimate.net_gain_loss),
            lots: estimate
                .cost_basis
                .consumed
                .iter()
                .map(|c| LotLine {
                    date: c.date,
                    quantity: format_shares(c.quantity),
                    price: format_money(c.price),
                    cost: format_money(c.cost),
                    fees: format_money(c.fees),
                    fully_consumed: c.fully_consumed,
                })
                .collect(),
        })
    }
}

impl RepriceRequest {
    fn execute(self) -> CalcResult<CalcResponse> {
        match self {
            RepriceRequest::Shares {
                current_shares,
                average_price,
                market_price,
                additional_shares,
            } => {
                let position = Position::new(current_shares, average_price, market_price);
                let result = reprice_by_shares(&position, additional_shares)?;
                Ok(CalcResponse::RepriceByShares(RepriceSharesResponse {
                    new_average_price: format_money(result.new_average_price),
                    total_shares: format_shares(result.total_shares),
                    additional_investment: format_money(result.additional_investment),
                    summary: SummaryLine::from(&result.summary),
                }))
            }
            RepriceRequest::Price {
                current_shares,
                average_price,
                market_price,
                target_price,
            } => {
                let position = Position::new(current_shares, average_price, market_price);
                let result = reprice_by_target(&position, target_price)?;
                Ok(CalcResponse::RepriceByTarget(RepriceTargetResponse {
                    additional_shares_needed: format_shares(result.additional_shares_needed),
                    total_shares: format_shares(result.total_shares),
                    additional_investment: format_money(result.additional_investment),
                    summary: SummaryLine::from(&result.summary),
                }))
            }
        }
    }
}

impl RebalanceRequest {
    fn execute(self) -> CalcResult<RebalanceResponse> {
        let proposal = calculate_rebalance(&self.holdings, &self.categories)?;
        Ok(RebalanceResponse {
            total_value: format_money(proposal.total_value),
            turnover: format_money(proposal.turnover),
            categories: proposal
                .categories
                .into_iter()
                .map(|c| CategoryLine {
                    category: c.category,
                    symbols: c.symbols,
                    current_value: format_money(c.current_value),
                    current_percent: format_percent(c.current_percent),
                    target_percent: format_percent(c.target_percent),
                    target_value: format_money(c.target_value),
                    difference: format_money(c.difference),
                    action: c.action,
                })
                .collect(),
        })
    }
}

impl HoldingRequest {
    fn execute(self) -> CalcResult<HoldingResponse> {
        let classification = classify_holding(self.purchase_date, self.sale_date)?;
        Ok(HoldingResponse {
            holding_period: classification.description,
            gain_type: classification.gain_type,
            long_term_date: self.purchase_date.and_then(long_term_date),
        })
    }
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum CalcResponse {
    CapitalGains(CapitalGainsResponse),
    RepriceByShares(RepriceSharesResponse),
    RepriceByTarget(RepriceTargetResponse),
    Rebalance(RebalanceResponse),
    Holding(HoldingResponse),
}

#[derive(Debug, Serialize)]
pub struct CapitalGainsResponse {
    pub jurisdiction: String,
    pub currency: &'static str,
    pub filing_status: Option<FilingStatus>,
    pub quantity_sold: String,
    pub cost_basis: String,
    pub purchase_fees: String,
    pub total_purchase_cost: String,
    pub total_sale_proceeds: String,
    pub gross_gain_loss: String,
    pub holding_period: String,
    pub gain_type: GainType,
    pub estimated_tax: String,
    pub net_gain_loss: String,
    pub lots: Vec<LotLine>,
}

#[derive(Debug, Serialize)]
pub struct LotLine {
    pub date: NaiveDate,
    pub quantity: String,
    pub price: String,
    pub cost: String,
    pub fees: String,
    pub fully_consumed: bool,
}

#[derive(Debug, Serialize)]
pub struct SummaryLine {
    pub initial_total_cost: String,
    pub current_value: String,
    pub initial_pnl: String,
    pub total_investment_after: String,
    pub portfolio_value_after: String,
    pub pnl_after: String,
}

impl From<&ScenarioSummary> for SummaryLine {
    fn from(s: &ScenarioSummary) -> Self {
        Self {
            initial_total_cost: format_money(s.initial_total_cost),
            current_value: format_money(s.current_value),
            initial_pnl: format_money(s.initial_pnl),
            total_investment_after: format_money(s.total_investment_after),
            portfolio_value_after: format_money(s.portfolio_value_after),
            pnl_after: format_money(s.pnl_after),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RepriceSharesResponse {
    pub new_average_price: String,
    pub total_shares: String,
    pub additional_investment: String,
    pub summary: SummaryLine,
}

#[derive(Debug, Serialize)]
pub struct RepriceTargetResponse {
    pub additional_shares_needed: String,
    pub total_shares: String,
    pub additional_investment: String,
    pub summary: SummaryLine,
}

#[derive(Debug, Serialize)]
pub struct RebalanceResponse {
    pub total_value: String,
    pub turnover: String,
    pub categories: Vec<CategoryLine>,
}

#[derive(Debug, Serialize)]
pub struct CategoryLine {
    pub category: String,
    pub symbols: Vec<String>,
    pub current_value: String,
    pub current_percent: String,
    pub target_percent: String,
    pub target_value: String,
    pub difference: String,
    pub action: RebalanceAction,
}

#[derive(Debug, Serialize)]
pub struct HoldingResponse {
    pub holding_period: String,
    pub gain_type: GainType,
    pub long_term_date: Option<NaiveDate>,
}

/// Top-level output document
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Envelope {
    Ok {
        kind: &'static str,
        result: CalcResponse,
    },
    Error {
        kind: String,
        message: String,
    },
}

impl Envelope {
    pub fn calc_error(err: &CalcError) -> Self {
        Envelope::Error {
            kind: err.kind().to_string(),
            message: err.to_string(),
        }
    }
}
