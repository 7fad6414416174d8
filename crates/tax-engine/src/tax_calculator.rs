//! Tax Calculator
//!
//! Simplified capital gains tax for the UK and US. Rates and thresholds are
//! plain data on [`TaxRules`] so a different tax year can be swapped in.

use crate::holding::GainType;
use calc_core::{quantize_money, try_add, try_mul, CalcError, CalcResult};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Supported tax jurisdictions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaxJurisdiction {
    /// United Kingdom - annual exempt amount, basic/higher CGT bands
    UK,
    /// United States - ordinary rates for short-term, 0/15/20% for long-term
    US,
}

impl std::fmt::Display for TaxJurisdiction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaxJurisdiction::UK => write!(f, "United Kingdom"),
            TaxJurisdiction::US => write!(f, "United States"),
        }
    }
}

impl TaxJurisdiction {
    /// Currency symbol used when presenting amounts
    pub fn currency_symbol(&self) -> &'static str {
        match self {
            TaxJurisdiction::UK => "£",
            TaxJurisdiction::US => "$",
        }
    }
}

/// US filing status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilingStatus {
    Single,
    MarriedJointly,
    MarriedSeparately,
    HeadOfHousehold,
}

impl FilingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FilingStatus::Single => "single",
            FilingStatus::MarriedJointly => "married_jointly",
            FilingStatus::MarriedSeparately => "married_separately",
            FilingStatus::HeadOfHousehold => "head_of_household",
        }
    }

    /// Parse a filing status, falling back to `Single` for anything unknown.
    pub fn parse_or_single(value: &str) -> Self {
        value.parse().unwrap_or_else(|_| {
            tracing::warn!(filing_status = value, "Unknown filing status, using single");
            FilingStatus::Single
        })
    }
}

impl std::str::FromStr for FilingStatus {
    type Err = CalcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "single" => Ok(FilingStatus::Single),
            "married_jointly" => Ok(FilingStatus::MarriedJointly),
            "married_separately" => Ok(FilingStatus::MarriedSeparately),
            "head_of_household" => Ok(FilingStatus::HeadOfHousehold),
            other => Err(CalcError::invalid(format!("unknown filing status '{other}'"))),
        }
    }
}

impl std::fmt::Display for FilingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The filer's tax situation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaxProfile {
    jurisdiction: TaxJurisdiction,
    annual_income: Decimal,
    filing_status: Option<FilingStatus>,
}

impl TaxProfile {
    /// Create a profile. Income must be non-negative and US filers need a
    /// filing status.
    pub fn new(
        jurisdiction: TaxJurisdiction,
        annual_income: Decimal,
        filing_status: Option<FilingStatus>,
    ) -> CalcResult<Self> {
        if annual_income < Decimal::ZERO {
            return Err(CalcError::invalid(format!(
                "annual income cannot be negative, got {annual_income}"
            )));
        }
        if jurisdiction == TaxJurisdiction::US && filing_status.is_none() {
            return Err(CalcError::invalid("a filing status is required for US tax"));
        }
        Ok(Self {
            jurisdiction,
            annual_income,
            filing_status,
        })
    }

    pub fn uk(annual_income: Decimal) -> CalcResult<Self> {
        Self::new(TaxJurisdiction::UK, annual_income, None)
    }

    pub fn us(annual_income: Decimal, filing_status: FilingStatus) -> CalcResult<Self> {
        Self::new(TaxJurisdiction::US, annual_income, Some(filing_status))
    }

    pub fn jurisdiction(&self) -> TaxJurisdiction {
        self.jurisdiction
    }

    pub fn annual_income(&self) -> Decimal {
        self.annual_income
    }

    pub fn filing_status(&self) -> Option<FilingStatus> {
        self.filing_status
    }
}

/// UK CGT parameters (2024/25 defaults)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UkCgtRules {
    pub annual_exempt_amount: Decimal,
    /// Upper limit of the basic-rate income band
    pub basic_rate_threshold: Decimal,
    pub basic_rate: Decimal,
    pub higher_rate: Decimal,
}

impl Default for UkCgtRules {
    fn default() -> Self {
        Self {
            annual_exempt_amount: dec!(3000.00),
            basic_rate_threshold: dec!(50270.00),
            basic_rate: dec!(0.10),
            higher_rate: dec!(0.20),
        }
    }
}

/// Ordinary income bracket: `rate` applies above `threshold`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrdinaryBracket {
    pub threshold: Decimal,
    pub rate: Decimal,
}

/// Long-term capital gains bracket: `rate` applies up to and including
/// `upper` (`None` = no ceiling)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LongTermBracket {
    pub upper: Option<Decimal>,
    pub rate: Decimal,
}

/// How long-term brackets are applied to a gain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LongTermPolicy {
    /// The bracket containing the filer's income (gain excluded) sets one
    /// rate for the entire gain.
    #[default]
    WholeGainSingleBracket,
    /// The gain is stacked on top of income and each slice is taxed at the
    /// rate of the bracket it lands in.
    MarginalBlend,
}

impl std::str::FromStr for LongTermPolicy {
    type Err = CalcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "whole_gain" | "whole_gain_single_bracket" | "single_bracket" => {
                Ok(LongTermPolicy::WholeGainSingleBracket)
            }
            "marginal_blend" | "marginal" | "blend" => Ok(LongTermPolicy::MarginalBlend),
            other => Err(CalcError::invalid(format!(
                "unknown long-term policy '{other}'"
            ))),
        }
    }
}

/// Long-term bracket tables per filing status
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LongTermTables {
    pub single: Vec<LongTermBracket>,
    pub married_jointly: Vec<LongTermBracket>,
    pub married_separately: Vec<LongTermBracket>,
    pub head_of_household: Vec<LongTermBracket>,
}

impl LongTermTables {
    pub fn for_status(&self, status: FilingStatus) -> &[LongTermBracket] {
        match status {
            FilingStatus::Single => &self.single,
            FilingStatus::MarriedJointly => &self.married_jointly,
            FilingStatus::MarriedSeparately => &self.married_separately,
            FilingStatus::HeadOfHousehold => &self.head_of_household,
        }
    }
}

fn three_tier(zero_upper: Decimal, fifteen_upper: Decimal) -> Vec<LongTermBracket> {
    vec![
        LongTermBracket {
            upper: Some(zero_upper),
            rate: dec!(0.00),
        },
        LongTermBracket {
            upper: Some(fifteen_upper),
            rate: dec!(0.15),
        },
        LongTermBracket {
            upper: None,
            rate: dec!(0.20),
        },
    ]
}

impl Default for LongTermTables {
    fn default() -> Self {
        Self {
            single: three_tier(dec!(47025), dec!(518900)),
            married_jointly: three_tier(dec!(94050), dec!(583750)),
            married_separately: three_tier(dec!(47025), dec!(291875)),
            head_of_household: three_tier(dec!(63000), dec!(329300)),
        }
    }
}

/// US CGT parameters (2024 defaults)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsCgtRules {
    /// Single-filer ordinary brackets, ascending thresholds
    pub ordinary_brackets: Vec<OrdinaryBracket>,
    pub long_term: LongTermTables,
    pub long_term_policy: LongTermPolicy,
}

impl Default for UsCgtRules {
    fn default() -> Self {
        let ordinary = [
            (dec!(0), dec!(0.10)),
            (dec!(11600), dec!(0.12)),
            (dec!(47150), dec!(0.22)),
            (dec!(100525), dec!(0.24)),
            (dec!(191950), dec!(0.32)),
            (dec!(243725), dec!(0.35)),
            (dec!(609350), dec!(0.37)),
        ];
        Self {
            ordinary_brackets: ordinary
                .into_iter()
                .map(|(threshold, rate)| OrdinaryBracket { threshold, rate })
                .collect(),
            long_term: LongTermTables::default(),
            long_term_policy: LongTermPolicy::default(),
        }
    }
}

impl UsCgtRules {
    pub fn with_long_term_policy(mut self, policy: LongTermPolicy) -> Self {
        self.long_term_policy = policy;
        self
    }

    /// Marginal ordinary rate for a total income: the rate of the highest
    /// bracket whose threshold lies strictly below it.
    pub fn ordinary_rate(&self, total_income: Decimal) -> Decimal {
        self.ordinary_brackets
            .iter()
            .filter(|b| total_income > b.threshold)
            .map(|b| b.rate)
            .last()
            .unwrap_or(Decimal::ZERO)
    }
}

/// Tax rules for all supported jurisdictions
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxRules {
    pub uk: UkCgtRules,
    pub us: UsCgtRules,
}

/// UK capital gains tax on a gross gain.
///
/// Ordinary income is assumed to fill the basic-rate band first; the taxable
/// gain uses what is left of it at the basic rate, the rest at the higher rate.
pub fn compute_uk_cgt(gross_gain: Decimal, annual_income: Decimal, rules: &UkCgtRules) -> Decimal {
    if gross_gain <= Decimal::ZERO {
        return quantize_money(Decimal::ZERO);
    }

    let taxable_gain = gross_gain - rules.annual_exempt_amount;
    if taxable_gain <= Decimal::ZERO {
        return quantize_money(Decimal::ZERO);
    }

    let remaining_basic_band = (rules.basic_rate_threshold - annual_income).max(Decimal::ZERO);
    let basic_rate_gain = remaining_basic_band.min(taxable_gain);
    let higher_rate_gain = taxable_gain - basic_rate_gain;

    let payable = basic_rate_gain * rules.basic_rate + higher_rate_gain * rules.higher_rate;

    tracing::debug!(
        %taxable_gain,
        %basic_rate_gain,
        %higher_rate_gain,
        %payable,
        "UK CGT computed"
    );

    quantize_money(payable)
}

/// US capital gains tax on a gross gain.
///
/// Short-term gains take the single ordinary rate of the bracket holding
/// income + gain, applied to the whole gain. Long-term gains follow
/// [`UsCgtRules::long_term_policy`].
pub fn compute_us_cgt(
    gross_gain: Decimal,
    annual_income: Decimal,
    filing_status: FilingStatus,
    gain_type: GainType,
    rules: &UsCgtRules,
) -> CalcResult<Decimal> {
    if gross_gain <= Decimal::ZERO {
        return Ok(quantize_money(Decimal::ZERO));
    }

    let payable = match gain_type {
        GainType::ShortTerm => {
            let total_income = try_add(annual_income, gross_gain)?;
            try_mul(gross_gain, rules.ordinary_rate(total_income))?
        }
        GainType::LongTerm => {
            let brackets = rules.long_term.for_status(filing_status);
            match rules.long_term_policy {
                LongTermPolicy::WholeGainSingleBracket => {
                    try_mul(gross_gain, long_term_rate_for_income(brackets, annual_income))?
                }
                LongTermPolicy::MarginalBlend => {
                    long_term_blended(brackets, annual_income, gross_gain)?
                }
            }
        }
        GainType::NotApplicable => {
            return Err(CalcError::invalid(
                "US tax needs purchase and sale dates to classify the gain",
            ));
        }
    };

    tracing::debug!(
        %gross_gain,
        %annual_income,
        %filing_status,
        ?gain_type,
        %payable,
        "US CGT computed"
    );

    Ok(quantize_money(payable))
}

/// Rate of the first bracket whose ceiling covers `income`.
fn long_term_rate_for_income(brackets: &[LongTermBracket], income: Decimal) -> Decimal {
    brackets
        .iter()
        .find(|b| b.upper.map_or(true, |upper| income <= upper))
        .or_else(|| brackets.last())
        .map(|b| b.rate)
        .unwrap_or(Decimal::ZERO)
}

/// Tax on `gain` stacked above `income`, slice by slice.
fn long_term_blended(
    brackets: &[LongTermBracket],
    income: Decimal,
    gain: Decimal,
) -> CalcResult<Decimal> {
    let mut tax = Decimal::ZERO;
    let mut floor = Decimal::ZERO;
    let top = try_add(income, gain)?;

    for bracket in brackets {
        let ceiling = bracket.upper.unwrap_or(top).min(top);
        let lower = floor.max(income);
        if ceiling > lower {
            tax = try_add(tax, try_mul(ceiling - lower, bracket.rate)?)?;
        }
        if let Some(upper) = bracket.upper {
            floor = upper;
        }
        if ceiling >= top {
            break;
        }
    }

    Ok(tax)
}

/// Jurisdiction dispatcher over a set of [`TaxRules`]
#[derive(Debug, Clone, Default)]
pub struct TaxCalculator {
    rules: TaxRules,
}

impl TaxCalculator {
    pub fn new(rules: TaxRules) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &TaxRules {
        &self.rules
    }

    /// Tax payable on `gross_gain` for the given profile.
    pub fn tax_for(
        &self,
        profile: &TaxProfile,
        gross_gain: Decimal,
        gain_type: GainType,
    ) -> CalcResult<Decimal> {
        match profile.jurisdiction() {
            TaxJurisdiction::UK => Ok(compute_uk_cgt(
                gross_gain,
                profile.annual_income(),
                &self.rules.uk,
            )),
            TaxJurisdiction::US => {
                let status = profile.filing_status().ok_or_else(|| {
                    CalcError::invalid("a filing status is required for US tax")
                })?;
                compute_us_cgt(
                    gross_gain,
                    profile.annual_income(),
                    status,
                    gain_type,
                    &self.rules.us,
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uk(gain: Decimal, income: Decimal) -> Decimal {
        compute_uk_cgt(gain, income, &UkCgtRules::default())
    }

    fn us(gain: Decimal, income: Decimal, status: FilingStatus, gain_type: GainType) -> Decimal {
        compute_us_cgt(gain, income, status, gain_type, &UsCgtRules::default()).unwrap()
    }

    fn us_blend(gain: Decimal, income: Decimal, status: FilingStatus) -> Decimal {
        let rules = UsCgtRules::default().with_long_term_policy(LongTermPolicy::MarginalBlend);
        compute_us_cgt(gain, income, status, GainType::LongTerm, &rules).unwrap()
    }

    #[test]
    fn test_uk_gain_within_basic_band() {
        let tax = uk(dec!(5000.00), dec!(30000.00));
        assert_eq!(tax, dec!(200.00));
        assert_eq!(tax.to_string(), "200.00");
    }

    #[test]
    fn test_uk_gain_split_across_bands() {
        // 17000 taxable: 10270 @ 10% + 6730 @ 20%
        assert_eq!(uk(dec!(20000.00), dec!(40000.00)), dec!(2373.00));
    }

    #[test]
    fn test_uk_income_above_threshold_all_higher_rate() {
        assert_eq!(uk(dec!(13000), dec!(80000)), dec!(2000.00));
    }

    #[test]
    fn test_uk_gain_under_exemption_is_free() {
        assert_eq!(uk(dec!(3000.00), dec!(10000)), Decimal::ZERO);
        assert_eq!(uk(dec!(-500), dec!(10000)), Decimal::ZERO);
        assert_eq!(uk(Decimal::ZERO, Decimal::ZERO).to_string(), "0.00");
    }

    #[test]
    fn test_uk_payable_rounds_half_to_even() {
        // taxable 0.05 → 0.005 payable
        assert_eq!(uk(dec!(3000.05), dec!(0)), dec!(0.00));
        assert_eq!(uk(dec!(3000.15), dec!(0)), dec!(0.02));
        assert_eq!(uk(dec!(3000.25), dec!(0)), dec!(0.02));
    }

    #[test]
    fn test_uk_custom_exempt_amount() {
        let rules = UkCgtRules {
            annual_exempt_amount: dec!(6000),
            ..UkCgtRules::default()
        };
        assert_eq!(compute_uk_cgt(dec!(5000), dec!(30000), &rules), Decimal::ZERO);
    }

    #[test]
    fn test_us_short_term_uses_single_marginal_rate() {
        // 75000 + 10000 = 85000 → 22% bracket on the whole gain
        assert_eq!(
            us(dec!(10000), dec!(75000), FilingStatus::Single, GainType::ShortTerm),
            dec!(2200.00)
        );
        // gain pushes total over 100525 → 24% on the whole gain
        assert_eq!(
            us(dec!(10000), dec!(95000), FilingStatus::Single, GainType::ShortTerm),
            dec!(2400.00)
        );
    }

    #[test]
    fn test_us_short_term_bracket_boundary() {
        // exactly on 11600 stays at 10%
        assert_eq!(
            us(dec!(600), dec!(11000), FilingStatus::Single, GainType::ShortTerm),
            dec!(60.00)
        );
        assert_eq!(
            us(dec!(601), dec!(11000), FilingStatus::Single, GainType::ShortTerm),
            dec!(72.12)
        );
        assert_eq!(
            us(dec!(1000), dec!(700000), FilingStatus::Single, GainType::ShortTerm),
            dec!(370.00)
        );
    }

    #[test]
    fn test_us_long_term_whole_gain_keyed_on_income() {
        assert_eq!(
            us(dec!(10000), dec!(40000), FilingStatus::Single, GainType::LongTerm),
            Decimal::ZERO
        );
        // gain would cross 47025 but only income selects the bracket
        assert_eq!(
            us(dec!(100000), dec!(47025), FilingStatus::Single, GainType::LongTerm),
            dec!(0.00)
        );
        assert_eq!(
            us(dec!(10000), dec!(47026), FilingStatus::Single, GainType::LongTerm),
            dec!(1500.00)
        );
        assert_eq!(
            us(dec!(10000), dec!(600000), FilingStatus::Single, GainType::LongTerm),
            dec!(2000.00)
        );
    }

    #[test]
    fn test_us_long_term_filing_status_tables() {
        let gain = dec!(10000);
        let income = dec!(90000);
        assert_eq!(us(gain, income, FilingStatus::MarriedJointly, GainType::LongTerm), dec!(0));
        assert_eq!(us(gain, income, FilingStatus::Single, GainType::LongTerm), dec!(1500));
        assert_eq!(
            us(gain, dec!(300000), FilingStatus::MarriedSeparately, GainType::LongTerm),
            dec!(2000)
        );
        assert_eq!(
            us(gain, dec!(60000), FilingStatus::HeadOfHousehold, GainType::LongTerm),
            dec!(0)
        );
    }

    #[test]
    fn test_us_long_term_marginal_blend() {
        // 40000 income, 10000 gain: 7025 @ 0% + 2975 @ 15%
        assert_eq!(us_blend(dec!(10000), dec!(40000), FilingStatus::Single), dec!(446.25));
        // entirely inside the 15% band
        assert_eq!(us_blend(dec!(10000), dec!(100000), FilingStatus::Single), dec!(1500.00));
        // crosses into 20%: 8900 @ 15% + 1100 @ 20%
        assert_eq!(us_blend(dec!(10000), dec!(510000), FilingStatus::Single), dec!(1555.00));
        // income already above the top ceiling
        assert_eq!(us_blend(dec!(10000), dec!(900000), FilingStatus::Single), dec!(2000.00));
    }

    #[test]
    fn test_us_non_positive_gain_is_zero() {
        assert_eq!(
            us(dec!(-100), dec!(50000), FilingStatus::Single, GainType::ShortTerm),
            Decimal::ZERO
        );
    }

    #[test]
    fn test_us_income_plus_gain_overflow_is_an_error() {
        let rules = UsCgtRules::default();
        let err = compute_us_cgt(
            Decimal::MAX,
            dec!(1),
            FilingStatus::Single,
            GainType::ShortTerm,
            &rules,
        )
        .unwrap_err();
        assert_eq!(err, CalcError::out_of_range());

        let rules = rules.with_long_term_policy(LongTermPolicy::MarginalBlend);
        assert!(
            compute_us_cgt(Decimal::MAX, dec!(1), FilingStatus::Single, GainType::LongTerm, &rules)
                .is_err()
        );
    }

    #[test]
    fn test_us_requires_classified_gain() {
        let result = compute_us_cgt(
            dec!(100),
            dec!(50000),
            FilingStatus::Single,
            GainType::NotApplicable,
            &UsCgtRules::default(),
        );
        assert!(matches!(result, Err(CalcError::InvalidInput(_))));
    }

    #[test]
    fn test_filing_status_parsing() {
        assert_eq!("married_jointly".parse::<FilingStatus>().unwrap(), FilingStatus::MarriedJointly);
        assert!("widowed".parse::<FilingStatus>().is_err());
        assert_eq!(FilingStatus::parse_or_single("widowed"), FilingStatus::Single);
        assert_eq!(
            FilingStatus::parse_or_single("Head_Of_Household"),
            FilingStatus::HeadOfHousehold
        );
    }

    #[test]
    fn test_long_term_policy_parsing() {
        assert_eq!(
            "marginal_blend".parse::<LongTermPolicy>().unwrap(),
            LongTermPolicy::MarginalBlend
        );
        assert_eq!(
            "whole_gain".parse::<LongTermPolicy>().unwrap(),
            LongTermPolicy::WholeGainSingleBracket
        );
        assert!("progressive".parse::<LongTermPolicy>().is_err());
    }

    #[test]
    fn test_profile_validation() {
        assert!(TaxProfile::uk(dec!(-1)).is_err());
        assert!(TaxProfile::new(TaxJurisdiction::US, dec!(1000), None).is_err());
        let profile = TaxProfile::us(dec!(1000), FilingStatus::Single).unwrap();
        assert_eq!(profile.filing_status(), Some(FilingStatus::Single));
    }

    #[test]
    fn test_calculator_dispatch() {
        let calc = TaxCalculator::default();
        let uk_profile = TaxProfile::uk(dec!(30000)).unwrap();
        assert_eq!(
            calc.tax_for(&uk_profile, dec!(5000), GainType::NotApplicable).unwrap(),
            dec!(200)
        );

        let us_profile = TaxProfile::us(dec!(75000), FilingStatus::Single).unwrap();
        assert_eq!(
            calc.tax_for(&us_profile, dec!(10000), GainType::ShortTerm).unwrap(),
            dec!(2200)
        );
    }
}
