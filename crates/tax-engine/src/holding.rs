//! Holding Period
//!
//! Calendar-aware holding period and short/long-term classification.

use calc_core::{CalcError, CalcResult};
use chrono::{Datelike, Months, NaiveDate};
use serde::{Deserialize, Serialize};

/// Short/long-term classification of a gain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GainType {
    ShortTerm,
    LongTerm,
    /// Dates were not supplied
    NotApplicable,
}

impl GainType {
    pub fn is_long_term(&self) -> bool {
        matches!(self, GainType::LongTerm)
    }
}

impl std::fmt::Display for GainType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GainType::ShortTerm => write!(f, "Short-Term"),
            GainType::LongTerm => write!(f, "Long-Term"),
            GainType::NotApplicable => write!(f, "N/A"),
        }
    }
}

/// Years/months/days between two dates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HoldingSpan {
    pub years: u32,
    pub months: u32,
    pub days: u32,
}

impl HoldingSpan {
    /// Calendar difference from `start` to `end`.
    ///
    /// Whole months are counted first (anchoring on `start` and clamping to
    /// month end), then the leftover days. Returns `None` if `end < start`
    /// or an intermediate date falls outside the calendar.
    pub fn between(start: NaiveDate, end: NaiveDate) -> Option<Self> {
        if end < start {
            return None;
        }

        let month_diff =
            (end.year() - start.year()) * 12 + end.month() as i32 - start.month() as i32;
        let mut whole_months = month_diff.max(0) as u32;
        let mut anchor = add_months(start, whole_months)?;
        if anchor > end {
            whole_months -= 1;
            anchor = add_months(start, whole_months)?;
        }

        let days = (end - anchor).num_days() as u32;
        Some(Self {
            years: whole_months / 12,
            months: whole_months % 12,
            days,
        })
    }
}

impl std::fmt::Display for HoldingSpan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.years >= 1 {
            write!(
                f,
                "{} year(s), {} month(s), {} day(s)",
                self.years, self.months, self.days
            )
        } else if self.months > 0 {
            write!(f, "{} month(s), {} day(s)", self.months, self.days)
        } else {
            write!(f, "{} day(s)", self.days)
        }
    }
}

/// Holding period classification for a purchase/sale pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HoldingClassification {
    pub period: Option<HoldingSpan>,
    pub description: String,
    pub gain_type: GainType,
}

impl HoldingClassification {
    fn not_applicable() -> Self {
        Self {
            period: None,
            description: "N/A".to_string(),
            gain_type: GainType::NotApplicable,
        }
    }
}

/// First date on which a holding bought on `purchase_date` counts as long-term.
///
/// One calendar year later, clamped to month end (Feb 29 → Feb 28).
pub fn long_term_date(purchase_date: NaiveDate) -> Option<NaiveDate> {
    purchase_date.checked_add_months(Months::new(12))
}

/// Classify a holding period.
///
/// Missing dates yield `NotApplicable`. A sale before the purchase is an
/// input error rather than a negative period.
pub fn classify_holding(
    purchase_date: Option<NaiveDate>,
    sale_date: Option<NaiveDate>,
) -> CalcResult<HoldingClassification> {
    let (purchase, sale) = match (purchase_date, sale_date) {
        (Some(p), Some(s)) => (p, s),
        _ => return Ok(HoldingClassification::not_applicable()),
    };

    if sale < purchase {
        return Err(CalcError::invalid(format!(
            "sale date {sale} cannot be before purchase date {purchase}"
        )));
    }

    let span = HoldingSpan::between(purchase, sale).ok_or_else(|| {
        CalcError::invalid(format!(
            "holding period from {purchase} to {sale} is out of range"
        ))
    })?;

    // an anniversary past the end of the calendar is never reached
    let gain_type = match long_term_date(purchase) {
        Some(anniversary) if sale >= anniversary => GainType::LongTerm,
        _ => GainType::ShortTerm,
    };

    Ok(HoldingClassification {
        period: Some(span),
        description: span.to_string(),
        gain_type,
    })
}

fn add_months(date: NaiveDate, months: u32) -> Option<NaiveDate> {
    date.checked_add_months(Months::new(months))
}
