//! Tax rules and output settings from the environment.

use anyhow::{Context, Result};
use rust_decimal::Decimal;
use std::env;
use tax_engine::{LongTermPolicy, TaxRules, UkCgtRules};

/// Runtime settings read from the environment (and `.env` via dotenvy)
#[derive(Debug, Clone)]
pub struct CalcConfig {
    pub rules: TaxRules,
    /// Indent JSON output
    pub pretty_json: bool,
}

impl CalcConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup. Unset keys fall back to the 2024/25 defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = UkCgtRules::default();
        let uk = UkCgtRules {
            annual_exempt_amount: decimal_var(
                &lookup,
                "UK_CGT_ANNUAL_EXEMPT_AMOUNT",
                defaults.annual_exempt_amount,
            )?,
            basic_rate_threshold: decimal_var(
                &lookup,
                "UK_BASIC_RATE_THRESHOLD",
                defaults.basic_rate_threshold,
            )?,
            basic_rate: decimal_var(&lookup, "UK_CGT_BASIC_RATE", defaults.basic_rate)?,
            higher_rate: decimal_var(&lookup, "UK_CGT_HIGHER_RATE", defaults.higher_rate)?,
        };

        let policy: LongTermPolicy = match lookup("US_LONG_TERM_POLICY") {
            Some(raw) => raw.parse().context("Invalid US_LONG_TERM_POLICY")?,
            None => LongTermPolicy::default(),
        };

        let pretty_json = lookup("CALC_PRETTY_JSON")
            .map(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        let defaults = TaxRules::default();
        let config = Self {
            rules: TaxRules {
                uk,
                us: defaults.us.with_long_term_policy(policy),
            },
            pretty_json,
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        let uk = &self.rules.uk;
        for (name, rate) in [
            ("UK_CGT_BASIC_RATE", uk.basic_rate),
            ("UK_CGT_HIGHER_RATE", uk.higher_rate),
        ] {
            if rate < Decimal::ZERO || rate > Decimal::ONE {
                anyhow::bail!("{name} must be between 0 and 1, got {rate}");
            }
        }
        if uk.annual_exempt_amount < Decimal::ZERO || uk.basic_rate_threshold < Decimal::ZERO {
            anyhow::bail!("UK thresholds cannot be negative");
        }
        Ok(())
    }
}

fn decimal_var<F>(lookup: &F, key: &str, default: Decimal) -> Result<Decimal>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("Invalid {key}: {raw:?}")),
        None => Ok(default),
    }
}
