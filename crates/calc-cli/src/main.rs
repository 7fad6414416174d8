//! calc-cli: run one calculation request and print the result as JSON.
//!
//! Usage:
//!   calc-cli request.json
//!   cat request.json | calc-cli -
//!
//! The request is tagged by `kind`: `capital_gains`, `reprice`, `rebalance`
//! or `holding`. On failure an error document is printed and the exit
//! status is 1.

mod config;
mod wire;

use anyhow::{Context, Result};
use config::CalcConfig;
use std::io::Read;
use std::process::ExitCode;
use tax_engine::TaxCalculator;
use wire::{CalcRequest, Envelope};

const USAGE: &str = "usage: calc-cli <request.json | ->";

fn main() -> Result<ExitCode> {
    dotenvy::dotenv().ok();
    init_tracing();

    let args: Vec<String> = std::env::args().collect();
    if args.iter().any(|a| a == "--help" || a == "-h") {
        println!("{USAGE}");
        return Ok(ExitCode::SUCCESS);
    }
    let source = args.get(1).map(String::as_str).unwrap_or("-");

    let config = CalcConfig::from_env()?;
    tracing::debug!(policy = ?config.rules.us.long_term_policy, "Configuration loaded");
    let calculator = TaxCalculator::new(config.rules.clone());

    let (envelope, ok) = match read_input(source) {
        Ok(raw) => respond(&raw, &calculator),
        Err(e) => {
            tracing::error!("Failed to read request: {e:#}");
            (
                Envelope::Error {
                    kind: "io_error".to_string(),
                    message: format!("{e:#}"),
                },
                false,
            )
        }
    };

    let doc = if config.pretty_json {
        serde_json::to_string_pretty(&envelope)?
    } else {
        serde_json::to_string(&envelope)?
    };
    println!("{doc}");

    Ok(if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}

/// Parse and run a request; the flag is false when the envelope is an error.
fn respond(raw: &str, calculator: &TaxCalculator) -> (Envelope, bool) {
    let request: CalcRequest = match serde_json::from_str(raw) {
        Ok(r) => r,
        Err(e) => {
            tracing::warn!("Rejected malformed request: {e}");
            return (
                Envelope::Error {
                    kind: "invalid_input".to_string(),
                    message: format!("Invalid request: {e}"),
                },
                false,
            );
        }
    };

    let kind = request.kind();
    match request.execute(calculator) {
        Ok(result) => {
            tracing::info!(kind, "Calculation complete");
            (Envelope::Ok { kind, result }, true)
        }
        Err(e) => {
            tracing::warn!(kind, error = %e, "Calculation failed");
            (Envelope::calc_error(&e), false)
        }
    }
}

fn read_input(source: &str) -> Result<String> {
    if source == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read request from stdin")?;
        Ok(buf)
    } else {
        std::fs::read_to_string(source).with_context(|| format!("Failed to read {source}"))
    }
}

/// Logs go to stderr so stdout carries only the JSON document.
fn init_tracing() {
    let filter = || {
        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            tracing_subscriber::EnvFilter::new(
                "calc_cli=info,tax_engine=warn,portfolio_planner=warn",
            )
        })
    };

    let json_logging = std::env::var("RUST_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);
    if json_logging {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter())
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter())
            .with_writer(std::io::stderr)
            .init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_respond_rejects_malformed_json() {
        let (envelope, ok) = respond("{not json", &TaxCalculator::default());
        assert!(!ok);
        let doc = serde_json::to_value(envelope).unwrap();
        assert_eq!(doc["status"], "error");
        assert_eq!(doc["kind"], "invalid_input");
    }

    #[test]
    fn test_respond_rejects_unknown_kind() {
        let (_, ok) = respond(r#"{"kind":"dividends"}"#, &TaxCalculator::default());
        assert!(!ok);
    }

    #[test]
    fn test_respond_ok() {
        let raw = r#"{"kind":"reprice","mode":"shares","current_shares":10,
            "average_price":"5","market_price":"5","additional_shares":"0"}"#;
        let (envelope, ok) = respond(raw, &TaxCalculator::default());
        assert!(ok);
        let doc = serde_json::to_value(envelope).unwrap();
        assert_eq!(doc["kind"], "reprice");
        assert_eq!(doc["result"]["new_average_price"], "5.00");
    }

    #[test]
    fn test_overflowing_request_yields_error_document() {
        let raw = r#"{"kind":"reprice","mode":"shares","current_shares":"100000000000000000",
            "average_price":"100000000000000000","market_price":"5","additional_shares":"0"}"#;
        let (envelope, ok) = respond(raw, &TaxCalculator::default());
        assert!(!ok);
        let doc = serde_json::to_value(envelope).unwrap();
        assert_eq!(doc["status"], "error");
        assert_eq!(doc["kind"], "invalid_input");
        assert_eq!(doc["message"], "Invalid input: amount out of range");
    }

    #[test]
    fn test_calc_error_envelope() {
        let raw = r#"{"kind":"reprice","mode":"price","current_shares":10,
            "average_price":5,"market_price":0,"target_price":4}"#;
        let (envelope, ok) = respond(raw, &TaxCalculator::default());
        assert!(!ok);
        let doc = serde_json::to_value(envelope).unwrap();
        assert_eq!(doc["kind"], "invalid_input");
        assert!(doc["message"].as_str().unwrap().contains("market price"));
    }
}
