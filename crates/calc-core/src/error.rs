use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CalcError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Sale quantity ({requested}) exceeds total owned quantity ({available})")]
    InsufficientQuantity {
        requested: Decimal,
        available: Decimal,
    },

    #[error("Unreachable target: {0}")]
    Unreachable(String),

    #[error("Division by zero: {0}")]
    DivisionByZero(String),
}

impl CalcError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        CalcError::InvalidInput(msg.into())
    }

    pub fn unreachable(msg: impl Into<String>) -> Self {
        CalcError::Unreachable(msg.into())
    }

    /// An intermediate amount no longer fits in a `Decimal`.
    pub fn out_of_range() -> Self {
        CalcError::InvalidInput("amount out of range".to_string())
    }

    /// Stable tag used when the error crosses a serialization boundary.
    pub fn kind(&self) -> &'static str {
        match self {
            CalcError::InvalidInput(_) => "invalid_input",
            CalcError::InsufficientQuantity { .. } => "insufficient_quantity",
            CalcError::Unreachable(_) => "unreachable",
            CalcError::DivisionByZero(_) => "division_by_zero",
        }
    }
}

pub type CalcResult<T> = Result<T, CalcError>;
