//! The module contains the errors the engine can throw.
//!
//! The two errors specific to settlement math are:
//!
//! - [`InvalidInput`] thrown when ledger facts are rejected before
//!   aggregation (mixed currencies, unknown members, non-positive amounts).
//! - [`BalanceIntegrity`] thrown when aggregated balances fail to sum to
//!   zero within tolerance. This signals an upstream data bug and is never
//!   silently corrected.
//!
//! [`InvalidInput`]: EngineError::InvalidInput
//! [`BalanceIntegrity`]: EngineError::BalanceIntegrity
use sea_orm::DbErr;
use thiserror::Error;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Balance integrity violated: {0}")]
    BalanceIntegrity(String),
    #[error("\"{0}\" key not found!")]
    KeyNotFound(String),
    #[error("\"{0}\" already present!")]
    ExistingKey(String),
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("Currency mismatch: {0}")]
    CurrencyMismatch(String),
    #[error("Invalid id: {0}")]
    InvalidId(String),
    #[error(transparent)]
    Database(#[from] DbErr),
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::InvalidInput(a), Self::InvalidInput(b)) => a == b,
            (Self::BalanceIntegrity(a), Self::BalanceIntegrity(b)) => a == b,
            (Self::KeyNotFound(a), Self::KeyNotFound(b)) => a == b,
            (Self::ExistingKey(a), Self::ExistingKey(b)) => a == b,
            (Self::Forbidden(a), Self::Forbidden(b)) => a == b,
            (Self::CurrencyMismatch(a), Self::CurrencyMismatch(b)) => a == b,
            (Self::InvalidId(a), Self::InvalidId(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}
