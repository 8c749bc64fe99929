//! Internal helpers for model validation and conversion.
//!
//! These utilities are **not** part of the public API. They centralize
//! validation and mapping logic so the engine enforces consistent
//! invariants.

use uuid::Uuid;

use crate::{Currency, EngineError, ResultEngine};

/// Parse a UUID from storage and return a labeled error on failure.
pub(crate) fn parse_uuid(value: &str, label: &str) -> ResultEngine<Uuid> {
    Uuid::parse_str(value).map_err(|_| EngineError::InvalidId(format!("invalid {label} id")))
}

/// Parse a currency code stored in the DB into a strongly typed `Currency`.
pub(crate) fn model_currency(value: &str) -> ResultEngine<Currency> {
    Currency::try_from(value)
        .map_err(|_| EngineError::InvalidInput(format!("invalid currency: {value}")))
}

/// Ensure a stored currency matches the group currency.
pub(crate) fn ensure_group_currency(
    group_currency: Currency,
    actual: Currency,
) -> ResultEngine<()> {
    if group_currency != actual {
        return Err(EngineError::CurrencyMismatch(format!(
            "group currency is {}, got {}",
            group_currency.code(),
            actual.code()
        )));
    }
    Ok(())
}
