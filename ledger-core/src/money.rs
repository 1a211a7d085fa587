//! Money calculation utilities using rust_decimal for precision
//!
//! Amounts are stored as `f64`; every comparison and sum in the refund
//! ledger goes through `Decimal` to avoid float accumulation drift.

use crate::traits::OrderError;
use rust_decimal::prelude::*;

/// Rounding strategy for monetary values (2 decimal places, half-up)
const DECIMAL_PLACES: u32 = 2;

/// Maximum allowed refund amount (1,000,000)
const MAX_AMOUNT: f64 = 1_000_000.0;

/// Convert f64 to Decimal, rounding to 2 places
pub fn to_decimal(value: f64) -> Decimal {
    Decimal::from_f64(value)
        .unwrap_or(Decimal::ZERO)
        .round_dp(DECIMAL_PLACES)
}

/// Convert Decimal back to f64 for storage/serialization
pub fn to_f64(value: Decimal) -> f64 {
    value.round_dp(DECIMAL_PLACES).to_f64().unwrap_or(0.0)
}

/// Validate a caller-supplied monetary amount
pub fn validate_amount(amount: f64) -> Result<(), OrderError> {
    if !amount.is_finite() {
        return Err(OrderError::InvalidAmount(format!(
            "amount must be a finite number, got {}",
            amount
        )));
    }
    if amount <= 0.0 {
        return Err(OrderError::InvalidAmount(format!(
            "amount must be positive, got {}",
            amount
        )));
    }
    if amount > MAX_AMOUNT {
        return Err(OrderError::InvalidAmount(format!(
            "amount exceeds maximum allowed ({}), got {}",
            MAX_AMOUNT, amount
        )));
    }
    Ok(())
}
