use rust_decimal::{Decimal, RoundingStrategy};

use crate::core::{AppError, Result};

/// Decimal places kept for every stored money amount
pub const MONEY_SCALE: u32 = 2;

/// Tolerance used when comparing money sums (0.01 currency units)
pub const TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// Rounds a computed amount to the money scale (midpoint away from zero)
pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

/// True when two amounts differ by no more than [`TOLERANCE`]
pub fn within_tolerance(a: Decimal, b: Decimal) -> bool {
    (a - b).abs() <= TOLERANCE
}

/// Validates a caller-supplied positive money amount
///
/// Rejects zero, negatives and amounts with more than two decimal places.
pub fn validate_positive_amount(amount: Decimal, field: &str) -> Result<()> {
    if amount <= Decimal::ZERO {
        return Err(AppError::validation(format!("{} must be positive", field)));
    }

    if amount.normalize().scale() > MONEY_SCALE {
        return Err(AppError::validation(format!(
            "{} must have at most {} decimal places, got {}",
            field, MONEY_SCALE, amount
        )));
    }

    Ok(())
}
