//! Monetary type for treasury balances and salaries.

use rust_decimal::Decimal;

/// Money represented as a Decimal for precision.
pub type Money = Decimal;

/// Clamp an amount to the non-negative range.
#[must_use]
pub fn non_negative(amount: Money) -> Money {
    amount.max(Decimal::ZERO)
}
