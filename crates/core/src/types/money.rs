//! Decimal-backed money type.
//!
//! All catalog prices, cart totals, and order-item snapshots use [`Money`],
//! a thin wrapper over [`rust_decimal::Decimal`]. Decimal arithmetic avoids
//! the float rounding errors that make binary floating point unusable for
//! prices. The store is single-currency, so no currency code is carried.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Tax multiplier applied when deriving a tax-inclusive display price.
const TAX_FACTOR: Decimal = Decimal::from_parts(11, 0, 0, false, 1); // 1.1

/// A non-negative monetary amount in the store currency.
///
/// Serializes as a decimal string (e.g. `"19.99"`), never as a float.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(feature = "postgres", sqlx(transparent))]
pub struct Money(Decimal);

impl Money {
    /// Zero in the store currency.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Wrap a decimal amount.
    #[must_use]
    pub const fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    /// Build an amount from an integer number of cents.
    #[must_use]
    pub const fn from_cents(cents: i64) -> Self {
        Self(Decimal::from_parts(
            // from_parts takes an unsigned 96-bit mantissa split into words
            (cents.unsigned_abs() & 0xFFFF_FFFF) as u32,
            ((cents.unsigned_abs() >> 32) & 0xFFFF_FFFF) as u32,
            0,
            cents < 0,
            2,
        ))
    }

    /// The underlying decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Whether the amount is below zero.
    #[must_use]
    pub fn is_negative(&self) -> bool {
        self.0.is_sign_negative() && !self.0.is_zero()
    }

    /// The line total for `quantity` units at this unit price.
    #[must_use]
    pub fn times(&self, quantity: i32) -> Self {
        Self(self.0 * Decimal::from(quantity))
    }

    /// The tax-inclusive price (unit price x 1.1), rounded to cents.
    #[must_use]
    pub fn with_tax(&self) -> Self {
        Self((self.0 * TAX_FACTOR).round_dp(2))
    }
}

impl std::ops::Add for Money {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl std::iter::Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, std::ops::Add::add)
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "${:.2}", self.0)
    }
}

impl From<Decimal> for Money {
    fn from(amount: Decimal) -> Self {
        Self(amount)
    }
}

impl From<Money> for Decimal {
    fn from(money: Money) -> Self {
        money.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn from_cents_builds_two_decimal_places() {
        assert_eq!(Money::from_cents(1999).amount(), Decimal::new(1999, 2));
        assert_eq!(Money::from_cents(1999).to_string(), "$19.99");
    }

    #[test]
    fn line_totals_multiply_by_quantity() {
        let unit = Money::from_cents(1000);
        assert_eq!(unit.times(2), Money::from_cents(2000));
        assert_eq!(unit.times(0), Money::ZERO);
    }

    #[test]
    fn tax_inclusive_price_rounds_to_cents() {
        assert_eq!(Money::from_cents(1000).with_tax(), Money::from_cents(1100));
        // 9.99 * 1.1 = 10.989 -> 10.99
        assert_eq!(Money::from_cents(999).with_tax(), Money::from_cents(1099));
    }

    #[test]
    fn sums_fold_from_zero() {
        let total: Money = [Money::from_cents(2000), Money::from_cents(500)]
            .into_iter()
            .sum();
        assert_eq!(total, Money::from_cents(2500));
    }

    #[test]
    fn serializes_as_decimal_string() {
        let json = serde_json::to_string(&Money::from_cents(1050)).unwrap();
        assert_eq!(json, "\"10.50\"");
    }

    #[test]
    fn negative_detection() {
        assert!(Money::from_cents(-1).is_negative());
        assert!(!Money::ZERO.is_negative());
        assert!(!Money::from_cents(1).is_negative());
    }
}
