//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Decimal Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In JavaScript/floating point:                                          │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  Subtotals are compared against inclusive range bounds. A subtotal     │
//! │  of 150 that drifts to 150.00000000000003 silently misses the          │
//! │  [50, 150] amount rule.                                                │
//! │                                                                         │
//! │  OUR SOLUTION: base-10 Decimal                                          │
//! │    "0.1" + "0.2" = "0.3" exactly                                        │
//! │    Prices keep whatever precision the checkout sent (0, 2, 3 places)   │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use promo_core::money::Money;
//!
//! let price: Money = "10.99".parse().unwrap();
//! let line_total = price * 2;                       // 21.98
//! let total = line_total + "0.02".parse::<Money>().unwrap();
//! assert_eq!(total.to_string(), "22.00");
//! ```

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};
use std::str::FromStr;
use ts_rs::TS;

use crate::error::ValidationError;

// =============================================================================
// Money Type
// =============================================================================

/// Represents a monetary value as an exact decimal.
///
/// ## Design Decisions
/// - **Decimal (signed)**: Negative values are representable so validation
///   can reject them explicitly instead of failing to parse
/// - **Single field tuple struct**: Zero-cost abstraction over Decimal
/// - **Serde as string**: `"10.50"` on the wire, never a JSON float
///
/// ## Where Money is Used
/// ```text
/// CartLine.unit_price ──► × quantity ──► uncovered subtotal
///                                              │
///                                              ▼
///                               AmountRule [from, to] comparison
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
)]
#[ts(export)]
pub struct Money(#[ts(type = "string")] Decimal);

impl Money {
    /// Creates a Money value from a decimal amount.
    #[inline]
    pub const fn from_decimal(amount: Decimal) -> Self {
        Money(amount)
    }

    /// Creates a Money value from an integer number of major units.
    ///
    /// ## Example
    /// ```rust
    /// use promo_core::money::Money;
    ///
    /// assert_eq!(Money::from_major(150).to_string(), "150");
    /// ```
    #[inline]
    pub fn from_major(units: i64) -> Self {
        Money(Decimal::from(units))
    }

    /// Returns the underlying decimal amount.
    #[inline]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(Decimal::ZERO)
    }

    /// Checks if the value is zero.
    #[inline]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Checks if the value is positive (greater than zero).
    #[inline]
    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub fn is_negative(&self) -> bool {
        self.0 < Decimal::ZERO
    }

    /// Multiplies money by a quantity, returning `None` on overflow.
    ///
    /// ## Example
    /// ```rust
    /// use promo_core::money::Money;
    ///
    /// let unit_price: Money = "2.99".parse().unwrap();
    /// let line_total = unit_price.checked_multiply_quantity(3).unwrap();
    /// assert_eq!(line_total.to_string(), "8.97");
    /// ```
    pub fn checked_multiply_quantity(&self, qty: i64) -> Option<Self> {
        self.0.checked_mul(Decimal::from(qty)).map(Money)
    }

    /// Adds two amounts, returning `None` on overflow.
    pub fn checked_add(&self, other: Money) -> Option<Self> {
        self.0.checked_add(other.0).map(Money)
    }

    /// Rounds to `decimal_places` using Bankers Rounding (round half to even).
    ///
    /// ## Bankers Rounding Explained
    /// ```text
    /// ┌─────────────────────────────────────────────────────────────────────┐
    /// │  Standard rounding always rounds 0.5 UP, causing systematic bias:  │
    /// │    0.5 → 1, 1.5 → 2, 2.5 → 3, 3.5 → 4 (always up = +bias)         │
    /// │                                                                     │
    /// │  Bankers Rounding rounds 0.5 to nearest EVEN number:               │
    /// │    0.5 → 0, 1.5 → 2, 2.5 → 2, 3.5 → 4 (alternates = no bias)      │
    /// └─────────────────────────────────────────────────────────────────────┘
    /// ```
    ///
    /// The resolver never rounds. This is only used when previewing how much
    /// a directive removes from a cart.
    ///
    /// ## Example
    /// ```rust
    /// use promo_core::money::Money;
    ///
    /// let amount: Money = "0.125".parse().unwrap();
    /// assert_eq!(amount.round_to(2).to_string(), "0.12");
    /// ```
    pub fn round_to(&self, decimal_places: u32) -> Money {
        Money(
            self.0
                .round_dp_with_strategy(decimal_places, RoundingStrategy::MidpointNearestEven),
        )
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display shows the amount exactly as stored, without currency symbol.
///
/// ## Note
/// Currency formatting belongs to whatever renders the checkout.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Money {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Decimal::from_str(s.trim())
            .map(Money)
            .map_err(|e| ValidationError::InvalidFormat {
                field: "amount".to_string(),
                reason: e.to_string(),
            })
    }
}

/// Default money is zero.
impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl From<Decimal> for Money {
    fn from(amount: Decimal) -> Self {
        Money(amount)
    }
}

/// Addition of two Money values.
impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

/// Addition assignment (+=).
impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

/// Subtraction of two Money values.
impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

/// Subtraction assignment (-=).
impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

/// Multiplication by quantity.
impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * Decimal::from(qty))
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn money(s: &str) -> Money {
        s.parse().unwrap()
    }

    #[test]
    fn test_parse_and_display() {
        assert_eq!(money("10.99").to_string(), "10.99");
        assert_eq!(money(" 5.00 ").to_string(), "5.00");
        assert_eq!(money("150").to_string(), "150");
        assert!("ten".parse::<Money>().is_err());
    }

    #[test]
    fn test_arithmetic() {
        let a = money("10.00");
        let b = money("5.00");

        assert_eq!(a + b, money("15"));
        assert_eq!(a - b, money("5"));
        assert_eq!(a * 3, money("30"));
    }

    #[test]
    fn test_no_float_drift() {
        let total: Money = [money("0.1"), money("0.2")].into_iter().sum();
        assert_eq!(total, money("0.3"));
    }

    #[test]
    fn test_zero_and_checks() {
        let zero = Money::zero();
        assert!(zero.is_zero());
        assert!(!zero.is_positive());
        assert!(!zero.is_negative());

        let positive = money("0.01");
        assert!(positive.is_positive());

        let negative = money("-0.01");
        assert!(negative.is_negative());
    }

    #[test]
    fn test_checked_multiply_quantity() {
        assert_eq!(money("2.99").checked_multiply_quantity(3), Some(money("8.97")));
        assert_eq!(Money::from_decimal(Decimal::MAX).checked_multiply_quantity(2), None);
    }

    #[test]
    fn test_round_to_uses_bankers_rounding() {
        assert_eq!(money("0.125").round_to(2), money("0.12"));
        assert_eq!(money("0.135").round_to(2), money("0.14"));
        assert_eq!(money("2.5").round_to(0), money("2"));
    }

    #[test]
    fn test_serde_uses_strings() {
        let json = serde_json::to_string(&money("10.50")).unwrap();
        assert_eq!(json, "\"10.50\"");

        let parsed: Money = serde_json::from_str("\"80\"").unwrap();
        assert_eq!(parsed, money("80"));
    }
}
