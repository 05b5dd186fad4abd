//! # Money Module
//!
//! Provides the `Money` and `Rate` types for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In JavaScript/floating point:                                          │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  In a pricing engine this is not cosmetic: the summary becomes a real  │
//! │  charge amount, and a NaN or drifting fraction becomes a real dispute. │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Cents + Basis-Point Rates                        │
//! │    $59.98 × 20% = (5998 × 2000 + 5000) / 10000 = 1200 cents             │
//! │    Rounded ONCE, half-up, at the cent - never accumulated as floats.   │
//! │    NaN is unrepresentable by construction.                             │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use vitacart_core::money::{Money, Rate};
//!
//! let subtotal = Money::from_cents(5998); // $59.98
//!
//! // 20% discount, rounded half-up at the cent
//! let discount = subtotal.apply_rate(Rate::from_bps(2000));
//! assert_eq!(discount.cents(), 1200); // $12.00
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};
use ts_rs::TS;

// =============================================================================
// Money Type
// =============================================================================

/// Represents a monetary value in the smallest currency unit (cents for USD).
///
/// ## Design Decisions
/// - **i64 (signed)**: Intermediate values may go negative (discounts,
///   insurance offsets); totals are clamped at the engine boundary
/// - **Single field tuple struct**: Zero-cost abstraction over i64
/// - **Derives**: Full serde support for JSON snapshots
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents (the smallest currency unit).
    ///
    /// ## Example
    /// ```rust
    /// use vitacart_core::money::Money;
    ///
    /// let price = Money::from_cents(2999); // Represents $29.99
    /// assert_eq!(price.cents(), 2999);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Returns the value in cents (smallest currency unit).
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the major unit (dollars) portion.
    #[inline]
    pub const fn dollars(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the minor unit (cents) portion (always 0-99).
    #[inline]
    pub const fn cents_part(&self) -> i64 {
        (self.0 % 100).abs()
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the value is positive (greater than zero).
    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Multiplies money by a quantity.
    ///
    /// ## Example
    /// ```rust
    /// use vitacart_core::money::Money;
    ///
    /// let unit_price = Money::from_cents(2999); // $29.99
    /// let line_total = unit_price.multiply_quantity(2);
    /// assert_eq!(line_total.cents(), 5998); // $59.98
    /// ```
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0 * qty)
    }

    /// Applies a rate to this amount, rounding half-up at the cent.
    ///
    /// ## Rounding Contract
    /// This is the ONLY place a fractional cent is ever resolved. Line
    /// totals, discounts, tax, and insurance offsets all round here, each
    /// exactly once, so rounding error never compounds across steps.
    ///
    /// ## Implementation
    /// Integer math through i128 to prevent overflow on large amounts:
    /// `(cents * bps + 5000) / 10000`. The +5000 provides half-up rounding
    /// (5000/10000 = 0.5).
    ///
    /// ## Example
    /// ```rust
    /// use vitacart_core::money::{Money, Rate};
    ///
    /// let subtotal = Money::from_cents(5998);      // $59.98
    /// let rate = Rate::from_bps(2000);             // 20%
    /// assert_eq!(subtotal.apply_rate(rate).cents(), 1200); // $12.00
    /// ```
    pub fn apply_rate(&self, rate: Rate) -> Money {
        let cents = (self.0 as i128 * rate.bps() as i128 + 5000) / 10000;
        Money::from_cents(cents as i64)
    }

    /// Returns the smaller of two amounts.
    #[inline]
    pub fn min(self, other: Money) -> Money {
        Money(self.0.min(other.0))
    }

    /// Clamps the value to a floor of zero.
    ///
    /// ## Example
    /// ```rust
    /// use vitacart_core::money::Money;
    ///
    /// let over_discounted = Money::from_cents(-250);
    /// assert_eq!(over_discounted.clamp_non_negative().cents(), 0);
    /// ```
    #[inline]
    pub const fn clamp_non_negative(&self) -> Money {
        if self.0 < 0 {
            Money(0)
        } else {
            Money(self.0)
        }
    }
}

// =============================================================================
// Rate Type
// =============================================================================

/// A percentage rate represented in basis points (bps).
///
/// ## Why Basis Points?
/// 1 basis point = 0.01% = 1/10000
/// 2000 bps = 20% discount, 8000 bps = 80% insurance coverage, 800 bps = 8% tax.
/// One representation serves tax, discount, coverage, and bundle rates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Rate(u32);

impl Rate {
    /// 100% expressed in basis points.
    pub const FULL_BPS: u32 = 10_000;

    /// Creates a rate from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        Rate(bps)
    }

    /// Creates a rate from a percentage (for convenience).
    pub fn from_percentage(pct: f64) -> Self {
        Rate((pct * 100.0).round() as u32)
    }

    /// Returns the rate in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as a percentage (for display only).
    #[inline]
    pub fn percentage(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Zero rate.
    #[inline]
    pub const fn zero() -> Self {
        Rate(0)
    }

    /// Checks if the rate is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// The complement of this rate, saturating at zero.
    ///
    /// A 15% bundle discount leaves `complement()` = 85% of the line price.
    #[inline]
    pub const fn complement(&self) -> Rate {
        Rate(Self::FULL_BPS.saturating_sub(self.0))
    }
}

impl Default for Rate {
    fn default() -> Self {
        Rate::zero()
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display implementation shows money in a human-readable format.
///
/// ## Note
/// This is for logs and debugging. The frontend formats currency itself
/// to handle localization properly.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(
            f,
            "{}${}.{:02}",
            sign,
            self.dollars().abs(),
            self.cents_part()
        )
    }
}

/// Default money is zero.
impl Default for Money {
    fn default() -> Self {
        Money::zero()
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

/// Multiplication by i64 (for quantity calculations).
impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_cents() {
        let money = Money::from_cents(2999);
        assert_eq!(money.cents(), 2999);
        assert_eq!(money.dollars(), 29);
        assert_eq!(money.cents_part(), 99);
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", Money::from_cents(1099)), "$10.99");
        assert_eq!(format!("{}", Money::from_cents(500)), "$5.00");
        assert_eq!(format!("{}", Money::from_cents(-550)), "-$5.50");
        assert_eq!(format!("{}", Money::from_cents(0)), "$0.00");
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_cents(1000);
        let b = Money::from_cents(500);

        assert_eq!((a + b).cents(), 1500);
        assert_eq!((a - b).cents(), 500);
        let result: Money = a * 3;
        assert_eq!(result.cents(), 3000);
    }

    #[test]
    fn test_apply_rate_basic() {
        // $10.00 at 10% = $1.00
        let amount = Money::from_cents(1000);
        assert_eq!(amount.apply_rate(Rate::from_bps(1000)).cents(), 100);
    }

    #[test]
    fn test_apply_rate_rounds_half_up() {
        // $59.98 × 20% = $11.996 → $12.00
        let amount = Money::from_cents(5998);
        assert_eq!(amount.apply_rate(Rate::from_bps(2000)).cents(), 1200);

        // $10.00 × 8.25% = $0.825 → $0.83
        let amount = Money::from_cents(1000);
        assert_eq!(amount.apply_rate(Rate::from_bps(825)).cents(), 83);
    }

    #[test]
    fn test_apply_rate_insurance_coverage() {
        // $100.00 at 80% coverage = $80.00 offset
        let line = Money::from_cents(10000);
        assert_eq!(line.apply_rate(Rate::from_bps(8000)).cents(), 8000);
    }

    #[test]
    fn test_clamp_non_negative() {
        assert_eq!(Money::from_cents(-1).clamp_non_negative().cents(), 0);
        assert_eq!(Money::from_cents(0).clamp_non_negative().cents(), 0);
        assert_eq!(Money::from_cents(42).clamp_non_negative().cents(), 42);
    }

    #[test]
    fn test_rate_from_percentage() {
        assert_eq!(Rate::from_percentage(20.0).bps(), 2000);
        assert_eq!(Rate::from_percentage(8.25).bps(), 825);
    }

    #[test]
    fn test_rate_complement() {
        assert_eq!(Rate::from_bps(1500).complement().bps(), 8500);
        assert_eq!(Rate::from_bps(12000).complement().bps(), 0);
    }

    #[test]
    fn test_min() {
        let a = Money::from_cents(1200);
        let b = Money::from_cents(10000);
        assert_eq!(a.min(b), a);
        assert_eq!(b.min(a), a);
    }
}
