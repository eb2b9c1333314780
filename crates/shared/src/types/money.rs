//! Fixed-point money arithmetic.
//!
//! CRITICAL: Never use floating-point for money calculations.
//! `Amount` wraps `rust_decimal::Decimal` and every monetary sum,
//! difference, and rounding in the ledger goes through it.
//!
//! Rounding policy: half away from zero (`MidpointAwayFromZero`).
//! - Totals are rounded to [`MONEY_SCALE`] (2) places when they are finalized
//!   for persistence or comparison.
//! - Line amounts are rounded to [`STORAGE_SCALE`] (4) places when they enter
//!   the system.

use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Neg, Sub};
use std::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Decimal places of a finalized total.
pub const MONEY_SCALE: u32 = 2;

/// Decimal places kept for an individual line amount.
pub const STORAGE_SCALE: u32 = 4;

/// Largest debit/credit difference still treated as balanced (0.01).
pub const BALANCE_TOLERANCE: Amount = Amount(Decimal::from_parts(1, 0, 0, false, 2));

/// Largest line amount a `NUMERIC(19,4)` column holds (999 999 999 999 999.9999).
pub const MAX_LINE_AMOUNT: Amount = Amount(Decimal::from_parts(
    (9_999_999_999_999_999_999_u128 & 0xFFFF_FFFF) as u32,
    ((9_999_999_999_999_999_999_u128 >> 32) & 0xFFFF_FFFF) as u32,
    (9_999_999_999_999_999_999_u128 >> 64) as u32,
    false,
    STORAGE_SCALE,
));

/// A monetary quantity in the organization's single currency.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Amount(Decimal);

impl Amount {
    /// Zero.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Creates an amount from a mantissa and scale, e.g. `Amount::new(15000, 2)` is 150.00.
    #[must_use]
    pub const fn new(mantissa: i64, scale: u32) -> Self {
        Self(Decimal::from_parts(
            mantissa.unsigned_abs() as u32,
            (mantissa.unsigned_abs() >> 32) as u32,
            0,
            mantissa < 0,
            scale,
        ))
    }

    /// Wraps a decimal value as-is.
    #[must_use]
    pub const fn from_decimal(value: Decimal) -> Self {
        Self(value)
    }

    /// Returns the inner decimal.
    #[must_use]
    pub const fn as_decimal(self) -> Decimal {
        self.0
    }

    /// Rounds to [`MONEY_SCALE`] places, half away from zero.
    #[must_use]
    pub fn round_money(self) -> Self {
        Self(
            self.0
                .round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointAwayFromZero),
        )
    }

    /// Rounds to [`STORAGE_SCALE`] places, half away from zero.
    #[must_use]
    pub fn round_storage(self) -> Self {
        Self(
            self.0
                .round_dp_with_strategy(STORAGE_SCALE, RoundingStrategy::MidpointAwayFromZero),
        )
    }

    /// Returns true if the amount is zero.
    #[must_use]
    pub fn is_zero(self) -> bool {
        self.0.is_zero()
    }

    /// Returns true if the amount is strictly greater than zero.
    #[must_use]
    pub fn is_positive(self) -> bool {
        self.0 > Decimal::ZERO
    }

    /// Returns true if the amount is strictly less than zero.
    #[must_use]
    pub fn is_negative(self) -> bool {
        self.0 < Decimal::ZERO
    }

    /// Absolute value.
    #[must_use]
    pub fn abs(self) -> Self {
        Self(self.0.abs())
    }

    /// Adds two amounts, returning `None` on overflow.
    #[must_use]
    pub fn checked_add(self, rhs: Self) -> Option<Self> {
        self.0.checked_add(rhs.0).map(Self)
    }

    /// Sums amounts, returning `None` if the sum overflows.
    pub fn checked_sum<I>(amounts: I) -> Option<Self>
    where
        I: IntoIterator<Item = Self>,
    {
        amounts
            .into_iter()
            .try_fold(Self::ZERO, |acc, amount| acc.checked_add(amount))
    }

    /// Returns true if the amount fits a stored line amount.
    #[must_use]
    pub fn fits_line_column(self) -> bool {
        self.abs() <= MAX_LINE_AMOUNT
    }

    /// Returns true if `self` and `other` differ by at most [`BALANCE_TOLERANCE`].
    #[must_use]
    pub fn within_tolerance(self, other: Self) -> bool {
        (self - other).abs() <= BALANCE_TOLERANCE
    }
}

impl From<Decimal> for Amount {
    fn from(value: Decimal) -> Self {
        Self(value)
    }
}

impl From<Amount> for Decimal {
    fn from(value: Amount) -> Self {
        value.0
    }
}

impl FromStr for Amount {
    type Err = rust_decimal::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Decimal::from_str(s.trim()).map(Self)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut value = self.0;
        if value.scale() < MONEY_SCALE {
            value.rescale(MONEY_SCALE);
        }
        write!(f, "{value}")
    }
}

impl Add for Amount {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl AddAssign for Amount {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl Sub for Amount {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self(self.0 - rhs.0)
    }
}

impl Neg for Amount {
    type Output = Self;

    fn neg(self) -> Self {
        Self(-self.0)
    }
}

impl Sum for Amount {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl<'a> Sum<&'a Amount> for Amount {
    fn sum<I: Iterator<Item = &'a Amount>>(iter: I) -> Self {
        iter.copied().sum()
    }
}
