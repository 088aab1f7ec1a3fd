//! Price and volume newtypes enforcing the invariants of SPEC_FULL.md §3.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// The valid range for an outcome's Yes-equivalent price.
pub const MIN_PRICE: Decimal = dec!(0.0001);
pub const MAX_PRICE: Decimal = dec!(0.9999);

/// A price clamped to `[MIN_PRICE, MAX_PRICE]` at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Price(Decimal);

impl Price {
    #[must_use]
    pub fn clamped(value: Decimal) -> Self {
        Self(value.clamp(MIN_PRICE, MAX_PRICE))
    }

    #[must_use]
    pub const fn get(self) -> Decimal {
        self.0
    }

    #[must_use]
    pub fn complement(self) -> Self {
        Self::clamped(Decimal::ONE - self.0)
    }
}

/// A non-negative fixed-point volume or liquidity figure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Amount(Decimal);

impl Amount {
    #[must_use]
    pub fn non_negative(value: Decimal) -> Self {
        Self(value.max(Decimal::ZERO))
    }

    #[must_use]
    pub const fn get(self) -> Decimal {
        self.0
    }

    #[must_use]
    pub const fn zero() -> Self {
        Self(Decimal::ZERO)
    }
}

impl std::iter::Sum for Amount {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        Self(iter.map(|a| a.0).sum())
    }
}
