//! Fixed-point credit amounts
//!
//! Balances and amounts are 64-bit integers in credit units, where
//! 1,000,000 units equal one credit. No balance-affecting computation
//! ever touches floating point.

use serde::{Deserialize, Serialize};

/// Units per whole credit
pub const UNITS_PER_CREDIT: i64 = 1_000_000;

/// A signed credit amount in fixed-point units
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Credits(i64);

impl Credits {
    /// Zero credits
    pub const ZERO: Credits = Credits(0);

    /// From raw units (1,000,000 units = 1 credit)
    pub const fn from_units(units: i64) -> Self {
        Self(units)
    }

    /// From whole credits
    pub const fn from_whole(credits: i64) -> Self {
        Self(credits * UNITS_PER_CREDIT)
    }

    /// Raw units
    pub const fn units(self) -> i64 {
        self.0
    }

    /// Checked addition
    pub fn checked_add(self, other: Credits) -> Option<Credits> {
        self.0.checked_add(other.0).map(Credits)
    }

    /// Checked subtraction
    pub fn checked_sub(self, other: Credits) -> Option<Credits> {
        self.0.checked_sub(other.0).map(Credits)
    }

    /// Negation
    pub fn negate(self) -> Credits {
        Credits(-self.0)
    }

    /// Absolute value
    pub fn abs(self) -> Credits {
        Credits(self.0.abs())
    }

    pub fn is_negative(self) -> bool {
        self.0 < 0
    }

    pub fn is_positive(self) -> bool {
        self.0 > 0
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }
}

impl std::fmt::Display for Credits {
    /// Renders as whole credits with six fractional digits, e.g.
    /// `-1.250000`
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let magnitude = self.0.unsigned_abs();
        let whole = magnitude / UNITS_PER_CREDIT as u64;
        let frac = magnitude % UNITS_PER_CREDIT as u64;
        write!(f, "{}{}.{:06}", sign, whole, frac)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_point_scale() {
        assert_eq!(Credits::from_whole(1).units(), 1_000_000);
        assert_eq!(Credits::from_units(500_000).units(), 500_000);
    }

    #[test]
    fn test_checked_arithmetic() {
        let a = Credits::from_units(100);
        let b = Credits::from_units(30);
        assert_eq!(a.checked_add(b), Some(Credits::from_units(130)));
        assert_eq!(a.checked_sub(b), Some(Credits::from_units(70)));
        assert_eq!(Credits::from_units(i64::MAX).checked_add(Credits::from_units(1)), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(Credits::from_units(1_250_000).to_string(), "1.250000");
        assert_eq!(Credits::from_units(-60_000).to_string(), "-0.060000");
        assert_eq!(Credits::ZERO.to_string(), "0.000000");
    }

    #[test]
    fn test_serde_transparent() {
        let amount = Credits::from_units(60_000);
        assert_eq!(serde_json::to_string(&amount).unwrap(), "60000");
        let back: Credits = serde_json::from_str("60000").unwrap();
        assert_eq!(back, amount);
    }
}
