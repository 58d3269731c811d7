//! Money value object.

use serde::{Deserialize, Serialize};

/// A monetary amount in whole Chilean pesos.
///
/// The peso has no minor unit, so amounts are plain integers and line-item
/// arithmetic is exact.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    /// Creates an amount from whole pesos.
    pub fn new(amount: i64) -> Self {
        Self(amount)
    }

    /// Returns zero money.
    pub fn zero() -> Self {
        Self(0)
    }

    /// Returns the amount in whole pesos.
    pub fn amount(&self) -> i64 {
        self.0
    }

    /// Returns true if the amount is positive.
    pub fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Returns true if the amount is zero.
    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Returns true if the amount is negative.
    pub fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Multiplies by a quantity, or `None` on overflow.
    pub fn checked_mul(&self, quantity: u32) -> Option<Money> {
        self.0.checked_mul(i64::from(quantity)).map(Money)
    }

    /// Adds two amounts, or `None` on overflow.
    pub fn checked_add(&self, rhs: Money) -> Option<Money> {
        self.0.checked_add(rhs.0).map(Money)
    }

    /// Subtracts `rhs`, or `None` on overflow.
    pub fn checked_sub(&self, rhs: Money) -> Option<Money> {
        self.0.checked_sub(rhs.0).map(Money)
    }
}

/// Formats as `$12.990`, using `.` as the thousands separator.
impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let digits = self.0.unsigned_abs().to_string();
        let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
        for (i, ch) in digits.chars().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                grouped.push('.');
            }
            grouped.push(ch);
        }
        if self.0 < 0 {
            write!(f, "-${grouped}")
        } else {
            write!(f, "${grouped}")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_money_display() {
        assert_eq!(Money::new(12990).to_string(), "$12.990");
        assert_eq!(Money::new(1_234_567).to_string(), "$1.234.567");
        assert_eq!(Money::new(500).to_string(), "$500");
        assert_eq!(Money::new(0).to_string(), "$0");
        assert_eq!(Money::new(-1500).to_string(), "-$1.500");
    }

    #[test]
    fn test_money_arithmetic() {
        let a = Money::new(1000);
        let b = Money::new(500);

        assert_eq!(a.checked_mul(3), Some(Money::new(3000)));
        assert_eq!(a.checked_add(b), Some(Money::new(1500)));
        assert_eq!(a.checked_sub(b), Some(Money::new(500)));
    }

    #[test]
    fn test_money_checked_ops_detect_overflow() {
        let big = Money::new(i64::MAX / 2 + 1);
        assert_eq!(big.checked_mul(2), None);
        assert_eq!(big.checked_add(big), None);
        assert_eq!(Money::new(i64::MIN).checked_sub(Money::new(1)), None);
        assert_eq!(big.checked_mul(1), Some(big));
    }

    #[test]
    fn test_money_sign_checks() {
        assert!(Money::new(100).is_positive());
        assert!(Money::new(0).is_zero());
        assert!(Money::new(-100).is_negative());
    }

    #[test]
    fn test_money_serializes_as_number() {
        assert_eq!(serde_json::to_string(&Money::new(4990)).unwrap(), "4990");
        let parsed: Money = serde_json::from_str("1200").unwrap();
        assert_eq!(parsed, Money::new(1200));
    }
}
