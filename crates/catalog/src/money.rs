use core::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::pricing::Discount;

/// An amount of roubles held in kopecks.
///
/// Serialized as a decimal number of roubles (`1234.5`).
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);

    pub const fn from_kopecks(kopecks: i64) -> Self {
        Self(kopecks)
    }

    pub const fn from_roubles(roubles: i64) -> Self {
        Self(roubles * 100)
    }

    pub const fn kopecks(&self) -> i64 {
        self.0
    }

    pub fn as_roubles(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// `self - round(self * percent / 100)`, rounding half away from zero.
    pub fn discounted(&self, discount: Discount) -> Money {
        let pct = i64::from(discount.percent());
        let scaled = self.0 * pct;
        let cut = if scaled >= 0 {
            (scaled + 50) / 100
        } else {
            (scaled - 50) / 100
        };
        Money(self.0 - cut)
    }

    pub fn saturating_sub(&self, other: Money) -> Money {
        Money(self.0.saturating_sub(other.0))
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{sign}{}.{:02}", abs / 100, abs % 100)
    }
}

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.as_roubles())
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let roubles = f64::deserialize(deserializer)?;
        Ok(Money((roubles * 100.0).round() as i64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn discount_rounds_to_nearest_kopeck() {
        let price = Money::from_kopecks(99_999);
        assert_eq!(price.discounted(Discount::new(3)), Money::from_kopecks(96_999));
        assert_eq!(price.discounted(Discount::NONE), price);
        assert_eq!(
            Money::from_roubles(1000).discounted(Discount::new(15)),
            Money::from_roubles(850)
        );
    }

    #[test]
    fn renders_as_roubles() {
        assert_eq!(Money::from_kopecks(123_450).to_string(), "1234.50");
        assert_eq!(Money::from_kopecks(-5).to_string(), "-0.05");
        assert_eq!(serde_json::to_string(&Money::from_kopecks(123_450)).unwrap(), "1234.5");
        let m: Money = serde_json::from_str("19.99").unwrap();
        assert_eq!(m, Money::from_kopecks(1999));
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #![proptest_config(ProptestConfig {
                cases: 256,
                ..ProptestConfig::default()
            })]

            /// Property: a discount never raises the price and never makes it negative.
            #[test]
            fn discount_is_bounded(kopecks in 0i64..10_000_000_000, pct in 0u8..=100) {
                let price = Money::from_kopecks(kopecks);
                let discounted = price.discounted(Discount::new(pct));
                prop_assert!(discounted <= price);
                prop_assert!(discounted >= Money::ZERO);
            }
        }
    }
}
