//! Amount value object.
//!
//! The provider reports money in minor units (paise). Amounts are kept as
//! integers and only rendered in major units (rupees) on the way out.

use std::fmt;

use serde::{Deserialize, Serialize, Serializer};

/// Provider amounts are in minor units; this many make one rupee.
pub const MINOR_UNITS_PER_MAJOR: i64 = 100;

/// A currency amount in minor units.
///
/// Deserializes from the provider's integer minor-unit value. Serializes in
/// major units: whole rupees as a JSON integer (`4900` -> `49`), anything
/// else as a decimal (`29950` -> `299.5`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
#[serde(transparent)]
pub struct Amount(i64);

impl Amount {
    pub fn from_minor(minor: i64) -> Self {
        Self(minor)
    }

    pub fn minor(&self) -> i64 {
        self.0
    }

    /// True when the amount has no paise part.
    pub fn is_whole(&self) -> bool {
        self.0 % MINOR_UNITS_PER_MAJOR == 0
    }

    pub fn major(&self) -> f64 {
        self.0 as f64 / MINOR_UNITS_PER_MAJOR as f64
    }
}

impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.is_whole() {
            serializer.serialize_i64(self.0 / MINOR_UNITS_PER_MAJOR)
        } else {
            serializer.serialize_f64(self.major())
        }
    }
}

/// Customer-facing rendering: `₹49`, `₹299.50`.
impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let per_major = MINOR_UNITS_PER_MAJOR as u64;
        let (rupees, paise) = (abs / per_major, abs % per_major);
        if paise == 0 {
            write!(f, "{}₹{}", sign, rupees)
        } else {
            write!(f, "{}₹{}.{:02}", sign, rupees, paise)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn whole_rupees_serialize_as_integer() {
        let value = serde_json::to_value(Amount::from_minor(4900)).unwrap();
        assert_eq!(value, json!(49));
        assert!(value.is_i64());
    }

    #[test]
    fn paise_serialize_as_decimal() {
        assert_eq!(serde_json::to_value(Amount::from_minor(29_950)).unwrap(), json!(299.5));
    }

    #[test]
    fn deserializes_from_minor_units() {
        let amount: Amount = serde_json::from_value(json!(4900)).unwrap();
        assert_eq!(amount.minor(), 4900);
        assert_eq!(amount.major(), 49.0);
    }

    #[test]
    fn rejects_non_integer_input() {
        assert!(serde_json::from_value::<Amount>(json!("4900")).is_err());
    }

    #[test]
    fn display_drops_zero_paise() {
        assert_eq!(Amount::from_minor(4900).to_string(), "₹49");
        assert_eq!(Amount::from_minor(29_950).to_string(), "₹299.50");
        assert_eq!(Amount::from_minor(5).to_string(), "₹0.05");
    }
}
