//! Boundary coercion for monetary fields.
//!
//! Existing clients send rent figures both as JSON numbers and as strings
//! ("7000"). Coercion happens exactly once, at deserialization; anything that
//! does not parse to a whole, non-negative-exponent number is rejected rather
//! than defaulted.

use std::fmt;

use serde::de::{self, Deserializer, Visitor};

struct MoneyVisitor;

impl<'de> Visitor<'de> for MoneyVisitor {
    type Value = i64;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a whole amount as a number or numeric string")
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<i64, E> {
        Ok(v)
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<i64, E> {
        i64::try_from(v).map_err(|_| E::custom(format!("amount {v} out of range")))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<i64, E> {
        if v.fract() == 0.0 && v >= i64::MIN as f64 && v <= i64::MAX as f64 {
            Ok(v as i64)
        } else {
            Err(E::custom(format!("amount {v} is not a whole number")))
        }
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<i64, E> {
        let trimmed = v.trim();
        if let Ok(n) = trimmed.parse::<i64>() {
            return Ok(n);
        }
        match trimmed.parse::<f64>() {
            Ok(f) if f.fract() == 0.0 => Ok(f as i64),
            _ => Err(E::custom(format!("unparseable amount {v:?}"))),
        }
    }
}

/// Deserialize a monetary field, accepting numbers and numeric strings.
pub fn money<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    deserializer.deserialize_any(MoneyVisitor)
}

/// Optional variant of [`money`]; absent and `null` both map to `None`.
pub fn money_opt<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<i64>, D::Error> {
    struct OptVisitor;

    impl<'de> Visitor<'de> for OptVisitor {
        type Value = Option<i64>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("an optional amount as a number or numeric string")
        }

        fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_some<D2: Deserializer<'de>>(self, d: D2) -> Result<Self::Value, D2::Error> {
            money(d).map(Some)
        }
    }

    deserializer.deserialize_option(OptVisitor)
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    #[derive(Deserialize)]
    struct WithAmount {
        #[serde(deserialize_with = "super::money")]
        amount: i64,
    }

    #[derive(Deserialize)]
    struct WithOptAmount {
        #[serde(default, deserialize_with = "super::money_opt")]
        amount: Option<i64>,
    }

    #[test]
    fn accepts_json_numbers() {
        let v: WithAmount = serde_json::from_str(r#"{"amount": 12000}"#).unwrap();
        assert_eq!(v.amount, 12000);
        let v: WithAmount = serde_json::from_str(r#"{"amount": 12000.0}"#).unwrap();
        assert_eq!(v.amount, 12000);
    }

    #[test]
    fn accepts_numeric_strings() {
        let v: WithAmount = serde_json::from_str(r#"{"amount": " 7000 "}"#).unwrap();
        assert_eq!(v.amount, 7000);
    }

    #[test]
    fn rejects_garbage_instead_of_defaulting() {
        assert!(serde_json::from_str::<WithAmount>(r#"{"amount": "7k"}"#).is_err());
        assert!(serde_json::from_str::<WithAmount>(r#"{"amount": "NaN"}"#).is_err());
        assert!(serde_json::from_str::<WithAmount>(r#"{"amount": 70.5}"#).is_err());
    }

    #[test]
    fn optional_amount_allows_null_and_absence() {
        let v: WithOptAmount = serde_json::from_str(r#"{"amount": null}"#).unwrap();
        assert_eq!(v.amount, None);
        let v: WithOptAmount = serde_json::from_str(r#"{}"#).unwrap();
        assert_eq!(v.amount, None);
        let v: WithOptAmount = serde_json::from_str(r#"{"amount": "250"}"#).unwrap();
        assert_eq!(v.amount, Some(250));
    }
}
