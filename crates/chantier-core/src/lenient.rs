//! Serde helpers for numbers written loosely by text-generation models.
//!
//! Upstream payloads mix `1500`, `"1500"` and `"1500,50 €"` for the same
//! field. These helpers accept all three and fall back to the first numeric
//! token (see [`leading_number`]).

use serde::de::{self, Deserialize, Deserializer};
use serde_json::Value;

use crate::quantity::leading_number;

fn as_amount(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => leading_number(s),
        _ => None,
    }
}

/// Required amount: a number or a string containing one.
pub fn amount<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    as_amount(&value).ok_or_else(|| de::Error::custom(format!("expected an amount, got {value}")))
}

/// Optional amount. `null` and text without a number both yield `None`.
pub fn opt_amount<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(as_amount(&value))
}

/// Non-negative whole count, rounded.
pub fn count<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = amount(deserializer)?;
    Ok(value.max(0.0).round().min(u32::MAX as f64) as u32)
}

/// Free text; numbers are rendered as written.
pub fn text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        Value::Null => Ok(String::new()),
        other => Err(de::Error::custom(format!("expected text, got {other}"))),
    }
}

/// `null` is treated like an absent field.
pub fn or_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    #[derive(Deserialize)]
    struct Sample {
        #[serde(deserialize_with = "super::amount")]
        price: f64,
        #[serde(default, deserialize_with = "super::opt_amount")]
        margin: Option<f64>,
        #[serde(deserialize_with = "super::count")]
        workers: u32,
        #[serde(deserialize_with = "super::text")]
        duration: String,
        #[serde(default, deserialize_with = "super::or_default")]
        notes: Vec<String>,
    }

    #[test]
    fn accepts_numbers_and_numeric_text() {
        let s: Sample = serde_json::from_str(
            r#"{"price": "1500,50 €", "margin": 12, "workers": "2 ouvriers", "duration": 3, "notes": null}"#,
        )
        .unwrap();
        assert_eq!(s.price, 1500.5);
        assert_eq!(s.margin, Some(12.0));
        assert_eq!(s.workers, 2);
        assert_eq!(s.duration, "3");
        assert!(s.notes.is_empty());
    }

    #[test]
    fn optional_amount_without_digits_is_none() {
        let s: Sample = serde_json::from_str(
            r#"{"price": 1, "margin": "n/a", "workers": 1.6, "duration": "2 jours"}"#,
        )
        .unwrap();
        assert_eq!(s.margin, None);
        assert_eq!(s.workers, 2);
    }

    #[test]
    fn required_amount_rejects_text() {
        let err = serde_json::from_str::<Sample>(
            r#"{"price": "sur devis", "workers": 1, "duration": "1 jour"}"#,
        )
        .err()
        .unwrap();
        assert!(err.to_string().contains("expected an amount"));
    }
}
