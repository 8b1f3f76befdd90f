//! Numeric extraction for free-form quantities and amounts.
//!
//! Estimators write quantities the way a tradesperson would ("12,5 m²",
//! "3 sacs", "env. 40 ml"). Pricing only needs the number, so every
//! quantity is reduced to its first numeric token.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Extract the first numeric token from `text`.
///
/// Input: "12,5 m²", "3 sacs", "-4.25", "env. 40"
/// Output: 12.5, 3.0, -4.25, 40.0
///
/// # Algorithm
///
/// 1. Skip to the first ASCII digit; a `-` immediately before it makes the
///    value negative.
/// 2. Consume digits, accepting a single `,` or `.` as the decimal separator
///    when it is followed by another digit. `,` is normalised to `.`.
/// 3. Stop at the first other character.
///
/// Returns `None` when `text` holds no digit at all.
pub fn leading_number(text: &str) -> Option<f64> {
    let chars: Vec<char> = text.chars().collect();
    let start = chars.iter().position(|c| c.is_ascii_digit())?;
    let negative = start > 0 && chars[start - 1] == '-';

    let mut token = String::new();
    let mut seen_separator = false;
    for (i, &c) in chars.iter().enumerate().skip(start) {
        if c.is_ascii_digit() {
            token.push(c);
        } else if (c == ',' || c == '.')
            && !seen_separator
            && chars.get(i + 1).is_some_and(|next| next.is_ascii_digit())
        {
            token.push('.');
            seen_separator = true;
        } else {
            break;
        }
    }

    let value: f64 = token.parse().ok()?;
    Some(if negative { -value } else { value })
}

/// Round a monetary amount to cents, half away from zero.
pub fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// A material quantity as written by the estimator: a bare number or text
/// with an embedded unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Quantity {
    Number(f64),
    Text(String),
}

impl Quantity {
    /// Numeric value used for pricing. Text without a number counts as 0.
    pub fn numeric(&self) -> f64 {
        match self {
            Self::Number(n) if n.is_finite() => *n,
            Self::Number(_) => 0.0,
            Self::Text(text) => leading_number(text).unwrap_or(0.0),
        }
    }
}

impl Default for Quantity {
    fn default() -> Self {
        Self::Number(0.0)
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(text) => f.write_str(text),
        }
    }
}

impl From<f64> for Quantity {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<&str> for Quantity {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comma_decimal_with_unit() {
        assert_eq!(leading_number("12,5 m²"), Some(12.5));
    }

    #[test]
    fn dot_decimal() {
        assert_eq!(leading_number("4.25"), Some(4.25));
    }

    #[test]
    fn prose_before_number() {
        assert_eq!(leading_number("env. 40 ml"), Some(40.0));
    }

    #[test]
    fn trailing_separator_is_not_decimal() {
        assert_eq!(leading_number("3, puis 4"), Some(3.0));
    }

    #[test]
    fn only_first_separator_counts() {
        assert_eq!(leading_number("1.250,5"), Some(1.25));
    }

    #[test]
    fn negative_amount() {
        assert_eq!(leading_number("-15 €"), Some(-15.0));
    }

    #[test]
    fn superscript_is_not_a_digit() {
        assert_eq!(leading_number("m²"), None);
    }

    #[test]
    fn no_digits() {
        assert_eq!(leading_number("forfait"), None);
        assert_eq!(leading_number(""), None);
    }

    #[test]
    fn quantity_numeric_defaults_to_zero() {
        assert_eq!(Quantity::from("au besoin").numeric(), 0.0);
        assert_eq!(Quantity::Number(f64::NAN).numeric(), 0.0);
        assert_eq!(Quantity::from("12,5 m²").numeric(), 12.5);
        assert_eq!(Quantity::Number(3.0).numeric(), 3.0);
    }

    #[test]
    fn quantity_deserializes_number_or_text() {
        let n: Quantity = serde_json::from_str("12").unwrap();
        assert_eq!(n, Quantity::Number(12.0));
        let t: Quantity = serde_json::from_str("\"12 m²\"").unwrap();
        assert_eq!(t, Quantity::Text("12 m²".into()));
    }

    #[test]
    fn rounds_to_cents() {
        assert_eq!(round_cents(10.005_1), 10.01);
        assert_eq!(round_cents(125.0), 125.0);
        assert_eq!(round_cents(-2.345_1), -2.35);
    }
}
