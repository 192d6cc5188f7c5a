use serde::{Deserialize, Deserializer};
use serde_json::Value;

pub const DEFAULT_PERIOD_LABEL: &str = "February 2026";

pub fn amount(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}

pub fn team_size(value: f64) -> u32 {
    if !value.is_finite() {
        return 1;
    }
    value.round().clamp(1.0, f64::from(u32::MAX)) as u32
}

pub fn days(value: f64) -> u32 {
    if !value.is_finite() {
        return 0;
    }
    value.round().clamp(0.0, f64::from(u32::MAX)) as u32
}

pub fn period_label(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

pub(crate) fn number_from_value(value: &Value) -> f64 {
    match value {
        Value::Number(number) => number.as_f64().unwrap_or(0.0),
        Value::String(raw) => raw.trim().parse::<f64>().unwrap_or(0.0),
        _ => 0.0,
    }
}

pub(crate) mod lenient {
    use super::*;
    use crate::models::RevenueTier;

    pub fn amount<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(super::amount(number_from_value(&value)))
    }

    pub fn team_size<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(super::team_size(number_from_value(&value)))
    }

    pub fn days<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(super::days(number_from_value(&value)))
    }

    pub fn period_label<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
        let value = Value::deserialize(deserializer)?;
        let label = match &value {
            Value::String(raw) => super::period_label(raw),
            Value::Number(number) => Some(number.to_string()),
            _ => None,
        };
        Ok(label.unwrap_or_else(|| DEFAULT_PERIOD_LABEL.to_string()))
    }

    // Non-object entries keep their position as disabled tiers.
    pub fn tiers<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<RevenueTier>, D::Error> {
        let value = Value::deserialize(deserializer)?;
        let Value::Array(entries) = value else {
            return Ok(Vec::new());
        };
        Ok(entries
            .iter()
            .map(|entry| RevenueTier {
                threshold: super::amount(
                    entry
                        .get("threshold")
                        .or_else(|| entry.get("target"))
                        .map(number_from_value)
                        .unwrap_or(0.0),
                ),
                bonus: super::amount(entry.get("bonus").map(number_from_value).unwrap_or(0.0)),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn amount_zeroes_non_finite_and_negative() {
        assert_eq!(amount(f64::NAN), 0.0);
        assert_eq!(amount(f64::INFINITY), 0.0);
        assert_eq!(amount(-12.5), 0.0);
        assert_eq!(amount(42.25), 42.25);
    }

    #[test]
    fn team_size_never_drops_below_one() {
        assert_eq!(team_size(0.0), 1);
        assert_eq!(team_size(-3.0), 1);
        assert_eq!(team_size(f64::NAN), 1);
        assert_eq!(team_size(2.4), 2);
        assert_eq!(team_size(2.6), 3);
    }

    #[test]
    fn days_round_and_clamp_at_zero() {
        assert_eq!(days(-1.0), 0);
        assert_eq!(days(17.6), 18);
        assert_eq!(days(f64::NEG_INFINITY), 0);
    }

    #[test]
    fn blank_labels_are_rejected() {
        assert_eq!(period_label("   "), None);
        assert_eq!(period_label(" March 2026 ").as_deref(), Some("March 2026"));
    }

    #[test]
    fn numbers_are_read_from_strings_and_junk_is_zero() {
        assert_eq!(number_from_value(&serde_json::json!("12.5")), 12.5);
        assert_eq!(number_from_value(&serde_json::json!("abc")), 0.0);
        assert_eq!(number_from_value(&serde_json::json!(null)), 0.0);
        assert_eq!(number_from_value(&serde_json::json!([1, 2])), 0.0);
    }
}
