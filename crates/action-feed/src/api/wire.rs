use serde::{Deserialize, Serialize};
use std::fmt;

/// Numeric field the backend sends either as a JSON number or as a decimal string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FlexibleNumber {
    Number(f64),
    Text(String),
}

impl FlexibleNumber {
    /// Finite value carried by the field; unparsable text yields `None`.
    pub fn value(&self) -> Option<f64> {
        let value = match self {
            FlexibleNumber::Number(value) => *value,
            FlexibleNumber::Text(raw) => raw.trim().parse::<f64>().ok()?,
        };
        value.is_finite().then_some(value)
    }

    /// Non-negative integral view used for office, province, and position ids.
    pub fn as_u32(&self) -> Option<u32> {
        self.value()
            .filter(|value| *value >= 0.0 && *value <= u32::MAX as f64)
            .map(|value| value.trunc() as u32)
    }
}

impl From<f64> for FlexibleNumber {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

/// Identifier the backend sends either as an integer or as a string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FlexibleId {
    Number(i64),
    Text(String),
}

impl FlexibleId {
    /// `None` when the id is an empty string.
    pub fn non_empty(&self) -> Option<String> {
        match self {
            FlexibleId::Number(value) => Some(value.to_string()),
            FlexibleId::Text(raw) => {
                let trimmed = raw.trim();
                (!trimmed.is_empty()).then(|| trimmed.to_string())
            }
        }
    }
}

impl fmt::Display for FlexibleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlexibleId::Number(value) => write!(f, "{value}"),
            FlexibleId::Text(raw) => write!(f, "{raw}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn flexible_number_accepts_numbers_and_strings() {
        let number: FlexibleNumber = serde_json::from_value(json!(75000)).expect("number");
        let text: FlexibleNumber = serde_json::from_value(json!(" 2200.50 ")).expect("text");
        assert_eq!(number.value(), Some(75000.0));
        assert_eq!(text.value(), Some(2200.5));
    }

    #[test]
    fn flexible_number_rejects_garbage_and_non_finite_text() {
        assert_eq!(FlexibleNumber::Text("abc".to_string()).value(), None);
        assert_eq!(FlexibleNumber::Text("NaN".to_string()).value(), None);
        assert_eq!(FlexibleNumber::Text("-3".to_string()).as_u32(), None);
        assert_eq!(FlexibleNumber::Text("12".to_string()).as_u32(), Some(12));
    }

    #[test]
    fn flexible_id_renders_both_shapes() {
        assert_eq!(FlexibleId::Number(42).non_empty().as_deref(), Some("42"));
        assert_eq!(FlexibleId::Text("  ".to_string()).non_empty(), None);
        assert_eq!(FlexibleId::Text("L-9".to_string()).to_string(), "L-9");
    }
}
