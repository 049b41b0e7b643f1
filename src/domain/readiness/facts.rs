//! Extracted facts and the field set they are drawn from.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Placeholder strings models use for "I don't know".
const PLACEHOLDERS: &[&str] = &["unknown", "n/a", "na", "none", "null", "-", "?", "not provided"];

/// Type of value a field holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Text,
    Integer,
}

/// One field of the fixed extraction set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: String,
    pub kind: FieldKind,
    pub required: bool,
    /// Follow-up question asked when the field is missing.
    pub prompt: String,
}

impl FieldSpec {
    pub fn text(name: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: FieldKind::Text,
            required: true,
            prompt: prompt.into(),
        }
    }

    pub fn integer(name: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: FieldKind::Integer,
            required: true,
            prompt: prompt.into(),
        }
    }

    /// Marks the field as optional; it is extracted but never counted.
    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    /// Interprets a raw JSON value according to this field's kind.
    pub fn interpret(&self, raw: Option<&Value>) -> FactValue {
        let Some(raw) = raw else {
            return FactValue::Absent;
        };
        match (self.kind, raw) {
            (FieldKind::Text, Value::String(s)) => text_value(s),
            (FieldKind::Text, Value::Number(n)) => FactValue::Text(n.to_string()),
            (FieldKind::Integer, Value::Number(n)) => match n.as_i64() {
                Some(i) if i >= 0 => FactValue::Integer(i),
                _ => match n.as_f64() {
                    Some(f) if f >= 0.0 && f.fract() == 0.0 => FactValue::Integer(f as i64),
                    _ => FactValue::Absent,
                },
            },
            (FieldKind::Integer, Value::String(s)) => match s.trim().parse::<i64>() {
                Ok(i) if i >= 0 => FactValue::Integer(i),
                _ => FactValue::Absent,
            },
            _ => FactValue::Absent,
        }
    }
}

fn text_value(s: &str) -> FactValue {
    let trimmed = s.trim();
    if trimmed.is_empty() || PLACEHOLDERS.contains(&trimmed.to_lowercase().as_str()) {
        FactValue::Absent
    } else {
        FactValue::Text(trimmed.to_string())
    }
}

/// A single extracted value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FactValue {
    Integer(i64),
    Text(String),
    Absent,
}

impl FactValue {
    pub fn is_present(&self) -> bool {
        !matches!(self, FactValue::Absent)
    }

    pub fn to_json(&self) -> Value {
        match self {
            FactValue::Integer(i) => Value::from(*i),
            FactValue::Text(s) => Value::from(s.as_str()),
            FactValue::Absent => Value::Null,
        }
    }
}

/// Field name → value, rebuilt from scratch every turn.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ExtractedFacts {
    values: BTreeMap<String, FactValue>,
}

impl ExtractedFacts {
    /// All fields absent.
    pub fn absent(fields: &[FieldSpec]) -> Self {
        Self {
            values: fields
                .iter()
                .map(|f| (f.name.clone(), FactValue::Absent))
                .collect(),
        }
    }

    /// Reads every field of `fields` out of `raw`; unknown keys are ignored.
    pub fn from_json(fields: &[FieldSpec], raw: &Map<String, Value>) -> Self {
        Self {
            values: fields
                .iter()
                .map(|f| (f.name.clone(), f.interpret(raw.get(&f.name))))
                .collect(),
        }
    }

    pub fn get(&self, name: &str) -> &FactValue {
        self.values.get(name).unwrap_or(&FactValue::Absent)
    }

    pub fn is_present(&self, name: &str) -> bool {
        self.get(name).is_present()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &FactValue)> {
        self.values.iter()
    }

    /// JSON object with `null` for absent fields.
    pub fn to_json(&self) -> Value {
        Value::Object(
            self.values
                .iter()
                .map(|(k, v)| (k.clone(), v.to_json()))
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields() -> Vec<FieldSpec> {
        vec![
            FieldSpec::text("contract_amount", "amount?"),
            FieldSpec::integer("delay_days", "days?"),
            FieldSpec::text("delay_risk", "risk?").optional(),
        ]
    }

    #[test]
    fn text_placeholders_are_absent() {
        let spec = FieldSpec::text("x", "");
        for raw in ["", "  ", "Unknown", "N/A", "null", "-"] {
            assert_eq!(spec.interpret(Some(&json!(raw))), FactValue::Absent, "{raw}");
        }
        assert_eq!(
            spec.interpret(Some(&json!(" $100k "))),
            FactValue::Text("$100k".to_string())
        );
    }

    #[test]
    fn integer_accepts_numbers_and_numeric_strings() {
        let spec = FieldSpec::integer("delay_days", "");
        assert_eq!(spec.interpret(Some(&json!(14))), FactValue::Integer(14));
        assert_eq!(spec.interpret(Some(&json!("14"))), FactValue::Integer(14));
        assert_eq!(spec.interpret(Some(&json!(14.0))), FactValue::Integer(14));
        assert_eq!(spec.interpret(Some(&json!(-3))), FactValue::Absent);
        assert_eq!(spec.interpret(Some(&json!("two weeks"))), FactValue::Absent);
        assert_eq!(spec.interpret(Some(&json!(null))), FactValue::Absent);
    }

    #[test]
    fn from_json_ignores_unknown_keys_and_fills_missing() {
        let raw = json!({"contract_amount": "$1M", "surprise": true});
        let facts = ExtractedFacts::from_json(&fields(), raw.as_object().unwrap());

        assert!(facts.is_present("contract_amount"));
        assert!(!facts.is_present("delay_days"));
        assert!(!facts.is_present("surprise"));
        assert_eq!(facts.iter().count(), 3);
    }

    #[test]
    fn to_json_renders_absent_as_null() {
        let raw = json!({"delay_days": 3});
        let facts = ExtractedFacts::from_json(&fields(), raw.as_object().unwrap());
        assert_eq!(
            facts.to_json(),
            json!({"contract_amount": null, "delay_days": 3, "delay_risk": null})
        );
    }
}
