//! Field value type -- the dynamic value union carried by form documents.
//!
//! Form data arrives as semi-structured JSON. [`FieldValue`] is the tagged
//! view of it: every conversion from JSON funnels through [`FieldValue::from_json`]
//! so the "integer if whole, else float" normalization rule is applied in
//! exactly one place. Nested objects and arrays are retained as opaque
//! serialized text so they round-trip without schema knowledge.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::fmt;

/// A single field's value inside a form document.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    /// Nested object or array kept as its serialized JSON text.
    Raw(String),
}

impl FieldValue {
    /// Converts a JSON value into a `FieldValue`.
    ///
    /// Numbers with no fractional part become `Int`; objects and arrays are
    /// kept as their serialized text.
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(*b),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Self::Int(i)
                } else if let Some(f) = n.as_f64() {
                    Self::from_f64(f)
                } else {
                    // u64 beyond i64 range; keep the digits as text.
                    Self::Text(n.to_string())
                }
            }
            Value::String(s) => Self::Text(s.clone()),
            Value::Object(_) | Value::Array(_) => Self::Raw(value.to_string()),
        }
    }

    /// Normalizes a float: whole values within i64 range become `Int`.
    pub fn from_f64(f: f64) -> Self {
        if f.is_finite() && f.fract() == 0.0 && f >= i64::MIN as f64 && f <= i64::MAX as f64 {
            Self::Int(f as i64)
        } else {
            Self::Float(f)
        }
    }

    /// Converts back to a JSON value.
    ///
    /// `Raw` text is re-parsed so nested structures round-trip; if the text
    /// is not valid JSON it degrades to a JSON string.
    pub fn to_json(&self) -> Value {
        match self {
            Self::Null => Value::Null,
            Self::Bool(b) => Value::Bool(*b),
            Self::Int(i) => Value::from(*i),
            Self::Float(f) => serde_json::Number::from_f64(*f)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            Self::Text(s) => Value::String(s.clone()),
            Self::Raw(raw) => {
                serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.clone()))
            }
        }
    }

    /// Returns the numeric view of this value, if it has one.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(i) => Some(*i as f64),
            Self::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Returns the boolean, if this is a `Bool`.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the string slice, if this is `Text`.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Truthiness used when an expression result is coerced to a boolean:
    /// null, false, zero, and the empty string are false; everything else
    /// (including Raw) is true.
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Null => false,
            Self::Bool(b) => *b,
            Self::Int(i) => *i != 0,
            Self::Float(f) => *f != 0.0,
            Self::Text(s) => !s.is_empty(),
            Self::Raw(_) => true,
        }
    }
}

impl Default for FieldValue {
    fn default() -> Self {
        Self::Null
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Text(s) => f.write_str(s),
            Self::Raw(raw) => f.write_str(raw),
        }
    }
}

impl Serialize for FieldValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for FieldValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(Self::from_json(&value))
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_owned())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<i64> for FieldValue {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<f64> for FieldValue {
    fn from(f: f64) -> Self {
        Self::from_f64(f)
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn whole_numbers_normalize_to_int() {
        assert_eq!(FieldValue::from_json(&serde_json::json!(3)), FieldValue::Int(3));
        assert_eq!(FieldValue::from_json(&serde_json::json!(3.0)), FieldValue::Int(3));
        assert_eq!(
            FieldValue::from_json(&serde_json::json!(3.5)),
            FieldValue::Float(3.5)
        );
    }

    #[test]
    fn objects_round_trip_as_raw_text() {
        let value = serde_json::json!({"unit": "mg", "amount": 50});
        let fv = FieldValue::from_json(&value);
        assert!(matches!(fv, FieldValue::Raw(_)));
        assert_eq!(fv.to_json(), value);
    }

    #[test]
    fn invalid_raw_degrades_to_string() {
        let fv = FieldValue::Raw("not json".into());
        assert_eq!(fv.to_json(), Value::String("not json".into()));
    }

    #[test]
    fn truthiness() {
        assert!(!FieldValue::Null.is_truthy());
        assert!(!FieldValue::Bool(false).is_truthy());
        assert!(!FieldValue::Int(0).is_truthy());
        assert!(!FieldValue::Text(String::new()).is_truthy());
        assert!(FieldValue::Float(0.5).is_truthy());
        assert!(FieldValue::Text("x".into()).is_truthy());
        assert!(FieldValue::Raw("{}".into()).is_truthy());
    }

    #[test]
    fn serde_round_trip() {
        let fv = FieldValue::Float(2.75);
        let json = serde_json::to_string(&fv).unwrap();
        assert_eq!(json, "2.75");
        let back: FieldValue = serde_json::from_str(&json).unwrap();
        assert_eq!(back, fv);
    }
}
