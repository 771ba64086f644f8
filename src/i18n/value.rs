//! Parameter values passed to `translate` and threaded through formatters.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::fmt;

/// A dynamically typed parameter value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    DateTime(DateTime<Utc>),
}

impl Value {
    /// Numeric view of the value, if it has one.
    ///
    /// Strings count as numeric when their trimmed content parses as a float.
    /// The empty string, null and booleans are not numeric, so they never
    /// fall into plural ranges or number formatting.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            Value::Str(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    None
                } else {
                    trimmed.parse::<f64>().ok()
                }
            }
            Value::Null | Value::Bool(_) | Value::DateTime(_) => None,
        }
    }

    /// Short name of the variant, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "string",
            Value::DateTime(_) => "date-time",
        }
    }

    /// Convert a JSON scalar. Arrays and objects have no parameter form.
    pub fn from_json(value: &serde_json::Value) -> Option<Value> {
        match value {
            serde_json::Value::Null => Some(Value::Null),
            serde_json::Value::Bool(b) => Some(Value::Bool(*b)),
            serde_json::Value::Number(n) => n
                .as_i64()
                .map(Value::Int)
                .or_else(|| n.as_f64().map(Value::Float)),
            serde_json::Value::String(s) => Some(Value::Str(s.clone())),
            serde_json::Value::Array(_) | serde_json::Value::Object(_) => None,
        }
    }
}

fn fmt_float(f: f64, out: &mut fmt::Formatter<'_>) -> fmt::Result {
    if f.is_nan() {
        out.write_str("NaN")
    } else if f.is_infinite() {
        out.write_str(if f > 0.0 { "Infinity" } else { "-Infinity" })
    } else if f == 0.0 {
        out.write_str("0")
    } else if f.fract() == 0.0 && f.abs() < 1e21 {
        write!(out, "{:.0}", f)
    } else {
        write!(out, "{}", f)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => fmt_float(*x, f),
            Value::Str(s) => f.write_str(s),
            Value::DateTime(dt) => f.write_str(&dt.to_rfc3339()),
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Str(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Str(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int(value.into())
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<u32> for Value {
    fn from(value: u32) -> Self {
        Value::Int(value.into())
    }
}

impl From<usize> for Value {
    fn from(value: usize) -> Self {
        i64::try_from(value)
            .map(Value::Int)
            .unwrap_or(Value::Float(value as f64))
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(value: DateTime<Utc>) -> Self {
        Value::DateTime(value)
    }
}

/// Named parameters for one `translate` call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Params {
    values: HashMap<String, Value>,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl<K, V> FromIterator<(K, V)> for Params
where
    K: Into<String>,
    V: Into<Value>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Params::new();
        for (name, value) in iter {
            params.insert(name, value);
        }
        params
    }
}

impl<K, V, const N: usize> From<[(K, V); N]> for Params
where
    K: Into<String>,
    V: Into<Value>,
{
    fn from(entries: [(K, V); N]) -> Self {
        entries.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    // ==================== Display Tests ====================

    #[test]
    fn test_display_scalars() {
        assert_eq!(Value::Null.to_string(), "null");
        assert_eq!(Value::Bool(true).to_string(), "true");
        assert_eq!(Value::Int(-42).to_string(), "-42");
        assert_eq!(Value::from("hi").to_string(), "hi");
    }

    #[test]
    fn test_display_floats_like_host_numbers() {
        assert_eq!(Value::Float(3.0).to_string(), "3");
        assert_eq!(Value::Float(-0.0).to_string(), "0");
        assert_eq!(Value::Float(2.5).to_string(), "2.5");
        assert_eq!(Value::Float(f64::NAN).to_string(), "NaN");
        assert_eq!(Value::Float(f64::INFINITY).to_string(), "Infinity");
        assert_eq!(Value::Float(f64::NEG_INFINITY).to_string(), "-Infinity");
    }

    #[test]
    fn test_display_date_time_is_rfc3339() {
        let dt = Utc.with_ymd_and_hms(2024, 9, 24, 14, 57, 52).unwrap();
        assert_eq!(Value::from(dt).to_string(), "2024-09-24T14:57:52+00:00");
    }

    // ==================== Numeric View Tests ====================

    #[test]
    fn test_as_number() {
        assert_eq!(Value::Int(7).as_number(), Some(7.0));
        assert_eq!(Value::from(" 4 ").as_number(), Some(4.0));
        assert_eq!(Value::from("4.5").as_number(), Some(4.5));
        assert_eq!(Value::from("foo").as_number(), None);
        assert_eq!(Value::from("").as_number(), None);
        assert_eq!(Value::Bool(true).as_number(), None);
    }

    #[test]
    fn test_null_and_bool_are_not_numeric() {
        assert_eq!(Value::Null.as_number(), None);
        assert_eq!(Value::Bool(false).as_number(), None);
        assert_eq!(Value::from("   ").as_number(), None);
    }

    #[test]
    fn test_from_json_scalars() {
        assert_eq!(Value::from_json(&serde_json::json!(1)), Some(Value::Int(1)));
        assert_eq!(
            Value::from_json(&serde_json::json!(1.5)),
            Some(Value::Float(1.5))
        );
        assert_eq!(Value::from_json(&serde_json::json!([1])), None);
    }

    // ==================== Params Tests ====================

    #[test]
    fn test_params_constructors() {
        let params = Params::from([("name", "Ada")]);
        assert_eq!(params.get("name"), Some(&Value::from("Ada")));

        let built = Params::new().with("count", 3).with("name", "Ada");
        assert_eq!(built.len(), 2);
        assert_eq!(built.get("count"), Some(&Value::Int(3)));
        assert!(Params::new().is_empty());
    }
}
