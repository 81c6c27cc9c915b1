//! The dynamic value type that flows through entity props, verb arguments,
//! and opcode results.
//!
//! Distinct from `serde_json::Value` so numeric round-tripping
//! (`json.parse(json.stringify(v)) == v`) is exact: integers and floats are
//! kept as separate variants rather than collapsed into one `f64`.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A JSON-serializable value with no nominal type.
///
/// Ordering of object keys is not significant for equality (`props` is an
/// "unordered mapping" per the data model), so [`Value::Object`] is backed
/// by a `BTreeMap` for deterministic iteration without implying order
/// matters semantically.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// JSON `null`.
    Null,
    /// JSON `true`/`false`.
    Bool(bool),
    /// JSON number. Kept as a distinct integer/float pair so
    /// `json.parse(json.stringify(v)) == v` holds exactly.
    Number(Number),
    /// JSON string.
    String(String),
    /// Ordered sequence of values.
    List(Vec<Value>),
    /// String-keyed mapping of values.
    Object(BTreeMap<String, Value>),
}

/// A JSON number, preserving whether it was written as an integer or a float.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Number {
    /// An integral value.
    Int(i64),
    /// A floating-point value.
    Float(f64),
}

impl Number {
    /// Widen to `f64` for arithmetic.
    #[must_use]
    pub fn as_f64(self) -> f64 {
        match self {
            Number::Int(i) => i as f64,
            Number::Float(f) => f,
        }
    }

    /// Produce the narrowest representation of an arithmetic result: integral
    /// results stay integers, anything with a fractional part becomes a float.
    #[must_use]
    pub fn from_f64(f: f64) -> Self {
        if f.is_finite() && f.fract() == 0.0 && f.abs() < 9_007_199_254_740_992.0 {
            Number::Int(f as i64)
        } else {
            Number::Float(f)
        }
    }
}

impl PartialEq for Number {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Number::Int(a), Number::Int(b)) => a == b,
            (Number::Float(a), Number::Float(b)) => a == b,
            (Number::Int(a), Number::Float(b)) | (Number::Float(b), Number::Int(a)) => {
                (*a as f64) == *b
            },
        }
    }
}

impl fmt::Display for Value {
    /// Human-readable rendering used by `str.concat`/`log`/`warn` and error
    /// messages. Not the same as `json.stringify`: strings render
    /// unquoted.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Number(n) => write!(f, "{n}"),
            Value::String(s) => write!(f, "{s}"),
            Value::List(_) | Value::Object(_) => {
                let json: serde_json::Value = self.clone().into();
                write!(f, "{json}")
            },
        }
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::Int(i) => write!(f, "{i}"),
            Number::Float(x) => write!(f, "{x}"),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a == b,
            _ => false,
        }
    }
}

impl Value {
    /// `true`/`false`ness used by `if`/`and`/`or`/`while` short-circuit
    /// opcodes: everything is truthy except `null`, `false`, `0`, and `""`.
    #[must_use]
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => n.as_f64() != 0.0,
            Value::String(s) => !s.is_empty(),
            Value::List(_) | Value::Object(_) => true,
        }
    }

    /// The `typeof` opcode's name for this value's shape.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::List(_) => "list",
            Value::Object(_) => "object",
        }
    }

    /// Convenience constructor for an integer.
    #[must_use]
    pub fn int(i: i64) -> Self {
        Value::Number(Number::Int(i))
    }

    /// Convenience constructor for a string.
    #[must_use]
    pub fn str(s: impl Into<String>) -> Self {
        Value::String(s.into())
    }

    /// Extract a string slice, if this is a string.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Extract an `i64`, truncating floats, if this is a number.
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Number(n) => Some(n.as_f64() as i64),
            _ => None,
        }
    }

    /// Extract an `f64`, if this is a number.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(n.as_f64()),
            _ => None,
        }
    }

    /// Extract a list slice, if this is a list.
    #[must_use]
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(l) => Some(l),
            _ => None,
        }
    }
}

impl From<&serde_json::Value> for Value {
    fn from(v: &serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(*b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Number(Number::Int(i))
                } else {
                    Value::Number(Number::Float(n.as_f64().unwrap_or(0.0)))
                }
            },
            serde_json::Value::String(s) => Value::String(s.clone()),
            serde_json::Value::Array(a) => Value::List(a.iter().map(Value::from).collect()),
            serde_json::Value::Object(o) => {
                Value::Object(o.iter().map(|(k, v)| (k.clone(), Value::from(v))).collect())
            },
        }
    }
}

impl From<Value> for serde_json::Value {
    fn from(v: Value) -> Self {
        match v {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(b),
            Value::Number(Number::Int(i)) => serde_json::Value::from(i),
            Value::Number(Number::Float(f)) => serde_json::Number::from_f64(f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::String(s) => serde_json::Value::String(s),
            Value::List(l) => serde_json::Value::Array(l.into_iter().map(Into::into).collect()),
            Value::Object(o) => {
                serde_json::Value::Object(o.into_iter().map(|(k, v)| (k, v.into())).collect())
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truthiness() {
        assert!(!Value::Null.is_truthy());
        assert!(!Value::Bool(false).is_truthy());
        assert!(!Value::int(0).is_truthy());
        assert!(!Value::str("").is_truthy());
        assert!(Value::str("x").is_truthy());
        assert!(Value::List(vec![]).is_truthy());
    }

    #[test]
    fn json_round_trip_preserves_int_vs_float() {
        let v = Value::Object(BTreeMap::from([
            ("a".to_string(), Value::int(3)),
            ("b".to_string(), Value::Number(Number::Float(3.5))),
            ("c".to_string(), Value::List(vec![Value::Null, Value::Bool(true)])),
        ]));
        let json: serde_json::Value = v.clone().into();
        let text = serde_json::to_string(&json).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&text).unwrap();
        let back = Value::from(&parsed);
        assert_eq!(v, back);
    }
}
