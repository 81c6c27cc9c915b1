//! Closures as ordinary [`Value`]s.
//!
//! Rather than widening [`Value`] with a non-JSON-serializable `Lambda`
//! variant (which would force hand-written, easy-to-get-wrong `Serialize`
//! impls on the already-tested core value type), a lambda is encoded as a
//! plain `Value::Object` carrying a well-known marker key. This keeps
//! `json.stringify`/`json.parse` total over every `Value` a verb can
//! produce — a lambda simply stringifies to the JSON object it already is,
//! the same way functions have no literal JSON form in any scripting
//! language this system's opcode set is modeled on.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::ast::Ast;
use crate::value::Value;

const MARKER: &str = "__lambda__";

/// A closure: the lambda's declared parameter names, its body, and a
/// snapshot of the enclosing scope taken at creation time (copy-on-capture,
/// not by reference).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lambda {
    pub params: Vec<String>,
    pub body: Ast,
    pub captured: BTreeMap<String, Value>,
}

impl Lambda {
    #[must_use]
    pub fn into_value(self) -> Value {
        let body_json = serde_json::to_value(&self.body).unwrap_or(serde_json::Value::Null);
        let captured = Value::Object(self.captured);
        let inner = Value::Object(BTreeMap::from([
            ("params".to_string(), Value::List(self.params.into_iter().map(Value::String).collect())),
            ("body".to_string(), Value::from(&body_json)),
            ("captured".to_string(), captured),
        ]));
        Value::Object(BTreeMap::from([(MARKER.to_string(), inner)]))
    }

    /// Recover a `Lambda` from a `Value`, if it's one produced by
    /// [`Lambda::into_value`].
    #[must_use]
    pub fn from_value(value: &Value) -> Option<Self> {
        let Value::Object(outer) = value else { return None };
        let Value::Object(inner) = outer.get(MARKER)? else { return None };

        let params = match inner.get("params")? {
            Value::List(items) => items.iter().map(|v| v.as_str().unwrap_or_default().to_string()).collect(),
            _ => return None,
        };
        let body_json: serde_json::Value = inner.get("body")?.clone().into();
        let body: Ast = serde_json::from_value(body_json).ok()?;
        let captured = match inner.get("captured")? {
            Value::Object(map) => map.clone(),
            _ => BTreeMap::new(),
        };
        Some(Lambda { params, body, captured })
    }

    #[must_use]
    pub fn is_lambda(value: &Value) -> bool {
        matches!(value, Value::Object(o) if o.contains_key(MARKER))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_value() {
        let lambda = Lambda {
            params: vec!["x".to_string()],
            body: Ast::call("add", vec![Ast::literal(Value::int(1)), Ast::literal(Value::int(2))]),
            captured: BTreeMap::from([("y".to_string(), Value::int(7))]),
        };
        let value = lambda.clone().into_value();
        assert!(Lambda::is_lambda(&value));
        let back = Lambda::from_value(&value).unwrap();
        assert_eq!(back.params, lambda.params);
        assert_eq!(back.captured, lambda.captured);
    }

    #[test]
    fn non_lambda_values_are_rejected() {
        assert!(Lambda::from_value(&Value::int(3)).is_none());
        assert!(!Lambda::is_lambda(&Value::str("hi")));
    }
}
