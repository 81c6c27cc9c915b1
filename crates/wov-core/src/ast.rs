//! The AST shape verbs are stored and interpreted as.

use serde::{Deserialize, Serialize};

use crate::value::Value;

/// A node in a verb's parsed body.
///
/// There is no statement/expression distinction: every node evaluates to a
/// `Value`. `Call` covers both opcode invocation and the handful of
/// syntactic forms (`if`, `while`, `lambda`, ...) that need to control
/// whether their arguments are evaluated eagerly or lazily — that decision
/// lives with each opcode's registration, not with the AST shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Ast {
    /// A literal value, evaluating to itself.
    Literal { value: Value },
    /// Invocation of an opcode or verb-local function by name with
    /// unevaluated argument nodes.
    Call { op: String, args: Vec<Ast> },
}

impl Ast {
    /// Build a literal node.
    #[must_use]
    pub fn literal(value: Value) -> Self {
        Ast::Literal { value }
    }

    /// Build a call node.
    #[must_use]
    pub fn call(op: impl Into<String>, args: Vec<Ast>) -> Self {
        Ast::Call { op: op.into(), args }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serde_round_trip() {
        let ast = Ast::call("add", vec![Ast::literal(Value::int(1)), Ast::literal(Value::int(2))]);
        let json = serde_json::to_string(&ast).unwrap();
        let back: Ast = serde_json::from_str(&json).unwrap();
        match back {
            Ast::Call { op, args } => {
                assert_eq!(op, "add");
                assert_eq!(args.len(), 2);
            },
            Ast::Literal { .. } => panic!("expected call"),
        }
    }
}
