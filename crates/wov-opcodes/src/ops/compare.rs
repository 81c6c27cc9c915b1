//! `==`, `!=`, `<`, `>`, `<=`, `>=`.

use async_trait::async_trait;
use wov_core::ast::Ast;
use wov_core::context::Context;
use wov_core::error::{Result, WovError};
use wov_core::value::Value;

use crate::meta::{Category, Evaluation, OpcodeMeta};
use crate::opcode::{eval_all, Evaluator, Opcode};

fn ordering(a: &Value, b: &Value, op: &'static str) -> Result<std::cmp::Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => {
            x.as_f64().partial_cmp(&y.as_f64()).ok_or_else(|| WovError::InvalidRequest(format!("{op}: NaN comparison")))
        },
        (Value::String(x), Value::String(y)) => Ok(x.cmp(y)),
        _ => Err(WovError::InvalidRequest(format!("{op} requires two numbers or two strings"))),
    }
}

macro_rules! compare_op {
    ($struct_name:ident, $name:literal, $description:literal, |$a:ident, $b:ident| $body:expr) => {
        pub struct $struct_name;

        #[async_trait]
        impl Opcode for $struct_name {
            fn name(&self) -> &'static str {
                $name
            }

            fn metadata(&self) -> OpcodeMeta {
                OpcodeMeta { name: $name, category: Category::Compare, evaluation: Evaluation::Eager, description: $description }
            }

            async fn execute(&self, ctx: &mut Context, args: &[Ast], eval: &dyn Evaluator) -> Result<Value> {
                let values = eval_all(ctx, args, eval).await?;
                let [$a, $b] = values.as_slice() else {
                    return Err(WovError::InvalidRequest(format!("{} requires exactly two arguments", $name)));
                };
                $body
            }
        }
    };
}

compare_op!(Eq, "==", "Structural equality.", |a, b| Ok(Value::Bool(a == b)));
compare_op!(Ne, "!=", "Structural inequality.", |a, b| Ok(Value::Bool(a != b)));
compare_op!(Lt, "<", "Less than.", |a, b| Ok(Value::Bool(ordering(a, b, "<")?.is_lt())));
compare_op!(Gt, ">", "Greater than.", |a, b| Ok(Value::Bool(ordering(a, b, ">")?.is_gt())));
compare_op!(Le, "<=", "Less than or equal.", |a, b| Ok(Value::Bool(ordering(a, b, "<=")?.is_le())));
compare_op!(Ge, ">=", "Greater than or equal.", |a, b| Ok(Value::Bool(ordering(a, b, ">=")?.is_ge())));
