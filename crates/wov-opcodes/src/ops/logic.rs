//! `and`, `or`, `not` — `and`/`or` short-circuit and return the
//! last-evaluated operand rather than coercing to `Bool`, matching `if`'s
//! truthiness rules.

use async_trait::async_trait;
use wov_core::ast::Ast;
use wov_core::context::Context;
use wov_core::error::{Result, WovError};
use wov_core::value::Value;

use crate::meta::{Category, Evaluation, OpcodeMeta};
use crate::opcode::{eval_all, Evaluator, Opcode};

/// `and(a, b, ...)` — evaluate left to right, stop and return the first
/// falsy operand; otherwise return the last.
pub struct And;

#[async_trait]
impl Opcode for And {
    fn name(&self) -> &'static str {
        "and"
    }

    fn metadata(&self) -> OpcodeMeta {
        OpcodeMeta { name: "and", category: Category::Logic, evaluation: Evaluation::Lazy, description: "Short-circuiting logical AND." }
    }

    async fn execute(&self, ctx: &mut Context, args: &[Ast], eval: &dyn Evaluator) -> Result<Value> {
        let mut last = Value::Bool(true);
        for node in args {
            last = eval.eval(ctx, node).await?;
            if !last.is_truthy() {
                return Ok(last);
            }
        }
        Ok(last)
    }
}

/// `or(a, b, ...)` — evaluate left to right, stop and return the first
/// truthy operand; otherwise return the last.
pub struct Or;

#[async_trait]
impl Opcode for Or {
    fn name(&self) -> &'static str {
        "or"
    }

    fn metadata(&self) -> OpcodeMeta {
        OpcodeMeta { name: "or", category: Category::Logic, evaluation: Evaluation::Lazy, description: "Short-circuiting logical OR." }
    }

    async fn execute(&self, ctx: &mut Context, args: &[Ast], eval: &dyn Evaluator) -> Result<Value> {
        let mut last = Value::Bool(false);
        for node in args {
            last = eval.eval(ctx, node).await?;
            if last.is_truthy() {
                return Ok(last);
            }
        }
        Ok(last)
    }
}

/// `not(value)`.
pub struct Not;

#[async_trait]
impl Opcode for Not {
    fn name(&self) -> &'static str {
        "not"
    }

    fn metadata(&self) -> OpcodeMeta {
        OpcodeMeta { name: "not", category: Category::Logic, evaluation: Evaluation::Eager, description: "Logical negation." }
    }

    async fn execute(&self, ctx: &mut Context, args: &[Ast], eval: &dyn Evaluator) -> Result<Value> {
        let values = eval_all(ctx, args, eval).await?;
        let value = values.first().ok_or_else(|| WovError::InvalidRequest("not requires one argument".into()))?;
        Ok(Value::Bool(!value.is_truthy()))
    }
}
