//! `str.join`, `str.lower`, `str.upper`, `str.includes`, `str.concat`.

use async_trait::async_trait;
use wov_core::ast::Ast;
use wov_core::context::Context;
use wov_core::error::{Result, WovError};
use wov_core::value::Value;

use crate::meta::{Category, Evaluation, OpcodeMeta};
use crate::opcode::{eval_all, Evaluator, Opcode};

fn meta(name: &'static str, description: &'static str) -> OpcodeMeta {
    OpcodeMeta { name, category: Category::String, evaluation: Evaluation::Eager, description }
}

fn as_string(v: &Value, op: &'static str) -> Result<String> {
    v.as_str().map(str::to_string).ok_or_else(|| WovError::InvalidRequest(format!("{op} requires a string argument")))
}

/// `str.join(list, separator)`.
pub struct StrJoin;

#[async_trait]
impl Opcode for StrJoin {
    fn name(&self) -> &'static str {
        "str.join"
    }

    fn metadata(&self) -> OpcodeMeta {
        meta("str.join", "Join a list of values with separator, rendering each with Display.")
    }

    async fn execute(&self, ctx: &mut Context, args: &[Ast], eval: &dyn Evaluator) -> Result<Value> {
        let values = eval_all(ctx, args, eval).await?;
        let [list, sep] = values.as_slice() else {
            return Err(WovError::InvalidRequest("str.join requires (list, separator)".into()));
        };
        let items = list.as_list().ok_or_else(|| WovError::InvalidRequest("str.join requires a list".into()))?;
        let sep = as_string(sep, "str.join")?;
        let joined = items.iter().map(ToString::to_string).collect::<Vec<_>>().join(&sep);
        Ok(Value::str(joined))
    }
}

/// `str.lower(s)`.
pub struct StrLower;

#[async_trait]
impl Opcode for StrLower {
    fn name(&self) -> &'static str {
        "str.lower"
    }

    fn metadata(&self) -> OpcodeMeta {
        meta("str.lower", "Lowercase.")
    }

    async fn execute(&self, ctx: &mut Context, args: &[Ast], eval: &dyn Evaluator) -> Result<Value> {
        let values = eval_all(ctx, args, eval).await?;
        let s = values.first().ok_or_else(|| WovError::InvalidRequest("str.lower requires one argument".into()))?;
        Ok(Value::str(as_string(s, "str.lower")?.to_lowercase()))
    }
}

/// `str.upper(s)`.
pub struct StrUpper;

#[async_trait]
impl Opcode for StrUpper {
    fn name(&self) -> &'static str {
        "str.upper"
    }

    fn metadata(&self) -> OpcodeMeta {
        meta("str.upper", "Uppercase.")
    }

    async fn execute(&self, ctx: &mut Context, args: &[Ast], eval: &dyn Evaluator) -> Result<Value> {
        let values = eval_all(ctx, args, eval).await?;
        let s = values.first().ok_or_else(|| WovError::InvalidRequest("str.upper requires one argument".into()))?;
        Ok(Value::str(as_string(s, "str.upper")?.to_uppercase()))
    }
}

/// `str.includes(haystack, needle)`.
pub struct StrIncludes;

#[async_trait]
impl Opcode for StrIncludes {
    fn name(&self) -> &'static str {
        "str.includes"
    }

    fn metadata(&self) -> OpcodeMeta {
        meta("str.includes", "Whether haystack contains needle as a substring.")
    }

    async fn execute(&self, ctx: &mut Context, args: &[Ast], eval: &dyn Evaluator) -> Result<Value> {
        let values = eval_all(ctx, args, eval).await?;
        let [haystack, needle] = values.as_slice() else {
            return Err(WovError::InvalidRequest("str.includes requires (haystack, needle)".into()));
        };
        Ok(Value::Bool(as_string(haystack, "str.includes")?.contains(&as_string(needle, "str.includes")?)))
    }
}

/// `str.concat(a, b, ...)` — renders each argument with `Display` and
/// joins them directly (no separator).
pub struct StrConcat;

#[async_trait]
impl Opcode for StrConcat {
    fn name(&self) -> &'static str {
        "str.concat"
    }

    fn metadata(&self) -> OpcodeMeta {
        meta("str.concat", "Concatenate the Display rendering of every argument.")
    }

    async fn execute(&self, ctx: &mut Context, args: &[Ast], eval: &dyn Evaluator) -> Result<Value> {
        let values = eval_all(ctx, args, eval).await?;
        Ok(Value::str(values.iter().map(ToString::to_string).collect::<String>()))
    }
}
