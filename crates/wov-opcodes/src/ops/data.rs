//! `json.stringify`, `json.parse`, `typeof`.

use async_trait::async_trait;
use wov_core::ast::Ast;
use wov_core::context::Context;
use wov_core::error::{Result, WovError};
use wov_core::value::Value;

use crate::meta::{Category, Evaluation, OpcodeMeta};
use crate::opcode::{eval_all, Evaluator, Opcode};

fn meta(name: &'static str, description: &'static str) -> OpcodeMeta {
    OpcodeMeta { name, category: Category::Data, evaluation: Evaluation::Eager, description }
}

/// `json.stringify(value)`.
pub struct JsonStringify;

#[async_trait]
impl Opcode for JsonStringify {
    fn name(&self) -> &'static str {
        "json.stringify"
    }

    fn metadata(&self) -> OpcodeMeta {
        meta("json.stringify", "Serialize a value to a JSON string.")
    }

    async fn execute(&self, ctx: &mut Context, args: &[Ast], eval: &dyn Evaluator) -> Result<Value> {
        let values = eval_all(ctx, args, eval).await?;
        let value = values.into_iter().next().unwrap_or(Value::Null);
        let json: serde_json::Value = value.into();
        let text = serde_json::to_string(&json).map_err(|e| WovError::Internal(e.to_string()))?;
        Ok(Value::str(text))
    }
}

/// `json.parse(text)`.
pub struct JsonParse;

#[async_trait]
impl Opcode for JsonParse {
    fn name(&self) -> &'static str {
        "json.parse"
    }

    fn metadata(&self) -> OpcodeMeta {
        meta("json.parse", "Parse a JSON string into a value.")
    }

    async fn execute(&self, ctx: &mut Context, args: &[Ast], eval: &dyn Evaluator) -> Result<Value> {
        let values = eval_all(ctx, args, eval).await?;
        let text = values.first().and_then(Value::as_str).ok_or_else(|| WovError::InvalidRequest("json.parse requires a string".into()))?;
        let json: serde_json::Value = serde_json::from_str(text).map_err(|e| WovError::InvalidRequest(format!("invalid JSON: {e}")))?;
        Ok(Value::from(&json))
    }
}

/// `typeof(value)`.
pub struct TypeOf;

#[async_trait]
impl Opcode for TypeOf {
    fn name(&self) -> &'static str {
        "typeof"
    }

    fn metadata(&self) -> OpcodeMeta {
        meta("typeof", "The value's dynamic type name.")
    }

    async fn execute(&self, ctx: &mut Context, args: &[Ast], eval: &dyn Evaluator) -> Result<Value> {
        let values = eval_all(ctx, args, eval).await?;
        let value = values.first().unwrap_or(&Value::Null);
        Ok(Value::str(value.type_name()))
    }
}
