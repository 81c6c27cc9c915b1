//! `time.now`, `time.to_timestamp`, `time.format`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use wov_core::ast::Ast;
use wov_core::context::Context;
use wov_core::error::{Result, WovError};
use wov_core::value::Value;

use crate::meta::{Category, Evaluation, OpcodeMeta};
use crate::opcode::{eval_all, Evaluator, Opcode};

fn meta(name: &'static str, description: &'static str) -> OpcodeMeta {
    OpcodeMeta { name, category: Category::Time, evaluation: Evaluation::Eager, description }
}

/// `time.now()` — current time as Unix milliseconds.
pub struct TimeNow;

#[async_trait]
impl Opcode for TimeNow {
    fn name(&self) -> &'static str {
        "time.now"
    }

    fn metadata(&self) -> OpcodeMeta {
        meta("time.now", "Current time, Unix milliseconds.")
    }

    async fn execute(&self, ctx: &mut Context, args: &[Ast], eval: &dyn Evaluator) -> Result<Value> {
        eval_all(ctx, args, eval).await?;
        Ok(Value::int(Utc::now().timestamp_millis()))
    }
}

/// `time.to_timestamp(isoString)` — parse an ISO-8601 string to Unix
/// milliseconds.
pub struct TimeToTimestamp;

#[async_trait]
impl Opcode for TimeToTimestamp {
    fn name(&self) -> &'static str {
        "time.to_timestamp"
    }

    fn metadata(&self) -> OpcodeMeta {
        meta("time.to_timestamp", "Parse an ISO-8601 string to Unix milliseconds.")
    }

    async fn execute(&self, ctx: &mut Context, args: &[Ast], eval: &dyn Evaluator) -> Result<Value> {
        let values = eval_all(ctx, args, eval).await?;
        let text = values.first().and_then(Value::as_str).ok_or_else(|| WovError::InvalidRequest("time.to_timestamp requires a string".into()))?;
        let parsed: DateTime<Utc> =
            DateTime::parse_from_rfc3339(text).map_err(|e| WovError::InvalidRequest(format!("invalid timestamp: {e}")))?.with_timezone(&Utc);
        Ok(Value::int(parsed.timestamp_millis()))
    }
}

/// `time.format(millis, pattern)` — `chrono::format::strftime` pattern.
pub struct TimeFormat;

#[async_trait]
impl Opcode for TimeFormat {
    fn name(&self) -> &'static str {
        "time.format"
    }

    fn metadata(&self) -> OpcodeMeta {
        meta("time.format", "Format Unix milliseconds with a strftime pattern.")
    }

    async fn execute(&self, ctx: &mut Context, args: &[Ast], eval: &dyn Evaluator) -> Result<Value> {
        let values = eval_all(ctx, args, eval).await?;
        let [millis, pattern] = values.as_slice() else {
            return Err(WovError::InvalidRequest("time.format requires (millis, pattern)".into()));
        };
        let millis = millis.as_i64().ok_or_else(|| WovError::InvalidRequest("time.format millis must be a number".into()))?;
        let pattern = pattern.as_str().ok_or_else(|| WovError::InvalidRequest("time.format pattern must be a string".into()))?;
        let dt = DateTime::from_timestamp_millis(millis).ok_or_else(|| WovError::InvalidRequest("millis out of range".into()))?;
        Ok(Value::str(dt.format(pattern).to_string()))
    }
}
