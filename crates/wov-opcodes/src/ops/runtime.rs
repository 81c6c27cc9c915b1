//! `caller`, `this`, `arg`, `args`, `warn`, `log` — introspection of the
//! running [`Context`] and diagnostics.

use async_trait::async_trait;
use tracing::info;
use wov_core::ast::Ast;
use wov_core::context::Context;
use wov_core::error::Result;
use wov_core::value::Value;

use crate::meta::{Category, Evaluation, OpcodeMeta};
use crate::opcode::{eval_all, Evaluator, Opcode};

fn meta(name: &'static str, description: &'static str) -> OpcodeMeta {
    OpcodeMeta { name, category: Category::Runtime, evaluation: Evaluation::Eager, description }
}

/// `caller()` — the entity that initiated the outermost call in this chain.
pub struct Caller;

#[async_trait]
impl Opcode for Caller {
    fn name(&self) -> &'static str {
        "caller"
    }

    fn metadata(&self) -> OpcodeMeta {
        meta("caller", "The entity that initiated the outermost call.")
    }

    async fn execute(&self, ctx: &mut Context, args: &[Ast], eval: &dyn Evaluator) -> Result<Value> {
        eval_all(ctx, args, eval).await?;
        Ok(Value::int(ctx.caller.0))
    }
}

/// `this()` — the entity the running verb is attached to.
pub struct This;

#[async_trait]
impl Opcode for This {
    fn name(&self) -> &'static str {
        "this"
    }

    fn metadata(&self) -> OpcodeMeta {
        meta("this", "The entity the running verb is attached to.")
    }

    async fn execute(&self, ctx: &mut Context, args: &[Ast], eval: &dyn Evaluator) -> Result<Value> {
        eval_all(ctx, args, eval).await?;
        Ok(Value::int(ctx.this.0))
    }
}

/// `arg(index)` — `null` if out of bounds.
pub struct Arg;

#[async_trait]
impl Opcode for Arg {
    fn name(&self) -> &'static str {
        "arg"
    }

    fn metadata(&self) -> OpcodeMeta {
        meta("arg", "The nth call argument, null if out of bounds.")
    }

    async fn execute(&self, ctx: &mut Context, args: &[Ast], eval: &dyn Evaluator) -> Result<Value> {
        let values = eval_all(ctx, args, eval).await?;
        let index = values.first().and_then(Value::as_i64).unwrap_or(-1);
        Ok(usize::try_from(index).ok().and_then(|i| ctx.args.get(i).cloned()).unwrap_or(Value::Null))
    }
}

/// `args()` — the full argument list.
pub struct Args;

#[async_trait]
impl Opcode for Args {
    fn name(&self) -> &'static str {
        "args"
    }

    fn metadata(&self) -> OpcodeMeta {
        meta("args", "The full call argument list.")
    }

    async fn execute(&self, ctx: &mut Context, args: &[Ast], eval: &dyn Evaluator) -> Result<Value> {
        eval_all(ctx, args, eval).await?;
        Ok(Value::List(ctx.args.clone()))
    }
}

/// `warn(message)` — append a non-fatal diagnostic, surfaced to the caller
/// alongside the return value.
pub struct Warn;

#[async_trait]
impl Opcode for Warn {
    fn name(&self) -> &'static str {
        "warn"
    }

    fn metadata(&self) -> OpcodeMeta {
        meta("warn", "Append a non-fatal diagnostic surfaced with the result.")
    }

    async fn execute(&self, ctx: &mut Context, args: &[Ast], eval: &dyn Evaluator) -> Result<Value> {
        let values = eval_all(ctx, args, eval).await?;
        let message = values.first().map(ToString::to_string).unwrap_or_default();
        ctx.warnings.push(message);
        Ok(Value::Null)
    }
}

/// `log(message)` — structured server-side log line, not surfaced to the
/// caller.
pub struct Log;

#[async_trait]
impl Opcode for Log {
    fn name(&self) -> &'static str {
        "log"
    }

    fn metadata(&self) -> OpcodeMeta {
        meta("log", "Structured server-side log line.")
    }

    async fn execute(&self, ctx: &mut Context, args: &[Ast], eval: &dyn Evaluator) -> Result<Value> {
        let values = eval_all(ctx, args, eval).await?;
        let message = values.first().map(ToString::to_string).unwrap_or_default();
        info!(entity = ctx.this.0, %message, "verb log");
        Ok(Value::Null)
    }
}
