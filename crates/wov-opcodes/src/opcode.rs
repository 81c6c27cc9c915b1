//! The `Opcode` trait: every opcode's entry point into the interpreter.
//!
//! A name/description/execute shape, with one addition a plain tool
//! interface has no analog for: an opcode receives
//! its argument nodes *unevaluated* (`&[Ast]`) along with an [`Evaluator`]
//! callback into the interpreter's own node-evaluation loop, rather than a
//! single pre-evaluated argument bag. Eager opcodes (`+`, `list.push`, ...)
//! evaluate every argument up front via [`eval_all`] and proceed exactly as
//! a `BuiltinTool` would; lazy opcodes (`if`, `and`, `while`, ...) decide
//! for themselves which children to evaluate, and how many times — which a
//! single pre-evaluated `Value` argument list cannot express.

use std::collections::HashMap;

use async_trait::async_trait;
use wov_core::ast::Ast;
use wov_core::context::Context;
use wov_core::error::{Result, WovError};
use wov_core::lambda::Lambda;
use wov_core::value::Value;

use crate::meta::OpcodeMeta;

/// Callback into the interpreter's own recursive node evaluator, passed to
/// every opcode so lazy opcodes can evaluate their own children on their
/// own schedule.
#[async_trait]
pub trait Evaluator: Send + Sync {
    async fn eval(&self, ctx: &mut Context, node: &Ast) -> Result<Value>;
}

/// Evaluate every argument left-to-right, in order. The helper eager
/// opcodes call; lazy opcodes must not use it for arguments they intend to
/// skip or repeat.
pub async fn eval_all(ctx: &mut Context, args: &[Ast], eval: &dyn Evaluator) -> Result<Vec<Value>> {
    let mut out = Vec::with_capacity(args.len());
    for node in args {
        out.push(eval.eval(ctx, node).await?);
    }
    Ok(out)
}

/// Invoke a closure value with `args` bound positionally to its declared
/// parameters, running in a scope seeded with its captured variables. An
/// explicit `return` inside the body resolves to that value rather than
/// propagating as an error, matching a normal call boundary.
pub async fn call_lambda(ctx: &mut Context, lambda: &Lambda, args: Vec<Value>, eval: &dyn Evaluator) -> Result<Value> {
    let mut vars: HashMap<String, Value> = lambda.captured.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
    for (name, value) in lambda.params.iter().zip(args.into_iter().chain(std::iter::repeat(Value::Null))) {
        vars.insert(name.clone(), value);
    }
    let mut lambda_ctx = ctx.for_lambda(vars);
    match eval.eval(&mut lambda_ctx, &lambda.body).await {
        Ok(v) => Ok(v),
        Err(WovError::Return(v)) => Ok(v),
        Err(err) => Err(err),
    }
}

#[async_trait]
pub trait Opcode: Send + Sync {
    fn name(&self) -> &'static str;
    fn metadata(&self) -> OpcodeMeta;
    async fn execute(&self, ctx: &mut Context, args: &[Ast], eval: &dyn Evaluator) -> Result<Value>;
}
