//! `let`, `var`, `set` — local variable declaration, read, and assignment.

use async_trait::async_trait;
use wov_core::ast::Ast;
use wov_core::context::Context;
use wov_core::error::{Result, WovError};
use wov_core::value::Value;

use crate::meta::{Category, Evaluation, OpcodeMeta};
use crate::opcode::{eval_all, Evaluator, Opcode};

fn name_of(args: &[Value], op: &'static str) -> Result<String> {
    args.first()
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| WovError::InvalidRequest(format!("{op} requires a string variable name")))
}

/// `let(name, value)` — declare (or overwrite) a local variable.
pub struct Let;

#[async_trait]
impl Opcode for Let {
    fn name(&self) -> &'static str {
        "let"
    }

    fn metadata(&self) -> OpcodeMeta {
        OpcodeMeta { name: "let", category: Category::Vars, evaluation: Evaluation::Eager, description: "Declare a local variable." }
    }

    async fn execute(&self, ctx: &mut Context, args: &[Ast], eval: &dyn Evaluator) -> Result<Value> {
        let values = eval_all(ctx, args, eval).await?;
        let name = name_of(&values, "let")?;
        let value = values.into_iter().nth(1).unwrap_or(Value::Null);
        ctx.set_var(name, value.clone());
        Ok(value)
    }
}

/// `var(name)` — read a local variable, `null` if unset.
pub struct Var;

#[async_trait]
impl Opcode for Var {
    fn name(&self) -> &'static str {
        "var"
    }

    fn metadata(&self) -> OpcodeMeta {
        OpcodeMeta { name: "var", category: Category::Vars, evaluation: Evaluation::Eager, description: "Read a local variable, null if unset." }
    }

    async fn execute(&self, ctx: &mut Context, args: &[Ast], eval: &dyn Evaluator) -> Result<Value> {
        let values = eval_all(ctx, args, eval).await?;
        let name = name_of(&values, "var")?;
        Ok(ctx.get_var(&name).cloned().unwrap_or(Value::Null))
    }
}

/// `set(name, value)` — assign to an already-declared local variable.
pub struct Set;

#[async_trait]
impl Opcode for Set {
    fn name(&self) -> &'static str {
        "set"
    }

    fn metadata(&self) -> OpcodeMeta {
        OpcodeMeta { name: "set", category: Category::Vars, evaluation: Evaluation::Eager, description: "Assign to an existing local variable." }
    }

    async fn execute(&self, ctx: &mut Context, args: &[Ast], eval: &dyn Evaluator) -> Result<Value> {
        let values = eval_all(ctx, args, eval).await?;
        let name = name_of(&values, "set")?;
        let value = values.into_iter().nth(1).unwrap_or(Value::Null);
        ctx.set_var(name, value.clone());
        Ok(value)
    }
}
