//! `seq`, `if`, `while`, `for`, `try`, `throw`, `return`, `lambda` — the
//! only opcodes that may not evaluate every argument exactly once, so each
//! is hand-written rather than built on [`eval_all`].

use async_trait::async_trait;
use wov_core::ast::Ast;
use wov_core::context::Context;
use wov_core::error::{Result, WovError};
use wov_core::lambda::Lambda;
use wov_core::value::Value;

use crate::meta::{Category, Evaluation, OpcodeMeta};
use crate::opcode::{Evaluator, Opcode};

fn meta(name: &'static str, description: &'static str) -> OpcodeMeta {
    OpcodeMeta { name, category: Category::Control, evaluation: Evaluation::Lazy, description }
}

/// `seq(a, b, c, ...)` — evaluate every argument in order, return the last.
/// Also the implicit wrapper a verb's body is stored under.
pub struct Seq;

#[async_trait]
impl Opcode for Seq {
    fn name(&self) -> &'static str {
        "seq"
    }

    fn metadata(&self) -> OpcodeMeta {
        meta("seq", "Evaluate each argument in order, returning the last.")
    }

    async fn execute(&self, ctx: &mut Context, args: &[Ast], eval: &dyn Evaluator) -> Result<Value> {
        let mut last = Value::Null;
        for node in args {
            last = eval.eval(ctx, node).await?;
        }
        Ok(last)
    }
}

/// `if(cond, then, else?)`.
pub struct If;

#[async_trait]
impl Opcode for If {
    fn name(&self) -> &'static str {
        "if"
    }

    fn metadata(&self) -> OpcodeMeta {
        meta("if", "Evaluate `then` if `cond` is truthy, else `else` (or null if omitted).")
    }

    async fn execute(&self, ctx: &mut Context, args: &[Ast], eval: &dyn Evaluator) -> Result<Value> {
        let [cond, then, rest @ ..] = args else {
            return Err(WovError::InvalidRequest("if requires at least (cond, then)".into()));
        };
        if eval.eval(ctx, cond).await?.is_truthy() {
            eval.eval(ctx, then).await
        } else if let Some(else_branch) = rest.first() {
            eval.eval(ctx, else_branch).await
        } else {
            Ok(Value::Null)
        }
    }
}

/// `while(cond, body)` — repeat `body` while `cond` is truthy. Returns the
/// body's last value, or `null` if the loop never ran.
pub struct While;

#[async_trait]
impl Opcode for While {
    fn name(&self) -> &'static str {
        "while"
    }

    fn metadata(&self) -> OpcodeMeta {
        meta("while", "Repeat `body` while `cond` is truthy.")
    }

    async fn execute(&self, ctx: &mut Context, args: &[Ast], eval: &dyn Evaluator) -> Result<Value> {
        let [cond, body] = args else {
            return Err(WovError::InvalidRequest("while requires (cond, body)".into()));
        };
        let mut last = Value::Null;
        while eval.eval(ctx, cond).await?.is_truthy() {
            last = eval.eval(ctx, body).await?;
        }
        Ok(last)
    }
}

/// `for(varName, iterable, body)` — bind `varName` to each element of
/// `iterable` in turn and evaluate `body`. Returns the body's last value.
pub struct For;

#[async_trait]
impl Opcode for For {
    fn name(&self) -> &'static str {
        "for"
    }

    fn metadata(&self) -> OpcodeMeta {
        meta("for", "Bind varName to each element of iterable and evaluate body.")
    }

    async fn execute(&self, ctx: &mut Context, args: &[Ast], eval: &dyn Evaluator) -> Result<Value> {
        let [var_name_node, iterable, body] = args else {
            return Err(WovError::InvalidRequest("for requires (varName, iterable, body)".into()));
        };
        let var_name = eval.eval(ctx, var_name_node).await?;
        let var_name = var_name.as_str().ok_or_else(|| WovError::InvalidRequest("for varName must be a string".into()))?.to_string();
        let list = eval.eval(ctx, iterable).await?;
        let items = list.as_list().ok_or_else(|| WovError::InvalidRequest("for iterable must be a list".into()))?.to_vec();

        let mut last = Value::Null;
        for item in items {
            ctx.set_var(var_name.clone(), item);
            last = eval.eval(ctx, body).await?;
        }
        Ok(last)
    }
}

/// `try(body, catchVarName, catchBody)` — evaluate `body`; on any error
/// except an in-flight `return`, bind `catchVarName` to the error and
/// evaluate `catchBody` instead.
pub struct Try;

#[async_trait]
impl Opcode for Try {
    fn name(&self) -> &'static str {
        "try"
    }

    fn metadata(&self) -> OpcodeMeta {
        meta("try", "Evaluate body; on error, bind catchVarName and evaluate catchBody.")
    }

    async fn execute(&self, ctx: &mut Context, args: &[Ast], eval: &dyn Evaluator) -> Result<Value> {
        let [body, catch_var_node, catch_body] = args else {
            return Err(WovError::InvalidRequest("try requires (body, catchVarName, catchBody)".into()));
        };
        match eval.eval(ctx, body).await {
            Ok(v) => Ok(v),
            Err(WovError::Return(v)) => Err(WovError::Return(v)),
            Err(err) => {
                let caught = match err {
                    WovError::Thrown(v) => v,
                    other => Value::str(other.to_string()),
                };
                let catch_var = eval.eval(ctx, catch_var_node).await?;
                let catch_var = catch_var.as_str().unwrap_or("error").to_string();
                ctx.set_var(catch_var, caught);
                eval.eval(ctx, catch_body).await
            },
        }
    }
}

/// `throw(value)` — raise `value` as a catchable exception.
pub struct Throw;

#[async_trait]
impl Opcode for Throw {
    fn name(&self) -> &'static str {
        "throw"
    }

    fn metadata(&self) -> OpcodeMeta {
        meta("throw", "Raise value as a catchable exception.")
    }

    async fn execute(&self, ctx: &mut Context, args: &[Ast], eval: &dyn Evaluator) -> Result<Value> {
        let value = match args.first() {
            Some(node) => eval.eval(ctx, node).await?,
            None => Value::Null,
        };
        Err(WovError::Thrown(value))
    }
}

/// `return(value?)` — unwind to the nearest enclosing verb call boundary.
pub struct Return;

#[async_trait]
impl Opcode for Return {
    fn name(&self) -> &'static str {
        "return"
    }

    fn metadata(&self) -> OpcodeMeta {
        meta("return", "Unwind to the nearest enclosing verb call boundary with value.")
    }

    async fn execute(&self, ctx: &mut Context, args: &[Ast], eval: &dyn Evaluator) -> Result<Value> {
        let value = match args.first() {
            Some(node) => eval.eval(ctx, node).await?,
            None => Value::Null,
        };
        Err(WovError::Return(value))
    }
}

/// `lambda(paramNames, body)` — `paramNames` is evaluated eagerly (it's
/// just a list of strings); `body` is captured unevaluated, along with a
/// snapshot of the enclosing scope.
pub struct MakeLambda;

#[async_trait]
impl Opcode for MakeLambda {
    fn name(&self) -> &'static str {
        "lambda"
    }

    fn metadata(&self) -> OpcodeMeta {
        meta("lambda", "Create a closure over paramNames and body, capturing the enclosing scope.")
    }

    async fn execute(&self, ctx: &mut Context, args: &[Ast], eval: &dyn Evaluator) -> Result<Value> {
        let [param_names_node, body] = args else {
            return Err(WovError::InvalidRequest("lambda requires (paramNames, body)".into()));
        };
        let param_names = eval.eval(ctx, param_names_node).await?;
        let params = param_names
            .as_list()
            .ok_or_else(|| WovError::InvalidRequest("lambda paramNames must be a list of strings".into()))?
            .iter()
            .map(|v| v.as_str().unwrap_or_default().to_string())
            .collect();
        let lambda = Lambda { params, body: body.clone(), captured: ctx.vars.clone().into_iter().collect() };
        Ok(lambda.into_value())
    }
}
