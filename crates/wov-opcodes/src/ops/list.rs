//! `list.new`, `list.push`, `list.map`, `list.filter`, `list.find`,
//! `list.len`, `list.empty`, `list.get`, `list.slice`, `list.concat`.

use async_trait::async_trait;
use wov_core::ast::Ast;
use wov_core::context::Context;
use wov_core::error::{Result, WovError};
use wov_core::lambda::Lambda;
use wov_core::value::Value;

use crate::meta::{Category, Evaluation, OpcodeMeta};
use crate::opcode::{call_lambda, eval_all, Evaluator, Opcode};

fn meta(name: &'static str, description: &'static str) -> OpcodeMeta {
    OpcodeMeta { name, category: Category::List, evaluation: Evaluation::Eager, description }
}

fn as_list(v: &Value, op: &'static str) -> Result<Vec<Value>> {
    v.as_list().map(<[Value]>::to_vec).ok_or_else(|| WovError::InvalidRequest(format!("{op} requires a list argument")))
}

fn as_lambda(v: &Value, op: &'static str) -> Result<Lambda> {
    Lambda::from_value(v).ok_or_else(|| WovError::InvalidRequest(format!("{op} requires a lambda argument")))
}

/// `list.new(a, b, ...)`.
pub struct ListNew;

#[async_trait]
impl Opcode for ListNew {
    fn name(&self) -> &'static str {
        "list.new"
    }

    fn metadata(&self) -> OpcodeMeta {
        meta("list.new", "Construct a list from its arguments.")
    }

    async fn execute(&self, ctx: &mut Context, args: &[Ast], eval: &dyn Evaluator) -> Result<Value> {
        Ok(Value::List(eval_all(ctx, args, eval).await?))
    }
}

/// `list.push(list, value)` — returns a new list with `value` appended.
pub struct ListPush;

#[async_trait]
impl Opcode for ListPush {
    fn name(&self) -> &'static str {
        "list.push"
    }

    fn metadata(&self) -> OpcodeMeta {
        meta("list.push", "Append a value, returning the new list.")
    }

    async fn execute(&self, ctx: &mut Context, args: &[Ast], eval: &dyn Evaluator) -> Result<Value> {
        let values = eval_all(ctx, args, eval).await?;
        let [list, value] = values.as_slice() else {
            return Err(WovError::InvalidRequest("list.push requires (list, value)".into()));
        };
        let mut items = as_list(list, "list.push")?;
        items.push(value.clone());
        Ok(Value::List(items))
    }
}

/// `list.map(list, lambda)`.
pub struct ListMap;

#[async_trait]
impl Opcode for ListMap {
    fn name(&self) -> &'static str {
        "list.map"
    }

    fn metadata(&self) -> OpcodeMeta {
        meta("list.map", "Apply lambda(item) to every element.")
    }

    async fn execute(&self, ctx: &mut Context, args: &[Ast], eval: &dyn Evaluator) -> Result<Value> {
        let values = eval_all(ctx, args, eval).await?;
        let [list, lambda_value] = values.as_slice() else {
            return Err(WovError::InvalidRequest("list.map requires (list, lambda)".into()));
        };
        let items = as_list(list, "list.map")?;
        let lambda = as_lambda(lambda_value, "list.map")?;
        let mut out = Vec::with_capacity(items.len());
        for item in items {
            out.push(call_lambda(ctx, &lambda, vec![item], eval).await?);
        }
        Ok(Value::List(out))
    }
}

/// `list.filter(list, lambda)`.
pub struct ListFilter;

#[async_trait]
impl Opcode for ListFilter {
    fn name(&self) -> &'static str {
        "list.filter"
    }

    fn metadata(&self) -> OpcodeMeta {
        meta("list.filter", "Keep elements for which lambda(item) is truthy.")
    }

    async fn execute(&self, ctx: &mut Context, args: &[Ast], eval: &dyn Evaluator) -> Result<Value> {
        let values = eval_all(ctx, args, eval).await?;
        let [list, lambda_value] = values.as_slice() else {
            return Err(WovError::InvalidRequest("list.filter requires (list, lambda)".into()));
        };
        let items = as_list(list, "list.filter")?;
        let lambda = as_lambda(lambda_value, "list.filter")?;
        let mut out = Vec::new();
        for item in items {
            if call_lambda(ctx, &lambda, vec![item.clone()], eval).await?.is_truthy() {
                out.push(item);
            }
        }
        Ok(Value::List(out))
    }
}

/// `list.find(list, lambda)` — first element for which `lambda(item)` is
/// truthy, or `null`.
pub struct ListFind;

#[async_trait]
impl Opcode for ListFind {
    fn name(&self) -> &'static str {
        "list.find"
    }

    fn metadata(&self) -> OpcodeMeta {
        meta("list.find", "First element for which lambda(item) is truthy, or null.")
    }

    async fn execute(&self, ctx: &mut Context, args: &[Ast], eval: &dyn Evaluator) -> Result<Value> {
        let values = eval_all(ctx, args, eval).await?;
        let [list, lambda_value] = values.as_slice() else {
            return Err(WovError::InvalidRequest("list.find requires (list, lambda)".into()));
        };
        let items = as_list(list, "list.find")?;
        let lambda = as_lambda(lambda_value, "list.find")?;
        for item in items {
            if call_lambda(ctx, &lambda, vec![item.clone()], eval).await?.is_truthy() {
                return Ok(item);
            }
        }
        Ok(Value::Null)
    }
}

/// `list.len(list)`.
pub struct ListLen;

#[async_trait]
impl Opcode for ListLen {
    fn name(&self) -> &'static str {
        "list.len"
    }

    fn metadata(&self) -> OpcodeMeta {
        meta("list.len", "Number of elements.")
    }

    async fn execute(&self, ctx: &mut Context, args: &[Ast], eval: &dyn Evaluator) -> Result<Value> {
        let values = eval_all(ctx, args, eval).await?;
        let list = values.first().ok_or_else(|| WovError::InvalidRequest("list.len requires one argument".into()))?;
        Ok(Value::int(as_list(list, "list.len")?.len() as i64))
    }
}

/// `list.empty(list)`.
pub struct ListEmpty;

#[async_trait]
impl Opcode for ListEmpty {
    fn name(&self) -> &'static str {
        "list.empty"
    }

    fn metadata(&self) -> OpcodeMeta {
        meta("list.empty", "Whether the list has no elements.")
    }

    async fn execute(&self, ctx: &mut Context, args: &[Ast], eval: &dyn Evaluator) -> Result<Value> {
        let values = eval_all(ctx, args, eval).await?;
        let list = values.first().ok_or_else(|| WovError::InvalidRequest("list.empty requires one argument".into()))?;
        Ok(Value::Bool(as_list(list, "list.empty")?.is_empty()))
    }
}

/// `list.get(list, index)` — `null` if out of bounds.
pub struct ListGet;

#[async_trait]
impl Opcode for ListGet {
    fn name(&self) -> &'static str {
        "list.get"
    }

    fn metadata(&self) -> OpcodeMeta {
        meta("list.get", "Element at index, or null if out of bounds.")
    }

    async fn execute(&self, ctx: &mut Context, args: &[Ast], eval: &dyn Evaluator) -> Result<Value> {
        let values = eval_all(ctx, args, eval).await?;
        let [list, index] = values.as_slice() else {
            return Err(WovError::InvalidRequest("list.get requires (list, index)".into()));
        };
        let items = as_list(list, "list.get")?;
        let index = index.as_i64().ok_or_else(|| WovError::InvalidRequest("list.get index must be a number".into()))?;
        Ok(usize::try_from(index).ok().and_then(|i| items.get(i).cloned()).unwrap_or(Value::Null))
    }
}

/// `list.slice(list, start, end)`. Indices are clamped into range.
pub struct ListSlice;

#[async_trait]
impl Opcode for ListSlice {
    fn name(&self) -> &'static str {
        "list.slice"
    }

    fn metadata(&self) -> OpcodeMeta {
        meta("list.slice", "Sub-list from start (inclusive) to end (exclusive), clamped to range.")
    }

    async fn execute(&self, ctx: &mut Context, args: &[Ast], eval: &dyn Evaluator) -> Result<Value> {
        let values = eval_all(ctx, args, eval).await?;
        let [list, start, end] = values.as_slice() else {
            return Err(WovError::InvalidRequest("list.slice requires (list, start, end)".into()));
        };
        let items = as_list(list, "list.slice")?;
        let len = items.len() as i64;
        let clamp = |v: &Value| -> i64 { v.as_i64().unwrap_or(0).clamp(0, len) };
        let (start, end) = (clamp(start), clamp(end));
        if start >= end {
            return Ok(Value::List(Vec::new()));
        }
        Ok(Value::List(items[start as usize..end as usize].to_vec()))
    }
}

/// `list.concat(a, b, ...)`.
pub struct ListConcat;

#[async_trait]
impl Opcode for ListConcat {
    fn name(&self) -> &'static str {
        "list.concat"
    }

    fn metadata(&self) -> OpcodeMeta {
        meta("list.concat", "Concatenate all list arguments, in order.")
    }

    async fn execute(&self, ctx: &mut Context, args: &[Ast], eval: &dyn Evaluator) -> Result<Value> {
        let values = eval_all(ctx, args, eval).await?;
        let mut out = Vec::new();
        for v in &values {
            out.extend(as_list(v, "list.concat")?);
        }
        Ok(Value::List(out))
    }
}
