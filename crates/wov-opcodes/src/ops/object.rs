//! `obj.new`, `obj.get`, `obj.set`, `obj.has`, `obj.del`, `obj.keys`.

use async_trait::async_trait;
use wov_core::ast::Ast;
use wov_core::context::Context;
use wov_core::error::{Result, WovError};
use wov_core::value::Value;

use crate::meta::{Category, Evaluation, OpcodeMeta};
use crate::opcode::{eval_all, Evaluator, Opcode};

fn meta(name: &'static str, description: &'static str) -> OpcodeMeta {
    OpcodeMeta { name, category: Category::Object, evaluation: Evaluation::Eager, description }
}

fn as_object(v: &Value, op: &'static str) -> Result<std::collections::BTreeMap<String, Value>> {
    match v {
        Value::Object(m) => Ok(m.clone()),
        _ => Err(WovError::InvalidRequest(format!("{op} requires an object argument"))),
    }
}

fn as_key(v: &Value, op: &'static str) -> Result<String> {
    v.as_str().map(str::to_string).ok_or_else(|| WovError::InvalidRequest(format!("{op} requires a string key")))
}

/// `obj.new(key1, value1, key2, value2, ...)`.
pub struct ObjNew;

#[async_trait]
impl Opcode for ObjNew {
    fn name(&self) -> &'static str {
        "obj.new"
    }

    fn metadata(&self) -> OpcodeMeta {
        meta("obj.new", "Construct an object from alternating key/value arguments.")
    }

    async fn execute(&self, ctx: &mut Context, args: &[Ast], eval: &dyn Evaluator) -> Result<Value> {
        let values = eval_all(ctx, args, eval).await?;
        if values.len() % 2 != 0 {
            return Err(WovError::InvalidRequest("obj.new requires an even number of key/value arguments".into()));
        }
        let mut map = std::collections::BTreeMap::new();
        for pair in values.chunks(2) {
            map.insert(as_key(&pair[0], "obj.new")?, pair[1].clone());
        }
        Ok(Value::Object(map))
    }
}

/// `obj.get(object, key)` — `null` if absent.
pub struct ObjGet;

#[async_trait]
impl Opcode for ObjGet {
    fn name(&self) -> &'static str {
        "obj.get"
    }

    fn metadata(&self) -> OpcodeMeta {
        meta("obj.get", "Value at key, or null if absent.")
    }

    async fn execute(&self, ctx: &mut Context, args: &[Ast], eval: &dyn Evaluator) -> Result<Value> {
        let values = eval_all(ctx, args, eval).await?;
        let [object, key] = values.as_slice() else {
            return Err(WovError::InvalidRequest("obj.get requires (object, key)".into()));
        };
        let map = as_object(object, "obj.get")?;
        Ok(map.get(&as_key(key, "obj.get")?).cloned().unwrap_or(Value::Null))
    }
}

/// `obj.set(object, key, value)` — returns a new object.
pub struct ObjSet;

#[async_trait]
impl Opcode for ObjSet {
    fn name(&self) -> &'static str {
        "obj.set"
    }

    fn metadata(&self) -> OpcodeMeta {
        meta("obj.set", "Set key to value, returning the new object.")
    }

    async fn execute(&self, ctx: &mut Context, args: &[Ast], eval: &dyn Evaluator) -> Result<Value> {
        let values = eval_all(ctx, args, eval).await?;
        let [object, key, value] = values.as_slice() else {
            return Err(WovError::InvalidRequest("obj.set requires (object, key, value)".into()));
        };
        let mut map = as_object(object, "obj.set")?;
        map.insert(as_key(key, "obj.set")?, value.clone());
        Ok(Value::Object(map))
    }
}

/// `obj.has(object, key)`.
pub struct ObjHas;

#[async_trait]
impl Opcode for ObjHas {
    fn name(&self) -> &'static str {
        "obj.has"
    }

    fn metadata(&self) -> OpcodeMeta {
        meta("obj.has", "Whether key is present.")
    }

    async fn execute(&self, ctx: &mut Context, args: &[Ast], eval: &dyn Evaluator) -> Result<Value> {
        let values = eval_all(ctx, args, eval).await?;
        let [object, key] = values.as_slice() else {
            return Err(WovError::InvalidRequest("obj.has requires (object, key)".into()));
        };
        let map = as_object(object, "obj.has")?;
        Ok(Value::Bool(map.contains_key(&as_key(key, "obj.has")?)))
    }
}

/// `obj.del(object, key)` — returns a new object with `key` removed.
pub struct ObjDel;

#[async_trait]
impl Opcode for ObjDel {
    fn name(&self) -> &'static str {
        "obj.del"
    }

    fn metadata(&self) -> OpcodeMeta {
        meta("obj.del", "Remove key, returning the new object.")
    }

    async fn execute(&self, ctx: &mut Context, args: &[Ast], eval: &dyn Evaluator) -> Result<Value> {
        let values = eval_all(ctx, args, eval).await?;
        let [object, key] = values.as_slice() else {
            return Err(WovError::InvalidRequest("obj.del requires (object, key)".into()));
        };
        let mut map = as_object(object, "obj.del")?;
        map.remove(&as_key(key, "obj.del")?);
        Ok(Value::Object(map))
    }
}

/// `obj.keys(object)`.
pub struct ObjKeys;

#[async_trait]
impl Opcode for ObjKeys {
    fn name(&self) -> &'static str {
        "obj.keys"
    }

    fn metadata(&self) -> OpcodeMeta {
        meta("obj.keys", "The object's keys, in sorted order.")
    }

    async fn execute(&self, ctx: &mut Context, args: &[Ast], eval: &dyn Evaluator) -> Result<Value> {
        let values = eval_all(ctx, args, eval).await?;
        let object = values.first().ok_or_else(|| WovError::InvalidRequest("obj.keys requires one argument".into()))?;
        let map = as_object(object, "obj.keys")?;
        Ok(Value::List(map.into_keys().map(Value::String).collect()))
    }
}
