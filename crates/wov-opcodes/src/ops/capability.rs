//! `get_capability`, `mint`, `delegate`, `give_capability`, `has_capability`.

use async_trait::async_trait;
use wov_core::ast::Ast;
use wov_core::context::Context;
use wov_core::error::{Result, WovError};
use wov_core::ids::{CapabilityId, EntityId};
use wov_core::model::Capability;
use wov_core::value::Value;

use crate::meta::{Category, Evaluation, OpcodeMeta};
use crate::opcode::{eval_all, Evaluator, Opcode};

fn meta(name: &'static str, description: &'static str) -> OpcodeMeta {
    OpcodeMeta { name, category: Category::Capability, evaluation: Evaluation::Eager, description }
}

fn cap_id_of(v: &Value, op: &'static str) -> Result<CapabilityId> {
    v.as_str().and_then(|s| s.parse().ok()).map(CapabilityId).ok_or_else(|| WovError::InvalidRequest(format!("{op} requires a capability id")))
}

fn cap_type_of(v: &Value, op: &'static str) -> Result<String> {
    v.as_str().map(str::to_string).ok_or_else(|| WovError::InvalidRequest(format!("{op} requires a capability type string")))
}

fn params_of(v: &Value) -> std::collections::BTreeMap<String, Value> {
    match v {
        Value::Object(m) => m.clone(),
        _ => std::collections::BTreeMap::new(),
    }
}

fn capability_to_value(c: &Capability) -> Value {
    Value::Object(std::collections::BTreeMap::from([
        ("id".to_string(), Value::str(c.id.to_string())),
        ("owner_id".to_string(), Value::int(c.owner_id.0)),
        ("type".to_string(), Value::str(c.cap_type.clone())),
        ("params".to_string(), Value::Object(c.params.clone())),
    ]))
}

/// `get_capability(type, filter?)` — the caller's first matching
/// capability, or `null`.
pub struct GetCapability;

#[async_trait]
impl Opcode for GetCapability {
    fn name(&self) -> &'static str {
        "get_capability"
    }

    fn metadata(&self) -> OpcodeMeta {
        meta("get_capability", "The caller's first capability of type matching filter, or null.")
    }

    async fn execute(&self, ctx: &mut Context, args: &[Ast], eval: &dyn Evaluator) -> Result<Value> {
        let values = eval_all(ctx, args, eval).await?;
        let cap_type = values.first().ok_or_else(|| WovError::InvalidRequest("get_capability requires a type".into()))?;
        let cap_type = cap_type_of(cap_type, "get_capability")?;
        let filter = values.get(1).map(params_of);
        let found = ctx.world.find_capability(ctx.caller, &cap_type, filter.as_ref()).await?;
        Ok(found.as_ref().map(capability_to_value).unwrap_or(Value::Null))
    }
}

/// `mint(authorityCapId, type, params)`.
pub struct Mint;

#[async_trait]
impl Opcode for Mint {
    fn name(&self) -> &'static str {
        "mint"
    }

    fn metadata(&self) -> OpcodeMeta {
        meta("mint", "Mint a new capability within the authority's namespace.")
    }

    async fn execute(&self, ctx: &mut Context, args: &[Ast], eval: &dyn Evaluator) -> Result<Value> {
        let values = eval_all(ctx, args, eval).await?;
        let [authority, cap_type, params] = values.as_slice() else {
            return Err(WovError::InvalidRequest("mint requires (authorityCapId, type, params)".into()));
        };
        let authority = cap_id_of(authority, "mint")?;
        let cap_type = cap_type_of(cap_type, "mint")?;
        let minted = ctx.world.mint_capability(authority, ctx.caller, &cap_type, params_of(params)).await?;
        Ok(capability_to_value(&minted))
    }
}

/// `delegate(parentCapId, restrictions)`.
pub struct Delegate;

#[async_trait]
impl Opcode for Delegate {
    fn name(&self) -> &'static str {
        "delegate"
    }

    fn metadata(&self) -> OpcodeMeta {
        meta("delegate", "Derive a narrower capability from one already held.")
    }

    async fn execute(&self, ctx: &mut Context, args: &[Ast], eval: &dyn Evaluator) -> Result<Value> {
        let values = eval_all(ctx, args, eval).await?;
        let [parent, restrictions] = values.as_slice() else {
            return Err(WovError::InvalidRequest("delegate requires (parentCapId, restrictions)".into()));
        };
        let parent = cap_id_of(parent, "delegate")?;
        let delegated = ctx.world.delegate_capability(parent, ctx.caller, params_of(restrictions)).await?;
        Ok(capability_to_value(&delegated))
    }
}

/// `give_capability(capId, targetEntity)`.
pub struct GiveCapability;

#[async_trait]
impl Opcode for GiveCapability {
    fn name(&self) -> &'static str {
        "give_capability"
    }

    fn metadata(&self) -> OpcodeMeta {
        meta("give_capability", "Transfer ownership of a held capability to another entity.")
    }

    async fn execute(&self, ctx: &mut Context, args: &[Ast], eval: &dyn Evaluator) -> Result<Value> {
        let values = eval_all(ctx, args, eval).await?;
        let [cap, target] = values.as_slice() else {
            return Err(WovError::InvalidRequest("give_capability requires (capId, targetEntity)".into()));
        };
        let cap = cap_id_of(cap, "give_capability")?;
        let target = target.as_i64().map(EntityId).ok_or_else(|| WovError::InvalidRequest("give_capability requires an entity id".into()))?;
        ctx.world.give_capability(cap, ctx.caller, target).await?;
        Ok(Value::Null)
    }
}

/// `has_capability(type, filter?)`.
pub struct HasCapability;

#[async_trait]
impl Opcode for HasCapability {
    fn name(&self) -> &'static str {
        "has_capability"
    }

    fn metadata(&self) -> OpcodeMeta {
        meta("has_capability", "Whether the caller holds a matching capability.")
    }

    async fn execute(&self, ctx: &mut Context, args: &[Ast], eval: &dyn Evaluator) -> Result<Value> {
        let values = eval_all(ctx, args, eval).await?;
        let cap_type = values.first().ok_or_else(|| WovError::InvalidRequest("has_capability requires a type".into()))?;
        let cap_type = cap_type_of(cap_type, "has_capability")?;
        let filter = values.get(1).map(params_of);
        let found = ctx.world.find_capability(ctx.caller, &cap_type, filter.as_ref()).await?;
        Ok(Value::Bool(found.is_some()))
    }
}
