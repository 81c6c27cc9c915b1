//! `create`, `destroy`, `entity`, `set_entity`, `get_prototype`,
//! `set_prototype`, `verbs`, `get_verb`, `resolve_props`.
//!
//! Mutating opcodes take a capability id argument and check it before
//! touching the world.

use std::collections::BTreeMap;

use async_trait::async_trait;
use wov_core::ast::Ast;
use wov_core::context::Context;
use wov_core::error::{Result, WovError};
use wov_core::ids::{CapabilityId, EntityId};
use wov_core::model::Entity;
use wov_core::value::Value;
use wov_core::world::CapabilityMatch;

use crate::meta::{Category, Evaluation, OpcodeMeta};
use crate::opcode::{eval_all, Evaluator, Opcode};

fn meta(name: &'static str, description: &'static str) -> OpcodeMeta {
    OpcodeMeta { name, category: Category::Entity, evaluation: Evaluation::Eager, description }
}

fn entity_id_of(v: &Value, op: &'static str) -> Result<EntityId> {
    v.as_i64().map(EntityId).ok_or_else(|| WovError::InvalidRequest(format!("{op} requires an entity id")))
}

fn cap_id_of(v: &Value, op: &'static str) -> Result<CapabilityId> {
    v.as_str()
        .and_then(|s| s.parse().ok())
        .map(CapabilityId)
        .ok_or_else(|| WovError::InvalidRequest(format!("{op} requires a capability id")))
}

fn entity_to_value(e: &Entity) -> Value {
    Value::Object(BTreeMap::from([
        ("id".to_string(), Value::int(e.id.0)),
        ("prototype_id".to_string(), e.prototype_id.map(|p| Value::int(p.0)).unwrap_or(Value::Null)),
        ("name".to_string(), Value::str(e.name.clone())),
        ("props".to_string(), Value::Object(e.props.clone())),
        ("owner_id".to_string(), e.owner_id.map(|o| Value::int(o.0)).unwrap_or(Value::Null)),
    ]))
}

/// `create(cap, data)` — requires a `sys.create` capability. `data` is an
/// object carrying at least a `name`; the caller becomes the new entity's
/// owner and is granted `entity.control{target_id}` over it.
pub struct Create;

#[async_trait]
impl Opcode for Create {
    fn name(&self) -> &'static str {
        "create"
    }

    fn metadata(&self) -> OpcodeMeta {
        meta("create", "Create a new entity; requires a sys.create capability.")
    }

    async fn execute(&self, ctx: &mut Context, args: &[Ast], eval: &dyn Evaluator) -> Result<Value> {
        let values = eval_all(ctx, args, eval).await?;
        let [cap, data] = values.as_slice() else {
            return Err(WovError::InvalidRequest("create requires (cap, data)".into()));
        };
        let cap_id = cap_id_of(cap, "create")?;
        let Value::Object(fields) = data else {
            return Err(WovError::InvalidRequest("create data must be an object".into()));
        };
        let name = fields.get("name").and_then(Value::as_str).ok_or_else(|| WovError::InvalidRequest("create data requires a name".into()))?;
        ctx.world.check_capability(cap_id, ctx.caller, "sys.create", CapabilityMatch::Always).await?;
        let entity = ctx.world.create_entity(name, Some(ctx.caller)).await?;
        ctx.world.grant_entity_control(ctx.caller, entity.id).await?;
        Ok(entity_to_value(&entity))
    }
}

/// `destroy(entityId, capId)` — requires `entity.control` over `entityId`.
pub struct Destroy;

#[async_trait]
impl Opcode for Destroy {
    fn name(&self) -> &'static str {
        "destroy"
    }

    fn metadata(&self) -> OpcodeMeta {
        meta("destroy", "Delete an entity; requires entity.control over it.")
    }

    async fn execute(&self, ctx: &mut Context, args: &[Ast], eval: &dyn Evaluator) -> Result<Value> {
        let values = eval_all(ctx, args, eval).await?;
        let [target, cap] = values.as_slice() else {
            return Err(WovError::InvalidRequest("destroy requires (entityId, capId)".into()));
        };
        let target = entity_id_of(target, "destroy")?;
        let cap_id = cap_id_of(cap, "destroy")?;
        ctx.world.check_capability(cap_id, ctx.caller, "entity.control", CapabilityMatch::EntityControl(target)).await?;
        ctx.world.destroy_entity(target).await?;
        Ok(Value::Null)
    }
}

/// `entity(entityId)` — full entity snapshot.
pub struct GetEntity;

#[async_trait]
impl Opcode for GetEntity {
    fn name(&self) -> &'static str {
        "entity"
    }

    fn metadata(&self) -> OpcodeMeta {
        meta("entity", "Fetch an entity's id, prototype, name, props, and owner.")
    }

    async fn execute(&self, ctx: &mut Context, args: &[Ast], eval: &dyn Evaluator) -> Result<Value> {
        let values = eval_all(ctx, args, eval).await?;
        let id = values.first().ok_or_else(|| WovError::InvalidRequest("entity requires an entity id".into()))?;
        let entity = ctx.world.get_entity(entity_id_of(id, "entity")?).await?;
        Ok(entity_to_value(&entity))
    }
}

/// `set_entity(entityId, key, value, capId)` — requires `entity.control`.
pub struct SetEntity;

#[async_trait]
impl Opcode for SetEntity {
    fn name(&self) -> &'static str {
        "set_entity"
    }

    fn metadata(&self) -> OpcodeMeta {
        meta("set_entity", "Set a prop on an entity; requires entity.control over it.")
    }

    async fn execute(&self, ctx: &mut Context, args: &[Ast], eval: &dyn Evaluator) -> Result<Value> {
        let values = eval_all(ctx, args, eval).await?;
        let [target, key, value, cap] = values.as_slice() else {
            return Err(WovError::InvalidRequest("set_entity requires (entityId, key, value, capId)".into()));
        };
        let target = entity_id_of(target, "set_entity")?;
        let key = key.as_str().ok_or_else(|| WovError::InvalidRequest("set_entity key must be a string".into()))?;
        let cap_id = cap_id_of(cap, "set_entity")?;
        ctx.world.check_capability(cap_id, ctx.caller, "entity.control", CapabilityMatch::EntityControl(target)).await?;
        ctx.world.set_entity_prop(target, key, value.clone()).await?;
        Ok(Value::Null)
    }
}

/// `get_prototype(entityId)` — `null` at the root of a chain.
pub struct GetPrototype;

#[async_trait]
impl Opcode for GetPrototype {
    fn name(&self) -> &'static str {
        "get_prototype"
    }

    fn metadata(&self) -> OpcodeMeta {
        meta("get_prototype", "The entity's prototype id, or null at the root of a chain.")
    }

    async fn execute(&self, ctx: &mut Context, args: &[Ast], eval: &dyn Evaluator) -> Result<Value> {
        let values = eval_all(ctx, args, eval).await?;
        let id = values.first().ok_or_else(|| WovError::InvalidRequest("get_prototype requires an entity id".into()))?;
        let prototype = ctx.world.get_prototype(entity_id_of(id, "get_prototype")?).await?;
        Ok(prototype.map(|p| Value::int(p.0)).unwrap_or(Value::Null))
    }
}

/// `set_prototype(entityId, prototypeId, capId)` — requires
/// `entity.control`; rejected by the repository if it would introduce a
/// prototype cycle.
pub struct SetPrototype;

#[async_trait]
impl Opcode for SetPrototype {
    fn name(&self) -> &'static str {
        "set_prototype"
    }

    fn metadata(&self) -> OpcodeMeta {
        meta("set_prototype", "Rebind an entity's prototype; requires entity.control.")
    }

    async fn execute(&self, ctx: &mut Context, args: &[Ast], eval: &dyn Evaluator) -> Result<Value> {
        let values = eval_all(ctx, args, eval).await?;
        let [target, prototype, cap] = values.as_slice() else {
            return Err(WovError::InvalidRequest("set_prototype requires (entityId, prototypeId, capId)".into()));
        };
        let target = entity_id_of(target, "set_prototype")?;
        let prototype = if matches!(prototype, Value::Null) { None } else { Some(entity_id_of(prototype, "set_prototype")?) };
        let cap_id = cap_id_of(cap, "set_prototype")?;
        ctx.world.check_capability(cap_id, ctx.caller, "entity.control", CapabilityMatch::EntityControl(target)).await?;
        ctx.world.set_prototype(target, prototype).await?;
        Ok(Value::Null)
    }
}

/// `verbs(entityId)` — the verb names defined directly on this entity (not
/// its prototype chain).
pub struct Verbs;

#[async_trait]
impl Opcode for Verbs {
    fn name(&self) -> &'static str {
        "verbs"
    }

    fn metadata(&self) -> OpcodeMeta {
        meta("verbs", "Verb names defined directly on this entity.")
    }

    async fn execute(&self, ctx: &mut Context, args: &[Ast], eval: &dyn Evaluator) -> Result<Value> {
        let values = eval_all(ctx, args, eval).await?;
        let id = values.first().ok_or_else(|| WovError::InvalidRequest("verbs requires an entity id".into()))?;
        let verbs = ctx.world.list_verbs(entity_id_of(id, "verbs")?).await?;
        Ok(Value::List(verbs.into_iter().map(|v| Value::str(v.name)).collect()))
    }
}

/// `get_verb(entityId, name)` — resolved through the prototype chain;
/// `null` if not found anywhere in it.
pub struct GetVerb;

#[async_trait]
impl Opcode for GetVerb {
    fn name(&self) -> &'static str {
        "get_verb"
    }

    fn metadata(&self) -> OpcodeMeta {
        meta("get_verb", "Resolve a verb through the prototype chain, or null.")
    }

    async fn execute(&self, ctx: &mut Context, args: &[Ast], eval: &dyn Evaluator) -> Result<Value> {
        let values = eval_all(ctx, args, eval).await?;
        let [id, name] = values.as_slice() else {
            return Err(WovError::InvalidRequest("get_verb requires (entityId, name)".into()));
        };
        let name = name.as_str().ok_or_else(|| WovError::InvalidRequest("get_verb name must be a string".into()))?;
        let resolved = ctx.world.resolve_verb(entity_id_of(id, "get_verb")?, name).await?;
        Ok(match resolved {
            Some((defined_on, verb)) => {
                let source = serde_json::to_value(&verb.source).map_err(|e| WovError::Internal(e.to_string()))?;
                Value::Object(BTreeMap::from([
                    ("entity_id".to_string(), Value::int(defined_on.0)),
                    ("name".to_string(), Value::str(verb.name)),
                    ("source".to_string(), Value::from(&source)),
                ]))
            },
            None => Value::Null,
        })
    }
}

/// `resolve_props(entityId)` — the entity's shallow prop snapshot.
pub struct ResolveProps;

#[async_trait]
impl Opcode for ResolveProps {
    fn name(&self) -> &'static str {
        "resolve_props"
    }

    fn metadata(&self) -> OpcodeMeta {
        meta("resolve_props", "Shallow prop snapshot, including prototype-inherited defaults.")
    }

    async fn execute(&self, ctx: &mut Context, args: &[Ast], eval: &dyn Evaluator) -> Result<Value> {
        let values = eval_all(ctx, args, eval).await?;
        let id = values.first().ok_or_else(|| WovError::InvalidRequest("resolve_props requires an entity id".into()))?;
        let (props, warnings) = ctx.world.resolve_props(entity_id_of(id, "resolve_props")?).await?;
        ctx.warnings.extend(warnings);
        Ok(Value::Object(props))
    }
}
