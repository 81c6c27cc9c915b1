//! `call`, `sudo`, `schedule`, `send`.

use async_trait::async_trait;
use chrono::Utc;
use wov_core::ast::Ast;
use wov_core::context::Context;
use wov_core::error::{Result, WovError};
use wov_core::ids::{CapabilityId, EntityId};
use wov_core::value::Value;
use wov_core::world::CapabilityMatch;

use crate::meta::{Category, Evaluation, OpcodeMeta};
use crate::opcode::{eval_all, Evaluator, Opcode};

fn meta(name: &'static str, evaluation: Evaluation, description: &'static str) -> OpcodeMeta {
    OpcodeMeta { name, category: Category::Verb, evaluation, description }
}

fn entity_id_of(v: &Value, op: &'static str) -> Result<EntityId> {
    v.as_i64().map(EntityId).ok_or_else(|| WovError::InvalidRequest(format!("{op} requires an entity id")))
}

fn args_list_of(v: &Value, op: &'static str) -> Result<Vec<Value>> {
    v.as_list().map(<[Value]>::to_vec).ok_or_else(|| WovError::InvalidRequest(format!("{op} requires a list of arguments")))
}

/// Run `verb` on `target` under a fresh nested context, unwrapping an
/// in-flight `return` the way a normal call boundary does. `sudo_origin`,
/// when set, marks the nested context (and everything it nests in turn) as
/// running inside an impersonation originally initiated by that entity.
async fn invoke(
    ctx: &mut Context,
    caller: EntityId,
    target: EntityId,
    verb_name: &str,
    call_args: Vec<Value>,
    eval: &dyn Evaluator,
    sudo_origin: Option<EntityId>,
) -> Result<Value> {
    let resolved = ctx
        .world
        .resolve_verb(target, verb_name)
        .await?
        .ok_or_else(|| WovError::VerbNotFound { entity: target.to_string(), verb: verb_name.to_string() })?;
    let (_, verb) = resolved;
    let mut nested = ctx.nested(caller, target, verb_name, call_args);
    if sudo_origin.is_some() {
        nested.sudo_origin = sudo_origin;
    }
    let result = match eval.eval(&mut nested, &verb.source).await {
        Ok(v) => Ok(v),
        Err(WovError::Return(v)) => Ok(v),
        Err(WovError::Thrown(v)) => {
            let mut stack: Vec<String> = nested.stack.iter().rev().map(ToString::to_string).collect();
            stack.push(v.to_string());
            Err(WovError::ScriptError { message: v.to_string(), stack })
        },
        Err(other) => Err(other),
    };
    ctx.warnings.extend(nested.warnings);
    result
}

/// `call(target, verbName, …args)` — `caller` is unchanged; `this` becomes
/// `target`.
pub struct Call;

#[async_trait]
impl Opcode for Call {
    fn name(&self) -> &'static str {
        "call"
    }

    fn metadata(&self) -> OpcodeMeta {
        meta("call", Evaluation::Eager, "Invoke another entity's verb, preserving the original caller.")
    }

    async fn execute(&self, ctx: &mut Context, args: &[Ast], eval: &dyn Evaluator) -> Result<Value> {
        let values = eval_all(ctx, args, eval).await?;
        let [target, verb_name, rest @ ..] = values.as_slice() else {
            return Err(WovError::InvalidRequest("call requires (target, verbName, ...args)".into()));
        };
        let target = entity_id_of(target, "call")?;
        let verb_name = verb_name.as_str().ok_or_else(|| WovError::InvalidRequest("call verbName must be a string".into()))?;
        invoke(ctx, ctx.caller, target, verb_name, rest.to_vec(), eval, None).await
    }
}

/// `sudo(cap, target, verbName, argsList)` — requires a `sys.sudo`
/// capability owned by `ctx.caller`. Evaluates the target verb with full
/// impersonation: `caller == target`, `this == target`. If the original
/// caller (before impersonation) is the well-known Bot identity, every
/// `send` inside the impersonated verb is rewritten by `Send` into a
/// `forward` addressed back to the Bot.
pub struct Sudo;

#[async_trait]
impl Opcode for Sudo {
    fn name(&self) -> &'static str {
        "sudo"
    }

    fn metadata(&self) -> OpcodeMeta {
        meta("sudo", Evaluation::Eager, "Impersonate another entity's verb; requires a sys.sudo capability.")
    }

    async fn execute(&self, ctx: &mut Context, args: &[Ast], eval: &dyn Evaluator) -> Result<Value> {
        let values = eval_all(ctx, args, eval).await?;
        let [cap, target, verb_name, call_args] = values.as_slice() else {
            return Err(WovError::InvalidRequest("sudo requires (cap, target, verbName, argsList)".into()));
        };
        let cap_id: CapabilityId = cap
            .as_str()
            .and_then(|s| s.parse().ok())
            .map(CapabilityId)
            .ok_or_else(|| WovError::InvalidRequest("sudo requires a capability id".into()))?;
        let target = entity_id_of(target, "sudo")?;
        let verb_name = verb_name.as_str().ok_or_else(|| WovError::InvalidRequest("sudo verbName must be a string".into()))?;
        let call_args = args_list_of(call_args, "sudo")?;
        ctx.world.check_capability(cap_id, ctx.caller, "sys.sudo", CapabilityMatch::Always).await?;
        invoke(ctx, target, target, verb_name, call_args, eval, Some(ctx.caller)).await
    }
}

/// `schedule(verbName, argsList, delayMs)` — entity is implicit (`this`);
/// `delayMs` is relative to the moment `schedule` runs.
pub struct Schedule;

#[async_trait]
impl Opcode for Schedule {
    fn name(&self) -> &'static str {
        "schedule"
    }

    fn metadata(&self) -> OpcodeMeta {
        meta("schedule", Evaluation::Eager, "Queue a verb invocation on this entity to run after a delay.")
    }

    async fn execute(&self, ctx: &mut Context, args: &[Ast], eval: &dyn Evaluator) -> Result<Value> {
        let values = eval_all(ctx, args, eval).await?;
        let [verb_name, call_args, delay_ms] = values.as_slice() else {
            return Err(WovError::InvalidRequest("schedule requires (verbName, argsList, delayMs)".into()));
        };
        let verb_name = verb_name.as_str().ok_or_else(|| WovError::InvalidRequest("schedule verbName must be a string".into()))?;
        let call_args = args_list_of(call_args, "schedule")?;
        let delay_ms = delay_ms.as_i64().ok_or_else(|| WovError::InvalidRequest("schedule delayMs must be a number".into()))?;
        let execute_at = Utc::now() + chrono::Duration::milliseconds(delay_ms);
        let task_id = ctx.world.schedule_task(ctx.this, verb_name, call_args, execute_at).await?;
        Ok(Value::str(task_id.to_string()))
    }
}

/// Normalize a `message` notification's payload to `{text, type}`. A bare
/// value becomes `{text: value, type: "info"}`; an object already carrying
/// `text` passes through, defaulting `type` to `"info"` when absent.
fn shape_message_payload(payload: &Value) -> serde_json::Value {
    if let Value::Object(fields) = payload {
        if let Some(text) = fields.get("text") {
            let kind = fields.get("type").cloned().unwrap_or_else(|| Value::str("info"));
            return serde_json::json!({ "text": serde_json::Value::from(text.clone()), "type": serde_json::Value::from(kind) });
        }
    }
    serde_json::json!({ "text": serde_json::Value::from(payload.clone()), "type": "info" })
}

/// `send(notifType, payload)` — publish a notification to every session
/// bound to `this`. If this verb is running under `sudo` impersonation
/// originally initiated by the well-known Bot identity, rewritten instead
/// into a single `forward` notification addressed back to the Bot.
pub struct Send;

#[async_trait]
impl Opcode for Send {
    fn name(&self) -> &'static str {
        "send"
    }

    fn metadata(&self) -> OpcodeMeta {
        meta("send", Evaluation::Eager, "Publish a notification to every session bound to this entity.")
    }

    async fn execute(&self, ctx: &mut Context, args: &[Ast], eval: &dyn Evaluator) -> Result<Value> {
        let values = eval_all(ctx, args, eval).await?;
        let [kind, payload] = values.as_slice() else {
            return Err(WovError::InvalidRequest("send requires (notifType, payload)".into()));
        };
        let kind = kind.as_str().ok_or_else(|| WovError::InvalidRequest("send type must be a string".into()))?;
        let shaped = if kind == "message" { shape_message_payload(payload) } else { payload.clone().into() };

        if ctx.sudo_origin == Some(ctx.bot_id) {
            let params = serde_json::json!({ "target": ctx.this.0, "type": kind, "payload": shaped });
            ctx.world.publish(ctx.bot_id, "forward", params);
        } else {
            ctx.world.publish(ctx.this, kind, shaped);
        }
        Ok(Value::Null)
    }
}
