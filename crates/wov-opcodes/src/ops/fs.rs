//! `fs.read`, `fs.write`, `fs.list` — gated by an `fs.read`/`fs.write`
//! capability whose `params.path` must prefix the target path.

use async_trait::async_trait;
use wov_core::ast::Ast;
use wov_core::context::Context;
use wov_core::error::{Result, WovError};
use wov_core::ids::CapabilityId;
use wov_core::value::Value;
use wov_core::world::CapabilityMatch;

use crate::meta::{Category, Evaluation, OpcodeMeta};
use crate::opcode::{eval_all, Evaluator, Opcode};

fn meta(name: &'static str, description: &'static str) -> OpcodeMeta {
    OpcodeMeta { name, category: Category::Fs, evaluation: Evaluation::Eager, description }
}

fn cap_id_of(v: &Value, op: &'static str) -> Result<CapabilityId> {
    v.as_str().and_then(|s| s.parse().ok()).map(CapabilityId).ok_or_else(|| WovError::InvalidRequest(format!("{op} requires a capability id")))
}

fn path_of(v: &Value, op: &'static str) -> Result<String> {
    v.as_str().map(str::to_string).ok_or_else(|| WovError::InvalidRequest(format!("{op} requires a string path")))
}

/// `fs.read(path, capId)`.
pub struct FsRead;

#[async_trait]
impl Opcode for FsRead {
    fn name(&self) -> &'static str {
        "fs.read"
    }

    fn metadata(&self) -> OpcodeMeta {
        meta("fs.read", "Read a file; requires an fs.read capability covering its path.")
    }

    async fn execute(&self, ctx: &mut Context, args: &[Ast], eval: &dyn Evaluator) -> Result<Value> {
        let values = eval_all(ctx, args, eval).await?;
        let [path, cap] = values.as_slice() else {
            return Err(WovError::InvalidRequest("fs.read requires (path, capId)".into()));
        };
        let path = path_of(path, "fs.read")?;
        let cap_id = cap_id_of(cap, "fs.read")?;
        ctx.world.check_capability(cap_id, ctx.caller, "fs.read", CapabilityMatch::FsPath(path.clone())).await?;
        Ok(Value::str(ctx.world.fs_read(&path).await?))
    }
}

/// `fs.write(path, content, capId)`.
pub struct FsWrite;

#[async_trait]
impl Opcode for FsWrite {
    fn name(&self) -> &'static str {
        "fs.write"
    }

    fn metadata(&self) -> OpcodeMeta {
        meta("fs.write", "Write a file; requires an fs.write capability covering its path.")
    }

    async fn execute(&self, ctx: &mut Context, args: &[Ast], eval: &dyn Evaluator) -> Result<Value> {
        let values = eval_all(ctx, args, eval).await?;
        let [path, content, cap] = values.as_slice() else {
            return Err(WovError::InvalidRequest("fs.write requires (path, content, capId)".into()));
        };
        let path = path_of(path, "fs.write")?;
        let content = content.as_str().ok_or_else(|| WovError::InvalidRequest("fs.write content must be a string".into()))?;
        let cap_id = cap_id_of(cap, "fs.write")?;
        ctx.world.check_capability(cap_id, ctx.caller, "fs.write", CapabilityMatch::FsPath(path.clone())).await?;
        ctx.world.fs_write(&path, content).await?;
        Ok(Value::Null)
    }
}

/// `fs.list(path, capId)`.
pub struct FsList;

#[async_trait]
impl Opcode for FsList {
    fn name(&self) -> &'static str {
        "fs.list"
    }

    fn metadata(&self) -> OpcodeMeta {
        meta("fs.list", "List a directory; requires an fs.read capability covering its path.")
    }

    async fn execute(&self, ctx: &mut Context, args: &[Ast], eval: &dyn Evaluator) -> Result<Value> {
        let values = eval_all(ctx, args, eval).await?;
        let [path, cap] = values.as_slice() else {
            return Err(WovError::InvalidRequest("fs.list requires (path, capId)".into()));
        };
        let path = path_of(path, "fs.list")?;
        let cap_id = cap_id_of(cap, "fs.list")?;
        ctx.world.check_capability(cap_id, ctx.caller, "fs.read", CapabilityMatch::FsPath(path.clone())).await?;
        let entries = ctx.world.fs_list(&path).await?;
        Ok(Value::List(entries.into_iter().map(Value::String).collect()))
    }
}
