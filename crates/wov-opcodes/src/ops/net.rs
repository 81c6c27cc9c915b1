//! `net.http.get`, `net.http.post` — gated by an `net.http.read`/
//! `net.http.write` capability whose `params.domain` must match or suffix
//! the target host.

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
    OpcodeMeta { name, category: Category::Net, evaluation: Evaluation::Eager, description }
}

fn cap_id_of(v: &Value, op: &'static str) -> Result<CapabilityId> {
    v.as_str().and_then(|s| s.parse().ok()).map(CapabilityId).ok_or_else(|| WovError::InvalidRequest(format!("{op} requires a capability id")))
}

fn url_host(raw: &str, op: &'static str) -> Result<(String, String)> {
    let parsed = url::Url::parse(raw).map_err(|e| WovError::InvalidRequest(format!("{op}: invalid URL: {e}")))?;
    let host = parsed.host_str().ok_or_else(|| WovError::InvalidRequest(format!("{op}: URL has no host")))?.to_string();
    Ok((raw.to_string(), host))
}

/// `net.http.get(url, capId)`.
pub struct NetHttpGet;

#[async_trait]
impl Opcode for NetHttpGet {
    fn name(&self) -> &'static str {
        "net.http.get"
    }

    fn metadata(&self) -> OpcodeMeta {
        meta("net.http.get", "HTTP GET; requires a net.http.read capability covering the host.")
    }

    async fn execute(&self, ctx: &mut Context, args: &[Ast], eval: &dyn Evaluator) -> Result<Value> {
        let values = eval_all(ctx, args, eval).await?;
        let [url, cap] = values.as_slice() else {
            return Err(WovError::InvalidRequest("net.http.get requires (url, capId)".into()));
        };
        let url = url.as_str().ok_or_else(|| WovError::InvalidRequest("net.http.get url must be a string".into()))?;
        let (url, host) = url_host(url, "net.http.get")?;
        let cap_id = cap_id_of(cap, "net.http.get")?;
        ctx.world.check_capability(cap_id, ctx.caller, "net.http.read", CapabilityMatch::NetDomain(host)).await?;
        ctx.world.http_get(&url).await
    }
}

/// `net.http.post(url, body, capId)`.
pub struct NetHttpPost;

#[async_trait]
impl Opcode for NetHttpPost {
    fn name(&self) -> &'static str {
        "net.http.post"
    }

    fn metadata(&self) -> OpcodeMeta {
        meta("net.http.post", "HTTP POST; requires a net.http.write capability covering the host.")
    }

    async fn execute(&self, ctx: &mut Context, args: &[Ast], eval: &dyn Evaluator) -> Result<Value> {
        let values = eval_all(ctx, args, eval).await?;
        let [url, body, cap] = values.as_slice() else {
            return Err(WovError::InvalidRequest("net.http.post requires (url, body, capId)".into()));
        };
        let url = url.as_str().ok_or_else(|| WovError::InvalidRequest("net.http.post url must be a string".into()))?;
        let (url, host) = url_host(url, "net.http.post")?;
        let cap_id = cap_id_of(cap, "net.http.post")?;
        ctx.world.check_capability(cap_id, ctx.caller, "net.http.write", CapabilityMatch::NetDomain(host)).await?;
        ctx.world.http_post(&url, body.clone()).await
    }
}
