//! JSON-RPC API definition for the session layer.
//!
//! Uses jsonrpsee proc macros to define the RPC interface. This crate only
//! implements the server side — a world server has no single privileged
//! client, so no `client` arm is generated.
//!
//! A WebSocket wire sketch binding a session implicitly to its connection
//! (`login` binds the connection; later requests carry no session
//! reference at all) doesn't fit jsonrpsee's idiomatic shape, which
//! instead threads an explicit id through every call: `login` hands back a
//! [`wov_core::SessionId`], and every other method takes it as its first
//! parameter. One id per connection, established once, functions the same
//! as implicit binding; see `DESIGN.md` for the full justification.
//!
//! `execute` is conceptually a single variadic array `[verbName, …args]`;
//! jsonrpsee's `#[rpc]` macro cannot express a variadic positional
//! parameter list, so `args` is carried as its own (fixed-position) array
//! parameter instead of being spliced flat into the params list.

use jsonrpsee::core::SubscriptionResult;
use jsonrpsee::proc_macros::rpc;
use jsonrpsee::types::ErrorObjectOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value as Json;
use wov_core::{EntityId, SessionId, WovError};

/// Result of a successful `login`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResult {
    /// The session id subsequent calls must supply.
    pub session_id: SessionId,
    /// The entity this session is now bound to — either the requested
    /// `entityId` or a freshly created Guest.
    pub entity_id: EntityId,
}

/// The JSON shape of an entity returned by `get_entities` (`created_at` is
/// internal bookkeeping, not part of the wire contract).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityView {
    pub id: EntityId,
    pub name: String,
    pub prototype_id: Option<EntityId>,
    pub owner_id: Option<EntityId>,
    pub props: std::collections::BTreeMap<String, Json>,
}

/// The JSON shape of a verb returned by `get_verb`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerbView {
    pub name: String,
    pub source: wov_core::Ast,
}

/// Metadata for one registered opcode, as returned by `get_opcodes`.
pub type OpcodeView = wov_opcodes::OpcodeMeta;

/// One notification pushed to a bound session, built directly from
/// [`wov_events::Notification`]'s own fields — outbound message shapes are
/// already exactly `{method, params}` at that layer. jsonrpsee
/// wraps every subscription item in its own `{subscription, result}`
/// envelope; that wrapping is unavoidable with jsonrpsee's pub/sub model
/// and is additional to, not a replacement for, this shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutboundNotification {
    pub method: String,
    pub params: Json,
}

impl From<&wov_events::Notification> for OutboundNotification {
    fn from(n: &wov_events::Notification) -> Self {
        Self { method: n.method.clone(), params: n.params.clone() }
    }
}

/// Map an internal error onto a JSON-RPC error object, carrying `stack[]`
/// alongside `script_error`/`gas_exhausted`.
#[must_use]
pub fn to_rpc_error(err: WovError) -> ErrorObjectOwned {
    let code = err.rpc_code();
    match err {
        WovError::ScriptError { message, stack } => ErrorObjectOwned::owned(code, message, Some(serde_json::json!({ "stack": stack }))),
        WovError::GasExhausted => ErrorObjectOwned::owned(code, "gas exhausted", Some(serde_json::json!({ "stack": [] }))),
        other => ErrorObjectOwned::owned(code, other.to_string(), None::<()>),
    }
}

/// Unknown- or expired-session error, shared by every method that requires
/// a prior `login`.
#[must_use]
pub fn session_not_found(session_id: SessionId) -> ErrorObjectOwned {
    ErrorObjectOwned::owned(-32001, format!("no session bound: {session_id}"), None::<()>)
}

/// The world server's session-layer RPC API.
#[rpc(server)]
pub trait WovRpc {
    /// Bind this session to `entity_id`, or to a freshly created Guest if
    /// omitted or unknown.
    #[method(name = "login")]
    async fn login(&self, entity_id: Option<EntityId>) -> Result<LoginResult, ErrorObjectOwned>;

    /// Run `verb_name` on the session's bound entity with `args`, returning
    /// its result. Any warnings accumulated while running are flushed as
    /// `message {type:"info"}` notifications before this call returns.
    #[method(name = "execute")]
    async fn execute(&self, session_id: SessionId, verb_name: String, args: Vec<Json>) -> Result<Json, ErrorObjectOwned>;

    /// List every registered opcode (standard and plugin-contributed).
    #[method(name = "get_opcodes")]
    async fn get_opcodes(&self) -> Result<Vec<OpcodeView>, ErrorObjectOwned>;

    /// Fetch the current state of each requested entity. An id that does
    /// not resolve to an entity is silently omitted from the result.
    #[method(name = "get_entities")]
    async fn get_entities(&self, ids: Vec<EntityId>) -> Result<Vec<EntityView>, ErrorObjectOwned>;

    /// Fetch one verb's source by entity and name.
    #[method(name = "get_verb")]
    async fn get_verb(&self, entity_id: EntityId, name: String) -> Result<Option<VerbView>, ErrorObjectOwned>;

    /// Replace (or create) a verb's source.
    #[method(name = "update_verb")]
    async fn update_verb(&self, entity_id: EntityId, name: String, source: wov_core::Ast) -> Result<(), ErrorObjectOwned>;

    /// Dispatch a `{method, params}` call to a host-compiled plugin.
    #[method(name = "plugin_rpc")]
    async fn plugin_rpc(&self, method: String, params: Json) -> Result<Json, ErrorObjectOwned>;

    /// Liveness probe.
    #[method(name = "ping")]
    async fn ping(&self) -> Result<String, ErrorObjectOwned>;

    /// Subscribe to every notification addressed to this session's bound
    /// entity.
    #[subscription(name = "subscribe_events" => "event", unsubscribe = "unsubscribe_events", item = OutboundNotification)]
    async fn subscribe_events(&self, session_id: SessionId) -> SubscriptionResult;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outbound_notification_mirrors_the_bus_notification_fields() {
        let n = wov_events::Notification { target: EntityId(7), method: "message".into(), params: serde_json::json!({"text": "hi", "type": "info"}) };
        let view = OutboundNotification::from(&n);
        assert_eq!(view.method, "message");
        assert_eq!(view.params, serde_json::json!({"text": "hi", "type": "info"}));
    }

    #[test]
    fn script_error_carries_its_stack_in_the_error_data() {
        let err = to_rpc_error(WovError::ScriptError { message: "boom".into(), stack: vec!["a.b".into()] });
        assert_eq!(err.code(), -32000);
        assert_eq!(err.data().map(|d| d.get().to_string()), Some(serde_json::json!({"stack": ["a.b"]}).to_string()));
    }

    #[test]
    fn capability_denied_maps_to_its_dedicated_code() {
        let err = to_rpc_error(WovError::CapabilityDenied { required_type: "sys.create".into() });
        assert_eq!(err.code(), -32001);
    }
}
