//! The `World` trait: every side effect an opcode can have, expressed as an
//! interface owned by this crate and implemented by `wov-dispatch` (which
//! alone depends on `wov-repository`, `wov-capabilities`, and `wov-events`).
//!
//! Without this seam, `wov-opcodes` would need to depend on the storage and
//! capability crates directly, and `wov-interpreter` on `wov-opcodes` *and*
//! those crates — any one of `entity.*`/`verb.*`/`capability.*` opcode
//! gaining a new need would ripple through three crates' `Cargo.toml`s.
//! Instead opcodes and the interpreter only ever see `Arc<dyn World>`.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::ids::{CapabilityId, EntityId, TaskId, VerbId};
use crate::model::{Capability, Entity, Verb};
use crate::value::Value;

/// Which built-in predicate a `capability.*` opcode asks `World::check_capability`
/// to apply against the capability's `params`, once ownership and type have
/// already matched and the `"*"` wildcard shortcut has been ruled out.
#[derive(Debug, Clone)]
pub enum CapabilityMatch {
    /// Always matches; used by capability types with no parameter shape,
    /// e.g. `sys.create`.
    Always,
    /// `entity.control` — `params.target_id` must equal this entity.
    EntityControl(EntityId),
    /// `fs.read` / `fs.write` — `params.path` must prefix this path.
    FsPath(String),
    /// `net.http.read` / `net.http.write` — `params.domain` must match or
    /// suffix this host.
    NetDomain(String),
}

/// Everything a running verb can do to the world outside its own local
/// variables: read and mutate entities, verbs, and capabilities, emit
/// notifications, schedule future work, and reach the filesystem and
/// network opcodes gate.
#[async_trait]
pub trait World: Send + Sync {
    async fn get_entity(&self, id: EntityId) -> Result<Entity>;
    async fn create_entity(&self, name: &str, owner_id: Option<EntityId>) -> Result<Entity>;
    async fn destroy_entity(&self, id: EntityId) -> Result<()>;
    async fn set_entity_prop(&self, id: EntityId, key: &str, value: Value) -> Result<()>;
    async fn get_prototype(&self, id: EntityId) -> Result<Option<EntityId>>;
    async fn set_prototype(&self, id: EntityId, prototype_id: Option<EntityId>) -> Result<()>;
    /// Shallow prop snapshot, overridden by the resolved `get_p` verb's
    /// result where one exists on the entity or its prototype chain. A
    /// failure running `get_p` does not fail the whole call: it is reported
    /// back as a warning string alongside the (unoverridden) base props.
    async fn resolve_props(&self, id: EntityId) -> Result<(BTreeMap<String, Value>, Vec<String>)>;

    async fn list_verbs(&self, entity_id: EntityId) -> Result<Vec<Verb>>;
    async fn get_verb(&self, entity_id: EntityId, name: &str) -> Result<Option<Verb>>;
    /// Verb resolution by prototype-chain walk: the entity the verb was
    /// actually found on, plus the verb itself.
    async fn resolve_verb(&self, entity_id: EntityId, name: &str) -> Result<Option<(EntityId, Verb)>>;
    async fn set_verb(&self, entity_id: EntityId, name: &str, source: crate::ast::Ast) -> Result<VerbId>;

    async fn mint_capability(
        &self,
        authority: CapabilityId,
        caller: EntityId,
        cap_type: &str,
        params: BTreeMap<String, Value>,
    ) -> Result<Capability>;
    async fn delegate_capability(
        &self,
        parent: CapabilityId,
        caller: EntityId,
        restrictions: BTreeMap<String, Value>,
    ) -> Result<Capability>;
    async fn give_capability(&self, cap: CapabilityId, caller: EntityId, target: EntityId) -> Result<()>;
    /// Mint an `entity.control{target_id}` capability owned by `owner` over
    /// `target`, bypassing the `sys.mint` authority gate — used by `create`
    /// to hand the creating entity control of what it just made.
    async fn grant_entity_control(&self, owner: EntityId, target: EntityId) -> Result<Capability>;
    async fn check_capability(
        &self,
        cap: CapabilityId,
        caller: EntityId,
        expected_type: &str,
        predicate: CapabilityMatch,
    ) -> Result<Capability>;
    async fn find_capability(
        &self,
        owner: EntityId,
        cap_type: &str,
        filter: Option<&BTreeMap<String, Value>>,
    ) -> Result<Option<Capability>>;

    async fn schedule_task(
        &self,
        entity_id: EntityId,
        verb: &str,
        args: Vec<Value>,
        execute_at: DateTime<Utc>,
    ) -> Result<TaskId>;

    /// Publish a notification addressed to every session bound to `target`.
    fn publish(&self, target: EntityId, method: &str, params: serde_json::Value);

    async fn fs_read(&self, path: &str) -> Result<String>;
    async fn fs_write(&self, path: &str, content: &str) -> Result<()>;
    async fn fs_list(&self, path: &str) -> Result<Vec<String>>;

    async fn http_get(&self, url: &str) -> Result<Value>;
    async fn http_post(&self, url: &str, body: Value) -> Result<Value>;
}
