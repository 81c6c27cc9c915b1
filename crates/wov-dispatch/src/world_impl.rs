//! The concrete [`World`]: bridges [`Repository`], [`CapabilityKernel`], and
//! [`EventBus`] into the single trait object opcodes and the interpreter see.
//!
//! `resolve_props`'s `get_p`-override needs to *run a verb*, which needs an
//! [`Interpreter`] and a `World` to run it against — this instance, wrapped
//! as `Arc<dyn World>`. Both can only exist after `WorldImpl` itself does, so
//! they're threaded back in once via [`WorldImpl::wire`] rather than forcing
//! a construction-time cycle.

use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};
use std::sync::{Arc, OnceLock};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use wov_capabilities::CapabilityKernel;
use wov_core::ast::Ast;
use wov_core::context::{Context, GasMeter};
use wov_core::error::{Result, WovError};
use wov_core::ids::{CapabilityId, EntityId, IdSequence, TaskId, VerbId};
use wov_core::model::{Capability, Entity, Verb};
use wov_core::value::Value;
use wov_core::world::{CapabilityMatch, World};
use wov_events::{EventBus, Notification};
use wov_interpreter::Interpreter;
use wov_opcodes::Evaluator;
use wov_repository::{RepoError, Repository};

/// Resolve `requested` (a `/`-rooted virtual path) against `root`, stripping
/// `..`/`.` components rather than following them, and reject the result if
/// it still falls outside `root`. `fs_path_covers` assumes its
/// `canonical_target` argument is already sandboxed this way.
fn canonicalize_under(root: &Path, requested: &str) -> Result<PathBuf> {
    let joined = root.join(requested.trim_start_matches('/'));
    let mut normalized = PathBuf::new();
    for component in joined.components() {
        match component {
            Component::ParentDir => {
                normalized.pop();
            },
            Component::CurDir => {},
            other => normalized.push(other),
        }
    }
    if !normalized.starts_with(root) {
        return Err(WovError::InvalidRequest(format!("path escapes sandbox root: {requested}")));
    }
    Ok(normalized)
}

pub struct WorldImpl {
    repo: Arc<Repository>,
    capabilities: Arc<CapabilityKernel>,
    events: EventBus,
    http: reqwest::Client,
    fs_root: PathBuf,
    entity_seq: IdSequence,
    verb_seq: IdSequence,
    self_handle: OnceLock<Arc<dyn World>>,
    interpreter: OnceLock<Arc<Interpreter>>,
    bot_id: EntityId,
}

impl WorldImpl {
    /// Construct against an already-open repository, seeding the entity and
    /// verb id sequences from its current high-water marks.
    pub async fn new(
        repo: Arc<Repository>,
        capabilities: Arc<CapabilityKernel>,
        events: EventBus,
        fs_root: PathBuf,
        bot_id: EntityId,
    ) -> Result<Self> {
        let max_entity = repo.max_entity_id().await?;
        let max_verb = repo.max_verb_id().await?;
        let http = reqwest::Client::builder().build().map_err(|e| WovError::Internal(e.to_string()))?;
        Ok(Self {
            repo,
            capabilities,
            events,
            http,
            fs_root,
            entity_seq: IdSequence::starting_after(max_entity),
            verb_seq: IdSequence::starting_after(max_verb),
            self_handle: OnceLock::new(),
            interpreter: OnceLock::new(),
            bot_id,
        })
    }

    /// Complete construction by handing this world a reference to itself
    /// and to the interpreter it runs under. Must be called exactly once,
    /// before the first `resolve_props` call against an entity with a
    /// `get_p` verb.
    pub fn wire(&self, self_handle: Arc<dyn World>, interpreter: Arc<Interpreter>) {
        let _ = self.self_handle.set(self_handle);
        let _ = self.interpreter.set(interpreter);
    }
}

#[async_trait]
impl World for WorldImpl {
    async fn get_entity(&self, id: EntityId) -> Result<Entity> {
        self.repo.get_entity(id).await?.ok_or_else(|| WovError::InvalidRequest(format!("entity {id} not found")))
    }

    async fn create_entity(&self, name: &str, owner_id: Option<EntityId>) -> Result<Entity> {
        Ok(self.repo.create_entity(&self.entity_seq, name, owner_id).await?)
    }

    async fn destroy_entity(&self, id: EntityId) -> Result<()> {
        Ok(self.repo.delete_entity(id).await?)
    }

    async fn set_entity_prop(&self, id: EntityId, key: &str, value: Value) -> Result<()> {
        let mut entity = self.get_entity(id).await?;
        entity.props.insert(key.to_string(), value);
        Ok(self.repo.update_entities(std::slice::from_ref(&entity)).await?)
    }

    async fn get_prototype(&self, id: EntityId) -> Result<Option<EntityId>> {
        Ok(self.repo.get_prototype_id(id).await?)
    }

    async fn set_prototype(&self, id: EntityId, prototype_id: Option<EntityId>) -> Result<()> {
        self.repo.set_prototype_id(id, prototype_id).await.map_err(|e| match e {
            RepoError::PrototypeCycle(cycle_id) => WovError::InvalidRequest(format!("prototype cycle at entity {cycle_id}")),
            other => WovError::from(other),
        })
    }

    async fn resolve_props(&self, id: EntityId) -> Result<(BTreeMap<String, Value>, Vec<String>)> {
        let base = self.get_entity(id).await?.props;
        let mut warnings = Vec::new();

        let Some((_, verb)) = self.resolve_verb(id, "get_p").await? else {
            return Ok((base, warnings));
        };
        let Some(interpreter) = self.interpreter.get() else {
            warnings.push("get_p verb present but the world is not yet wired to an interpreter".to_string());
            return Ok((base, warnings));
        };
        let Some(world) = self.self_handle.get() else {
            warnings.push("get_p verb present but the world has no self-handle".to_string());
            return Ok((base, warnings));
        };

        let gas = Arc::new(GasMeter::new(1_000));
        let mut ctx = Context::root(id, id, "get_p", Vec::new(), gas, Arc::clone(world), self.bot_id);
        let outcome = interpreter.eval(&mut ctx, &verb.source).await;
        warnings.extend(ctx.warnings);

        let overridden = match outcome {
            Ok(Value::Object(overridden)) | Err(WovError::Return(Value::Object(overridden))) => overridden,
            Ok(_) | Err(WovError::Return(_)) => {
                warnings.push("get_p did not return an object; ignoring override".to_string());
                return Ok((base, warnings));
            },
            Err(err) => {
                warnings.push(format!("get_p failed: {err}"));
                return Ok((base, warnings));
            },
        };
        let mut merged = base;
        merged.extend(overridden);
        Ok((merged, warnings))
    }

    async fn list_verbs(&self, entity_id: EntityId) -> Result<Vec<Verb>> {
        Ok(self.repo.get_verbs(entity_id).await?)
    }

    async fn get_verb(&self, entity_id: EntityId, name: &str) -> Result<Option<Verb>> {
        Ok(self.repo.get_verb(entity_id, name).await?)
    }

    async fn resolve_verb(&self, entity_id: EntityId, name: &str) -> Result<Option<(EntityId, Verb)>> {
        let mut cursor = Some(entity_id);
        let mut hops = 0;
        while let Some(cur) = cursor {
            hops += 1;
            if hops > wov_repository::MAX_PROTOTYPE_HOPS {
                return Err(WovError::Internal(format!("prototype chain from {entity_id} did not terminate")));
            }
            if let Some(verb) = self.repo.get_verb(cur, name).await? {
                return Ok(Some((cur, verb)));
            }
            cursor = self.repo.get_prototype_id(cur).await?;
        }
        Ok(None)
    }

    async fn set_verb(&self, entity_id: EntityId, name: &str, source: Ast) -> Result<VerbId> {
        Ok(self.repo.update_verb(&self.verb_seq, entity_id, name, source).await?.id)
    }

    async fn mint_capability(
        &self,
        authority: CapabilityId,
        caller: EntityId,
        cap_type: &str,
        params: BTreeMap<String, Value>,
    ) -> Result<Capability> {
        Ok(self.capabilities.mint(authority, caller, cap_type, params).await?)
    }

    async fn delegate_capability(
        &self,
        parent: CapabilityId,
        caller: EntityId,
        restrictions: BTreeMap<String, Value>,
    ) -> Result<Capability> {
        Ok(self.capabilities.delegate(parent, caller, restrictions).await?)
    }

    async fn give_capability(&self, cap: CapabilityId, caller: EntityId, target: EntityId) -> Result<()> {
        Ok(self.capabilities.give(cap, caller, target).await?)
    }

    async fn grant_entity_control(&self, owner: EntityId, target: EntityId) -> Result<Capability> {
        let params = BTreeMap::from([("target_id".to_string(), Value::int(target.0))]);
        Ok(self.repo.create_capability(owner, "entity.control", params).await?)
    }

    async fn check_capability(
        &self,
        cap: CapabilityId,
        caller: EntityId,
        expected_type: &str,
        predicate: CapabilityMatch,
    ) -> Result<Capability> {
        let cap = match predicate {
            CapabilityMatch::Always => self.capabilities.check(cap, caller, expected_type, |_| true).await,
            CapabilityMatch::EntityControl(target) => {
                self.capabilities.check(cap, caller, expected_type, |params| wov_capabilities::predicates::entity_control_matches(params, target)).await
            },
            CapabilityMatch::FsPath(path) => {
                self.capabilities.check(cap, caller, expected_type, |params| wov_capabilities::predicates::fs_path_covers(params, &path)).await
            },
            CapabilityMatch::NetDomain(host) => {
                self.capabilities.check(cap, caller, expected_type, |params| wov_capabilities::predicates::net_domain_covers(params, &host)).await
            },
        };
        Ok(cap?)
    }

    async fn find_capability(
        &self,
        owner: EntityId,
        cap_type: &str,
        filter: Option<&BTreeMap<String, Value>>,
    ) -> Result<Option<Capability>> {
        Ok(self.capabilities.find_capability(owner, cap_type, filter).await?)
    }

    async fn schedule_task(&self, entity_id: EntityId, verb: &str, args: Vec<Value>, execute_at: DateTime<Utc>) -> Result<TaskId> {
        Ok(self.repo.schedule_task(entity_id, verb, args, execute_at).await?.id)
    }

    fn publish(&self, target: EntityId, method: &str, params: serde_json::Value) {
        self.events.publish(Notification { target, method: method.to_string(), params });
    }

    async fn fs_read(&self, path: &str) -> Result<String> {
        let full = canonicalize_under(&self.fs_root, path)?;
        tokio::fs::read_to_string(&full).await.map_err(|e| WovError::Internal(format!("fs.read {path}: {e}")))
    }

    async fn fs_write(&self, path: &str, content: &str) -> Result<()> {
        let full = canonicalize_under(&self.fs_root, path)?;
        if let Some(parent) = full.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| WovError::Internal(format!("fs.write {path}: {e}")))?;
        }
        tokio::fs::write(&full, content).await.map_err(|e| WovError::Internal(format!("fs.write {path}: {e}")))
    }

    async fn fs_list(&self, path: &str) -> Result<Vec<String>> {
        let full = canonicalize_under(&self.fs_root, path)?;
        let mut entries = tokio::fs::read_dir(&full).await.map_err(|e| WovError::Internal(format!("fs.list {path}: {e}")))?;
        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(|e| WovError::Internal(format!("fs.list {path}: {e}")))? {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
        names.sort();
        Ok(names)
    }

    async fn http_get(&self, url: &str) -> Result<Value> {
        let resp = self.http.get(url).send().await.map_err(|e| WovError::Internal(format!("net.http.get {url}: {e}")))?;
        let body: serde_json::Value = resp.json().await.map_err(|e| WovError::Internal(format!("net.http.get {url}: {e}")))?;
        Ok(Value::from(&body))
    }

    async fn http_post(&self, url: &str, body: Value) -> Result<Value> {
        let json_body: serde_json::Value = body.into();
        let resp = self.http.post(url).json(&json_body).send().await.map_err(|e| WovError::Internal(format!("net.http.post {url}: {e}")))?;
        let resp_body: serde_json::Value = resp.json().await.map_err(|e| WovError::Internal(format!("net.http.post {url}: {e}")))?;
        Ok(Value::from(&resp_body))
    }
}
