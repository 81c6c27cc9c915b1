//! `RpcImpl`: shared server state plus the generated trait's delegating
//! implementation. Each method forwards to a `*_impl` defined in a
//! focused sibling module (`session.rs`, `execute.rs`, `introspect.rs`,
//! `plugin.rs`, `events.rs`).

mod events;
mod execute;
mod introspect;
mod plugin;
mod session;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use jsonrpsee::core::SubscriptionResult;
use jsonrpsee::types::ErrorObjectOwned;
use jsonrpsee::PendingSubscriptionSink;
use serde_json::Value as Json;
use tokio::sync::RwLock;
use wov_core::{Config, EntityId, Session, SessionId, World};
use wov_dispatch::Dispatcher;
use wov_events::EventBus;
use wov_interpreter::Interpreter;
use wov_plugins::PluginRegistry;

use crate::rpc::{EntityView, LoginResult, OpcodeView, VerbView, WovRpcServer};

/// Everything one running gateway needs, shared by every connection.
///
/// Session map mutations are brief reads/writes under [`RwLock`], never
/// held across an `.await` that could block on a verb running.
///
/// `interpreter` (rather than a standalone `OpcodeRegistry`) is the source
/// `get_opcodes` reads from: it is the same registry verbs actually run
/// against, so introspection can never drift from what `execute` sees.
pub struct RpcImpl {
    pub(crate) world: Arc<dyn World>,
    pub(crate) dispatcher: Arc<Dispatcher>,
    pub(crate) interpreter: Arc<Interpreter>,
    pub(crate) plugins: Arc<PluginRegistry>,
    pub(crate) events: EventBus,
    pub(crate) sessions: Arc<RwLock<HashMap<SessionId, Session>>>,
    pub(crate) config: Config,
}

impl RpcImpl {
    #[must_use]
    pub fn new(world: Arc<dyn World>, dispatcher: Arc<Dispatcher>, interpreter: Arc<Interpreter>, plugins: Arc<PluginRegistry>, events: EventBus, config: Config) -> Self {
        Self { world, dispatcher, interpreter, plugins, events, sessions: Arc::new(RwLock::new(HashMap::new())), config }
    }

    pub(crate) async fn bound_entity(&self, session_id: SessionId) -> Option<EntityId> {
        let sessions = self.sessions.read().await;
        sessions.get(&session_id).map(|s| s.entity_id)
    }
}

#[async_trait]
impl WovRpcServer for RpcImpl {
    async fn login(&self, entity_id: Option<EntityId>) -> Result<LoginResult, ErrorObjectOwned> {
        self.login_impl(entity_id).await
    }

    async fn execute(&self, session_id: SessionId, verb_name: String, args: Vec<Json>) -> Result<Json, ErrorObjectOwned> {
        self.execute_impl(session_id, verb_name, args).await
    }

    async fn get_opcodes(&self) -> Result<Vec<OpcodeView>, ErrorObjectOwned> {
        self.get_opcodes_impl().await
    }

    async fn get_entities(&self, ids: Vec<EntityId>) -> Result<Vec<EntityView>, ErrorObjectOwned> {
        self.get_entities_impl(ids).await
    }

    async fn get_verb(&self, entity_id: EntityId, name: String) -> Result<Option<VerbView>, ErrorObjectOwned> {
        self.get_verb_impl(entity_id, name).await
    }

    async fn update_verb(&self, entity_id: EntityId, name: String, source: wov_core::Ast) -> Result<(), ErrorObjectOwned> {
        self.update_verb_impl(entity_id, name, source).await
    }

    async fn plugin_rpc(&self, method: String, params: Json) -> Result<Json, ErrorObjectOwned> {
        self.plugin_rpc_impl(method, params).await
    }

    async fn ping(&self) -> Result<String, ErrorObjectOwned> {
        Ok("pong".to_string())
    }

    async fn subscribe_events(&self, pending: PendingSubscriptionSink, session_id: SessionId) -> SubscriptionResult {
        self.subscribe_events_impl(pending, session_id).await
    }
}
