//! `login`: binds a session to an entity, minting a fresh Guest when the
//! requested entity is omitted or unknown.

use jsonrpsee::types::ErrorObjectOwned;
use tracing::info;
use wov_core::{EntityId, Session, SessionId, Value, World};

use super::RpcImpl;
use crate::rpc::{to_rpc_error, LoginResult};

impl RpcImpl {
    pub(super) async fn login_impl(&self, entity_id: Option<EntityId>) -> Result<LoginResult, ErrorObjectOwned> {
        let bound = match entity_id {
            Some(id) if self.world.get_entity(id).await.is_ok() => id,
            _ => self.spawn_guest().await.map_err(to_rpc_error)?,
        };

        let session_id = SessionId::new();
        let session = Session { id: session_id, entity_id: bound, connected_at: chrono::Utc::now() };
        self.sessions.write().await.insert(session_id, session);

        info!(%session_id, entity_id = %bound, "session bound");
        Ok(LoginResult { session_id, entity_id: bound })
    }

    /// Create a fresh Guest entity, attach the well-known Player prototype,
    /// and place it in the well-known Lobby.
    async fn spawn_guest(&self) -> wov_core::Result<EntityId> {
        let guest = self.world.create_entity("Guest", None).await?;
        self.world.set_prototype(guest.id, Some(self.config.player_prototype_id)).await?;
        self.world.set_entity_prop(guest.id, "location", Value::int(self.config.lobby_id.0)).await?;
        Ok(guest.id)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use wov_capabilities::CapabilityKernel;
    use wov_core::{Config, World};
    use wov_dispatch::{Dispatcher, WorldImpl};
    use wov_events::EventBus;
    use wov_interpreter::Interpreter;
    use wov_plugins::PluginRegistry;
    use wov_repository::Repository;

    use super::super::RpcImpl;

    async fn harness() -> RpcImpl {
        let repo = Arc::new(Repository::connect_memory().await.unwrap());
        let capabilities = Arc::new(CapabilityKernel::new(repo.clone()));
        let events = EventBus::new();
        let fs_root = std::env::temp_dir().join("wov-gateway-session-tests");
        let config = Config::from_env();
        let world_impl = Arc::new(WorldImpl::new(repo.clone(), capabilities, events.clone(), fs_root, config.bot_id).await.unwrap());
        let world: Arc<dyn World> = world_impl.clone();
        let interpreter = Arc::new(Interpreter::new(wov_opcodes::standard_registry()));
        world_impl.wire(world.clone(), interpreter.clone());
        let dispatcher = Arc::new(Dispatcher::new(world.clone(), interpreter.clone(), config.clone()));
        let plugins = Arc::new(PluginRegistry::new());
        RpcImpl::new(world, dispatcher, interpreter, plugins, events, config)
    }

    #[tokio::test]
    async fn login_without_an_entity_id_creates_a_bound_guest() {
        let rpc = harness().await;
        let result = rpc.login_impl(None).await.unwrap();

        let guest = rpc.world.get_entity(result.entity_id).await.unwrap();
        assert_eq!(guest.name, "Guest");
        assert_eq!(guest.prototype_id, Some(rpc.config.player_prototype_id));
        assert_eq!(guest.props.get("location"), Some(&wov_core::Value::int(rpc.config.lobby_id.0)));

        let bound = rpc.bound_entity(result.session_id).await;
        assert_eq!(bound, Some(result.entity_id));
    }

    #[tokio::test]
    async fn login_with_an_unknown_entity_id_falls_back_to_a_guest() {
        let rpc = harness().await;
        let result = rpc.login_impl(Some(wov_core::EntityId(999_999))).await.unwrap();
        assert_ne!(result.entity_id, wov_core::EntityId(999_999));
    }

    #[tokio::test]
    async fn login_with_a_known_entity_id_binds_to_it_directly() {
        let rpc = harness().await;
        let alice = rpc.world.create_entity("Alice", None).await.unwrap();

        let result = rpc.login_impl(Some(alice.id)).await.unwrap();
        assert_eq!(result.entity_id, alice.id);
    }
}
