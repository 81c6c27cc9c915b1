//! `get_opcodes`, `get_entities`, `get_verb`, `update_verb`: read and edit
//! the world's static shape rather than running anything.

use jsonrpsee::types::ErrorObjectOwned;
use wov_core::{Ast, EntityId, World};

use super::RpcImpl;
use crate::rpc::{to_rpc_error, EntityView, OpcodeView, VerbView};

impl RpcImpl {
    pub(super) async fn get_opcodes_impl(&self) -> Result<Vec<OpcodeView>, ErrorObjectOwned> {
        Ok(self.interpreter.registry().all_metadata())
    }

    /// Entities that do not exist are silently omitted — `get_entities` has
    /// no defined error behavior for a missing id, and the repository has
    /// no batch lookup to distinguish "missing" from "not requested".
    pub(super) async fn get_entities_impl(&self, ids: Vec<EntityId>) -> Result<Vec<EntityView>, ErrorObjectOwned> {
        let mut out = Vec::with_capacity(ids.len());
        for id in ids {
            if let Ok(entity) = self.world.get_entity(id).await {
                out.push(EntityView {
                    id: entity.id,
                    name: entity.name,
                    prototype_id: entity.prototype_id,
                    owner_id: entity.owner_id,
                    props: entity.props.into_iter().map(|(k, v)| (k, v.into())).collect(),
                });
            }
        }
        Ok(out)
    }

    pub(super) async fn get_verb_impl(&self, entity_id: EntityId, name: String) -> Result<Option<VerbView>, ErrorObjectOwned> {
        let verb = self.world.get_verb(entity_id, &name).await.map_err(to_rpc_error)?;
        Ok(verb.map(|v| VerbView { name: v.name, source: v.source }))
    }

    pub(super) async fn update_verb_impl(&self, entity_id: EntityId, name: String, source: Ast) -> Result<(), ErrorObjectOwned> {
        self.world.set_verb(entity_id, &name, source).await.map_err(to_rpc_error)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use wov_capabilities::CapabilityKernel;
    use wov_core::{Ast, Config, Value, World};
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
        let fs_root = std::env::temp_dir().join("wov-gateway-introspect-tests");
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
    async fn get_opcodes_lists_every_standard_opcode() {
        let rpc = harness().await;
        let opcodes = rpc.get_opcodes_impl().await.unwrap();
        assert!(opcodes.iter().any(|o| o.name == "send"));
        assert!(opcodes.iter().any(|o| o.name == "create"));
    }

    #[tokio::test]
    async fn get_entities_omits_unknown_ids_rather_than_erroring() {
        let rpc = harness().await;
        let rock = rpc.world.create_entity("Rock", None).await.unwrap();

        let views = rpc.get_entities_impl(vec![rock.id, wov_core::EntityId(999_999)]).await.unwrap();
        assert_eq!(views.len(), 1);
        assert_eq!(views[0].name, "Rock");
    }

    #[tokio::test]
    async fn update_verb_then_get_verb_round_trips_the_source() {
        let rpc = harness().await;
        let rock = rpc.world.create_entity("Rock", None).await.unwrap();
        let source = Ast::literal(Value::str("a rock"));

        rpc.update_verb_impl(rock.id, "describe".to_string(), source.clone()).await.unwrap();
        let fetched = rpc.get_verb_impl(rock.id, "describe".to_string()).await.unwrap().unwrap();

        assert_eq!(fetched.name, "describe");
        match fetched.source {
            Ast::Literal { value } => assert_eq!(value, Value::str("a rock")),
            Ast::Call { .. } => panic!("expected a literal node"),
        }
    }

    #[tokio::test]
    async fn get_verb_for_a_name_that_does_not_exist_returns_none() {
        let rpc = harness().await;
        let rock = rpc.world.create_entity("Rock", None).await.unwrap();
        let fetched = rpc.get_verb_impl(rock.id, "nonexistent".to_string()).await.unwrap();
        assert!(fetched.is_none());
    }
}
