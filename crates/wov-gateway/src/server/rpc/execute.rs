//! `execute`: runs a verb on the session's bound entity and flushes any
//! accumulated warnings as `message {type:"info"}` notifications before
//! returning — warnings accumulate through nested calls and are flushed
//! only once, at the root invocation's exit.

use jsonrpsee::types::ErrorObjectOwned;
use serde_json::Value as Json;
use wov_core::{SessionId, Value, World};

use super::RpcImpl;
use crate::rpc::{session_not_found, to_rpc_error};

impl RpcImpl {
    pub(super) async fn execute_impl(&self, session_id: SessionId, verb_name: String, args: Vec<Json>) -> Result<Json, ErrorObjectOwned> {
        let entity_id = self.bound_entity(session_id).await.ok_or_else(|| session_not_found(session_id))?;
        let args: Vec<Value> = args.iter().map(Value::from).collect();

        let (result, warnings) = self.dispatcher.execute(entity_id, entity_id, &verb_name, args).await.map_err(to_rpc_error)?;

        for warning in warnings {
            self.world.publish(entity_id, "message", serde_json::json!({ "text": warning, "type": "info" }));
        }

        Ok(result.into())
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
        let fs_root = std::env::temp_dir().join("wov-gateway-execute-tests");
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
    async fn execute_on_an_unbound_session_is_session_not_found() {
        let rpc = harness().await;
        let err = rpc.execute_impl(wov_core::SessionId::new(), "describe".to_string(), vec![]).await.unwrap_err();
        assert_eq!(err.code(), -32001);
    }

    #[tokio::test]
    async fn execute_runs_the_verb_and_returns_its_result() {
        let rpc = harness().await;
        let rock = rpc.world.create_entity("Rock", None).await.unwrap();
        rpc.world.set_verb(rock.id, "describe", Ast::literal(Value::str("a rock"))).await.unwrap();
        let login = rpc.login_impl(Some(rock.id)).await.unwrap();

        let result = rpc.execute_impl(login.session_id, "describe".to_string(), vec![]).await.unwrap();
        assert_eq!(result, serde_json::json!("a rock"));
    }

    #[tokio::test]
    async fn execute_flushes_accumulated_warnings_as_an_info_message() {
        let rpc = harness().await;
        let rock = rpc.world.create_entity("Rock", None).await.unwrap();
        let ast = Ast::call("warn", vec![Ast::literal(Value::str("crumbling"))]);
        rpc.world.set_verb(rock.id, "crumble", ast).await.unwrap();
        let login = rpc.login_impl(Some(rock.id)).await.unwrap();

        let mut receiver = rpc.events.subscribe();
        rpc.execute_impl(login.session_id, "crumble".to_string(), vec![]).await.unwrap();

        let notification = receiver.recv_for(rock.id).await.unwrap();
        assert_eq!(notification.method, "message");
        assert_eq!(notification.params["text"], "crumbling");
        assert_eq!(notification.params["type"], "info");
    }
}
