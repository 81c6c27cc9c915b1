//! `plugin_rpc`: dispatches a `{method, params}` call to a host-compiled
//! plugin's handler.

use jsonrpsee::types::ErrorObjectOwned;
use serde_json::Value as Json;

use super::RpcImpl;
use crate::rpc::to_rpc_error;

impl RpcImpl {
    pub(super) async fn plugin_rpc_impl(&self, method: String, params: Json) -> Result<Json, ErrorObjectOwned> {
        self.plugins.dispatch_rpc(&method, params).await.map_err(to_rpc_error)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use wov_capabilities::CapabilityKernel;
    use wov_core::{Config, World};
    use wov_dispatch::{Dispatcher, WorldImpl};
    use wov_events::EventBus;
    use wov_interpreter::Interpreter;
    use wov_plugins::{Plugin, PluginId, PluginRegistry, PluginRpcHandler};
    use wov_repository::Repository;

    use super::super::RpcImpl;

    struct PingHandler;

    #[async_trait]
    impl PluginRpcHandler for PingHandler {
        fn method(&self) -> &'static str {
            "plugin.echo.ping"
        }
        async fn handle(&self, params: serde_json::Value) -> wov_core::Result<serde_json::Value> {
            Ok(params)
        }
    }

    struct EchoPlugin;

    impl Plugin for EchoPlugin {
        fn id(&self) -> &PluginId {
            static ID: std::sync::OnceLock<PluginId> = std::sync::OnceLock::new();
            ID.get_or_init(|| PluginId::new("echo").unwrap())
        }
        fn rpc_handlers(&self) -> Vec<Arc<dyn PluginRpcHandler>> {
            vec![Arc::new(PingHandler)]
        }
    }

    async fn harness() -> RpcImpl {
        let repo = Arc::new(Repository::connect_memory().await.unwrap());
        let capabilities = Arc::new(CapabilityKernel::new(repo.clone()));
        let events = EventBus::new();
        let fs_root = std::env::temp_dir().join("wov-gateway-plugin-tests");
        let config = Config::from_env();
        let world_impl = Arc::new(WorldImpl::new(repo.clone(), capabilities, events.clone(), fs_root, config.bot_id).await.unwrap());
        let world: Arc<dyn World> = world_impl.clone();
        let interpreter = Arc::new(Interpreter::new(wov_opcodes::standard_registry()));
        world_impl.wire(world.clone(), interpreter.clone());
        let dispatcher = Arc::new(Dispatcher::new(world.clone(), interpreter.clone(), config.clone()));
        let mut plugins = PluginRegistry::new();
        plugins.register(Arc::new(EchoPlugin)).unwrap();
        RpcImpl::new(world, dispatcher, interpreter, Arc::new(plugins), events, config)
    }

    #[tokio::test]
    async fn plugin_rpc_dispatches_to_the_registered_handler() {
        let rpc = harness().await;
        let result = rpc.plugin_rpc_impl("plugin.echo.ping".to_string(), serde_json::json!({"hello": "world"})).await.unwrap();
        assert_eq!(result, serde_json::json!({"hello": "world"}));
    }

    #[tokio::test]
    async fn plugin_rpc_to_an_unregistered_method_is_method_not_found() {
        let rpc = harness().await;
        let err = rpc.plugin_rpc_impl("plugin.nope.go".to_string(), serde_json::json!({})).await.unwrap_err();
        assert_eq!(err.code(), -32601);
    }
}
