//! Registry of loaded plugins: merges their opcodes into an
//! [`OpcodeRegistry`] and dispatches `plugin_rpc` calls to their handlers.
//! Register/unregister by id, cross-plugin lookup by qualified name.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::info;
use wov_opcodes::OpcodeRegistry;

use crate::error::{PluginError, PluginResult};
use crate::plugin::{Plugin, PluginId, PluginRpcHandler};

pub struct PluginRegistry {
    plugins: HashMap<PluginId, Arc<dyn Plugin>>,
    rpc_handlers: HashMap<String, Arc<dyn PluginRpcHandler>>,
}

impl PluginRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self { plugins: HashMap::new(), rpc_handlers: HashMap::new() }
    }

    /// Register a plugin: validates every opcode name is under
    /// `plugin.*`, then checks for collisions against already-registered
    /// plugins before committing anything.
    ///
    /// # Errors
    ///
    /// Returns an error (and registers nothing) if the plugin id is
    /// already taken, an opcode name falls outside `plugin.*`, or an
    /// opcode or RPC method name collides with one already registered.
    pub fn register(&mut self, plugin: Arc<dyn Plugin>) -> PluginResult<()> {
        let id = plugin.id().clone();
        if self.plugins.contains_key(&id) {
            return Err(PluginError::AlreadyRegistered(id));
        }

        for opcode in plugin.opcodes() {
            let name = opcode.name();
            if !name.starts_with("plugin.") {
                return Err(PluginError::OpcodeOutsideNamespace { plugin: id, opcode: name });
            }
        }
        for handler in plugin.rpc_handlers() {
            if self.rpc_handlers.contains_key(handler.method()) {
                return Err(PluginError::MethodAlreadyRegistered(handler.method().to_string()));
            }
        }

        for handler in plugin.rpc_handlers() {
            self.rpc_handlers.insert(handler.method().to_string(), handler);
        }
        info!(plugin_id = %id, "registered plugin");
        self.plugins.insert(id, plugin);
        Ok(())
    }

    pub fn unregister(&mut self, id: &PluginId) -> PluginResult<()> {
        let plugin = self.plugins.remove(id).ok_or_else(|| PluginError::NotFound(id.clone()))?;
        for handler in plugin.rpc_handlers() {
            self.rpc_handlers.remove(handler.method());
        }
        info!(plugin_id = %id, "unregistered plugin");
        Ok(())
    }

    #[must_use]
    pub fn list(&self) -> Vec<&PluginId> {
        self.plugins.keys().collect()
    }

    /// Merge every registered plugin's opcodes into `target` (typically
    /// `wov_opcodes::standard_registry()`'s result, before the registry is
    /// handed to the interpreter).
    ///
    /// # Errors
    ///
    /// Returns an error if a plugin opcode's name collides with one
    /// already present in `target` (including a builtin).
    pub fn install_opcodes(&self, target: &mut OpcodeRegistry) -> PluginResult<()> {
        for plugin in self.plugins.values() {
            for opcode in plugin.opcodes() {
                if target.contains(opcode.name()) {
                    return Err(PluginError::OpcodeAlreadyRegistered(opcode.name()));
                }
                target.register_arc(opcode);
            }
        }
        Ok(())
    }

    /// Dispatch a `plugin_rpc {method, params}` request to the handler
    /// registered for `method`.
    pub async fn dispatch_rpc(&self, method: &str, params: serde_json::Value) -> wov_core::Result<serde_json::Value> {
        let handler = self.rpc_handlers.get(method).ok_or_else(|| wov_core::WovError::MethodNotFound(method.to_string()))?;
        handler.handle(params).await
    }
}

impl Default for PluginRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use wov_core::ast::Ast;
    use wov_core::context::Context;
    use wov_core::value::Value;
    use wov_opcodes::{meta::Evaluation, Evaluator, OpcodeMeta};

    use super::*;

    struct EchoOpcode;

    #[async_trait]
    impl wov_opcodes::Opcode for EchoOpcode {
        fn name(&self) -> &'static str {
            "plugin.echo.say"
        }
        fn metadata(&self) -> OpcodeMeta {
            OpcodeMeta { name: "plugin.echo.say", description: "echoes its argument", category: wov_opcodes::meta::Category::Data, evaluation: Evaluation::Eager }
        }
        async fn execute(&self, ctx: &mut Context, args: &[Ast], eval: &dyn Evaluator) -> wov_core::Result<Value> {
            let values = wov_opcodes::eval_all(ctx, args, eval).await?;
            Ok(values.into_iter().next().unwrap_or(Value::Null))
        }
    }

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
        fn opcodes(&self) -> Vec<Arc<dyn wov_opcodes::Opcode>> {
            vec![Arc::new(EchoOpcode)]
        }
        fn rpc_handlers(&self) -> Vec<Arc<dyn PluginRpcHandler>> {
            vec![Arc::new(PingHandler)]
        }
    }

    #[test]
    fn registering_a_plugin_installs_its_opcodes_under_the_plugin_namespace() {
        let mut registry = PluginRegistry::new();
        registry.register(Arc::new(EchoPlugin)).unwrap();

        let mut opcodes = wov_opcodes::standard_registry();
        registry.install_opcodes(&mut opcodes).unwrap();
        assert!(opcodes.contains("plugin.echo.say"));
    }

    #[test]
    fn registering_twice_under_the_same_id_fails() {
        let mut registry = PluginRegistry::new();
        registry.register(Arc::new(EchoPlugin)).unwrap();
        let err = registry.register(Arc::new(EchoPlugin)).unwrap_err();
        assert!(matches!(err, PluginError::AlreadyRegistered(_)));
    }

    #[tokio::test]
    async fn plugin_rpc_dispatches_to_the_registered_handler() {
        let mut registry = PluginRegistry::new();
        registry.register(Arc::new(EchoPlugin)).unwrap();

        let result = registry.dispatch_rpc("plugin.echo.ping", serde_json::json!({"hello": "world"})).await.unwrap();
        assert_eq!(result, serde_json::json!({"hello": "world"}));
    }

    #[tokio::test]
    async fn plugin_rpc_to_an_unregistered_method_is_method_not_found() {
        let registry = PluginRegistry::new();
        let err = registry.dispatch_rpc("plugin.nope.go", serde_json::json!({})).await.unwrap_err();
        assert!(matches!(err, wov_core::WovError::MethodNotFound(_)));
    }

    #[test]
    fn an_opcode_outside_the_plugin_namespace_is_rejected_at_register_time() {
        struct BadOpcode;
        #[async_trait]
        impl wov_opcodes::Opcode for BadOpcode {
            fn name(&self) -> &'static str {
                "not_namespaced"
            }
            fn metadata(&self) -> OpcodeMeta {
                OpcodeMeta { name: "not_namespaced", description: "bad", category: wov_opcodes::meta::Category::Data, evaluation: Evaluation::Eager }
            }
            async fn execute(&self, _ctx: &mut Context, _args: &[Ast], _eval: &dyn Evaluator) -> wov_core::Result<Value> {
                Ok(Value::Null)
            }
        }
        struct BadPlugin;
        impl Plugin for BadPlugin {
            fn id(&self) -> &PluginId {
                static ID: std::sync::OnceLock<PluginId> = std::sync::OnceLock::new();
                ID.get_or_init(|| PluginId::new("bad").unwrap())
            }
            fn opcodes(&self) -> Vec<Arc<dyn wov_opcodes::Opcode>> {
                vec![Arc::new(BadOpcode)]
            }
        }

        let mut registry = PluginRegistry::new();
        let err = registry.register(Arc::new(BadPlugin)).unwrap_err();
        assert!(matches!(err, PluginError::OpcodeOutsideNamespace { .. }));
    }

    #[test]
    fn unregistering_removes_its_rpc_handlers() {
        let mut registry = PluginRegistry::new();
        registry.register(Arc::new(EchoPlugin)).unwrap();
        let id = PluginId::new("echo").unwrap();
        registry.unregister(&id).unwrap();

        assert!(registry.list().is_empty());
    }
}
