//! Binds the jsonrpsee WebSocket server and starts serving: bind, build
//! `RpcImpl`, hand it to `server.start`.

use std::net::SocketAddr;
use std::sync::Arc;

use jsonrpsee::server::{Server, ServerHandle};
use tracing::info;
use wov_core::{Config, Result, WovError, World};
use wov_dispatch::Dispatcher;
use wov_events::EventBus;
use wov_interpreter::Interpreter;
use wov_plugins::PluginRegistry;

use super::RpcImpl;
use crate::rpc::WovRpcServer;

/// Bind `port` (or an ephemeral one if `0`) and start serving the session
/// layer. Returns the bound address and a handle the caller can `.stop()`
/// for graceful shutdown.
pub async fn serve(
    port: u16,
    world: Arc<dyn World>,
    dispatcher: Arc<Dispatcher>,
    interpreter: Arc<Interpreter>,
    plugins: Arc<PluginRegistry>,
    events: EventBus,
    config: Config,
) -> Result<(ServerHandle, SocketAddr)> {
    let server = Server::builder().build(("127.0.0.1", port)).await.map_err(|e| WovError::Internal(format!("failed to bind gateway: {e}")))?;
    let addr = server.local_addr().map_err(|e| WovError::Internal(format!("failed to read bound address: {e}")))?;

    let rpc_impl = RpcImpl::new(world, dispatcher, interpreter, plugins, events, config);
    let handle = server.start(rpc_impl.into_rpc());

    info!(%addr, "gateway listening");
    Ok((handle, addr))
}
