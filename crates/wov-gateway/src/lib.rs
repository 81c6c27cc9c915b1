//! The JSON-RPC-over-WebSocket session layer: login, execute,
//! introspection, the plugin bridge, and notification fanout.
//!
//! A jsonrpsee `#[rpc]` trait in `rpc.rs`, a `RpcImpl` delegating to
//! focused submodules under `server::rpc`, and a `startup::serve` entry
//! point the binary crate calls.

#![deny(unsafe_code)]

pub mod rpc;
pub mod server;

pub use rpc::WovRpcServer;
pub use server::{serve, RpcImpl};
