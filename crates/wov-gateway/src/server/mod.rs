//! Shared server state and startup wiring.

pub mod rpc;
pub mod startup;

pub use rpc::RpcImpl;
pub use startup::serve;
