//! Plugin registration errors.

use thiserror::Error;

use crate::plugin::PluginId;

#[derive(Debug, Error)]
pub enum PluginError {
    #[error("plugin already registered: {0}")]
    AlreadyRegistered(PluginId),

    #[error("plugin not found: {0}")]
    NotFound(PluginId),

    #[error("invalid plugin id: {0}")]
    InvalidId(String),

    #[error("plugin {plugin} declared opcode {opcode:?} outside the plugin.* namespace")]
    OpcodeOutsideNamespace { plugin: PluginId, opcode: &'static str },

    #[error("opcode {0:?} already registered by another plugin")]
    OpcodeAlreadyRegistered(&'static str),

    #[error("RPC method {0:?} already registered by another plugin")]
    MethodAlreadyRegistered(String),
}

pub type PluginResult<T> = std::result::Result<T, PluginError>;

impl From<PluginError> for wov_core::WovError {
    fn from(e: PluginError) -> Self {
        match e {
            PluginError::NotFound(_) => wov_core::WovError::MethodNotFound(e.to_string()),
            other => wov_core::WovError::InvalidRequest(other.to_string()),
        }
    }
}
