//! Plugin identity and the trait a host-side plugin implements.
//!
//! A plugin here is trusted code compiled into the server binary: its job
//! is to contribute extra opcodes under the `plugin.*` namespace and extra
//! RPC methods reachable through the gateway's `plugin_rpc` request, not to
//! run in a sandbox of its own — the interpreter's capability kernel is the
//! only sandbox this system has, and plugins sit outside it, on the host
//! side.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use wov_opcodes::Opcode;

use crate::error::{PluginError, PluginResult};

/// Stable, human-readable plugin identifier: lowercase alphanumeric and
/// hyphens, matching the convention opcode and RPC method names borrow
/// their `plugin.<id>.*` prefix from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PluginId(String);

impl PluginId {
    pub fn new(id: impl Into<String>) -> PluginResult<Self> {
        let id = id.into();
        Self::validate(&id)?;
        Ok(Self(id))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn validate(id: &str) -> PluginResult<()> {
        if id.is_empty() {
            return Err(PluginError::InvalidId("plugin id must not be empty".into()));
        }
        if !id.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-') {
            return Err(PluginError::InvalidId(format!("plugin id must be lowercase alphanumeric/hyphen, got: {id}")));
        }
        if id.starts_with('-') || id.ends_with('-') {
            return Err(PluginError::InvalidId(format!("plugin id must not start or end with a hyphen, got: {id}")));
        }
        Ok(())
    }
}

impl fmt::Display for PluginId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A host-side RPC method a plugin exposes through `plugin_rpc {method,
/// params}`. Unlike opcodes, handlers run outside the interpreter entirely
/// — no gas budget, no capability check — so a plugin is trusted exactly
/// as much as the rest of the server binary it is compiled into.
#[async_trait]
pub trait PluginRpcHandler: Send + Sync {
    /// Fully qualified method name, e.g. `"plugin.weather.forecast"`.
    fn method(&self) -> &'static str;

    async fn handle(&self, params: serde_json::Value) -> wov_core::Result<serde_json::Value>;
}

/// A registered plugin: a named bundle of opcodes and RPC handlers.
pub trait Plugin: Send + Sync {
    fn id(&self) -> &PluginId;

    /// Opcodes this plugin contributes. Every one of their
    /// [`Opcode::name`]s must start with `"plugin."` — enforced by
    /// [`crate::registry::PluginRegistry::register`], not by the plugin
    /// author.
    fn opcodes(&self) -> Vec<Arc<dyn Opcode>> {
        Vec::new()
    }

    /// RPC handlers this plugin contributes.
    fn rpc_handlers(&self) -> Vec<Arc<dyn PluginRpcHandler>> {
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_ids_accept_lowercase_alphanumeric_and_hyphens() {
        assert!(PluginId::new("weather").is_ok());
        assert!(PluginId::new("weather-forecast-2").is_ok());
    }

    #[test]
    fn invalid_ids_are_rejected() {
        assert!(PluginId::new("").is_err());
        assert!(PluginId::new("Weather").is_err());
        assert!(PluginId::new("weather_forecast").is_err());
        assert!(PluginId::new("-weather").is_err());
        assert!(PluginId::new("weather-").is_err());
    }

    #[test]
    fn display_matches_the_inner_string() {
        let id = PluginId::new("weather").unwrap();
        assert_eq!(id.to_string(), "weather");
    }
}
