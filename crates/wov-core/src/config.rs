//! Environment-driven server configuration.
//!
//! No file layer or profile precedence chain — this system has only env
//! vars and built-in defaults in scope.

use crate::ids::EntityId;

/// Server-wide configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Port the JSON-RPC-over-WebSocket server binds to.
    pub port: u16,
    /// Filesystem path for the embedded `surrealkv` store.
    pub db_path: String,
    /// Default interpreter gas budget per verb call.
    pub gas_limit: u64,
    /// Scheduler tick interval, in milliseconds.
    pub scheduler_tick_ms: u64,
    /// Well-known entity id representing the system/root account.
    pub system_id: EntityId,
    /// Well-known entity id representing the automation/bot account used
    /// for `sudo`-forwarded calls.
    pub bot_id: EntityId,
    /// First id handed out to user-created entities.
    pub entity_base_id: EntityId,
    /// Well-known entity id of the default spawn location.
    pub lobby_id: EntityId,
    /// Well-known entity id of the prototype a fresh Guest entity is given
    /// when a session logs in without an `entityId`.
    pub player_prototype_id: EntityId,
}

impl Config {
    /// Load configuration from environment variables, falling back to
    /// documented defaults for anything unset.
    pub fn from_env() -> Self {
        Self {
            port: env_parsed("PORT", 8080),
            db_path: std::env::var("DB_PATH").unwrap_or_else(|_| "./data/wov.db".to_string()),
            gas_limit: env_parsed("GAS_LIMIT", 10_000),
            scheduler_tick_ms: env_parsed("SCHEDULER_TICK_MS", 250),
            system_id: EntityId(env_parsed("SYSTEM_ID", 1)),
            bot_id: EntityId(env_parsed("BOT_ID", 2)),
            entity_base_id: EntityId(env_parsed("ENTITY_BASE_ID", 100)),
            lobby_id: EntityId(env_parsed("LOBBY_ID", 3)),
            player_prototype_id: EntityId(env_parsed("PLAYER_PROTOTYPE_ID", 4)),
        }
    }
}

fn env_parsed<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        // Run in isolation from other env-mutating tests in this crate.
        for key in ["PORT", "DB_PATH", "GAS_LIMIT", "SCHEDULER_TICK_MS", "SYSTEM_ID", "BOT_ID", "ENTITY_BASE_ID", "LOBBY_ID", "PLAYER_PROTOTYPE_ID"] {
            std::env::remove_var(key);
        }
        let cfg = Config::from_env();
        assert_eq!(cfg.port, 8080);
        assert_eq!(cfg.gas_limit, 10_000);
        assert_eq!(cfg.scheduler_tick_ms, 250);
        assert_eq!(cfg.entity_base_id, EntityId(100));
    }
}
