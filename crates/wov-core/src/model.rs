//! Persisted domain types: entities, verbs, capabilities, scheduled tasks,
//! sessions.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{CapabilityId, EntityId, SessionId, TaskId, VerbId};
use crate::value::Value;

/// A single addressable object in the world: a room, a player, a prototype,
/// an item — anything with props and a prototype chain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entity {
    pub id: EntityId,
    /// `None` for the root of a prototype chain.
    pub prototype_id: Option<EntityId>,
    pub name: String,
    pub props: BTreeMap<String, Value>,
    /// Used only for policy defaults; never bypasses capability checks.
    pub owner_id: Option<EntityId>,
    pub created_at: DateTime<Utc>,
}

impl Entity {
    /// A fresh entity with no prototype and empty props, ready to be
    /// assigned an id and persisted.
    #[must_use]
    pub fn new(id: EntityId, name: impl Into<String>, owner_id: Option<EntityId>) -> Self {
        Self {
            id,
            prototype_id: None,
            name: name.into(),
            props: BTreeMap::new(),
            owner_id,
            created_at: Utc::now(),
        }
    }
}

/// A named, callable piece of code attached to an entity. Unique per
/// `(entity_id, name)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Verb {
    pub id: VerbId,
    pub entity_id: EntityId,
    pub name: String,
    pub source: crate::ast::Ast,
    /// Reserved for future use; not consulted by the dispatcher today.
    pub permissions: Option<Vec<String>>,
    pub created_at: DateTime<Utc>,
}

/// An opaque, unforgeable token granting its holder one specific permission.
///
/// Holding a capability is necessary and sufficient to invoke the operation
/// it gates, subject to the kernel's parameter-match predicate — see
/// `wov-capabilities::kernel::check`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Capability {
    pub id: CapabilityId,
    pub owner_id: EntityId,
    /// The permission type name, e.g. `"sys.create"`, `"entity.control"`,
    /// `"fs.write"`.
    #[serde(rename = "type")]
    pub cap_type: String,
    /// Free-form parameters narrowing the grant, e.g. `{"path": "/tmp"}`.
    /// A `"*"` key mapping to `true` is the documented wildcard shortcut
    /// that matches any params (see DESIGN.md open question #2).
    pub params: BTreeMap<String, Value>,
    pub created_at: DateTime<Utc>,
}

/// A verb invocation queued to run at or after a future time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduledTask {
    pub id: TaskId,
    pub entity_id: EntityId,
    pub verb: String,
    pub args: Vec<Value>,
    pub execute_at: DateTime<Utc>,
}

/// A live JSON-RPC-over-WebSocket connection bound to one entity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: SessionId,
    pub entity_id: EntityId,
    pub connected_at: DateTime<Utc>,
}
