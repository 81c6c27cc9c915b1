//! `SCHEMAFULL` table definitions for the four core entity kinds plus the
//! two opaque tables a session/room bridge depends on as a fixed contract
//! (`channel_maps`, `active_sessions`) — the core provisions and stores
//! them but never reads their fields itself.

use wov_storage::{Database, StorageResult};

// Each table keeps SurrealDB's own record `id` as an opaque internal
// pointer and carries the business's monotonic integer id as a plain
// indexed field (`eid`/`vid`/`cid`/`tid`) so the business id never has to
// be parsed out of a `Thing`.
const SCHEMA: &str = r#"
DEFINE TABLE entities SCHEMAFULL;
DEFINE FIELD eid ON entities TYPE int;
DEFINE FIELD name ON entities TYPE string;
DEFINE FIELD prototype_id ON entities TYPE option<int>;
DEFINE FIELD owner_id ON entities TYPE option<int>;
DEFINE FIELD props ON entities TYPE object;
DEFINE FIELD created_at ON entities TYPE datetime;
DEFINE INDEX entities_eid ON entities FIELDS eid UNIQUE;

DEFINE TABLE verbs SCHEMAFULL;
DEFINE FIELD vid ON verbs TYPE int;
DEFINE FIELD entity_id ON verbs TYPE int;
DEFINE FIELD name ON verbs TYPE string;
DEFINE FIELD source ON verbs TYPE object;
DEFINE FIELD permissions ON verbs TYPE option<array<string>>;
DEFINE FIELD created_at ON verbs TYPE datetime;
DEFINE INDEX verbs_entity_name ON verbs FIELDS entity_id, name UNIQUE;

DEFINE TABLE capabilities SCHEMAFULL;
DEFINE FIELD cid ON capabilities TYPE string;
DEFINE FIELD owner_id ON capabilities TYPE int;
DEFINE FIELD type ON capabilities TYPE string;
DEFINE FIELD params ON capabilities TYPE object;
DEFINE FIELD created_at ON capabilities TYPE datetime;
DEFINE INDEX capabilities_cid ON capabilities FIELDS cid UNIQUE;

DEFINE TABLE scheduled_tasks SCHEMAFULL;
DEFINE FIELD tid ON scheduled_tasks TYPE string;
DEFINE FIELD entity_id ON scheduled_tasks TYPE int;
DEFINE FIELD verb ON scheduled_tasks TYPE string;
DEFINE FIELD args ON scheduled_tasks TYPE array;
DEFINE FIELD execute_at ON scheduled_tasks TYPE datetime;
DEFINE INDEX scheduled_tasks_tid ON scheduled_tasks FIELDS tid UNIQUE;

DEFINE TABLE channel_maps SCHEMAFULL;
DEFINE FIELD channel_id ON channel_maps TYPE string;
DEFINE FIELD room_id ON channel_maps TYPE int;

DEFINE TABLE active_sessions SCHEMAFULL;
DEFINE FIELD discord_id ON active_sessions TYPE string;
DEFINE FIELD channel_id ON active_sessions TYPE string;
DEFINE FIELD entity_id ON active_sessions TYPE int;
"#;

/// Apply the schema. Idempotent: `DEFINE ... SCHEMAFULL` overwrites any
/// prior definition of the same name.
pub async fn init(db: &Database) -> StorageResult<()> {
    db.client()
        .query(SCHEMA)
        .await
        .map_err(|e| wov_storage::StorageError::Internal(e.to_string()))?;
    Ok(())
}
