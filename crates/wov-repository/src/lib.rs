//! Typed CRUD over [`wov_storage::Database`]: entities, verbs, capabilities,
//! scheduled tasks, and prototype-chain resolution. The opaque
//! `channel_maps`/`active_sessions` tables a session/room bridge depends on
//! are provisioned by [`schema::init`] but never read by the core.

#![deny(unsafe_code)]

pub mod capability;
pub mod entity;
pub mod error;
pub mod schema;
pub mod task;
pub mod verb;

pub use entity::MAX_PROTOTYPE_HOPS;
pub use error::{RepoError, RepoResult};
use wov_storage::Database;

/// The repository: one per running server, wrapping a single [`Database`]
/// connection.
pub struct Repository {
    db: Database,
}

impl Repository {
    /// Connect to an embedded `SurrealDB`/`SurrealKV` store at `path` and
    /// apply the schema.
    pub async fn connect_embedded(path: &str) -> RepoResult<Self> {
        let db = Database::connect_embedded(path).await?;
        schema::init(&db).await?;
        Ok(Self { db })
    }

    /// Connect to an in-memory store, for tests.
    pub async fn connect_memory() -> RepoResult<Self> {
        let db = Database::connect_memory().await?;
        schema::init(&db).await?;
        Ok(Self { db })
    }

    /// The current maximum `eid` across all entities, used to seed the
    /// startup [`wov_core::IdSequence`].
    pub async fn max_entity_id(&self) -> RepoResult<i64> {
        #[derive(serde::Deserialize)]
        struct Row {
            m: Option<i64>,
        }
        let mut res = self.db.client().query("SELECT math::max(eid) AS m FROM entities").await?;
        let rows: Vec<Row> = res.take(0)?;
        Ok(rows.into_iter().next().and_then(|r| r.m).unwrap_or(0))
    }

    /// The current maximum `vid` across all verbs, used to seed the
    /// startup verb [`wov_core::IdSequence`].
    pub async fn max_verb_id(&self) -> RepoResult<i64> {
        #[derive(serde::Deserialize)]
        struct Row {
            m: Option<i64>,
        }
        let mut res = self.db.client().query("SELECT math::max(vid) AS m FROM verbs").await?;
        let rows: Vec<Row> = res.take(0)?;
        Ok(rows.into_iter().next().and_then(|r| r.m).unwrap_or(0))
    }
}
