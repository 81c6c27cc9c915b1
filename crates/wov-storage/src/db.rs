//! `SurrealDB` query engine wrapper — the typed-repository tier.
//!
//! In embedded mode this uses `SurrealKV` as its storage engine
//! (`surrealkv://path`); tests use the in-memory engine (`mem://`).

use crate::error::{StorageError, StorageResult};

/// `SurrealDB` connection, scoped to the `wov`/`main` namespace/database pair.
pub struct Database {
    inner: surrealdb::Surreal<surrealdb::engine::any::Any>,
}

impl Database {
    /// Connect to an embedded `SurrealDB` with `SurrealKV` storage at `path`.
    pub async fn connect_embedded(path: &str) -> StorageResult<Self> {
        let endpoint = format!("surrealkv://{path}");
        let db: surrealdb::Surreal<surrealdb::engine::any::Any> = surrealdb::Surreal::init();
        db.connect(&endpoint).await.map_err(|e| StorageError::Connection(e.to_string()))?;
        db.use_ns("wov").use_db("main").await.map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(Self { inner: db })
    }

    /// Connect to an in-memory `SurrealDB` instance, for tests.
    pub async fn connect_memory() -> StorageResult<Self> {
        let db: surrealdb::Surreal<surrealdb::engine::any::Any> = surrealdb::Surreal::init();
        db.connect("mem://").await.map_err(|e| StorageError::Connection(e.to_string()))?;
        db.use_ns("wov").use_db("test").await.map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(Self { inner: db })
    }

    /// Direct access to the underlying client for queries the typed
    /// repository layer doesn't wrap.
    #[must_use]
    pub fn client(&self) -> &surrealdb::Surreal<surrealdb::engine::any::Any> {
        &self.inner
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn connects_to_memory_engine() {
        let db = Database::connect_memory().await.unwrap();
        let mut res = db.client().query("RETURN 1").await.unwrap();
        let val: Option<i64> = res.take(0).unwrap();
        assert_eq!(val, Some(1));
    }
}
