//! Raw namespaced key-value store trait and implementations.
//!
//! Used by the capability kernel for its revoked/used-token sets and by
//! the session layer for anything that doesn't need `wov-repository`'s
//! typed schema. All operations are scoped to a namespace; keys never
//! cross namespace boundaries.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use crate::error::{StorageError, StorageResult};

fn validate_namespace(namespace: &str) -> StorageResult<()> {
    if namespace.is_empty() {
        return Err(StorageError::InvalidKey("namespace must not be empty".into()));
    }
    if namespace.contains('\0') {
        return Err(StorageError::InvalidKey("namespace must not contain null bytes".into()));
    }
    Ok(())
}

fn validate_key(key: &str) -> StorageResult<()> {
    if key.is_empty() {
        return Err(StorageError::InvalidKey("key must not be empty".into()));
    }
    if key.contains('\0') {
        return Err(StorageError::InvalidKey("key must not contain null bytes".into()));
    }
    Ok(())
}

/// Raw key-value store trait: byte-level `get`/`set`/`delete`, namespaced.
#[async_trait]
pub trait KvStore: Send + Sync {
    async fn get(&self, namespace: &str, key: &str) -> StorageResult<Option<Vec<u8>>>;
    async fn set(&self, namespace: &str, key: &str, value: Vec<u8>) -> StorageResult<()>;
    async fn delete(&self, namespace: &str, key: &str) -> StorageResult<bool>;
    async fn exists(&self, namespace: &str, key: &str) -> StorageResult<bool>;
    async fn list_keys(&self, namespace: &str) -> StorageResult<Vec<String>>;
    async fn clear_namespace(&self, namespace: &str) -> StorageResult<u64>;
}

/// In-memory `KvStore`, for tests and the non-persistent session cache.
#[derive(Debug, Default)]
pub struct MemoryKvStore {
    data: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryKvStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn full_key(namespace: &str, key: &str) -> String {
        format!("{namespace}\0{key}")
    }
}

#[async_trait]
impl KvStore for MemoryKvStore {
    async fn get(&self, namespace: &str, key: &str) -> StorageResult<Option<Vec<u8>>> {
        validate_namespace(namespace)?;
        validate_key(key)?;
        let data = self.data.read().map_err(|e| StorageError::Internal(e.to_string()))?;
        Ok(data.get(&Self::full_key(namespace, key)).cloned())
    }

    async fn set(&self, namespace: &str, key: &str, value: Vec<u8>) -> StorageResult<()> {
        validate_namespace(namespace)?;
        validate_key(key)?;
        let mut data = self.data.write().map_err(|e| StorageError::Internal(e.to_string()))?;
        data.insert(Self::full_key(namespace, key), value);
        Ok(())
    }

    async fn delete(&self, namespace: &str, key: &str) -> StorageResult<bool> {
        validate_namespace(namespace)?;
        validate_key(key)?;
        let mut data = self.data.write().map_err(|e| StorageError::Internal(e.to_string()))?;
        Ok(data.remove(&Self::full_key(namespace, key)).is_some())
    }

    async fn exists(&self, namespace: &str, key: &str) -> StorageResult<bool> {
        validate_namespace(namespace)?;
        validate_key(key)?;
        let data = self.data.read().map_err(|e| StorageError::Internal(e.to_string()))?;
        Ok(data.contains_key(&Self::full_key(namespace, key)))
    }

    async fn list_keys(&self, namespace: &str) -> StorageResult<Vec<String>> {
        validate_namespace(namespace)?;
        let data = self.data.read().map_err(|e| StorageError::Internal(e.to_string()))?;
        let prefix = format!("{namespace}\0");
        Ok(data.keys().filter_map(|k| k.strip_prefix(&prefix).map(String::from)).collect())
    }

    async fn clear_namespace(&self, namespace: &str) -> StorageResult<u64> {
        validate_namespace(namespace)?;
        let mut data = self.data.write().map_err(|e| StorageError::Internal(e.to_string()))?;
        let prefix = format!("{namespace}\0");
        let keys: Vec<String> = data.keys().filter(|k| k.starts_with(&prefix)).cloned().collect();
        let count = keys.len() as u64;
        for key in keys {
            data.remove(&key);
        }
        Ok(count)
    }
}

/// `KvStore` backed by the same embedded `SurrealDB`/`SurrealKV` engine used
/// by [`crate::db::Database`], so a deployment can run on one storage engine
/// end to end. Rows live in a single `kv` table keyed by `(namespace, key)`.
#[cfg(feature = "db")]
pub struct SurrealKvStore {
    db: crate::db::Database,
}

#[cfg(feature = "db")]
impl SurrealKvStore {
    #[must_use]
    pub fn new(db: crate::db::Database) -> Self {
        Self { db }
    }
}

#[cfg(feature = "db")]
#[async_trait]
impl KvStore for SurrealKvStore {
    async fn get(&self, namespace: &str, key: &str) -> StorageResult<Option<Vec<u8>>> {
        validate_namespace(namespace)?;
        validate_key(key)?;
        #[derive(serde::Deserialize)]
        struct Row {
            value: Vec<u8>,
        }
        let mut res = self
            .db
            .client()
            .query("SELECT value FROM kv WHERE namespace = $ns AND key = $key LIMIT 1")
            .bind(("ns", namespace.to_string()))
            .bind(("key", key.to_string()))
            .await
            .map_err(|e| StorageError::Internal(e.to_string()))?;
        let rows: Vec<Row> = res.take(0).map_err(|e| StorageError::Internal(e.to_string()))?;
        Ok(rows.into_iter().next().map(|r| r.value))
    }

    async fn set(&self, namespace: &str, key: &str, value: Vec<u8>) -> StorageResult<()> {
        validate_namespace(namespace)?;
        validate_key(key)?;
        self.db
            .client()
            .query(
                "UPDATE kv SET value = $value WHERE namespace = $ns AND key = $key \
                 ELSE CREATE kv SET namespace = $ns, key = $key, value = $value",
            )
            .bind(("ns", namespace.to_string()))
            .bind(("key", key.to_string()))
            .bind(("value", value))
            .await
            .map_err(|e| StorageError::Internal(e.to_string()))?;
        Ok(())
    }

    async fn delete(&self, namespace: &str, key: &str) -> StorageResult<bool> {
        validate_namespace(namespace)?;
        validate_key(key)?;
        let existed = self.exists(namespace, key).await?;
        self.db
            .client()
            .query("DELETE kv WHERE namespace = $ns AND key = $key")
            .bind(("ns", namespace.to_string()))
            .bind(("key", key.to_string()))
            .await
            .map_err(|e| StorageError::Internal(e.to_string()))?;
        Ok(existed)
    }

    async fn exists(&self, namespace: &str, key: &str) -> StorageResult<bool> {
        Ok(self.get(namespace, key).await?.is_some())
    }

    async fn list_keys(&self, namespace: &str) -> StorageResult<Vec<String>> {
        validate_namespace(namespace)?;
        #[derive(serde::Deserialize)]
        struct Row {
            key: String,
        }
        let mut res = self
            .db
            .client()
            .query("SELECT key FROM kv WHERE namespace = $ns")
            .bind(("ns", namespace.to_string()))
            .await
            .map_err(|e| StorageError::Internal(e.to_string()))?;
        let rows: Vec<Row> = res.take(0).map_err(|e| StorageError::Internal(e.to_string()))?;
        Ok(rows.into_iter().map(|r| r.key).collect())
    }

    async fn clear_namespace(&self, namespace: &str) -> StorageResult<u64> {
        validate_namespace(namespace)?;
        let keys = self.list_keys(namespace).await?;
        let count = keys.len() as u64;
        self.db
            .client()
            .query("DELETE kv WHERE namespace = $ns")
            .bind(("ns", namespace.to_string()))
            .await
            .map_err(|e| StorageError::Internal(e.to_string()))?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_get_set_delete() {
        let store = MemoryKvStore::new();
        store.set("ns", "k", b"v".to_vec()).await.unwrap();
        assert_eq!(store.get("ns", "k").await.unwrap(), Some(b"v".to_vec()));
        assert!(store.delete("ns", "k").await.unwrap());
        assert!(store.get("ns", "k").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn memory_namespace_isolation() {
        let store = MemoryKvStore::new();
        store.set("a", "k", b"1".to_vec()).await.unwrap();
        store.set("b", "k", b"2".to_vec()).await.unwrap();
        assert_eq!(store.get("a", "k").await.unwrap(), Some(b"1".to_vec()));
        assert_eq!(store.get("b", "k").await.unwrap(), Some(b"2".to_vec()));
    }

    #[tokio::test]
    async fn memory_list_and_clear_namespace() {
        let store = MemoryKvStore::new();
        store.set("ns", "a", b"1".to_vec()).await.unwrap();
        store.set("ns", "b", b"2".to_vec()).await.unwrap();
        let mut keys = store.list_keys("ns").await.unwrap();
        keys.sort();
        assert_eq!(keys, vec!["a", "b"]);
        assert_eq!(store.clear_namespace("ns").await.unwrap(), 2);
        assert!(store.list_keys("ns").await.unwrap().is_empty());
    }

    #[test]
    fn rejects_empty_namespace_and_key() {
        assert!(validate_namespace("").is_err());
        assert!(validate_key("").is_err());
        assert!(validate_key("a\0b").is_err());
    }
}
