//! Verb CRUD.

use serde::{Deserialize, Serialize};
use wov_core::{Ast, EntityId, VerbId};

use crate::error::RepoResult;
use crate::Repository;

#[derive(Debug, Serialize, Deserialize)]
struct VerbRow {
    vid: i64,
    entity_id: i64,
    name: String,
    source: serde_json::Value,
    permissions: Option<Vec<String>>,
    created_at: chrono::DateTime<chrono::Utc>,
}

impl From<VerbRow> for wov_core::Verb {
    fn from(r: VerbRow) -> Self {
        wov_core::Verb {
            id: VerbId(r.vid),
            entity_id: EntityId(r.entity_id),
            name: r.name,
            source: serde_json::from_value(r.source).unwrap_or(Ast::Literal { value: wov_core::Value::Null }),
            permissions: r.permissions,
            created_at: r.created_at,
        }
    }
}

impl Repository {
    pub async fn get_verbs(&self, entity_id: EntityId) -> RepoResult<Vec<wov_core::Verb>> {
        let mut res = self
            .db
            .client()
            .query("SELECT * FROM verbs WHERE entity_id = $eid")
            .bind(("eid", entity_id.0))
            .await?;
        let rows: Vec<VerbRow> = res.take(0)?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    pub async fn get_verb(&self, entity_id: EntityId, name: &str) -> RepoResult<Option<wov_core::Verb>> {
        let mut res = self
            .db
            .client()
            .query("SELECT * FROM verbs WHERE entity_id = $eid AND name = $name LIMIT 1")
            .bind(("eid", entity_id.0))
            .bind(("name", name.to_string()))
            .await?;
        let rows: Vec<VerbRow> = res.take(0)?;
        Ok(rows.into_iter().next().map(Into::into))
    }

    /// Create or overwrite a verb by `(entity_id, name)`.
    pub async fn update_verb(
        &self,
        seq: &wov_core::IdSequence,
        entity_id: EntityId,
        name: &str,
        source: Ast,
    ) -> RepoResult<wov_core::Verb> {
        let existing = self.get_verb(entity_id, name).await?;
        let vid = existing.as_ref().map(|v| v.id.0).unwrap_or_else(|| seq.next());
        let row = VerbRow {
            vid,
            entity_id: entity_id.0,
            name: name.to_string(),
            source: serde_json::to_value(&source).map_err(|e| crate::error::RepoError::Database(e.to_string()))?,
            permissions: None,
            created_at: existing.as_ref().map(|v| v.created_at).unwrap_or_else(chrono::Utc::now),
        };
        self.db
            .client()
            .query(
                "UPDATE verbs SET vid = $vid, entity_id = $eid, name = $name, source = $source, \
                 permissions = $permissions, created_at = $created_at WHERE entity_id = $eid AND name = $name \
                 ELSE CREATE verbs CONTENT $row",
            )
            .bind(("vid", row.vid))
            .bind(("eid", row.entity_id))
            .bind(("name", row.name.clone()))
            .bind(("source", row.source.clone()))
            .bind(("permissions", row.permissions.clone()))
            .bind(("created_at", row.created_at))
            .bind(("row", row))
            .await?;
        self.get_verb(entity_id, name).await?.ok_or_else(|| {
            crate::error::RepoError::Database("verb vanished immediately after write".into())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wov_core::Value;

    #[tokio::test]
    async fn update_verb_creates_then_overwrites() {
        let repo = Repository::connect_memory().await.unwrap();
        let seq = wov_core::IdSequence::starting_after(0);
        let entity = repo.create_entity(&seq, "Proto", None).await.unwrap();

        let ast = Ast::call("send", vec![Ast::literal(Value::str("message")), Ast::literal(Value::str("hi"))]);
        let v1 = repo.update_verb(&seq, entity.id, "greet", ast.clone()).await.unwrap();

        let ast2 = Ast::literal(Value::str("bye"));
        let v2 = repo.update_verb(&seq, entity.id, "greet", ast2).await.unwrap();

        assert_eq!(v1.id, v2.id, "overwrite keeps the same verb id");
        let fetched = repo.get_verb(entity.id, "greet").await.unwrap().unwrap();
        match fetched.source {
            Ast::Literal { value: Value::String(s) } => assert_eq!(s, "bye"),
            _ => panic!("expected literal"),
        }
    }
}
