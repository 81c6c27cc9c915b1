//! Entity CRUD and prototype chain resolution.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use wov_core::{Entity, EntityId, IdSequence, Value};

use crate::error::{RepoError, RepoResult};
use crate::Repository;

/// Maximum prototype-chain hops before a cycle is declared.
pub const MAX_PROTOTYPE_HOPS: usize = 64;

#[derive(Debug, Serialize, Deserialize)]
struct EntityRow {
    eid: i64,
    name: String,
    prototype_id: Option<i64>,
    owner_id: Option<i64>,
    props: serde_json::Value,
    created_at: chrono::DateTime<chrono::Utc>,
}

impl From<EntityRow> for Entity {
    fn from(r: EntityRow) -> Self {
        let props = match Value::from(&r.props) {
            Value::Object(m) => m,
            _ => Default::default(),
        };
        Entity {
            id: EntityId(r.eid),
            prototype_id: r.prototype_id.map(EntityId),
            name: r.name,
            props,
            owner_id: r.owner_id.map(EntityId),
            created_at: r.created_at,
        }
    }
}

impl From<&Entity> for EntityRow {
    fn from(e: &Entity) -> Self {
        EntityRow {
            eid: e.id.0,
            name: e.name.clone(),
            prototype_id: e.prototype_id.map(|i| i.0),
            owner_id: e.owner_id.map(|i| i.0),
            props: Value::Object(e.props.clone()).into(),
            created_at: e.created_at,
        }
    }
}

impl Repository {
    /// Allocate the next entity id and persist a fresh entity. No capability
    /// check is performed here — callers enforce it at the opcode boundary.
    pub async fn create_entity(
        &self,
        seq: &IdSequence,
        name: impl Into<String>,
        owner_id: Option<EntityId>,
    ) -> RepoResult<Entity> {
        let entity = Entity::new(EntityId(seq.next()), name, owner_id);
        let row = EntityRow::from(&entity);
        self.db.client().query("CREATE entities CONTENT $row").bind(("row", row)).await?;
        Ok(entity)
    }

    pub async fn get_entity(&self, id: EntityId) -> RepoResult<Option<Entity>> {
        let mut res = self
            .db
            .client()
            .query("SELECT * FROM entities WHERE eid = $eid LIMIT 1")
            .bind(("eid", id.0))
            .await?;
        let rows: Vec<EntityRow> = res.take(0)?;
        Ok(rows.into_iter().next().map(Into::into))
    }

    /// Transactional multi-entity update: atomic all-or-nothing.
    pub async fn update_entities(&self, entities: &[Entity]) -> RepoResult<()> {
        if entities.is_empty() {
            return Ok(());
        }
        let mut query = String::from("BEGIN TRANSACTION;\n");
        for i in 0..entities.len() {
            query.push_str(&format!(
                "UPDATE entities SET name = $name{i}, prototype_id = $proto{i}, owner_id = $owner{i}, props = $props{i} WHERE eid = $eid{i};\n"
            ));
        }
        query.push_str("COMMIT TRANSACTION;");

        let mut q = self.db.client().query(query);
        for (i, e) in entities.iter().enumerate() {
            q = q
                .bind((format!("eid{i}"), e.id.0))
                .bind((format!("name{i}"), e.name.clone()))
                .bind((format!("proto{i}"), e.prototype_id.map(|p| p.0)))
                .bind((format!("owner{i}"), e.owner_id.map(|o| o.0)))
                .bind((format!("props{i}"), serde_json::Value::from(Value::Object(e.props.clone()))));
        }
        q.await?;
        Ok(())
    }

    /// Delete an entity along with its verbs and capabilities.
    pub async fn delete_entity(&self, id: EntityId) -> RepoResult<()> {
        self.db
            .client()
            .query(
                "BEGIN TRANSACTION;
                 DELETE verbs WHERE entity_id = $eid;
                 DELETE capabilities WHERE owner_id = $eid;
                 DELETE entities WHERE eid = $eid;
                 COMMIT TRANSACTION;",
            )
            .bind(("eid", id.0))
            .await?;
        Ok(())
    }

    pub async fn get_prototype_id(&self, id: EntityId) -> RepoResult<Option<EntityId>> {
        Ok(self.get_entity(id).await?.and_then(|e| e.prototype_id))
    }

    /// Set `id`'s prototype, refusing to introduce a cycle.
    pub async fn set_prototype_id(&self, id: EntityId, proto_id: Option<EntityId>) -> RepoResult<()> {
        if let Some(p) = proto_id {
            // Walking from the proposed prototype must never reach `id`.
            let mut cursor = Some(p);
            let mut hops = 0;
            while let Some(cur) = cursor {
                if cur == id {
                    return Err(RepoError::PrototypeCycle(id));
                }
                hops += 1;
                if hops > MAX_PROTOTYPE_HOPS {
                    return Err(RepoError::PrototypeCycle(id));
                }
                cursor = self.get_prototype_id(cur).await?;
            }
        }
        self.db
            .client()
            .query("UPDATE entities SET prototype_id = $proto WHERE eid = $eid")
            .bind(("eid", id.0))
            .bind(("proto", proto_id.map(|p| p.0)))
            .await?;
        Ok(())
    }

    /// Walk the prototype chain starting at `id`, calling `visit` on each
    /// entity (including `id` itself) until `visit` returns `Some`, the
    /// chain ends, or 64 hops are exceeded (a fatal load error).
    pub async fn walk_prototype_chain<T>(
        &self,
        id: EntityId,
        mut visit: impl FnMut(&Entity) -> Option<T>,
    ) -> RepoResult<Option<T>> {
        let mut cursor = Some(id);
        let mut hops = 0;
        while let Some(cur) = cursor {
            hops += 1;
            if hops > MAX_PROTOTYPE_HOPS {
                return Err(RepoError::PrototypeCycle(id));
            }
            let Some(entity) = self.get_entity(cur).await? else {
                return Ok(None);
            };
            if let Some(found) = visit(&entity) {
                return Ok(Some(found));
            }
            cursor = entity.prototype_id;
        }
        Ok(None)
    }

    /// Sweep dangling references: `prototype_id`/`owner_id` and the
    /// well-known `location`/`contents`/`destination`/`exits` prop keys
    /// that point at entities which no longer exist. Run periodically by
    /// `wov-server`, never user-invokable.
    pub async fn sweep_dangling_references(self: &Arc<Self>) -> RepoResult<u64> {
        let mut res = self.db.client().query("SELECT * FROM entities").await?;
        let rows: Vec<EntityRow> = res.take(0)?;
        let all: Vec<Entity> = rows.into_iter().map(Into::into).collect();
        let existing: std::collections::HashSet<i64> = all.iter().map(|e| e.id.0).collect();

        let mut repaired = Vec::new();
        for mut e in all {
            let mut changed = false;
            if let Some(p) = e.prototype_id {
                if !existing.contains(&p.0) {
                    e.prototype_id = None;
                    changed = true;
                }
            }
            if let Some(o) = e.owner_id {
                if !existing.contains(&o.0) {
                    e.owner_id = None;
                    changed = true;
                }
            }
            for key in ["location", "destination"] {
                if let Some(Value::Number(n)) = e.props.get(key) {
                    if !existing.contains(&(n.as_f64() as i64)) {
                        e.props.remove(key);
                        changed = true;
                    }
                }
            }
            for key in ["contents", "exits"] {
                if let Some(Value::List(items)) = e.props.get(key).cloned() {
                    let filtered: Vec<Value> = items
                        .into_iter()
                        .filter(|v| match v {
                            Value::Number(n) => existing.contains(&(n.as_f64() as i64)),
                            _ => true,
                        })
                        .collect();
                    if filtered.len() != e.props.get(key).and_then(Value::as_list).map(<[_]>::len).unwrap_or(0) {
                        e.props.insert(key.to_string(), Value::List(filtered));
                        changed = true;
                    }
                }
            }
            if changed {
                repaired.push(e);
            }
        }
        let count = repaired.len() as u64;
        self.update_entities(&repaired).await?;
        Ok(count)
    }
}
