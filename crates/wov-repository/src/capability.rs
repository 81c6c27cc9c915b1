//! Capability CRUD.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use wov_core::{Capability, CapabilityId, EntityId, Value};

use crate::error::RepoResult;
use crate::Repository;

#[derive(Debug, Serialize, Deserialize)]
struct CapabilityRow {
    cid: String,
    owner_id: i64,
    #[serde(rename = "type")]
    cap_type: String,
    params: serde_json::Value,
    created_at: chrono::DateTime<chrono::Utc>,
}

impl From<CapabilityRow> for Capability {
    fn from(r: CapabilityRow) -> Self {
        let params = match Value::from(&r.params) {
            Value::Object(m) => m,
            _ => BTreeMap::new(),
        };
        Capability {
            id: CapabilityId(uuid::Uuid::parse_str(&r.cid).unwrap_or_default()),
            owner_id: EntityId(r.owner_id),
            cap_type: r.cap_type,
            params,
            created_at: r.created_at,
        }
    }
}

impl Repository {
    pub async fn get_capabilities(&self, owner_id: EntityId) -> RepoResult<Vec<Capability>> {
        let mut res = self
            .db
            .client()
            .query("SELECT * FROM capabilities WHERE owner_id = $oid")
            .bind(("oid", owner_id.0))
            .await?;
        let rows: Vec<CapabilityRow> = res.take(0)?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    pub async fn get_capability(&self, id: CapabilityId) -> RepoResult<Option<Capability>> {
        let mut res = self
            .db
            .client()
            .query("SELECT * FROM capabilities WHERE cid = $cid LIMIT 1")
            .bind(("cid", id.0.to_string()))
            .await?;
        let rows: Vec<CapabilityRow> = res.take(0)?;
        Ok(rows.into_iter().next().map(Into::into))
    }

    pub async fn create_capability(
        &self,
        owner_id: EntityId,
        cap_type: impl Into<String>,
        params: BTreeMap<String, Value>,
    ) -> RepoResult<Capability> {
        let cap = Capability {
            id: CapabilityId::new(),
            owner_id,
            cap_type: cap_type.into(),
            params,
            created_at: chrono::Utc::now(),
        };
        let row = CapabilityRow {
            cid: cap.id.0.to_string(),
            owner_id: cap.owner_id.0,
            cap_type: cap.cap_type.clone(),
            params: serde_json::Value::from(Value::Object(cap.params.clone())),
            created_at: cap.created_at,
        };
        self.db.client().query("CREATE capabilities CONTENT $row").bind(("row", row)).await?;
        Ok(cap)
    }

    pub async fn update_capability_owner(&self, id: CapabilityId, new_owner: EntityId) -> RepoResult<()> {
        self.db
            .client()
            .query("UPDATE capabilities SET owner_id = $owner WHERE cid = $cid")
            .bind(("cid", id.0.to_string()))
            .bind(("owner", new_owner.0))
            .await?;
        Ok(())
    }
}
