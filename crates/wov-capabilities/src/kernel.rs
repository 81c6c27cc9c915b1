//! Minting, delegation, transfer, and predicate checking.
//!
//! Backed by [`wov_repository::Repository`] rather than a raw `KvStore`:
//! `check` and `has_capability` need to query "all capabilities owned by
//! X", which is a relational lookup the typed repository already provides.

use std::collections::BTreeMap;
use std::sync::Arc;

use wov_core::{Capability, CapabilityId, EntityId, Value};
use wov_repository::Repository;

use crate::error::{CapabilityError, CapabilityResult};
use crate::predicates;

/// The capability kernel: mint, delegate, give, check.
pub struct CapabilityKernel {
    repo: Arc<Repository>,
}

impl CapabilityKernel {
    #[must_use]
    pub fn new(repo: Arc<Repository>) -> Self {
        Self { repo }
    }

    async fn load_owned(&self, id: CapabilityId, owner: EntityId) -> CapabilityResult<Capability> {
        let cap = self.repo.get_capability(id).await?.ok_or(CapabilityError::NotFound(id))?;
        if cap.owner_id != owner {
            return Err(CapabilityError::WrongOwner(id, cap.owner_id, owner));
        }
        Ok(cap)
    }

    /// `mint(authority, type, params) → cap`. Requires `authority` be a
    /// `sys.mint` capability owned by `caller` whose `params.namespace`
    /// covers `cap_type`.
    pub async fn mint(
        &self,
        authority: CapabilityId,
        caller: EntityId,
        cap_type: impl Into<String>,
        params: BTreeMap<String, Value>,
    ) -> CapabilityResult<Capability> {
        let cap_type = cap_type.into();
        let auth = self.load_owned(authority, caller).await?;
        if auth.cap_type != "sys.mint" {
            return Err(CapabilityError::Denied { required_type: "sys.mint".into() });
        }
        let namespace = auth.params.get("namespace").and_then(Value::as_str).unwrap_or_default();
        if !predicates::mint_namespace_covers(namespace, &cap_type) {
            return Err(CapabilityError::Denied { required_type: "sys.mint".into() });
        }
        Ok(self.repo.create_capability(caller, cap_type, params).await?)
    }

    /// `delegate(parent, restrictions) → cap`. Params are merged child-
    /// overrides-parent, key by key. Does **not** reject widening — see
    /// DESIGN.md open question #1; this is a known hazard left unfixed
    /// rather than papered over with an ad hoc check.
    pub async fn delegate(
        &self,
        parent: CapabilityId,
        caller: EntityId,
        restrictions: BTreeMap<String, Value>,
    ) -> CapabilityResult<Capability> {
        let parent_cap = self.load_owned(parent, caller).await?;
        let mut params = parent_cap.params.clone();
        for (k, v) in restrictions {
            params.insert(k, v);
        }
        Ok(self.repo.create_capability(caller, parent_cap.cap_type.clone(), params).await?)
    }

    /// `give(cap, target) → ()`. Reassigns `owner_id`.
    pub async fn give(&self, cap: CapabilityId, caller: EntityId, target: EntityId) -> CapabilityResult<()> {
        self.load_owned(cap, caller).await?;
        self.repo.update_capability_owner(cap, target).await?;
        Ok(())
    }

    /// `check(cap, caller, expected_type, match_fn)` — a three-step
    /// predicate: ownership+type match, then the `"*"` wildcard shortcut (a
    /// documented hazard, not fixed here), then the caller-supplied
    /// predicate over `cap.params`.
    pub async fn check(
        &self,
        cap_id: CapabilityId,
        caller: EntityId,
        expected_type: &str,
        match_fn: impl FnOnce(&BTreeMap<String, Value>) -> bool,
    ) -> CapabilityResult<Capability> {
        let cap = self.repo.get_capability(cap_id).await?.ok_or(CapabilityError::NotFound(cap_id))?;
        if cap.owner_id != caller || cap.cap_type != expected_type {
            return Err(CapabilityError::Denied { required_type: expected_type.to_string() });
        }
        if matches!(cap.params.get("*"), Some(Value::Bool(true))) {
            return Ok(cap);
        }
        if !match_fn(&cap.params) {
            return Err(CapabilityError::Denied { required_type: expected_type.to_string() });
        }
        Ok(cap)
    }

    /// `get_capability(type, filter?)`: the first capability of `owner`
    /// matching `cap_type` and, if given, `filter`.
    pub async fn find_capability(
        &self,
        owner: EntityId,
        cap_type: &str,
        filter: Option<&BTreeMap<String, Value>>,
    ) -> CapabilityResult<Option<Capability>> {
        let all = self.repo.get_capabilities(owner).await?;
        Ok(all.into_iter().find(|c| {
            c.cap_type == cap_type
                && filter.is_none_or(|f| f.iter().all(|(k, v)| c.params.get(k) == Some(v)))
        }))
    }

    /// `has_capability(target, type, filter?)`.
    pub async fn has_capability(
        &self,
        owner: EntityId,
        cap_type: &str,
        filter: Option<&BTreeMap<String, Value>>,
    ) -> CapabilityResult<bool> {
        Ok(self.find_capability(owner, cap_type, filter).await?.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn kernel() -> (CapabilityKernel, Arc<Repository>) {
        let repo = Arc::new(Repository::connect_memory().await.unwrap());
        (CapabilityKernel::new(repo.clone()), repo)
    }

    #[tokio::test]
    async fn mint_within_namespace_succeeds() {
        let (kernel, repo) = kernel().await;
        let seq = wov_core::IdSequence::starting_after(0);
        let alice = repo.create_entity(&seq, "Alice", None).await.unwrap();
        let authority = repo
            .create_capability(alice.id, "sys.mint", BTreeMap::from([("namespace".into(), Value::str("user.42"))]))
            .await
            .unwrap();

        let minted = kernel.mint(authority.id, alice.id, "user.42.note", BTreeMap::new()).await.unwrap();
        assert_eq!(minted.cap_type, "user.42.note");
    }

    #[tokio::test]
    async fn mint_outside_namespace_is_denied() {
        let (kernel, repo) = kernel().await;
        let seq = wov_core::IdSequence::starting_after(0);
        let alice = repo.create_entity(&seq, "Alice", None).await.unwrap();
        let authority = repo
            .create_capability(alice.id, "sys.mint", BTreeMap::from([("namespace".into(), Value::str("user.42"))]))
            .await
            .unwrap();

        let err = kernel.mint(authority.id, alice.id, "user.43.note", BTreeMap::new()).await.unwrap_err();
        assert!(matches!(err, CapabilityError::Denied { .. }));
    }

    #[tokio::test]
    async fn delegate_allows_widening_params_unfixed_hazard() {
        let (kernel, repo) = kernel().await;
        let seq = wov_core::IdSequence::starting_after(0);
        let alice = repo.create_entity(&seq, "Alice", None).await.unwrap();
        let parent = repo
            .create_capability(alice.id, "fs.read", BTreeMap::from([("path".into(), Value::str("/tmp/a"))]))
            .await
            .unwrap();

        // Widening the path from `/tmp/a` to `/` is not rejected — see
        // DESIGN.md open question #1.
        let widened = kernel
            .delegate(parent.id, alice.id, BTreeMap::from([("path".into(), Value::str("/"))]))
            .await
            .unwrap();
        assert_eq!(widened.params.get("path"), Some(&Value::str("/")));
    }

    #[tokio::test]
    async fn wildcard_params_bypass_match_fn() {
        let (kernel, repo) = kernel().await;
        let seq = wov_core::IdSequence::starting_after(0);
        let alice = repo.create_entity(&seq, "Alice", None).await.unwrap();
        repo.create_capability(alice.id, "fs.read", BTreeMap::from([("*".into(), Value::Bool(true))]))
            .await
            .unwrap();
        let cap = repo.get_capabilities(alice.id).await.unwrap().remove(0);

        let result = kernel.check(cap.id, alice.id, "fs.read", |_| false).await;
        assert!(result.is_ok(), "wildcard params must bypass the predicate entirely");
    }

    #[tokio::test]
    async fn give_reassigns_owner() {
        let (kernel, repo) = kernel().await;
        let seq = wov_core::IdSequence::starting_after(0);
        let alice = repo.create_entity(&seq, "Alice", None).await.unwrap();
        let bob = repo.create_entity(&seq, "Bob", None).await.unwrap();
        let cap = repo.create_capability(alice.id, "sys.create", BTreeMap::new()).await.unwrap();

        kernel.give(cap.id, alice.id, bob.id).await.unwrap();
        assert!(kernel.has_capability(bob.id, "sys.create", None).await.unwrap());
        assert!(!kernel.has_capability(alice.id, "sys.create", None).await.unwrap());
    }
}
