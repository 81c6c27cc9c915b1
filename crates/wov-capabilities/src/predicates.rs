//! Built-in capability types and their match predicates.

use std::collections::BTreeMap;

use wov_core::{EntityId, Value};

/// `sys.mint` — `namespace` is `"*"` or a dotted prefix of the minted type.
#[must_use]
pub fn mint_namespace_covers(namespace: &str, minted_type: &str) -> bool {
    namespace == "*" || minted_type == namespace || minted_type.starts_with(&format!("{namespace}."))
}

/// `entity.control` — `params.target_id == action_target.id`.
#[must_use]
pub fn entity_control_matches(params: &BTreeMap<String, Value>, action_target: EntityId) -> bool {
    matches!(params.get("target_id").and_then(Value::as_i64), Some(id) if id == action_target.0)
}

/// `fs.read` / `fs.write` — `params.path` is a prefix of the canonicalized
/// target path.
#[must_use]
pub fn fs_path_covers(params: &BTreeMap<String, Value>, canonical_target: &str) -> bool {
    matches!(params.get("path").and_then(Value::as_str), Some(p) if canonical_target.starts_with(p))
}

/// `net.http.read` / `net.http.write` — `params.domain` is a suffix (host)
/// of the target URL's host.
#[must_use]
pub fn net_domain_covers(params: &BTreeMap<String, Value>, target_host: &str) -> bool {
    matches!(params.get("domain").and_then(Value::as_str), Some(d) if target_host == d || target_host.ends_with(&format!(".{d}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mint_namespace_wildcard_covers_everything() {
        assert!(mint_namespace_covers("*", "user.42.note"));
    }

    #[test]
    fn mint_namespace_prefix_is_dotted() {
        assert!(mint_namespace_covers("user.42", "user.42.note"));
        assert!(!mint_namespace_covers("user.42", "user.43.note"));
        assert!(!mint_namespace_covers("user.4", "user.42.note"));
    }

    #[test]
    fn net_domain_suffix_match() {
        assert!(net_domain_covers(&BTreeMap::from([("domain".into(), Value::str("example.com"))]), "api.example.com"));
        assert!(!net_domain_covers(&BTreeMap::from([("domain".into(), Value::str("example.com"))]), "evilexample.com"));
    }
}
