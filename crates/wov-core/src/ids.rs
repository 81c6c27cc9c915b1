//! Identifier newtypes.
//!
//! Entities and verbs use monotonically-assigned positive integers (spec
//! requirement — they are referenced constantly in hot paths and persisted
//! as foreign keys, so a compact integer suits them). Capabilities,
//! scheduled tasks, and sessions are not referenced in the same
//! high-frequency way and gain nothing from monotonicity, so they follow a
//! newtype-over-`Uuid` convention instead.

use std::fmt;
use std::sync::atomic::{AtomicI64, Ordering};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! int_id {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i64> for $name {
            fn from(v: i64) -> Self {
                Self(v)
            }
        }
    };
}

macro_rules! uuid_id {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Generate a fresh random id.
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

int_id!(EntityId);
int_id!(VerbId);
uuid_id!(CapabilityId);
uuid_id!(TaskId);
uuid_id!(SessionId);

/// A persisted high-water-mark counter for a monotonic integer id space.
///
/// Loaded once at startup from the repository's max-seen id, then handed
/// out in-process; `wov-repository` persists each newly minted id as part
/// of the same transaction that creates the row, so the counter never
/// needs to be flushed independently.
#[derive(Debug)]
pub struct IdSequence {
    next: AtomicI64,
}

impl IdSequence {
    /// Start a sequence whose first `next()` call returns `high_water + 1`.
    #[must_use]
    pub fn starting_after(high_water: i64) -> Self {
        Self { next: AtomicI64::new(high_water + 1) }
    }

    /// Allocate the next id in the sequence.
    pub fn next(&self) -> i64 {
        self.next.fetch_add(1, Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequence_is_monotonic_and_starts_after_high_water() {
        let seq = IdSequence::starting_after(41);
        assert_eq!(seq.next(), 42);
        assert_eq!(seq.next(), 43);
        assert_eq!(seq.next(), 44);
    }

    #[test]
    fn entity_id_serializes_as_bare_integer() {
        let id = EntityId(7);
        assert_eq!(serde_json::to_string(&id).unwrap(), "7");
    }
}
