//! Typed identifiers for documents and their nested entities.
//!
//! Every entity carries a UUID, but mixing a hazard id into a control
//! lookup is a bug we want the compiler to catch. Each id is therefore
//! its own newtype; [`EntityId`] is the erased form used where the
//! entity kind is only known at runtime (reorder lists, anchors).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! typed_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Generates a fresh random id.
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Wraps an existing UUID.
            #[must_use]
            pub const fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Returns the underlying UUID.
            #[inline]
            #[must_use]
            pub const fn as_uuid(&self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::from_str(s).map(Self)
            }
        }

        impl From<$name> for EntityId {
            fn from(id: $name) -> Self {
                EntityId(id.0)
            }
        }

        impl PartialEq<EntityId> for $name {
            fn eq(&self, other: &EntityId) -> bool {
                self.0 == other.0
            }
        }
    };
}

typed_id! {
    /// Identifies a whole assessment document.
    DocumentId
}

typed_id! {
    /// Identifies a process step (or timeline event).
    StepId
}

typed_id! {
    /// Identifies a hazard nested under a step.
    HazardId
}

typed_id! {
    /// Identifies a control nested under a hazard.
    ControlId
}

typed_id! {
    /// Identifies a follow-up action.
    ActionId
}

/// An entity id whose kind is only known from context.
///
/// Reorder payloads and `insertAfter` anchors arrive as bare UUIDs; the
/// resolver narrows them to a typed id once the target scope is known.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(Uuid);

impl EntityId {
    /// Wraps an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    #[inline]
    #[must_use]
    pub const fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for EntityId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::from_str(s).map(Self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique() {
        assert_ne!(StepId::new(), StepId::new());
    }

    #[test]
    fn display_round_trips_through_from_str() {
        let id = HazardId::new();
        let parsed: HazardId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn typed_id_compares_against_erased_form() {
        let id = ControlId::new();
        let erased: EntityId = id.into();
        assert!(id == erased);
    }

    #[test]
    fn serde_is_transparent() {
        let id = StepId::new();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{id}\""));
    }
}
