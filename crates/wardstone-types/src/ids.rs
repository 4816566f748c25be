//! Type-safe identifier wrappers around [`Uuid`].
//!
//! The subsystem keys every store by entity identity and tracks each
//! installed attribute modifier by its own identity. Both are strongly
//! typed to prevent accidental mixing at compile time. Entity identifiers
//! mirror the random UUIDs the game host issues; modifier identifiers only
//! need uniqueness, so both use UUID v4.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Generates a newtype wrapper around [`Uuid`] with standard derives.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Create a new random identifier (UUID v4).
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Return the inner [`Uuid`] value.
            pub const fn into_inner(self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id! {
    /// Unique identifier for a game entity (the actor status and cooldown
    /// state is attached to).
    EntityId
}

define_id! {
    /// Unique identifier for a single attribute modifier instance installed
    /// on a host attribute resource.
    ModifierId
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_distinct_types() {
        let entity = EntityId::new();
        let modifier = ModifierId::new();
        // These are different types -- the compiler enforces no mixing.
        assert_ne!(entity.into_inner(), Uuid::nil());
        assert_ne!(modifier.into_inner(), Uuid::nil());
    }

    #[test]
    fn id_roundtrip_serde() {
        let original = EntityId::new();
        let json = serde_json::to_string(&original).ok();
        assert!(json.is_some());
        let restored: Result<EntityId, _> =
            serde_json::from_str(json.as_deref().unwrap_or(""));
        assert!(restored.is_ok());
    }

    #[test]
    fn id_display_matches_uuid() {
        let id = EntityId::new();
        assert_eq!(id.to_string(), id.into_inner().to_string());
    }

    #[test]
    fn fresh_ids_are_unique() {
        let a = ModifierId::new();
        let b = ModifierId::new();
        assert_ne!(a, b);
    }
}
