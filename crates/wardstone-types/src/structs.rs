//! Shared structs for the Wardstone workspace.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::enums::{ModifierOperation, StatusEventKind};
use crate::ids::{EntityId, ModifierId};

// ---------------------------------------------------------------------------
// Attribute modifiers
// ---------------------------------------------------------------------------

/// A named, uniquely-identified adjustment installed on a host-owned
/// attribute resource.
///
/// The host is authoritative for how an installed modifier affects
/// gameplay numerics; the core only decides *when* one exists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeModifier {
    /// Identity of this modifier instance; removal targets exactly this.
    pub id: ModifierId,
    /// Symbolic name. The core scans for this name when cleaning up
    /// modifiers left behind by a prior subsystem generation.
    pub name: String,
    /// How the magnitude combines with the attribute's base value.
    pub operation: ModifierOperation,
    /// Magnitude of the adjustment.
    pub magnitude: f64,
}

// ---------------------------------------------------------------------------
// Notifications
// ---------------------------------------------------------------------------

/// A status lifecycle notification delivered to the messaging collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusNotification {
    /// The entity the event concerns.
    pub entity: EntityId,
    /// What happened.
    pub kind: StatusEventKind,
    /// Wall-clock time the event was emitted.
    pub emitted_at: DateTime<Utc>,
}

impl StatusNotification {
    /// Build a notification stamped with the current wall-clock time.
    pub fn now(entity: EntityId, kind: StatusEventKind) -> Self {
        Self {
            entity,
            kind,
            emitted_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notification_carries_entity_and_kind() {
        let entity = EntityId::new();
        let n = StatusNotification::now(entity, StatusEventKind::Activated);
        assert_eq!(n.entity, entity);
        assert_eq!(n.kind, StatusEventKind::Activated);
    }

    #[test]
    fn modifier_serde_roundtrip() {
        let m = AttributeModifier {
            id: ModifierId::new(),
            name: String::from("test_modifier"),
            operation: ModifierOperation::Add,
            magnitude: 1.0,
        };
        let json = serde_json::to_string(&m).ok();
        assert!(json.is_some());
        let back: Result<AttributeModifier, _> =
            serde_json::from_str(json.as_deref().unwrap_or(""));
        assert_eq!(back.ok(), Some(m));
    }
}
