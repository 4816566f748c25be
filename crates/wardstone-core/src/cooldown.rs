//! Per-entity cooldown gating.
//!
//! The gate answers three questions for the use-request flow: is this
//! entity gated, for how much longer, and "start gating now". It is a thin
//! wrapper over its own [`TtlStore`]; cooldowns self-expire lazily on the
//! next check and are never swept, and the gate never touches the host's
//! attribute resource.
//!
//! Cooldown state is memory-only and resets with the subsystem.

use std::sync::Arc;

use wardstone_types::EntityId;

use crate::clock::TimeSource;
use crate::ttl::TtlStore;

/// Per-entity cooldown timers for the use-request flow.
pub struct CooldownGate {
    /// Backing expiry records. Independent of the effect store.
    store: TtlStore,
}

impl CooldownGate {
    /// Create a gate with no cooldowns running.
    pub fn new(clock: Arc<dyn TimeSource>) -> Self {
        Self {
            store: TtlStore::new(clock),
        }
    }

    /// Whether `entity` is currently gated.
    pub fn is_gated(&self, entity: EntityId) -> bool {
        self.store.is_live(entity)
    }

    /// Seconds until `entity` is no longer gated, rounded up; 0 when not
    /// gated.
    pub fn remaining_seconds(&self, entity: EntityId) -> u64 {
        self.store.remaining_seconds(entity)
    }

    /// Start (or restart) the gate for `entity`.
    pub fn start(&self, entity: EntityId, seconds: u64) {
        self.store.set(entity, seconds);
    }

    /// Release the gate early, unconditionally.
    ///
    /// Used for explicit early release and for entity cleanup on
    /// disconnect.
    pub fn release(&self, entity: EntityId) {
        self.store.clear(entity);
    }

    /// Drop every cooldown record (subsystem shutdown).
    pub fn clear_all(&self) {
        self.store.clear_all();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    fn gate_with_clock() -> (CooldownGate, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new());
        let gate = CooldownGate::new(Arc::clone(&clock) as Arc<dyn TimeSource>);
        (gate, clock)
    }

    #[test]
    fn ungated_by_default() {
        let (gate, _clock) = gate_with_clock();
        assert!(!gate.is_gated(EntityId::new()));
        assert_eq!(gate.remaining_seconds(EntityId::new()), 0);
    }

    #[test]
    fn start_gates_immediately() {
        let (gate, _clock) = gate_with_clock();
        let entity = EntityId::new();
        gate.start(entity, 60);
        assert!(gate.is_gated(entity));
        assert_eq!(gate.remaining_seconds(entity), 60);
    }

    #[test]
    fn remaining_decreases_with_time() {
        let (gate, clock) = gate_with_clock();
        let entity = EntityId::new();
        gate.start(entity, 60);
        clock.advance(11_000);
        assert_eq!(gate.remaining_seconds(entity), 49);
        assert!(gate.is_gated(entity));
    }

    #[test]
    fn gate_self_expires_lazily() {
        let (gate, clock) = gate_with_clock();
        let entity = EntityId::new();
        gate.start(entity, 60);
        clock.advance(60_000);
        assert!(!gate.is_gated(entity));
        assert_eq!(gate.remaining_seconds(entity), 0);
    }

    #[test]
    fn release_ends_gate_early() {
        let (gate, _clock) = gate_with_clock();
        let entity = EntityId::new();
        gate.start(entity, 60);
        gate.release(entity);
        assert!(!gate.is_gated(entity));
    }

    #[test]
    fn release_when_ungated_is_a_no_op() {
        let (gate, _clock) = gate_with_clock();
        gate.release(EntityId::new());
    }
}
