//! Active-ward state machine per entity.
//!
//! `INACTIVE --activate--> ACTIVE --expire | deactivate--> INACTIVE`.
//!
//! The coordinator owns the effect [`TtlStore`] and drives the
//! [`AttributeReconciler`] on every transition. Activating an
//! already-active entity resets the timer and re-reconciles (the
//! use-request flow has already refused a second use; a redundant
//! activate must not error or stack modifiers).

use std::sync::Arc;

use tracing::info;
use wardstone_types::EntityId;

use crate::attribute::AttributeReconciler;
use crate::clock::TimeSource;
use crate::ttl::TtlStore;

/// Tracks which entities currently hold the ward and reconciles the host
/// resource on every transition.
pub struct EffectCoordinator {
    /// Active-ward expiry records. Independent of the cooldown store.
    store: TtlStore,
    /// Reconciler for the host-owned attribute resource.
    reconciler: Arc<AttributeReconciler>,
}

impl EffectCoordinator {
    /// Create a coordinator with no active wards.
    pub fn new(clock: Arc<dyn TimeSource>, reconciler: Arc<AttributeReconciler>) -> Self {
        Self {
            store: TtlStore::new(clock),
            reconciler,
        }
    }

    /// Grant the ward to `entity` for `ttl_seconds`.
    ///
    /// The internal record is written *before* the host reconciliation so
    /// a concurrent [`has_active_effect`](Self::has_active_effect) during
    /// the non-atomic reconciliation window sees ACTIVE rather than a
    /// false negative.
    pub fn activate(&self, entity: EntityId, ttl_seconds: u64) {
        self.store.set(entity, ttl_seconds);
        self.reconciler.apply(entity);
        info!(%entity, ttl_seconds, "ward activated");
    }

    /// Whether `entity` currently holds the ward.
    ///
    /// Read-time expiry removes only the internal record; host-resource
    /// cleanup for a lazily-detected expiry is deferred to the sweeper or
    /// an explicit collaborator call. This keeps the hot read path free of
    /// host mutation from arbitrary call sites.
    pub fn has_active_effect(&self, entity: EntityId) -> bool {
        self.store.is_live(entity)
    }

    /// Seconds of ward remaining for `entity`, rounded up; 0 when
    /// inactive.
    pub fn remaining_seconds(&self, entity: EntityId) -> u64 {
        self.store.remaining_seconds(entity)
    }

    /// End the ward now: clear the record, then reconcile the host.
    ///
    /// Idempotent; safe to call when inactive.
    pub fn deactivate(&self, entity: EntityId) {
        self.store.clear(entity);
        self.reconciler.remove(entity);
    }

    /// Disconnect/shutdown-path cleanup for `entity`.
    ///
    /// Same operation as [`deactivate`](Self::deactivate); callers issue
    /// it synchronously while the entity handle is still valid so the
    /// host resource never outlives the handle.
    pub fn cleanup_entity(&self, entity: EntityId) {
        self.deactivate(entity);
    }

    /// Entities with a ward record, including expired-but-unswept ones.
    pub fn tracked_entities(&self) -> Vec<EntityId> {
        self.store.tracked_ids()
    }

    /// Drop every ward record without touching the host (shutdown tail;
    /// per-entity reconciliation has already run).
    pub fn clear_records(&self) {
        self.store.clear_all();
    }

    /// Atomically remove and return every entity whose ward expired at or
    /// before `now`. Sweeper-only.
    pub(crate) fn drain_expired(&self, now: u64) -> Vec<EntityId> {
        self.store.drain_expired(now)
    }
}
