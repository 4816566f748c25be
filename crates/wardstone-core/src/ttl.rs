//! Concurrent per-entity expiry records.
//!
//! A [`TtlStore`] maps each entity to an absolute expiry instant in
//! monotonic milliseconds. Presence of a record means "timer running";
//! absence means "not running". Expiry is detected two ways:
//!
//! - **Read-time**: a lookup that finds `now >= expires_at` deletes the
//!   record and reports absence, so callers never observe a stale "live".
//! - **Sweep-time**: [`drain_expired`](TtlStore::drain_expired) atomically
//!   removes and returns everything past its deadline, for the periodic
//!   sweeper to reconcile.
//!
//! All operations take the store's single mutex for one short critical
//! section and never suspend, so they are safe to call from any execution
//! context. Because a drain and a `set` for the same entity serialize on
//! that mutex, a freshly-set record can never be deleted out from under
//! the writer: either the new expiry is already in place when the drain
//! scans (and is in the future, so it survives), or the insert lands after
//! the drain completes.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use wardstone_types::EntityId;

use crate::clock::TimeSource;

/// Concurrent mapping from entity id to an absolute expiry instant.
pub struct TtlStore {
    /// Shared monotonic time source.
    clock: Arc<dyn TimeSource>,
    /// Entity id -> expiry in monotonic milliseconds.
    entries: Mutex<BTreeMap<EntityId, u64>>,
}

impl TtlStore {
    /// Create an empty store on the given timeline.
    pub fn new(clock: Arc<dyn TimeSource>) -> Self {
        Self {
            clock,
            entries: Mutex::new(BTreeMap::new()),
        }
    }

    /// Start (or restart) the timer for `entity` at `ttl_seconds` from now.
    ///
    /// Overwrites any existing record; last write wins.
    pub fn set(&self, entity: EntityId, ttl_seconds: u64) {
        let expires_at = self
            .clock
            .now_millis()
            .saturating_add(ttl_seconds.saturating_mul(1_000));
        self.lock().insert(entity, expires_at);
    }

    /// Whether the timer for `entity` is currently running.
    ///
    /// A record past its deadline is deleted here (read-time expiry) and
    /// reported as absent, even if the sweeper has not seen it yet.
    pub fn is_live(&self, entity: EntityId) -> bool {
        let now = self.clock.now_millis();
        let mut entries = self.lock();
        match entries.get(&entity) {
            None => false,
            Some(&expires_at) if now >= expires_at => {
                entries.remove(&entity);
                false
            }
            Some(_) => true,
        }
    }

    /// Seconds left on the timer for `entity`, rounded up.
    ///
    /// Ceiling division: any positive sub-second remainder reports as 1,
    /// never 0 while still live. Absent or expired records report 0; an
    /// expired record is left in place (pure query -- deletion belongs to
    /// [`is_live`](Self::is_live) and the sweep).
    pub fn remaining_seconds(&self, entity: EntityId) -> u64 {
        let now = self.clock.now_millis();
        self.lock()
            .get(&entity)
            .map_or(0, |&expires_at| expires_at.saturating_sub(now).div_ceil(1_000))
    }

    /// Remove the record for `entity` unconditionally.
    pub fn clear(&self, entity: EntityId) {
        self.lock().remove(&entity);
    }

    /// Atomically remove and return every entity whose expiry is `<= now`.
    ///
    /// Used only by the sweeper. The caller supplies `now` so one reading
    /// governs the whole drain.
    pub fn drain_expired(&self, now: u64) -> Vec<EntityId> {
        let mut entries = self.lock();
        let expired: Vec<EntityId> = entries
            .iter()
            .filter(|&(_, &expires_at)| expires_at <= now)
            .map(|(&entity, _)| entity)
            .collect();
        for entity in &expired {
            entries.remove(entity);
        }
        expired
    }

    /// All entities currently holding a record, live or not yet swept.
    pub fn tracked_ids(&self) -> Vec<EntityId> {
        self.lock().keys().copied().collect()
    }

    /// Drop every record.
    pub fn clear_all(&self) {
        self.lock().clear();
    }

    /// Lock the entry map, recovering from a poisoned mutex.
    ///
    /// No code path panics while holding the lock, but a poisoned map of
    /// plain timers is still usable, so recovery beats propagating.
    fn lock(&self) -> MutexGuard<'_, BTreeMap<EntityId, u64>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
