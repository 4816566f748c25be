//! Attribute host capability and modifier reconciliation.
//!
//! The game host owns, per entity, a mutable attribute resource holding
//! named modifiers that influence gameplay numerics. The host is
//! authoritative for what an installed modifier *does*; the
//! [`AttributeReconciler`] is solely responsible for *when* the ward
//! modifier exists, and is the only component allowed to mutate the
//! resource -- that exclusivity is what keeps the "who installed this"
//! bookkeeping accurate.
//!
//! The resource is only partially observable: it can be absent for a given
//! entity, and it can retain modifiers installed by a *previous subsystem
//! generation* (the bookkeeping map is memory-only and wiped on restart,
//! while the host resource survives a hot reload). Removal therefore runs
//! two passes: precise identity-based removal of the tracked instance,
//! then a name-based scan that converges the resource to "no modifier with
//! the ward's name" even when bookkeeping is stale or empty.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, warn};
use wardstone_types::{AttributeModifier, EntityId, ModifierId, ModifierOperation};

use crate::sweeper::EntityPresence;

/// Symbolic name of the knockback ward modifier.
///
/// Fixed across subsystem generations so the name-based cleanup scan can
/// find orphans installed by a prior process.
pub const KNOCKBACK_WARD_MODIFIER: &str = "wardstone_knockback_ward";

/// Magnitude installed for the ward: full displacement immunity.
const WARD_MAGNITUDE: f64 = 1.0;

/// Capability interface onto the host's per-entity attribute resources.
///
/// `None` / `false` returns mean "resource absent for this entity" -- an
/// expected condition, never an error. Implementations must be safe to
/// call concurrently from event callbacks and the sweeper task.
pub trait AttributeHost: Send + Sync {
    /// List the modifiers currently installed on `entity`'s attribute
    /// resource, or `None` if the resource is absent.
    fn modifiers(&self, entity: EntityId) -> Option<Vec<AttributeModifier>>;

    /// Install `modifier` on `entity`'s attribute resource.
    ///
    /// Returns `false` if the resource is absent (nothing was installed).
    fn add_modifier(&self, entity: EntityId, modifier: AttributeModifier) -> bool;

    /// Remove the modifier instance with identity `modifier` from
    /// `entity`'s attribute resource.
    ///
    /// Returns `false` if the resource is absent or no such instance
    /// exists.
    fn remove_modifier(&self, entity: EntityId, modifier: ModifierId) -> bool;
}

/// Installs and removes the ward modifier, idempotently.
///
/// Tracks at most one installed modifier identity per entity. The
/// bookkeeping is an index into host-owned state, not ownership of it.
pub struct AttributeReconciler {
    /// The host the modifiers live on.
    host: Arc<dyn AttributeHost>,
    /// Entity -> identity of the modifier this reconciler installed.
    installed: Mutex<BTreeMap<EntityId, ModifierId>>,
}

impl AttributeReconciler {
    /// Create a reconciler with empty bookkeeping.
    pub fn new(host: Arc<dyn AttributeHost>) -> Self {
        Self {
            host,
            installed: Mutex::new(BTreeMap::new()),
        }
    }

    /// Install the ward modifier on `entity`, replacing any prior install.
    ///
    /// Runs an explicit remove-then-install two-step: a redundant `apply`
    /// (double activation) self-heals instead of stacking duplicates. If
    /// the attribute resource is absent the call is a silent no-op and no
    /// bookkeeping is recorded; there is no automatic retry.
    pub fn apply(&self, entity: EntityId) {
        self.remove(entity);

        let modifier = AttributeModifier {
            id: ModifierId::new(),
            name: KNOCKBACK_WARD_MODIFIER.to_owned(),
            operation: ModifierOperation::Add,
            magnitude: WARD_MAGNITUDE,
        };
        let identity = modifier.id;

        if self.host.add_modifier(entity, modifier) {
            self.lock().insert(entity, identity);
            debug!(%entity, %identity, "ward modifier installed");
        } else {
            debug!(%entity, "attribute resource absent, ward modifier not installed");
        }
    }

    /// Remove every ward modifier from `entity`'s attribute resource.
    ///
    /// Pass one removes the tracked instance by identity (precise, cheap).
    /// Pass two scans the live modifier list by name and removes all
    /// matches, cleaning orphans a prior subsystem generation left behind.
    /// Safe to call when nothing is installed; this is the universal
    /// cleanup primitive for every exit path.
    pub fn remove(&self, entity: EntityId) {
        let tracked = self.lock().remove(&entity);
        if let Some(identity) = tracked {
            self.host.remove_modifier(entity, identity);
        }

        let Some(modifiers) = self.host.modifiers(entity) else {
            return;
        };
        for modifier in modifiers {
            if modifier.name == KNOCKBACK_WARD_MODIFIER {
                self.host.remove_modifier(entity, modifier.id);
                if tracked.is_none() {
                    warn!(
                        %entity,
                        identity = %modifier.id,
                        "removed ward modifier with no bookkeeping entry (prior generation?)"
                    );
                }
            }
        }
    }

    /// Whether bookkeeping records an installed modifier for `entity`.
    pub fn has_installed(&self, entity: EntityId) -> bool {
        self.lock().contains_key(&entity)
    }

    /// Number of entities with a tracked installed modifier.
    pub fn installed_count(&self) -> usize {
        self.lock().len()
    }

    /// Wipe all bookkeeping (subsystem shutdown).
    ///
    /// Does not touch the host; callers remove per-entity first while
    /// entity handles are still valid.
    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Lock the bookkeeping map, recovering from a poisoned mutex.
    fn lock(&self) -> MutexGuard<'_, BTreeMap<EntityId, ModifierId>> {
        self.installed.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

// ---------------------------------------------------------------------------
// In-memory host double
// ---------------------------------------------------------------------------

/// In-memory [`AttributeHost`] and [`EntityPresence`] implementation.
///
/// Models the host faithfully enough for tests and the demonstration
/// engine: each connected entity has an attribute resource whose contents
/// *survive disconnects* (the real host persists attribute state with the
/// entity), but the resource is unreachable -- absent -- while the entity
/// is offline. Modifiers can also be injected directly, simulating a
/// prior subsystem generation's leftovers.
#[derive(Default)]
pub struct InMemoryAttributeHost {
    /// Entity -> persisted modifier list (survives disconnect).
    resources: Mutex<BTreeMap<EntityId, Vec<AttributeModifier>>>,
    /// Entities currently online (resource reachable).
    online: Mutex<BTreeSet<EntityId>>,
}

impl InMemoryAttributeHost {
    /// Create a host with no entities.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bring `entity` online, creating its attribute resource if needed.
    pub fn connect(&self, entity: EntityId) {
        self.lock_online().insert(entity);
        self.lock_resources().entry(entity).or_default();
    }

    /// Take `entity` offline. Its persisted modifier list is retained.
    pub fn disconnect(&self, entity: EntityId) {
        self.lock_online().remove(&entity);
    }

    /// Drop `entity` entirely, including persisted attribute state.
    pub fn wipe(&self, entity: EntityId) {
        self.lock_online().remove(&entity);
        self.lock_resources().remove(&entity);
    }

    /// Install a modifier directly, bypassing any reconciler bookkeeping.
    ///
    /// Simulates a modifier left behind by a prior subsystem generation.
    pub fn install_raw(&self, entity: EntityId, modifier: AttributeModifier) {
        self.lock_resources().entry(entity).or_default().push(modifier);
    }

    /// Names of the modifiers persisted for `entity`, online or not.
    ///
    /// Test helper; the trait methods respect reachability, this does not.
    pub fn persisted_modifier_names(&self, entity: EntityId) -> Vec<String> {
        self.lock_resources()
            .get(&entity)
            .map(|mods| mods.iter().map(|m| m.name.clone()).collect())
            .unwrap_or_default()
    }

    fn lock_resources(&self) -> MutexGuard<'_, BTreeMap<EntityId, Vec<AttributeModifier>>> {
        self.resources.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_online(&self) -> MutexGuard<'_, BTreeSet<EntityId>> {
        self.online.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl AttributeHost for InMemoryAttributeHost {
    fn modifiers(&self, entity: EntityId) -> Option<Vec<AttributeModifier>> {
        if !self.lock_online().contains(&entity) {
            return None;
        }
        self.lock_resources().get(&entity).cloned()
    }

    fn add_modifier(&self, entity: EntityId, modifier: AttributeModifier) -> bool {
        if !self.lock_online().contains(&entity) {
            return false;
        }
        let mut resources = self.lock_resources();
        let Some(mods) = resources.get_mut(&entity) else {
            return false;
        };
        mods.push(modifier);
        true
    }

    fn remove_modifier(&self, entity: EntityId, modifier: ModifierId) -> bool {
        if !self.lock_online().contains(&entity) {
            return false;
        }
        let mut resources = self.lock_resources();
        let Some(mods) = resources.get_mut(&entity) else {
            return false;
        };
        let before = mods.len();
        mods.retain(|m| m.id != modifier);
        mods.len() < before
    }
}

impl EntityPresence for InMemoryAttributeHost {
    fn is_online(&self, entity: EntityId) -> bool {
        self.lock_online().contains(&entity)
    }
}
