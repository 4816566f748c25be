//! Subsystem assembly and lifecycle hooks.
//!
//! [`WardSubsystem`] wires the cooldown gate, effect coordinator,
//! reconciler, sweeper, and notification channel into one unit with the
//! lifecycle the host calls into:
//!
//! - `start` on subsystem init (launches the sweeper)
//! - `on_entity_join` / `on_entity_leave` on connection events
//! - `shutdown` on subsystem teardown (cancels the sweeper first, then
//!   reconciles every tracked entity, then clears all state)
//!
//! All stores are owned by the subsystem and constructed at init; there
//! is no ambient or static state, so a reload constructs a fresh
//! generation whose only contamination risk -- orphaned host modifiers --
//! is handled by the reconciler's name scan.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::broadcast;
use tracing::{debug, info};
use wardstone_types::{EntityId, StatusEventKind, StatusNotification};

use crate::attribute::{AttributeHost, AttributeReconciler};
use crate::clock::TimeSource;
use crate::config::WardstoneConfig;
use crate::cooldown::CooldownGate;
use crate::effect::EffectCoordinator;
use crate::sweeper::{EntityPresence, ExpirationSweeper};

/// Capacity of the notification broadcast channel.
///
/// A subscriber that falls behind by more than this many messages skips
/// to the newest rather than blocking the core.
const NOTIFICATION_CAPACITY: usize = 256;

/// Errors from subsystem lifecycle operations.
#[derive(Debug, thiserror::Error)]
pub enum SubsystemError {
    /// `start` was called while the sweeper is already running.
    #[error("expiration sweeper is already running")]
    SweeperAlreadyRunning,
}

/// The assembled ward subsystem.
///
/// Cheap to share behind an [`Arc`]; every operation takes `&self`.
pub struct WardSubsystem {
    /// Ward duration granted on activation, in seconds.
    duration_seconds: u64,
    /// Cooldown started alongside each activation, in seconds.
    cooldown_seconds: u64,
    /// Sweep period.
    sweep_interval: Duration,
    /// Shared monotonic time source.
    clock: Arc<dyn TimeSource>,
    /// Active-ward coordinator.
    effects: Arc<EffectCoordinator>,
    /// Per-entity cooldown gate.
    cooldowns: CooldownGate,
    /// Host-resource reconciler, shared with the coordinator and sweeper.
    reconciler: Arc<AttributeReconciler>,
    /// Reachability source for the sweeper.
    presence: Arc<dyn EntityPresence>,
    /// Notification fan-out to messaging collaborators.
    notifications: broadcast::Sender<StatusNotification>,
    /// The running sweeper, present between `start` and `shutdown`.
    sweeper: Mutex<Option<ExpirationSweeper>>,
}

impl WardSubsystem {
    /// Assemble a subsystem from configuration and host capabilities.
    ///
    /// Nothing runs until [`start`](Self::start) is called.
    pub fn new(
        config: &WardstoneConfig,
        host: Arc<dyn AttributeHost>,
        presence: Arc<dyn EntityPresence>,
        clock: Arc<dyn TimeSource>,
    ) -> Self {
        let reconciler = Arc::new(AttributeReconciler::new(host));
        let effects = Arc::new(EffectCoordinator::new(
            Arc::clone(&clock),
            Arc::clone(&reconciler),
        ));
        let cooldowns = CooldownGate::new(Arc::clone(&clock));
        let (notifications, _) = broadcast::channel(NOTIFICATION_CAPACITY);

        Self {
            duration_seconds: config.status.duration_seconds,
            cooldown_seconds: config.status.cooldown_seconds,
            sweep_interval: Duration::from_millis(config.sweeper.interval_ms),
            clock,
            effects,
            cooldowns,
            reconciler,
            presence,
            notifications,
            sweeper: Mutex::new(None),
        }
    }

    /// Launch the expiration sweeper.
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`SubsystemError::SweeperAlreadyRunning`] if `start` was
    /// already called without an intervening shutdown.
    pub fn start(&self) -> Result<(), SubsystemError> {
        let mut guard = self.sweeper.lock().unwrap_or_else(PoisonError::into_inner);
        if guard.is_some() {
            return Err(SubsystemError::SweeperAlreadyRunning);
        }
        *guard = Some(ExpirationSweeper::start(
            Arc::clone(&self.effects),
            Arc::clone(&self.reconciler),
            Arc::clone(&self.presence),
            Arc::clone(&self.clock),
            self.notifications.clone(),
            self.sweep_interval,
        ));
        info!(
            duration_seconds = self.duration_seconds,
            cooldown_seconds = self.cooldown_seconds,
            "ward subsystem started"
        );
        Ok(())
    }

    /// Subscribe to status lifecycle notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<StatusNotification> {
        self.notifications.subscribe()
    }

    /// The cooldown gate, for the use-request flow's gate check.
    pub const fn cooldowns(&self) -> &CooldownGate {
        &self.cooldowns
    }

    /// The effect coordinator, for active-status queries.
    pub fn effects(&self) -> &EffectCoordinator {
        &self.effects
    }

    /// Configured ward duration in seconds.
    pub const fn duration_seconds(&self) -> u64 {
        self.duration_seconds
    }

    /// Configured cooldown in seconds.
    pub const fn cooldown_seconds(&self) -> u64 {
        self.cooldown_seconds
    }

    /// Grant the ward to `entity` and start its cooldown.
    ///
    /// The caller (use-request flow) has already checked the gate and the
    /// active status; this performs the gate start and the activation in
    /// the contract's order and emits the `Activated` notification.
    pub fn activate(&self, entity: EntityId) {
        self.cooldowns.start(entity, self.cooldown_seconds);
        self.effects.activate(entity, self.duration_seconds);
        let _ = self
            .notifications
            .send(StatusNotification::now(entity, StatusEventKind::Activated));
    }

    /// Connection-time safety check.
    ///
    /// If the entity has no active ward but its attribute resource still
    /// carries a ward modifier (artifact of a crash or a prior subsystem
    /// generation surviving a reconnect), remove it.
    pub fn on_entity_join(&self, entity: EntityId) {
        if !self.effects.has_active_effect(entity) {
            self.reconciler.remove(entity);
            debug!(%entity, "join check reconciled entity with no active ward");
        }
    }

    /// Disconnect-time cleanup, unconditional.
    ///
    /// Must be called while the entity handle is still valid so the host
    /// resource never outlives it. Clears ward state, host modifiers, and
    /// the cooldown.
    pub fn on_entity_leave(&self, entity: EntityId) {
        self.effects.cleanup_entity(entity);
        self.cooldowns.release(entity);
        debug!(%entity, "entity state cleaned up on leave");
    }

    /// Tear the subsystem down.
    ///
    /// Cancels the sweeper and waits for it to terminate, reconciles every
    /// entity still tracked live, then clears both stores and the
    /// reconciler bookkeeping. Idempotent.
    pub async fn shutdown(&self) {
        let sweeper = {
            let mut guard = self.sweeper.lock().unwrap_or_else(PoisonError::into_inner);
            guard.take()
        };
        if let Some(sweeper) = sweeper {
            sweeper.shutdown().await;
        }

        for entity in self.effects.tracked_entities() {
            self.effects.cleanup_entity(entity);
        }
        self.effects.clear_records();
        self.cooldowns.clear_all();
        self.reconciler.clear();
        info!("ward subsystem stopped");
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::attribute::{InMemoryAttributeHost, KNOCKBACK_WARD_MODIFIER};
    use crate::clock::ManualClock;
    use wardstone_types::{AttributeModifier, ModifierId, ModifierOperation};

    struct Fixture {
        host: Arc<InMemoryAttributeHost>,
        clock: Arc<ManualClock>,
        subsystem: WardSubsystem,
    }

    fn fixture(config: &WardstoneConfig) -> Fixture {
        let host = Arc::new(InMemoryAttributeHost::new());
        let clock = Arc::new(ManualClock::new());
        let subsystem = WardSubsystem::new(
            config,
            Arc::clone(&host) as Arc<dyn AttributeHost>,
            Arc::clone(&host) as Arc<dyn EntityPresence>,
            Arc::clone(&clock) as Arc<dyn TimeSource>,
        );
        Fixture {
            host,
            clock,
            subsystem,
        }
    }

    fn ward_count(host: &InMemoryAttributeHost, entity: EntityId) -> usize {
        host.modifiers(entity)
            .unwrap_or_default()
            .iter()
            .filter(|m| m.name == KNOCKBACK_WARD_MODIFIER)
            .count()
    }

    #[test]
    fn activate_grants_ward_and_starts_cooldown() {
        let f = fixture(&WardstoneConfig::default());
        let entity = EntityId::new();
        f.host.connect(entity);

        f.subsystem.activate(entity);

        assert!(f.subsystem.effects().has_active_effect(entity));
        assert!(f.subsystem.cooldowns().is_gated(entity));
        assert_eq!(f.subsystem.effects().remaining_seconds(entity), 10);
        assert_eq!(f.subsystem.cooldowns().remaining_seconds(entity), 60);
    }

    #[test]
    fn activate_emits_notification() {
        let f = fixture(&WardstoneConfig::default());
        let entity = EntityId::new();
        f.host.connect(entity);

        let mut rx = f.subsystem.subscribe();
        f.subsystem.activate(entity);

        let n = rx.try_recv().ok();
        assert_eq!(
            n.map(|n| (n.entity, n.kind)),
            Some((entity, StatusEventKind::Activated))
        );
    }

    #[test]
    fn cooldown_outlives_expired_ward() {
        let f = fixture(&WardstoneConfig::default());
        let entity = EntityId::new();
        f.host.connect(entity);

        f.subsystem.activate(entity);
        f.clock.advance(11_000);

        assert!(!f.subsystem.effects().has_active_effect(entity));
        assert!(f.subsystem.cooldowns().is_gated(entity));
        assert_eq!(f.subsystem.cooldowns().remaining_seconds(entity), 49);
    }

    #[test]
    fn join_check_removes_orphaned_modifier() {
        let f = fixture(&WardstoneConfig::default());
        let entity = EntityId::new();
        f.host.connect(entity);

        // Simulate a prior generation's leftover.
        f.host.install_raw(
            entity,
            AttributeModifier {
                id: ModifierId::new(),
                name: KNOCKBACK_WARD_MODIFIER.to_owned(),
                operation: ModifierOperation::Add,
                magnitude: 1.0,
            },
        );

        f.subsystem.on_entity_join(entity);

        assert_eq!(ward_count(&f.host, entity), 0);
    }

    #[test]
    fn join_check_leaves_active_ward_alone() {
        let f = fixture(&WardstoneConfig::default());
        let entity = EntityId::new();
        f.host.connect(entity);

        f.subsystem.activate(entity);
        f.subsystem.on_entity_join(entity);

        assert!(f.subsystem.effects().has_active_effect(entity));
        assert_eq!(ward_count(&f.host, entity), 1);
    }

    #[test]
    fn leave_cleans_ward_and_cooldown_unconditionally() {
        let f = fixture(&WardstoneConfig::default());
        let entity = EntityId::new();
        f.host.connect(entity);

        f.subsystem.activate(entity);
        f.subsystem.on_entity_leave(entity);

        assert!(!f.subsystem.effects().has_active_effect(entity));
        assert!(!f.subsystem.cooldowns().is_gated(entity));
        assert_eq!(ward_count(&f.host, entity), 0);
    }

    #[test]
    fn leave_without_state_is_a_no_op() {
        let f = fixture(&WardstoneConfig::default());
        let entity = EntityId::new();
        f.host.connect(entity);

        f.subsystem.on_entity_leave(entity);
    }

    #[tokio::test]
    async fn start_twice_is_rejected() {
        let f = fixture(&WardstoneConfig::default());
        assert!(f.subsystem.start().is_ok());
        assert!(matches!(
            f.subsystem.start(),
            Err(SubsystemError::SweeperAlreadyRunning)
        ));
        f.subsystem.shutdown().await;
    }

    #[tokio::test]
    async fn shutdown_reconciles_all_tracked_entities() {
        let f = fixture(&WardstoneConfig::default());
        let a = EntityId::new();
        let b = EntityId::new();
        f.host.connect(a);
        f.host.connect(b);

        f.subsystem.start().ok();
        f.subsystem.activate(a);
        f.subsystem.activate(b);

        f.subsystem.shutdown().await;

        assert_eq!(ward_count(&f.host, a), 0);
        assert_eq!(ward_count(&f.host, b), 0);
        assert!(f.subsystem.effects().tracked_entities().is_empty());
        assert!(!f.subsystem.cooldowns().is_gated(a));
    }

    #[tokio::test]
    async fn restart_after_shutdown_is_allowed() {
        let f = fixture(&WardstoneConfig::default());
        f.subsystem.start().ok();
        f.subsystem.shutdown().await;
        assert!(f.subsystem.start().is_ok());
        f.subsystem.shutdown().await;
    }
}
