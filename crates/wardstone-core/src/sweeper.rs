//! Periodic expiry sweep for active wards.
//!
//! The host runtime offers no per-key timer primitive, only coarse
//! periodic scheduling, so expiry is driven by a fixed-period sweep: each
//! tick drains everything past its deadline from the effect store,
//! reconciles the host resource, and emits an expiry notification for
//! entities that are still reachable. Offline entities are skipped
//! silently; their cleanup already ran on the disconnect path.
//!
//! One sweeper exists per subsystem lifetime. It is started on init and
//! cancelled on shutdown; [`shutdown`](ExpirationSweeper::shutdown) does
//! not return until the task has terminated, so no orphan timer can
//! outlive the subsystem. Cooldowns are never swept -- they self-expire
//! lazily on the next gate check and need no external reconciliation.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Notify, broadcast};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};
use wardstone_types::{EntityId, StatusEventKind, StatusNotification};

use crate::attribute::AttributeReconciler;
use crate::clock::TimeSource;
use crate::effect::EffectCoordinator;

/// Answers whether an entity is currently reachable.
///
/// Backed by the game host's connection state; the in-memory host double
/// implements it for tests and the demonstration engine.
pub trait EntityPresence: Send + Sync {
    /// Whether `entity` is currently connected.
    fn is_online(&self, entity: EntityId) -> bool;
}

/// Handle to the running sweep task.
pub struct ExpirationSweeper {
    /// The spawned sweep loop.
    handle: JoinHandle<()>,
    /// Stop signal; a stored permit guarantees delivery even if the task
    /// is mid-sweep when shutdown is requested.
    stop: Arc<Notify>,
}

impl ExpirationSweeper {
    /// Spawn the sweep loop with the given period.
    ///
    /// Must be called from within a tokio runtime. The first sweep runs
    /// one full period after start; missed ticks are skipped, not
    /// bursted.
    pub fn start(
        effects: Arc<EffectCoordinator>,
        reconciler: Arc<AttributeReconciler>,
        presence: Arc<dyn EntityPresence>,
        clock: Arc<dyn TimeSource>,
        notifications: broadcast::Sender<StatusNotification>,
        period: Duration,
    ) -> Self {
        let stop = Arc::new(Notify::new());
        let stop_signal = Arc::clone(&stop);

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            // An interval's first tick completes immediately; consume it
            // so sweeps start one period from now.
            ticker.tick().await;

            loop {
                tokio::select! {
                    () = stop_signal.notified() => break,
                    _ = ticker.tick() => {
                        sweep_once(&effects, &reconciler, &presence, clock.as_ref(), &notifications);
                    }
                }
            }
            debug!("expiration sweeper stopped");
        });

        info!(period_ms = u64::try_from(period.as_millis()).unwrap_or(u64::MAX), "expiration sweeper started");
        Self { handle, stop }
    }

    /// Cancel the sweep task and wait for it to terminate.
    ///
    /// On return the task is guaranteed not to run again.
    pub async fn shutdown(self) {
        self.stop.notify_one();
        let _ = self.handle.await;
    }
}

/// Run one sweep pass: drain expired wards, reconcile reachable entities,
/// and emit expiry notifications. Returns the number of drained records.
fn sweep_once(
    effects: &EffectCoordinator,
    reconciler: &AttributeReconciler,
    presence: &Arc<dyn EntityPresence>,
    clock: &dyn TimeSource,
    notifications: &broadcast::Sender<StatusNotification>,
) -> usize {
    let now = clock.now_millis();
    let drained = effects.drain_expired(now);
    let count = drained.len();

    for entity in drained {
        if presence.is_online(entity) {
            reconciler.remove(entity);
            // No subscribers is fine; the core never depends on a sink.
            let _ = notifications.send(StatusNotification::now(entity, StatusEventKind::Expired));
            debug!(%entity, "ward expired");
        } else {
            debug!(%entity, "expired ward for offline entity, cleanup already ran on disconnect");
        }
    }

    count
}
