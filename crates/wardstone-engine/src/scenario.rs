//! Scripted demonstration scenario.
//!
//! Walks the subsystem through its observable behaviors with two entities
//! on the in-memory host: a successful use, a gate refusal, natural
//! expiry via the sweeper, a cross-generation orphan cleanup on join, and
//! a disconnect mid-ward. Everything user-visible goes through tracing;
//! the scenario is the closest thing this binary has to a player.

use std::sync::Arc;
use std::time::Duration;

use tracing::info;
use wardstone_core::{InMemoryAttributeHost, WardSubsystem};
use wardstone_items::{ScrollForge, ScrollService};
use wardstone_types::{AttributeModifier, EntityId, ModifierId, ModifierOperation, ScrollKind};

/// Run the demonstration against a started subsystem.
pub async fn run_demo(subsystem: &Arc<WardSubsystem>, host: &Arc<InMemoryAttributeHost>) {
    // Log every notification the subsystem emits, as a messaging
    // collaborator would.
    let mut rx = subsystem.subscribe();
    let logger = tokio::spawn(async move {
        while let Ok(n) = rx.recv().await {
            info!(entity = %n.entity, kind = ?n.kind, emitted_at = %n.emitted_at, "status notification");
        }
    });

    let forge = ScrollForge::default();
    let service = ScrollService::new(Arc::clone(subsystem));

    // --- Entities join ---
    let first = EntityId::new();
    let second = EntityId::new();
    for entity in [first, second] {
        host.connect(entity);
        subsystem.on_entity_join(entity);
    }
    info!(%first, %second, "entities joined");

    // --- Successful use, then a gate refusal ---
    let mut scroll = forge.forge(ScrollKind::Unlimited);
    let outcome = service.use_scroll(first, &mut scroll);
    info!(entity = %first, ?outcome, "first use attempt");

    let retry = service.use_scroll(first, &mut scroll);
    info!(entity = %first, outcome = ?retry, "immediate retry");

    // --- Natural expiry through the sweeper ---
    let wait = subsystem.duration_seconds().saturating_add(2);
    info!(seconds = wait, "waiting for the ward to expire");
    tokio::time::sleep(Duration::from_secs(wait)).await;
    info!(
        entity = %first,
        active = subsystem.effects().has_active_effect(first),
        gated = subsystem.cooldowns().is_gated(first),
        cooldown_remaining = subsystem.cooldowns().remaining_seconds(first),
        "after expiry"
    );

    // --- Cross-generation orphan cleaned on join ---
    let returning = EntityId::new();
    host.connect(returning);
    host.install_raw(
        returning,
        AttributeModifier {
            id: ModifierId::new(),
            name: wardstone_core::KNOCKBACK_WARD_MODIFIER.to_owned(),
            operation: ModifierOperation::Add,
            magnitude: 1.0,
        },
    );
    subsystem.on_entity_join(returning);
    info!(
        entity = %returning,
        leftover_modifiers = host.persisted_modifier_names(returning).len(),
        "join check reconciled a prior generation's orphan"
    );

    // --- Disconnect mid-ward ---
    let mut second_scroll = forge.forge(ScrollKind::SingleUse);
    let outcome = service.use_scroll(second, &mut second_scroll);
    info!(entity = %second, ?outcome, "second entity used a scroll");

    subsystem.on_entity_leave(second);
    host.disconnect(second);
    info!(
        entity = %second,
        persisted_modifiers = host.persisted_modifier_names(second).len(),
        "left mid-ward, resource reconciled before the handle dropped"
    );

    logger.abort();
    let _ = logger.await;
}
