//! The use-request flow: from "entity right-clicked an item" to a
//! granted ward or a typed refusal.
//!
//! The service performs the checks in a fixed order -- scroll identity,
//! cooldown gate, active status, consumption -- and only then activates.
//! The ordering matters for two reasons: a gated entity must be refused
//! *before* its scroll is consumed, and an already-active entity is
//! refused here rather than resetting its timer (the coordinator would
//! accept a redundant activate, but the flow treats it as user error).
//!
//! Outcomes are typed; rendering them as messages or sounds is the
//! messaging collaborator's job.

use std::sync::Arc;

use tracing::debug;
use wardstone_core::WardSubsystem;
use wardstone_types::EntityId;

use crate::scroll::{self, ItemStack};

/// Result of a use attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UseOutcome {
    /// The ward was granted.
    Activated {
        /// How long the ward will last, in seconds.
        duration_seconds: u64,
    },
    /// Refused at the cooldown gate.
    OnCooldown {
        /// Seconds until the gate releases, rounded up.
        remaining_seconds: u64,
    },
    /// Refused because the entity already holds the ward.
    AlreadyActive,
    /// The item is not a ward scroll; the flow ignores it.
    NotAScroll,
    /// The scroll stack was empty or unconsumable.
    Depleted,
}

/// Drives the use-request sequence against the subsystem.
pub struct ScrollService {
    /// The subsystem that owns all status state.
    subsystem: Arc<WardSubsystem>,
}

impl ScrollService {
    /// Create a service for the given subsystem.
    pub const fn new(subsystem: Arc<WardSubsystem>) -> Self {
        Self { subsystem }
    }

    /// Attempt to use `item` as a ward scroll for `entity`.
    ///
    /// On success the scroll is consumed (single-use stacks shrink by
    /// one), the cooldown starts, and the ward is activated. On any
    /// refusal the item is untouched.
    pub fn use_scroll(&self, entity: EntityId, item: &mut ItemStack) -> UseOutcome {
        if !scroll::is_ward_scroll(item) {
            return UseOutcome::NotAScroll;
        }

        if self.subsystem.cooldowns().is_gated(entity) {
            let remaining_seconds = self.subsystem.cooldowns().remaining_seconds(entity);
            debug!(%entity, remaining_seconds, "use refused at the cooldown gate");
            return UseOutcome::OnCooldown { remaining_seconds };
        }

        if self.subsystem.effects().has_active_effect(entity) {
            debug!(%entity, "use refused, ward already active");
            return UseOutcome::AlreadyActive;
        }

        if !scroll::consume_scroll(item) {
            return UseOutcome::Depleted;
        }

        self.subsystem.activate(entity);
        UseOutcome::Activated {
            duration_seconds: self.subsystem.duration_seconds(),
        }
    }
}
