//! Enumeration types shared across the Wardstone workspace.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Status lifecycle events
// ---------------------------------------------------------------------------

/// Lifecycle event kinds emitted on the notification channel.
///
/// The core emits typed events only; rendering them as user-visible text
/// (and any localization) is the messaging collaborator's job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatusEventKind {
    /// The ward was granted to the entity.
    Activated,
    /// The ward ran out and was reconciled away by the sweeper.
    Expired,
}

// ---------------------------------------------------------------------------
// Attribute modifiers
// ---------------------------------------------------------------------------

/// How a modifier combines with the attribute's base value.
///
/// Mirrors the operations the attribute host understands. The knockback
/// ward only ever installs [`ModifierOperation::Add`] with magnitude 1.0
/// (full displacement immunity), but the host contract carries the
/// operation so the resource model stays faithful.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModifierOperation {
    /// Add the magnitude to the attribute's base value.
    Add,
    /// Multiply the attribute's running total by `1 + magnitude`.
    Multiply,
}

// ---------------------------------------------------------------------------
// Scroll kinds
// ---------------------------------------------------------------------------

/// The consumption behavior of a ward scroll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScrollKind {
    /// Consumed on use; the stack shrinks by one.
    SingleUse,
    /// Never consumed; usable any number of times.
    Unlimited,
}

impl ScrollKind {
    /// Stable identifier stored in the item tag.
    pub const fn id(self) -> &'static str {
        match self {
            Self::SingleUse => "single-use",
            Self::Unlimited => "unlimited",
        }
    }

    /// Parse a tag identifier back into a kind.
    ///
    /// Matching is case-insensitive. Unknown identifiers return `None`.
    pub fn from_id(id: &str) -> Option<Self> {
        if id.eq_ignore_ascii_case("single-use") {
            Some(Self::SingleUse)
        } else if id.eq_ignore_ascii_case("unlimited") {
            Some(Self::Unlimited)
        } else {
            None
        }
    }
}
