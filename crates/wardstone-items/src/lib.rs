//! Ward scroll items and the use-request flow for Wardstone.
//!
//! This crate is the item-layer collaborator of the core: it decides
//! *whether* a use attempt should reach the subsystem (tag identification,
//! gate and active-status checks, consumption) while the core decides
//! everything about the status itself.
//!
//! # Modules
//!
//! - [`scroll`] -- Tagged scroll items: forging, inspection, consumption
//! - [`service`] -- The use-request sequence and its typed outcomes

pub mod scroll;
pub mod service;

pub use scroll::{
    ItemStack, SCROLL_KIND_TAG, SCROLL_MATERIAL, SCROLL_TAG, ScrollForge, ScrollStyle,
    consume_scroll, is_ward_scroll, scroll_kind,
};
pub use service::{ScrollService, UseOutcome};
