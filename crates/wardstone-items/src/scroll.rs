//! Ward scroll items: forging, inspection, and consumption.
//!
//! A scroll is an ordinary item stack carrying two persistent tags: a
//! marker identifying it as a ward scroll, and its [`ScrollKind`]. The
//! tags travel with the item through inventories and trades, so
//! identification never depends on display names (which players can
//! rename) -- only on the tag container.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use wardstone_types::ScrollKind;

/// Material of a forged scroll.
pub const SCROLL_MATERIAL: &str = "paper";

/// Tag marking an item as a ward scroll.
pub const SCROLL_TAG: &str = "wardstone:scroll";

/// Tag carrying the scroll's [`ScrollKind`] id.
pub const SCROLL_KIND_TAG: &str = "wardstone:scroll_kind";

/// An item stack as the inventory layer presents it.
///
/// Stands in for the host's item representation: a material, a count,
/// cosmetic fields, and a string-keyed persistent tag container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemStack {
    /// Material identifier (e.g. `paper`).
    pub material: String,
    /// Number of items in the stack.
    pub count: u32,
    /// Display name override, if any.
    pub display_name: Option<String>,
    /// Description lines shown on the item.
    pub lore: Vec<String>,
    /// Persistent tags that travel with the item.
    tags: BTreeMap<String, String>,
}

impl ItemStack {
    /// Create a plain stack with no tags.
    pub fn new(material: &str, count: u32) -> Self {
        Self {
            material: material.to_owned(),
            count,
            display_name: None,
            lore: Vec::new(),
            tags: BTreeMap::new(),
        }
    }

    /// Whether the stack is unusable (empty or no material).
    pub fn is_empty(&self) -> bool {
        self.count == 0 || self.material.is_empty()
    }

    /// Read a persistent tag.
    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags.get(key).map(String::as_str)
    }

    /// Write a persistent tag.
    pub fn set_tag(&mut self, key: &str, value: &str) {
        self.tags.insert(key.to_owned(), value.to_owned());
    }
}

/// Cosmetic appearance applied to forged scrolls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrollStyle {
    /// Display name stamped on the item.
    #[serde(default = "default_display_name")]
    pub display_name: String,

    /// Lore lines stamped on the item.
    #[serde(default = "default_lore")]
    pub lore: Vec<String>,
}

impl Default for ScrollStyle {
    fn default() -> Self {
        Self {
            display_name: default_display_name(),
            lore: default_lore(),
        }
    }
}

fn default_display_name() -> String {
    "Ward Scroll".to_owned()
}

fn default_lore() -> Vec<String> {
    vec![
        "Grants temporary immunity to knockback.".to_owned(),
        "Right-click to use.".to_owned(),
    ]
}

/// Creates and converts ward scrolls.
#[derive(Debug, Clone, Default)]
pub struct ScrollForge {
    /// Appearance applied to forged items.
    style: ScrollStyle,
}

impl ScrollForge {
    /// Create a forge with the given appearance.
    pub const fn new(style: ScrollStyle) -> Self {
        Self { style }
    }

    /// Forge a fresh single scroll of the given kind.
    pub fn forge(&self, kind: ScrollKind) -> ItemStack {
        let mut item = ItemStack::new(SCROLL_MATERIAL, 1);
        item.display_name = Some(self.style.display_name.clone());
        item.lore.clone_from(&self.style.lore);
        stamp_tags(&mut item, kind);
        item
    }

    /// Convert an existing stack into a ward scroll in place.
    ///
    /// Returns `false` if the stack is empty (nothing to convert).
    pub fn convert(&self, item: &mut ItemStack, kind: ScrollKind) -> bool {
        if item.is_empty() {
            return false;
        }
        item.display_name = Some(self.style.display_name.clone());
        item.lore.clone_from(&self.style.lore);
        stamp_tags(item, kind);
        true
    }
}

fn stamp_tags(item: &mut ItemStack, kind: ScrollKind) {
    item.set_tag(SCROLL_TAG, "1");
    item.set_tag(SCROLL_KIND_TAG, kind.id());
}

/// Whether `item` is a ward scroll.
///
/// Decided solely by the marker tag; renamed or re-lored scrolls still
/// qualify, and look-alike items without the tag never do.
pub fn is_ward_scroll(item: &ItemStack) -> bool {
    !item.is_empty() && item.tag(SCROLL_TAG).is_some()
}

/// The scroll kind of `item`, or `None` if it is not a ward scroll (or
/// carries an unknown kind tag).
pub fn scroll_kind(item: &ItemStack) -> Option<ScrollKind> {
    if !is_ward_scroll(item) {
        return None;
    }
    item.tag(SCROLL_KIND_TAG).and_then(ScrollKind::from_id)
}

/// Consume one use from a scroll stack.
///
/// Single-use scrolls shrink by one; unlimited scrolls are untouched.
/// Returns `false` for non-scrolls, empty stacks, and unknown kinds --
/// the use-request flow treats that as "nothing consumed, nothing
/// granted".
pub fn consume_scroll(item: &mut ItemStack) -> bool {
    match scroll_kind(item) {
        Some(ScrollKind::SingleUse) => {
            item.count = item.count.saturating_sub(1);
            true
        }
        Some(ScrollKind::Unlimited) => true,
        None => false,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn forged_scroll_is_recognized() {
        let forge = ScrollForge::default();
        let item = forge.forge(ScrollKind::SingleUse);
        assert!(is_ward_scroll(&item));
        assert_eq!(scroll_kind(&item), Some(ScrollKind::SingleUse));
        assert_eq!(item.material, SCROLL_MATERIAL);
        assert_eq!(item.count, 1);
    }

    #[test]
    fn plain_item_is_not_a_scroll() {
        let item = ItemStack::new("paper", 1);
        assert!(!is_ward_scroll(&item));
        assert_eq!(scroll_kind(&item), None);
    }

    #[test]
    fn renamed_scroll_is_still_a_scroll() {
        let forge = ScrollForge::default();
        let mut item = forge.forge(ScrollKind::Unlimited);
        item.display_name = Some("Totally Ordinary Paper".to_owned());
        assert!(is_ward_scroll(&item));
    }

    #[test]
    fn empty_stack_is_not_a_scroll() {
        let forge = ScrollForge::default();
        let mut item = forge.forge(ScrollKind::SingleUse);
        item.count = 0;
        assert!(!is_ward_scroll(&item));
    }

    #[test]
    fn convert_stamps_existing_item() {
        let forge = ScrollForge::default();
        let mut item = ItemStack::new("vellum", 3);
        assert!(forge.convert(&mut item, ScrollKind::Unlimited));
        assert!(is_ward_scroll(&item));
        assert_eq!(scroll_kind(&item), Some(ScrollKind::Unlimited));
        // Conversion re-styles but keeps the material and count.
        assert_eq!(item.material, "vellum");
        assert_eq!(item.count, 3);
    }

    #[test]
    fn convert_refuses_empty_stack() {
        let forge = ScrollForge::default();
        let mut item = ItemStack::new("paper", 0);
        assert!(!forge.convert(&mut item, ScrollKind::SingleUse));
        assert!(!is_ward_scroll(&item));
    }

    #[test]
    fn single_use_scroll_is_consumed() {
        let forge = ScrollForge::default();
        let mut item = forge.forge(ScrollKind::SingleUse);
        assert!(consume_scroll(&mut item));
        assert_eq!(item.count, 0);
        // The emptied stack can no longer be used.
        assert!(!consume_scroll(&mut item));
    }

    #[test]
    fn unlimited_scroll_is_never_consumed() {
        let forge = ScrollForge::default();
        let mut item = forge.forge(ScrollKind::Unlimited);
        assert!(consume_scroll(&mut item));
        assert!(consume_scroll(&mut item));
        assert_eq!(item.count, 1);
    }

    #[test]
    fn unknown_kind_tag_is_not_consumable() {
        let mut item = ItemStack::new(SCROLL_MATERIAL, 1);
        item.set_tag(SCROLL_TAG, "1");
        item.set_tag(SCROLL_KIND_TAG, "mystery");
        assert_eq!(scroll_kind(&item), None);
        assert!(!consume_scroll(&mut item));
        assert_eq!(item.count, 1);
    }

    #[test]
    fn style_parses_from_yaml_shaped_json() {
        let style: ScrollStyle =
            serde_json::from_str(r#"{"display_name": "Scroll of Steadfastness"}"#).unwrap();
        assert_eq!(style.display_name, "Scroll of Steadfastness");
        // Lore falls back to the default lines.
        assert_eq!(style.lore.len(), 2);
    }
}
