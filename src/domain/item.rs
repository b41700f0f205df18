//! Item stacks stored in faction warehouses.

use serde::{Deserialize, Serialize};

/// One occupied warehouse slot.
///
/// The registry treats stacks as opaque payload; it only guarantees they
/// survive a save/load cycle unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemStack {
    pub material: String,
    pub amount: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub lore: Vec<String>,
}

impl ItemStack {
    /// Plain stack without a custom name or lore.
    pub fn new(material: impl Into<String>, amount: u32) -> Self {
        Self {
            material: material.into(),
            amount,
            display_name: None,
            lore: Vec::new(),
        }
    }

    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }
}

/// Warehouse contents: one entry per slot, `None` for an empty slot.
pub type Slots = Vec<Option<ItemStack>>;

/// All-empty slot array of the given size.
#[must_use]
pub fn empty_slots(size: usize) -> Slots {
    vec![None; size]
}
