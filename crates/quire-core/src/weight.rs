#![forbid(unsafe_code)]

//! Weight accounting.
//!
//! Every control has a rendering-cost estimate in abstract weight units.
//! The effective weight of a node resolves, in order: the device-adapter
//! override, the explicit author weight, then a derivation from content.
//! A composite with no visible children costs [`DEFAULT_ITEM_WEIGHT`]
//! rather than zero; a zero-cost composite would pack without bound.

use crate::node::{Content, ControlTree, NodeId};

/// Weight of one control or item when nothing more specific is known.
pub const DEFAULT_ITEM_WEIGHT: u32 = 100;

/// Device page weight assumed when the capability lookup provides none.
pub const DEFAULT_OPTIMUM_PAGE_WEIGHT: u32 = 4000;

/// Grapheme clusters of text flow per weight unit.
pub const CHARS_PER_WEIGHT_UNIT: u32 = 1;

impl ControlTree {
    /// Effective weight of a node's visible subtree.
    #[must_use]
    pub fn effective_weight(&self, id: NodeId) -> u32 {
        let node = self.node(id);
        if let Some(weight) = node.adapter_weight() {
            return weight;
        }
        if let Some(weight) = node.weight() {
            return weight;
        }
        match node.content() {
            Content::Block => DEFAULT_ITEM_WEIGHT,
            Content::Panel => {
                let mut sum = 0u32;
                let mut any = false;
                for child in self.visible_children(id) {
                    any = true;
                    sum = sum.saturating_add(self.effective_weight(child));
                }
                if any { sum } else { DEFAULT_ITEM_WEIGHT }
            }
            Content::Items(source) => source
                .count
                .saturating_mul(source.effective_item_weight()),
            Content::Text(runs) => {
                let chars: usize = runs.iter().map(crate::node::TextRun::grapheme_len).sum();
                (chars as u32).div_ceil(CHARS_PER_WEIGHT_UNIT)
            }
        }
    }
}
