#![forbid(unsafe_code)]

//! Recursive pagination of a control tree.
//!
//! [`Paginator`] walks the tree once per render pass, asking the shared
//! [`ControlPager`] for page numbers and recording a [`PageSpan`] per
//! visible node in the resulting [`PageMap`]. Composites either paginate
//! their children individually or are placed whole as one atomic unit;
//! list and text controls page their own collections through
//! [`ControlPager::item_pager`] and [`paginate_text`].
//!
//! A pass can also be pointed at a single designated control deep in the
//! tree: only that subtree is paginated, its ancestors are widened to
//! cover the result, and everything else stays visible on every page.

use quire_core::{Content, ControlTree, NodeFlags, NodeId};
use rustc_hash::FxHashMap;

use crate::error::{PaginateError, PaginateResult};
use crate::pager::{ControlPager, ItemPager, PageSpan};
use crate::text::{TextLayout, paginate_text};

/// Output of one pagination pass.
#[derive(Debug, Clone, PartialEq)]
pub struct PageMap {
    spans: FxHashMap<NodeId, PageSpan>,
    items: FxHashMap<NodeId, ItemPager>,
    text: FxHashMap<NodeId, TextLayout>,
    page_count: u32,
}

impl PageMap {
    fn new() -> Self {
        Self {
            spans: FxHashMap::default(),
            items: FxHashMap::default(),
            text: FxHashMap::default(),
            page_count: 1,
        }
    }

    /// Pages assigned to a node. Nodes outside the paginated region
    /// (or passes with pagination disabled) report [`PageSpan::All`].
    #[must_use]
    pub fn span(&self, id: NodeId) -> PageSpan {
        self.spans.get(&id).copied().unwrap_or(PageSpan::All)
    }

    /// Total device pages produced by the pass.
    #[must_use]
    pub fn page_count(&self) -> u32 {
        self.page_count
    }

    /// Whether a node is rendered on `page`.
    #[must_use]
    pub fn is_visible_on(&self, id: NodeId, page: u32) -> bool {
        self.span(id).contains(page)
    }

    /// Item slices for a list-style node, if the pass visited one.
    #[must_use]
    pub fn items(&self, id: NodeId) -> Option<&ItemPager> {
        self.items.get(&id)
    }

    /// Text slices for a text node, if the pass visited one.
    #[must_use]
    pub fn text_layout(&self, id: NodeId) -> Option<&TextLayout> {
        self.text.get(&id)
    }
}

/// One pagination pass over a control tree.
pub struct Paginator<'t> {
    tree: &'t ControlTree,
    pager: ControlPager,
    map: PageMap,
}

impl<'t> Paginator<'t> {
    /// Paginate the whole tree.
    pub fn paginate(tree: &'t ControlTree, pager: ControlPager) -> PaginateResult<PageMap> {
        Self::run(tree, pager, None)
    }

    /// Paginate only the designated control's subtree; the rest of the
    /// tree stays visible on every page.
    pub fn paginate_target(
        tree: &'t ControlTree,
        pager: ControlPager,
        target: NodeId,
    ) -> PaginateResult<PageMap> {
        Self::run(tree, pager, Some(target))
    }

    fn run(
        tree: &'t ControlTree,
        pager: ControlPager,
        target: Option<NodeId>,
    ) -> PaginateResult<PageMap> {
        let root = tree.root();
        let _pass = tracing::debug_span!("paginate_pass", root = %root).entered();
        if !tree.node(root).flags().contains(NodeFlags::PAGINATE) {
            return Ok(PageMap::new());
        }
        let mut paginator = Self {
            tree,
            pager,
            map: PageMap::new(),
        };
        match target {
            None => {
                paginator.walk(root)?;
            }
            Some(target) if target == root => {
                paginator.walk(root)?;
            }
            Some(target) => {
                paginator.check_target(target)?;
                let span = paginator.walk(target)?;
                for ancestor in tree.ancestors(target) {
                    let widened = match paginator.map.spans.get(&ancestor) {
                        Some(existing) => existing.union(span),
                        None => span,
                    };
                    paginator.map.spans.insert(ancestor, widened);
                }
            }
        }
        paginator.map.page_count = paginator.pager.page_count();
        tracing::debug!(
            pages = paginator.map.page_count,
            nodes = paginator.map.spans.len(),
            "pagination pass complete"
        );
        Ok(paginator.map)
    }

    fn check_target(&self, target: NodeId) -> PaginateResult<()> {
        let Some(node) = self.tree.get(target) else {
            return Err(PaginateError::ConfigurationConflict {
                node: target,
                message: "designated pagination control is not part of the tree".into(),
            });
        };
        if !node.is_visible() {
            return Err(PaginateError::ConfigurationConflict {
                node: target,
                message: "designated pagination control is not visible".into(),
            });
        }
        for ancestor in self.tree.ancestors(target) {
            if ancestor == self.tree.root() {
                continue;
            }
            if self.tree.node(ancestor).is_self_paginating() {
                return Err(PaginateError::ConfigurationConflict {
                    node: ancestor,
                    message:
                        "splits into device pages itself and cannot host an independently \
                         paginated control"
                            .into(),
                });
            }
        }
        Ok(())
    }

    /// Paginate one visible node; records and returns its span.
    fn walk(&mut self, id: NodeId) -> PaginateResult<PageSpan> {
        let node = self.tree.node(id);
        let span = match node.content() {
            Content::Items(source) => {
                let items = self.pager.item_pager(
                    source.count,
                    source.per_page,
                    source.effective_item_weight(),
                );
                let span = items.span();
                self.map.items.insert(id, items);
                span
            }
            Content::Text(runs) => {
                let layout = paginate_text(runs, &mut self.pager);
                let span = layout.span();
                self.map.text.insert(id, layout);
                span
            }
            Content::Block => {
                PageSpan::single(self.pager.get_page(self.tree.effective_weight(id)))
            }
            Content::Panel => {
                if node.paginates_children() {
                    let mut first: Option<u32> = None;
                    let children: Vec<NodeId> = self.tree.visible_children(id).collect();
                    for child in children {
                        let child_span = self.walk(child)?;
                        if let Some(page) = child_span.first() {
                            first = Some(first.map_or(page, |current| current.min(page)));
                        }
                    }
                    let first = match first {
                        Some(page) => page,
                        None => self.pager.get_page(self.tree.effective_weight(id)),
                    };
                    PageSpan::Range {
                        first,
                        last: self.pager.current_page(),
                    }
                } else {
                    // Atomic subtree: one weight for the whole thing and
                    // the same page for every descendant.
                    let page = self.pager.get_page(self.tree.effective_weight(id));
                    for descendant in self.tree.subtree(id) {
                        if descendant != id && self.tree.node(descendant).is_visible() {
                            self.map.spans.insert(descendant, PageSpan::single(page));
                        }
                    }
                    PageSpan::single(page)
                }
            }
        };
        self.map.spans.insert(id, span);
        Ok(span)
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;
    use quire_core::NodeSpec;

    fn arb_tree() -> impl Strategy<Value = ControlTree> {
        let leaf = (0u32..180, any::<bool>()).prop_map(|(weight, visible)| {
            NodeSpec::block("leaf").weight(weight).visible(visible)
        });
        leaf.prop_recursive(3, 24, 4, |inner| {
            (
                proptest::collection::vec(inner, 0..4),
                any::<bool>(),
            )
                .prop_map(|(children, paginate_children)| {
                    NodeSpec::panel("panel")
                        .paginate_children(paginate_children)
                        .children(children)
                })
        })
        .prop_map(ControlTree::build)
    }

    proptest! {
        // Every visible node's span nests inside its parent's span.
        #[test]
        fn child_spans_nest(tree in arb_tree(), budget in 1u32..300) {
            let map = Paginator::paginate(&tree, ControlPager::new(budget, 0).unwrap()).unwrap();
            for id in tree.subtree(tree.root()) {
                let node = tree.node(id);
                if !node.is_visible() {
                    continue;
                }
                let parent_span = match node.parent() {
                    Some(parent) => map.span(parent),
                    None => continue,
                };
                let span = map.span(id);
                if let (PageSpan::Range { first, last }, PageSpan::Range { first: pf, last: pl }) =
                    (span, parent_span)
                {
                    prop_assert!(pf <= first, "child starts before parent");
                    prop_assert!(last <= pl, "child ends after parent");
                }
            }
        }

        // A second pass over the unchanged tree is identical.
        #[test]
        fn passes_are_idempotent(tree in arb_tree(), budget in 1u32..300) {
            let first = Paginator::paginate(&tree, ControlPager::new(budget, 0).unwrap()).unwrap();
            let second = Paginator::paginate(&tree, ControlPager::new(budget, 0).unwrap()).unwrap();
            prop_assert_eq!(first, second);
        }
    }
}
