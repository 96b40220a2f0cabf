#![forbid(unsafe_code)]

//! Control tree: nodes, flags, content kinds, and the arena that owns them.
//!
//! The tree is built once from a [`NodeSpec`] description and is immutable
//! for the duration of a pagination pass. Nodes are addressed by [`NodeId`]
//! (a dense arena index), children keep document order, and every node
//! carries its parent so ancestor chains can be walked without a search.

use std::fmt;

use bitflags::bitflags;
use unicode_segmentation::UnicodeSegmentation;

/// Identifier for a node inside one [`ControlTree`].
///
/// Ids are allocated by [`ControlTree::build`] in depth-first document order
/// and are only meaningful for the tree that produced them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    /// Lowest valid node id (the root of any tree).
    pub const MIN: Self = Self(1);

    pub(crate) fn from_index(index: usize) -> Self {
        Self(index as u32 + 1)
    }

    pub(crate) fn index(self) -> usize {
        self.0 as usize - 1
    }

    /// Raw id value (1-based).
    #[must_use]
    pub fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

bitflags! {
    /// Per-node behavior flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct NodeFlags: u8 {
        /// Node takes part in rendering. Invisible nodes contribute no
        /// weight and receive no page assignment.
        const VISIBLE = 1;
        /// Children are paginated individually. When clear, the whole
        /// subtree is placed on a single page as one atomic unit.
        const PAGINATE_CHILDREN = 1 << 1;
        /// Pagination is enabled for a pass rooted at this node. Only
        /// consulted on the pass root.
        const PAGINATE = 1 << 2;
    }
}

impl Default for NodeFlags {
    fn default() -> Self {
        Self::VISIBLE | Self::PAGINATE_CHILDREN | Self::PAGINATE
    }
}

/// Item collection carried by a list-style control that pages its own items.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ItemSource {
    /// Total number of items in the collection.
    pub count: u32,
    /// Fixed items per page; `0` means chunk by weight instead.
    pub per_page: u32,
    /// Rendering cost of one item; `None` defers to the default item weight.
    pub item_weight: Option<u32>,
}

impl ItemSource {
    /// Collection of `count` items chunked by weight.
    #[must_use]
    pub fn new(count: u32) -> Self {
        Self {
            count,
            per_page: 0,
            item_weight: None,
        }
    }

    /// Fix the number of items shown per page.
    #[must_use]
    pub fn per_page(mut self, per_page: u32) -> Self {
        self.per_page = per_page;
        self
    }

    /// Override the per-item weight.
    #[must_use]
    pub fn item_weight(mut self, weight: u32) -> Self {
        self.item_weight = Some(weight);
        self
    }

    /// Per-item weight with the default applied.
    #[must_use]
    pub fn effective_item_weight(&self) -> u32 {
        self.item_weight.unwrap_or(crate::weight::DEFAULT_ITEM_WEIGHT)
    }
}

/// One run inside a text flow: plain text, or text carrying a link target.
///
/// A run with a link target is atomic for pagination purposes; the chunker
/// breaks before or after it, never inside it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextRun {
    /// Run content.
    pub text: String,
    /// Link target, if this run is a navigable link.
    pub link: Option<String>,
}

impl TextRun {
    /// Plain text run.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            link: None,
        }
    }

    /// Link run; never split across pages.
    #[must_use]
    pub fn link(text: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            link: Some(target.into()),
        }
    }

    /// Whether this run is a link.
    #[must_use]
    pub fn is_link(&self) -> bool {
        self.link.is_some()
    }

    /// Length in grapheme clusters (the unit all character budgets use).
    #[must_use]
    pub fn grapheme_len(&self) -> usize {
        self.text.graphemes(true).count()
    }
}

/// What a control holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Content {
    /// Atomic unit; never split across pages.
    Block,
    /// Composite container of child controls.
    Panel,
    /// List-style control that pages its own item collection.
    Items(ItemSource),
    /// Long-text control chunked at word boundaries.
    Text(Vec<TextRun>),
}

/// One control in the tree.
#[derive(Debug, Clone)]
pub struct Node {
    id: NodeId,
    name: String,
    flags: NodeFlags,
    weight: Option<u32>,
    adapter_weight: Option<u32>,
    content: Content,
    children: Vec<NodeId>,
    parent: Option<NodeId>,
}

impl Node {
    /// Id of this node.
    #[must_use]
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Author-assigned control name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Behavior flags.
    #[must_use]
    pub fn flags(&self) -> NodeFlags {
        self.flags
    }

    /// Explicit author weight, if any.
    #[must_use]
    pub fn weight(&self) -> Option<u32> {
        self.weight
    }

    /// Device-adapter weight override, if the adapter supplied one.
    #[must_use]
    pub fn adapter_weight(&self) -> Option<u32> {
        self.adapter_weight
    }

    /// Content kind.
    #[must_use]
    pub fn content(&self) -> &Content {
        &self.content
    }

    /// Child ids in document order.
    #[must_use]
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Parent id; `None` for the root.
    #[must_use]
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Whether the node takes part in rendering.
    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.flags.contains(NodeFlags::VISIBLE)
    }

    /// Whether children are paginated individually.
    #[must_use]
    pub fn paginates_children(&self) -> bool {
        self.flags.contains(NodeFlags::PAGINATE_CHILDREN)
    }

    /// Whether this control pages its own internal collection.
    #[must_use]
    pub fn is_self_paginating(&self) -> bool {
        matches!(self.content, Content::Items(_) | Content::Text(_))
    }
}

/// Declarative description of one node and its subtree.
///
/// Specs nest; [`ControlTree::build`] flattens them into the arena.
#[derive(Debug, Clone)]
pub struct NodeSpec {
    name: String,
    flags: NodeFlags,
    weight: Option<u32>,
    adapter_weight: Option<u32>,
    content: Content,
    children: Vec<NodeSpec>,
}

impl NodeSpec {
    fn with_content(name: impl Into<String>, content: Content) -> Self {
        Self {
            name: name.into(),
            flags: NodeFlags::default(),
            weight: None,
            adapter_weight: None,
            content,
            children: Vec::new(),
        }
    }

    /// Composite container.
    #[must_use]
    pub fn panel(name: impl Into<String>) -> Self {
        Self::with_content(name, Content::Panel)
    }

    /// Atomic block.
    #[must_use]
    pub fn block(name: impl Into<String>) -> Self {
        Self::with_content(name, Content::Block)
    }

    /// List-style control with its own item collection.
    #[must_use]
    pub fn items(name: impl Into<String>, source: ItemSource) -> Self {
        Self::with_content(name, Content::Items(source))
    }

    /// Long-text control over a sequence of runs.
    #[must_use]
    pub fn text(name: impl Into<String>, runs: impl IntoIterator<Item = TextRun>) -> Self {
        Self::with_content(name, Content::Text(runs.into_iter().collect()))
    }

    /// Explicit author weight.
    #[must_use]
    pub fn weight(mut self, weight: u32) -> Self {
        self.weight = Some(weight);
        self
    }

    /// Device-adapter weight override.
    #[must_use]
    pub fn adapter_weight(mut self, weight: u32) -> Self {
        self.adapter_weight = Some(weight);
        self
    }

    /// Set or clear visibility.
    #[must_use]
    pub fn visible(mut self, visible: bool) -> Self {
        self.flags.set(NodeFlags::VISIBLE, visible);
        self
    }

    /// Set or clear individual pagination of children.
    #[must_use]
    pub fn paginate_children(mut self, paginate: bool) -> Self {
        self.flags.set(NodeFlags::PAGINATE_CHILDREN, paginate);
        self
    }

    /// Enable or disable pagination for a pass rooted here.
    #[must_use]
    pub fn paginate(mut self, paginate: bool) -> Self {
        self.flags.set(NodeFlags::PAGINATE, paginate);
        self
    }

    /// Append one child.
    #[must_use]
    pub fn child(mut self, child: NodeSpec) -> Self {
        self.children.push(child);
        self
    }

    /// Append several children.
    #[must_use]
    pub fn children(mut self, children: impl IntoIterator<Item = NodeSpec>) -> Self {
        self.children.extend(children);
        self
    }
}

/// Arena-backed control tree.
#[derive(Debug, Clone)]
pub struct ControlTree {
    nodes: Vec<Node>,
    root: NodeId,
}

impl ControlTree {
    /// Flatten a spec into an arena tree. Ids are assigned in depth-first
    /// document order, so the root is always [`NodeId::MIN`].
    #[must_use]
    pub fn build(spec: NodeSpec) -> Self {
        let mut nodes = Vec::new();
        Self::insert(&mut nodes, spec, None);
        Self {
            nodes,
            root: NodeId::MIN,
        }
    }

    fn insert(nodes: &mut Vec<Node>, spec: NodeSpec, parent: Option<NodeId>) -> NodeId {
        let id = NodeId::from_index(nodes.len());
        nodes.push(Node {
            id,
            name: spec.name,
            flags: spec.flags,
            weight: spec.weight,
            adapter_weight: spec.adapter_weight,
            content: spec.content,
            children: Vec::new(),
            parent,
        });
        for child in spec.children {
            let child_id = Self::insert(nodes, child, Some(id));
            nodes[id.index()].children.push(child_id);
        }
        id
    }

    /// Root node id.
    #[must_use]
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Number of nodes in the tree.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the tree has no nodes. `build` always produces at least the
    /// root, so this is only true for a manually emptied clone.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Node by id.
    ///
    /// # Panics
    /// Panics if `id` was not produced by this tree.
    #[must_use]
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    /// Node by id, `None` when out of range.
    #[must_use]
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index())
    }

    /// Look up a control by its author-assigned name.
    #[must_use]
    pub fn find(&self, name: &str) -> Option<NodeId> {
        self.nodes.iter().find(|n| n.name == name).map(Node::id)
    }

    /// Visible children of a node, in document order.
    pub fn visible_children(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.node(id)
            .children
            .iter()
            .copied()
            .filter(|&c| self.node(c).is_visible())
    }

    /// Ancestors of a node from its parent up to the root.
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        let mut current = self.node(id).parent();
        std::iter::from_fn(move || {
            let next = current?;
            current = self.node(next).parent();
            Some(next)
        })
    }

    /// Preorder traversal of a subtree, root included.
    #[must_use]
    pub fn subtree(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            out.push(next);
            for &child in self.node(next).children.iter().rev() {
                stack.push(child);
            }
        }
        out
    }

    /// Whether `ancestor` is a strict ancestor of `id`.
    #[must_use]
    pub fn is_ancestor(&self, ancestor: NodeId, id: NodeId) -> bool {
        self.ancestors(id).any(|a| a == ancestor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ControlTree {
        ControlTree::build(
            NodeSpec::panel("form")
                .child(NodeSpec::block("header").weight(40))
                .child(
                    NodeSpec::panel("body")
                        .child(NodeSpec::block("a"))
                        .child(NodeSpec::block("b").visible(false)),
                )
                .child(NodeSpec::items("list", ItemSource::new(10))),
        )
    }

    #[test]
    fn build_assigns_document_order_ids() {
        let tree = sample();
        assert_eq!(tree.root(), NodeId::MIN);
        assert_eq!(tree.len(), 6);
        assert_eq!(tree.node(tree.root()).name(), "form");
        let names: Vec<&str> = tree
            .subtree(tree.root())
            .iter()
            .map(|&id| tree.node(id).name())
            .collect();
        assert_eq!(names, ["form", "header", "body", "a", "b", "list"]);
    }

    #[test]
    fn find_by_name() {
        let tree = sample();
        let body = tree.find("body").unwrap();
        assert_eq!(tree.node(body).name(), "body");
        assert!(tree.find("missing").is_none());
    }

    #[test]
    fn parent_links() {
        let tree = sample();
        let a = tree.find("a").unwrap();
        let body = tree.find("body").unwrap();
        assert_eq!(tree.node(a).parent(), Some(body));
        assert_eq!(tree.node(tree.root()).parent(), None);
    }

    #[test]
    fn ancestors_walk_to_root() {
        let tree = sample();
        let a = tree.find("a").unwrap();
        let chain: Vec<&str> = tree
            .ancestors(a)
            .map(|id| tree.node(id).name())
            .collect();
        assert_eq!(chain, ["body", "form"]);
    }

    #[test]
    fn is_ancestor() {
        let tree = sample();
        let a = tree.find("a").unwrap();
        let body = tree.find("body").unwrap();
        let list = tree.find("list").unwrap();
        assert!(tree.is_ancestor(tree.root(), a));
        assert!(tree.is_ancestor(body, a));
        assert!(!tree.is_ancestor(list, a));
        assert!(!tree.is_ancestor(a, a));
    }

    #[test]
    fn visible_children_skip_hidden() {
        let tree = sample();
        let body = tree.find("body").unwrap();
        let visible: Vec<&str> = tree
            .visible_children(body)
            .map(|id| tree.node(id).name())
            .collect();
        assert_eq!(visible, ["a"]);
    }

    #[test]
    fn default_flags() {
        let flags = NodeFlags::default();
        assert!(flags.contains(NodeFlags::VISIBLE));
        assert!(flags.contains(NodeFlags::PAGINATE_CHILDREN));
        assert!(flags.contains(NodeFlags::PAGINATE));
    }

    #[test]
    fn spec_flag_setters() {
        let tree = ControlTree::build(
            NodeSpec::panel("p")
                .paginate_children(false)
                .paginate(false)
                .visible(false),
        );
        let node = tree.node(tree.root());
        assert!(!node.is_visible());
        assert!(!node.paginates_children());
        assert!(!node.flags().contains(NodeFlags::PAGINATE));
    }

    #[test]
    fn self_paginating_kinds() {
        let tree = sample();
        assert!(tree.node(tree.find("list").unwrap()).is_self_paginating());
        assert!(!tree.node(tree.find("a").unwrap()).is_self_paginating());
        let text = ControlTree::build(NodeSpec::text("t", [TextRun::text("hi")]));
        assert!(!tree.node(tree.root()).is_self_paginating());
        assert!(text.node(text.root()).is_self_paginating());
    }

    #[test]
    fn item_source_defaults() {
        let source = ItemSource::new(5);
        assert_eq!(source.per_page, 0);
        assert_eq!(
            source.effective_item_weight(),
            crate::weight::DEFAULT_ITEM_WEIGHT
        );
        let fixed = ItemSource::new(5).per_page(2).item_weight(7);
        assert_eq!(fixed.per_page, 2);
        assert_eq!(fixed.effective_item_weight(), 7);
    }

    #[test]
    fn text_run_grapheme_len() {
        assert_eq!(TextRun::text("hello").grapheme_len(), 5);
        // Family emoji is one cluster.
        assert_eq!(TextRun::text("👨‍👩‍👧").grapheme_len(), 1);
        assert!(TextRun::link("docs", "#docs").is_link());
        assert!(!TextRun::text("docs").is_link());
    }

    #[test]
    fn node_id_display() {
        assert_eq!(NodeId::MIN.to_string(), "#1");
        assert_eq!(NodeId::MIN.get(), 1);
    }
}
