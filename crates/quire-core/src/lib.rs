#![forbid(unsafe_code)]

//! Core control-tree model for the Quire pagination engine.
//!
//! This crate provides the data the engine consumes:
//! - [`ControlTree`] - arena of controls addressed by [`NodeId`]
//! - [`NodeSpec`] - declarative builder for control trees
//! - [`Content`] - what a control holds (atomic block, panel, item list, text flow)
//! - [`TextRun`] - one run of text or an embedded link inside a text flow
//! - weight accounting ([`ControlTree::effective_weight`]) with device-adapter
//!   overrides expressed as `Option<u32>`, never as reserved integers
//!
//! # Example
//! ```
//! use quire_core::{ControlTree, NodeSpec};
//!
//! let tree = ControlTree::build(
//!     NodeSpec::panel("form")
//!         .child(NodeSpec::block("header").weight(40))
//!         .child(NodeSpec::block("body").weight(120)),
//! );
//! let body = tree.find("body").unwrap();
//! assert_eq!(tree.effective_weight(body), 120);
//! ```

pub mod node;
pub mod weight;

pub use node::{Content, ControlTree, ItemSource, Node, NodeFlags, NodeId, NodeSpec, TextRun};
pub use weight::{CHARS_PER_WEIGHT_UNIT, DEFAULT_ITEM_WEIGHT, DEFAULT_OPTIMUM_PAGE_WEIGHT};
