#![forbid(unsafe_code)]

//! Device-adaptive pagination for Quire.
//!
//! This crate splits a control tree into device-sized pages under a
//! numeric weight budget:
//!
//! - [`ControlPager`] - greedy weight packer handing out page numbers
//! - [`ItemPager`] - per-control pager for list-style item collections
//! - [`Paginator`] - recursive tree walker producing a [`PageMap`]
//! - [`paginate_text`] - word-boundary chunking for long-text controls
//!
//! # Example
//! ```
//! use quire_core::{ControlTree, NodeSpec};
//! use quire_page::{ControlPager, PageSpan, Paginator};
//!
//! let tree = ControlTree::build(
//!     NodeSpec::panel("form")
//!         .child(NodeSpec::block("a").weight(40))
//!         .child(NodeSpec::block("b").weight(40))
//!         .child(NodeSpec::block("c").weight(40)),
//! );
//! let pager = ControlPager::new(100, 0).unwrap();
//! let map = Paginator::paginate(&tree, pager).unwrap();
//! assert_eq!(map.page_count(), 2);
//! assert_eq!(map.span(tree.find("c").unwrap()), PageSpan::single(2));
//! ```

pub mod error;
pub mod pager;
pub mod text;
pub mod walker;

pub use error::{PaginateError, PaginateResult};
pub use pager::{ControlPager, ItemPager, PageSpan};
pub use text::{TextLayout, TextPosition, TextSlice, paginate_text};
pub use walker::{PageMap, Paginator};
