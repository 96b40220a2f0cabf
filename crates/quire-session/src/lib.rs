#![forbid(unsafe_code)]

//! Session-scoped state history for Quire.
//!
//! On every render pass the framework may save a state blob; on every
//! postback it must resolve the client's echoed token back into one,
//! tolerating clients that replay an older page with the back button.
//!
//! - [`SessionHistory`] - bounded ring of state blobs per session
//! - [`SessionStore`] / [`MemoryStore`] - keyed ownership of histories
//! - [`PageStateCoordinator`] - save/load orchestration per request
//! - [`ClientState`] - the small record that round-trips via the client
//!
//! # Example
//! ```
//! use quire_session::{LoadOutcome, MemoryStore, PageState, PageStateCoordinator};
//!
//! let mut coordinator = PageStateCoordinator::new(MemoryStore::new(), 6).unwrap();
//! let saved = coordinator
//!     .save("session-1", &PageState {
//!         active_form: "menu".into(),
//!         page: 2,
//!         view_state: b"selection=3".to_vec(),
//!     })
//!     .unwrap();
//! let outcome = coordinator.load("session-1", Some(&saved.encode()));
//! assert!(matches!(outcome, LoadOutcome::Restored(state) if state.page == 2));
//! ```

pub mod coordinator;
pub mod history;
pub mod store;

pub use coordinator::{ClientState, LoadOutcome, PageState, PageStateCoordinator, TokenError};
pub use history::{
    HistoryError, HistoryItem, HistoryResult, SessionHistory, SessionIdentity, StateToken,
};
pub use store::{MemoryStore, SessionStore};

#[cfg(debug_assertions)]
pub use history::Provenance;
