#![forbid(unsafe_code)]

//! Quire public facade crate.
//!
//! Quire splits a server-rendered control tree into device-sized pages
//! under a weight budget and keeps enough per-session history that a
//! client walking backward through already-rendered pages stays in sync
//! with the server. This crate re-exports the stable surface of the
//! internal crates and offers a lightweight prelude.

use std::fmt;

// --- Tree model re-exports -------------------------------------------------

pub use quire_core::{
    CHARS_PER_WEIGHT_UNIT, Content, ControlTree, DEFAULT_ITEM_WEIGHT,
    DEFAULT_OPTIMUM_PAGE_WEIGHT, ItemSource, Node, NodeFlags, NodeId, NodeSpec, TextRun,
};

// --- Pagination re-exports -------------------------------------------------

pub use quire_page::{
    ControlPager, ItemPager, PageMap, PageSpan, PaginateError, Paginator, TextLayout,
    TextPosition, TextSlice, paginate_text,
};

// --- Session state re-exports ----------------------------------------------

pub use quire_session::{
    ClientState, HistoryError, HistoryItem, LoadOutcome, MemoryStore, PageState,
    PageStateCoordinator, SessionHistory, SessionIdentity, SessionStore, StateToken, TokenError,
};

// --- Errors ---------------------------------------------------------------

/// Top-level error type for Quire applications.
#[derive(Debug)]
pub enum Error {
    /// Pagination setup or pass failure.
    Paginate(PaginateError),
    /// Session history misconfiguration.
    History(HistoryError),
    /// Client state record failed to decode.
    Token(TokenError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Paginate(err) => write!(f, "{err}"),
            Self::History(err) => write!(f, "{err}"),
            Self::Token(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Paginate(err) => Some(err),
            Self::History(err) => Some(err),
            Self::Token(err) => Some(err),
        }
    }
}

impl From<PaginateError> for Error {
    fn from(err: PaginateError) -> Self {
        Self::Paginate(err)
    }
}

impl From<HistoryError> for Error {
    fn from(err: HistoryError) -> Self {
        Self::History(err)
    }
}

impl From<TokenError> for Error {
    fn from(err: TokenError) -> Self {
        Self::Token(err)
    }
}

/// Standard result type for Quire APIs.
pub type Result<T> = std::result::Result<T, Error>;

// --- Prelude --------------------------------------------------------------

pub mod prelude {
    pub use crate::{
        ControlPager, ControlTree, Error, LoadOutcome, MemoryStore, NodeSpec, PageMap,
        PageSpan, PageState, PageStateCoordinator, Paginator, Result, SessionStore, TextRun,
    };

    pub use crate::{core, page, session};
}

pub use quire_core as core;
pub use quire_page as page;
pub use quire_session as session;
