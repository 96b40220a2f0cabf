#![forbid(unsafe_code)]

//! Per-request orchestration of page state.
//!
//! [`PageStateCoordinator`] decides, on save, whether the current page
//! state needs server-side persistence, and resolves, on load, the
//! client's round-tripped token back into that state. The client only
//! ever carries a small [`ClientState`] record; the state blob itself
//! stays in the session's [`SessionHistory`].
//!
//! A token that no longer resolves is not an error: the page restarts
//! from its default form at page 1. Only misconfiguration (a history
//! that cannot hold a single entry) fails fast.

use std::fmt;

use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::history::{HistoryError, HistoryItem, HistoryResult, StateToken};
use crate::store::SessionStore;

/// Errors decoding or encoding the client-side state record.
#[derive(Debug)]
pub enum TokenError {
    /// The client sent something that is not valid base64.
    Base64(base64::DecodeError),
    /// The decoded bytes are not a valid state record.
    Malformed(serde_json::Error),
}

impl fmt::Display for TokenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Base64(err) => write!(f, "state record is not valid base64: {err}"),
            Self::Malformed(err) => write!(f, "state record does not parse: {err}"),
        }
    }
}

impl std::error::Error for TokenError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Base64(err) => Some(err),
            Self::Malformed(err) => Some(err),
        }
    }
}

/// Page state as the rest of the framework sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageState {
    /// Name of the active form.
    pub active_form: String,
    /// Active page within that form, 1-based.
    pub page: u32,
    /// Serialized view state; empty when the page has none.
    pub view_state: Vec<u8>,
}

/// The record round-tripped through the client.
///
/// Always carries the active form and page; carries a token only when a
/// state blob was persisted server-side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientState {
    /// Name of the active form.
    pub active_form: String,
    /// Active page within that form, 1-based.
    pub page: u32,
    /// Token addressing the server-side blob, if one was saved.
    pub token: Option<StateToken>,
}

impl ClientState {
    /// Serialize for embedding in the outgoing page.
    pub fn encode(&self) -> String {
        // Serialization of this shape cannot fail; the record is plain
        // data with no maps or non-string keys.
        let json = serde_json::to_vec(self).unwrap_or_default();
        base64::engine::general_purpose::STANDARD.encode(json)
    }

    /// Parse a record echoed back by the client.
    pub fn decode(encoded: &str) -> Result<Self, TokenError> {
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(encoded)
            .map_err(TokenError::Base64)?;
        serde_json::from_slice(&bytes).map_err(TokenError::Malformed)
    }
}

/// Outcome of resolving the client's state on postback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// No client state: first visit, start at the default form.
    Fresh,
    /// State restored; `view_state` is empty when none was persisted.
    Restored(PageState),
    /// The token no longer resolves; restart at page 1 of the default
    /// form. Recoverable by design, not an error.
    Expired,
}

/// Orchestrates page-state persistence for one application.
#[derive(Debug)]
pub struct PageStateCoordinator<S: SessionStore> {
    store: S,
    history_capacity: usize,
}

impl<S: SessionStore> PageStateCoordinator<S> {
    /// Build a coordinator persisting into `store` with per-session
    /// histories of `history_capacity` entries.
    pub fn new(store: S, history_capacity: usize) -> HistoryResult<Self> {
        if history_capacity < 1 {
            return Err(HistoryError::InvalidConfiguration {
                message: format!("history size must be at least 1, got {history_capacity}"),
            });
        }
        Ok(Self {
            store,
            history_capacity,
        })
    }

    /// The underlying store.
    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// The underlying store, mutably.
    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    /// Record the page state at the end of a request.
    ///
    /// The active form and page always travel with the client; the view
    /// state is pushed into the session history only when there is any.
    pub fn save(&mut self, session: &str, state: &PageState) -> HistoryResult<ClientState> {
        let token = if state.view_state.is_empty() {
            None
        } else {
            let history = self.store.open(session, self.history_capacity)?;
            let item = HistoryItem::new(state.view_state.clone());
            #[cfg(debug_assertions)]
            let item = item.with_provenance(state.active_form.clone(), state.page);
            Some(history.push(item))
        };
        Ok(ClientState {
            active_form: state.active_form.clone(),
            page: state.page,
            token,
        })
    }

    /// Resolve the client's round-tripped record at the start of a
    /// request.
    ///
    /// An unparseable record is treated like an absent one: clients can
    /// send garbage, and garbage means a fresh start, not a failure.
    pub fn load(&mut self, session: &str, encoded: Option<&str>) -> LoadOutcome {
        let Some(encoded) = encoded else {
            return LoadOutcome::Fresh;
        };
        let client = match ClientState::decode(encoded) {
            Ok(client) => client,
            Err(err) => {
                tracing::debug!(error = %err, "discarding unparseable client state");
                return LoadOutcome::Fresh;
            }
        };
        let Some(token) = client.token else {
            return LoadOutcome::Restored(PageState {
                active_form: client.active_form,
                page: client.page,
                view_state: Vec::new(),
            });
        };
        let Some(history) = self.store.history(session) else {
            tracing::debug!(session, "no history for session; state expired");
            return LoadOutcome::Expired;
        };
        match history.find(&token) {
            Some(item) => LoadOutcome::Restored(PageState {
                active_form: client.active_form,
                page: client.page,
                view_state: item.into_data(),
            }),
            None => LoadOutcome::Expired,
        }
    }
}
