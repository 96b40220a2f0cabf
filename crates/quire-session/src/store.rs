#![forbid(unsafe_code)]

//! Keyed store of per-session histories.
//!
//! Histories are values owned by the store, looked up by an opaque
//! session key; nothing here is a process-wide singleton. The store is
//! also where session expiry shows up: a key with no history means the
//! surrounding session infrastructure dropped it, which callers treat
//! as a fresh start, never as an error.

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use crate::history::{HistoryResult, SessionHistory, SessionIdentity};

/// Pluggable keyed store of session histories.
///
/// The surrounding session infrastructure serializes requests within a
/// session, so implementations may assume exclusive access during a
/// request and need no internal locking.
pub trait SessionStore {
    /// Human-readable name for logging.
    fn name(&self) -> &str;

    /// History for a session, if one exists and has not expired.
    fn history(&mut self, session: &str) -> Option<&mut SessionHistory>;

    /// History for a session, creating one with `capacity` slots (and a
    /// fresh identity) on first use.
    fn open(&mut self, session: &str, capacity: usize) -> HistoryResult<&mut SessionHistory>;

    /// Drop a session's history, as the session store does on expiry.
    fn expire(&mut self, session: &str);
}

/// In-memory session store.
///
/// Identities are allocated from a monotonic counter, so a history
/// recreated after expiry never resolves tokens minted by its
/// predecessor.
#[derive(Debug, Default)]
pub struct MemoryStore {
    sessions: HashMap<String, SessionHistory>,
    next_identity: u64,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of sessions currently holding a history.
    #[must_use]
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }
}

impl SessionStore for MemoryStore {
    fn name(&self) -> &str {
        "MemoryStore"
    }

    fn history(&mut self, session: &str) -> Option<&mut SessionHistory> {
        self.sessions.get_mut(session)
    }

    fn open(&mut self, session: &str, capacity: usize) -> HistoryResult<&mut SessionHistory> {
        match self.sessions.entry(session.to_string()) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => {
                let identity = SessionIdentity::new(self.next_identity);
                self.next_identity += 1;
                let history = SessionHistory::new(identity, capacity)?;
                tracing::debug!(session, identity = identity.get(), "session history created");
                Ok(entry.insert(history))
            }
        }
    }

    fn expire(&mut self, session: &str) {
        if self.sessions.remove(session).is_some() {
            tracing::debug!(session, "session history expired");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::HistoryItem;

    #[test]
    fn open_creates_once() {
        let mut store = MemoryStore::new();
        let identity = store.open("sid-1", 3).unwrap().identity();
        let again = store.open("sid-1", 3).unwrap().identity();
        assert_eq!(identity, again);
        assert_eq!(store.session_count(), 1);
    }

    #[test]
    fn sessions_are_isolated() {
        let mut store = MemoryStore::new();
        let token = store
            .open("sid-1", 3)
            .unwrap()
            .push(HistoryItem::new(vec![1]));
        let other = store.open("sid-2", 3).unwrap();
        assert_ne!(other.identity(), token.identity);
        assert_eq!(other.find(&token), None);
    }

    #[test]
    fn history_absent_until_opened() {
        let mut store = MemoryStore::new();
        assert!(store.history("sid-1").is_none());
        let _ = store.open("sid-1", 3).unwrap();
        assert!(store.history("sid-1").is_some());
    }

    #[test]
    fn expiry_rotates_identity() {
        let mut store = MemoryStore::new();
        let token = store
            .open("sid-1", 3)
            .unwrap()
            .push(HistoryItem::new(vec![1]));
        store.expire("sid-1");
        assert!(store.history("sid-1").is_none());
        // A recreated history never resolves the old token.
        let recreated = store.open("sid-1", 3).unwrap();
        assert_eq!(recreated.find(&token), None);
    }

    #[test]
    fn zero_capacity_propagates() {
        let mut store = MemoryStore::new();
        assert!(store.open("sid-1", 0).is_err());
        assert_eq!(store.session_count(), 0);
    }
}
