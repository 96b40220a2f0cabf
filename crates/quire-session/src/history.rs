#![forbid(unsafe_code)]

//! Bounded per-session history of saved page state.
//!
//! [`SessionHistory`] is a fixed-capacity ring of state blobs addressed
//! by an opaque `(identity, sequence)` token. It exists so that a client
//! pressing "back" and resubmitting an old page does not desynchronize
//! the server: resolving an older token rewinds the ring to that point.
//!
//! # Design Invariants
//!
//! 1. `used <= capacity` at all times.
//! 2. The live sequence ids are exactly `next_seq - used .. next_seq`.
//! 3. `next_seq` only moves backward through [`SessionHistory::find`]
//!    resolving an older token; a push after that overwrites the
//!    discarded "future".
//!
//! # Miss/hit asymmetry
//!
//! A miss from eviction empties the whole ring (`used = 0`): the server
//! and client histories are irreconcilable, so nothing left in the ring
//! can be trusted. A hit rewinds only past the resumed point: the user
//! legitimately navigated backward and only the forward branch dies.
//! This models a single linear undo stack, not a tree.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Errors raised while configuring session state history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HistoryError {
    /// The configured history size cannot hold any state.
    InvalidConfiguration {
        /// Why the configuration was rejected.
        message: String,
    },
}

impl fmt::Display for HistoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidConfiguration { message } => {
                write!(f, "invalid session history configuration: {message}")
            }
        }
    }
}

impl std::error::Error for HistoryError {}

/// Result type for history operations.
pub type HistoryResult<T> = Result<T, HistoryError>;

/// Identity of one history instance, created once per session by the
/// owning store. Tokens minted under a different identity never resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionIdentity(u64);

impl SessionIdentity {
    /// Wrap a raw identity value.
    #[must_use]
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Raw identity value.
    #[must_use]
    pub fn get(self) -> u64 {
        self.0
    }
}

/// Opaque resumption token handed to the client.
///
/// Round-trips exactly through the surrounding persistence layer; the
/// payload it addresses stays server-side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateToken {
    /// Identity of the history that minted the token.
    pub identity: SessionIdentity,
    /// Monotonic sequence id of the saved state.
    pub sequence: u64,
}

/// Debug-build provenance for one saved state blob.
#[cfg(debug_assertions)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Provenance {
    /// Form that was active when the state was saved.
    pub form: String,
    /// Page that was active when the state was saved.
    pub page: u32,
}

/// One saved state blob, owned by exactly one ring slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryItem {
    data: Vec<u8>,
    #[cfg(debug_assertions)]
    provenance: Option<Provenance>,
}

impl HistoryItem {
    /// Wrap a serialized state blob.
    #[must_use]
    pub fn new(data: Vec<u8>) -> Self {
        Self {
            data,
            #[cfg(debug_assertions)]
            provenance: None,
        }
    }

    /// Attach save-time provenance (debug builds only).
    #[cfg(debug_assertions)]
    #[must_use]
    pub fn with_provenance(mut self, form: impl Into<String>, page: u32) -> Self {
        self.provenance = Some(Provenance {
            form: form.into(),
            page,
        });
        self
    }

    /// Save-time provenance, if recorded (debug builds only).
    #[cfg(debug_assertions)]
    #[must_use]
    pub fn provenance(&self) -> Option<&Provenance> {
        self.provenance.as_ref()
    }

    /// The blob.
    #[must_use]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Unwrap the blob.
    #[must_use]
    pub fn into_data(self) -> Vec<u8> {
        self.data
    }
}

/// Fixed-capacity ring of saved state blobs for one session.
#[derive(Debug, Clone)]
pub struct SessionHistory {
    slots: Vec<Option<HistoryItem>>,
    write_index: usize,
    used: usize,
    identity: SessionIdentity,
    next_seq: u64,
}

impl SessionHistory {
    /// Build a history with `capacity` slots.
    ///
    /// Fails fast when `capacity` is zero; a history that cannot hold a
    /// single entry would turn every postback into a fresh start.
    pub fn new(identity: SessionIdentity, capacity: usize) -> HistoryResult<Self> {
        if capacity < 1 {
            return Err(HistoryError::InvalidConfiguration {
                message: format!("history size must be at least 1, got {capacity}"),
            });
        }
        Ok(Self {
            slots: vec![None; capacity],
            write_index: 0,
            used: 0,
            identity,
            next_seq: 0,
        })
    }

    /// Identity of this history.
    #[must_use]
    pub fn identity(&self) -> SessionIdentity {
        self.identity
    }

    /// Number of slots.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of live entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.used
    }

    /// Whether no entries are live.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.used == 0
    }

    /// Save a state blob, evicting the oldest entry when full.
    ///
    /// Returns the token the client must echo to resume this state.
    pub fn push(&mut self, item: HistoryItem) -> StateToken {
        let token = StateToken {
            identity: self.identity,
            sequence: self.next_seq,
        };
        self.slots[self.write_index] = Some(item);
        self.write_index = (self.write_index + 1) % self.slots.len();
        self.used = (self.used + 1).min(self.slots.len());
        self.next_seq += 1;
        tracing::trace!(
            sequence = token.sequence,
            used = self.used,
            "state pushed into history"
        );
        token
    }

    /// Resolve a client token into its saved blob.
    ///
    /// A hit makes the resumed entry the top of the stack again,
    /// discarding everything newer. A miss from eviction additionally
    /// empties the ring; see the module docs for why the two differ.
    pub fn find(&mut self, token: &StateToken) -> Option<HistoryItem> {
        if token.identity != self.identity {
            tracing::debug!(
                token_identity = token.identity.get(),
                identity = self.identity.get(),
                "token from another session lifetime"
            );
            return None;
        }
        if token.sequence >= self.next_seq {
            tracing::debug!(
                sequence = token.sequence,
                next = self.next_seq,
                "token refers to a state never saved"
            );
            return None;
        }
        let distance = self.next_seq - token.sequence;
        if distance > self.used as u64 {
            // Evicted. The rest of the ring is no longer trustworthy
            // relative to what the client is holding; drop it all.
            tracing::debug!(
                sequence = token.sequence,
                distance,
                used = self.used,
                "state evicted; invalidating remaining history"
            );
            self.used = 0;
            return None;
        }
        let capacity = self.slots.len();
        let slot = (self.write_index + capacity - distance as usize) % capacity;
        let item = self.slots[slot].clone()?;
        // Back-button rewrite: the resumed entry becomes the newest;
        // entries after it are dead and will be overwritten.
        self.write_index = (slot + 1) % capacity;
        self.next_seq = token.sequence + 1;
        self.used -= distance as usize - 1;
        tracing::trace!(
            sequence = token.sequence,
            used = self.used,
            "state resumed from history"
        );
        Some(item)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn history(capacity: usize) -> SessionHistory {
        SessionHistory::new(SessionIdentity::new(7), capacity).unwrap()
    }

    fn item(tag: u8) -> HistoryItem {
        HistoryItem::new(vec![tag])
    }

    #[test]
    fn zero_capacity_rejected() {
        assert!(matches!(
            SessionHistory::new(SessionIdentity::new(1), 0),
            Err(HistoryError::InvalidConfiguration { .. })
        ));
    }

    #[test]
    fn push_then_find_round_trips() {
        for capacity in 1..5 {
            let mut history = history(capacity);
            let token = history.push(item(42));
            assert_eq!(history.find(&token), Some(item(42)));
        }
    }

    #[test]
    fn wrong_identity_misses() {
        let mut history = history(3);
        let token = history.push(item(1));
        let foreign = StateToken {
            identity: SessionIdentity::new(99),
            sequence: token.sequence,
        };
        assert_eq!(history.find(&foreign), None);
        // An identity miss does not invalidate the ring.
        assert_eq!(history.len(), 1);
    }

    #[test]
    fn future_sequence_misses() {
        let mut history = history(3);
        let token = history.push(item(1));
        let forged = StateToken {
            identity: token.identity,
            sequence: token.sequence + 10,
        };
        assert_eq!(history.find(&forged), None);
        assert_eq!(history.len(), 1);
    }

    #[test]
    fn eviction_misses_and_resets() {
        let mut history = history(3);
        let first = history.push(item(0));
        for tag in 1..4 {
            let _ = history.push(item(tag));
        }
        // Four pushes into three slots: sequence 0 is gone.
        assert_eq!(history.find(&first), None);
        assert_eq!(history.len(), 0);
    }

    #[test]
    fn eviction_scenario_from_sequence_ids() {
        let mut history = history(3);
        let tokens: Vec<StateToken> = (0..4).map(|tag| history.push(item(tag))).collect();
        assert_eq!(tokens[3].sequence, 3);
        // distance = 4 - 0 = 4 > used = 3.
        assert_eq!(history.find(&tokens[0]), None);
        assert!(history.is_empty());
    }

    #[test]
    fn rewind_discards_the_future() {
        let mut history = history(3);
        let _a = history.push(item(b'a'));
        let b = history.push(item(b'b'));
        let c = history.push(item(b'c'));
        assert_eq!(history.find(&b), Some(item(b'b')));
        // Pushing now reuses the slot that held c.
        let d = history.push(item(b'd'));
        assert_eq!(d.sequence, c.sequence);
        assert_eq!(history.find(&d), Some(item(b'd')));
    }

    #[test]
    fn rewound_top_can_be_found_again() {
        let mut history = history(4);
        let a = history.push(item(b'a'));
        let _b = history.push(item(b'b'));
        assert_eq!(history.find(&a), Some(item(b'a')));
        // The hit made a the newest entry again.
        assert_eq!(history.find(&a), Some(item(b'a')));
        assert_eq!(history.len(), 1);
    }

    #[test]
    fn deep_rewind_keeps_older_entries() {
        let mut history = history(4);
        let a = history.push(item(b'a'));
        let b = history.push(item(b'b'));
        let _c = history.push(item(b'c'));
        let _d = history.push(item(b'd'));
        assert_eq!(history.find(&b), Some(item(b'b')));
        assert_eq!(history.len(), 2);
        assert_eq!(history.find(&a), Some(item(b'a')));
        assert_eq!(history.len(), 1);
    }

    #[test]
    fn capacity_one_always_replaces() {
        let mut history = history(1);
        let a = history.push(item(b'a'));
        let b = history.push(item(b'b'));
        assert_eq!(history.find(&a), None);
        // The eviction miss emptied the ring, so b is gone too.
        assert_eq!(history.find(&b), None);
    }

    #[test]
    fn provenance_recorded_in_debug_builds() {
        #[cfg(debug_assertions)]
        {
            let item = HistoryItem::new(vec![1]).with_provenance("menu", 2);
            let provenance = item.provenance().unwrap();
            assert_eq!(provenance.form, "menu");
            assert_eq!(provenance.page, 2);
        }
    }

    #[test]
    fn token_serde_round_trip() {
        let token = StateToken {
            identity: SessionIdentity::new(123),
            sequence: 456,
        };
        let encoded = serde_json::to_string(&token).unwrap();
        let decoded: StateToken = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded, token);
    }
}
