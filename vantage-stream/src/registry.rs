//! Subscription registry: the source of truth for active topics.
//!
//! Each entry is `symbol → { ref_count, confirmed }`. The ref count lets
//! multiple independent UI consumers subscribe to the same symbol without
//! premature unsubscription; `confirmed` records whether the subscribe
//! frame has been sent on the *current* connection and is reset on every
//! reconnect so the full set is replayed.
//!
//! The registry holds state only. The connection supervisor decides when
//! frames actually go out and is the single writer of `confirmed`, which
//! is what makes "re-subscribed exactly once per connection" hold.

use parking_lot::Mutex;
use std::collections::HashMap;

use vantage_core::types::Symbol;

#[derive(Debug, Clone, Copy)]
struct Entry {
    ref_count: u32,
    confirmed: bool,
}

/// Ref-counted registry of subscribed symbols.
///
/// Entries are never pruned except through [`unsubscribe`](Self::unsubscribe)
/// reaching a zero ref count; in particular they survive disconnects, so a
/// later reconnect resumes the same topic set.
#[derive(Debug, Default)]
pub struct SubscriptionRegistry {
    entries: Mutex<HashMap<Symbol, Entry>>,
}

impl SubscriptionRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records interest in a symbol, creating the entry if new.
    ///
    /// Returns true if the symbol still needs a subscribe frame on the
    /// current connection (entry not yet confirmed).
    pub fn subscribe(&self, symbol: &Symbol) -> bool {
        let mut entries = self.entries.lock();
        let entry = entries.entry(symbol.clone()).or_insert(Entry {
            ref_count: 0,
            confirmed: false,
        });
        entry.ref_count = entry.ref_count.saturating_add(1);
        !entry.confirmed
    }

    /// Withdraws one consumer's interest in a symbol.
    ///
    /// Returns true if this was the last interested consumer and the entry
    /// was removed (an unsubscribe frame should be sent if connected).
    /// Unsubscribing an unknown symbol is a no-op.
    pub fn unsubscribe(&self, symbol: &Symbol) -> bool {
        let mut entries = self.entries.lock();
        let Some(entry) = entries.get_mut(symbol) else {
            return false;
        };
        entry.ref_count = entry.ref_count.saturating_sub(1);
        if entry.ref_count == 0 {
            entries.remove(symbol);
            true
        } else {
            false
        }
    }

    /// Returns true if the entry exists and has not been confirmed on the
    /// current connection.
    pub fn needs_frame(&self, symbol: &Symbol) -> bool {
        self.entries
            .lock()
            .get(symbol)
            .is_some_and(|entry| !entry.confirmed)
    }

    /// Marks a symbol's subscribe frame as sent on the current connection.
    pub fn mark_confirmed(&self, symbol: &Symbol) {
        if let Some(entry) = self.entries.lock().get_mut(symbol) {
            entry.confirmed = true;
        }
    }

    /// Begins a new connection session: marks every entry unconfirmed and
    /// returns the full topic set to replay.
    ///
    /// Iteration order across topics carries no meaning; no per-topic
    /// ordering is promised to consumers.
    pub fn begin_session(&self) -> Vec<Symbol> {
        let mut entries = self.entries.lock();
        for entry in entries.values_mut() {
            entry.confirmed = false;
        }
        entries.keys().cloned().collect()
    }

    /// Returns the currently subscribed symbols.
    #[must_use]
    pub fn symbols(&self) -> Vec<Symbol> {
        self.entries.lock().keys().cloned().collect()
    }

    /// Returns the ref count for a symbol, or 0 if absent.
    #[must_use]
    pub fn ref_count(&self, symbol: &Symbol) -> u32 {
        self.entries
            .lock()
            .get(symbol)
            .map_or(0, |entry| entry.ref_count)
    }

    /// Returns true if the symbol has at least one interested consumer.
    #[must_use]
    pub fn contains(&self, symbol: &Symbol) -> bool {
        self.entries.lock().contains_key(symbol)
    }

    /// Returns the number of live topics.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Returns true if no topics are live.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}
