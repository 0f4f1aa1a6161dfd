// src/persistence.rs
// Maps cards onto the key-value store. Every storage failure is absorbed here:
// reads turn into "nothing stored", writes are dropped, both with a warning.

use std::sync::Arc;

use crate::card::{Card, MarkedGrid, NumberGrid, initial_marked};
use crate::clock::{Clock, Timestamp};
use crate::defs::{
    CARD_COUNT_KEY, CARD_NUMBERS_PREFIX, CARD_SELECTED_PREFIX, CLEAR_LOCK_KEY, MAX_CARDS,
    card_numbers_key, card_selected_key,
};
use crate::logging::{log_debug, log_warning};
use crate::storage::KeyValueStore;

pub type SharedClock = Arc<dyn Clock + Send + Sync>;

pub struct CardPersistence<S: KeyValueStore> {
    store: S,
    clock: SharedClock,
    clear_lock_ttl_ms: Timestamp,
}

impl<S: KeyValueStore> CardPersistence<S> {
    pub fn new(store: S, clock: SharedClock, clear_lock_ttl_ms: Timestamp) -> Self {
        Self { store, clock, clear_lock_ttl_ms }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    fn read(&self, key: &str) -> Option<String> {
        match self.store.get_item(key) {
            Ok(value) => value,
            Err(e) => {
                log_warning(&format!("Could not read '{key}': {e}"));
                None
            }
        }
    }

    fn write(&self, key: &str, value: &str) {
        if let Err(e) = self.store.set_item(key, value) {
            log_warning(&format!("Could not write '{key}': {e}"));
        }
    }

    fn remove(&self, key: &str) {
        if let Err(e) = self.store.remove_item(key) {
            log_warning(&format!("Could not remove '{key}': {e}"));
        }
    }

    /// Stored card at `index`, or `None` when it is absent or unusable.
    pub fn load(&self, index: usize) -> Option<Card> {
        let key = card_numbers_key(index);
        let raw = self.read(&key)?;
        let numbers: NumberGrid = match serde_json::from_str(&raw) {
            Ok(numbers) => numbers,
            Err(e) => {
                log_warning(&format!("Discarding malformed '{key}': {e}"));
                return None;
            }
        };

        let marked_key = card_selected_key(index);
        let marked: MarkedGrid = self
            .read(&marked_key)
            .and_then(|raw| match serde_json::from_str(&raw) {
                Ok(marked) => Some(marked),
                Err(e) => {
                    log_warning(&format!("Discarding malformed '{marked_key}': {e}"));
                    None
                }
            })
            .unwrap_or_else(initial_marked);

        let card = Card::from_parts(numbers, marked);
        if !card.is_valid() {
            log_warning(&format!("Discarding '{key}': numbers do not form a valid card"));
            return None;
        }
        Some(card)
    }

    /// Persist a card unless a clear is in progress. Returns whether it was written.
    pub fn save(&self, index: usize, card: &Card) -> bool {
        if self.is_clear_locked() {
            log_debug(&format!("Clear in progress, not saving card {index}"));
            return false;
        }
        self.write_card(index, card);
        true
    }

    /// Persist a card regardless of the clear-lock. Used for freshly generated cards.
    pub fn write_card(&self, index: usize, card: &Card) {
        match serde_json::to_string(card.marked()) {
            Ok(json) => self.write(&card_selected_key(index), &json),
            Err(e) => log_warning(&format!("Could not encode marks of card {index}: {e}")),
        }
        match serde_json::to_string(card.numbers()) {
            Ok(json) => self.write(&card_numbers_key(index), &json),
            Err(e) => log_warning(&format!("Could not encode numbers of card {index}: {e}")),
        }
    }

    /// Number of cards to show, always within 1..=MAX_CARDS.
    pub fn load_count(&self) -> usize {
        self.read(CARD_COUNT_KEY)
            .and_then(|raw| raw.trim().parse::<usize>().ok())
            .map(|count| count.clamp(1, MAX_CARDS))
            .unwrap_or(1)
    }

    pub fn save_count(&self, count: usize) -> bool {
        if self.is_clear_locked() {
            return false;
        }
        self.write_count(count);
        true
    }

    pub fn write_count(&self, count: usize) {
        self.write(CARD_COUNT_KEY, &count.to_string());
    }

    /// Remove every card key. Unrelated keys are left alone.
    pub fn clear_all(&self) -> usize {
        let keys = match self.store.keys() {
            Ok(keys) => keys,
            Err(e) => {
                log_warning(&format!("Could not list stored keys: {e}"));
                return 0;
            }
        };
        let doomed: Vec<String> = keys
            .into_iter()
            .filter(|k| {
                k.starts_with(CARD_NUMBERS_PREFIX) || k.starts_with(CARD_SELECTED_PREFIX) || k == CARD_COUNT_KEY
            })
            .collect();
        for key in &doomed {
            self.remove(key);
        }
        doomed.len()
    }

    pub fn set_clear_lock(&self) -> Timestamp {
        let now = self.clock.now_ms();
        self.write(CLEAR_LOCK_KEY, &now.to_string());
        now
    }

    /// The lock is honoured for `clear_lock_ttl_ms` after it was taken. A lock
    /// stamped in the future (clock skew, garbage) does not count.
    pub fn is_clear_locked(&self) -> bool {
        let raw = match self.store.get_item(CLEAR_LOCK_KEY) {
            Ok(Some(raw)) => raw,
            // A failing read must not block persistence
            Ok(None) | Err(_) => return false,
        };
        match raw.trim().parse::<Timestamp>() {
            Ok(taken_at) => match self.clock.now_ms().checked_sub(taken_at) {
                Some(elapsed) if elapsed >= 0 => elapsed < self.clear_lock_ttl_ms,
                _ => {
                    log_debug(&format!("Ignoring clear-lock with an impossible timestamp {taken_at}"));
                    false
                }
            },
            Err(_) => {
                log_debug(&format!("Ignoring unreadable clear-lock value '{raw}'"));
                false
            }
        }
    }
}
