// src/sync.rs
// Card session state kept in step across instances: every local change is
// persisted and broadcast as a full snapshot, and the newest snapshot wins.

use crate::card::{BoardSet, Card, CardGenerator};
use crate::channel::{Channel, Envelope};
use crate::clock::Timestamp;
use crate::defs::MAX_CARDS;
use crate::logging::{log_debug, log_info};
use crate::persistence::{CardPersistence, SharedClock};
use crate::storage::KeyValueStore;

/// Per-instance sync state: the channel handle and the timestamp of the
/// last envelope this instance published or adopted.
pub struct SyncContext {
    channel: Option<Channel>,
    last_applied: Timestamp,
}

impl SyncContext {
    pub fn new(channel: Option<Channel>) -> Self {
        Self { channel, last_applied: 0 }
    }

    /// Join the named process-wide channel.
    pub fn open(name: &str) -> Self {
        Self::new(Channel::open(name))
    }

    /// No channel: the instance never hears from or talks to anyone.
    pub fn isolated() -> Self {
        Self::new(None)
    }

    pub fn is_connected(&self) -> bool {
        self.channel.is_some()
    }

    pub fn last_applied(&self) -> Timestamp {
        self.last_applied
    }

    fn mark_applied(&mut self, ts: Timestamp) {
        self.last_applied = ts;
    }

    // Anything stamped at or after `ts` becomes newer than local state
    fn rewind_before(&mut self, ts: Timestamp) {
        self.last_applied = ts.saturating_sub(1);
    }

    pub fn publish(&mut self, envelope: &Envelope) {
        if let Envelope::Update { ts, .. } = envelope {
            self.last_applied = *ts;
        }
        if let Some(channel) = &self.channel {
            channel.post(envelope);
        }
    }

    pub fn poll(&mut self) -> Option<Envelope> {
        self.channel.as_mut().and_then(Channel::try_recv)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Not newer than what this instance last applied
    Stale,
    /// Same snapshot as local state
    InSync,
    /// Snapshot is not a usable board set
    Rejected,
    /// Snapshot replaced local state
    Adopted,
    /// Storage was wiped and state re-initialized
    Reloaded,
}

pub struct CardSession<S: KeyValueStore> {
    persistence: CardPersistence<S>,
    context: SyncContext,
    clock: SharedClock,
    generator: CardGenerator,
    board: BoardSet,
    // Set by a wipe from elsewhere until the wiping instance's snapshot arrives
    cleared_at: Option<Timestamp>,
}

impl<S: KeyValueStore> CardSession<S> {
    /// Load (or generate) the cards, persist them and announce them.
    pub fn open(store: S, context: SyncContext, clock: SharedClock, clear_lock_ttl_ms: Timestamp) -> Self {
        let persistence = CardPersistence::new(store, clock.clone(), clear_lock_ttl_ms);
        let generator = CardGenerator::new();
        let board = Self::initial_board(&persistence, &generator);
        let mut session = Self { persistence, context, clock, generator, board, cleared_at: None };
        session.commit();
        session
    }

    fn stored_or_new(persistence: &CardPersistence<S>, generator: &CardGenerator, index: usize) -> Card {
        persistence.load(index).unwrap_or_else(|| {
            log_debug(&format!("No usable card {index} stored, generating one"));
            let card = generator.generate_card();
            persistence.write_card(index, &card);
            card
        })
    }

    fn initial_board(persistence: &CardPersistence<S>, generator: &CardGenerator) -> BoardSet {
        let count = persistence.load_count();
        let mut board = BoardSet::single(Self::stored_or_new(persistence, generator, 0));
        for index in 1..count {
            board.push(Self::stored_or_new(persistence, generator, index));
        }
        board
    }

    pub fn board(&self) -> &BoardSet {
        &self.board
    }

    pub fn context(&self) -> &SyncContext {
        &self.context
    }

    pub fn persistence(&self) -> &CardPersistence<S> {
        &self.persistence
    }

    /// Persist every card and the count, then broadcast the snapshot.
    fn commit(&mut self) {
        for (index, card) in self.board.cards().iter().enumerate() {
            self.persistence.save(index, card);
        }
        self.persistence.save_count(self.board.count());
        self.cleared_at = None;
        let ts = self.clock.now_ms();
        self.context.publish(&Envelope::Update { ts, payload: self.board.clone() });
    }

    /// Flip a cell's mark. Returns true when the card is now a blackout.
    pub fn toggle(&mut self, card_index: usize, row: usize, col: usize) -> bool {
        let Some(card) = self.board.card_mut(card_index) else {
            return false;
        };
        if !card.toggle(row, col) {
            return false;
        }
        let won = card.has_blackout();
        if won {
            log_info(&format!("Card {} completed a blackout", card_index + 1));
        }
        self.commit();
        won
    }

    /// Show a second card. A card already stored at that index is reused.
    pub fn add_card(&mut self) -> bool {
        let index = self.board.count();
        if index >= MAX_CARDS {
            return false;
        }
        let card = Self::stored_or_new(&self.persistence, &self.generator, index);
        self.board.push(card);
        self.commit();
        true
    }

    /// Wipe every instance's cards: lock persistence, tell the others,
    /// delete the keys and start over. The lock is left to expire.
    pub fn begin_clear(&mut self) {
        let ts = self.persistence.set_clear_lock();
        self.context.publish(&Envelope::Clear { ts });
        let removed = self.persistence.clear_all();
        log_info(&format!("Cleared {removed} stored card entries"));
        self.reload();
    }

    /// Re-initialize in-memory state from storage, regenerating what is missing,
    /// and announce the result.
    pub fn reload(&mut self) {
        self.reinitialize();
        self.commit();
    }

    fn reinitialize(&mut self) {
        self.board = Self::initial_board(&self.persistence, &self.generator);
    }

    pub fn handle(&mut self, envelope: Envelope) -> SyncOutcome {
        match envelope {
            Envelope::Update { ts, payload } => {
                if ts <= self.context.last_applied() {
                    return SyncOutcome::Stale;
                }
                if payload == self.board {
                    return SyncOutcome::InSync;
                }
                if !payload.is_valid() {
                    log_debug(&format!("Rejected update {ts}: not a valid board set"));
                    return SyncOutcome::Rejected;
                }
                self.board = payload;
                if self.cleared_at.is_some_and(|cleared| ts >= cleared) {
                    // the snapshot that follows a wipe must land while the lock is held
                    for (index, card) in self.board.cards().iter().enumerate() {
                        self.persistence.write_card(index, card);
                    }
                    self.persistence.write_count(self.board.count());
                    self.cleared_at = None;
                } else {
                    for (index, card) in self.board.cards().iter().enumerate() {
                        self.persistence.save(index, card);
                    }
                    self.persistence.save_count(self.board.count());
                }
                self.context.mark_applied(ts);
                log_debug(&format!("Adopted snapshot {ts} with {} card(s)", self.board.count()));
                SyncOutcome::Adopted
            }
            Envelope::Clear { ts } | Envelope::Reset { ts } => {
                log_debug(&format!("Wipe requested by another instance at {ts}"));
                self.persistence.clear_all();
                // Quiet reload: the wiping instance announces the new cards
                self.reinitialize();
                self.context.rewind_before(ts);
                self.cleared_at = Some(ts);
                SyncOutcome::Reloaded
            }
        }
    }

    /// Apply everything waiting on the channel.
    pub fn pump(&mut self) -> Vec<SyncOutcome> {
        let mut outcomes = Vec::new();
        while let Some(envelope) = self.context.poll() {
            outcomes.push(self.handle(envelope));
        }
        outcomes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::channel::ChannelHub;
    use crate::clock::{Clock, ManualClock};
    use crate::defs::{FREE_COL, FREE_ROW};
    use crate::storage::MemoryStore;

    fn isolated_session(store: &MemoryStore, clock: &ManualClock) -> CardSession<MemoryStore> {
        CardSession::open(store.clone(), SyncContext::isolated(), Arc::new(clock.clone()), 1500)
    }

    #[test]
    fn test_open_generates_and_persists() {
        let store = MemoryStore::new();
        let clock = ManualClock::starting_at(1_000);
        let session = isolated_session(&store, &clock);

        assert_eq!(session.board().count(), 1);
        assert!(store.get_item("bingoCardNumbers_0").unwrap().is_some());
        assert_eq!(store.get_item("bingoCardCount").unwrap(), Some("1".to_string()));
        assert_eq!(session.context().last_applied(), 1_000);
    }

    #[test]
    fn test_reopen_rehydrates_same_cards() {
        let store = MemoryStore::new();
        let clock = ManualClock::starting_at(1_000);
        let mut session = isolated_session(&store, &clock);
        session.add_card();
        session.toggle(1, 0, 0);

        let reopened = isolated_session(&store, &clock);
        assert_eq!(reopened.board(), session.board());
    }

    #[test]
    fn test_toggle_reports_blackout() {
        let store = MemoryStore::new();
        let clock = ManualClock::starting_at(1_000);
        let mut session = isolated_session(&store, &clock);

        let mut wins = 0;
        for row in 0..5 {
            for col in 0..5 {
                if session.toggle(0, row, col) {
                    wins += 1;
                }
            }
        }
        assert_eq!(wins, 1);
        assert!(session.board().card(0).unwrap().has_blackout());
        assert!(!session.toggle(0, FREE_ROW, FREE_COL));
        assert!(!session.toggle(1, 0, 0));
    }

    #[test]
    fn test_add_card_stops_at_two() {
        let store = MemoryStore::new();
        let clock = ManualClock::starting_at(1_000);
        let mut session = isolated_session(&store, &clock);
        assert!(session.add_card());
        assert!(!session.add_card());
        assert_eq!(session.board().count(), 2);
        assert_eq!(store.get_item("bingoCardCount").unwrap(), Some("2".to_string()));
    }

    #[test]
    fn test_same_update_twice_applies_once() {
        let store = MemoryStore::new();
        let clock = ManualClock::starting_at(1_000);
        let mut session = isolated_session(&store, &clock);

        let mut incoming = session.board().clone();
        incoming.card_mut(0).unwrap().toggle(3, 3);
        let envelope = Envelope::Update { ts: 2_000, payload: incoming.clone() };

        assert_eq!(session.handle(envelope.clone()), SyncOutcome::Adopted);
        assert_eq!(session.board(), &incoming);
        assert_eq!(session.handle(envelope), SyncOutcome::Stale);
        assert_eq!(session.context().last_applied(), 2_000);
    }

    #[test]
    fn test_stale_update_leaves_state_alone() {
        let store = MemoryStore::new();
        let clock = ManualClock::starting_at(5_000);
        let mut session = isolated_session(&store, &clock);
        let before = session.board().clone();

        let mut incoming = before.clone();
        incoming.card_mut(0).unwrap().toggle(0, 1);
        assert_eq!(session.handle(Envelope::Update { ts: 5_000, payload: incoming.clone() }), SyncOutcome::Stale);
        assert_eq!(session.handle(Envelope::Update { ts: 4_000, payload: incoming }), SyncOutcome::Stale);
        assert_eq!(session.board(), &before);
    }

    #[test]
    fn test_identical_or_invalid_snapshots_are_ignored() {
        let store = MemoryStore::new();
        let clock = ManualClock::starting_at(1_000);
        let mut session = isolated_session(&store, &clock);

        let same = session.board().clone();
        assert_eq!(session.handle(Envelope::Update { ts: 9_000, payload: same }), SyncOutcome::InSync);
        assert_eq!(session.context().last_applied(), 1_000);

        let generator = CardGenerator::new();
        let mut pair = BoardSet::single(generator.generate_card());
        pair.push(generator.generate_card());
        let json = serde_json::to_value(&pair).unwrap();
        let mut cards = json["cards"].as_array().unwrap().clone();
        cards.push(cards[0].clone());
        let oversized: BoardSet = serde_json::from_value(serde_json::json!({ "cards": cards })).unwrap();
        assert_eq!(session.handle(Envelope::Update { ts: 9_001, payload: oversized }), SyncOutcome::Rejected);
        assert_eq!(session.board().count(), 1);
    }

    #[test]
    fn test_adopted_snapshot_is_persisted() {
        let store = MemoryStore::new();
        let clock = ManualClock::starting_at(1_000);
        let mut session = isolated_session(&store, &clock);

        let generator = CardGenerator::new();
        let mut incoming = BoardSet::single(generator.generate_card());
        incoming.push(generator.generate_card());
        session.handle(Envelope::Update { ts: 3_000, payload: incoming.clone() });

        let reopened = isolated_session(&store, &clock);
        assert_eq!(reopened.board(), &incoming);
    }

    #[test]
    fn test_begin_clear_wipes_and_broadcasts_once() {
        let hub = ChannelHub::new();
        let store = MemoryStore::new();
        let clock = ManualClock::starting_at(1_000);
        let mut observer = hub.open("bingo_channel").unwrap();
        let context = SyncContext::new(hub.open("bingo_channel"));
        let mut session = CardSession::open(store.clone(), context, Arc::new(clock.clone()), 1500);
        session.add_card();
        store.set_item("selectedBingoGame", "3").unwrap();
        let before = session.board().clone();
        while observer.try_recv().is_some() {}

        clock.advance(100);
        session.begin_clear();

        let messages: Vec<Envelope> = std::iter::from_fn(|| observer.try_recv()).collect();
        let clears = messages.iter().filter(|m| matches!(m, Envelope::Clear { .. })).count();
        assert_eq!(clears, 1);
        assert_eq!(messages[0], Envelope::Clear { ts: clock.now_ms() });

        // Fresh single card, written despite the lock; unrelated keys kept
        assert_eq!(session.board().count(), 1);
        assert_ne!(session.board().card(0), before.card(0));
        assert_eq!(session.persistence().load(0).as_ref(), session.board().card(0));
        assert_eq!(store.get_item("bingoCardNumbers_1").unwrap(), None);
        assert_eq!(store.get_item("bingo_clear_lock").unwrap(), Some(clock.now_ms().to_string()));
        assert_eq!(store.get_item("selectedBingoGame").unwrap(), Some("3".to_string()));

        // Marks made while the lock is fresh are not persisted
        session.toggle(0, 0, 0);
        assert!(!session.persistence().load(0).unwrap().is_marked(0, 0));
        clock.advance(1500);
        session.toggle(0, 0, 1);
        let stored = session.persistence().load(0).unwrap();
        assert!(stored.is_marked(0, 0) && stored.is_marked(0, 1));
    }

    #[test]
    fn test_clear_from_elsewhere_reloads() {
        let store = MemoryStore::new();
        let clock = ManualClock::starting_at(1_000);
        let mut session = isolated_session(&store, &clock);
        session.add_card();
        session.toggle(0, 0, 0);

        assert_eq!(session.handle(Envelope::Reset { ts: 1 }), SyncOutcome::Reloaded);
        assert_eq!(session.context().last_applied(), 0);
        assert_eq!(session.board().count(), 1);
        assert_eq!(session.board().card(0).unwrap().marked_count(), 1);
        assert_eq!(store.get_item("bingoCardNumbers_1").unwrap(), None);
    }

    #[test]
    fn test_snapshot_after_wipe_is_adopted_through_the_lock() {
        let hub = ChannelHub::new();
        let store = MemoryStore::new();
        let clock = ManualClock::starting_at(1_000);
        let mut observer = hub.open("bingo_channel").unwrap();
        let context = SyncContext::new(hub.open("bingo_channel"));
        let mut session = CardSession::open(store.clone(), context, Arc::new(clock.clone()), 1500);
        while observer.try_recv().is_some() {}

        // another instance wipes and announces its new card in the same millisecond
        let now = clock.now_ms();
        store.set_item("bingo_clear_lock", &now.to_string()).unwrap();
        let fresh = BoardSet::single(CardGenerator::new().generate_card());
        assert_eq!(session.handle(Envelope::Clear { ts: now }), SyncOutcome::Reloaded);
        assert!(observer.try_recv().is_none());
        assert_eq!(session.handle(Envelope::Update { ts: now, payload: fresh.clone() }), SyncOutcome::Adopted);

        assert_eq!(session.board(), &fresh);
        assert!(session.persistence().is_clear_locked());
        assert_eq!(session.persistence().load(0).as_ref(), fresh.card(0));
        assert_eq!(store.get_item("bingoCardCount").unwrap(), Some("1".to_string()));

        // only the first snapshot after the wipe skips the lock
        let mut marked = fresh.clone();
        marked.card_mut(0).unwrap().toggle(0, 0);
        assert_eq!(session.handle(Envelope::Update { ts: now + 1, payload: marked }), SyncOutcome::Adopted);
        assert!(!session.persistence().load(0).unwrap().is_marked(0, 0));
    }

    #[test]
    fn test_isolated_session_has_nothing_to_pump() {
        let store = MemoryStore::new();
        let clock = ManualClock::starting_at(1_000);
        let mut session = isolated_session(&store, &clock);
        assert!(!session.context().is_connected());
        session.toggle(0, 1, 1);
        assert!(session.pump().is_empty());
    }
}
