// Several card sessions sharing one store and one channel, driven through
// the public API the way the card front end drives its tabs.

use std::sync::Arc;

use bingo::card::{BoardSet, CardGenerator};
use bingo::channel::{ChannelHub, Envelope};
use bingo::clock::ManualClock;
use bingo::storage::MemoryStore;
use bingo::sync::{CardSession, SyncContext, SyncOutcome};

const CHANNEL: &str = "bingo_channel";
const TTL_MS: i64 = 1500;

fn open_tab(hub: &ChannelHub, store: &MemoryStore, clock: &ManualClock) -> CardSession<MemoryStore> {
    CardSession::open(store.clone(), SyncContext::new(hub.open(CHANNEL)), Arc::new(clock.clone()), TTL_MS)
}

#[test]
fn test_marks_and_new_cards_reach_every_tab() {
    let hub = ChannelHub::new();
    let store = MemoryStore::new();
    let clock = ManualClock::starting_at(1_000);

    let mut a = open_tab(&hub, &store, &clock);
    clock.advance(10);
    let mut b = open_tab(&hub, &store, &clock);
    clock.advance(10);
    let mut c = open_tab(&hub, &store, &clock);
    assert_eq!(a.board(), b.board());
    assert_eq!(b.board(), c.board());

    clock.advance(10);
    a.toggle(0, 0, 0);
    assert!(b.pump().contains(&SyncOutcome::Adopted));
    assert_eq!(c.pump(), vec![SyncOutcome::Adopted]);
    assert!(b.board().card(0).unwrap().is_marked(0, 0));
    assert!(c.board().card(0).unwrap().is_marked(0, 0));

    clock.advance(10);
    assert!(c.add_card());
    a.pump();
    b.pump();
    assert_eq!(a.board().count(), 2);
    assert_eq!(a.board(), c.board());
    assert_eq!(b.board(), c.board());

    // a tab opened later starts from what the others stored
    clock.advance(10);
    let late = open_tab(&hub, &store, &clock);
    assert_eq!(late.board(), a.board());
}

#[test]
fn test_old_and_malformed_messages_are_ignored() {
    let hub = ChannelHub::new();
    let store = MemoryStore::new();
    let clock = ManualClock::starting_at(50_000);
    let mut a = open_tab(&hub, &store, &clock);
    let before = a.board().clone();

    let outsider = hub.open(CHANNEL).unwrap();
    let other = BoardSet::single(CardGenerator::new().generate_card());
    outsider.post(&Envelope::Update { ts: 10, payload: other.clone() });
    outsider.post_raw("{\"type\":\"update\",\"ts\":");
    outsider.post_raw("{\"type\":\"shuffle\",\"ts\":60000}");
    assert_eq!(a.pump(), vec![SyncOutcome::Stale]);
    assert_eq!(a.board(), &before);

    outsider.post(&Envelope::Update { ts: 60_000, payload: other.clone() });
    assert_eq!(a.pump(), vec![SyncOutcome::Adopted]);
    assert_eq!(a.board(), &other);
}

#[test]
fn test_clear_in_one_tab_gives_everyone_the_same_new_cards() {
    let hub = ChannelHub::new();
    let store = MemoryStore::new();
    let clock = ManualClock::starting_at(1_000);

    let mut a = open_tab(&hub, &store, &clock);
    clock.advance(10);
    let mut b = open_tab(&hub, &store, &clock);
    clock.advance(10);
    a.add_card();
    a.pump();
    b.pump();
    assert_eq!(b.board().count(), 2);
    let old = a.board().clone();

    clock.advance(10);
    a.begin_clear();
    assert_eq!(a.board().count(), 1);
    assert!(a.persistence().is_clear_locked());

    assert_eq!(b.pump(), vec![SyncOutcome::Reloaded, SyncOutcome::Adopted]);
    assert!(a.pump().is_empty());
    assert_eq!(a.board(), b.board());
    assert_ne!(a.board(), &old);
    assert_eq!(a.persistence().load_count(), 1);
    assert_eq!(a.persistence().load(0).as_ref(), b.board().card(0));
    assert_eq!(a.persistence().load(1), None);

    // marks made while the lock is held travel over the channel only
    clock.advance(5);
    a.toggle(0, 0, 0);
    assert_eq!(b.pump(), vec![SyncOutcome::Adopted]);
    assert!(b.board().card(0).unwrap().is_marked(0, 0));
    assert!(!a.persistence().load(0).unwrap().is_marked(0, 0));

    clock.advance(TTL_MS);
    a.toggle(0, 0, 1);
    let stored = a.persistence().load(0).unwrap();
    assert!(stored.is_marked(0, 0));
    assert!(stored.is_marked(0, 1));
}

#[test]
fn test_clear_and_pump_in_the_same_millisecond_converge() {
    let hub = ChannelHub::new();
    let store = MemoryStore::new();
    let clock = ManualClock::starting_at(1_000);

    let mut a = open_tab(&hub, &store, &clock);
    let mut b = open_tab(&hub, &store, &clock);
    let mut c = open_tab(&hub, &store, &clock);
    a.pump();
    b.pump();
    c.pump();
    let old = a.board().clone();

    // the clock never moves: every message carries the same timestamp
    b.begin_clear();
    assert_eq!(a.pump(), vec![SyncOutcome::Reloaded, SyncOutcome::Adopted]);
    assert_eq!(c.pump(), vec![SyncOutcome::Reloaded, SyncOutcome::Adopted]);
    assert!(b.pump().is_empty());

    assert_ne!(b.board(), &old);
    assert_eq!(a.board(), b.board());
    assert_eq!(c.board(), b.board());
    assert_eq!(b.persistence().load_count(), 1);
    assert_eq!(b.persistence().load(0).as_ref(), b.board().card(0));

    // a fresh tab agrees with the others too
    let late = open_tab(&hub, &store, &clock);
    assert_eq!(late.board(), b.board());
}

#[test]
fn test_tab_without_channel_only_sees_storage() {
    let hub = ChannelHub::new();
    let store = MemoryStore::new();
    let clock = ManualClock::starting_at(1_000);

    let mut a = open_tab(&hub, &store, &clock);
    clock.advance(10);
    let mut lonely = CardSession::open(store.clone(), SyncContext::isolated(), Arc::new(clock.clone()), TTL_MS);
    assert!(!lonely.context().is_connected());
    assert_eq!(lonely.board(), a.board());

    clock.advance(10);
    a.toggle(0, 4, 4);
    assert!(lonely.pump().is_empty());
    assert!(!lonely.board().card(0).unwrap().is_marked(4, 4));

    lonely.reload();
    assert!(lonely.board().card(0).unwrap().is_marked(4, 4));

    // and its own edits never reach the channel
    clock.advance(10);
    lonely.toggle(0, 3, 3);
    assert!(a.pump().is_empty());
}
