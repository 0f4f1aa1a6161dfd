// src/caller.rs
// Number caller: draws without replacement and keeps the draw history in the
// key-value store so a restart picks up where the game left off.

use rand::Rng;

use crate::board::Board;
use crate::defs::{DRAWN_NUMBERS_KEY, LAST_NUMBER_KEY, Number, SELECTED_GAME_KEY};
use crate::logging::{log_info, log_warning};
use crate::pouch::Pouch;
use crate::storage::KeyValueStore;

pub const PREVIOUS_DRAWS_SHOWN: usize = 5;

pub struct NumberCaller<S: KeyValueStore> {
    store: S,
    board: Board,
    pouch: Pouch,
    last: Option<Number>,
    reset_generation: u64,
}

impl<S: KeyValueStore> NumberCaller<S> {
    pub fn open(store: S) -> Self {
        let board = read_json::<Vec<Number>>(&store, DRAWN_NUMBERS_KEY)
            .map(Board::from_numbers)
            .unwrap_or_default();
        let last = read_json::<Option<Number>>(&store, LAST_NUMBER_KEY)
            .flatten()
            .filter(|n| board.contains(*n))
            .or_else(|| board.last());
        let pouch = Pouch::without(board.numbers());
        Self { store, board, pouch, last, reset_generation: 0 }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn drawn(&self) -> &[Number] {
        self.board.numbers()
    }

    pub fn last(&self) -> Option<Number> {
        self.last
    }

    pub fn remaining(&self) -> usize {
        self.pouch.len()
    }

    pub fn is_finished(&self) -> bool {
        self.board.is_complete()
    }

    /// Changes every time the game is reset.
    pub fn reset_generation(&self) -> u64 {
        self.reset_generation
    }

    pub fn previous_draws(&self) -> Vec<Number> {
        self.board.previous_numbers(PREVIOUS_DRAWS_SHOWN)
    }

    pub fn draw_with<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Option<Number> {
        let number = self.pouch.extract_with(rng)?;
        self.board.push(number);
        self.last = Some(number);
        self.persist();
        Some(number)
    }

    /// Call the next number; `None` once all 75 are out.
    pub fn draw(&mut self) -> Option<Number> {
        self.draw_with(&mut rand::rng())
    }

    pub fn reset(&mut self) {
        self.board = Board::new();
        self.pouch = Pouch::new();
        self.last = None;
        self.reset_generation += 1;
        for key in [DRAWN_NUMBERS_KEY, LAST_NUMBER_KEY] {
            if let Err(e) = self.store.remove_item(key) {
                log_warning(&format!("Could not remove '{key}': {e}"));
            }
        }
        log_info("Caller reset, all numbers back in the pouch");
    }

    fn persist(&self) {
        write_json(&self.store, DRAWN_NUMBERS_KEY, self.board.numbers());
        write_json(&self.store, LAST_NUMBER_KEY, &self.last);
    }

    /// Index of the selected game, clamped to `game_count`.
    pub fn selected_game(&self, game_count: usize) -> usize {
        let index = read_json::<usize>(&self.store, SELECTED_GAME_KEY).unwrap_or(0);
        if index < game_count { index } else { 0 }
    }

    pub fn select_game(&self, index: usize) {
        write_json(&self.store, SELECTED_GAME_KEY, &index);
    }
}

fn read_json<T: serde::de::DeserializeOwned>(store: &impl KeyValueStore, key: &str) -> Option<T> {
    let raw = match store.get_item(key) {
        Ok(raw) => raw?,
        Err(e) => {
            log_warning(&format!("Could not read '{key}': {e}"));
            return None;
        }
    };
    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(e) => {
            log_warning(&format!("Discarding malformed '{key}': {e}"));
            None
        }
    }
}

fn write_json<T: serde::Serialize + ?Sized>(store: &impl KeyValueStore, key: &str, value: &T) {
    let result = serde_json::to_string(value)
        .map_err(|e| e.to_string())
        .and_then(|json| store.set_item(key, &json).map_err(|e| e.to_string()));
    if let Err(e) = result {
        log_warning(&format!("Could not write '{key}': {e}"));
    }
}
