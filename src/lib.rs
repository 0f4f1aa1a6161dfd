// lib.rs
// Library modules for the bingo caller and bingo cards

pub mod defs;
pub mod logging;
pub mod config;
pub mod clock;
pub mod storage;
pub mod card;
pub mod persistence;
pub mod channel;
pub mod sync;
pub mod pouch;
pub mod board;
pub mod caller;
pub mod pattern;
pub mod event;
pub mod checker;
pub mod terminal;
