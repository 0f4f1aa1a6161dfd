// src/defs.rs
// Shared constants for cards, the caller and the persisted state layout.

pub type Number = u8;

pub struct CardStruct {
    pub cols_per_card: usize,
    pub rows_per_card: usize,
    pub numbers_per_col: Number,
}

pub const CARDCONFIG: CardStruct = CardStruct {
    cols_per_card: 5,    // B I N G O
    rows_per_card: 5,    // numbers per column on a card
    numbers_per_col: 15, // size of each column's number range
};

pub const FIRSTNUMBER: Number = 1;
pub const LASTNUMBER: Number = CARDCONFIG.cols_per_card as Number * CARDCONFIG.numbers_per_col - 1 + FIRSTNUMBER;

// Row and column of the FREE cell
pub const FREE_ROW: usize = 2;
pub const FREE_COL: usize = 2;
pub const FREE_LABEL: &str = "FREE";

pub const MAX_CARDS: usize = 2;

// Keys shared with every instance through the key-value store
pub const CARD_NUMBERS_PREFIX: &str = "bingoCardNumbers_";
pub const CARD_SELECTED_PREFIX: &str = "bingoCardSelected_";
pub const CARD_COUNT_KEY: &str = "bingoCardCount";
pub const CLEAR_LOCK_KEY: &str = "bingo_clear_lock";
pub const DRAWN_NUMBERS_KEY: &str = "bingoDrawnNumbers";
pub const LAST_NUMBER_KEY: &str = "bingoLastNumber";
pub const SELECTED_GAME_KEY: &str = "selectedBingoGame";

pub const DEFAULT_CHANNEL: &str = "bingo_channel";

/// Inclusive number range of a card column.
pub fn column_range(col: usize) -> (Number, Number) {
    let start = FIRSTNUMBER + col as Number * CARDCONFIG.numbers_per_col;
    (start, start + CARDCONFIG.numbers_per_col - 1)
}

/// Column index a callable number belongs to.
pub fn column_of(number: Number) -> usize {
    let offset = number.saturating_sub(FIRSTNUMBER) / CARDCONFIG.numbers_per_col;
    (offset as usize).min(CARDCONFIG.cols_per_card - 1)
}

pub fn card_numbers_key(index: usize) -> String {
    format!("{CARD_NUMBERS_PREFIX}{index}")
}

pub fn card_selected_key(index: usize) -> String {
    format!("{CARD_SELECTED_PREFIX}{index}")
}
