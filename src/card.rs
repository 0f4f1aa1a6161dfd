// src/card.rs
// Bingo card model: a 5x5 number grid with a FREE centre and the player's marks.

use std::fmt;

use rand::Rng;
use rand::seq::SliceRandom;
use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};

use crate::defs::{CARDCONFIG, FREE_COL, FREE_LABEL, FREE_ROW, MAX_CARDS, Number, column_range};

const COLS: usize = CARDCONFIG.cols_per_card;
const ROWS: usize = CARDCONFIG.rows_per_card;

/// A single card cell: a callable number or the FREE centre.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cell {
    Number(Number),
    Free,
}

impl Cell {
    pub fn number(&self) -> Option<Number> {
        match self {
            Cell::Number(n) => Some(*n),
            Cell::Free => None,
        }
    }

    pub fn is_free(&self) -> bool {
        matches!(self, Cell::Free)
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Number(n) => write!(f, "{n}"),
            Cell::Free => f.write_str(FREE_LABEL),
        }
    }
}

// Persisted as a bare integer, or the string "FREE"
impl Serialize for Cell {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Cell::Number(n) => serializer.serialize_u8(*n),
            Cell::Free => serializer.serialize_str(FREE_LABEL),
        }
    }
}

struct CellVisitor;

impl<'de> Visitor<'de> for CellVisitor {
    type Value = Cell;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "a card number or \"{FREE_LABEL}\"")
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Cell, E> {
        Number::try_from(v)
            .map(Cell::Number)
            .map_err(|_| E::invalid_value(de::Unexpected::Unsigned(v), &self))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Cell, E> {
        Number::try_from(v)
            .map(Cell::Number)
            .map_err(|_| E::invalid_value(de::Unexpected::Signed(v), &self))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Cell, E> {
        if v == FREE_LABEL {
            Ok(Cell::Free)
        } else {
            Err(E::invalid_value(de::Unexpected::Str(v), &self))
        }
    }
}

impl<'de> Deserialize<'de> for Cell {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Cell, D::Error> {
        deserializer.deserialize_any(CellVisitor)
    }
}

/// Numbers stored column-major: `numbers[col][row]`.
pub type NumberGrid = [[Cell; ROWS]; COLS];
/// Marks stored row-major: `marked[row][col]`.
pub type MarkedGrid = [[bool; COLS]; ROWS];

/// Returns true when every cell but the FREE centre is marked (blackout).
pub fn check_win(marked: &MarkedGrid) -> bool {
    marked.iter().enumerate().all(|(row, cells)| {
        cells
            .iter()
            .enumerate()
            .all(|(col, &is_marked)| is_marked || (row == FREE_ROW && col == FREE_COL))
    })
}

/// A fresh marked grid: only the centre is marked.
pub fn initial_marked() -> MarkedGrid {
    let mut marked = [[false; COLS]; ROWS];
    marked[FREE_ROW][FREE_COL] = true;
    marked
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    numbers: NumberGrid,
    marked: MarkedGrid,
}

impl Card {
    /// Build a card from persisted grids; the centre is forced marked.
    pub fn from_parts(numbers: NumberGrid, marked: MarkedGrid) -> Self {
        let mut card = Card { numbers, marked };
        card.marked[FREE_ROW][FREE_COL] = true;
        card
    }

    pub fn numbers(&self) -> &NumberGrid {
        &self.numbers
    }

    pub fn marked(&self) -> &MarkedGrid {
        &self.marked
    }

    pub fn cell(&self, row: usize, col: usize) -> Cell {
        self.numbers[col][row]
    }

    pub fn is_marked(&self, row: usize, col: usize) -> bool {
        self.marked[row][col]
    }

    /// Flip the mark of a cell. The centre cannot be toggled; returns
    /// whether anything changed.
    pub fn toggle(&mut self, row: usize, col: usize) -> bool {
        if row >= ROWS || col >= COLS || (row == FREE_ROW && col == FREE_COL) {
            return false;
        }
        self.marked[row][col] = !self.marked[row][col];
        true
    }

    pub fn has_blackout(&self) -> bool {
        check_win(&self.marked)
    }

    pub fn marked_count(&self) -> usize {
        self.marked.iter().flatten().filter(|&&m| m).count()
    }

    /// Checks the column ranges, distinctness and the FREE centre.
    pub fn is_valid(&self) -> bool {
        for (col, column) in self.numbers.iter().enumerate() {
            let (start, end) = column_range(col);
            let mut seen: Vec<Number> = Vec::with_capacity(ROWS);
            for (row, cell) in column.iter().enumerate() {
                match cell {
                    Cell::Free if row == FREE_ROW && col == FREE_COL => {}
                    Cell::Number(n) if row != FREE_ROW || col != FREE_COL => {
                        if *n < start || *n > end || seen.contains(n) {
                            return false;
                        }
                        seen.push(*n);
                    }
                    _ => return false,
                }
            }
        }
        self.marked[FREE_ROW][FREE_COL]
    }
}

/// Ordered set of one or two cards shown together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardSet {
    cards: Vec<Card>,
}

impl BoardSet {
    pub fn new(cards: Vec<Card>) -> Option<Self> {
        let set = BoardSet { cards };
        set.is_valid().then_some(set)
    }

    pub fn single(card: Card) -> Self {
        BoardSet { cards: vec![card] }
    }

    pub fn count(&self) -> usize {
        self.cards.len()
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn card(&self, index: usize) -> Option<&Card> {
        self.cards.get(index)
    }

    pub fn card_mut(&mut self, index: usize) -> Option<&mut Card> {
        self.cards.get_mut(index)
    }

    /// Append a card unless the set is full.
    pub fn push(&mut self, card: Card) -> bool {
        if self.cards.len() >= MAX_CARDS {
            return false;
        }
        self.cards.push(card);
        true
    }

    /// Shape check for sets coming from another instance.
    pub fn is_valid(&self) -> bool {
        (1..=MAX_CARDS).contains(&self.cards.len()) && self.cards.iter().all(Card::is_valid)
    }
}

#[derive(Debug, Clone, Default)]
pub struct CardGenerator;

impl CardGenerator {
    pub fn new() -> Self {
        Self
    }

    /// `count` distinct numbers from `start..=end`.
    pub fn column_numbers<R: Rng + ?Sized>(&self, rng: &mut R, start: Number, end: Number, count: usize) -> Vec<Number> {
        let mut pool: Vec<Number> = (start..=end).collect();
        pool.shuffle(rng);
        pool.truncate(count);
        pool
    }

    pub fn generate_card_with<R: Rng + ?Sized>(&self, rng: &mut R) -> Card {
        let mut numbers = [[Cell::Free; ROWS]; COLS];
        for (col, column) in numbers.iter_mut().enumerate() {
            let (start, end) = column_range(col);
            let drawn = self.column_numbers(rng, start, end, ROWS);
            for (cell, number) in column.iter_mut().zip(drawn) {
                *cell = Cell::Number(number);
            }
        }
        numbers[FREE_COL][FREE_ROW] = Cell::Free;
        Card::from_parts(numbers, initial_marked())
    }

    pub fn generate_card(&self) -> Card {
        self.generate_card_with(&mut rand::rng())
    }
}
