// src/checker.rs
// Winner checking board: the caller ticks the numbers a claimed winner reads
// out and compares them against what was actually drawn.

use crate::defs::{CARDCONFIG, Number};

pub const CHECKER_ROWS: usize = CARDCONFIG.numbers_per_col as usize;
pub const CHECKER_COLS: usize = CARDCONFIG.cols_per_card;
/// A card holds at most this many numbers per column.
pub const MAX_PER_COLUMN: usize = CARDCONFIG.rows_per_card;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WinnerBoard {
    selected: [[bool; CHECKER_COLS]; CHECKER_ROWS],
    generation: u64,
}

impl Default for WinnerBoard {
    fn default() -> Self {
        Self::new()
    }
}

impl WinnerBoard {
    pub fn new() -> Self {
        Self { selected: [[false; CHECKER_COLS]; CHECKER_ROWS], generation: 0 }
    }

    pub fn number_at(row: usize, col: usize) -> Number {
        (1 + CHECKER_ROWS * col + row) as Number
    }

    pub fn is_selected(&self, row: usize, col: usize) -> bool {
        row < CHECKER_ROWS && col < CHECKER_COLS && self.selected[row][col]
    }

    pub fn column_count(&self, col: usize) -> usize {
        self.selected.iter().filter(|row| row[col]).count()
    }

    /// Flip a cell. Returns false when the cell is out of range or the column
    /// is already full.
    pub fn toggle(&mut self, row: usize, col: usize) -> bool {
        if row >= CHECKER_ROWS || col >= CHECKER_COLS {
            return false;
        }
        if !self.selected[row][col] && self.column_count(col) >= MAX_PER_COLUMN {
            return false;
        }
        self.selected[row][col] = !self.selected[row][col];
        true
    }

    pub fn selected_numbers(&self) -> Vec<Number> {
        let mut numbers = Vec::new();
        for col in 0..CHECKER_COLS {
            for row in 0..CHECKER_ROWS {
                if self.selected[row][col] {
                    numbers.push(Self::number_at(row, col));
                }
            }
        }
        numbers
    }

    /// Selected numbers that were never called.
    pub fn not_drawn(&self, drawn: &[Number]) -> Vec<Number> {
        self.selected_numbers().into_iter().filter(|n| !is_drawn(drawn, *n)).collect()
    }

    pub fn reset(&mut self) {
        self.selected = [[false; CHECKER_COLS]; CHECKER_ROWS];
    }

    /// Clear the selection if the caller was reset since the last look.
    pub fn sync_generation(&mut self, caller_generation: u64) {
        if caller_generation != self.generation {
            self.reset();
            self.generation = caller_generation;
        }
    }
}

pub fn is_drawn(drawn: &[Number], number: Number) -> bool {
    drawn.contains(&number)
}
