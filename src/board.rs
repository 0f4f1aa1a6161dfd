// src/board.rs
// The caller's board: every number called so far, in call order.

use serde::{Deserialize, Serialize};

use crate::defs::{FIRSTNUMBER, LASTNUMBER, Number};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board(Vec<Number>);

impl Board {
    pub fn new() -> Self {
        Board(Vec::new())
    }

    /// Rebuild from persisted numbers, dropping anything out of range or repeated.
    pub fn from_numbers(numbers: Vec<Number>) -> Self {
        let mut board = Board::new();
        for number in numbers {
            board.push(number);
        }
        board
    }

    /// Record a called number. Returns false for repeats and out-of-range values.
    pub fn push(&mut self, number: Number) -> bool {
        if !(FIRSTNUMBER..=LASTNUMBER).contains(&number) || self.contains(number) {
            return false;
        }
        self.0.push(number);
        true
    }

    pub fn numbers(&self) -> &[Number] {
        &self.0
    }

    pub fn contains(&self, number: Number) -> bool {
        self.0.contains(&number)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn is_complete(&self) -> bool {
        self.0.len() == (LASTNUMBER - FIRSTNUMBER + 1) as usize
    }

    pub fn last(&self) -> Option<Number> {
        self.0.last().copied()
    }

    /// Up to `n` numbers called before the latest one, oldest first.
    pub fn previous_numbers(&self, n: usize) -> Vec<Number> {
        if self.0.len() <= 1 {
            return Vec::new();
        }

        let end_index = self.0.len() - 1;
        let start_index = end_index.saturating_sub(n);
        self.0[start_index..end_index].to_vec()
    }

    pub fn sorted_numbers(&self) -> Vec<Number> {
        let mut sorted = self.0.clone();
        sorted.sort_unstable();
        sorted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_previous_numbers_window() {
        let mut board = Board::new();
        assert!(board.previous_numbers(5).is_empty());
        board.push(10);
        assert!(board.previous_numbers(5).is_empty());

        for n in [20, 30, 40, 50, 60, 70] {
            board.push(n);
        }
        assert_eq!(board.last(), Some(70));
        assert_eq!(board.previous_numbers(5), vec![20, 30, 40, 50, 60]);
        assert_eq!(board.previous_numbers(2), vec![50, 60]);
    }

    #[test]
    fn test_push_rejects_repeats_and_out_of_range() {
        let mut board = Board::new();
        assert!(board.push(5));
        assert!(!board.push(5));
        assert!(!board.push(0));
        assert!(!board.push(76));
        assert_eq!(Board::from_numbers(vec![3, 3, 99, 1]).numbers(), &[3, 1]);
    }

    #[test]
    fn test_sorted_and_complete() {
        let board = Board::from_numbers((FIRSTNUMBER..=LASTNUMBER).rev().collect());
        assert!(board.is_complete());
        assert_eq!(board.sorted_numbers()[0], 1);
        assert_eq!(board.numbers()[0], 75);
    }
}
