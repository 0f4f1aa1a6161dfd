use rand::Rng;

use crate::defs::{Number, FIRSTNUMBER, LASTNUMBER};

/// Numbers still waiting to be called.
#[derive(Debug, Clone)]
pub struct Pouch {
    pub numbers: Vec<Number>,
}

impl Pouch {
    pub fn new() -> Self {
        Pouch {
            numbers: (FIRSTNUMBER..=LASTNUMBER).collect(),
        }
    }

    /// A pouch missing the numbers already called.
    pub fn without(drawn: &[Number]) -> Self {
        Pouch {
            numbers: (FIRSTNUMBER..=LASTNUMBER).filter(|n| !drawn.contains(n)).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.numbers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.numbers.is_empty()
    }

    fn remove(&mut self, index: usize) -> Number {
        self.numbers.remove(index)
    }

    pub fn extract_with<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Option<Number> {
        if self.is_empty() {
            None
        } else {
            let random_index = rng.random_range(0..self.len());
            Some(self.remove(random_index))
        }
    }

    pub fn extract(&mut self) -> Option<Number> {
        self.extract_with(&mut rand::rng())
    }
}

impl Default for Pouch {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pouch_empties_without_repeats() {
        let mut pouch = Pouch::new();
        assert_eq!(pouch.len(), 75);
        let mut seen = Vec::new();
        while let Some(n) = pouch.extract() {
            assert!((FIRSTNUMBER..=LASTNUMBER).contains(&n));
            assert!(!seen.contains(&n));
            seen.push(n);
        }
        assert_eq!(seen.len(), 75);
        assert!(pouch.is_empty());
        assert_eq!(pouch.extract(), None);
    }

    #[test]
    fn test_pouch_without_drawn() {
        let pouch = Pouch::without(&[1, 75, 30]);
        assert_eq!(pouch.len(), 72);
        assert!(!pouch.numbers.contains(&30));
    }
}
