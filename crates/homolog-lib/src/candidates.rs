//! Per-row best-hit candidate tracking
//!
//! During the row phase each row records the best score seen so far and the
//! set of columns attaining it. The container is the compact alternative to
//! re-scanning every row for its maximum during the column phase: inverting
//! the candidate lists yields exactly the columns worth scanning.

use crate::similarity::Score;
use ahash::AHashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Best score on one row plus the columns tied at that score
///
/// Invariant: either `best == 0` and the column list is empty, or
/// `best > 0` and every listed column scored exactly `best`.
#[derive(Debug, Clone, Default)]
pub struct BbhCandidate {
    best: Score,
    columns: Vec<usize>,
}

impl BbhCandidate {
    /// Create an empty candidate record
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold in the score observed at `col`
    ///
    /// A strictly better score resets the column list; a tie at a positive
    /// best accumulates; anything else is ignored. Zero scores are never
    /// recorded, which keeps rows without any positive score out of the
    /// column phase entirely.
    pub fn update(&mut self, col: usize, score: Score) {
        if score > self.best {
            self.best = score;
            self.columns.clear();
            self.columns.push(col);
        } else if score == self.best && self.best > 0.0 {
            self.columns.push(col);
        }
    }

    /// Best score observed so far (0 when nothing positive was seen)
    pub fn best_score(&self) -> Score {
        self.best
    }

    /// Columns tied at the best score
    pub fn columns(&self) -> &[usize] {
        &self.columns
    }
}

/// One [`BbhCandidate`] per row of the current genome pair
#[derive(Debug)]
pub struct BbhCandidatesContainer {
    rows: Vec<Mutex<BbhCandidate>>,
}

impl BbhCandidatesContainer {
    /// Allocate empty candidate records for `rows` rows
    pub fn new(rows: usize) -> Self {
        Self {
            rows: (0..rows).map(|_| Mutex::new(BbhCandidate::new())).collect(),
        }
    }

    /// Number of rows
    pub fn rows(&self) -> usize {
        self.rows.len()
    }

    /// Exclusive access to row `row`'s record; the row-phase task holds the
    /// guard while sweeping its columns
    pub fn lock_row(&self, row: usize) -> MutexGuard<'_, BbhCandidate> {
        self.rows[row].lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Best score recorded for `row`
    pub fn best_score_for(&self, row: usize) -> Score {
        self.lock_row(row).best_score()
    }

    /// Invert the per-row column lists into column -> rows
    ///
    /// Columns absent from every row's list are absent from the map; those
    /// are exactly the columns the column phase can skip.
    pub fn invert(&self) -> AHashMap<usize, Vec<usize>> {
        let mut col_to_rows: AHashMap<usize, Vec<usize>> = AHashMap::new();
        for row in 0..self.rows.len() {
            let candidate = self.lock_row(row);
            for &col in candidate.columns() {
                col_to_rows.entry(col).or_default().push(row);
            }
        }
        col_to_rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_reset_tie_ignore() {
        let mut candidate = BbhCandidate::new();
        assert_eq!(candidate.best_score(), 0.0);
        assert!(candidate.columns().is_empty());

        candidate.update(0, 0.5);
        assert_eq!(candidate.best_score(), 0.5);
        assert_eq!(candidate.columns(), &[0]);

        // tie accumulates
        candidate.update(3, 0.5);
        assert_eq!(candidate.columns(), &[0, 3]);

        // worse score ignored
        candidate.update(5, 0.2);
        assert_eq!(candidate.columns(), &[0, 3]);

        // better score resets
        candidate.update(7, 0.8);
        assert_eq!(candidate.best_score(), 0.8);
        assert_eq!(candidate.columns(), &[7]);
    }

    #[test]
    fn test_zero_scores_never_recorded() {
        let mut candidate = BbhCandidate::new();
        candidate.update(0, 0.0);
        candidate.update(1, 0.0);
        assert_eq!(candidate.best_score(), 0.0);
        assert!(candidate.columns().is_empty());
    }

    #[test]
    fn test_invert_skips_empty_rows() {
        let container = BbhCandidatesContainer::new(3);
        container.lock_row(0).update(2, 0.9);
        container.lock_row(2).update(2, 0.4);
        container.lock_row(2).update(1, 0.4);
        // row 1 saw only zeros

        let inverted = container.invert();
        assert_eq!(inverted.len(), 2);
        assert_eq!(inverted.get(&2), Some(&vec![0, 2]));
        assert_eq!(inverted.get(&1), Some(&vec![2]));
    }
}
