//! Dense per-pair score matrix
//!
//! One `R x C` matrix lives for the duration of a genome pair. Each row is
//! individually lockable so a row-phase task can claim its own row once and
//! fill it without synchronising with other rows; column-phase readers run
//! strictly after the row fence.

use crate::similarity::Score;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Row-major matrix of similarity scores in [0, 1]
///
/// Cells are zero-initialised; for same-genome comparisons only the strict
/// upper triangle is ever written.
#[derive(Debug)]
pub struct ScoreMatrix {
    rows: Vec<Mutex<Box<[Score]>>>,
    cols: usize,
}

impl ScoreMatrix {
    /// Allocate an all-zero matrix with `rows` x `cols` cells
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows: (0..rows)
                .map(|_| Mutex::new(vec![0.0; cols].into_boxed_slice()))
                .collect(),
            cols,
        }
    }

    /// Number of rows
    pub fn rows(&self) -> usize {
        self.rows.len()
    }

    /// Number of columns
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Exclusive access to row `row`; the writer holds the guard while
    /// filling the whole row
    pub fn lock_row(&self, row: usize) -> MutexGuard<'_, Box<[Score]>> {
        self.rows[row].lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Read a single cell
    pub fn get(&self, row: usize, col: usize) -> Score {
        self.rows[row].lock().unwrap_or_else(PoisonError::into_inner)[col]
    }
}
