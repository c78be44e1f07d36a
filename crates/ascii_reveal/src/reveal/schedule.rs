use rand::seq::SliceRandom;
use rand::Rng;

use crate::ascii::grid::GlyphGrid;

/// Randomised settle order for the visible cells of one grid.
///
/// Settlement only ever moves forward within a run.
#[derive(Clone, Debug)]
pub struct RevealSchedule {
    order: Vec<usize>,
    settled: Vec<bool>,
    settled_count: usize,
}

impl RevealSchedule {
    /// Uniformly shuffles the non-blank cell indices of `grid`.
    pub fn shuffled<R: Rng + ?Sized>(grid: &GlyphGrid, rng: &mut R) -> Self {
        let mut order: Vec<usize> = grid.visible_indices().collect();
        order.shuffle(rng);
        Self { order, settled: vec![false; grid.len()], settled_count: 0 }
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn order(&self) -> &[usize] {
        &self.order
    }

    pub fn settled_count(&self) -> usize {
        self.settled_count
    }

    pub fn is_settled(&self, index: usize) -> bool {
        self.settled.get(index).copied().unwrap_or(false)
    }

    pub fn is_complete(&self) -> bool {
        self.settled_count == self.order.len()
    }

    /// Settles cells in schedule order until `target` are settled.
    ///
    /// A target below the current count is ignored. Returns the newly settled indices.
    pub fn advance_to(&mut self, target: usize) -> &[usize] {
        let target = target.min(self.order.len());
        let start = self.settled_count;
        if target <= start {
            return &[];
        }

        for &index in &self.order[start..target] {
            self.settled[index] = true;
        }
        self.settled_count = target;
        &self.order[start..target]
    }

    /// Number of cells that should be settled at `progress` in `[0, 1]`.
    pub fn target_for(&self, progress: f64) -> usize {
        if progress >= 1.0 {
            return self.order.len();
        }
        let target = (progress.max(0.0) * self.order.len() as f64).floor() as usize;
        target.min(self.order.len())
    }
}
