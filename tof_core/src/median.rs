//! Fixed-window running median.
//!
//! Holds at most `capacity` samples; a new sample evicts the oldest once the
//! window is full. The median is recomputed per query from a preallocated
//! scratch buffer, O(N log N) for the small windows used here.
//!
//! - Empty window: `get_median` returns `None`.
//! - Partially filled window: median over the samples present.
//! - Even length: the lower of the two middle elements.
use std::collections::VecDeque;

#[derive(Debug, Clone)]
pub struct MedianFilter {
    window: VecDeque<i32>,
    scratch: Vec<i32>,
    capacity: usize,
}

impl MedianFilter {
    /// `capacity` is clamped to at least 1.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            window: VecDeque::with_capacity(capacity),
            scratch: Vec::with_capacity(capacity),
            capacity,
        }
    }

    pub fn add_sample(&mut self, value: i32) {
        if self.window.len() == self.capacity {
            self.window.pop_front();
        }
        self.window.push_back(value);
        debug_assert!(self.window.len() <= self.capacity);
    }

    pub fn get_median(&mut self) -> Option<i32> {
        if self.window.is_empty() {
            return None;
        }
        self.scratch.clear();
        self.scratch.extend(self.window.iter().copied());
        self.scratch.sort_unstable();
        let n = self.scratch.len();
        self.scratch.get((n - 1) / 2).copied()
    }

    pub fn len(&self) -> usize {
        self.window.len()
    }

    pub fn is_empty(&self) -> bool {
        self.window.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.window.clear();
    }

    /// Samples oldest first.
    pub fn samples(&self) -> impl Iterator<Item = i32> + '_ {
        self.window.iter().copied()
    }
}
