//! Fixed-capacity RR interval window.

use std::collections::VecDeque;

/// Ring buffer of accepted RR intervals (oldest first).
#[derive(Debug, Clone)]
pub struct RrWindow {
    intervals: VecDeque<i64>,
    capacity: usize,
}

impl RrWindow {
    /// Create a window holding at most `capacity` intervals.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            intervals: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Push an interval, evicting the oldest one when full.
    pub fn push(&mut self, rr_ms: i64) {
        if self.intervals.len() >= self.capacity {
            self.intervals.pop_front();
        }
        self.intervals.push_back(rr_ms);
    }

    /// Most recent interval.
    #[must_use]
    pub fn latest(&self) -> Option<i64> {
        self.intervals.back().copied()
    }

    /// Arithmetic mean of the buffered intervals.
    #[must_use]
    pub fn mean(&self) -> Option<f64> {
        if self.intervals.is_empty() {
            return None;
        }
        let sum: i64 = self.intervals.iter().sum();
        Some(sum as f64 / self.intervals.len() as f64)
    }

    /// Population standard deviation about the mean (SDNN).
    #[must_use]
    pub fn std_dev(&self) -> Option<f64> {
        let mean = self.mean()?;
        let sum_sq: f64 = self
            .intervals
            .iter()
            .map(|&rr| {
                let d = rr as f64 - mean;
                d * d
            })
            .sum();
        Some((sum_sq / self.intervals.len() as f64).sqrt())
    }

    /// Root mean square of successive differences (RMSSD).
    ///
    /// Requires at least two intervals.
    #[must_use]
    pub fn rmssd(&self) -> Option<f64> {
        if self.intervals.len() < 2 {
            return None;
        }
        let sum_sq: f64 = self
            .intervals
            .iter()
            .zip(self.intervals.iter().skip(1))
            .map(|(&a, &b)| {
                let d = (b - a) as f64;
                d * d
            })
            .sum();
        Some((sum_sq / (self.intervals.len() - 1) as f64).sqrt())
    }

    /// Iterate intervals oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &i64> {
        self.intervals.iter()
    }

    /// Number of buffered intervals.
    #[must_use]
    pub fn len(&self) -> usize {
        self.intervals.len()
    }

    /// Whether the window is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }

    /// Maximum number of intervals retained.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Drop all intervals.
    pub fn clear(&mut self) {
        self.intervals.clear();
    }
}
