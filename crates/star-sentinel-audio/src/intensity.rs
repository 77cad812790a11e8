//! Short-term intensity history.

use std::collections::VecDeque;

/// Ring of recent RMS values used for intensity variance.
#[derive(Debug, Clone)]
pub struct IntensityHistory {
    values: VecDeque<f32>,
    capacity: usize,
}

impl IntensityHistory {
    /// Create a history holding at most `capacity` values.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            values: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append an RMS value, evicting the oldest when full.
    pub fn push(&mut self, rms: f32) {
        if self.values.len() >= self.capacity {
            self.values.pop_front();
        }
        self.values.push_back(rms);
    }

    /// Mean squared deviation about the mean.
    ///
    /// Requires at least two values.
    #[must_use]
    pub fn variance(&self) -> Option<f32> {
        if self.values.len() < 2 {
            return None;
        }
        let n = self.values.len() as f64;
        let mean = self.values.iter().map(|&v| f64::from(v)).sum::<f64>() / n;
        let sum_sq: f64 = self
            .values
            .iter()
            .map(|&v| {
                let d = f64::from(v) - mean;
                d * d
            })
            .sum();
        Some((sum_sq / n) as f32)
    }

    /// Variance on a log scale: `20·log10(variance + 1)`.
    ///
    /// The `+ 1` keeps silence at 0 dB instead of negative infinity.
    #[must_use]
    pub fn variance_db(&self) -> Option<f32> {
        self.variance().map(|v| 20.0 * (v + 1.0).log10())
    }

    /// Number of buffered values.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the history is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Maximum number of values retained.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Drop all values.
    pub fn clear(&mut self) {
        self.values.clear();
    }
}
