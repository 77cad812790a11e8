//! HRV domain types.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Derived HRV metrics at a point in time.
///
/// `sdnn_ms` and `rmssd_ms` are reported as 0 until enough intervals
/// exist to define them.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct HrvSnapshot {
    /// Instantaneous heart rate in BPM.
    pub heart_rate_bpm: i32,
    /// Mean RR interval (ms).
    pub mean_rr_ms: f32,
    /// Population standard deviation of RR intervals (ms).
    pub sdnn_ms: f32,
    /// Root mean square of successive RR differences (ms).
    pub rmssd_ms: f32,
    /// Number of intervals currently in the window.
    pub rr_count: usize,
}

impl HrvSnapshot {
    /// Whether the snapshot carries enough data for a fusion tick.
    #[must_use]
    pub fn is_usable(&self) -> bool {
        self.heart_rate_bpm > 0 && self.mean_rr_ms > 0.0
    }
}
