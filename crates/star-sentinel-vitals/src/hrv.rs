//! HRV processor.
//!
//! Accepts beat timestamps and instantaneous heart-rate readings and
//! keeps a rolling [`HrvSnapshot`] current. Input that cannot produce a
//! metric is dropped and logged; the processor never fails.

use crate::types::HrvSnapshot;
use crate::window::RrWindow;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Configuration for [`HrvProcessor`].
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct HrvConfig {
    /// Shortest plausible RR interval (ms). 300 ms = 200 BPM.
    pub rr_min_ms: i64,
    /// Longest plausible RR interval (ms). 1500 ms = 40 BPM.
    pub rr_max_ms: i64,
    /// Number of intervals retained in the window.
    pub window_capacity: usize,
    /// Intervals required before mean RR, SDNN and heart rate are computed.
    pub min_samples: usize,
}

impl Default for HrvConfig {
    fn default() -> Self {
        Self {
            rr_min_ms: 300,
            rr_max_ms: 1500,
            window_capacity: 60,
            min_samples: 3,
        }
    }
}

/// Rolling HRV metric computation over a fixed RR window.
#[derive(Debug, Clone)]
pub struct HrvProcessor {
    config: HrvConfig,
    window: RrWindow,
    last_beat_ms: Option<u64>,
    snapshot: HrvSnapshot,
}

impl HrvProcessor {
    /// Create a processor with the given configuration.
    #[must_use]
    pub fn new(config: HrvConfig) -> Self {
        Self {
            window: RrWindow::new(config.window_capacity),
            config,
            last_beat_ms: None,
            snapshot: HrvSnapshot::default(),
        }
    }

    /// Process a detected heartbeat at `timestamp_ms` (monotonic).
    ///
    /// Returns `true` if a new RR interval was accepted into the window.
    /// The last-beat timestamp is updated even when the interval is
    /// rejected, so one outlier does not poison the next interval.
    pub fn process_beat(&mut self, timestamp_ms: u64) -> bool {
        let previous = self.last_beat_ms.replace(timestamp_ms);
        let Some(previous) = previous else {
            return false;
        };

        let rr = timestamp_ms as i64 - previous as i64;
        if rr < self.config.rr_min_ms || rr > self.config.rr_max_ms {
            tracing::debug!(
                rr_ms = rr,
                min = self.config.rr_min_ms,
                max = self.config.rr_max_ms,
                "Discarding implausible RR interval"
            );
            return false;
        }

        self.window.push(rr);
        self.recompute();
        true
    }

    /// Record an instantaneous heart-rate reading from the sensor.
    ///
    /// Until real RR intervals exist, a positive rate also bootstraps
    /// the mean RR as `60000 / bpm`.
    pub fn process_heart_rate(&mut self, bpm: i32) {
        if bpm <= 0 {
            tracing::trace!(bpm, "Ignoring non-positive heart rate");
            self.snapshot.heart_rate_bpm = 0;
            return;
        }

        self.snapshot.heart_rate_bpm = bpm;
        if self.window.is_empty() {
            self.snapshot.mean_rr_ms = 60_000.0 / bpm as f32;
        }
    }

    fn recompute(&mut self) {
        if let Some(rmssd) = self.window.rmssd() {
            self.snapshot.rmssd_ms = rmssd as f32;
        }
        self.snapshot.rr_count = self.window.len();

        if self.window.len() < self.config.min_samples {
            return;
        }

        if let (Some(mean), Some(sdnn), Some(latest)) =
            (self.window.mean(), self.window.std_dev(), self.window.latest())
        {
            self.snapshot.mean_rr_ms = mean as f32;
            self.snapshot.sdnn_ms = sdnn as f32;
            if latest > 0 {
                self.snapshot.heart_rate_bpm = (60_000.0 / latest as f32) as i32;
            }
        }
    }

    /// Current metrics.
    #[must_use]
    pub fn snapshot(&self) -> HrvSnapshot {
        self.snapshot
    }

    /// Buffered RR intervals, oldest first.
    #[must_use]
    pub fn window(&self) -> &RrWindow {
        &self.window
    }

    /// Timestamp of the last processed beat.
    #[must_use]
    pub fn last_beat_ms(&self) -> Option<u64> {
        self.last_beat_ms
    }

    /// Active configuration.
    #[must_use]
    pub fn config(&self) -> &HrvConfig {
        &self.config
    }

    /// Clear the window, derived metrics and last-beat timestamp.
    pub fn reset(&mut self) {
        self.window.clear();
        self.last_beat_ms = None;
        self.snapshot = HrvSnapshot::default();
    }
}

impl Default for HrvProcessor {
    fn default() -> Self {
        Self::new(HrvConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed(hrv: &mut HrvProcessor, intervals: &[u64]) {
        let mut ts = 10_000;
        hrv.process_beat(ts);
        for rr in intervals {
            ts += rr;
            hrv.process_beat(ts);
        }
    }

    #[test]
    fn first_beat_produces_no_interval() {
        let mut hrv = HrvProcessor::default();
        assert!(!hrv.process_beat(5_000));
        assert_eq!(hrv.window().len(), 0);
        assert_eq!(hrv.last_beat_ms(), Some(5_000));
    }

    #[test]
    fn mean_rr_needs_min_samples() {
        let mut hrv = HrvProcessor::default();
        feed(&mut hrv, &[800, 900]);
        let snap = hrv.snapshot();
        assert_eq!(snap.rr_count, 2);
        assert!((snap.mean_rr_ms - 0.0).abs() < f32::EPSILON);
        assert!((snap.sdnn_ms - 0.0).abs() < f32::EPSILON);
        // RMSSD is defined from two intervals
        assert!((snap.rmssd_ms - 100.0).abs() < 1e-3);

        hrv.process_beat(hrv.last_beat_ms().unwrap() + 1000);
        let snap = hrv.snapshot();
        assert_eq!(snap.rr_count, 3);
        assert!((snap.mean_rr_ms - 900.0).abs() < 1e-3);
        assert_eq!(snap.heart_rate_bpm, 60);
    }

    #[test]
    fn out_of_range_interval_updates_last_timestamp() {
        let mut hrv = HrvProcessor::default();
        hrv.process_beat(1_000);
        assert!(!hrv.process_beat(1_200)); // 200 ms, rejected
        assert_eq!(hrv.last_beat_ms(), Some(1_200));
        assert!(hrv.process_beat(2_000)); // 800 ms from the rejected beat
        assert_eq!(hrv.window().latest(), Some(800));
    }

    #[test]
    fn long_interval_rejected() {
        let mut hrv = HrvProcessor::default();
        hrv.process_beat(0);
        assert!(!hrv.process_beat(1_600));
        assert!(hrv.window().is_empty());
    }

    #[test]
    fn bounds_are_inclusive() {
        let mut hrv = HrvProcessor::default();
        hrv.process_beat(0);
        assert!(hrv.process_beat(300));
        assert!(hrv.process_beat(1_800));
        assert_eq!(hrv.window().len(), 2);
    }

    #[test]
    fn heart_rate_bootstraps_mean_rr() {
        let mut hrv = HrvProcessor::default();
        hrv.process_heart_rate(75);
        let snap = hrv.snapshot();
        assert_eq!(snap.heart_rate_bpm, 75);
        assert!((snap.mean_rr_ms - 800.0).abs() < 1e-3);
    }

    #[test]
    fn heart_rate_does_not_override_real_mean_rr() {
        let mut hrv = HrvProcessor::default();
        feed(&mut hrv, &[1000, 1000, 1000]);
        hrv.process_heart_rate(120);
        let snap = hrv.snapshot();
        assert_eq!(snap.heart_rate_bpm, 120);
        assert!((snap.mean_rr_ms - 1000.0).abs() < 1e-3);

        // Next beat recomputes the RR-derived rate
        hrv.process_beat(hrv.last_beat_ms().unwrap() + 1000);
        assert_eq!(hrv.snapshot().heart_rate_bpm, 60);
    }

    #[test]
    fn non_positive_heart_rate_ignored_for_bootstrap() {
        let mut hrv = HrvProcessor::default();
        hrv.process_heart_rate(0);
        hrv.process_heart_rate(-5);
        let snap = hrv.snapshot();
        assert_eq!(snap.heart_rate_bpm, 0);
        assert!((snap.mean_rr_ms - 0.0).abs() < f32::EPSILON);
    }

    #[test]
    fn reset_clears_state() {
        let mut hrv = HrvProcessor::default();
        feed(&mut hrv, &[800, 820, 810, 790]);
        assert!(hrv.snapshot().is_usable());
        hrv.reset();
        assert_eq!(hrv.snapshot(), HrvSnapshot::default());
        assert!(hrv.window().is_empty());
        assert!(hrv.last_beat_ms().is_none());
    }

    #[test]
    fn window_caps_at_capacity() {
        let mut hrv = HrvProcessor::new(HrvConfig {
            window_capacity: 4,
            ..HrvConfig::default()
        });
        feed(&mut hrv, &[600, 700, 800, 900, 1000, 1100]);
        assert_eq!(hrv.window().len(), 4);
        assert_eq!(
            hrv.window().iter().copied().collect::<Vec<_>>(),
            vec![800, 900, 1000, 1100]
        );
        assert!((hrv.snapshot().mean_rr_ms - 950.0).abs() < 1e-3);
    }
}
