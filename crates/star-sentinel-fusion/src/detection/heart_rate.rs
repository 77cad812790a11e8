//! Heart-rate surge rule.

/// Flags a sudden rise in heart rate over an elevated baseline.
///
/// Compares each rate with the one before it, not with a fixed
/// baseline. The stored previous value is replaced on every call.
#[derive(Debug, Clone)]
pub struct HeartRateSurgeDetector {
    baseline_min_bpm: i32,
    surge_delta_bpm: i32,
    previous_bpm: i32,
}

impl HeartRateSurgeDetector {
    pub fn new(baseline_min_bpm: i32, surge_delta_bpm: i32) -> Self {
        Self {
            baseline_min_bpm,
            surge_delta_bpm,
            previous_bpm: 0,
        }
    }

    /// Feed the current rate and report whether it is a surge.
    pub fn observe(&mut self, current_bpm: i32) -> bool {
        let previous = std::mem::replace(&mut self.previous_bpm, current_bpm);
        let surge = previous > self.baseline_min_bpm
            && current_bpm > previous
            && current_bpm - previous >= self.surge_delta_bpm;
        if surge {
            tracing::debug!(previous, current_bpm, "heart rate surge");
        }
        surge
    }

    #[must_use]
    pub fn previous_bpm(&self) -> i32 {
        self.previous_bpm
    }

    pub fn reset(&mut self) {
        self.previous_bpm = 0;
    }
}

impl Default for HeartRateSurgeDetector {
    fn default() -> Self {
        Self::new(65, 25)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn surge_over_elevated_baseline() {
        let mut d = HeartRateSurgeDetector::default();
        assert!(!d.observe(70));
        assert!(d.observe(96));
    }

    #[test]
    fn low_baseline_never_surges() {
        let mut d = HeartRateSurgeDetector::default();
        d.observe(60);
        assert!(!d.observe(96));
    }

    #[test]
    fn baseline_is_exclusive() {
        let mut d = HeartRateSurgeDetector::default();
        d.observe(65);
        assert!(!d.observe(95));
    }

    #[test]
    fn delta_is_inclusive() {
        let mut d = HeartRateSurgeDetector::default();
        d.observe(70);
        assert!(d.observe(95));
        d.observe(70);
        assert!(!d.observe(94));
    }

    #[test]
    fn comparison_slides() {
        let mut d = HeartRateSurgeDetector::default();
        d.observe(70);
        d.observe(85);
        // 85 -> 100 is only +15
        assert!(!d.observe(100));
        assert_eq!(d.previous_bpm(), 100);
    }

    #[test]
    fn drop_is_not_a_surge() {
        let mut d = HeartRateSurgeDetector::default();
        d.observe(140);
        assert!(!d.observe(80));
    }
}
