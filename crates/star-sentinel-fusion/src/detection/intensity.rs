//! Intensity spike rule.

/// Flags a sharp change in intensity variance between close samples.
#[derive(Debug, Clone)]
pub struct IntensitySpikeDetector {
    window_ms: u64,
    delta_db: f32,
    previous: Option<(f32, u64)>,
}

impl IntensitySpikeDetector {
    pub fn new(window_ms: u64, delta_db: f32) -> Self {
        Self {
            window_ms,
            delta_db,
            previous: None,
        }
    }

    /// Feed the current intensity at `now_ms`.
    ///
    /// The stored pair is replaced on every call.
    pub fn observe(&mut self, value_db: f32, now_ms: u64) -> bool {
        match self.previous.replace((value_db, now_ms)) {
            Some((prev_db, prev_at)) => {
                now_ms.saturating_sub(prev_at) <= self.window_ms
                    && (value_db - prev_db).abs() >= self.delta_db
            }
            None => false,
        }
    }

    /// Last observed `(value_db, at_ms)`.
    #[must_use]
    pub fn previous(&self) -> Option<(f32, u64)> {
        self.previous
    }

    pub fn reset(&mut self) {
        self.previous = None;
    }
}

impl Default for IntensitySpikeDetector {
    fn default() -> Self {
        Self::new(1000, 1.0)
    }
}
