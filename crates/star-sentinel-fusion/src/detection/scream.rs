//! Scream signature rule.

/// Stateless scream signature check.
///
/// A frame reads as a scream when intensity variance is high and either
/// the pitch is above the ceiling or the energy coefficient is large.
#[derive(Debug, Clone, Copy)]
pub struct ScreamDetector {
    pitch_hz: f32,
    intensity_db: f32,
    mfcc0: f32,
}

impl ScreamDetector {
    pub fn new(pitch_hz: f32, intensity_db: f32, mfcc0: f32) -> Self {
        Self {
            pitch_hz,
            intensity_db,
            mfcc0,
        }
    }

    #[must_use]
    pub fn detect(&self, pitch_hz: f32, intensity_variance_db: f32, mfcc0: f32) -> bool {
        let loud = intensity_variance_db > self.intensity_db;
        (loud && pitch_hz > self.pitch_hz) || (loud && mfcc0.abs() > self.mfcc0)
    }
}

impl Default for ScreamDetector {
    fn default() -> Self {
        Self::new(400.0, 15.0, 5.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn high_pitch_and_loud() {
        assert!(ScreamDetector::default().detect(450.0, 16.0, 0.0));
    }

    #[test]
    fn energy_and_loud() {
        let d = ScreamDetector::default();
        assert!(d.detect(0.0, 16.0, 5.5));
        assert!(d.detect(0.0, 16.0, -5.5));
    }

    #[test]
    fn quiet_never_screams() {
        let d = ScreamDetector::default();
        assert!(!d.detect(450.0, 15.0, 9.0));
    }

    #[test]
    fn thresholds_are_exclusive() {
        let d = ScreamDetector::default();
        assert!(!d.detect(400.0, 20.0, 5.0));
    }
}
