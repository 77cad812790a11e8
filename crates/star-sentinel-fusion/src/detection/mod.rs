//! Rule-based detectors.
//!
//! Three cheap heuristics run on every fusion tick alongside the remote
//! classifier. Each detector owns the single-cell memory it compares
//! against; the engine owns the detectors and resets them together.

mod heart_rate;
mod intensity;
mod scream;

pub use heart_rate::HeartRateSurgeDetector;
pub use intensity::IntensitySpikeDetector;
pub use scream::ScreamDetector;

use serde::{Deserialize, Serialize};
use star_sentinel_audio::AudioSnapshot;

/// Thresholds for the rule detectors.
///
/// These are empirically tuned defaults, not physiological constants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Previous rate must exceed this for a surge to count (BPM).
    pub hr_baseline_min_bpm: i32,
    /// Minimum rise between consecutive rates (BPM).
    pub hr_surge_delta_bpm: i32,
    /// Pitch above which a loud frame reads as a scream (Hz).
    pub scream_pitch_hz: f32,
    /// Intensity variance a scream must exceed (dB).
    pub scream_intensity_db: f32,
    /// Magnitude of coefficient 0 a scream must exceed.
    pub scream_mfcc0: f32,
    /// Maximum gap between intensity samples for a spike (ms).
    pub intensity_spike_window_ms: u64,
    /// Minimum intensity change for a spike (dB).
    pub intensity_spike_delta_db: f32,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            hr_baseline_min_bpm: 65,
            hr_surge_delta_bpm: 25,
            scream_pitch_hz: 400.0,
            scream_intensity_db: 15.0,
            scream_mfcc0: 5.0,
            intensity_spike_window_ms: 1000,
            intensity_spike_delta_db: 1.0,
        }
    }
}

/// Verdicts of all rule detectors for one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RuleVerdicts {
    pub heart_rate_surge: bool,
    pub scream: bool,
    pub intensity_spike: bool,
}

impl RuleVerdicts {
    /// Whether any rule fired.
    #[must_use]
    pub fn any(&self) -> bool {
        self.heart_rate_surge || self.scream || self.intensity_spike
    }

    /// Names of the rules that fired, in a fixed order.
    #[must_use]
    pub fn reasons(&self) -> Vec<&'static str> {
        let mut out = Vec::new();
        if self.heart_rate_surge {
            out.push("heart_rate_surge");
        }
        if self.scream {
            out.push("scream");
        }
        if self.intensity_spike {
            out.push("intensity_spike");
        }
        out
    }
}

/// Owns all three detectors and evaluates them together.
#[derive(Debug, Clone)]
pub struct RuleSet {
    heart_rate: HeartRateSurgeDetector,
    scream: ScreamDetector,
    intensity: IntensitySpikeDetector,
}

impl RuleSet {
    pub fn new(config: &DetectorConfig) -> Self {
        Self {
            heart_rate: HeartRateSurgeDetector::new(
                config.hr_baseline_min_bpm,
                config.hr_surge_delta_bpm,
            ),
            scream: ScreamDetector::new(
                config.scream_pitch_hz,
                config.scream_intensity_db,
                config.scream_mfcc0,
            ),
            intensity: IntensitySpikeDetector::new(
                config.intensity_spike_window_ms,
                config.intensity_spike_delta_db,
            ),
        }
    }

    /// Run every detector, updating their memories.
    pub fn evaluate(
        &mut self,
        heart_rate_bpm: i32,
        audio: &AudioSnapshot,
        now_ms: u64,
    ) -> RuleVerdicts {
        RuleVerdicts {
            heart_rate_surge: self.heart_rate.observe(heart_rate_bpm),
            scream: self.scream.detect(
                audio.pitch_hz,
                audio.intensity_variance_db,
                audio.mfcc_like[0],
            ),
            intensity_spike: self.intensity.observe(audio.intensity_variance_db, now_ms),
        }
    }

    pub fn reset(&mut self) {
        self.heart_rate.reset();
        self.intensity.reset();
    }
}

impl Default for RuleSet {
    fn default() -> Self {
        Self::new(&DetectorConfig::default())
    }
}
