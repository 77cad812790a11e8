//! Amplitude-based speech gate.
//!
//! A frame counts as speech when its mean absolute amplitude exceeds
//! the threshold. The sticky [`SpeechGate::is_speech`] flag stays up
//! until `silence_timeout_ms` passes without a speech frame.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Speech gate tuning.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SpeechGateConfig {
    /// Mean absolute amplitude above which a frame is speech.
    pub amplitude_threshold: f32,
    /// Silence after which the speech flag drops (ms).
    pub silence_timeout_ms: u64,
}

impl Default for SpeechGateConfig {
    fn default() -> Self {
        Self {
            amplitude_threshold: 1500.0,
            silence_timeout_ms: 1000,
        }
    }
}

/// Stateful speech/silence classifier for PCM frames.
#[derive(Debug, Clone)]
pub struct SpeechGate {
    config: SpeechGateConfig,
    speaking: bool,
    last_speech_ms: Option<u64>,
}

impl SpeechGate {
    pub fn new(config: SpeechGateConfig) -> Self {
        Self {
            config,
            speaking: false,
            last_speech_ms: None,
        }
    }

    /// Mean absolute amplitude of a frame.
    #[must_use]
    pub fn mean_amplitude(samples: &[i16]) -> f32 {
        if samples.is_empty() {
            return 0.0;
        }
        let sum: f64 = samples.iter().map(|&s| f64::from(s).abs()).sum();
        (sum / samples.len() as f64) as f32
    }

    /// Classify one frame at `now_ms`.
    ///
    /// Returns `true` when the frame itself is speech and should be
    /// passed on for feature extraction.
    pub fn observe(&mut self, samples: &[i16], now_ms: u64) -> bool {
        let is_speech_frame = Self::mean_amplitude(samples) > self.config.amplitude_threshold;
        if is_speech_frame {
            self.last_speech_ms = Some(now_ms);
            if !self.speaking {
                tracing::debug!(now_ms, "speech started");
                self.speaking = true;
            }
        } else if self.speaking {
            let silent_for = self
                .last_speech_ms
                .map_or(u64::MAX, |t| now_ms.saturating_sub(t));
            if silent_for > self.config.silence_timeout_ms {
                tracing::debug!(now_ms, silent_for, "speech ended");
                self.speaking = false;
            }
        }
        is_speech_frame
    }

    /// Whether speech is currently considered active.
    #[must_use]
    pub fn is_speech(&self) -> bool {
        self.speaking
    }

    #[must_use]
    pub fn config(&self) -> &SpeechGateConfig {
        &self.config
    }

    pub fn reset(&mut self) {
        self.speaking = false;
        self.last_speech_ms = None;
    }
}

impl Default for SpeechGate {
    fn default() -> Self {
        Self::new(SpeechGateConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quiet_frame_is_not_speech() {
        let mut gate = SpeechGate::default();
        assert!(!gate.observe(&[100; 256], 0));
        assert!(!gate.is_speech());
    }

    #[test]
    fn loud_frame_is_speech() {
        let mut gate = SpeechGate::default();
        assert!(gate.observe(&[2000, -2000, 2000, -2000], 0));
        assert!(gate.is_speech());
    }

    #[test]
    fn threshold_is_exclusive() {
        let mut gate = SpeechGate::default();
        assert!(!gate.observe(&[1500; 16], 0));
    }

    #[test]
    fn flag_holds_through_short_silence() {
        let mut gate = SpeechGate::default();
        gate.observe(&[3000; 16], 0);
        assert!(!gate.observe(&[0; 16], 500));
        assert!(gate.is_speech());
        assert!(!gate.observe(&[0; 16], 1000));
        assert!(gate.is_speech(), "timeout is strictly greater than");
        gate.observe(&[0; 16], 1001);
        assert!(!gate.is_speech());
    }

    #[test]
    fn reset_clears_flag() {
        let mut gate = SpeechGate::default();
        gate.observe(&[3000; 16], 0);
        gate.reset();
        assert!(!gate.is_speech());
    }
}
