//! Stateful audio feature extractor.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::features;
use crate::intensity::IntensityHistory;
use crate::speech::SpeechGateConfig;
use crate::types::{AudioFeatures, AudioSnapshot, MFCC_LEN};

/// Configuration for [`AudioFeatureExtractor`].
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct AudioConfig {
    /// Number of RMS values kept for intensity variance.
    pub intensity_capacity: usize,
    /// Lower edge of the accepted pitch band (Hz).
    pub pitch_min_hz: f32,
    /// Upper edge of the accepted pitch band (Hz).
    pub pitch_max_hz: f32,
    /// RMS divisor for the placeholder coefficients.
    pub energy_normalizer: f32,
    /// Optional speech gate in front of the extractor.
    pub speech_gate: Option<SpeechGateConfig>,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            intensity_capacity: 50,
            pitch_min_hz: 80.0,
            pitch_max_hz: 400.0,
            energy_normalizer: 10_000.0,
            speech_gate: None,
        }
    }
}

/// Extracts intensity variance, pitch and placeholder coefficients from
/// consecutive PCM buffers.
///
/// The extractor also holds the latest [`AudioSnapshot`]. A buffer whose
/// pitch falls outside the voice band leaves the previous pitch in
/// place, and the variance only updates once two RMS values exist.
#[derive(Debug, Clone)]
pub struct AudioFeatureExtractor {
    config: AudioConfig,
    intensity: IntensityHistory,
    snapshot: AudioSnapshot,
}

impl AudioFeatureExtractor {
    #[must_use]
    pub fn new(config: AudioConfig) -> Self {
        let intensity = IntensityHistory::new(config.intensity_capacity);
        Self {
            config,
            intensity,
            snapshot: AudioSnapshot::default(),
        }
    }

    /// Process one buffer and update the snapshot.
    ///
    /// Returns `None` without touching any state for an empty buffer, a
    /// zero sample rate, or a non-finite intermediate value.
    pub fn process_buffer(&mut self, samples: &[i16], sample_rate: u32) -> Option<AudioFeatures> {
        if samples.is_empty() || sample_rate == 0 {
            tracing::trace!(len = samples.len(), sample_rate, "skipping unusable audio buffer");
            return None;
        }

        let rms = features::rms(samples);
        if !rms.is_finite() {
            tracing::debug!("non-finite RMS, buffer dropped");
            return None;
        }

        let pitch = features::zero_crossing_pitch(
            samples,
            sample_rate,
            self.config.pitch_min_hz,
            self.config.pitch_max_hz,
        );
        let mfcc = features::placeholder_coefficients(rms, self.config.energy_normalizer);
        if !pitch.is_finite() || mfcc.iter().any(|c| !c.is_finite()) {
            tracing::debug!(pitch, "non-finite audio feature, buffer dropped");
            return None;
        }

        // Evaluate the variance on a scratch copy so a bad value leaves
        // the ring untouched.
        let mut next = self.intensity.clone();
        next.push(rms);
        let variance_db = next.variance_db();
        if let Some(v) = variance_db {
            if !v.is_finite() {
                tracing::debug!(variance_db = v, "non-finite intensity variance, buffer dropped");
                return None;
            }
        }
        self.intensity = next;

        if let Some(v) = variance_db {
            self.snapshot.intensity_variance_db = v;
        }
        if pitch > 0.0 {
            self.snapshot.pitch_hz = pitch;
        }
        self.snapshot.mfcc_like = mfcc;

        Some(AudioFeatures {
            rms,
            pitch_hz: pitch,
            intensity_variance_db: self.snapshot.intensity_variance_db,
            mfcc_like: mfcc,
        })
    }

    /// Latest extracted state.
    #[must_use]
    pub fn snapshot(&self) -> AudioSnapshot {
        self.snapshot
    }

    /// Buffered RMS history.
    #[must_use]
    pub fn intensity(&self) -> &IntensityHistory {
        &self.intensity
    }

    #[must_use]
    pub fn config(&self) -> &AudioConfig {
        &self.config
    }

    /// Clear the intensity ring and zero all outputs.
    pub fn reset(&mut self) {
        self.intensity.clear();
        self.snapshot = AudioSnapshot {
            mfcc_like: [0.0; MFCC_LEN],
            pitch_hz: 0.0,
            intensity_variance_db: 0.0,
        };
    }
}

impl Default for AudioFeatureExtractor {
    fn default() -> Self {
        Self::new(AudioConfig::default())
    }
}
