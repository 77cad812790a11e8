//! Audio domain types.

use std::sync::Arc;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Number of placeholder cepstral coefficients.
pub const MFCC_LEN: usize = 13;

/// One block of mono PCM audio.
#[derive(Debug, Clone)]
pub struct AudioFrame {
    /// Signed 16-bit samples.
    pub samples: Arc<[i16]>,
    /// Sample rate in Hz.
    pub sample_rate: u32,
}

impl AudioFrame {
    /// Create a frame from owned samples.
    pub fn new(samples: impl Into<Arc<[i16]>>, sample_rate: u32) -> Self {
        Self {
            samples: samples.into(),
            sample_rate,
        }
    }
}

/// Features computed from a single buffer.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AudioFeatures {
    /// Root-mean-square amplitude of the buffer.
    pub rms: f32,
    /// Zero-crossing pitch estimate (Hz), 0 outside the voice band.
    pub pitch_hz: f32,
    /// Log-scaled variance of recent RMS values (dB).
    pub intensity_variance_db: f32,
    /// Placeholder energy-derived coefficients.
    pub mfcc_like: [f32; MFCC_LEN],
}

/// Latest audio state handed to the fusion engine.
///
/// `pitch_hz` holds the last usable pitch; buffers without one leave it
/// untouched.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AudioSnapshot {
    /// Placeholder energy-derived coefficients.
    pub mfcc_like: [f32; MFCC_LEN],
    /// Last usable pitch estimate (Hz).
    pub pitch_hz: f32,
    /// Log-scaled intensity variance (dB).
    pub intensity_variance_db: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_snapshot_is_silent() {
        let snap = AudioSnapshot::default();
        assert!(snap.mfcc_like.iter().all(|&c| c == 0.0));
        assert!((snap.pitch_hz - 0.0).abs() < f32::EPSILON);
    }
}
