//! Audio feature extraction for the Star Sentinel pipeline.
//!
//! Turns blocks of signed 16-bit PCM samples into three features used
//! by the scream and intensity detectors:
//!
//! 1. **Intensity variance** ([`IntensityHistory`]): variance of recent
//!    RMS values, log-scaled as `20·log10(variance + 1)`.
//! 2. **Pitch** ([`features::zero_crossing_pitch`]): zero-crossing rate
//!    estimate, kept only inside the voice band.
//! 3. **MFCC-like coefficients** ([`features::placeholder_coefficients`]):
//!    a 13-value vector derived from normalized RMS energy. This is a
//!    deliberate approximation, not a cepstral transform; the scream
//!    thresholds are calibrated against it.
//!
//! A [`SpeechGate`] can sit in front of the extractor so that only
//! frames loud enough to be voice are analysed.
//!
//! # Example
//!
//! ```
//! use star_sentinel_audio::{AudioConfig, AudioFeatureExtractor};
//!
//! let mut extractor = AudioFeatureExtractor::new(AudioConfig::default());
//!
//! // 200 Hz square wave at 16 kHz (40 samples per half period)
//! let samples: Vec<i16> = (0..1600)
//!     .map(|i| if (i / 40) % 2 == 0 { 3000 } else { -3000 })
//!     .collect();
//!
//! let features = extractor.process_buffer(&samples, 16_000).unwrap();
//! assert!((features.pitch_hz - 200.0).abs() < 10.0);
//! assert_eq!(extractor.snapshot().mfcc_like.len(), 13);
//! ```

pub mod extractor;
pub mod features;
pub mod intensity;
pub mod speech;
pub mod types;

pub use extractor::{AudioConfig, AudioFeatureExtractor};
pub use intensity::IntensityHistory;
pub use speech::{SpeechGate, SpeechGateConfig};
pub use types::{AudioFeatures, AudioFrame, AudioSnapshot, MFCC_LEN};
