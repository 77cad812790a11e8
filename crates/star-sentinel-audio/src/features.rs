//! Per-buffer feature functions.
//!
//! All functions are pure and total: an empty buffer or zero sample
//! rate yields 0 rather than NaN.

use crate::types::MFCC_LEN;

/// Root-mean-square amplitude.
#[must_use]
pub fn rms(samples: &[i16]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum_sq: f64 = samples
        .iter()
        .map(|&s| {
            let v = f64::from(s);
            v * v
        })
        .sum();
    (sum_sq / samples.len() as f64).sqrt() as f32
}

/// Count sign changes, treating 0 as non-positive.
#[must_use]
pub fn zero_crossings(samples: &[i16]) -> usize {
    samples
        .windows(2)
        .filter(|w| (w[1] > 0 && w[0] <= 0) || (w[1] <= 0 && w[0] > 0))
        .count()
}

/// Zero-crossing pitch estimate.
///
/// Frequency is `crossings / (2 · duration)`; estimates outside
/// `[min_hz, max_hz]` are reported as 0.
#[must_use]
pub fn zero_crossing_pitch(samples: &[i16], sample_rate: u32, min_hz: f32, max_hz: f32) -> f32 {
    if samples.is_empty() || sample_rate == 0 {
        return 0.0;
    }
    let duration = samples.len() as f32 / sample_rate as f32;
    let frequency = zero_crossings(samples) as f32 / (2.0 * duration);
    if (min_hz..=max_hz).contains(&frequency) {
        frequency
    } else {
        0.0
    }
}

/// Energy-derived stand-in for MFCCs.
///
/// `normalized = rms / normalizer`; coefficient 0 is `10 · normalized`,
/// coefficient `i > 0` is `5 · normalized · (13 − i) / 13` with
/// alternating sign (positive for even `i`).
#[must_use]
pub fn placeholder_coefficients(rms: f32, normalizer: f32) -> [f32; MFCC_LEN] {
    let normalized = if normalizer > 0.0 { rms / normalizer } else { 0.0 };
    let mut coeffs = [0.0_f32; MFCC_LEN];
    for (i, c) in coeffs.iter_mut().enumerate() {
        *c = if i == 0 {
            normalized * 10.0
        } else {
            let magnitude = normalized * 5.0 * (MFCC_LEN - i) as f32 / MFCC_LEN as f32;
            if i % 2 == 0 {
                magnitude
            } else {
                -magnitude
            }
        };
    }
    coeffs
}
