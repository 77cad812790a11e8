//! Cardiac variability metrics for the Star Sentinel pipeline.
//!
//! Converts raw heartbeat timestamps and instantaneous heart-rate
//! readings from a wearable into a rolling set of heart-rate
//! variability (HRV) metrics.
//!
//! # Architecture
//!
//! 1. **Beat ingestion** ([`HrvProcessor::process_beat`]): turns
//!    consecutive beat timestamps into RR intervals, discarding
//!    physiologically implausible values.
//! 2. **RR window** ([`RrWindow`]): fixed-capacity ring of accepted
//!    intervals, oldest evicted first.
//! 3. **Metrics** ([`HrvSnapshot`]): mean RR, SDNN, RMSSD and the
//!    instantaneous heart rate derived from the latest interval.
//! 4. **Rate gating** ([`RateBeatGate`]): derives pseudo-beats from a
//!    sensor that only reports BPM, as most smartwatch heart-rate
//!    sensors do.
//!
//! # Example
//!
//! ```
//! use star_sentinel_vitals::{HrvConfig, HrvProcessor};
//!
//! let mut hrv = HrvProcessor::new(HrvConfig::default());
//!
//! for ts in [0_u64, 800, 1600, 2400] {
//!     hrv.process_beat(ts);
//! }
//!
//! let snapshot = hrv.snapshot();
//! assert_eq!(snapshot.rr_count, 3);
//! assert_eq!(snapshot.heart_rate_bpm, 75);
//! assert!((snapshot.mean_rr_ms - 800.0).abs() < 1e-3);
//! ```

pub mod beat_gate;
pub mod hrv;
pub mod types;
pub mod window;

pub use beat_gate::{RateBeatGate, RateBeatGateConfig};
pub use hrv::{HrvConfig, HrvProcessor};
pub use types::HrvSnapshot;
pub use window::RrWindow;
