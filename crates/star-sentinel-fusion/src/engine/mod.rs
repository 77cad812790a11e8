//! Fear fusion engine.
//!
//! Per tick the engine guards against missing heart data, runs the rule
//! detectors, hands a feature vector to the classifier, then fuses the
//! verdicts through a majority vote and drives the episode state
//! machine:
//!
//! ```text
//!            is_fear
//!   ┌──────┐ ───────▶ ┌──────────┐
//!   │ Idle │          │ Alerting │  (one alert on entry)
//!   └──────┘ ◀─────── └──────────┘
//!        !is_fear && elapsed > timeout
//! ```
//!
//! The tick is split in two halves, [`FearFusionEngine::begin_tick`] and
//! [`FearFusionEngine::resolve_tick`], so the classifier can run on
//! another task. Each pending tick carries the [`Epoch`] it was started
//! in; verdicts from before a [`FearFusionEngine::reset`] are dropped.

mod fusion;
mod state;
mod votes;

pub use fusion::{
    ClassifierVerdict, Epoch, FearFusionEngine, PendingTick, TickId, TickInput, TickOutcome,
};
pub use state::{FearPhase, FearState, Transition};
pub use votes::VoteBuffer;

use serde::{Deserialize, Serialize};

/// Vote smoothing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VoteConfig {
    /// Number of fused verdicts kept for the majority vote.
    pub window: usize,
}

impl Default for VoteConfig {
    fn default() -> Self {
        Self { window: 5 }
    }
}

/// Episode hysteresis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EpisodeConfig {
    /// Minimum episode length before returning to idle (ms).
    pub timeout_ms: u64,
}

impl Default for EpisodeConfig {
    fn default() -> Self {
        Self { timeout_ms: 30_000 }
    }
}
