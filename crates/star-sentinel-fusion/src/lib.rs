//! # Star Sentinel Fusion
//!
//! Fuses cardiac beat timing and microphone audio into a single
//! debounced fear/distress signal and raises at most one emergency alert
//! per episode.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                    star-sentinel-fusion                      │
//! ├──────────────────────────────────────────────────────────────┤
//! │  vitals::HrvProcessor ──┐                                    │
//! │                         ├─▶ detection ─┐                     │
//! │  audio::Extractor ──────┘              ├─▶ engine ─▶ alerting│
//! │                          classifier ───┘   (votes,           │
//! │                          (remote, async)    Idle/Alerting)   │
//! │                                                              │
//! │  pipeline: one tokio task owning all of the above            │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! - [`detection`]: heart-rate surge, scream signature and intensity
//!   spike rules.
//! - [`classifier`]: the [`FearClassifier`] seam and its HTTP client;
//!   failures always count as "no fear".
//! - [`engine`]: [`FearFusionEngine`], the vote buffer and the episode
//!   state machine.
//! - [`alerting`]: alert text and delivery channels.
//! - [`pipeline`]: [`Sentinel`], the async front end.
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use star_sentinel_fusion::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = FusionConfig::builder()
//!         .classifier_url("http://localhost:8000/predict")
//!         .build();
//!     config.validate()?;
//!
//!     let classifier = HttpClassifier::from_config(&config.classifier)?
//!         .map(|c| Arc::new(c) as Arc<dyn FearClassifier>);
//!     let composer = AlertComposer::from_config(&config.alert);
//!     let (handle, task) = Sentinel::spawn(config, classifier, Arc::new(LogAlertChannel), composer);
//!
//!     handle.on_heart_rate(72)?;
//!     handle.on_heartbeat(0)?;
//!     handle.on_audio_frame(vec![0_i16; 1600], 16_000)?;
//!
//!     handle.shutdown().await?;
//!     task.await.ok();
//!     Ok(())
//! }
//! ```

pub mod alerting;
pub mod classifier;
pub mod config;
pub mod detection;
pub mod engine;
pub mod error;
pub mod pipeline;

pub use alerting::{
    AlertChannel, AlertComposer, AlertConfig, AlertRequest, LocationProvider, LogAlertChannel,
    RecordingAlertChannel, StaticLocation,
};
pub use classifier::{
    classify_fail_closed, ClassifierConfig, FearClassifier, FeatureVector, HttpClassifier,
    StaticClassifier,
};
pub use config::{FusionConfig, FusionConfigBuilder, PipelineConfig};
pub use detection::{
    DetectorConfig, HeartRateSurgeDetector, IntensitySpikeDetector, RuleVerdicts, ScreamDetector,
};
pub use engine::{
    ClassifierVerdict, EpisodeConfig, Epoch, FearFusionEngine, FearPhase, FearState, PendingTick,
    TickId, TickInput, TickOutcome, VoteBuffer, VoteConfig,
};
pub use error::{AlertError, ClassifierError, ConfigError, FusionError};
pub use pipeline::{
    Clock, FusionStatus, HeartEvent, ManualClock, MonotonicClock, Sentinel, SentinelBuilder,
    SentinelHandle,
};

pub use star_sentinel_audio as audio;
pub use star_sentinel_vitals as vitals;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Result type for fusion operations
pub type Result<T> = std::result::Result<T, FusionError>;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        AlertChannel, AlertComposer, ClassifierVerdict, FearClassifier, FearFusionEngine,
        FearPhase, FusionConfig, FusionError, FusionStatus, HttpClassifier, LogAlertChannel,
        RecordingAlertChannel, Result, Sentinel, SentinelHandle, StaticClassifier,
        StaticLocation, TickInput,
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_is_set() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn config_builder() {
        let config = FusionConfig::builder()
            .vote_window(3)
            .episode_timeout_ms(10_000)
            .fusion_interval_ms(0)
            .build();
        assert_eq!(config.vote.window, 3);
        assert_eq!(config.episode.timeout_ms, 10_000);
        // Clamped to keep the ticker valid
        assert_eq!(config.pipeline.fusion_interval_ms, 1);
    }
}
