//! Pipeline configuration.
//!
//! [`FusionConfig`] gathers every tunable constant of the pipeline. All
//! sections use `#[serde(default)]`, so a JSON file only needs the
//! fields it overrides:
//!
//! ```json
//! { "episode": { "timeout_ms": 60000 }, "classifier": { "url": "http://localhost:8000/predict" } }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use star_sentinel_audio::AudioConfig;
use star_sentinel_vitals::{HrvConfig, RateBeatGateConfig};

use crate::alerting::{AlertConfig, StaticLocation};
use crate::classifier::ClassifierConfig;
use crate::detection::DetectorConfig;
use crate::engine::{EpisodeConfig, VoteConfig};
use crate::error::ConfigError;

/// Async pipeline tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Period of the fusion tick (ms).
    pub fusion_interval_ms: u64,
    /// Buffered sensor events per ingest channel before the oldest drop.
    pub ingest_capacity: usize,
    /// Buffered classifier verdicts.
    pub verdict_capacity: usize,
    /// Buffered control commands.
    pub control_capacity: usize,
    /// Ticks allowed to await the classifier at once.
    pub max_in_flight: usize,
    /// Derive beats from heart-rate readings when no beat source exists.
    pub derive_beats_from_rate: bool,
    /// Gate used when `derive_beats_from_rate` is set.
    pub beat_gate: RateBeatGateConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            fusion_interval_ms: 1000,
            ingest_capacity: 256,
            verdict_capacity: 64,
            control_capacity: 16,
            max_in_flight: 32,
            derive_beats_from_rate: false,
            beat_gate: RateBeatGateConfig::default(),
        }
    }
}

/// Complete configuration for a Star Sentinel pipeline.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FusionConfig {
    pub hrv: HrvConfig,
    pub audio: AudioConfig,
    pub detector: DetectorConfig,
    pub vote: VoteConfig,
    pub episode: EpisodeConfig,
    pub classifier: ClassifierConfig,
    pub pipeline: PipelineConfig,
    pub alert: AlertConfig,
}

impl FusionConfig {
    /// Create a builder
    pub fn builder() -> FusionConfigBuilder {
        FusionConfigBuilder::default()
    }

    /// Load and validate a configuration from a JSON file.
    ///
    /// # Errors
    ///
    /// [`ConfigError::FileRead`] if the file cannot be read,
    /// [`ConfigError::ParseError`] for malformed JSON and
    /// [`ConfigError::InvalidValue`] if validation fails.
    pub fn from_json(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
        let cfg: FusionConfig =
            serde_json::from_str(&contents).map_err(|source| ConfigError::ParseError {
                path: path.to_path_buf(),
                source,
            })?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Parse and validate a configuration from a JSON string.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let cfg: FusionConfig = serde_json::from_str(json)
            .map_err(|e| ConfigError::invalid_value("(json)", e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Pretty-printed JSON.
    pub fn to_json_pretty(&self) -> Result<String, ConfigError> {
        serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::invalid_value("(serialization)", e.to_string()))
    }

    /// Write pretty-printed JSON to `path`, creating parent directories.
    pub fn to_json(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| ConfigError::FileRead {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let json = self.to_json_pretty()?;
        std::fs::write(path, json).map_err(|source| ConfigError::FileRead {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Check cross-field consistency and reject values that would stall
    /// or panic the pipeline.
    pub fn validate(&self) -> Result<(), ConfigError> {
        // HRV
        if self.hrv.rr_min_ms >= self.hrv.rr_max_ms {
            return Err(ConfigError::invalid_value(
                "hrv.rr_min_ms",
                format!(
                    "must be < hrv.rr_max_ms ({} >= {})",
                    self.hrv.rr_min_ms, self.hrv.rr_max_ms
                ),
            ));
        }
        if self.hrv.rr_min_ms <= 0 {
            return Err(ConfigError::invalid_value("hrv.rr_min_ms", "must be > 0"));
        }
        if self.hrv.window_capacity == 0 {
            return Err(ConfigError::invalid_value("hrv.window_capacity", "must be > 0"));
        }
        if self.hrv.min_samples == 0 {
            return Err(ConfigError::invalid_value("hrv.min_samples", "must be > 0"));
        }

        // Audio
        if self.audio.intensity_capacity == 0 {
            return Err(ConfigError::invalid_value(
                "audio.intensity_capacity",
                "must be > 0",
            ));
        }
        if self.audio.pitch_min_hz >= self.audio.pitch_max_hz {
            return Err(ConfigError::invalid_value(
                "audio.pitch_min_hz",
                "must be < audio.pitch_max_hz",
            ));
        }
        if self.audio.energy_normalizer <= 0.0 {
            return Err(ConfigError::invalid_value(
                "audio.energy_normalizer",
                "must be > 0.0",
            ));
        }

        // Engine
        if self.vote.window == 0 {
            return Err(ConfigError::invalid_value("vote.window", "must be > 0"));
        }

        // Classifier
        if self.classifier.timeout_ms == 0 {
            return Err(ConfigError::invalid_value("classifier.timeout_ms", "must be > 0"));
        }
        if matches!(self.classifier.url.as_deref(), Some(url) if url.trim().is_empty()) {
            return Err(ConfigError::invalid_value("classifier.url", "must not be empty"));
        }

        // Pipeline
        if self.pipeline.fusion_interval_ms == 0 {
            return Err(ConfigError::invalid_value(
                "pipeline.fusion_interval_ms",
                "must be > 0",
            ));
        }
        if self.pipeline.ingest_capacity == 0 {
            return Err(ConfigError::invalid_value(
                "pipeline.ingest_capacity",
                "must be > 0",
            ));
        }
        if self.pipeline.verdict_capacity == 0 || self.pipeline.control_capacity == 0 {
            return Err(ConfigError::invalid_value(
                "pipeline.verdict_capacity",
                "channel capacities must be > 0",
            ));
        }
        if self.pipeline.max_in_flight == 0 {
            return Err(ConfigError::invalid_value("pipeline.max_in_flight", "must be > 0"));
        }

        Ok(())
    }
}

/// Builder for [`FusionConfig`]
#[derive(Debug, Default)]
pub struct FusionConfigBuilder {
    config: FusionConfig,
}

impl FusionConfigBuilder {
    /// Replace the HRV section
    pub fn hrv(mut self, hrv: HrvConfig) -> Self {
        self.config.hrv = hrv;
        self
    }

    /// Replace the audio section
    pub fn audio(mut self, audio: AudioConfig) -> Self {
        self.config.audio = audio;
        self
    }

    /// Replace the detector thresholds
    pub fn detector(mut self, detector: DetectorConfig) -> Self {
        self.config.detector = detector;
        self
    }

    /// Set the vote window size
    pub fn vote_window(mut self, window: usize) -> Self {
        self.config.vote.window = window.max(1);
        self
    }

    /// Set the episode timeout
    pub fn episode_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.config.episode.timeout_ms = timeout_ms;
        self
    }

    /// Set the classifier endpoint
    pub fn classifier_url(mut self, url: impl Into<String>) -> Self {
        self.config.classifier.url = Some(url.into());
        self
    }

    /// Set the classifier deadline
    pub fn classifier_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.config.classifier.timeout_ms = timeout_ms.max(1);
        self
    }

    /// Set the fusion tick period
    pub fn fusion_interval_ms(mut self, interval_ms: u64) -> Self {
        self.config.pipeline.fusion_interval_ms = interval_ms.max(1);
        self
    }

    /// Bound the ticks awaiting the classifier
    pub fn max_in_flight(mut self, max: usize) -> Self {
        self.config.pipeline.max_in_flight = max.max(1);
        self
    }

    /// Enable beat derivation from heart-rate readings
    pub fn derive_beats_from_rate(mut self, enabled: bool) -> Self {
        self.config.pipeline.derive_beats_from_rate = enabled;
        self
    }

    /// Set the alert message
    pub fn alert_message(mut self, message: impl Into<String>) -> Self {
        self.config.alert.message = message.into();
        self
    }

    /// Set a fixed alert location
    pub fn location(mut self, location: StaticLocation) -> Self {
        self.config.alert.location = Some(location);
        self
    }

    /// Build the configuration
    pub fn build(self) -> FusionConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_constants() {
        let c = FusionConfig::default();
        assert_eq!(c.hrv.rr_min_ms, 300);
        assert_eq!(c.hrv.rr_max_ms, 1500);
        assert_eq!(c.hrv.window_capacity, 60);
        assert_eq!(c.hrv.min_samples, 3);
        assert_eq!(c.audio.intensity_capacity, 50);
        assert!((c.audio.pitch_min_hz - 80.0).abs() < f32::EPSILON);
        assert!((c.audio.pitch_max_hz - 400.0).abs() < f32::EPSILON);
        assert_eq!(c.vote.window, 5);
        assert_eq!(c.detector.hr_baseline_min_bpm, 65);
        assert_eq!(c.detector.hr_surge_delta_bpm, 25);
        assert!((c.detector.scream_pitch_hz - 400.0).abs() < f32::EPSILON);
        assert!((c.detector.scream_intensity_db - 15.0).abs() < f32::EPSILON);
        assert!((c.detector.scream_mfcc0 - 5.0).abs() < f32::EPSILON);
        assert_eq!(c.detector.intensity_spike_window_ms, 1000);
        assert!((c.detector.intensity_spike_delta_db - 1.0).abs() < f32::EPSILON);
        assert_eq!(c.episode.timeout_ms, 30_000);
        assert_eq!(c.pipeline.fusion_interval_ms, 1000);
        assert!(c.validate().is_ok());
    }

    #[test]
    fn partial_json_keeps_other_defaults() {
        let c = FusionConfig::from_json_str(r#"{"episode": {"timeout_ms": 60000}}"#).unwrap();
        assert_eq!(c.episode.timeout_ms, 60_000);
        assert_eq!(c.vote.window, 5);
        assert_eq!(c.hrv.rr_max_ms, 1500);
    }

    #[test]
    fn json_roundtrip() {
        let c = FusionConfig::builder()
            .classifier_url("http://localhost:8000/predict")
            .vote_window(7)
            .build();
        let json = c.to_json_pretty().unwrap();
        let back = FusionConfig::from_json_str(&json).unwrap();
        assert_eq!(back, c);
    }

    #[test]
    fn rejects_inverted_rr_range() {
        let mut c = FusionConfig::default();
        c.hrv.rr_min_ms = 1500;
        c.hrv.rr_max_ms = 300;
        let err = c.validate().unwrap_err();
        assert!(err.to_string().contains("hrv.rr_min_ms"));
    }

    #[test]
    fn rejects_inverted_pitch_band() {
        let mut c = FusionConfig::default();
        c.audio.pitch_min_hz = 500.0;
        assert!(c.validate().is_err());
    }

    #[test]
    fn rejects_zero_capacities() {
        let mut c = FusionConfig::default();
        c.vote.window = 0;
        assert!(c.validate().is_err());

        let mut c = FusionConfig::default();
        c.pipeline.ingest_capacity = 0;
        assert!(c.validate().is_err());

        let mut c = FusionConfig::default();
        c.audio.intensity_capacity = 0;
        assert!(c.validate().is_err());
    }

    #[test]
    fn rejects_empty_classifier_url() {
        let c = FusionConfig::builder().classifier_url("  ").build();
        assert!(c.validate().is_err());
    }

    #[test]
    fn rejects_malformed_json() {
        assert!(FusionConfig::from_json_str("{ not json").is_err());
    }

    #[test]
    fn file_roundtrip() {
        let dir = std::env::temp_dir().join(format!("star-sentinel-config-{}", std::process::id()));
        let path = dir.join("nested").join("config.json");
        let c = FusionConfig::builder().episode_timeout_ms(45_000).build();
        c.to_json(&path).unwrap();
        let back = FusionConfig::from_json(&path).unwrap();
        assert_eq!(back.episode.timeout_ms, 45_000);
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn missing_file_reports_path() {
        let err = FusionConfig::from_json(Path::new("/nonexistent/star-sentinel.json")).unwrap_err();
        assert!(matches!(err, ConfigError::FileRead { .. }));
    }
}
