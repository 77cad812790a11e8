//! Remote fear classifier.
//!
//! The classifier sees a 19-value [`FeatureVector`] per tick and
//! answers fear / no fear. Calls run off the ingestion path and every
//! failure is folded into a `false` verdict by [`classify_fail_closed`].

mod http;

pub use http::HttpClassifier;

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use star_sentinel_audio::{AudioSnapshot, MFCC_LEN};
use star_sentinel_vitals::HrvSnapshot;

use crate::error::ClassifierError;

/// Length of the classifier input.
pub const FEATURE_LEN: usize = 4 + MFCC_LEN + 2;

/// Classifier input:
/// `[hr, mean_rr, rmssd, sdnn] ++ mfcc_like[0..13] ++ [pitch, intensity]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector(pub [f32; FEATURE_LEN]);

impl FeatureVector {
    /// Assemble the vector from the latest HRV and audio state.
    #[must_use]
    pub fn from_snapshots(hrv: &HrvSnapshot, audio: &AudioSnapshot) -> Self {
        let mut v = [0.0_f32; FEATURE_LEN];
        v[0] = hrv.heart_rate_bpm as f32;
        v[1] = hrv.mean_rr_ms;
        v[2] = hrv.rmssd_ms;
        v[3] = hrv.sdnn_ms;
        v[4..4 + MFCC_LEN].copy_from_slice(&audio.mfcc_like);
        v[4 + MFCC_LEN] = audio.pitch_hz;
        v[5 + MFCC_LEN] = audio.intensity_variance_db;
        Self(v)
    }

    #[must_use]
    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    /// Whether every element is finite.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.0.iter().all(|v| v.is_finite())
    }
}

/// Remote classifier tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Prediction endpoint; `None` disables the classifier.
    pub url: Option<String>,
    /// Deadline per call (ms).
    pub timeout_ms: u64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            url: None,
            timeout_ms: 5000,
        }
    }
}

impl ClassifierConfig {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// A binary fear classifier.
#[async_trait::async_trait]
pub trait FearClassifier: Send + Sync {
    /// Classifier name used in logs.
    fn name(&self) -> &str {
        "classifier"
    }

    /// Classify one feature vector.
    async fn classify(&self, features: &FeatureVector) -> Result<bool, ClassifierError>;
}

/// Classifier with a fixed answer, for offline runs and tests.
#[derive(Debug, Clone, Copy)]
pub struct StaticClassifier(pub bool);

#[async_trait::async_trait]
impl FearClassifier for StaticClassifier {
    fn name(&self) -> &str {
        "static"
    }

    async fn classify(&self, _features: &FeatureVector) -> Result<bool, ClassifierError> {
        Ok(self.0)
    }
}

/// Run a classifier on its own task under a deadline.
///
/// Errors, timeouts and panics inside the classifier all yield `false`.
/// Nothing is retried.
pub async fn classify_fail_closed(
    classifier: Arc<dyn FearClassifier>,
    features: FeatureVector,
    timeout: Duration,
) -> bool {
    let timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
    let name = classifier.name().to_string();

    let task = tokio::spawn(async move {
        match tokio::time::timeout(timeout, classifier.classify(&features)).await {
            Ok(result) => result,
            Err(_) => Err(ClassifierError::Timeout(timeout_ms)),
        }
    });

    let result = match task.await {
        Ok(result) => result,
        Err(join_err) => Err(ClassifierError::TaskFailed(join_err.to_string())),
    };

    match result {
        Ok(fear) => fear,
        Err(e) => {
            tracing::warn!(
                classifier = %name,
                error = %e,
                "Classifier call failed, treating verdict as no fear"
            );
            false
        }
    }
}
