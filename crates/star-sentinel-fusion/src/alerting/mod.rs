//! Alert composition and delivery.
//!
//! The engine emits an [`AlertRequest`] on the tick that opens an
//! episode. The pipeline turns it into text with an [`AlertComposer`]
//! and hands it to an [`AlertChannel`] on a detached task; delivery
//! failures are logged and never feed back into the state machine.

mod channel;
mod composer;

pub use channel::{AlertChannel, LogAlertChannel, RecordingAlertChannel};
pub use composer::{AlertComposer, Location, LocationProvider, StaticLocation};

use serde::{Deserialize, Serialize};

use crate::engine::TickId;

/// Default alert body.
pub const DEFAULT_ALERT_MESSAGE: &str = "I might be in danger...";

/// Everything known about the tick that opened an episode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertRequest {
    pub episode_started_at_ms: u64,
    pub tick: TickId,
    pub heart_rate_bpm: i32,
    pub pitch_hz: f32,
    pub intensity_variance_db: f32,
    /// Which signals fired on the opening tick.
    pub reasons: Vec<String>,
}

/// Alert text configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertConfig {
    /// Message sent to contacts.
    pub message: String,
    /// Fixed location appended to the message, if known.
    pub location: Option<StaticLocation>,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            message: DEFAULT_ALERT_MESSAGE.to_string(),
            location: None,
        }
    }
}

/// Compose and deliver one alert, logging the result.
///
/// Returns whether the channel accepted the message. Failures are not
/// retried.
pub async fn dispatch(
    composer: &AlertComposer,
    channel: &dyn AlertChannel,
    request: &AlertRequest,
) -> bool {
    let message = composer.compose().await;

    tracing::info!(
        tick = %request.tick,
        channel = %channel.name(),
        heart_rate_bpm = request.heart_rate_bpm,
        reasons = ?request.reasons,
        "Dispatching alert"
    );

    match channel.send_alert(&message).await {
        Ok(()) => {
            tracing::info!(tick = %request.tick, channel = %channel.name(), "Alert delivered");
            true
        }
        Err(e) => {
            tracing::warn!(
                tick = %request.tick,
                channel = %channel.name(),
                error = %e,
                "Alert delivery failed"
            );
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> AlertRequest {
        AlertRequest {
            episode_started_at_ms: 5_000,
            tick: TickId(3),
            heart_rate_bpm: 120,
            pitch_hz: 310.0,
            intensity_variance_db: 40.0,
            reasons: vec!["scream".into()],
        }
    }

    #[tokio::test]
    async fn dispatch_sends_composed_message() {
        let channel = RecordingAlertChannel::new();
        let composer = AlertComposer::new(DEFAULT_ALERT_MESSAGE, None);

        assert!(dispatch(&composer, &channel, &request()).await);

        let sent = channel.messages();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0], "I might be in danger...\n\nLocation unavailable");
    }

    #[tokio::test]
    async fn dispatch_reports_failed_delivery() {
        let channel = RecordingAlertChannel::failing();
        let composer = AlertComposer::default();
        assert!(!dispatch(&composer, &channel, &request()).await);
    }

    #[test]
    fn default_config_message() {
        let config = AlertConfig::default();
        assert_eq!(config.message, "I might be in danger...");
        assert!(config.location.is_none());
    }
}
