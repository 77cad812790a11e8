//! Error types for the fusion crate.

use std::path::PathBuf;

use thiserror::Error;

/// Top-level error for the fusion pipeline.
#[derive(Debug, Error)]
pub enum FusionError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Classifier error
    #[error("Classifier error: {0}")]
    Classifier(#[from] ClassifierError),

    /// Alert delivery error
    #[error("Alert error: {0}")]
    Alert(#[from] AlertError),

    /// The pipeline task has stopped and no longer accepts commands.
    #[error("Pipeline channel closed")]
    ChannelClosed,
}

/// Errors raised while loading or validating [`crate::FusionConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A field has an invalid value.
    #[error("Invalid value for `{field}`: {reason}")]
    InvalidValue {
        /// Name of the field.
        field: &'static str,
        /// Human-readable reason.
        reason: String,
    },

    /// A configuration file could not be read from disk.
    #[error("Cannot read config file `{path}`: {source}")]
    FileRead {
        /// Path that was being read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A configuration file contains malformed JSON.
    #[error("Cannot parse config file `{path}`: {source}")]
    ParseError {
        /// Path that was being parsed.
        path: PathBuf,
        /// Underlying JSON parse error.
        #[source]
        source: serde_json::Error,
    },
}

impl ConfigError {
    /// Construct an [`ConfigError::InvalidValue`].
    pub fn invalid_value(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field,
            reason: reason.into(),
        }
    }
}

/// Errors from the remote fear classifier.
///
/// The engine never sees these: [`crate::classifier::classify_fail_closed`]
/// maps every variant to a `false` verdict.
#[derive(Debug, Error)]
pub enum ClassifierError {
    /// Transport-level failure.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Endpoint answered with a non-200 status.
    #[error("Classifier returned status {0}")]
    Status(u16),

    /// No answer within the configured deadline.
    #[error("Classifier timed out after {0} ms")]
    Timeout(u64),

    /// Response body did not match `{"prediction": <int>}`.
    #[error("Malformed classifier response: {0}")]
    MalformedResponse(String),

    /// The classification task panicked or was cancelled.
    #[error("Classifier task failed: {0}")]
    TaskFailed(String),
}

/// Errors from an [`crate::alerting::AlertChannel`].
#[derive(Debug, Error)]
pub enum AlertError {
    /// Refused to send an empty message.
    #[error("Alert message is empty")]
    EmptyMessage,

    /// The channel could not deliver the message.
    #[error("Delivery via `{channel}` failed: {reason}")]
    Delivery {
        /// Channel name.
        channel: String,
        /// Human-readable reason.
        reason: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_message_names_field() {
        let err = ConfigError::invalid_value("vote.window", "must be > 0");
        assert_eq!(err.to_string(), "Invalid value for `vote.window`: must be > 0");
    }

    #[test]
    fn nested_errors_convert() {
        let err: FusionError = ClassifierError::Status(503).into();
        assert!(matches!(err, FusionError::Classifier(ClassifierError::Status(503))));

        let err: FusionError = AlertError::EmptyMessage.into();
        assert!(err.to_string().contains("empty"));
    }
}
