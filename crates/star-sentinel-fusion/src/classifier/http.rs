//! HTTP prediction endpoint client.
//!
//! Wire format: `POST {"input": [f32; 19]}` answered by
//! `200 {"prediction": <int>}`, where `1` means fear.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use super::{ClassifierConfig, FeatureVector, FearClassifier};
use crate::error::{ClassifierError, ConfigError};

#[derive(Debug, Serialize)]
struct PredictRequest<'a> {
    input: &'a [f32],
}

#[derive(Debug, Deserialize)]
struct PredictResponse {
    prediction: i64,
}

/// Classifier backed by a JSON prediction endpoint.
#[derive(Debug, Clone)]
pub struct HttpClassifier {
    client: Client,
    url: String,
}

impl HttpClassifier {
    /// Build a client for `url` with a per-request timeout.
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, ClassifierError> {
        let client = Client::builder()
            .user_agent(concat!("star-sentinel/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }

    /// Build from configuration; `Ok(None)` when no URL is configured.
    pub fn from_config(config: &ClassifierConfig) -> Result<Option<Self>, crate::FusionError> {
        match config.url.as_deref() {
            None => Ok(None),
            Some("") => {
                Err(ConfigError::invalid_value("classifier.url", "must not be empty").into())
            }
            Some(url) => Ok(Some(Self::new(url, config.timeout())?)),
        }
    }

    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Interpret a prediction response body.
    pub(crate) fn parse_prediction(body: &str) -> Result<bool, ClassifierError> {
        let parsed: PredictResponse = serde_json::from_str(body)
            .map_err(|e| ClassifierError::MalformedResponse(e.to_string()))?;
        Ok(parsed.prediction == 1)
    }
}

#[async_trait::async_trait]
impl FearClassifier for HttpClassifier {
    fn name(&self) -> &str {
        "http"
    }

    async fn classify(&self, features: &FeatureVector) -> Result<bool, ClassifierError> {
        let response = self
            .client
            .post(&self.url)
            .json(&PredictRequest {
                input: features.as_slice(),
            })
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(ClassifierError::Status(status.as_u16()));
        }

        let body = response.text().await?;
        let fear = Self::parse_prediction(&body)?;
        tracing::debug!(url = %self.url, fear, "Classifier prediction received");
        Ok(fear)
    }
}
