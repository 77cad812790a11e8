use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::{AlertConfig, DEFAULT_ALERT_MESSAGE};

/// A resolved position.
#[derive(Debug, Clone, PartialEq)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
    pub address: Option<String>,
}

impl Location {
    /// Map link for sharing.
    #[must_use]
    pub fn maps_url(&self) -> String {
        format!(
            "https://www.google.com/maps?q={},{}",
            self.latitude, self.longitude
        )
    }

    /// Text block appended to alerts.
    #[must_use]
    pub fn describe(&self) -> String {
        let address = self
            .address
            .as_deref()
            .filter(|a| !a.is_empty())
            .unwrap_or("Address unavailable");
        format!("My current location: {address}\n{}", self.maps_url())
    }
}

/// Source of the user's current location.
#[async_trait::async_trait]
pub trait LocationProvider: Send + Sync {
    async fn current_location(&self) -> Option<Location>;
}

/// Fixed location from configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StaticLocation {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub address: Option<String>,
}

#[async_trait::async_trait]
impl LocationProvider for StaticLocation {
    async fn current_location(&self) -> Option<Location> {
        Some(Location {
            latitude: self.latitude,
            longitude: self.longitude,
            address: self.address.clone(),
        })
    }
}

/// Builds the outgoing alert text: `"{message}\n\n{location}"`.
#[derive(Clone)]
pub struct AlertComposer {
    message: String,
    location: Option<Arc<dyn LocationProvider>>,
}

impl std::fmt::Debug for AlertComposer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AlertComposer")
            .field("message", &self.message)
            .field("has_location", &self.location.is_some())
            .finish()
    }
}

impl AlertComposer {
    pub fn new(message: impl Into<String>, location: Option<Arc<dyn LocationProvider>>) -> Self {
        let message = message.into();
        let message = if message.trim().is_empty() {
            DEFAULT_ALERT_MESSAGE.to_string()
        } else {
            message
        };
        Self { message, location }
    }

    #[must_use]
    pub fn from_config(config: &AlertConfig) -> Self {
        let location = config
            .location
            .clone()
            .map(|l| Arc::new(l) as Arc<dyn LocationProvider>);
        Self::new(config.message.clone(), location)
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Render the alert text with the current location.
    pub async fn compose(&self) -> String {
        let location = match &self.location {
            Some(provider) => provider.current_location().await,
            None => None,
        };
        let location_info = location.map_or_else(
            || "Location unavailable".to_string(),
            |l| l.describe(),
        );
        format!("{}\n\n{}", self.message, location_info)
    }
}

impl Default for AlertComposer {
    fn default() -> Self {
        Self::new(DEFAULT_ALERT_MESSAGE, None)
    }
}
