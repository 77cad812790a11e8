use parking_lot::Mutex;

use crate::error::AlertError;

/// Outbound alert transport.
#[async_trait::async_trait]
pub trait AlertChannel: Send + Sync {
    /// Channel name
    fn name(&self) -> &str;

    /// Deliver one message.
    async fn send_alert(&self, message: &str) -> Result<(), AlertError>;
}

/// Writes alerts to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogAlertChannel;

#[async_trait::async_trait]
impl AlertChannel for LogAlertChannel {
    fn name(&self) -> &str {
        "log"
    }

    async fn send_alert(&self, message: &str) -> Result<(), AlertError> {
        if message.trim().is_empty() {
            return Err(AlertError::EmptyMessage);
        }
        tracing::warn!(message, "EMERGENCY ALERT");
        Ok(())
    }
}

/// Keeps every message it is asked to send.
#[derive(Debug, Default)]
pub struct RecordingAlertChannel {
    messages: Mutex<Vec<String>>,
    fail: bool,
}

impl RecordingAlertChannel {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A channel that records attempts but reports every one as failed.
    #[must_use]
    pub fn failing() -> Self {
        Self {
            messages: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    /// Messages received so far.
    #[must_use]
    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().clone()
    }

    #[must_use]
    pub fn count(&self) -> usize {
        self.messages.lock().len()
    }
}

#[async_trait::async_trait]
impl AlertChannel for RecordingAlertChannel {
    fn name(&self) -> &str {
        "recording"
    }

    async fn send_alert(&self, message: &str) -> Result<(), AlertError> {
        if message.trim().is_empty() {
            return Err(AlertError::EmptyMessage);
        }
        self.messages.lock().push(message.to_string());
        if self.fail {
            return Err(AlertError::Delivery {
                channel: self.name().to_string(),
                reason: "configured to fail".to_string(),
            });
        }
        Ok(())
    }
}
