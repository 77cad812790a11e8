//! Async sensor fusion pipeline.
//!
//! ```text
//!  on_heartbeat ─┐ broadcast
//!  on_heart_rate ┤──────────┐
//!                           ▼
//!  on_audio_frame ─────▶ worker task ──▶ watch<FusionStatus>
//!       broadcast        │  ▲    │
//!                        │  │    └──▶ alert dispatch (detached)
//!          classifier ◀──┘  └── mpsc<ClassifierVerdict>
//!          (spawned)
//! ```
//!
//! One worker task owns all processors and the engine, so no locks guard
//! fusion state. Sensor ingestion never blocks: when the worker falls
//! behind, the broadcast channels overwrite their oldest entries and the
//! worker logs how many it skipped.

mod clock;
mod worker;

pub use clock::{Clock, ManualClock, MonotonicClock};

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use star_sentinel_audio::{AudioFrame, AudioSnapshot};
use star_sentinel_vitals::HrvSnapshot;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;

use crate::alerting::{AlertChannel, AlertComposer, LogAlertChannel};
use crate::classifier::FearClassifier;
use crate::config::FusionConfig;
use crate::engine::{Epoch, FearPhase};
use crate::error::FusionError;
use worker::Worker;

/// Heart sensor event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeartEvent {
    /// Detected beat at a monotonic timestamp (ms).
    Beat(u64),
    /// Instantaneous heart-rate reading (BPM).
    Rate(i32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Reset,
    Shutdown,
}

/// Observable pipeline state, republished after every change.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FusionStatus {
    pub phase: FearPhase,
    pub is_fear: bool,
    pub hrv: HrvSnapshot,
    pub audio: AudioSnapshot,
    pub speaking: bool,
    pub episode_started_at_ms: Option<u64>,
    pub alerts_sent: u64,
    pub ticks_resolved: u64,
    pub verdicts_discarded: u64,
    pub epoch: Epoch,
}

/// Cloneable front end of a running pipeline.
#[derive(Debug, Clone)]
pub struct SentinelHandle {
    heart: broadcast::Sender<HeartEvent>,
    audio: broadcast::Sender<AudioFrame>,
    control: mpsc::Sender<Command>,
    status: watch::Receiver<FusionStatus>,
}

impl SentinelHandle {
    /// Report a detected heartbeat.
    pub fn on_heartbeat(&self, timestamp_ms: u64) -> Result<(), FusionError> {
        self.heart
            .send(HeartEvent::Beat(timestamp_ms))
            .map(|_| ())
            .map_err(|_| FusionError::ChannelClosed)
    }

    /// Report an instantaneous heart-rate reading.
    pub fn on_heart_rate(&self, bpm: i32) -> Result<(), FusionError> {
        self.heart
            .send(HeartEvent::Rate(bpm))
            .map(|_| ())
            .map_err(|_| FusionError::ChannelClosed)
    }

    /// Deliver a block of PCM audio.
    pub fn on_audio_frame(
        &self,
        samples: impl Into<Arc<[i16]>>,
        sample_rate: u32,
    ) -> Result<(), FusionError> {
        self.audio
            .send(AudioFrame::new(samples, sample_rate))
            .map(|_| ())
            .map_err(|_| FusionError::ChannelClosed)
    }

    /// Reset the fusion engine and the speech and beat gates. HRV and
    /// audio windows are kept. In-flight classifier verdicts are
    /// discarded when they arrive.
    pub async fn reset(&self) -> Result<(), FusionError> {
        self.control
            .send(Command::Reset)
            .await
            .map_err(|_| FusionError::ChannelClosed)
    }

    /// Stop the worker task.
    pub async fn shutdown(&self) -> Result<(), FusionError> {
        self.control
            .send(Command::Shutdown)
            .await
            .map_err(|_| FusionError::ChannelClosed)
    }

    /// Watch the pipeline status.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<FusionStatus> {
        self.status.clone()
    }

    /// Current status snapshot.
    #[must_use]
    pub fn status(&self) -> FusionStatus {
        self.status.borrow().clone()
    }
}

/// Entry point for starting a pipeline.
pub struct Sentinel;

impl Sentinel {
    /// Spawn a pipeline on the current tokio runtime with the default
    /// clock.
    pub fn spawn(
        config: FusionConfig,
        classifier: Option<Arc<dyn FearClassifier>>,
        channel: Arc<dyn AlertChannel>,
        composer: AlertComposer,
    ) -> (SentinelHandle, JoinHandle<()>) {
        Self::builder(config)
            .classifier(classifier)
            .channel(channel)
            .composer(composer)
            .spawn()
    }

    pub fn builder(config: FusionConfig) -> SentinelBuilder {
        SentinelBuilder::new(config)
    }
}

/// Builder for a [`Sentinel`] pipeline.
pub struct SentinelBuilder {
    config: FusionConfig,
    classifier: Option<Arc<dyn FearClassifier>>,
    channel: Arc<dyn AlertChannel>,
    composer: Option<AlertComposer>,
    clock: Option<Arc<dyn Clock>>,
}

impl SentinelBuilder {
    fn new(config: FusionConfig) -> Self {
        Self {
            config,
            classifier: None,
            channel: Arc::new(LogAlertChannel),
            composer: None,
            clock: None,
        }
    }

    /// Set the remote classifier
    pub fn classifier(mut self, classifier: Option<Arc<dyn FearClassifier>>) -> Self {
        self.classifier = classifier;
        self
    }

    /// Set the alert channel
    pub fn channel(mut self, channel: Arc<dyn AlertChannel>) -> Self {
        self.channel = channel;
        self
    }

    /// Set the alert composer; defaults to one built from the config
    pub fn composer(mut self, composer: AlertComposer) -> Self {
        self.composer = Some(composer);
        self
    }

    /// Set the time source
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Start the worker task.
    pub fn spawn(self) -> (SentinelHandle, JoinHandle<()>) {
        let pipeline = &self.config.pipeline;
        let ingest = pipeline.ingest_capacity.max(1);
        let (heart_tx, heart_rx) = broadcast::channel(ingest);
        let (audio_tx, audio_rx) = broadcast::channel(ingest);
        let (control_tx, control_rx) = mpsc::channel(pipeline.control_capacity.max(1));
        let (verdict_tx, verdict_rx) = mpsc::channel(pipeline.verdict_capacity.max(1));
        let (status_tx, status_rx) = watch::channel(FusionStatus::default());

        let composer = self
            .composer
            .unwrap_or_else(|| AlertComposer::from_config(&self.config.alert));
        let clock = self
            .clock
            .unwrap_or_else(|| Arc::new(MonotonicClock::new()));

        tracing::info!(
            fusion_interval_ms = self.config.pipeline.fusion_interval_ms,
            classifier = ?self.classifier.as_ref().map(|c| c.name()),
            channel = %self.channel.name(),
            "Starting fusion pipeline"
        );

        let worker = Worker::new(
            self.config,
            clock,
            self.classifier,
            self.channel,
            composer,
            verdict_tx,
            status_tx,
        );
        let task = tokio::spawn(worker.run(heart_rx, audio_rx, verdict_rx, control_rx));

        let handle = SentinelHandle {
            heart: heart_tx,
            audio: audio_tx,
            control: control_tx,
            status: status_rx,
        };
        (handle, task)
    }
}
