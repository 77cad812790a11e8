//! The single task that owns every processor and the engine.

use std::sync::Arc;
use std::time::Duration;

use star_sentinel_audio::{AudioFeatureExtractor, AudioFrame, SpeechGate};
use star_sentinel_vitals::{HrvProcessor, RateBeatGate};
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::time::MissedTickBehavior;

use super::{Clock, Command, FusionStatus, HeartEvent};
use crate::alerting::{self, AlertChannel, AlertComposer, AlertRequest};
use crate::classifier::{self, FearClassifier};
use crate::config::FusionConfig;
use crate::engine::{ClassifierVerdict, FearFusionEngine, FearPhase, TickInput};

pub(super) struct Worker {
    clock: Arc<dyn Clock>,
    hrv: HrvProcessor,
    extractor: AudioFeatureExtractor,
    speech: Option<SpeechGate>,
    beat_gate: Option<RateBeatGate>,
    engine: FearFusionEngine,
    classifier: Option<Arc<dyn FearClassifier>>,
    classifier_timeout: Duration,
    channel: Arc<dyn AlertChannel>,
    composer: AlertComposer,
    fusion_interval: Duration,
    verdict_tx: mpsc::Sender<ClassifierVerdict>,
    status_tx: watch::Sender<FusionStatus>,
    alerts_sent: u64,
    ticks_resolved: u64,
    verdicts_discarded: u64,
}

impl Worker {
    pub(super) fn new(
        config: FusionConfig,
        clock: Arc<dyn Clock>,
        classifier: Option<Arc<dyn FearClassifier>>,
        channel: Arc<dyn AlertChannel>,
        composer: AlertComposer,
        verdict_tx: mpsc::Sender<ClassifierVerdict>,
        status_tx: watch::Sender<FusionStatus>,
    ) -> Self {
        let speech = config.audio.speech_gate.map(SpeechGate::new);
        let beat_gate = config
            .pipeline
            .derive_beats_from_rate
            .then(|| RateBeatGate::new(config.pipeline.beat_gate.clone()));
        Self {
            clock,
            hrv: HrvProcessor::new(config.hrv.clone()),
            extractor: AudioFeatureExtractor::new(config.audio.clone()),
            speech,
            beat_gate,
            engine: FearFusionEngine::new(&config),
            classifier,
            classifier_timeout: config.classifier.timeout(),
            channel,
            composer,
            fusion_interval: Duration::from_millis(config.pipeline.fusion_interval_ms.max(1)),
            verdict_tx,
            status_tx,
            alerts_sent: 0,
            ticks_resolved: 0,
            verdicts_discarded: 0,
        }
    }

    pub(super) async fn run(
        mut self,
        mut heart_rx: broadcast::Receiver<HeartEvent>,
        mut audio_rx: broadcast::Receiver<AudioFrame>,
        mut verdict_rx: mpsc::Receiver<ClassifierVerdict>,
        mut control_rx: mpsc::Receiver<Command>,
    ) {
        let mut ticker = tokio::time::interval(self.fusion_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut heart_open = true;
        let mut audio_open = true;

        loop {
            tokio::select! {
                biased;

                cmd = control_rx.recv() => match cmd {
                    Some(Command::Reset) => self.reset(),
                    Some(Command::Shutdown) => {
                        tracing::info!("Fusion pipeline shutdown requested");
                        break;
                    }
                    None => {
                        tracing::debug!("All handles dropped, stopping fusion pipeline");
                        break;
                    }
                },
                Some(verdict) = verdict_rx.recv() => self.resolve(verdict),
                event = heart_rx.recv(), if heart_open => match event {
                    Ok(event) => self.on_heart(event),
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, stream = "heart", "Ingest lagging, oldest events dropped");
                    }
                    Err(RecvError::Closed) => heart_open = false,
                },
                frame = audio_rx.recv(), if audio_open => match frame {
                    Ok(frame) => self.on_audio(&frame),
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, stream = "audio", "Ingest lagging, oldest frames dropped");
                    }
                    Err(RecvError::Closed) => audio_open = false,
                },
                _ = ticker.tick() => self.on_tick(),
            }
        }
    }

    fn on_heart(&mut self, event: HeartEvent) {
        match event {
            HeartEvent::Beat(ts) => {
                self.hrv.process_beat(ts);
            }
            HeartEvent::Rate(bpm) => {
                self.hrv.process_heart_rate(bpm);
                let now = self.clock.now_ms();
                if let Some(beat) = self.beat_gate.as_mut().and_then(|g| g.offer(bpm, now)) {
                    self.hrv.process_beat(beat);
                }
            }
        }
        self.publish();
    }

    fn on_audio(&mut self, frame: &AudioFrame) {
        if let Some(gate) = self.speech.as_mut() {
            let now = self.clock.now_ms();
            if !gate.observe(&frame.samples, now) {
                self.publish();
                return;
            }
        }
        self.extractor.process_buffer(&frame.samples, frame.sample_rate);
        self.publish();
    }

    fn on_tick(&mut self) {
        let now = self.clock.now_ms();
        let input = TickInput {
            hrv: self.hrv.snapshot(),
            audio: self.extractor.snapshot(),
        };
        let Some(pending) = self.engine.begin_tick(&input, now) else {
            return;
        };

        match &self.classifier {
            Some(classifier) => {
                let classifier = Arc::clone(classifier);
                let tx = self.verdict_tx.clone();
                let timeout = self.classifier_timeout;
                tokio::spawn(async move {
                    let fear =
                        classifier::classify_fail_closed(classifier, pending.features, timeout)
                            .await;
                    if tx.send(pending.verdict(fear)).await.is_err() {
                        tracing::debug!(tick = %pending.tick, "Pipeline gone, verdict dropped");
                    }
                });
            }
            None => self.resolve(pending.verdict(false)),
        }
    }

    fn resolve(&mut self, verdict: ClassifierVerdict) {
        let now = self.clock.now_ms();
        let Some(outcome) = self.engine.resolve_tick(verdict, now) else {
            self.verdicts_discarded += 1;
            self.publish();
            return;
        };
        self.ticks_resolved += 1;
        tracing::debug!(
            tick = %outcome.tick,
            fused = outcome.fused,
            is_fear = outcome.is_fear,
            classifier = outcome.classifier,
            rules = ?outcome.rules,
            "Tick resolved"
        );
        if let Some(request) = outcome.alert {
            self.alerts_sent += 1;
            self.dispatch(request);
        }
        self.publish();
    }

    fn dispatch(&self, request: AlertRequest) {
        let channel = Arc::clone(&self.channel);
        let composer = self.composer.clone();
        tokio::spawn(async move {
            alerting::dispatch(&composer, channel.as_ref(), &request).await;
        });
    }

    fn reset(&mut self) {
        self.engine.reset();
        if let Some(gate) = self.speech.as_mut() {
            gate.reset();
        }
        if let Some(gate) = self.beat_gate.as_mut() {
            gate.reset();
        }
        self.publish();
    }

    fn publish(&self) {
        let state = self.engine.state();
        let status = FusionStatus {
            phase: state.phase,
            is_fear: self.engine.is_fear(),
            hrv: self.hrv.snapshot(),
            audio: self.extractor.snapshot(),
            speaking: self.speech.as_ref().is_some_and(SpeechGate::is_speech),
            episode_started_at_ms: (state.phase == FearPhase::Alerting)
                .then_some(state.episode_started_at_ms),
            alerts_sent: self.alerts_sent,
            ticks_resolved: self.ticks_resolved,
            verdicts_discarded: self.verdicts_discarded,
            epoch: self.engine.epoch(),
        };
        self.status_tx.send_if_modified(|current| {
            if *current == status {
                false
            } else {
                *current = status;
                true
            }
        });
    }
}
