//! `simulate`: drive the engine through a synthetic scenario.
//!
//! The scenario is calm for the first third, then the heart rate jumps,
//! then a scream runs from the midpoint to two thirds of the way in.
//! Ticks run synchronously on recording time so the output is
//! reproducible.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{ensure, Result};
use clap::Args;
use colored::Colorize;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use star_sentinel_audio::{AudioFeatureExtractor, SpeechGate};
use star_sentinel_fusion::alerting::{self, AlertRequest};
use star_sentinel_fusion::{
    classify_fail_closed, AlertComposer, FearClassifier, FearFusionEngine, FearPhase,
    FusionConfig, HttpClassifier, RecordingAlertChannel, TickInput,
};
use star_sentinel_vitals::{HrvProcessor, RateBeatGate};

use crate::replay::{write_replay, ReplayEvent};

const SAMPLE_RATE: u32 = 16_000;
const FRAME_MS: u64 = 100;
const FRAME_SAMPLES: usize = 1_600;
const CALM_RR_MS: u64 = 857;
const SURGE_RR_MS: u64 = 500;
const RECOVERY_RR_MS: u64 = 750;
const RR_JITTER_MS: [i64; 6] = [0, 12, -8, 5, -10, 7];

/// Longest scenario `simulate` will generate (one day).
pub const MAX_SECONDS: u64 = 86_400;

/// Arguments for the simulate command
#[derive(Args, Debug)]
pub struct SimulateArgs {
    /// Configuration file (JSON)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Scenario length in seconds
    #[arg(short, long, default_value = "60")]
    pub seconds: u64,

    /// Remote classifier endpoint, overrides the config file
    #[arg(long)]
    pub classifier_url: Option<String>,

    /// Save the generated scenario as a replay file
    #[arg(long)]
    pub write_replay: Option<PathBuf>,

    /// Only print alerts and the summary
    #[arg(short, long)]
    pub quiet: bool,

    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,
}

/// One resolved tick, as displayed.
#[derive(Debug, Clone, Tabled, Serialize)]
pub struct TickRow {
    #[tabled(rename = "t (ms)")]
    pub t_ms: u64,
    #[tabled(rename = "HR")]
    pub heart_rate_bpm: i32,
    #[tabled(rename = "Pitch (Hz)")]
    pub pitch: String,
    #[tabled(rename = "Var (dB)")]
    pub intensity: String,
    #[tabled(rename = "Rules")]
    pub rules: String,
    #[tabled(rename = "Model")]
    pub classifier: bool,
    #[tabled(rename = "Fused")]
    pub fused: bool,
    #[tabled(rename = "Fear")]
    pub is_fear: bool,
    #[tabled(rename = "Phase")]
    pub phase: String,
}

/// Everything a simulation run produced.
#[derive(Debug, Clone, Serialize)]
pub struct SimulationReport {
    pub ticks: Vec<TickRow>,
    pub skipped_ticks: u64,
    pub alerts: Vec<AlertRequest>,
    /// Alerts the channel accepted.
    pub delivered: usize,
    pub messages: Vec<String>,
    pub final_phase: FearPhase,
}

/// Time span of each scenario phase (ms).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Phases {
    pub total_ms: u64,
    pub surge_from_ms: u64,
    pub scream_from_ms: u64,
    pub scream_to_ms: u64,
}

impl Phases {
    pub fn new(seconds: u64) -> Self {
        let total_ms = seconds.saturating_mul(1000);
        Self {
            total_ms,
            surge_from_ms: total_ms / 3,
            scream_from_ms: total_ms / 2,
            scream_to_ms: total_ms / 3 * 2,
        }
    }
}

fn square_wave(amplitude: i16, half_period: usize) -> Vec<i16> {
    (0..FRAME_SAMPLES)
        .map(|i| if (i / half_period) % 2 == 0 { amplitude } else { -amplitude })
        .collect()
}

/// Generate the calm, surge and scream scenario as sensor events.
pub fn scenario(seconds: u64) -> Vec<ReplayEvent> {
    let phases = Phases::new(seconds);
    let mut events = Vec::new();

    let mut t = 0_u64;
    let mut beat = 0_usize;
    while t <= phases.total_ms {
        events.push(ReplayEvent::Beat { t_ms: t });
        let rr = if t < phases.surge_from_ms {
            CALM_RR_MS.saturating_add_signed(RR_JITTER_MS[beat % RR_JITTER_MS.len()])
        } else if t < phases.scream_to_ms + 5_000 {
            SURGE_RR_MS
        } else {
            RECOVERY_RR_MS
        };
        t += rr;
        beat += 1;
    }

    // ~150 Hz murmur, and a ~345 Hz scream whose loudness alternates
    // frame by frame so the intensity variance stays high.
    let calm = square_wave(500, 53);
    let quiet_scream = square_wave(2_000, 23);
    let loud_scream = square_wave(12_000, 23);
    for frame in 0..=phases.total_ms / FRAME_MS {
        let t_ms = frame * FRAME_MS;
        let samples = if (phases.scream_from_ms..phases.scream_to_ms).contains(&t_ms) {
            if frame % 2 == 0 {
                loud_scream.clone()
            } else {
                quiet_scream.clone()
            }
        } else {
            calm.clone()
        };
        events.push(ReplayEvent::Audio {
            t_ms,
            sample_rate: SAMPLE_RATE,
            samples,
        });
    }

    events.sort_by_key(ReplayEvent::t_ms);
    events
}

struct Sensors {
    hrv: HrvProcessor,
    extractor: AudioFeatureExtractor,
    speech: Option<SpeechGate>,
    beat_gate: Option<RateBeatGate>,
}

impl Sensors {
    fn new(config: &FusionConfig) -> Self {
        Self {
            hrv: HrvProcessor::new(config.hrv.clone()),
            extractor: AudioFeatureExtractor::new(config.audio.clone()),
            speech: config.audio.speech_gate.map(SpeechGate::new),
            beat_gate: config
                .pipeline
                .derive_beats_from_rate
                .then(|| RateBeatGate::new(config.pipeline.beat_gate.clone())),
        }
    }

    fn apply(&mut self, event: &ReplayEvent) {
        match event {
            ReplayEvent::Beat { t_ms } => {
                self.hrv.process_beat(*t_ms);
            }
            ReplayEvent::Rate { t_ms, bpm } => {
                self.hrv.process_heart_rate(*bpm);
                if let Some(beat) = self.beat_gate.as_mut().and_then(|g| g.offer(*bpm, *t_ms)) {
                    self.hrv.process_beat(beat);
                }
            }
            ReplayEvent::Audio {
                t_ms,
                sample_rate,
                samples,
            } => {
                let passes = self
                    .speech
                    .as_mut()
                    .map_or(true, |gate| gate.observe(samples, *t_ms));
                if passes {
                    self.extractor.process_buffer(samples, *sample_rate);
                }
            }
        }
    }

    fn input(&self) -> TickInput {
        TickInput {
            hrv: self.hrv.snapshot(),
            audio: self.extractor.snapshot(),
        }
    }
}

/// Run `events` through the engine on recording time.
///
/// A tick fires every `fusion_interval_ms` after applying all events up
/// to and including that instant.
pub async fn simulate(
    config: &FusionConfig,
    events: &[ReplayEvent],
    classifier: Option<Arc<dyn FearClassifier>>,
) -> Result<SimulationReport> {
    config.validate()?;

    let interval = config.pipeline.fusion_interval_ms.max(1);
    let end_ms = events.iter().map(ReplayEvent::t_ms).max().unwrap_or(0);
    let timeout = config.classifier.timeout();

    let mut sensors = Sensors::new(config);
    let mut engine = FearFusionEngine::new(config);
    let composer = AlertComposer::from_config(&config.alert);
    let channel = RecordingAlertChannel::new();

    let mut ticks = Vec::new();
    let mut alerts = Vec::new();
    let mut skipped_ticks = 0;
    let mut delivered = 0;
    let mut pending_events = events.iter().peekable();

    for tick in 1..=(end_ms / interval).saturating_add(1) {
        let now = tick.saturating_mul(interval);
        while let Some(event) = pending_events.next_if(|e| e.t_ms() <= now) {
            sensors.apply(event);
        }

        let input = sensors.input();
        let Some(pending) = engine.begin_tick(&input, now) else {
            skipped_ticks += 1;
            continue;
        };
        let fear = match &classifier {
            Some(c) => classify_fail_closed(Arc::clone(c), pending.features, timeout).await,
            None => false,
        };
        if let Some(outcome) = engine.resolve_tick(pending.verdict(fear), now) {
            let reasons = outcome.rules.reasons();
            ticks.push(TickRow {
                t_ms: now,
                heart_rate_bpm: input.hrv.heart_rate_bpm,
                pitch: format!("{:.0}", input.audio.pitch_hz),
                intensity: format!("{:.1}", input.audio.intensity_variance_db),
                rules: if reasons.is_empty() {
                    "-".to_string()
                } else {
                    reasons.join(",")
                },
                classifier: outcome.classifier,
                fused: outcome.fused,
                is_fear: outcome.is_fear,
                phase: format!("{:?}", outcome.phase),
            });
            if let Some(request) = outcome.alert {
                if alerting::dispatch(&composer, &channel, &request).await {
                    delivered += 1;
                }
                alerts.push(request);
            }
        }
    }

    Ok(SimulationReport {
        ticks,
        skipped_ticks,
        alerts,
        delivered,
        messages: channel.messages(),
        final_phase: engine.state().phase,
    })
}

/// Execute the simulate command
pub async fn execute(args: SimulateArgs) -> Result<()> {
    ensure!(
        (10..=MAX_SECONDS).contains(&args.seconds),
        "--seconds must be between 10 and {MAX_SECONDS} (got {})",
        args.seconds
    );

    let mut config = crate::load_config(args.config.as_deref())?;
    if let Some(url) = &args.classifier_url {
        config.classifier.url = Some(url.clone());
    }
    let classifier = HttpClassifier::from_config(&config.classifier)?
        .map(|c| Arc::new(c) as Arc<dyn FearClassifier>);

    let events = scenario(args.seconds);
    if let Some(path) = &args.write_replay {
        write_replay(path, &events)?;
        tracing::info!(events = events.len(), path = %path.display(), "Scenario written");
    }

    let report = simulate(&config, &events, classifier).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    let phases = Phases::new(args.seconds);
    println!(
        "{} {} s scenario: surge at {} ms, scream {}..{} ms",
        "[SIMULATE]".bright_cyan().bold(),
        args.seconds,
        phases.surge_from_ms,
        phases.scream_from_ms,
        phases.scream_to_ms
    );

    if !args.quiet && !report.ticks.is_empty() {
        let table = Table::new(&report.ticks).with(Style::rounded()).to_string();
        println!("{}", table);
    }

    for (request, message) in report.alerts.iter().zip(&report.messages) {
        println!(
            "{} at {} ms ({})",
            "[ALERT]".red().bold(),
            request.episode_started_at_ms,
            request.reasons.join(", ")
        );
        for line in message.lines() {
            println!("  {}", line.yellow());
        }
    }

    println!();
    println!("{}", "Summary:".bold());
    println!("  {} {}", "Ticks resolved:".dimmed(), report.ticks.len());
    println!("  {} {}", "Ticks skipped:".dimmed(), report.skipped_ticks);
    println!(
        "  {} {} ({} delivered)",
        "Alerts:".dimmed(),
        report.alerts.len(),
        report.delivered
    );
    println!("  {} {:?}", "Final phase:".dimmed(), report.final_phase);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scenario_is_ordered_and_complete() {
        let events = scenario(30);
        assert!(events.windows(2).all(|w| w[0].t_ms() <= w[1].t_ms()));
        let frames = events
            .iter()
            .filter(|e| matches!(e, ReplayEvent::Audio { .. }))
            .count();
        assert_eq!(frames, 301);
        assert!(events.iter().any(|e| matches!(e, ReplayEvent::Beat { .. })));
    }

    #[test]
    fn huge_duration_does_not_overflow() {
        let phases = Phases::new(u64::MAX);
        assert_eq!(phases.total_ms, u64::MAX);
        assert!(phases.surge_from_ms < phases.scream_from_ms);
        assert!(phases.scream_from_ms < phases.scream_to_ms);
        assert_eq!(Phases::new(60).scream_to_ms, 40_000);
    }

    #[tokio::test]
    async fn out_of_range_duration_is_rejected() {
        for seconds in [0, 9, MAX_SECONDS + 1, u64::MAX] {
            let args = SimulateArgs {
                config: None,
                seconds,
                classifier_url: None,
                write_replay: None,
                quiet: true,
                json: false,
            };
            let err = execute(args).await.unwrap_err();
            assert!(err.to_string().contains("--seconds"), "{err}");
        }
    }

    #[tokio::test]
    async fn scream_opens_one_episode() {
        let phases = Phases::new(60);
        let report = simulate(&FusionConfig::default(), &scenario(60), None)
            .await
            .unwrap();

        assert_eq!(report.alerts.len(), 1);
        let alert = &report.alerts[0];
        assert!(alert.episode_started_at_ms >= phases.scream_from_ms);
        assert!(alert.episode_started_at_ms < phases.scream_to_ms);
        assert!(alert.reasons.iter().any(|r| r == "scream"));
        assert_eq!(report.delivered, 1);
        assert_eq!(report.messages.len(), 1);
        assert!(report.messages[0].starts_with("I might be in danger..."));
    }

    #[tokio::test]
    async fn surge_alone_is_debounced() {
        let beats: Vec<_> = scenario(60)
            .into_iter()
            .filter(|e| matches!(e, ReplayEvent::Beat { .. }))
            .collect();
        let report = simulate(&FusionConfig::default(), &beats, None).await.unwrap();

        let surges = report
            .ticks
            .iter()
            .filter(|row| row.rules.contains("heart_rate_surge"))
            .count();
        assert_eq!(surges, 1);
        assert!(report.alerts.is_empty());
        assert_eq!(report.final_phase, FearPhase::Idle);
    }

    #[tokio::test]
    async fn classifier_votes_are_fused() {
        let events: Vec<_> = scenario(20)
            .into_iter()
            .filter(|e| matches!(e, ReplayEvent::Beat { .. }))
            .collect();
        let always: Arc<dyn FearClassifier> =
            Arc::new(star_sentinel_fusion::StaticClassifier(true));
        let report = simulate(&FusionConfig::default(), &events, Some(always))
            .await
            .unwrap();

        assert_eq!(report.alerts.len(), 1);
        assert!(report.alerts[0].reasons.iter().any(|r| r == "classifier"));
    }
}
