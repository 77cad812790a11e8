//! `run`: replay a recorded session through the live pipeline.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{ensure, Context, Result};
use clap::Args;
use colored::Colorize;
use tokio::time::Instant;

use star_sentinel_fusion::{
    AlertComposer, Clock, FearClassifier, FusionConfig, FusionStatus, HttpClassifier,
    LogAlertChannel, Sentinel, StaticLocation,
};

use crate::replay::{read_replay, ReplayEvent};

/// Slowest accepted playback speed.
pub const MIN_SPEED: f64 = 0.01;
/// Fastest accepted playback speed.
pub const MAX_SPEED: f64 = 100.0;

/// Arguments for the run command
#[derive(Args, Debug)]
pub struct RunArgs {
    /// JSON-lines sensor log to replay
    #[arg(short, long)]
    pub replay: PathBuf,

    /// Configuration file (JSON)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Remote classifier endpoint, overrides the config file
    #[arg(long)]
    pub classifier_url: Option<String>,

    /// Playback speed multiplier
    #[arg(short, long, default_value = "1.0")]
    pub speed: f64,

    /// Alert message, overrides the config file
    #[arg(short, long)]
    pub message: Option<String>,

    /// Latitude for the alert location
    #[arg(long, requires = "lng", allow_negative_numbers = true)]
    pub lat: Option<f64>,

    /// Longitude for the alert location
    #[arg(long, requires = "lat", allow_negative_numbers = true)]
    pub lng: Option<f64>,

    /// Street address for the alert location
    #[arg(long)]
    pub address: Option<String>,
}

/// Recording-time clock: wall time since start, scaled by the playback
/// speed and offset to the first event.
#[derive(Debug)]
pub struct ReplayClock {
    origin: Instant,
    offset_ms: u64,
    speed: f64,
}

impl ReplayClock {
    pub fn new(offset_ms: u64, speed: f64) -> Self {
        Self {
            origin: Instant::now(),
            offset_ms,
            speed,
        }
    }
}

impl Clock for ReplayClock {
    fn now_ms(&self) -> u64 {
        let elapsed = self.origin.elapsed().as_secs_f64() * 1000.0 * self.speed;
        self.offset_ms.saturating_add(elapsed as u64)
    }
}

/// Apply command-line overrides on top of the loaded configuration.
pub fn apply_overrides(mut config: FusionConfig, args: &RunArgs) -> FusionConfig {
    if let Some(url) = &args.classifier_url {
        config.classifier.url = Some(url.clone());
    }
    if let Some(message) = &args.message {
        config.alert.message = message.clone();
    }
    if let (Some(latitude), Some(longitude)) = (args.lat, args.lng) {
        config.alert.location = Some(StaticLocation {
            latitude,
            longitude,
            address: args.address.clone(),
        });
    }
    if (MIN_SPEED..=MAX_SPEED).contains(&args.speed) {
        let scaled = (config.pipeline.fusion_interval_ms as f64 / args.speed).round() as u64;
        config.pipeline.fusion_interval_ms = scaled.max(1);
    }
    config
}

/// Wall-clock delay of an event `delta_ms` after the first one.
pub fn playback_offset(delta_ms: u64, speed: f64) -> Duration {
    Duration::from_millis((delta_ms as f64 / speed) as u64)
}

/// Execute the run command
pub async fn execute(args: RunArgs) -> Result<()> {
    ensure!(
        (MIN_SPEED..=MAX_SPEED).contains(&args.speed),
        "--speed must be between {MIN_SPEED} and {MAX_SPEED} (got {})",
        args.speed
    );

    let config = apply_overrides(crate::load_config(args.config.as_deref())?, &args);
    config.validate()?;

    let events = read_replay(&args.replay)?;
    ensure!(!events.is_empty(), "{} contains no events", args.replay.display());
    let first_ms = events.first().map_or(0, ReplayEvent::t_ms);
    let last_ms = events.last().map_or(0, ReplayEvent::t_ms);

    tracing::info!(
        events = events.len(),
        recorded_secs = (last_ms - first_ms) as f64 / 1000.0,
        speed = args.speed,
        replay = %args.replay.display(),
        "Replaying sensor log"
    );

    let classifier = HttpClassifier::from_config(&config.classifier)?
        .map(|c| Arc::new(c) as Arc<dyn FearClassifier>);
    if classifier.is_none() {
        tracing::info!("No classifier configured, rules only");
    }

    let interval_ms = config.pipeline.fusion_interval_ms;
    let composer = AlertComposer::from_config(&config.alert);
    let (handle, task) = Sentinel::builder(config)
        .classifier(classifier)
        .channel(Arc::new(LogAlertChannel))
        .composer(composer)
        .clock(Arc::new(ReplayClock::new(first_ms, args.speed)))
        .spawn();

    let start = Instant::now();
    for event in &events {
        let deadline = start
            .checked_add(playback_offset(event.t_ms() - first_ms, args.speed))
            .context("replay timestamps out of range")?;
        tokio::time::sleep_until(deadline).await;
        event.deliver(&handle)?;
    }

    // Let the last ticks and classifier calls settle.
    tokio::time::sleep(Duration::from_millis(interval_ms.saturating_mul(2))).await;
    tracing::info!(events = events.len(), "Replay finished");

    let status = handle.status();
    handle.shutdown().await?;
    task.await?;

    print_summary(&status);
    Ok(())
}

pub(crate) fn print_summary(status: &FusionStatus) {
    println!();
    println!("{}", "Final status:".bold());
    println!("  {} {:?}", "Phase:".dimmed(), status.phase);
    println!(
        "  {} {}",
        "Fear:".dimmed(),
        if status.is_fear {
            "yes".red().bold().to_string()
        } else {
            "no".green().to_string()
        }
    );
    println!(
        "  {} {} bpm, mean RR {:.0} ms, SDNN {:.1} ms, RMSSD {:.1} ms",
        "Heart:".dimmed(),
        status.hrv.heart_rate_bpm,
        status.hrv.mean_rr_ms,
        status.hrv.sdnn_ms,
        status.hrv.rmssd_ms
    );
    println!(
        "  {} pitch {:.0} Hz, intensity variance {:.1} dB",
        "Audio:".dimmed(),
        status.audio.pitch_hz,
        status.audio.intensity_variance_db
    );
    println!("  {} {}", "Ticks:".dimmed(), status.ticks_resolved);
    println!("  {} {}", "Alerts:".dimmed(), status.alerts_sent);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args() -> RunArgs {
        RunArgs {
            replay: PathBuf::from("session.jsonl"),
            config: None,
            classifier_url: Some("http://localhost:8000/predict".into()),
            speed: 4.0,
            message: Some("Need help".into()),
            lat: Some(48.85),
            lng: Some(2.35),
            address: None,
        }
    }

    #[test]
    fn overrides_reach_config() {
        let config = apply_overrides(FusionConfig::default(), &args());
        assert_eq!(
            config.classifier.url.as_deref(),
            Some("http://localhost:8000/predict")
        );
        assert_eq!(config.alert.message, "Need help");
        assert!(config.alert.location.is_some());
        assert_eq!(config.pipeline.fusion_interval_ms, 250);
    }

    #[test]
    fn slowest_speed_keeps_interval_finite() {
        let mut slow = args();
        slow.speed = MIN_SPEED;
        let config = apply_overrides(FusionConfig::default(), &slow);
        assert_eq!(config.pipeline.fusion_interval_ms, 100_000);
        assert_eq!(playback_offset(1_000, MIN_SPEED), Duration::from_secs(100));
    }

    #[tokio::test]
    async fn out_of_range_speed_is_rejected() {
        for speed in [1e-300, 0.0, -1.0, 1e6] {
            let mut bad = args();
            bad.speed = speed;
            let err = execute(bad).await.unwrap_err();
            assert!(err.to_string().contains("--speed"), "{err}");
        }
    }

    #[tokio::test(start_paused = true)]
    async fn replays_a_recorded_log() {
        let path = std::env::temp_dir().join(format!("star-sentinel-run-{}.jsonl", std::process::id()));
        let events: Vec<ReplayEvent> = (0..20)
            .map(|i| ReplayEvent::Beat { t_ms: i * 800 })
            .chain([ReplayEvent::Rate { t_ms: 16_000, bpm: 75 }])
            .collect();
        crate::replay::write_replay(&path, &events).unwrap();

        let mut run = args();
        run.replay = path.clone();
        run.classifier_url = None;
        let result = execute(run).await;
        let _ = std::fs::remove_file(&path);
        result.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn replay_clock_scales_time() {
        let clock = ReplayClock::new(1_000, 2.0);
        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(clock.now_ms(), 2_000);
    }
}
