use std::collections::VecDeque;
use std::fmt;

use serde::{Deserialize, Serialize};
use star_sentinel_audio::AudioSnapshot;
use star_sentinel_vitals::HrvSnapshot;

use super::state::{FearPhase, FearState, Transition};
use super::votes::VoteBuffer;
use crate::alerting::AlertRequest;
use crate::classifier::FeatureVector;
use crate::config::FusionConfig;
use crate::detection::{RuleSet, RuleVerdicts};

/// Identifier of one fusion tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TickId(pub u64);

impl fmt::Display for TickId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tick-{}", self.0)
    }
}

/// Reset generation. Bumped by [`FearFusionEngine::reset`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Epoch(pub u64);

impl fmt::Display for Epoch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "epoch-{}", self.0)
    }
}

/// Latest sensor state for one tick.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TickInput {
    pub hrv: HrvSnapshot,
    pub audio: AudioSnapshot,
}

/// A tick waiting for its classifier verdict.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingTick {
    pub tick: TickId,
    pub epoch: Epoch,
    pub features: FeatureVector,
    pub rules: RuleVerdicts,
}

impl PendingTick {
    /// Wrap a classifier answer for this tick.
    #[must_use]
    pub fn verdict(&self, fear: bool) -> ClassifierVerdict {
        ClassifierVerdict {
            tick: self.tick,
            epoch: self.epoch,
            fear,
        }
    }
}

/// Classifier answer tagged with the tick that asked for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassifierVerdict {
    pub tick: TickId,
    pub epoch: Epoch,
    pub fear: bool,
}

/// Result of a resolved tick.
#[derive(Debug, Clone, PartialEq)]
pub struct TickOutcome {
    pub tick: TickId,
    pub rules: RuleVerdicts,
    pub classifier: bool,
    /// Classifier OR any rule.
    pub fused: bool,
    /// Majority over the vote window after this tick.
    pub is_fear: bool,
    pub phase: FearPhase,
    pub transition: Option<Transition>,
    /// Present exactly on the tick that opens an episode.
    pub alert: Option<AlertRequest>,
}

#[derive(Debug, Clone)]
struct InFlight {
    tick: TickId,
    rules: RuleVerdicts,
    input: TickInput,
}

/// Fuses rule and classifier verdicts into a debounced fear signal.
///
/// Single-owner and synchronous. The async pipeline keeps one instance
/// on its consumer task.
#[derive(Debug)]
pub struct FearFusionEngine {
    rules: RuleSet,
    votes: VoteBuffer,
    state: FearState,
    episode_timeout_ms: u64,
    epoch: Epoch,
    next_tick: u64,
    in_flight: VecDeque<InFlight>,
    max_in_flight: usize,
    is_fear: bool,
}

impl FearFusionEngine {
    #[must_use]
    pub fn new(config: &FusionConfig) -> Self {
        Self {
            rules: RuleSet::new(&config.detector),
            votes: VoteBuffer::new(config.vote.window),
            state: FearState::default(),
            episode_timeout_ms: config.episode.timeout_ms,
            epoch: Epoch::default(),
            next_tick: 0,
            in_flight: VecDeque::new(),
            max_in_flight: config.pipeline.max_in_flight.max(1),
            is_fear: false,
        }
    }

    /// Start a tick: guard, run the rules and build the classifier input.
    ///
    /// Returns `None` when the heart data is not usable yet or the input
    /// contains non-finite values.
    pub fn begin_tick(&mut self, input: &TickInput, now_ms: u64) -> Option<PendingTick> {
        if input.hrv.heart_rate_bpm <= 0 || input.hrv.mean_rr_ms <= 0.0 {
            tracing::trace!(
                heart_rate_bpm = input.hrv.heart_rate_bpm,
                mean_rr_ms = input.hrv.mean_rr_ms,
                "Insufficient heart data, tick skipped"
            );
            return None;
        }

        let features = FeatureVector::from_snapshots(&input.hrv, &input.audio);
        if !features.is_finite() {
            tracing::debug!(?features, "Non-finite tick input, tick skipped");
            return None;
        }

        let rules = self.rules.evaluate(input.hrv.heart_rate_bpm, &input.audio, now_ms);

        let tick = TickId(self.next_tick);
        self.next_tick += 1;

        if self.in_flight.len() >= self.max_in_flight {
            if let Some(dropped) = self.in_flight.pop_front() {
                tracing::warn!(
                    tick = %dropped.tick,
                    max_in_flight = self.max_in_flight,
                    "Too many ticks awaiting the classifier, dropping oldest"
                );
            }
        }
        self.in_flight.push_back(InFlight {
            tick,
            rules,
            input: *input,
        });

        Some(PendingTick {
            tick,
            epoch: self.epoch,
            features,
            rules,
        })
    }

    /// Complete a tick with its classifier verdict.
    ///
    /// Verdicts from an older epoch, or for ticks no longer in flight,
    /// are discarded and return `None`.
    pub fn resolve_tick(&mut self, verdict: ClassifierVerdict, now_ms: u64) -> Option<TickOutcome> {
        if verdict.epoch != self.epoch {
            tracing::debug!(
                tick = %verdict.tick,
                verdict_epoch = %verdict.epoch,
                current_epoch = %self.epoch,
                "Discarding classifier verdict from before reset"
            );
            return None;
        }
        let Some(pos) = self.in_flight.iter().position(|p| p.tick == verdict.tick) else {
            tracing::debug!(tick = %verdict.tick, "Discarding verdict for unknown tick");
            return None;
        };
        let pending = self.in_flight.remove(pos)?;

        let fused = verdict.fear || pending.rules.any();
        self.votes.push(fused);
        self.is_fear = self.votes.is_majority();

        let transition = self.state.apply(self.is_fear, now_ms, self.episode_timeout_ms);
        let alert = match transition {
            Some(Transition::EpisodeStarted { at_ms, alert }) => {
                tracing::info!(tick = %pending.tick, at_ms, "Fear episode started");
                alert.then(|| Self::alert_request(&pending, verdict.fear, at_ms))
            }
            Some(Transition::EpisodeEnded {
                started_at_ms,
                ended_at_ms,
            }) => {
                tracing::info!(
                    started_at_ms,
                    duration_ms = ended_at_ms.saturating_sub(started_at_ms),
                    "Fear episode ended"
                );
                None
            }
            None => None,
        };

        Some(TickOutcome {
            tick: pending.tick,
            rules: pending.rules,
            classifier: verdict.fear,
            fused,
            is_fear: self.is_fear,
            phase: self.state.phase,
            transition,
            alert,
        })
    }

    /// Run a whole tick with an already known classifier verdict.
    pub fn process_tick(
        &mut self,
        input: &TickInput,
        classifier_fear: bool,
        now_ms: u64,
    ) -> Option<TickOutcome> {
        let pending = self.begin_tick(input, now_ms)?;
        self.resolve_tick(pending.verdict(classifier_fear), now_ms)
    }

    /// Return to a fresh idle state and invalidate in-flight verdicts.
    pub fn reset(&mut self) {
        self.votes.clear();
        self.state.reset();
        self.rules.reset();
        self.in_flight.clear();
        self.is_fear = false;
        self.epoch = Epoch(self.epoch.0.wrapping_add(1));
        tracing::info!(epoch = %self.epoch, "Fusion engine reset");
    }

    #[must_use]
    pub fn state(&self) -> FearState {
        self.state
    }

    /// Smoothed verdict after the last resolved tick.
    #[must_use]
    pub fn is_fear(&self) -> bool {
        self.is_fear
    }

    #[must_use]
    pub fn epoch(&self) -> Epoch {
        self.epoch
    }

    /// Number of ticks awaiting a classifier verdict.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    #[must_use]
    pub fn votes(&self) -> &VoteBuffer {
        &self.votes
    }

    fn alert_request(pending: &InFlight, classifier: bool, started_at_ms: u64) -> AlertRequest {
        let mut reasons: Vec<String> =
            pending.rules.reasons().into_iter().map(String::from).collect();
        if classifier {
            reasons.push("classifier".to_string());
        }
        AlertRequest {
            episode_started_at_ms: started_at_ms,
            tick: pending.tick,
            heart_rate_bpm: pending.input.hrv.heart_rate_bpm,
            pitch_hz: pending.input.audio.pitch_hz,
            intensity_variance_db: pending.input.audio.intensity_variance_db,
            reasons,
        }
    }
}

impl Default for FearFusionEngine {
    fn default() -> Self {
        Self::new(&FusionConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn calm() -> TickInput {
        TickInput {
            hrv: HrvSnapshot {
                heart_rate_bpm: 70,
                mean_rr_ms: 857.0,
                sdnn_ms: 20.0,
                rmssd_ms: 18.0,
                rr_count: 10,
            },
            audio: AudioSnapshot::default(),
        }
    }

    #[test]
    fn missing_heart_rate_skips_tick() {
        let mut engine = FearFusionEngine::default();
        let mut input = calm();
        input.hrv.heart_rate_bpm = 0;
        assert!(engine.begin_tick(&input, 0).is_none());
        assert_eq!(engine.in_flight(), 0);
    }

    #[test]
    fn missing_mean_rr_skips_tick() {
        let mut engine = FearFusionEngine::default();
        let mut input = calm();
        input.hrv.mean_rr_ms = 0.0;
        assert!(engine.process_tick(&input, true, 0).is_none());
        assert!(engine.votes().is_empty());
    }

    #[test]
    fn non_finite_input_skips_tick() {
        let mut engine = FearFusionEngine::default();
        let mut input = calm();
        input.audio.pitch_hz = f32::NAN;
        assert!(engine.begin_tick(&input, 0).is_none());
    }

    #[test]
    fn first_positive_tick_opens_episode() {
        let mut engine = FearFusionEngine::default();
        let out = engine.process_tick(&calm(), true, 1_000).unwrap();
        assert!(out.fused);
        assert!(out.is_fear);
        assert_eq!(out.phase, FearPhase::Alerting);
        let alert = out.alert.unwrap();
        assert_eq!(alert.episode_started_at_ms, 1_000);
        assert_eq!(alert.reasons, vec!["classifier".to_string()]);
    }

    #[test]
    fn unknown_tick_is_discarded() {
        let mut engine = FearFusionEngine::default();
        let verdict = ClassifierVerdict {
            tick: TickId(99),
            epoch: engine.epoch(),
            fear: true,
        };
        assert!(engine.resolve_tick(verdict, 0).is_none());
        assert!(engine.votes().is_empty());
    }

    #[test]
    fn verdicts_resolve_out_of_order() {
        let mut engine = FearFusionEngine::default();
        let a = engine.begin_tick(&calm(), 0).unwrap();
        let b = engine.begin_tick(&calm(), 1_000).unwrap();
        assert_eq!(engine.in_flight(), 2);

        assert!(engine.resolve_tick(b.verdict(false), 1_100).is_some());
        assert!(engine.resolve_tick(a.verdict(false), 1_200).is_some());
        assert_eq!(engine.in_flight(), 0);
        assert_eq!(engine.votes().len(), 2);
    }

    #[test]
    fn in_flight_is_bounded() {
        let config = FusionConfig::builder().max_in_flight(2).build();
        let mut engine = FearFusionEngine::new(&config);

        let first = engine.begin_tick(&calm(), 0).unwrap();
        engine.begin_tick(&calm(), 1_000).unwrap();
        engine.begin_tick(&calm(), 2_000).unwrap();
        assert_eq!(engine.in_flight(), 2);

        // Oldest was evicted, so its verdict is unknown now.
        assert!(engine.resolve_tick(first.verdict(true), 3_000).is_none());
    }

    #[test]
    fn reset_bumps_epoch_and_clears_state() {
        let mut engine = FearFusionEngine::default();
        engine.process_tick(&calm(), true, 0);
        let before = engine.epoch();
        engine.reset();
        assert_ne!(engine.epoch(), before);
        assert_eq!(engine.state(), FearState::default());
        assert!(!engine.is_fear());
        assert!(engine.votes().is_empty());
    }
}
