use serde::{Deserialize, Serialize};

/// Episode phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FearPhase {
    /// No active episode.
    #[default]
    Idle,
    /// Episode in progress; alert already handled.
    Alerting,
}

/// Result of applying one smoothed verdict to the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Idle to Alerting. `alert` is set when this edge must raise an alert.
    EpisodeStarted { at_ms: u64, alert: bool },
    /// Alerting back to Idle after the timeout.
    EpisodeEnded { started_at_ms: u64, ended_at_ms: u64 },
}

/// Idle/Alerting state machine with timeout hysteresis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FearState {
    pub phase: FearPhase,
    pub episode_started_at_ms: u64,
    pub alert_sent_this_episode: bool,
}

impl FearState {
    /// Apply the smoothed verdict for a tick.
    ///
    /// Returning to fear inside an episode neither restarts the timer
    /// nor alerts again; the episode only closes once fear is absent
    /// and strictly more than `timeout_ms` has elapsed since it began.
    pub fn apply(&mut self, is_fear: bool, now_ms: u64, timeout_ms: u64) -> Option<Transition> {
        match self.phase {
            FearPhase::Idle if is_fear => {
                self.phase = FearPhase::Alerting;
                self.episode_started_at_ms = now_ms;
                let alert = !self.alert_sent_this_episode;
                self.alert_sent_this_episode = true;
                Some(Transition::EpisodeStarted { at_ms: now_ms, alert })
            }
            FearPhase::Alerting
                if !is_fear && now_ms.saturating_sub(self.episode_started_at_ms) > timeout_ms =>
            {
                let started_at_ms = self.episode_started_at_ms;
                self.phase = FearPhase::Idle;
                self.alert_sent_this_episode = false;
                Some(Transition::EpisodeEnded {
                    started_at_ms,
                    ended_at_ms: now_ms,
                })
            }
            _ => None,
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
