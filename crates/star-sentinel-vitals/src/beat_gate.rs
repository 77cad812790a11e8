//! Pseudo-beat derivation for rate-only heart sensors.
//!
//! Smartwatch heart-rate sensors usually report BPM rather than beat
//! events. The gate turns a stream of plausible BPM readings into beat
//! timestamps spaced at least one refractory period apart.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Configuration for [`RateBeatGate`].
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct RateBeatGateConfig {
    /// Lowest reading treated as a live heartbeat (BPM).
    pub min_bpm: i32,
    /// Highest reading treated as a live heartbeat (BPM).
    pub max_bpm: i32,
    /// Minimum spacing between emitted beats (ms).
    pub refractory_ms: u64,
}

impl Default for RateBeatGateConfig {
    fn default() -> Self {
        Self {
            min_bpm: 30,
            max_bpm: 220,
            refractory_ms: 300,
        }
    }
}

/// Emits a beat timestamp for readings that look like a live pulse.
#[derive(Debug, Clone)]
pub struct RateBeatGate {
    config: RateBeatGateConfig,
    last_emitted_ms: Option<u64>,
}

impl RateBeatGate {
    /// Create a gate with the given configuration.
    #[must_use]
    pub fn new(config: RateBeatGateConfig) -> Self {
        Self {
            config,
            last_emitted_ms: None,
        }
    }

    /// Offer a BPM reading observed at `now_ms`.
    ///
    /// Returns the beat timestamp to feed into the HRV processor, or
    /// `None` if the reading is out of range or inside the refractory
    /// period of the previous beat.
    pub fn offer(&mut self, bpm: i32, now_ms: u64) -> Option<u64> {
        if bpm < self.config.min_bpm || bpm > self.config.max_bpm {
            return None;
        }

        let ready = match self.last_emitted_ms {
            None => true,
            Some(last) => now_ms.saturating_sub(last) >= self.config.refractory_ms,
        };
        if !ready {
            return None;
        }

        self.last_emitted_ms = Some(now_ms);
        Some(now_ms)
    }

    /// Forget the last emitted beat.
    pub fn reset(&mut self) {
        self.last_emitted_ms = None;
    }
}

impl Default for RateBeatGate {
    fn default() -> Self {
        Self::new(RateBeatGateConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_plausible_reading_emits() {
        let mut gate = RateBeatGate::default();
        assert_eq!(gate.offer(72, 1_000), Some(1_000));
    }

    #[test]
    fn out_of_range_rejected() {
        let mut gate = RateBeatGate::default();
        assert_eq!(gate.offer(10, 1_000), None);
        assert_eq!(gate.offer(250, 1_000), None);
    }

    #[test]
    fn refractory_period_enforced() {
        let mut gate = RateBeatGate::default();
        assert!(gate.offer(80, 1_000).is_some());
        assert!(gate.offer(80, 1_200).is_none());
        assert_eq!(gate.offer(80, 1_300), Some(1_300));
    }

    #[test]
    fn reset_rearms() {
        let mut gate = RateBeatGate::default();
        gate.offer(80, 1_000);
        gate.reset();
        assert_eq!(gate.offer(80, 1_050), Some(1_050));
    }
}
