//! JSON-lines sensor logs.
//!
//! One event per line, tagged by `kind`:
//!
//! ```text
//! {"kind":"beat","t_ms":1200}
//! {"kind":"rate","t_ms":1200,"bpm":72}
//! {"kind":"audio","t_ms":1250,"sample_rate":16000,"samples":[12,-40,...]}
//! ```
//!
//! Blank lines and lines starting with `#` are ignored.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use star_sentinel_fusion::{FusionError, SentinelHandle};

/// A recorded sensor event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ReplayEvent {
    Beat {
        t_ms: u64,
    },
    Rate {
        t_ms: u64,
        bpm: i32,
    },
    Audio {
        t_ms: u64,
        sample_rate: u32,
        samples: Vec<i16>,
    },
}

impl ReplayEvent {
    /// Recording timestamp (ms).
    #[must_use]
    pub fn t_ms(&self) -> u64 {
        match self {
            Self::Beat { t_ms } | Self::Rate { t_ms, .. } | Self::Audio { t_ms, .. } => *t_ms,
        }
    }

    /// Push this event into a running pipeline.
    pub fn deliver(&self, handle: &SentinelHandle) -> Result<(), FusionError> {
        match self {
            Self::Beat { t_ms } => handle.on_heartbeat(*t_ms),
            Self::Rate { bpm, .. } => handle.on_heart_rate(*bpm),
            Self::Audio {
                sample_rate,
                samples,
                ..
            } => handle.on_audio_frame(samples.clone(), *sample_rate),
        }
    }
}

/// Parse events from a reader, ordered by timestamp.
pub fn parse_replay(reader: impl BufRead) -> Result<Vec<ReplayEvent>> {
    let mut events = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line.with_context(|| format!("reading line {}", idx + 1))?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let event: ReplayEvent = serde_json::from_str(trimmed)
            .with_context(|| format!("parsing line {}", idx + 1))?;
        events.push(event);
    }
    events.sort_by_key(ReplayEvent::t_ms);
    Ok(events)
}

/// Read a replay file.
pub fn read_replay(path: &Path) -> Result<Vec<ReplayEvent>> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    parse_replay(BufReader::new(file))
}

/// Write events as JSON lines.
pub fn write_replay(path: &Path, events: &[ReplayEvent]) -> Result<()> {
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut out = BufWriter::new(file);
    for event in events {
        serde_json::to_writer(&mut out, event)?;
        out.write_all(b"\n")?;
    }
    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_all_kinds_and_sorts() {
        let input = r#"
# comment
{"kind":"rate","t_ms":500,"bpm":72}
{"kind":"beat","t_ms":100}

{"kind":"audio","t_ms":300,"sample_rate":16000,"samples":[1,-1,2]}
"#;
        let events = parse_replay(input.as_bytes()).unwrap();
        assert_eq!(events.len(), 3);
        assert_eq!(events[0], ReplayEvent::Beat { t_ms: 100 });
        assert!(matches!(
            &events[1],
            ReplayEvent::Audio { sample_rate: 16_000, samples, .. } if samples == &vec![1, -1, 2]
        ));
        assert_eq!(events[2], ReplayEvent::Rate { t_ms: 500, bpm: 72 });
    }

    #[test]
    fn bad_line_reports_line_number() {
        let input = "{\"kind\":\"beat\",\"t_ms\":1}\n{\"kind\":\"nope\"}\n";
        let err = parse_replay(input.as_bytes()).unwrap_err();
        assert!(format!("{err:#}").contains("line 2"));
    }

    #[test]
    fn file_roundtrip() {
        let path = std::env::temp_dir().join(format!("star-sentinel-replay-{}.jsonl", std::process::id()));
        let events = vec![
            ReplayEvent::Beat { t_ms: 0 },
            ReplayEvent::Rate { t_ms: 10, bpm: 80 },
        ];
        write_replay(&path, &events).unwrap();
        assert_eq!(read_replay(&path).unwrap(), events);
        let _ = std::fs::remove_file(&path);
    }
}
