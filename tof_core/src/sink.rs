//! Status line reporting.
//!
//! The controller reports lifecycle and per-period outcomes as `StatusLine`s.
//! Success and failure are always distinguishable in both renderings.
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use serde::Serialize;

use crate::status::Measurement;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum StatusLine {
    SensorReady { address: String },
    SensorHalted { address: String, reason: String },
    Distance(Measurement),
    Skipped { reason: String },
}

impl core::fmt::Display for StatusLine {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::SensorReady { address } => write!(f, "TOF success! sensor {address} ranging"),
            Self::SensorHalted { address, reason } => write!(
                f,
                "TOF error! sensor {address} halted ({reason}); no measurements until restart"
            ),
            Self::Distance(m) if m.output_mm == m.raw_mm => {
                write!(f, "distance {} mm", m.output_mm)
            }
            Self::Distance(m) => write!(f, "distance {} mm (raw {} mm)", m.output_mm, m.raw_mm),
            Self::Skipped { reason } => write!(f, "period skipped: {reason}"),
        }
    }
}

pub trait StatusSink {
    fn report(&self, line: &StatusLine);
}

impl<T: StatusSink + ?Sized> StatusSink for Box<T> {
    fn report(&self, line: &StatusLine) {
        (**self).report(line);
    }
}

/// Prints one line per report to stdout, plain text or JSON.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleSink {
    json: bool,
}

impl ConsoleSink {
    pub fn plain() -> Self {
        Self { json: false }
    }

    pub fn json() -> Self {
        Self { json: true }
    }
}

impl StatusSink for ConsoleSink {
    fn report(&self, line: &StatusLine) {
        if self.json {
            match serde_json::to_string(line) {
                Ok(s) => println!("{s}"),
                Err(e) => tracing::warn!(error = %e, "status line not serializable"),
            }
        } else {
            println!("{line}");
        }
    }
}

/// Appends plain status lines to a file; write failures are logged and dropped.
pub struct FileSink {
    path: PathBuf,
}

impl FileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl StatusSink for FileSink {
    fn report(&self, line: &StatusLine) {
        let res = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .and_then(|mut file| writeln!(file, "{line}"));
        if let Err(e) = res {
            tracing::warn!(path = %self.path.display(), error = %e, "status file write failed");
        }
    }
}

/// Keeps every line in memory. Clones share the same buffer.
#[derive(Debug, Default, Clone)]
pub struct RecordingSink {
    lines: Arc<Mutex<Vec<StatusLine>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<StatusLine> {
        self.lines.lock().map(|l| l.clone()).unwrap_or_default()
    }
}

impl StatusSink for RecordingSink {
    fn report(&self, line: &StatusLine) {
        if let Ok(mut l) = self.lines.lock() {
            l.push(line.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Measurement {
        Measurement {
            raw_mm: 2000,
            output_mm: 412,
            distance_m: 0.412,
            range_status: 0,
        }
    }

    #[test]
    fn plain_rendering_distinguishes_success_and_failure() {
        let ok = StatusLine::SensorReady {
            address: "0x29".into(),
        };
        let bad = StatusLine::SensorHalted {
            address: "0x29".into(),
            reason: "boot timeout".into(),
        };
        assert!(ok.to_string().starts_with("TOF success!"));
        assert!(bad.to_string().starts_with("TOF error!"));
        assert_eq!(
            StatusLine::Distance(sample()).to_string(),
            "distance 412 mm (raw 2000 mm)"
        );
    }

    #[test]
    fn json_rendering_is_tagged() {
        let v: serde_json::Value =
            serde_json::to_value(StatusLine::Distance(sample())).expect("json");
        assert_eq!(v["event"], "distance");
        assert_eq!(v["output_mm"], 412);
        assert_eq!(v["raw_mm"], 2000);
    }

    #[test]
    fn file_sink_appends() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("status.log");
        let sink = FileSink::new(&path);
        sink.report(&StatusLine::Skipped {
            reason: "i2c transfer failed".into(),
        });
        sink.report(&StatusLine::Distance(sample()));
        let text = std::fs::read_to_string(&path).expect("read");
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(
            lines,
            vec!["period skipped: i2c transfer failed", "distance 412 mm (raw 2000 mm)"]
        );
    }

    #[test]
    fn recording_sink_clones_share_lines() {
        let a = RecordingSink::new();
        let b = a.clone();
        a.report(&StatusLine::Skipped { reason: "x".into() });
        assert_eq!(b.lines().len(), 1);
    }
}
