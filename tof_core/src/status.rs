//! Controller lifecycle states and per-call outcomes.

use serde::Serialize;

use crate::error::RangerError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ControllerState {
    Uninitialized,
    Initializing,
    Ready,
    Polling,
    /// Terminal. Reached only from a failed initialization.
    Halted,
}

/// Result of `AcquisitionController::initialize`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InitOutcome {
    Ready,
    Halted(RangerError),
}

impl InitOutcome {
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready)
    }
}

/// One distance sample after optional filtering.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Measurement {
    /// Distance as reported by the sensor.
    pub raw_mm: u16,
    /// Median-filtered distance, or `raw_mm` when filtering is off.
    pub output_mm: u16,
    /// `output_mm` in metres.
    pub distance_m: f32,
    pub range_status: u8,
}

/// Result of one polling period.
#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    /// Sensor had no fresh sample; nothing was fetched or filtered.
    NotReady,
    Measurement(Measurement),
    /// The period was skipped; the next one proceeds normally.
    RangingError(RangerError),
    /// Controller is halted; no bus traffic was issued.
    Halted,
}
