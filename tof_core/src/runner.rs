//! Fixed-rate acquisition loop.
//!
//! Initializes the controller once, then polls on a fixed grid of deadlines
//! (`deadline += period`) until `max_periods` is reached or the shutdown flag
//! is raised. An initialization failure ends the run with
//! `RangerError::Halted` before any polling period starts.
use std::sync::atomic::{AtomicBool, Ordering};

use serde::Serialize;
use tof_traits::{Clock, RangingDriver};

use crate::config::RunConfig;
use crate::controller::AcquisitionController;
use crate::error::{RangerError, Report, Result as CoreResult};
use crate::sink::StatusSink;
use crate::status::{InitOutcome, Measurement, PollOutcome};
use crate::util::{next_deadline, period};

/// Tally of one acquisition run.
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub periods: u64,
    pub measurements: u64,
    pub not_ready: u64,
    pub ranging_errors: u64,
    pub last: Option<Measurement>,
}

pub fn run<D, S, C>(
    controller: &mut AcquisitionController<D, S>,
    cfg: &RunConfig,
    clock: &C,
    shutdown: &AtomicBool,
) -> CoreResult<RunSummary>
where
    D: RangingDriver,
    S: StatusSink,
    C: Clock + ?Sized,
{
    if let InitOutcome::Halted(e) = controller.initialize() {
        return Err(Report::new(e));
    }

    let period = period(cfg.period_ms);
    let mut deadline = clock.now();
    let mut summary = RunSummary::default();
    tracing::info!(
        period_ms = cfg.period_ms,
        max_periods = cfg.max_periods,
        "acquisition start"
    );

    loop {
        if shutdown.load(Ordering::Relaxed) {
            tracing::info!(periods = summary.periods, "shutdown requested");
            break;
        }

        match controller.poll_once() {
            PollOutcome::Measurement(m) => {
                summary.measurements += 1;
                summary.last = Some(m);
            }
            PollOutcome::NotReady => summary.not_ready += 1,
            PollOutcome::RangingError(e) if e.is_fatal() => return Err(Report::new(e)),
            PollOutcome::RangingError(_) => summary.ranging_errors += 1,
            PollOutcome::Halted => {
                let e = controller
                    .halt_reason()
                    .cloned()
                    .unwrap_or_else(|| RangerError::Halted("sensor halted".into()));
                return Err(Report::new(e));
            }
        }
        summary.periods += 1;

        if cfg.max_periods > 0 && summary.periods >= cfg.max_periods {
            break;
        }
        let now = clock.now();
        let next = next_deadline(deadline, period, now);
        if next != deadline + period {
            tracing::debug!(
                late_ms = now.saturating_duration_since(deadline).as_millis() as u64,
                "polling overrun; schedule re-anchored"
            );
        }
        deadline = next;
        clock.sleep_until(deadline);
    }

    tracing::info!(
        periods = summary.periods,
        measurements = summary.measurements,
        ranging_errors = summary.ranging_errors,
        "acquisition stopped"
    );
    Ok(summary)
}
