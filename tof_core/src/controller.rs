//! Sensor lifecycle and per-period polling.
//!
//! `initialize` brings the sensor up exactly once. Any failure on the way is
//! fatal: the controller moves to `Halted`, reports a single diagnostic and
//! never calls the driver again. `poll_once` performs one period's work:
//! data-ready check, fetch, optional median filtering, interrupt clear.
//! Ranging failures inside a period skip that period only.
use tof_traits::RangingDriver;
use tracing::{debug, error, info, trace, warn};

use crate::config::{FilterSettings, SensorSettings};
use crate::error::RangerError;
use crate::hw_error::map_hw_error;
use crate::median::MedianFilter;
use crate::sink::{StatusLine, StatusSink};
use crate::status::{ControllerState, InitOutcome, Measurement, PollOutcome};
use crate::util::mm_to_m;

pub struct AcquisitionController<D, S> {
    driver: D,
    sink: S,
    settings: SensorSettings,
    filter: Option<MedianFilter>,
    state: ControllerState,
    halt_reason: Option<RangerError>,
}

impl<D: RangingDriver, S: StatusSink> AcquisitionController<D, S> {
    pub fn new(driver: D, sink: S, settings: SensorSettings, filter: FilterSettings) -> Self {
        Self {
            driver,
            sink,
            settings,
            filter: filter.median_window.map(MedianFilter::new),
            state: ControllerState::Uninitialized,
            halt_reason: None,
        }
    }

    pub fn initialize(&mut self) -> InitOutcome {
        match self.state {
            ControllerState::Uninitialized => {}
            ControllerState::Halted => {
                return InitOutcome::Halted(
                    self.halt_reason
                        .clone()
                        .unwrap_or_else(|| RangerError::Halted("sensor halted".into())),
                );
            }
            ControllerState::Initializing | ControllerState::Ready | ControllerState::Polling => {
                warn!(state = ?self.state, "initialize called again; ignored");
                return InitOutcome::Ready;
            }
        }

        self.state = ControllerState::Initializing;
        let address = self.settings.address;
        info!(%address, timing_budget_ms = self.settings.timing_budget_ms, "initializing sensor");

        match self.bring_up() {
            Ok(()) => {
                self.state = ControllerState::Ready;
                info!(%address, "sensor ranging");
                self.sink.report(&StatusLine::SensorReady {
                    address: address.to_string(),
                });
                InitOutcome::Ready
            }
            Err((stage, cause)) => {
                error!(%address, stage, error = %cause, "sensor initialization failed; halting");
                self.sink.report(&StatusLine::SensorHalted {
                    address: address.to_string(),
                    reason: format!("{stage}: {cause}"),
                });
                let err = RangerError::Halted(format!("{stage}: {cause}"));
                self.state = ControllerState::Halted;
                self.halt_reason = Some(err.clone());
                InitOutcome::Halted(err)
            }
        }
    }

    fn bring_up(&mut self) -> Result<(), (&'static str, RangerError)> {
        let s = self.settings;
        let fail = |stage: &'static str| move |e: tof_traits::BoxError| (stage, map_hw_error(&*e));
        self.driver.init_bus().map_err(fail("bus init"))?;
        self.driver.sensor_init().map_err(fail("sensor init"))?;
        self.driver
            .set_range_timing(s.timing_budget_ms, s.inter_measurement_ms)
            .map_err(fail("range timing"))?;
        self.driver.start_ranging().map_err(fail("start ranging"))?;
        Ok(())
    }

    pub fn poll_once(&mut self) -> PollOutcome {
        match self.state {
            ControllerState::Halted => return PollOutcome::Halted,
            ControllerState::Uninitialized | ControllerState::Initializing => {
                return PollOutcome::RangingError(RangerError::State(
                    "poll before successful initialize".into(),
                ));
            }
            ControllerState::Ready => {
                debug!("first polling period");
                self.state = ControllerState::Polling;
            }
            ControllerState::Polling => {}
        }

        match self.driver.check_data_ready() {
            Ok(true) => {}
            Ok(false) => {
                trace!("no fresh sample");
                return PollOutcome::NotReady;
            }
            Err(e) => return self.skip("data-ready check", map_hw_error(&*e)),
        }

        let result = match self.driver.get_result() {
            Ok(r) => r,
            Err(e) => return self.skip("fetch", map_hw_error(&*e)),
        };
        let measurement = self.measure(result.distance_mm, result.range_status);

        if let Err(e) = self.driver.clear_interrupt() {
            warn!(error = %map_hw_error(&*e), "interrupt clear failed; sample may repeat next period");
        }
        debug!(
            raw_mm = measurement.raw_mm,
            output_mm = measurement.output_mm,
            "measurement"
        );
        self.sink.report(&StatusLine::Distance(measurement));
        PollOutcome::Measurement(measurement)
    }

    fn measure(&mut self, raw_mm: u16, range_status: u8) -> Measurement {
        let output_mm = match self.filter.as_mut() {
            Some(f) => {
                f.add_sample(i32::from(raw_mm));
                f.get_median()
                    .and_then(|m| u16::try_from(m).ok())
                    .unwrap_or(raw_mm)
            }
            None => raw_mm,
        };
        Measurement {
            raw_mm,
            output_mm,
            distance_m: mm_to_m(output_mm),
            range_status,
        }
    }

    fn skip(&mut self, stage: &'static str, err: RangerError) -> PollOutcome {
        warn!(stage, error = %err, "ranging error; period skipped");
        self.sink.report(&StatusLine::Skipped {
            reason: format!("{stage}: {err}"),
        });
        PollOutcome::RangingError(err)
    }

    pub fn state(&self) -> ControllerState {
        self.state
    }

    pub fn filter(&self) -> Option<&MedianFilter> {
        self.filter.as_ref()
    }

    pub fn halt_reason(&self) -> Option<&RangerError> {
        self.halt_reason.as_ref()
    }

    pub fn settings(&self) -> &SensorSettings {
        &self.settings
    }

    pub fn into_parts(self) -> (D, S) {
        (self.driver, self.sink)
    }
}
