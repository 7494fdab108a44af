//! Backend assembly and the `run` / `self-check` commands.

use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use tof_core::error::{Report, Result as CoreResult};
use tof_core::{
    AcquisitionController, ConsoleSink, FilterSettings, InitOutcome, RunConfig, RunSummary,
    SensorSettings,
};
use tof_traits::{MonotonicClock, RangingDriver};

use crate::rt::setup_rt_once;

/// Command-line overrides for the `run` command.
#[derive(Debug, Default, Clone)]
pub struct RunOverrides {
    pub periods: Option<u64>,
    pub period_ms: Option<u64>,
    pub no_filter: bool,
    pub rt: bool,
    pub rt_prio: Option<i32>,
}

type Controller = AcquisitionController<Box<dyn RangingDriver>, ConsoleSink>;

fn build_controller(
    cfg: &tof_config::Config,
    json: bool,
    no_filter: bool,
) -> CoreResult<Controller> {
    let settings: SensorSettings = (&cfg.sensor).into();
    let mut filter: FilterSettings = (&cfg.filter).into();
    if no_filter {
        filter.median_window = None;
    }
    let sink = if json {
        ConsoleSink::json()
    } else {
        ConsoleSink::plain()
    };
    Ok(AcquisitionController::new(
        make_driver(cfg)?,
        sink,
        settings,
        filter,
    ))
}

#[cfg(all(feature = "hardware", target_os = "linux"))]
fn make_driver(cfg: &tof_config::Config) -> CoreResult<Box<dyn RangingDriver>> {
    use tof_hardware::{LinuxI2c, RegisterTransport, Vl53l4ed};
    use tof_traits::DeviceAddress;

    tracing::info!(bus = cfg.sensor.bus, address = %DeviceAddress(cfg.sensor.address), "using VL53L4ED on i2c");
    let transport = RegisterTransport::new(LinuxI2c::new(cfg.sensor.bus), MonotonicClock::new());
    Ok(Box::new(Vl53l4ed::new(
        transport,
        DeviceAddress(cfg.sensor.address),
    )))
}

/// Simulated sensor. `TOF_TEST_SIM_INIT_FAIL=1` makes bring-up fail and
/// `TOF_TEST_SIM_FAIL_AT=<n>` fails the n-th result fetch.
#[cfg(not(all(feature = "hardware", target_os = "linux")))]
fn make_driver(_cfg: &tof_config::Config) -> CoreResult<Box<dyn RangingDriver>> {
    use tof_hardware::SimulatedTof;

    let mut tof = SimulatedTof::default();
    if std::env::var("TOF_TEST_SIM_INIT_FAIL").is_ok_and(|v| v == "1") {
        tof = tof.failing_init();
    }
    if let Ok(v) = std::env::var("TOF_TEST_SIM_FAIL_AT") {
        let index: u32 = v.parse().map_err(|_| {
            Report::new(tof_core::RangerError::Config(format!(
                "TOF_TEST_SIM_FAIL_AT must be a fetch index, got '{v}'"
            )))
        })?;
        tof = tof.failing_fetch_at(index);
    }
    tracing::info!("using simulated sensor");
    Ok(Box::new(tof))
}

pub fn run_acquisition(
    cfg: &tof_config::Config,
    ov: &RunOverrides,
    json: bool,
    shutdown: Arc<AtomicBool>,
) -> CoreResult<RunSummary> {
    setup_rt_once(
        ov.rt || cfg.runner.rt,
        ov.rt_prio.unwrap_or(cfg.runner.rt_prio),
    );

    let mut run_cfg: RunConfig = (&cfg.acquisition).into();
    if let Some(n) = ov.periods {
        run_cfg.max_periods = n;
    }
    if let Some(ms) = ov.period_ms {
        run_cfg.period_ms = ms;
    }

    let mut controller = build_controller(cfg, json, ov.no_filter)?;
    let summary = tof_core::run(&mut controller, &run_cfg, &MonotonicClock::new(), &shutdown)?;
    print_summary(&summary, json);
    Ok(summary)
}

pub fn self_check(cfg: &tof_config::Config, json: bool) -> CoreResult<()> {
    let mut controller = build_controller(cfg, json, true)?;
    match controller.initialize() {
        InitOutcome::Ready => {
            if json {
                println!("{}", serde_json::json!({ "status": "ok" }));
            } else {
                println!("ok");
            }
            Ok(())
        }
        InitOutcome::Halted(e) => Err(Report::new(e)),
    }
}

fn print_summary(summary: &RunSummary, json: bool) {
    if json {
        let mut v = serde_json::to_value(summary).unwrap_or_default();
        if let Some(obj) = v.as_object_mut() {
            obj.insert("event".into(), "summary".into());
        }
        println!("{v}");
    } else {
        println!(
            "stopped after {} periods: {} measurements, {} skipped, {} not ready",
            summary.periods, summary.measurements, summary.ranging_errors, summary.not_ready
        );
    }
}
