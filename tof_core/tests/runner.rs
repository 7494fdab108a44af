use std::sync::atomic::AtomicBool;
use std::time::Duration;

use tof_core::mocks::{ScriptedDriver, Step};
use tof_core::{
    AcquisitionController, FilterSettings, RangerError, RecordingSink, RunConfig, SensorSettings,
    StatusLine, run,
};
use tof_hardware::SimulatedTof;
use tof_traits::clock::test_clock::TestClock;

fn cfg(period_ms: u64, max_periods: u64) -> RunConfig {
    RunConfig {
        period_ms,
        max_periods,
    }
}

#[test]
fn polls_on_a_fixed_grid_until_max_periods() {
    let mut c = AcquisitionController::new(
        SimulatedTof::default(),
        RecordingSink::new(),
        SensorSettings::default(),
        FilterSettings::default(),
    );
    let clock = TestClock::new();
    let stop = AtomicBool::new(false);
    let summary = run(&mut c, &cfg(100, 5), &clock, &stop).expect("run");
    assert_eq!(summary.periods, 5);
    assert_eq!(summary.measurements, 5);
    assert_eq!(clock.sleeps(), vec![Duration::from_millis(100); 4]);
    assert_eq!(clock.elapsed(), Duration::from_millis(400));
}

#[test]
fn init_failure_returns_halted_without_polling() {
    let tof = SimulatedTof::default().failing_init();
    let calls = tof.call_counter();
    let sink = RecordingSink::new();
    let mut c = AcquisitionController::new(
        tof,
        sink.clone(),
        SensorSettings::default(),
        FilterSettings::default(),
    );
    let clock = TestClock::new();
    let stop = AtomicBool::new(false);
    let err = run(&mut c, &cfg(100, 10), &clock, &stop).expect_err("halted");
    assert!(matches!(
        err.downcast_ref::<RangerError>(),
        Some(RangerError::Halted(_))
    ));
    // init_bus + sensor_init only.
    assert_eq!(*calls.lock().unwrap(), 2);
    assert!(clock.sleeps().is_empty());
    assert_eq!(sink.lines().len(), 1);

    // A supervisor retrying the run still gets no bus activity.
    let err = run(&mut c, &cfg(100, 10), &clock, &stop).expect_err("still halted");
    assert!(err.to_string().contains("halted"));
    assert_eq!(*calls.lock().unwrap(), 2);
}

#[test]
fn transient_fetch_failure_is_counted_and_run_continues() {
    let tof = SimulatedTof::default().failing_fetch_at(2);
    let sink = RecordingSink::new();
    let mut c = AcquisitionController::new(
        tof,
        sink.clone(),
        SensorSettings::default(),
        FilterSettings::default(),
    );
    let clock = TestClock::new();
    let stop = AtomicBool::new(false);
    let summary = run(&mut c, &cfg(100, 6), &clock, &stop).expect("run");
    assert_eq!(summary.periods, 6);
    assert_eq!(summary.ranging_errors, 1);
    assert_eq!(summary.measurements, 5);
    let skipped = sink
        .lines()
        .into_iter()
        .filter(|l| matches!(l, StatusLine::Skipped { .. }))
        .count();
    assert_eq!(skipped, 1);
}

#[test]
fn not_ready_periods_are_tallied() {
    let driver = ScriptedDriver::new([Step::NotReady, Step::Distance(300), Step::NotReady]);
    let mut c = AcquisitionController::new(
        driver,
        RecordingSink::new(),
        SensorSettings::default(),
        FilterSettings::default(),
    );
    let clock = TestClock::new();
    let stop = AtomicBool::new(false);
    let summary = run(&mut c, &cfg(50, 3), &clock, &stop).expect("run");
    assert_eq!(summary.not_ready, 2);
    assert_eq!(summary.measurements, 1);
    assert_eq!(summary.last.map(|m| m.output_mm), Some(300));
}

#[test]
fn shutdown_flag_stops_before_next_period() {
    let mut c = AcquisitionController::new(
        SimulatedTof::default(),
        RecordingSink::new(),
        SensorSettings::default(),
        FilterSettings::default(),
    );
    let clock = TestClock::new();
    let stop = AtomicBool::new(true);
    let summary = run(&mut c, &cfg(100, 0), &clock, &stop).expect("run");
    assert_eq!(summary.periods, 0);
    assert!(clock.sleeps().is_empty());
}
