//! End-to-end controller tests over the register-level VL53L4ED driver and a
//! simulated register map.
use tof_core::{
    AcquisitionController, ControllerState, FilterSettings, PollOutcome, RangerError,
    RecordingSink, SensorSettings, StatusLine,
};
use tof_hardware::sim::BusOp;
use tof_hardware::vl53l4ed::{DEFAULT_ADDRESS, reg};
use tof_hardware::{RegisterMapBus, RegisterTransport, Vl53l4ed};
use tof_traits::clock::test_clock::TestClock;

type Controller = AcquisitionController<Vl53l4ed<RegisterMapBus, TestClock>, RecordingSink>;

fn booted_sensor(distance_mm: u16) -> RegisterMapBus {
    let bus = RegisterMapBus::new(0x29);
    bus.set(reg::FIRMWARE_SYSTEM_STATUS, 0x03);
    bus.set(reg::GPIO_HV_MUX_CTRL, 0x00);
    bus.set(reg::GPIO_TIO_HV_STATUS, 0x01);
    bus.set_be(reg::OSC_FREQUENCY, &[0x0B, 0xB8]);
    bus.set(reg::RESULT_RANGE_STATUS, 0x09);
    bus.set_be(reg::RESULT_DISTANCE, &distance_mm.to_be_bytes());
    bus
}

fn controller(bus: &RegisterMapBus, window: Option<usize>) -> (Controller, RecordingSink) {
    let driver = Vl53l4ed::new(
        RegisterTransport::new(bus.clone(), TestClock::new()),
        DEFAULT_ADDRESS,
    );
    let sink = RecordingSink::new();
    let c = AcquisitionController::new(
        driver,
        sink.clone(),
        SensorSettings::default(),
        FilterSettings {
            median_window: window,
        },
    );
    (c, sink)
}

#[test]
fn failed_boot_halts_with_one_line_and_no_further_bus_traffic() {
    // Firmware status never reaches "booted".
    let bus = RegisterMapBus::new(0x29);
    let (mut c, sink) = controller(&bus, Some(25));
    let outcome = c.initialize();
    assert!(!outcome.is_ready());
    assert_eq!(c.state(), ControllerState::Halted);
    assert!(matches!(c.halt_reason(), Some(RangerError::Halted(msg)) if msg.contains("sensor init")));

    let after_init = bus.transaction_count();
    for _ in 0..10 {
        assert_eq!(c.poll_once(), PollOutcome::Halted);
    }
    assert_eq!(bus.transaction_count(), after_init);
    let lines = sink.lines();
    assert_eq!(lines.len(), 1);
    assert!(matches!(&lines[0], StatusLine::SensorHalted { address, .. } if address == "0x29"));
}

#[test]
fn one_period_is_a_handful_of_transactions() {
    let bus = booted_sensor(400);
    let (mut c, sink) = controller(&bus, None);
    assert!(c.initialize().is_ready());
    bus.clear_log();

    match c.poll_once() {
        PollOutcome::Measurement(m) => {
            assert_eq!(m.raw_mm, 400);
            assert_eq!(m.range_status, 0);
        }
        other => panic!("expected measurement, got {other:?}"),
    }
    let log = bus.log();
    assert_eq!(log.len(), 9);
    assert_eq!(
        log.last(),
        Some(&BusOp::Write {
            address: 0x29,
            bytes: vec![0x00, 0x86, 0x01]
        })
    );
    assert!(matches!(sink.lines().last(), Some(StatusLine::Distance(_))));
}

#[test]
fn continuous_ranging_is_started_with_configured_timing() {
    let bus = booted_sensor(400);
    let (mut c, _) = controller(&bus, None);
    assert!(c.initialize().is_ready());
    assert_eq!(bus.get(reg::SYSTEM_START), 0x21);
    assert_eq!(
        (0..4)
            .map(|i| bus.get(reg::INTERMEASUREMENT_MS + i))
            .collect::<Vec<_>>(),
        vec![0; 4]
    );
}

#[test]
fn bus_error_skips_a_period_without_touching_the_filter() {
    let bus = booted_sensor(400);
    let (mut c, _) = controller(&bus, Some(25));
    assert!(c.initialize().is_ready());
    for _ in 0..3 {
        assert!(matches!(c.poll_once(), PollOutcome::Measurement(_)));
    }
    let before: Vec<i32> = c.filter().map(|f| f.samples().collect()).unwrap_or_default();

    bus.fail_next(1);
    assert!(matches!(
        c.poll_once(),
        PollOutcome::RangingError(RangerError::Hardware(_))
    ));
    let after: Vec<i32> = c.filter().map(|f| f.samples().collect()).unwrap_or_default();
    assert_eq!(before, after);

    bus.set_be(reg::RESULT_DISTANCE, &410u16.to_be_bytes());
    match c.poll_once() {
        PollOutcome::Measurement(m) => assert_eq!((m.raw_mm, m.output_mm), (410, 400)),
        other => panic!("expected measurement, got {other:?}"),
    }
    assert_eq!(c.state(), ControllerState::Polling);
}

#[test]
fn sensor_without_fresh_data_produces_no_output() {
    let bus = booted_sensor(400);
    let (mut c, sink) = controller(&bus, Some(25));
    assert!(c.initialize().is_ready());
    let lines = sink.lines().len();
    // Invert the ready bit for the post-upload active-low polarity.
    bus.set(reg::GPIO_TIO_HV_STATUS, 0x03);
    for _ in 0..10 {
        assert_eq!(c.poll_once(), PollOutcome::NotReady);
    }
    assert_eq!(sink.lines().len(), lines);
    assert_eq!(c.filter().map(|f| f.len()), Some(0));
}
