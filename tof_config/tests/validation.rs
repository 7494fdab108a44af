use rstest::rstest;
use std::io::Write;
use tof_config::{load_file, load_toml};

const FULL: &str = r#"
[sensor]
address = 0x29
bus = 1
timing_budget_ms = 10
inter_measurement_ms = 0

[acquisition]
period_ms = 100
max_periods = 50

[filter]
enabled = true
median_window = 25

[logging]
file = "tof.log"
level = "debug"
rotation = "daily"

[runner]
rt = false
rt_prio = 10
"#;

#[test]
fn accepts_full_reference_config() {
    let cfg = load_toml(FULL).expect("parse TOML");
    cfg.validate().expect("valid");
    assert_eq!(cfg.acquisition.max_periods, 50);
    assert_eq!(cfg.logging.rotation.as_deref(), Some("daily"));
}

#[rstest]
#[case("[sensor]\ntiming_budget_ms = 5", "timing_budget_ms must be in [10, 200]")]
#[case("[sensor]\ntiming_budget_ms = 201", "timing_budget_ms must be in [10, 200]")]
#[case(
    "[sensor]\ntiming_budget_ms = 50\ninter_measurement_ms = 20",
    "inter_measurement_ms must be 0 or greater"
)]
#[case("[sensor]\naddress = 0x0100", "7-bit address")]
#[case("[sensor]\naddress = 0x7F", "7-bit address")]
#[case("[acquisition]\nperiod_ms = 0", "period_ms must be >= 1")]
#[case("[acquisition]\nperiod_ms = 600000", "unreasonably large")]
#[case("[filter]\nmedian_window = 0", "median_window must be >= 1")]
#[case("[logging]\nrotation = \"weekly\"", "never|daily|hourly")]
#[case("[runner]\nrt = true\nrt_prio = 0", "rt_prio must be in [1, 99]")]
fn rejects_out_of_range_values(#[case] toml: &str, #[case] needle: &str) {
    let cfg = load_toml(toml).expect("parse TOML");
    let err = cfg.validate().expect_err("should reject");
    assert!(
        err.to_string().contains(needle),
        "expected '{needle}' in '{err}'"
    );
}

#[test]
fn upper_address_byte_is_ignored_by_validation() {
    let cfg = load_toml("[sensor]\naddress = 0x1229").expect("parse TOML");
    cfg.validate().expect("low byte 0x29 is valid");
}

#[test]
fn autonomous_mode_needs_longer_inter_measurement() {
    let cfg = load_toml("[sensor]\ntiming_budget_ms = 20\ninter_measurement_ms = 100")
        .expect("parse TOML");
    cfg.validate().expect("valid autonomous timing");
}

#[test]
fn unknown_sections_are_rejected() {
    assert!(load_toml("[display]\nbrightness = 5").is_err());
}

#[test]
fn load_file_reports_path_on_parse_error() {
    let mut f = tempfile::NamedTempFile::new().expect("tempfile");
    writeln!(f, "[sensor]\naddress = \"oops\"").expect("write");
    let err = load_file(f.path()).expect_err("bad type");
    assert!(err.to_string().contains("invalid config"));
}

#[test]
fn load_file_validates() {
    let mut f = tempfile::NamedTempFile::new().expect("tempfile");
    writeln!(f, "[filter]\nmedian_window = 0").expect("write");
    let err = load_file(f.path()).expect_err("invalid window");
    assert!(err.to_string().contains("median_window"));
}
