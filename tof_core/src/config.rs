//! Runtime settings for the acquisition controller and runner.
//!
//! Separate from the TOML-deserialized config in `tof_config`; see
//! `conversions` for the mapping.
use tof_traits::DeviceAddress;

/// Sensor bring-up parameters passed to the ranging driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SensorSettings {
    pub address: DeviceAddress,
    pub timing_budget_ms: u32,
    /// 0 = continuous ranging.
    pub inter_measurement_ms: u32,
}

impl Default for SensorSettings {
    fn default() -> Self {
        Self {
            address: DeviceAddress(0x29),
            timing_budget_ms: 10,
            inter_measurement_ms: 0,
        }
    }
}

/// Median smoothing; `None` window means raw distances are reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterSettings {
    pub median_window: Option<usize>,
}

impl Default for FilterSettings {
    fn default() -> Self {
        Self {
            median_window: Some(25),
        }
    }
}

/// Polling schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunConfig {
    pub period_ms: u64,
    /// 0 = until shutdown.
    pub max_periods: u64,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            period_ms: 100,
            max_periods: 0,
        }
    }
}
