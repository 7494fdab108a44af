#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schema for the range acquisition service.
//!
//! Every section is optional and falls back to the defaults of the reference
//! deployment (sensor at 0x29, 10 ms timing budget, 100 ms polling period,
//! 25-sample median). `Config::validate` rejects values the driver or the
//! acquisition loop cannot honour.
use serde::Deserialize;

/// Timing budgets the sensor accepts, in milliseconds.
pub const TIMING_BUDGET_RANGE_MS: std::ops::RangeInclusive<u32> = 10..=200;

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SensorCfg {
    /// Device address; only the low byte goes on the bus.
    pub address: u16,
    /// Linux i2c bus index (`/dev/i2c-N`), hardware builds only.
    pub bus: u8,
    pub timing_budget_ms: u32,
    /// 0 selects continuous ranging; otherwise must exceed the timing budget.
    pub inter_measurement_ms: u32,
}

impl Default for SensorCfg {
    fn default() -> Self {
        Self {
            address: 0x29,
            bus: 1,
            timing_budget_ms: 10,
            inter_measurement_ms: 0,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct AcquisitionCfg {
    pub period_ms: u64,
    /// Stop after this many polling periods; 0 runs until interrupted.
    pub max_periods: u64,
}

impl Default for AcquisitionCfg {
    fn default() -> Self {
        Self {
            period_ms: 100,
            max_periods: 0,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct FilterCfg {
    pub enabled: bool,
    pub median_window: usize,
}

impl Default for FilterCfg {
    fn default() -> Self {
        Self {
            enabled: true,
            median_window: 25,
        }
    }
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct Logging {
    pub file: Option<String>,  // path to .log (JSON lines)
    pub level: Option<String>, // "info","debug"
    /// Log rotation policy: "never" | "daily" | "hourly" (default: never)
    pub rotation: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct RunnerCfg {
    /// Request SCHED_FIFO and locked memory for the polling thread (Linux).
    pub rt: bool,
    pub rt_prio: i32,
}

impl Default for RunnerCfg {
    fn default() -> Self {
        Self {
            rt: false,
            rt_prio: 10,
        }
    }
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub sensor: SensorCfg,
    #[serde(default)]
    pub acquisition: AcquisitionCfg,
    #[serde(default)]
    pub filter: FilterCfg,
    #[serde(default)]
    pub logging: Logging,
    #[serde(default)]
    pub runner: RunnerCfg,
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

/// Read, parse and validate a config file.
pub fn load_file(path: &std::path::Path) -> eyre::Result<Config> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| eyre::eyre!("failed to read config {}: {e}", path.display()))?;
    let cfg = load_toml(&text).map_err(|e| eyre::eyre!("invalid config {}: {e}", path.display()))?;
    cfg.validate()?;
    Ok(cfg)
}

impl Config {
    pub fn validate(&self) -> eyre::Result<()> {
        // Sensor
        let bus_address = self.sensor.address & 0x00FF;
        if !(0x08..=0x77).contains(&bus_address) {
            eyre::bail!("sensor.address low byte must be a 7-bit address in 0x08..=0x77");
        }
        if !TIMING_BUDGET_RANGE_MS.contains(&self.sensor.timing_budget_ms) {
            eyre::bail!("sensor.timing_budget_ms must be in [10, 200]");
        }
        if self.sensor.inter_measurement_ms != 0
            && self.sensor.inter_measurement_ms <= self.sensor.timing_budget_ms
        {
            eyre::bail!(
                "sensor.inter_measurement_ms must be 0 or greater than sensor.timing_budget_ms"
            );
        }

        // Acquisition
        if self.acquisition.period_ms == 0 {
            eyre::bail!("acquisition.period_ms must be >= 1");
        }
        if self.acquisition.period_ms > 60_000 {
            eyre::bail!("acquisition.period_ms is unreasonably large (>60s)");
        }

        // Filter
        if self.filter.median_window == 0 {
            eyre::bail!("filter.median_window must be >= 1");
        }

        // Logging
        if let Some(rot) = self.logging.rotation.as_deref()
            && !matches!(rot, "never" | "daily" | "hourly")
        {
            eyre::bail!("logging.rotation must be one of never|daily|hourly");
        }

        // Runner
        if self.runner.rt && !(1..=99).contains(&self.runner.rt_prio) {
            eyre::bail!("runner.rt_prio must be in [1, 99]");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_reference_defaults() {
        let cfg = load_toml("").expect("parse");
        assert_eq!(cfg.sensor.address, 0x29);
        assert_eq!(cfg.sensor.timing_budget_ms, 10);
        assert_eq!(cfg.acquisition.period_ms, 100);
        assert!(cfg.filter.enabled);
        assert_eq!(cfg.filter.median_window, 25);
        cfg.validate().expect("defaults are valid");
    }

    #[test]
    fn hex_addresses_parse() {
        let cfg = load_toml("[sensor]\naddress = 0x52\n").expect("parse");
        assert_eq!(cfg.sensor.address, 0x52);
    }
}
