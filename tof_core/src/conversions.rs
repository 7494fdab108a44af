//! `From` implementations bridging `tof_config` types to `tof_core` types.

use tof_traits::DeviceAddress;

use crate::config::{FilterSettings, RunConfig, SensorSettings};

impl From<&tof_config::SensorCfg> for SensorSettings {
    fn from(c: &tof_config::SensorCfg) -> Self {
        Self {
            address: DeviceAddress(c.address),
            timing_budget_ms: c.timing_budget_ms,
            inter_measurement_ms: c.inter_measurement_ms,
        }
    }
}

impl From<&tof_config::FilterCfg> for FilterSettings {
    fn from(c: &tof_config::FilterCfg) -> Self {
        Self {
            median_window: c.enabled.then_some(c.median_window),
        }
    }
}

impl From<&tof_config::AcquisitionCfg> for RunConfig {
    fn from(c: &tof_config::AcquisitionCfg) -> Self {
        Self {
            period_ms: c.period_ms,
            max_periods: c.max_periods,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_filter_maps_to_no_window() {
        let cfg = tof_config::load_toml("[filter]\nenabled = false\nmedian_window = 9")
            .expect("parse");
        assert_eq!(FilterSettings::from(&cfg.filter).median_window, None);
        let cfg = tof_config::load_toml("").expect("parse");
        assert_eq!(FilterSettings::from(&cfg.filter).median_window, Some(25));
        assert_eq!(SensorSettings::from(&cfg.sensor), SensorSettings::default());
        assert_eq!(RunConfig::from(&cfg.acquisition), RunConfig::default());
    }
}
