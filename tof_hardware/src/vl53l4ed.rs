//! Register-level VL53L4ED driver on top of [`RegisterTransport`].
//!
//! Implements the sequence of the vendor's ultra-lite driver: boot wait,
//! default configuration upload, VHV calibration, range timing, and the
//! polled data-ready / result / interrupt-clear cycle.
use tof_traits::{BoxError, Clock, DeviceAddress, I2cBus, RangingDriver, RangingResult};
use tracing::{debug, info};

use crate::error::{HwError, Result};
use crate::transport::RegisterTransport;

/// Default 7-bit bus address.
pub const DEFAULT_ADDRESS: DeviceAddress = DeviceAddress(0x29);

/// Register map (subset used by this driver).
pub mod reg {
    pub const OSC_FREQUENCY: u16 = 0x0006;
    pub const VHV_CONFIG_TIMEOUT_MACROP_LOOP_BOUND: u16 = 0x0008;
    pub const GPIO_HV_MUX_CTRL: u16 = 0x0030;
    pub const GPIO_TIO_HV_STATUS: u16 = 0x0031;
    pub const RANGE_CONFIG_A: u16 = 0x005E;
    pub const RANGE_CONFIG_B: u16 = 0x0061;
    pub const INTERMEASUREMENT_MS: u16 = 0x006C;
    pub const SYSTEM_INTERRUPT_CLEAR: u16 = 0x0086;
    pub const SYSTEM_START: u16 = 0x0087;
    pub const RESULT_RANGE_STATUS: u16 = 0x0089;
    pub const RESULT_SPAD_NB: u16 = 0x008C;
    pub const RESULT_SIGNAL_RATE: u16 = 0x008E;
    pub const RESULT_AMBIENT_RATE: u16 = 0x0090;
    pub const RESULT_SIGMA: u16 = 0x0092;
    pub const RESULT_DISTANCE: u16 = 0x0096;
    pub const RESULT_OSC_CALIBRATE_VAL: u16 = 0x00DE;
    pub const FIRMWARE_SYSTEM_STATUS: u16 = 0x00E5;
    pub const IDENTIFICATION_MODEL_ID: u16 = 0x010F;
}

/// First register written by the default configuration upload.
const DEFAULT_CONFIG_START: u16 = 0x002D;

/// Default configuration, registers 0x2D..=0x87.
const DEFAULT_CONFIGURATION: [u8; 91] = [
    0x00, 0x00, 0x00, 0x11, 0x02, 0x00, 0x02, 0x08, // 0x2d
    0x00, 0x08, 0x10, 0x01, 0x01, 0x00, 0x00, 0x00, // 0x35
    0x00, 0xff, 0x00, 0x0f, 0x00, 0x00, 0x00, 0x00, // 0x3d
    0x00, 0x20, 0x0b, 0x00, 0x00, 0x02, 0x14, 0x21, // 0x45
    0x00, 0x00, 0x05, 0x00, 0x00, 0x00, 0x00, 0xc8, // 0x4d
    0x00, 0x00, 0x38, 0xff, 0x01, 0x00, 0x08, 0x00, // 0x55
    0x00, 0x00, 0x01, 0x07, 0x00, 0x02, 0x05, 0x00, // 0x5d
    0xb4, 0x00, 0xbb, 0x08, 0x38, 0x00, 0x00, 0x00, // 0x65
    0x00, 0x0f, 0x89, 0x00, 0x00, 0x00, 0x00, 0x00, // 0x6d
    0x00, 0x00, 0x01, 0x07, 0x05, 0x06, 0x06, 0x00, // 0x75
    0x00, 0x02, 0xc7, 0xff, 0x9b, 0x00, 0x00, 0x00, // 0x7d
    0x01, 0x00, 0x00, // 0x85
];

/// Raw range status (low 5 bits) to the documented status code.
const STATUS_RTN: [u8; 24] = [
    255, 255, 255, 5, 2, 4, 1, 7, 3, 0, 255, 255, 9, 13, 255, 255, 255, 255, 10, 6, 255, 255, 11,
    12,
];

const BOOTED: u8 = 0x03;
const POLL_ATTEMPTS: u16 = 1000;
const TIMING_BUDGET_MS: core::ops::RangeInclusive<u32> = 10..=200;

pub struct Vl53l4ed<B, C> {
    transport: RegisterTransport<B, C>,
    dev: DeviceAddress,
}

impl<B: I2cBus, C: Clock> Vl53l4ed<B, C> {
    pub fn new(transport: RegisterTransport<B, C>, dev: DeviceAddress) -> Self {
        Self { transport, dev }
    }

    pub fn address(&self) -> DeviceAddress {
        self.dev
    }

    pub fn into_transport(self) -> RegisterTransport<B, C> {
        self.transport
    }

    pub fn sensor_id(&mut self) -> Result<u16> {
        self.transport.read16(self.dev, reg::IDENTIFICATION_MODEL_ID)
    }

    pub fn stop_ranging(&mut self) -> Result<()> {
        self.transport.write8(self.dev, reg::SYSTEM_START, 0x00)
    }

    fn init_sequence(&mut self) -> Result<()> {
        self.poll_until("boot", |s| {
            Ok(s.transport.read8(s.dev, reg::FIRMWARE_SYSTEM_STATUS)? == BOOTED)
        })?;
        debug!(dev = %self.dev, "sensor booted");

        for (i, &value) in DEFAULT_CONFIGURATION.iter().enumerate() {
            let r = DEFAULT_CONFIG_START + i as u16;
            self.transport.write8(self.dev, r, value)?;
        }

        // VHV calibration: one throwaway measurement.
        self.transport.write8(self.dev, reg::SYSTEM_START, 0x40)?;
        self.poll_until("vhv data ready", |s| s.data_ready())?;
        self.clear()?;
        self.stop_ranging()?;
        self.transport
            .write8(self.dev, reg::VHV_CONFIG_TIMEOUT_MACROP_LOOP_BOUND, 0x09)?;
        self.transport.write8(self.dev, 0x000B, 0x00)?;
        self.transport.write16(self.dev, 0x0024, 0x0500)?;
        self.range_timing(50, 0)
    }

    fn range_timing(&mut self, timing_budget_ms: u32, inter_measurement_ms: u32) -> Result<()> {
        if !TIMING_BUDGET_MS.contains(&timing_budget_ms) {
            return Err(HwError::InvalidArgument("timing budget must be 10..=200 ms"));
        }
        let osc_frequency = self.transport.read16(self.dev, reg::OSC_FREQUENCY)?;
        if osc_frequency == 0 {
            return Err(HwError::InvalidArgument("oscillator frequency reads as zero"));
        }
        let macro_period_us = (2304 * (0x4000_0000u64 / u64::from(osc_frequency))) >> 6;
        let mut budget_us = u64::from(timing_budget_ms) * 1000;

        if inter_measurement_ms == 0 {
            // continuous
            self.transport.write32(self.dev, reg::INTERMEASUREMENT_MS, 0)?;
            budget_us -= 2500;
        } else if inter_measurement_ms > timing_budget_ms {
            // autonomous low power
            let clock_pll =
                self.transport.read16(self.dev, reg::RESULT_OSC_CALIBRATE_VAL)? & 0x03FF;
            let period = 1.055f64 * f64::from(inter_measurement_ms) * f64::from(clock_pll);
            self.transport
                .write32(self.dev, reg::INTERMEASUREMENT_MS, period as u32)?;
            budget_us = (budget_us - 4300) / 2;
        } else {
            return Err(HwError::InvalidArgument(
                "inter-measurement must be 0 or longer than the timing budget",
            ));
        }

        let a = encode_range_config(budget_us, macro_period_us, 16)?;
        self.transport.write16(self.dev, reg::RANGE_CONFIG_A, a)?;
        let b = encode_range_config(budget_us, macro_period_us, 12)?;
        self.transport.write16(self.dev, reg::RANGE_CONFIG_B, b)?;
        debug!(timing_budget_ms, inter_measurement_ms, a, b, "range timing set");
        Ok(())
    }

    fn data_ready(&mut self) -> Result<bool> {
        let mux = self.transport.read8(self.dev, reg::GPIO_HV_MUX_CTRL)?;
        let polarity = u8::from((mux & 0x10) >> 4 != 1);
        let status = self.transport.read8(self.dev, reg::GPIO_TIO_HV_STATUS)?;
        Ok(status & 0x01 == polarity)
    }

    fn clear(&mut self) -> Result<()> {
        self.transport
            .write8(self.dev, reg::SYSTEM_INTERRUPT_CLEAR, 0x01)
    }

    fn read_result(&mut self) -> Result<RangingResult> {
        let raw_status = self.transport.read8(self.dev, reg::RESULT_RANGE_STATUS)? & 0x1F;
        let range_status = STATUS_RTN
            .get(usize::from(raw_status))
            .copied()
            .unwrap_or(raw_status);
        let spads = self.transport.read16(self.dev, reg::RESULT_SPAD_NB)? / 256;
        let signal_kcps = self
            .transport
            .read16(self.dev, reg::RESULT_SIGNAL_RATE)?
            .saturating_mul(8);
        let ambient_kcps = self
            .transport
            .read16(self.dev, reg::RESULT_AMBIENT_RATE)?
            .saturating_mul(8);
        let sigma_mm = self.transport.read16(self.dev, reg::RESULT_SIGMA)? / 4;
        let distance_mm = self.transport.read16(self.dev, reg::RESULT_DISTANCE)?;
        tracing::trace!(range_status, spads, distance_mm, "raw result");
        Ok(RangingResult {
            data_ready: true,
            range_status,
            distance_mm,
            sigma_mm,
            signal_kcps,
            ambient_kcps,
        })
    }

    /// Re-check `done` every millisecond, up to `POLL_ATTEMPTS` times.
    fn poll_until(
        &mut self,
        what: &'static str,
        mut done: impl FnMut(&mut Self) -> Result<bool>,
    ) -> Result<()> {
        for _ in 0..POLL_ATTEMPTS {
            if done(self)? {
                return Ok(());
            }
            self.transport.wait_ms(self.dev, 1)?;
        }
        Err(HwError::Timeout(what))
    }
}

/// Encode a timing budget into the RANGE_CONFIG mantissa/exponent word.
fn encode_range_config(budget_us: u64, macro_period_us: u64, factor: u64) -> Result<u16> {
    let step = (macro_period_us * factor) >> 6;
    if step == 0 {
        return Err(HwError::InvalidArgument("macro period too short"));
    }
    let shifted = budget_us << 12;
    let mut ls = ((shifted + (step >> 1)) / step).saturating_sub(1);
    let mut ms: u16 = 0;
    while ls & !0xFF != 0 {
        ls >>= 1;
        ms += 1;
    }
    Ok((ms << 8) + (ls & 0xFF) as u16)
}

impl<B: I2cBus, C: Clock> RangingDriver for Vl53l4ed<B, C> {
    fn init_bus(&mut self) -> std::result::Result<(), BoxError> {
        Ok(self.transport.init_transport()?)
    }

    fn sensor_init(&mut self) -> std::result::Result<(), BoxError> {
        self.init_sequence()?;
        info!(dev = %self.dev, "VL53L4ED initialized");
        Ok(())
    }

    fn set_range_timing(
        &mut self,
        timing_budget_ms: u32,
        inter_measurement_ms: u32,
    ) -> std::result::Result<(), BoxError> {
        Ok(self.range_timing(timing_budget_ms, inter_measurement_ms)?)
    }

    fn start_ranging(&mut self) -> std::result::Result<(), BoxError> {
        let inter = self.transport.read32(self.dev, reg::INTERMEASUREMENT_MS)?;
        let mode = if inter == 0 { 0x21 } else { 0x40 };
        self.transport.write8(self.dev, reg::SYSTEM_START, mode)?;
        // The first sample after start is discarded.
        self.poll_until("first sample", |s| s.data_ready())?;
        self.clear()?;
        Ok(())
    }

    fn check_data_ready(&mut self) -> std::result::Result<bool, BoxError> {
        Ok(self.data_ready()?)
    }

    fn get_result(&mut self) -> std::result::Result<RangingResult, BoxError> {
        Ok(self.read_result()?)
    }

    fn clear_interrupt(&mut self) -> std::result::Result<(), BoxError> {
        Ok(self.clear()?)
    }
}
