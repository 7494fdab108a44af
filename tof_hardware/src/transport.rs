//! Register transport: 16-bit register addressing over the bus primitive.
//!
//! Every multi-byte field is big-endian on the wire. The register address
//! always goes out as two bytes, high byte first, followed by the value bytes
//! for writes. Reads are one combined write-then-read transaction.
use std::time::Duration;

use tof_traits::{Clock, DeviceAddress, I2cBus};
use tracing::{debug, trace};

use crate::error::{HwError, Result};

/// Largest payload a single register write carries (a 32-bit value).
const MAX_VALUE_BYTES: usize = 4;

pub struct RegisterTransport<B, C> {
    bus: B,
    clock: C,
    initialized: bool,
}

impl<B: I2cBus, C: Clock> RegisterTransport<B, C> {
    pub fn new(bus: B, clock: C) -> Self {
        Self {
            bus,
            clock,
            initialized: false,
        }
    }

    /// One-time peripheral setup. A second call is rejected without touching
    /// the bus.
    pub fn init_transport(&mut self) -> Result<()> {
        if self.initialized {
            return Err(HwError::AlreadyInitialized);
        }
        self.bus.init().map_err(|e| {
            debug!(error = %e, "bus init failed");
            HwError::Transfer
        })?;
        self.initialized = true;
        debug!("register transport initialized");
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn read8(&mut self, dev: DeviceAddress, reg: u16) -> Result<u8> {
        let mut rx = [0u8; 1];
        self.read_into(dev, reg, &mut rx)?;
        Ok(rx[0])
    }

    pub fn read16(&mut self, dev: DeviceAddress, reg: u16) -> Result<u16> {
        let mut rx = [0u8; 2];
        self.read_into(dev, reg, &mut rx)?;
        Ok(u16::from_be_bytes(rx))
    }

    pub fn read32(&mut self, dev: DeviceAddress, reg: u16) -> Result<u32> {
        let mut rx = [0u8; 4];
        self.read_into(dev, reg, &mut rx)?;
        Ok(u32::from_be_bytes(rx))
    }

    pub fn write8(&mut self, dev: DeviceAddress, reg: u16, value: u8) -> Result<()> {
        self.write_from(dev, reg, &[value])
    }

    pub fn write16(&mut self, dev: DeviceAddress, reg: u16, value: u16) -> Result<()> {
        self.write_from(dev, reg, &value.to_be_bytes())
    }

    pub fn write32(&mut self, dev: DeviceAddress, reg: u16, value: u32) -> Result<()> {
        self.write_from(dev, reg, &value.to_be_bytes())
    }

    /// Suspend the caller for at least `ms` milliseconds. No bus traffic.
    pub fn wait_ms(&mut self, _dev: DeviceAddress, ms: u32) -> Result<()> {
        self.clock.sleep(Duration::from_millis(u64::from(ms)));
        Ok(())
    }

    /// Borrow the injected clock (drivers use it for bounded polling).
    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Give back the bus handle, e.g. to inspect a simulated device in tests.
    pub fn into_inner(self) -> (B, C) {
        (self.bus, self.clock)
    }

    fn read_into(&mut self, dev: DeviceAddress, reg: u16, rx: &mut [u8]) -> Result<()> {
        self.ensure_initialized()?;
        let tx = reg.to_be_bytes();
        let got = self
            .bus
            .write_read(dev.bus_address(), &tx, rx)
            .map_err(|e| {
                debug!(%dev, reg, error = %e, "register read failed on bus");
                HwError::Transfer
            })?;
        if got != rx.len() {
            debug!(%dev, reg, expected = rx.len(), got, "short register read");
            return Err(HwError::Transfer);
        }
        trace!(%dev, reg, bytes = ?rx, "register read");
        Ok(())
    }

    fn write_from(&mut self, dev: DeviceAddress, reg: u16, value: &[u8]) -> Result<()> {
        self.ensure_initialized()?;
        debug_assert!(value.len() <= MAX_VALUE_BYTES);
        let mut frame = [0u8; 2 + MAX_VALUE_BYTES];
        frame[..2].copy_from_slice(&reg.to_be_bytes());
        frame[2..2 + value.len()].copy_from_slice(value);
        let frame = &frame[..2 + value.len()];

        let sent = self.bus.write(dev.bus_address(), frame).map_err(|e| {
            debug!(%dev, reg, error = %e, "register write failed on bus");
            HwError::Transfer
        })?;
        if sent != frame.len() {
            debug!(%dev, reg, expected = frame.len(), sent, "short register write");
            return Err(HwError::Transfer);
        }
        trace!(%dev, reg, bytes = ?frame, "register write");
        Ok(())
    }

    #[inline]
    fn ensure_initialized(&self) -> Result<()> {
        if self.initialized {
            Ok(())
        } else {
            Err(HwError::NotInitialized)
        }
    }
}
