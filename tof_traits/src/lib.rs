pub mod clock;

pub use clock::{Clock, MonotonicClock};

/// Error type used at every trait boundary in this workspace.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Identifier of a sensor on the bus.
///
/// Held as 16 bits to match the register-level driver API; only the low byte
/// is significant as the bus slave address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeviceAddress(pub u16);

impl DeviceAddress {
    /// Slave address placed on the wire (low 8 bits).
    #[inline]
    pub fn bus_address(self) -> u8 {
        (self.0 & 0x00FF) as u8
    }
}

impl From<u16> for DeviceAddress {
    fn from(v: u16) -> Self {
        Self(v)
    }
}

impl core::fmt::Display for DeviceAddress {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "0x{:02X}", self.bus_address())
    }
}

/// One measurement cycle's output from the sensor driver.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RangingResult {
    /// Set when the driver observed the data-ready latch before fetching.
    pub data_ready: bool,
    /// Remapped range status; 0 means a valid measurement.
    pub range_status: u8,
    pub distance_mm: u16,
    pub sigma_mm: u16,
    pub signal_kcps: u16,
    pub ambient_kcps: u16,
}

/// Half-duplex bus primitive.
///
/// Both transfers block until the peripheral is done and report how many bytes
/// actually moved. A count different from the request is a failed transfer.
pub trait I2cBus {
    /// One-time peripheral setup.
    fn init(&mut self) -> Result<(), BoxError> {
        Ok(())
    }
    fn write(&mut self, address: u8, bytes: &[u8]) -> Result<usize, BoxError>;
    /// Combined transaction: write `out`, repeated start, read `input.len()` bytes.
    fn write_read(&mut self, address: u8, out: &[u8], input: &mut [u8])
    -> Result<usize, BoxError>;
}

impl<B: I2cBus + ?Sized> I2cBus for Box<B> {
    fn init(&mut self) -> Result<(), BoxError> {
        (**self).init()
    }
    fn write(&mut self, address: u8, bytes: &[u8]) -> Result<usize, BoxError> {
        (**self).write(address, bytes)
    }
    fn write_read(
        &mut self,
        address: u8,
        out: &[u8],
        input: &mut [u8],
    ) -> Result<usize, BoxError> {
        (**self).write_read(address, out, input)
    }
}

/// The vendor ranging driver as seen by the acquisition controller.
///
/// Implementations own their transport and device address.
pub trait RangingDriver {
    /// Bring up the underlying bus peripheral. Called exactly once.
    fn init_bus(&mut self) -> Result<(), BoxError>;
    fn sensor_init(&mut self) -> Result<(), BoxError>;
    fn set_range_timing(
        &mut self,
        timing_budget_ms: u32,
        inter_measurement_ms: u32,
    ) -> Result<(), BoxError>;
    fn start_ranging(&mut self) -> Result<(), BoxError>;
    fn check_data_ready(&mut self) -> Result<bool, BoxError>;
    fn get_result(&mut self) -> Result<RangingResult, BoxError>;
    fn clear_interrupt(&mut self) -> Result<(), BoxError>;
}

impl<D: RangingDriver + ?Sized> RangingDriver for Box<D> {
    fn init_bus(&mut self) -> Result<(), BoxError> {
        (**self).init_bus()
    }
    fn sensor_init(&mut self) -> Result<(), BoxError> {
        (**self).sensor_init()
    }
    fn set_range_timing(
        &mut self,
        timing_budget_ms: u32,
        inter_measurement_ms: u32,
    ) -> Result<(), BoxError> {
        (**self).set_range_timing(timing_budget_ms, inter_measurement_ms)
    }
    fn start_ranging(&mut self) -> Result<(), BoxError> {
        (**self).start_ranging()
    }
    fn check_data_ready(&mut self) -> Result<bool, BoxError> {
        (**self).check_data_ready()
    }
    fn get_result(&mut self) -> Result<RangingResult, BoxError> {
        (**self).get_result()
    }
    fn clear_interrupt(&mut self) -> Result<(), BoxError> {
        (**self).clear_interrupt()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_low_byte_is_bus_address() {
        assert_eq!(DeviceAddress(0x0029).bus_address(), 0x29);
        assert_eq!(DeviceAddress(0xAB52).bus_address(), 0x52);
        assert_eq!(DeviceAddress(0x1200).to_string(), "0x00");
    }
}
