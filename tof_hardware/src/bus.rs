//! Bus primitive adapters.
//!
//! - `EmbeddedHalBus`: any `embedded_hal::i2c::I2c` implementation.
//! - `SharedBus`: one physical bus handed to several sensors; every
//!   transaction holds the lock for its whole duration.
//! - `LinuxI2c` (feature `hardware`): `/dev/i2c-N` through `rppal`.
use std::sync::{Arc, Mutex};

use embedded_hal::i2c::{I2c, SevenBitAddress};
use tof_traits::{BoxError, I2cBus};

/// Wraps an embedded-hal I2C peripheral. embedded-hal transfers are all or
/// nothing, so success always reports the full byte count.
pub struct EmbeddedHalBus<I> {
    i2c: I,
}

impl<I> EmbeddedHalBus<I> {
    pub fn new(i2c: I) -> Self {
        Self { i2c }
    }

    pub fn release(self) -> I {
        self.i2c
    }
}

impl<I> I2cBus for EmbeddedHalBus<I>
where
    I: I2c<SevenBitAddress>,
    I::Error: core::fmt::Debug,
{
    fn write(&mut self, address: u8, bytes: &[u8]) -> Result<usize, BoxError> {
        self.i2c
            .write(address, bytes)
            .map_err(|e| format!("i2c write: {e:?}"))?;
        Ok(bytes.len())
    }

    fn write_read(
        &mut self,
        address: u8,
        out: &[u8],
        input: &mut [u8],
    ) -> Result<usize, BoxError> {
        self.i2c
            .write_read(address, out, input)
            .map_err(|e| format!("i2c write_read: {e:?}"))?;
        Ok(input.len())
    }
}

/// Cloneable handle to a bus shared between sensors.
pub struct SharedBus<B> {
    inner: Arc<Mutex<B>>,
}

impl<B> Clone for SharedBus<B> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<B: I2cBus> SharedBus<B> {
    pub fn new(bus: B) -> Self {
        Self {
            inner: Arc::new(Mutex::new(bus)),
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, B>, BoxError> {
        self.inner
            .lock()
            .map_err(|_| "shared i2c bus lock poisoned".into())
    }
}

impl<B: I2cBus> I2cBus for SharedBus<B> {
    /// Peripheral setup happens once per physical bus, so the shared handle
    /// leaves `init` to whoever constructed the bus.
    fn init(&mut self) -> Result<(), BoxError> {
        Ok(())
    }

    fn write(&mut self, address: u8, bytes: &[u8]) -> Result<usize, BoxError> {
        self.lock()?.write(address, bytes)
    }

    fn write_read(
        &mut self,
        address: u8,
        out: &[u8],
        input: &mut [u8],
    ) -> Result<usize, BoxError> {
        self.lock()?.write_read(address, out, input)
    }
}

#[cfg(all(feature = "hardware", target_os = "linux"))]
pub use linux::LinuxI2c;

#[cfg(all(feature = "hardware", target_os = "linux"))]
mod linux {
    use rppal::i2c::I2c;
    use tof_traits::{BoxError, I2cBus};
    use tracing::info;

    /// Linux i2c-dev bus. The adapter is opened lazily in `init` so
    /// construction never touches the device node.
    pub struct LinuxI2c {
        bus: u8,
        i2c: Option<I2c>,
        current_address: Option<u8>,
    }

    impl LinuxI2c {
        pub fn new(bus: u8) -> Self {
            Self {
                bus,
                i2c: None,
                current_address: None,
            }
        }

        fn select(&mut self, address: u8) -> Result<&mut I2c, BoxError> {
            let i2c = self.i2c.as_mut().ok_or("i2c bus not opened")?;
            if self.current_address != Some(address) {
                i2c.set_slave_address(u16::from(address))?;
                self.current_address = Some(address);
            }
            Ok(i2c)
        }
    }

    impl I2cBus for LinuxI2c {
        fn init(&mut self) -> Result<(), BoxError> {
            let i2c = I2c::with_bus(self.bus)?;
            info!(bus = self.bus, "opened i2c bus");
            self.i2c = Some(i2c);
            self.current_address = None;
            Ok(())
        }

        fn write(&mut self, address: u8, bytes: &[u8]) -> Result<usize, BoxError> {
            let i2c = self.select(address)?;
            Ok(i2c.write(bytes)?)
        }

        fn write_read(
            &mut self,
            address: u8,
            out: &[u8],
            input: &mut [u8],
        ) -> Result<usize, BoxError> {
            let i2c = self.select(address)?;
            i2c.write_read(out, input)?;
            Ok(input.len())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::RegisterMapBus;
    use embedded_hal_mock::eh1::i2c::{Mock as I2cMock, Transaction as I2cTransaction};

    #[test]
    fn embedded_hal_adapter_reports_full_counts() {
        let expectations = [
            I2cTransaction::write(0x29, vec![0x00, 0x87, 0x40]),
            I2cTransaction::write_read(0x29, vec![0x01, 0x0F], vec![0xEB, 0xAA]),
        ];
        let mut bus = EmbeddedHalBus::new(I2cMock::new(&expectations));
        assert_eq!(bus.write(0x29, &[0x00, 0x87, 0x40]).unwrap(), 3);
        let mut rx = [0u8; 2];
        assert_eq!(bus.write_read(0x29, &[0x01, 0x0F], &mut rx).unwrap(), 2);
        assert_eq!(rx, [0xEB, 0xAA]);
        bus.release().done();
    }

    #[test]
    fn shared_handles_drive_the_same_device() {
        let device = RegisterMapBus::new(0x29);
        let a = SharedBus::new(device.clone());
        let mut b = a.clone();
        let mut a = a;
        a.write(0x29, &[0x00, 0x01, 0x11]).unwrap();
        let mut rx = [0u8; 1];
        b.write_read(0x29, &[0x00, 0x01], &mut rx).unwrap();
        assert_eq!(rx, [0x11]);
        assert_eq!(device.transaction_count(), 2);
    }
}
