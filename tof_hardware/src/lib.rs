//! Bus adapters, the big-endian register transport and the VL53L4ED driver.
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]

pub mod bus;
pub mod error;
pub mod sim;
pub mod transport;
pub mod vl53l4ed;

pub use bus::{EmbeddedHalBus, SharedBus};
#[cfg(all(feature = "hardware", target_os = "linux"))]
pub use bus::LinuxI2c;
pub use error::HwError;
pub use sim::{RegisterMapBus, SimProfile, SimulatedTof};
pub use transport::RegisterTransport;
pub use vl53l4ed::Vl53l4ed;
