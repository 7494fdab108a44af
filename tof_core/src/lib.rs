#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::missing_errors_doc,
    clippy::cast_possible_truncation
)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Range acquisition logic (hardware-agnostic).
//!
//! All sensor interaction goes through `tof_traits::RangingDriver`.
//!
//! ## Architecture
//!
//! - **Controller**: init-once / poll-per-period state machine with a
//!   terminal `Halted` state (`controller` module)
//! - **Filtering**: fixed-window running median (`median` module)
//! - **Reporting**: status lines to console, file or memory (`sink` module)
//! - **Scheduling**: fixed-rate loop with shutdown flag (`runner` module)
//! - **Configuration**: runtime settings mapped from `tof_config`

pub mod config;
pub mod controller;
pub mod conversions;
pub mod error;
pub mod hw_error;
pub mod median;
pub mod mocks;
pub mod runner;
pub mod sink;
pub mod status;
pub mod util;

pub use config::{FilterSettings, RunConfig, SensorSettings};
pub use controller::AcquisitionController;
pub use error::{RangerError, Report, Result};
pub use median::MedianFilter;
pub use runner::{RunSummary, run};
pub use sink::{ConsoleSink, FileSink, RecordingSink, StatusLine, StatusSink};
pub use status::{ControllerState, InitOutcome, Measurement, PollOutcome};
