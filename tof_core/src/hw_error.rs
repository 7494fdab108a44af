//! Maps `Box<dyn Error>` from trait boundaries to typed `RangerError`.
//!
//! The traits in `tof_traits` use `Box<dyn Error + Send + Sync>`; this module
//! converts those to our typed error enum, with an optional feature-gated
//! path for `tof_hardware::HwError` downcasting.

use crate::error::RangerError;

/// Map a trait-boundary error to a typed `RangerError`.
///
/// Attempts to downcast known hardware error types first, then falls back
/// to string-based heuristics.
pub fn map_hw_error(e: &(dyn std::error::Error + 'static)) -> RangerError {
    #[cfg(feature = "hardware-errors")]
    {
        use tof_hardware::error::HwError;
        if let Some(hw) = e.downcast_ref::<HwError>() {
            return match hw {
                HwError::Timeout(_) => RangerError::Timeout,
                HwError::Transfer => RangerError::Hardware(hw.to_string()),
                other => RangerError::HardwareFault(other.to_string()),
            };
        }
    }

    let s = e.to_string();
    if s.to_lowercase().contains("timeout") {
        RangerError::Timeout
    } else {
        RangerError::Hardware(s)
    }
}
