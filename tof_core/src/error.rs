use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RangerError {
    #[error("hardware error: {0}")]
    Hardware(String),
    #[error("hardware fault: {0}")]
    HardwareFault(String),
    #[error("timeout waiting for sensor")]
    Timeout,
    /// Initialization failed; the controller will not touch the bus again.
    #[error("sensor halted: {0}")]
    Halted(String),
    #[error("invalid state: {0}")]
    State(String),
    #[error("configuration error: {0}")]
    Config(String),
}

impl RangerError {
    /// Terminal errors end the acquisition run; everything else skips a period.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Halted(_) | Self::Config(_))
    }
}

pub type Result<T> = eyre::Result<T>;
pub use eyre::Report;
