use thiserror::Error;

#[derive(Debug, Error)]
pub enum HwError {
    /// The bus moved a different number of bytes than the operation needed,
    /// or the peripheral reported an error. Deliberately carries no detail.
    #[error("i2c transfer failed")]
    Transfer,
    #[error("transport used before init_transport")]
    NotInitialized,
    #[error("init_transport called more than once")]
    AlreadyInitialized,
    #[error("sensor timeout: {0}")]
    Timeout(&'static str),
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, HwError>;
