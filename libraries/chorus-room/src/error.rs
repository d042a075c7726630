/// Room synchronization errors
use thiserror::Error;

/// Result type alias using `RoomError`
pub type Result<T> = std::result::Result<T, RoomError>;

/// Room error types
#[derive(Error, Debug)]
pub enum RoomError {
    /// Mirror store read/write/subscribe failure
    #[error("Mirror store error: {0}")]
    Mirror(String),

    /// Error from the core crate
    #[error(transparent)]
    Core(#[from] chorus_core::ChorusError),
}

impl RoomError {
    /// Create a mirror store error
    pub fn mirror(msg: impl Into<String>) -> Self {
        Self::Mirror(msg.into())
    }
}
