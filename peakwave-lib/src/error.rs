use std::fmt::{Display, Formatter};

/// Error type for decoding, peak extraction and transport control.
///
/// Empty content is not an error: it is reported as
/// [`LoadOutcome::Empty`](crate::engine::LoadOutcome::Empty).
#[derive(Debug, Clone, PartialEq)]
pub enum WaveError {
    Io(String),
    Decode(String),
    InvalidParameter(String),
    InvalidState(String),
    Transport(String),
}

impl Display for WaveError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "io error: {}", err),
            Self::Decode(err) => write!(f, "decode error: {}", err),
            Self::InvalidParameter(err) => write!(f, "invalid parameter: {}", err),
            Self::InvalidState(err) => write!(f, "invalid state: {}", err),
            Self::Transport(err) => write!(f, "transport error: {}", err),
        }
    }
}

impl std::error::Error for WaveError {}

impl From<std::io::Error> for WaveError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value.to_string())
    }
}

impl From<symphonia::core::errors::Error> for WaveError {
    fn from(value: symphonia::core::errors::Error) -> Self {
        Self::Decode(value.to_string())
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, WaveError>;
