//! Error types for the detector.

use thiserror::Error;

/// Error type for detector setup and shutdown.
#[derive(Debug, Error)]
pub enum DetectorError {
    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(#[from] mdparb_config::ConfigError),

    /// Arbitration setup error.
    #[error("arbitration error: {0}")]
    Arbitration(#[from] mdparb_arbitration::ArbitrationError),

    /// Transport error.
    #[error("transport error: {0}")]
    Transport(#[from] mdparb_transport::TransportError),

    /// No channels to monitor.
    #[error("no channels selected")]
    NoChannels,

    /// Invalid runtime setting.
    #[error("invalid detector configuration: {message}")]
    InvalidConfig {
        /// Error message.
        message: String,
    },

    /// Same channel listed twice.
    #[error("channel {channel} selected twice")]
    DuplicateChannel {
        /// Channel id.
        channel: u32,
    },
}

impl DetectorError {
    /// Creates an invalid configuration error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }
}
