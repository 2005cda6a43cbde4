//! Error types for transport operations.

use mdparb_core::FeedEndpoint;
use thiserror::Error;

/// Error type for transport operations.
#[derive(Debug, Error)]
pub enum TransportError {
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Socket setup failed.
    #[error("failed to set up socket for {endpoint}: {source}")]
    Setup {
        /// Feed being opened.
        endpoint: FeedEndpoint,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Joining or leaving a group failed.
    #[error("multicast error on {endpoint}: {message}")]
    Multicast {
        /// Feed the operation applied to.
        endpoint: FeedEndpoint,
        /// Error message.
        message: String,
    },

    /// Endpoint is not a multicast group.
    #[error("{endpoint} is not an IPv4 multicast group")]
    NotMulticast {
        /// Offending endpoint.
        endpoint: FeedEndpoint,
    },
}

impl TransportError {
    /// Creates a setup error.
    pub fn setup(endpoint: FeedEndpoint, source: std::io::Error) -> Self {
        Self::Setup { endpoint, source }
    }

    /// Creates a multicast error.
    pub fn multicast(endpoint: FeedEndpoint, message: impl Into<String>) -> Self {
        Self::Multicast {
            endpoint,
            message: message.into(),
        }
    }
}
