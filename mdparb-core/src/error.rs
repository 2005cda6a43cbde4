//! Error types for mdparb core operations.

use thiserror::Error;

/// Core error type for packet decoding.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    /// Datagram is too short to carry a packet header.
    #[error("packet too short: required {required} bytes, available {available} bytes")]
    PacketTooShort {
        /// Required length in bytes.
        required: usize,
        /// Available length in bytes.
        available: usize,
    },
}

impl Error {
    /// Creates a packet too short error.
    pub fn too_short(required: usize, available: usize) -> Self {
        Self::PacketTooShort {
            required,
            available,
        }
    }
}

/// Result type alias for mdparb core operations.
pub type Result<T> = std::result::Result<T, Error>;
