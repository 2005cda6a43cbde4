//! Error types for arbitration.

use thiserror::Error;

/// Error type for arbitration construction.
///
/// Sequence anomalies are never errors; they end up in counters.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ArbitrationError {
    /// Cache capacity must be positive.
    #[error("invalid cache capacity {capacity}: must be positive")]
    InvalidCapacity {
        /// Requested capacity.
        capacity: usize,
    },

    /// Stale gap timeout must be positive.
    #[error("invalid stale gap timeout: must be positive")]
    InvalidTimeout,

    /// Packet decoding error.
    #[error("packet error: {0}")]
    Packet(#[from] mdparb_core::Error),
}
