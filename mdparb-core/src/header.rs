//! Incremental feed packet header.
//!
//! Every packet on an incremental feed starts with the channel-level
//! sequence number. Everything after it is opaque to the arbitration
//! layer and is passed through untouched.
//!
//! # Wire Format
//! ```text
//! +0: sequence  (u32 big-endian, 4 bytes)
//! +4: payload   (opaque)
//! ```

use crate::error::{Error, Result};
use bytes::Bytes;

/// Decoded packet header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PacketHeader {
    /// Channel sequence number, widened for arithmetic.
    pub sequence: u64,
}

impl PacketHeader {
    /// Encoded length of the header in bytes.
    pub const ENCODED_LENGTH: usize = 4;

    /// Creates a header for the given wire sequence.
    #[must_use]
    pub const fn new(sequence: u32) -> Self {
        Self {
            sequence: sequence as u64,
        }
    }

    /// Decodes the header from the start of a datagram.
    ///
    /// # Errors
    /// Returns [`Error::PacketTooShort`] if fewer than 4 bytes are available.
    #[inline]
    pub fn decode(datagram: &[u8]) -> Result<Self> {
        let bytes: [u8; Self::ENCODED_LENGTH] = datagram
            .get(..Self::ENCODED_LENGTH)
            .and_then(|b| b.try_into().ok())
            .ok_or_else(|| Error::too_short(Self::ENCODED_LENGTH, datagram.len()))?;
        Ok(Self::new(u32::from_be_bytes(bytes)))
    }

    /// Splits a received datagram into its header and the opaque payload.
    ///
    /// The payload shares the datagram's allocation.
    ///
    /// # Errors
    /// Returns [`Error::PacketTooShort`] if fewer than 4 bytes are available.
    #[inline]
    pub fn split(datagram: Bytes) -> Result<(Self, Bytes)> {
        let header = Self::decode(&datagram)?;
        Ok((header, datagram.slice(Self::ENCODED_LENGTH..)))
    }

    /// Writes a wire sequence number into the first 4 bytes of `buffer`.
    ///
    /// # Panics
    /// Panics if the buffer is shorter than 4 bytes.
    #[inline(always)]
    pub fn encode(sequence: u32, buffer: &mut [u8]) {
        buffer[..Self::ENCODED_LENGTH].copy_from_slice(&sequence.to_be_bytes());
    }
}
