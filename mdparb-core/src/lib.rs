//! # mdparb Core
//!
//! Shared vocabulary for redundant CME Globex feed arbitration.
//!
//! This crate provides:
//! - The [`Line`] tag identifying which of the two redundant feeds a datagram came from
//! - [`FeedEndpoint`] multicast group/port pairs
//! - Packet header decoding (leading big-endian sequence number)
//! - [`FeedEvent`], [`SequencedPacket`] and [`PacketLoss`] events emitted by the arbitration engine
//! - Error types for packet decoding

pub mod endpoint;
pub mod error;
pub mod header;
pub mod line;
pub mod packet;

pub use endpoint::FeedEndpoint;
pub use error::{Error, Result};
pub use header::PacketHeader;
pub use line::Line;
pub use packet::{FeedEvent, PacketLoss, SequencedPacket};
