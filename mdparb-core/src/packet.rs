//! Events produced by line arbitration.

use bytes::Bytes;
use std::fmt;

/// A packet released by the arbitration engine, in sequence order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequencedPacket {
    /// Sequence number.
    pub sequence: u64,
    /// Opaque payload (datagram bytes after the sequence header).
    pub payload: Bytes,
}

impl SequencedPacket {
    /// Creates a new sequenced packet.
    #[must_use]
    pub fn new(sequence: u64, payload: Bytes) -> Self {
        Self { sequence, payload }
    }
}

/// A run of sequence numbers that was never delivered on either line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacketLoss {
    /// First missing sequence number.
    pub first_missing: u64,
    /// Number of consecutive missing sequence numbers.
    pub missing_count: u64,
}

impl PacketLoss {
    /// Creates a new loss report.
    #[must_use]
    pub const fn new(first_missing: u64, missing_count: u64) -> Self {
        Self {
            first_missing,
            missing_count,
        }
    }

    /// Returns the last missing sequence number (inclusive).
    #[must_use]
    pub const fn last_missing(&self) -> u64 {
        self.first_missing + self.missing_count.saturating_sub(1)
    }
}

impl fmt::Display for PacketLoss {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} packet(s) lost: {}..={}",
            self.missing_count,
            self.first_missing,
            self.last_missing()
        )
    }
}

/// An ordered event released by the arbitration engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedEvent {
    /// Next packet of the gap-free stream.
    Packet(SequencedPacket),
    /// Sequences skipped because neither line delivered them in time.
    Loss(PacketLoss),
}

impl FeedEvent {
    /// Returns the packet if this is a dispatch event.
    #[must_use]
    pub fn as_packet(&self) -> Option<&SequencedPacket> {
        match self {
            FeedEvent::Packet(packet) => Some(packet),
            FeedEvent::Loss(_) => None,
        }
    }

    /// Returns the loss report if this is a loss event.
    #[must_use]
    pub fn as_loss(&self) -> Option<PacketLoss> {
        match self {
            FeedEvent::Packet(_) => None,
            FeedEvent::Loss(loss) => Some(*loss),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_packet_loss_range() {
        let loss = PacketLoss::new(100, 5);
        assert_eq!(loss.last_missing(), 104);
        assert_eq!(loss.to_string(), "5 packet(s) lost: 100..=104");
    }

    #[test]
    fn test_feed_event_accessors() {
        let packet = FeedEvent::Packet(SequencedPacket::new(1, Bytes::new()));
        assert_eq!(packet.as_packet().map(|p| p.sequence), Some(1));
        assert!(packet.as_loss().is_none());

        let loss = FeedEvent::Loss(PacketLoss::new(2, 3));
        assert!(loss.as_packet().is_none());
        assert_eq!(loss.as_loss(), Some(PacketLoss::new(2, 3)));
    }

    #[test]
    fn test_sequenced_packet_new() {
        let packet = SequencedPacket::new(7, Bytes::from_static(b"x"));
        assert_eq!(packet.sequence, 7);
        assert_eq!(&packet.payload[..], b"x");
    }
}
