//! Consumers of the arbitrated stream.

use mdparb_core::{FeedEvent, PacketLoss, SequencedPacket};
use rtrb::{Consumer, Producer, RingBuffer};

/// Receives the gap-free packet stream and loss reports of every channel.
pub trait FeedSink {
    /// Called for each dispatched packet, in sequence order.
    fn on_packet(&mut self, channel_id: u32, packet: &SequencedPacket);

    /// Called when a gap is abandoned.
    fn on_loss(&mut self, channel_id: u32, loss: PacketLoss);

    /// Delivers a batch of events in order.
    fn deliver(&mut self, channel_id: u32, events: &[FeedEvent]) {
        for event in events {
            match event {
                FeedEvent::Packet(packet) => self.on_packet(channel_id, packet),
                FeedEvent::Loss(loss) => self.on_loss(channel_id, *loss),
            }
        }
    }
}

/// Discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl FeedSink for NullSink {
    #[inline]
    fn on_packet(&mut self, _channel_id: u32, _packet: &SequencedPacket) {}

    #[inline]
    fn on_loss(&mut self, _channel_id: u32, _loss: PacketLoss) {}
}

/// Logs loss reports at `warn` and packets at `trace`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingSink;

impl FeedSink for LoggingSink {
    fn on_packet(&mut self, channel_id: u32, packet: &SequencedPacket) {
        tracing::trace!(
            channel = channel_id,
            sequence = packet.sequence,
            len = packet.payload.len(),
            "packet"
        );
    }

    fn on_loss(&mut self, channel_id: u32, loss: PacketLoss) {
        tracing::warn!(
            channel = channel_id,
            first_missing = loss.first_missing,
            missing = loss.missing_count,
            "packet loss on both lines: {}",
            loss
        );
    }
}

/// An event tagged with its channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelEvent {
    /// Channel the event belongs to.
    pub channel_id: u32,
    /// The event.
    pub event: FeedEvent,
}

/// Collects events in memory.
impl FeedSink for Vec<ChannelEvent> {
    fn on_packet(&mut self, channel_id: u32, packet: &SequencedPacket) {
        self.push(ChannelEvent {
            channel_id,
            event: FeedEvent::Packet(packet.clone()),
        });
    }

    fn on_loss(&mut self, channel_id: u32, loss: PacketLoss) {
        self.push(ChannelEvent {
            channel_id,
            event: FeedEvent::Loss(loss),
        });
    }
}

/// Hands events to another thread through a lock-free SPSC ring buffer.
///
/// The receive loop must never block on a slow consumer, so events that do
/// not fit are dropped and counted.
pub struct EventProducer {
    producer: Producer<ChannelEvent>,
    dropped: u64,
}

impl EventProducer {
    /// Creates a producer and its consumer half.
    ///
    /// # Arguments
    /// * `capacity` - Maximum number of queued events
    #[must_use]
    pub fn channel(capacity: usize) -> (Self, Consumer<ChannelEvent>) {
        let (producer, consumer) = RingBuffer::new(capacity);
        (
            Self {
                producer,
                dropped: 0,
            },
            consumer,
        )
    }

    /// Returns the number of events dropped because the buffer was full.
    #[must_use]
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    /// Returns true if the consumer half was dropped.
    #[must_use]
    pub fn is_abandoned(&self) -> bool {
        self.producer.is_abandoned()
    }

    #[inline]
    fn push(&mut self, event: ChannelEvent) {
        if self.producer.push(event).is_err() {
            self.dropped += 1;
            if self.dropped.is_power_of_two() {
                tracing::warn!(dropped = self.dropped, "event buffer full, dropping events");
            }
        }
    }
}

impl std::fmt::Debug for EventProducer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventProducer")
            .field("slots", &self.producer.slots())
            .field("dropped", &self.dropped)
            .finish()
    }
}

impl FeedSink for EventProducer {
    fn on_packet(&mut self, channel_id: u32, packet: &SequencedPacket) {
        self.push(ChannelEvent {
            channel_id,
            event: FeedEvent::Packet(packet.clone()),
        });
    }

    fn on_loss(&mut self, channel_id: u32, loss: PacketLoss) {
        self.push(ChannelEvent {
            channel_id,
            event: FeedEvent::Loss(loss),
        });
    }
}
