//! A/B line arbitration engine.
//!
//! Both lines of a channel feed one expected-sequence cursor. The first
//! arrival of a sequence on either line is dispatched; the later copy is
//! old by then and dropped. Packets from ahead of the cursor wait in a
//! [`SequenceCache`] until the gap before them closes, or until the gap is
//! declared lost by the stale-gap sweep.

use crate::cache::{DEFAULT_CACHE_CAPACITY, SequenceCache};
use crate::error::ArbitrationError;
use crate::stats::{LineStats, Receipt};
use bytes::Bytes;
use mdparb_core::{FeedEvent, Line, PacketLoss, SequencedPacket};
use std::time::{Duration, Instant};

/// Default time a gap may stay open while packets wait in the cache.
pub const DEFAULT_STALE_GAP_TIMEOUT: Duration = Duration::from_millis(100);

/// Configuration for an arbitration engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArbitrationConfig {
    /// Number of cache slots for out-of-order packets.
    pub cache_capacity: usize,
    /// Time without cursor progress after which a gap is abandoned.
    pub stale_gap_timeout: Duration,
}

impl Default for ArbitrationConfig {
    fn default() -> Self {
        Self {
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            stale_gap_timeout: DEFAULT_STALE_GAP_TIMEOUT,
        }
    }
}

impl ArbitrationConfig {
    /// Creates the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the cache capacity.
    #[must_use]
    pub fn cache_capacity(mut self, capacity: usize) -> Self {
        self.cache_capacity = capacity;
        self
    }

    /// Sets the stale gap timeout.
    #[must_use]
    pub fn stale_gap_timeout(mut self, timeout: Duration) -> Self {
        self.stale_gap_timeout = timeout;
        self
    }
}

/// Where an ingested packet stood relative to the cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacketClass {
    /// First packet of the channel's life; sets the baseline.
    First,
    /// The expected sequence; dispatched.
    Expected,
    /// Ahead of the cursor; cached.
    Future,
    /// Behind the cursor; dropped.
    Old,
}

/// Ordered events shared by ingest and sweep outcomes.
pub trait FeedEvents {
    /// Returns the events in dispatch order.
    fn events(&self) -> &[FeedEvent];

    /// Iterates over dispatched packets.
    fn dispatched(&self) -> impl Iterator<Item = &SequencedPacket> {
        self.events().iter().filter_map(FeedEvent::as_packet)
    }

    /// Returns the sequences of dispatched packets.
    fn dispatched_sequences(&self) -> Vec<u64> {
        self.dispatched().map(|p| p.sequence).collect()
    }

    /// Returns the loss report, if a gap was abandoned.
    fn loss(&self) -> Option<PacketLoss> {
        self.events().iter().find_map(FeedEvent::as_loss)
    }
}

/// Result of ingesting one packet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestOutcome {
    /// Classification against the channel cursor.
    pub class: PacketClass,
    /// Classification against the arriving line's own cursor.
    pub receipt: Receipt,
    /// Dispatched packets and at most one loss report, in order.
    pub events: Vec<FeedEvent>,
}

impl FeedEvents for IngestOutcome {
    fn events(&self) -> &[FeedEvent] {
        &self.events
    }
}

/// Result of a stale-gap sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepOutcome {
    /// Loss report followed by the packets it released.
    pub events: Vec<FeedEvent>,
}

impl FeedEvents for SweepOutcome {
    fn events(&self) -> &[FeedEvent] {
        &self.events
    }
}

/// Per-channel arbitration state machine.
#[derive(Debug)]
pub struct ArbitrationEngine {
    config: ArbitrationConfig,
    expected: Option<u64>,
    cache: SequenceCache,
    last_good_packet_time: Option<Instant>,
    line_a: LineStats,
    line_b: LineStats,
    combined: LineStats,
}

impl ArbitrationEngine {
    /// Creates an engine.
    ///
    /// # Errors
    /// Returns `ArbitrationError` if the cache capacity or timeout is zero.
    pub fn new(config: ArbitrationConfig) -> Result<Self, ArbitrationError> {
        if config.stale_gap_timeout.is_zero() {
            return Err(ArbitrationError::InvalidTimeout);
        }
        Ok(Self {
            cache: SequenceCache::new(config.cache_capacity)?,
            config,
            expected: None,
            last_good_packet_time: None,
            line_a: LineStats::new(),
            line_b: LineStats::new(),
            combined: LineStats::new(),
        })
    }

    /// Creates an engine with default settings and the given cache capacity.
    ///
    /// # Errors
    /// Returns `ArbitrationError::InvalidCapacity` if `capacity` is zero.
    pub fn with_capacity(capacity: usize) -> Result<Self, ArbitrationError> {
        Self::new(ArbitrationConfig::new().cache_capacity(capacity))
    }

    /// Ingests a packet received now.
    ///
    /// `sequence` is the wire `u32` widened to `u64`; see [`Self::ingest_at`].
    pub fn ingest(&mut self, line: Line, sequence: u64, payload: Bytes) -> IngestOutcome {
        self.ingest_at(line, sequence, payload, Instant::now())
    }

    /// Ingests a packet received at `now`.
    ///
    /// Always finishes with a stale-gap sweep so loss is detected while
    /// packets keep flowing on one line only.
    ///
    /// Sequences are expected in the widened `u32` range carried by the
    /// packet header. The cursor is kept one past the last dispatched
    /// sequence, so `u64::MAX` itself is out of range.
    pub fn ingest_at(
        &mut self,
        line: Line,
        sequence: u64,
        payload: Bytes,
        now: Instant,
    ) -> IngestOutcome {
        let receipt = self.line_stats_mut(line).receive(sequence);
        let mut events = Vec::new();

        let class = match self.expected {
            None => {
                self.dispatch(sequence, payload, &mut events);
                self.expected = Some(sequence + 1);
                self.last_good_packet_time = Some(now);
                PacketClass::First
            }
            Some(expected) if sequence == expected => {
                self.handle_expected(sequence, payload, now, &mut events);
                PacketClass::Expected
            }
            Some(expected) if sequence > expected => {
                if let Some(evicted) = self.cache.put(sequence, payload) {
                    tracing::debug!(sequence, evicted, "cache slot collision");
                }
                PacketClass::Future
            }
            Some(_) => PacketClass::Old,
        };

        self.sweep(now, &mut events);

        IngestOutcome {
            class,
            receipt,
            events,
        }
    }

    /// Runs the stale-gap sweep now.
    pub fn check_packet_loss(&mut self) -> SweepOutcome {
        self.check_packet_loss_at(Instant::now())
    }

    /// Runs the stale-gap sweep as of `now`.
    ///
    /// Does nothing unless packets are cached and either the cache is more
    /// than half full or the cursor has not moved for the stale gap timeout.
    pub fn check_packet_loss_at(&mut self, now: Instant) -> SweepOutcome {
        let mut events = Vec::new();
        self.sweep(now, &mut events);
        SweepOutcome { events }
    }

    /// Returns true if the open gap should be abandoned.
    #[must_use]
    pub fn is_stalled(&self, now: Instant) -> bool {
        let cached = self.cache.len();
        if cached > self.cache.capacity() / 2 {
            return true;
        }
        cached > 0
            && self
                .last_good_packet_time
                .is_some_and(|t| now.saturating_duration_since(t) > self.config.stale_gap_timeout)
    }

    fn sweep(&mut self, now: Instant, events: &mut Vec<FeedEvent>) {
        let Some(expected) = self.expected else {
            return;
        };
        if !self.is_stalled(now) {
            return;
        }
        // Every cached sequence is above the cursor, so the lowest one is
        // where skipping forward one sequence at a time would stop.
        let Some(next) = self.cache.lowest_sequence() else {
            return;
        };
        let Some(payload) = self.cache.remove(next) else {
            return;
        };

        let missing = next.saturating_sub(expected);
        if missing > 0 {
            events.push(FeedEvent::Loss(PacketLoss::new(expected, missing)));
        }
        self.handle_expected(next, payload, now, events);
    }

    fn handle_expected(
        &mut self,
        sequence: u64,
        payload: Bytes,
        now: Instant,
        events: &mut Vec<FeedEvent>,
    ) {
        self.dispatch(sequence, payload, events);
        let mut expected = sequence + 1;
        while let Some(cached) = self.cache.remove(expected) {
            self.dispatch(expected, cached, events);
            expected += 1;
        }
        self.expected = Some(expected);
        self.last_good_packet_time = Some(now);
    }

    #[inline]
    fn dispatch(&mut self, sequence: u64, payload: Bytes, events: &mut Vec<FeedEvent>) {
        self.combined.receive(sequence);
        events.push(FeedEvent::Packet(SequencedPacket::new(sequence, payload)));
    }

    fn line_stats_mut(&mut self, line: Line) -> &mut LineStats {
        match line {
            Line::A => &mut self.line_a,
            Line::B => &mut self.line_b,
        }
    }

    /// Returns the next sequence to dispatch, `None` before the first packet.
    #[must_use]
    pub fn expected_sequence(&self) -> Option<u64> {
        self.expected
    }

    /// Returns the out-of-order cache.
    #[must_use]
    pub fn cache(&self) -> &SequenceCache {
        &self.cache
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &ArbitrationConfig {
        &self.config
    }

    /// Returns when the cursor last advanced.
    #[must_use]
    pub fn last_good_packet_time(&self) -> Option<Instant> {
        self.last_good_packet_time
    }

    /// Returns how long the cursor has not advanced, `None` before the first packet.
    #[must_use]
    pub fn idle_for(&self, now: Instant) -> Option<Duration> {
        self.last_good_packet_time
            .map(|t| now.saturating_duration_since(t))
    }

    /// Returns the statistics of a line.
    #[must_use]
    pub fn line_stats(&self, line: Line) -> &LineStats {
        match line {
            Line::A => &self.line_a,
            Line::B => &self.line_b,
        }
    }

    /// Returns the statistics of the arbitrated stream.
    #[must_use]
    pub fn combined_stats(&self) -> &LineStats {
        &self.combined
    }

    /// Zeroes all counters; cursor and cache are untouched.
    pub fn reset_statistics(&mut self) {
        self.line_a.reset();
        self.line_b.reset();
        self.combined.reset();
    }
}
