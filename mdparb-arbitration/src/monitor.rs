//! Per-channel monitor.

use crate::engine::{ArbitrationConfig, ArbitrationEngine, IngestOutcome, SweepOutcome};
use crate::error::ArbitrationError;
use crate::stats::{ChannelStats, Receipt};
use bytes::Bytes;
use mdparb_core::{Line, PacketHeader};
use std::time::{Duration, Instant};

/// Owns the arbitration engine and statistics of one channel.
#[derive(Debug)]
pub struct ChannelMonitor {
    channel_id: u32,
    engine: ArbitrationEngine,
    runts: u64,
    packet_logging: bool,
    idle: bool,
}

impl ChannelMonitor {
    /// Creates a monitor for a channel.
    ///
    /// # Errors
    /// Returns `ArbitrationError` if the engine configuration is invalid.
    pub fn new(channel_id: u32, config: ArbitrationConfig) -> Result<Self, ArbitrationError> {
        Ok(Self {
            channel_id,
            engine: ArbitrationEngine::new(config)?,
            runts: 0,
            packet_logging: false,
            idle: false,
        })
    }

    /// Logs per-line gaps at `info` instead of `debug`.
    #[must_use]
    pub fn with_packet_logging(mut self, enabled: bool) -> Self {
        self.packet_logging = enabled;
        self
    }

    /// Returns the channel id.
    #[must_use]
    pub fn channel_id(&self) -> u32 {
        self.channel_id
    }

    /// Returns the engine.
    #[must_use]
    pub fn engine(&self) -> &ArbitrationEngine {
        &self.engine
    }

    /// Handles a packet from line A.
    ///
    /// Sequences are widened wire `u32` values, as decoded by [`PacketHeader`].
    pub fn on_feed_a(&mut self, sequence: u64, payload: Bytes) -> IngestOutcome {
        self.on_feed(Line::A, sequence, payload, Instant::now())
    }

    /// Handles a packet from line B, with the same sequence domain as
    /// [`Self::on_feed_a`].
    pub fn on_feed_b(&mut self, sequence: u64, payload: Bytes) -> IngestOutcome {
        self.on_feed(Line::B, sequence, payload, Instant::now())
    }

    /// Handles a packet from `line` received at `now`.
    pub fn on_feed(
        &mut self,
        line: Line,
        sequence: u64,
        payload: Bytes,
        now: Instant,
    ) -> IngestOutcome {
        let outcome = self.engine.ingest_at(line, sequence, payload, now);
        if let Receipt::Gap {
            first_missing,
            missing,
        } = outcome.receipt
        {
            self.log_line_gap(line, sequence, first_missing, missing);
        }
        outcome
    }

    /// Handles a raw datagram: decodes the sequence and strips the header.
    ///
    /// Datagrams too short to carry a sequence are counted as runts and dropped.
    pub fn on_datagram(
        &mut self,
        line: Line,
        datagram: Bytes,
        now: Instant,
    ) -> Option<IngestOutcome> {
        match PacketHeader::split(datagram) {
            Ok((header, payload)) => Some(self.on_feed(line, header.sequence, payload, now)),
            Err(e) => {
                self.runts += 1;
                tracing::warn!(channel = self.channel_id, %line, "dropping datagram: {}", e);
                None
            }
        }
    }

    fn log_line_gap(&self, line: Line, received: u64, first_missing: u64, missing: u64) {
        if self.packet_logging {
            tracing::info!(
                channel = self.channel_id,
                %line,
                received,
                expected = first_missing,
                missing,
                "packet loss on line"
            );
        } else {
            tracing::debug!(
                channel = self.channel_id,
                %line,
                received,
                expected = first_missing,
                missing,
                "packet loss on line"
            );
        }
    }

    /// Runs the stale-gap sweep now.
    pub fn sweep(&mut self) -> SweepOutcome {
        self.sweep_at(Instant::now())
    }

    /// Runs the stale-gap sweep as of `now`, independent of packet arrival.
    pub fn sweep_at(&mut self, now: Instant) -> SweepOutcome {
        self.engine.check_packet_loss_at(now)
    }

    /// Returns how long the channel has not advanced.
    #[must_use]
    pub fn idle_for(&self, now: Instant) -> Option<Duration> {
        self.engine.idle_for(now)
    }

    /// Tracks idle transitions against `threshold`.
    ///
    /// # Returns
    /// The idle duration the first time it exceeds `threshold`; `None`
    /// otherwise. Logs when the channel goes idle and when it resumes.
    pub fn check_idle(&mut self, now: Instant, threshold: Duration) -> Option<Duration> {
        let idle_for = self.idle_for(now)?;
        if idle_for > threshold {
            if !self.idle {
                self.idle = true;
                tracing::warn!(
                    channel = self.channel_id,
                    idle_ms = idle_for.as_millis() as u64,
                    "channel idle"
                );
                return Some(idle_for);
            }
        } else if self.idle {
            self.idle = false;
            tracing::info!(channel = self.channel_id, "channel active again");
        }
        None
    }

    /// Returns true while the channel is considered idle.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.idle
    }

    /// Returns a statistics snapshot.
    #[must_use]
    pub fn snapshot(&self) -> ChannelStats {
        ChannelStats {
            channel_id: self.channel_id,
            feed_a: *self.engine.line_stats(Line::A).counters(),
            feed_b: *self.engine.line_stats(Line::B).counters(),
            combined: *self.engine.combined_stats().counters(),
            runts: self.runts,
            cached: self.engine.cache().len(),
        }
    }

    /// Resets all counters; the engine cursor and cache are kept.
    pub fn reset(&mut self) {
        self.engine.reset_statistics();
        self.runts = 0;
    }
}
