//! Receive and loss statistics per line and per channel.

use mdparb_core::Line;

/// Running counters for one line (A, B or the combined stream).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LineCounters {
    /// Packets received.
    pub received: u64,
    /// Sum of gap sizes.
    pub missed: u64,
    /// Number of distinct gaps.
    pub incidents: u64,
    /// Packets older than the line cursor (duplicates or late arrivals).
    pub duplicates: u64,
}

impl LineCounters {
    /// Creates zeroed counters.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            received: 0,
            missed: 0,
            incidents: 0,
            duplicates: 0,
        }
    }

    /// Counts one received packet.
    #[inline]
    pub fn record_received(&mut self) {
        self.received += 1;
    }

    /// Adds `gap` missing packets.
    #[inline]
    pub fn record_missed(&mut self, gap: u64) {
        self.missed += gap;
    }

    /// Counts one gap event.
    #[inline]
    pub fn record_incident(&mut self) {
        self.incidents += 1;
    }

    /// Counts one old or duplicate packet.
    #[inline]
    pub fn record_duplicate(&mut self) {
        self.duplicates += 1;
    }

    /// Returns `missed / received * 100`, or `0.0` when nothing was received.
    #[must_use]
    pub fn percentage_missed(&self) -> f64 {
        if self.received == 0 {
            0.0
        } else {
            self.missed as f64 / self.received as f64 * 100.0
        }
    }

    /// Zeroes all counters.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Returns the elementwise sum of two counter sets.
    #[must_use]
    pub fn merge(&self, other: &LineCounters) -> LineCounters {
        LineCounters {
            received: self.received + other.received,
            missed: self.missed + other.missed,
            incidents: self.incidents + other.incidents,
            duplicates: self.duplicates + other.duplicates,
        }
    }
}

/// How a received sequence relates to a line's own cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Receipt {
    /// First packet seen on the line.
    First,
    /// Exactly the next expected sequence.
    InOrder,
    /// At or below the last sequence seen.
    Old,
    /// Sequences were skipped on this line.
    Gap {
        /// First skipped sequence.
        first_missing: u64,
        /// Number of skipped sequences.
        missing: u64,
    },
}

/// Counters plus the line's own expected-sequence cursor.
///
/// The cursor lets a single line account for its own gaps even when the
/// other line fills them, so A-only and B-only loss show up per line while
/// the combined stream counts only loss present on both.
#[derive(Debug, Clone, Default)]
pub struct LineStats {
    expected: Option<u64>,
    counters: LineCounters,
}

impl LineStats {
    /// Creates stats with no sequence seen yet.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a received sequence and classifies it.
    ///
    /// `sequence` is a widened wire `u32`, so the cursor never overflows.
    pub fn receive(&mut self, sequence: u64) -> Receipt {
        self.counters.record_received();

        let Some(expected) = self.expected else {
            self.expected = Some(sequence + 1);
            return Receipt::First;
        };

        if sequence == expected {
            self.expected = Some(expected + 1);
            Receipt::InOrder
        } else if sequence < expected {
            self.counters.record_duplicate();
            Receipt::Old
        } else {
            let missing = sequence - expected;
            self.counters.record_missed(missing);
            self.counters.record_incident();
            self.expected = Some(sequence + 1);
            Receipt::Gap {
                first_missing: expected,
                missing,
            }
        }
    }

    /// Returns the next sequence this line expects.
    #[must_use]
    pub fn expected(&self) -> Option<u64> {
        self.expected
    }

    /// Returns the counters.
    #[must_use]
    pub fn counters(&self) -> &LineCounters {
        &self.counters
    }

    /// Zeroes the counters; the cursor is kept.
    pub fn reset(&mut self) {
        self.counters.reset();
    }
}

/// Read-only statistics snapshot of one channel.
///
/// A `channel_id` of 0 denotes an aggregate over several channels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChannelStats {
    /// Channel id, 0 for the total row.
    pub channel_id: u32,
    /// Line A counters.
    pub feed_a: LineCounters,
    /// Line B counters.
    pub feed_b: LineCounters,
    /// Arbitrated stream counters.
    pub combined: LineCounters,
    /// Datagrams too short to carry a sequence number.
    pub runts: u64,
    /// Packets currently waiting in the cache.
    pub cached: usize,
}

impl ChannelStats {
    /// Id used for aggregate rows.
    pub const TOTAL_ID: u32 = 0;

    /// Returns the counters of a line.
    #[must_use]
    pub fn line(&self, line: Line) -> &LineCounters {
        match line {
            Line::A => &self.feed_a,
            Line::B => &self.feed_b,
        }
    }

    /// Returns true if this is an aggregate row.
    #[must_use]
    pub fn is_total(&self) -> bool {
        self.channel_id == Self::TOTAL_ID
    }

    /// Sums several channel snapshots into a total row.
    ///
    /// Percentages of the result are computed from the summed counts.
    #[must_use]
    pub fn aggregate<'a>(all: impl IntoIterator<Item = &'a ChannelStats>) -> ChannelStats {
        all.into_iter()
            .fold(ChannelStats::default(), |total, stats| ChannelStats {
                channel_id: Self::TOTAL_ID,
                feed_a: total.feed_a.merge(&stats.feed_a),
                feed_b: total.feed_b.merge(&stats.feed_b),
                combined: total.combined.merge(&stats.combined),
                runts: total.runts + stats.runts,
                cached: total.cached + stats.cached,
            })
    }
}
