//! Fixed-width statistics table.
//!
//! ```text
//!             |      A-RX      A-DR      A-% |      B-RX      B-DR      B-% |      C-RX      C-DR      C-% |
//! Channel 310 |      1000         2    0.200 |      1000         0    0.000 |      1000         0    0.000 |
//! Total       |      1000         2    0.200 |      1000         0    0.000 |      1000         0    0.000 |
//! ```

use crate::stats::{ChannelStats, LineCounters};
use std::fmt;

/// Column header of the report table.
pub const HEADER: &str = "            |      A-RX      A-DR      A-% |      B-RX      B-DR      B-% |      C-RX      C-DR      C-% |";

/// A rendered snapshot of several channels plus their total.
#[derive(Debug, Clone, PartialEq)]
pub struct StatsReport {
    rows: Vec<ChannelStats>,
    total: ChannelStats,
}

impl StatsReport {
    /// Builds a report; the total row is summed from `rows`.
    #[must_use]
    pub fn new(rows: Vec<ChannelStats>) -> Self {
        let total = ChannelStats::aggregate(&rows);
        Self { rows, total }
    }

    /// Returns the per-channel rows.
    #[must_use]
    pub fn rows(&self) -> &[ChannelStats] {
        &self.rows
    }

    /// Returns the aggregate row.
    #[must_use]
    pub fn total(&self) -> &ChannelStats {
        &self.total
    }

    /// Formats one row.
    #[must_use]
    pub fn format_row(stats: &ChannelStats) -> String {
        let label = if stats.is_total() {
            "Total".to_string()
        } else {
            format!("Channel {:>3}", stats.channel_id)
        };
        format!(
            "{:<11} | {} | {} | {} |",
            label,
            columns(&stats.feed_a),
            columns(&stats.feed_b),
            columns(&stats.combined)
        )
    }

    /// Returns the header followed by every row and the total.
    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        std::iter::once(HEADER.to_string())
            .chain(self.rows.iter().map(Self::format_row))
            .chain(std::iter::once(Self::format_row(&self.total)))
            .collect()
    }
}

fn columns(counters: &LineCounters) -> String {
    format!(
        "{:>9} {:>9}    {:>5.3}",
        counters.received,
        counters.missed,
        counters.percentage_missed()
    )
}

impl fmt::Display for StatsReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in self.lines() {
            writeln!(f, "{line}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats(channel_id: u32, received: u64, missed: u64) -> ChannelStats {
        let counters = LineCounters {
            received,
            missed,
            ..LineCounters::new()
        };
        ChannelStats {
            channel_id,
            feed_a: counters,
            feed_b: LineCounters {
                received,
                ..LineCounters::new()
            },
            combined: LineCounters {
                received,
                ..LineCounters::new()
            },
            ..ChannelStats::default()
        }
    }

    #[test]
    fn test_row_format() {
        let row = StatsReport::format_row(&stats(310, 1000, 2));
        assert_eq!(
            row,
            "Channel 310 |      1000         2    0.200 |      1000         0    0.000 |      1000         0    0.000 |"
        );
        assert_eq!(row.len(), HEADER.len());
    }

    #[test]
    fn test_total_row_label() {
        let row = StatsReport::format_row(&ChannelStats::default());
        assert!(row.starts_with("Total       | "));
        assert_eq!(row.len(), HEADER.len());
    }

    #[test]
    fn test_short_channel_id_is_padded() {
        let row = StatsReport::format_row(&stats(7, 0, 0));
        assert!(row.starts_with("Channel   7 |"));
    }

    #[test]
    fn test_report_lines_include_total() {
        let report = StatsReport::new(vec![stats(310, 100, 1), stats(312, 300, 3)]);
        let lines = report.lines();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], HEADER);
        assert!(lines[1].starts_with("Channel 310"));
        assert!(lines[2].starts_with("Channel 312"));
        assert!(lines[3].starts_with("Total"));

        assert_eq!(report.total().feed_a.received, 400);
        assert_eq!(report.total().feed_a.missed, 4);
        assert!(lines[3].contains("    1.000 |"));
        assert_eq!(report.to_string().lines().count(), 4);
    }

    #[test]
    fn test_empty_report() {
        let report = StatsReport::new(Vec::new());
        assert!(report.rows().is_empty());
        assert_eq!(report.lines().len(), 2);
    }
}
