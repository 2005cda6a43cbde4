//! # mdparb Arbitration
//!
//! Line arbitration for redundant (A/B) sequenced multicast feeds.
//!
//! This crate provides:
//! - A bounded, direct-mapped cache for packets that arrive ahead of the cursor
//! - Per-line and combined receive/loss counters
//! - The arbitration engine merging both lines into one gap-free stream
//! - Per-channel monitors, statistics snapshots and report rendering
//! - Sinks for the arbitrated stream and loss reports

pub mod cache;
pub mod engine;
pub mod error;
pub mod monitor;
pub mod report;
pub mod sink;
pub mod stats;

pub use cache::SequenceCache;
pub use engine::{
    ArbitrationConfig, ArbitrationEngine, FeedEvents, IngestOutcome, PacketClass, SweepOutcome,
};
pub use error::ArbitrationError;
pub use monitor::ChannelMonitor;
pub use report::StatsReport;
pub use sink::{ChannelEvent, EventProducer, FeedSink, LoggingSink, NullSink};
pub use stats::{ChannelStats, LineCounters, LineStats, Receipt};
