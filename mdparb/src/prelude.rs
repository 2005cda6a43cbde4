//! Prelude module for convenient imports.
//!
//! ```ignore
//! use mdparb::prelude::*;
//! ```

pub use mdparb_core::{FeedEndpoint, FeedEvent, Line, PacketHeader, PacketLoss, SequencedPacket};

pub use mdparb_config::{ChannelFeeds, CmeConfig, FeedKind, parse_channel_list, parse_config};

pub use mdparb_arbitration::{
    ArbitrationConfig, ArbitrationEngine, ChannelEvent, ChannelMonitor, ChannelStats,
    EventProducer, FeedEvents, FeedSink, LineCounters, LoggingSink, NullSink, StatsReport,
};

pub use mdparb_transport::{Datagram, MulticastConfig, MulticastSocket};

pub use crate::detector::{DetectorConfig, DetectorHandle, PacketLossDetector};
pub use crate::error::DetectorError;
