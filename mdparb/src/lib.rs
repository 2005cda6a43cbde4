//! # mdparb
//!
//! CME Globex MDP line arbitration and packet loss monitoring.
//!
//! CME publishes every incremental market data channel twice, on two
//! independent multicast lines (A and B). `mdparb` merges both lines of each
//! channel into one gap-free, duplicate-free stream and measures loss per
//! line and on the merged stream, which is the loss that actually matters.
//!
//! ## Quick Start
//!
//! ```ignore
//! use mdparb::prelude::*;
//!
//! let cme = CmeConfig::from_file("config.xml")?;
//! let config = DetectorConfig::new("10.0.0.5".parse()?);
//! let (mut detector, handle) = PacketLossDetector::new(config, &cme, &[310, 312], LoggingSink)?;
//!
//! tokio::spawn(async move {
//!     tokio::signal::ctrl_c().await.ok();
//!     handle.shutdown();
//! });
//! detector.run().await?;
//! ```
//!
//! ## Crate Organization
//!
//! - [`core`] - Line identity, packet header, feed events
//! - [`config`] - CME `config.xml` parsing
//! - [`arbitration`] - Sequence cache, arbitration engine, statistics, sinks
//! - [`transport`] - Multicast sockets and receive tasks
//! - [`detector`] - The poll loop tying them together

pub mod detector;
pub mod error;
pub mod prelude;

/// Line identity, packet header and feed events.
pub mod core {
    pub use mdparb_core::*;
}

/// CME configuration parsing.
pub mod config {
    pub use mdparb_config::*;
}

/// Line arbitration and statistics.
pub mod arbitration {
    pub use mdparb_arbitration::*;
}

/// Multicast transport.
pub mod transport {
    pub use mdparb_transport::*;
}

pub use detector::{DetectorCommand, DetectorConfig, DetectorHandle, PacketLossDetector};
pub use error::DetectorError;
