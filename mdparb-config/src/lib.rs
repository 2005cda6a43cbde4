//! # mdparb Config
//!
//! CME Globex `config.xml` parsing.
//!
//! This crate provides:
//! - Parsing of channel and connection definitions
//! - Lookup of incremental, instrument definition and snapshot feed endpoints per line
//! - Channel list parsing for command line use

pub mod channels;
pub mod error;
pub mod parser;

pub use channels::{ChannelDef, ChannelFeeds, CmeConfig, ConnectionDef, FeedKind};
pub use error::ConfigError;
pub use parser::{parse_channel_list, parse_config};
