//! Channel and connection definitions.

use crate::error::ConfigError;
use mdparb_core::{FeedEndpoint, Line};
use std::collections::BTreeMap;
use std::net::Ipv4Addr;
use std::path::Path;

/// Kind of multicast feed published for a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeedKind {
    /// Incremental market data (`I`).
    Incremental,
    /// Instrument definition replay (`N`).
    InstrumentDefinition,
    /// Market recovery snapshots (`S`).
    Snapshot,
}

impl FeedKind {
    /// Returns the single-letter feed code used in connection ids.
    #[must_use]
    pub const fn code(self) -> char {
        match self {
            FeedKind::Incremental => 'I',
            FeedKind::InstrumentDefinition => 'N',
            FeedKind::Snapshot => 'S',
        }
    }

    /// Returns the connection id for this feed on a channel line, e.g. `310IA`.
    #[must_use]
    pub fn connection_id(self, channel: u32, line: Line) -> String {
        format!("{channel}{}{}", self.code(), line.code())
    }
}

/// A `<connection>` element, kept as raw text until it is looked up.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectionDef {
    /// Connection id, e.g. `310IA`.
    pub id: String,
    /// `<type>` text, e.g. `Incremental`.
    pub type_name: Option<String>,
    /// `<protocol>` text.
    pub protocol: Option<String>,
    /// `<ip>` multicast group.
    pub ip: Option<String>,
    /// `<host-ip>` source address.
    pub host_ip: Option<String>,
    /// `<port>` text.
    pub port: Option<String>,
    /// `<feed>` line letter.
    pub feed: Option<String>,
}

impl ConnectionDef {
    /// Creates an empty connection definition.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    /// Resolves the multicast group and port.
    ///
    /// # Errors
    /// Returns `ConfigError` if the address or port is missing or malformed.
    pub fn endpoint(&self) -> Result<FeedEndpoint, ConfigError> {
        let ip = self
            .ip
            .as_deref()
            .ok_or_else(|| ConfigError::missing_field(&self.id, "ip"))?;
        let port = self
            .port
            .as_deref()
            .ok_or_else(|| ConfigError::missing_field(&self.id, "port"))?;

        let group: Ipv4Addr = ip
            .parse()
            .map_err(|_| ConfigError::invalid_field(&self.id, "ip", ip))?;
        let port: u16 = port
            .parse()
            .map_err(|_| ConfigError::invalid_field(&self.id, "port", port))?;
        if port == 0 {
            return Err(ConfigError::invalid_field(&self.id, "port", "0"));
        }

        Ok(FeedEndpoint::new(group, port))
    }
}

/// A `<channel>` element.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChannelDef {
    /// Channel id.
    pub id: u32,
    /// Human readable label.
    pub label: String,
    /// Connections published for this channel.
    pub connections: Vec<ConnectionDef>,
}

impl ChannelDef {
    /// Creates a channel definition with no connections.
    #[must_use]
    pub fn new(id: u32, label: impl Into<String>) -> Self {
        Self {
            id,
            label: label.into(),
            connections: Vec::new(),
        }
    }

    /// Finds a connection by id.
    #[must_use]
    pub fn connection(&self, id: &str) -> Option<&ConnectionDef> {
        self.connections.iter().find(|c| c.id == id)
    }
}

/// The A and B endpoints of one feed of one channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelFeeds {
    /// Channel id.
    pub channel_id: u32,
    /// Channel label.
    pub label: String,
    /// Line A endpoint.
    pub feed_a: FeedEndpoint,
    /// Line B endpoint.
    pub feed_b: FeedEndpoint,
}

impl ChannelFeeds {
    /// Returns the endpoint for a line.
    #[must_use]
    pub fn endpoint(&self, line: Line) -> FeedEndpoint {
        match line {
            Line::A => self.feed_a,
            Line::B => self.feed_b,
        }
    }
}

/// Parsed CME Globex configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CmeConfig {
    channels: BTreeMap<u32, ChannelDef>,
}

impl CmeConfig {
    /// Creates an empty configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads and parses a configuration file.
    ///
    /// # Errors
    /// Returns `ConfigError` if the file cannot be read or parsed.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let xml = std::fs::read_to_string(path)?;
        crate::parser::parse_config(&xml)
    }

    /// Adds a channel.
    ///
    /// # Errors
    /// Returns `ConfigError::DuplicateDefinition` if the id is already present.
    pub fn add_channel(&mut self, channel: ChannelDef) -> Result<(), ConfigError> {
        if self.channels.contains_key(&channel.id) {
            return Err(ConfigError::duplicate("channel", channel.id.to_string()));
        }
        self.channels.insert(channel.id, channel);
        Ok(())
    }

    /// Returns all channel ids in ascending order.
    #[must_use]
    pub fn channel_ids(&self) -> Vec<u32> {
        self.channels.keys().copied().collect()
    }

    /// Returns the number of channels.
    #[must_use]
    pub fn len(&self) -> usize {
        self.channels.len()
    }

    /// Returns true if no channel is defined.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// Looks up a channel.
    ///
    /// # Errors
    /// Returns `ConfigError::ChannelNotFound` if the channel is not defined.
    pub fn channel(&self, channel: u32) -> Result<&ChannelDef, ConfigError> {
        self.channels
            .get(&channel)
            .ok_or(ConfigError::ChannelNotFound { channel })
    }

    /// Returns the label of a channel.
    ///
    /// # Errors
    /// Returns `ConfigError::ChannelNotFound` if the channel is not defined.
    pub fn channel_label(&self, channel: u32) -> Result<&str, ConfigError> {
        Ok(self.channel(channel)?.label.as_str())
    }

    /// Resolves the endpoint of one line of one feed.
    ///
    /// # Errors
    /// Returns `ConfigError` if the channel or connection is missing or malformed.
    pub fn feed(&self, channel: u32, kind: FeedKind, line: Line) -> Result<FeedEndpoint, ConfigError> {
        let def = self.channel(channel)?;
        let connection_id = kind.connection_id(channel, line);
        def.connection(&connection_id)
            .ok_or(ConfigError::ConnectionNotFound {
                channel,
                connection: connection_id,
            })?
            .endpoint()
    }

    /// Resolves both lines of one feed.
    ///
    /// # Errors
    /// Returns `ConfigError` if either line is missing or malformed.
    pub fn feeds(&self, channel: u32, kind: FeedKind) -> Result<ChannelFeeds, ConfigError> {
        Ok(ChannelFeeds {
            channel_id: channel,
            label: self.channel_label(channel)?.to_string(),
            feed_a: self.feed(channel, kind, Line::A)?,
            feed_b: self.feed(channel, kind, Line::B)?,
        })
    }

    /// Resolves the incremental A/B feeds of a channel.
    ///
    /// # Errors
    /// Returns `ConfigError` if either line is missing or malformed.
    pub fn incremental_feeds(&self, channel: u32) -> Result<ChannelFeeds, ConfigError> {
        self.feeds(channel, FeedKind::Incremental)
    }

    /// Resolves the instrument definition A/B feeds of a channel.
    ///
    /// # Errors
    /// Returns `ConfigError` if either line is missing or malformed.
    pub fn instrument_feeds(&self, channel: u32) -> Result<ChannelFeeds, ConfigError> {
        self.feeds(channel, FeedKind::InstrumentDefinition)
    }

    /// Resolves the snapshot A/B feeds of a channel.
    ///
    /// # Errors
    /// Returns `ConfigError` if either line is missing or malformed.
    pub fn snapshot_feeds(&self, channel: u32) -> Result<ChannelFeeds, ConfigError> {
        self.feeds(channel, FeedKind::Snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn connection(id: &str, ip: &str, port: &str) -> ConnectionDef {
        ConnectionDef {
            ip: Some(ip.to_string()),
            port: Some(port.to_string()),
            ..ConnectionDef::new(id)
        }
    }

    fn sample() -> CmeConfig {
        let mut channel = ChannelDef::new(310, "CME Globex Equity Futures");
        channel
            .connections
            .push(connection("310IA", "224.0.31.1", "14310"));
        channel
            .connections
            .push(connection("310IB", "224.0.32.1", "15310"));
        channel
            .connections
            .push(connection("310SA", "224.0.31.22", "14331"));

        let mut config = CmeConfig::new();
        config.add_channel(channel).unwrap();
        config
    }

    #[test]
    fn test_connection_id() {
        assert_eq!(FeedKind::Incremental.connection_id(310, Line::A), "310IA");
        assert_eq!(FeedKind::Snapshot.connection_id(7, Line::B), "7SB");
        assert_eq!(
            FeedKind::InstrumentDefinition.connection_id(42, Line::A),
            "42NA"
        );
    }

    #[test]
    fn test_incremental_feeds() {
        let feeds = sample().incremental_feeds(310).unwrap();
        assert_eq!(feeds.channel_id, 310);
        assert_eq!(feeds.feed_a.to_string(), "224.0.31.1:14310");
        assert_eq!(feeds.endpoint(Line::B).to_string(), "224.0.32.1:15310");
    }

    #[test]
    fn test_missing_channel() {
        let err = sample().incremental_feeds(999).unwrap_err();
        assert!(matches!(err, ConfigError::ChannelNotFound { channel: 999 }));
    }

    #[test]
    fn test_missing_connection() {
        let err = sample().snapshot_feeds(310).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::ConnectionNotFound { ref connection, .. } if connection == "310SB"
        ));
    }

    #[test]
    fn test_invalid_endpoint_fields() {
        let err = connection("1IA", "not-an-ip", "1").endpoint().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidField { ref field, .. } if field == "ip"));

        let err = connection("1IA", "224.0.0.1", "70000")
            .endpoint()
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidField { ref field, .. } if field == "port"));

        let err = ConnectionDef::new("1IA").endpoint().unwrap_err();
        assert!(matches!(err, ConfigError::MissingField { ref field, .. } if field == "ip"));
    }

    #[test]
    fn test_duplicate_channel() {
        let mut config = sample();
        let err = config.add_channel(ChannelDef::new(310, "dup")).unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateDefinition { .. }));
        assert_eq!(config.len(), 1);
    }
}
