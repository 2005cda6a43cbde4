//! CME Globex `config.xml` parser.
//!
//! Only the parts needed to locate feeds are read:
//!
//! ```text
//! <configuration>
//!   <channel id="310" label="CME Globex Equity Futures">
//!     <connections>
//!       <connection id="310IA">
//!         <type feed-type="I">Incremental</type>
//!         <protocol>UDP/IP</protocol>
//!         <ip>224.0.31.1</ip>
//!         <host-ip>205.209.223.70</host-ip>
//!         <port>14310</port>
//!         <feed>A</feed>
//!       </connection>
//!     </connections>
//!   </channel>
//! </configuration>
//! ```
//!
//! Products and any other elements are skipped.

use crate::channels::{ChannelDef, CmeConfig, ConnectionDef};
use crate::error::ConfigError;
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

/// Connection child elements whose text is captured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConnectionField {
    Type,
    Protocol,
    Ip,
    HostIp,
    Port,
    Feed,
}

impl ConnectionField {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "type" => Some(Self::Type),
            "protocol" => Some(Self::Protocol),
            "ip" => Some(Self::Ip),
            "host-ip" => Some(Self::HostIp),
            "port" => Some(Self::Port),
            "feed" => Some(Self::Feed),
            _ => None,
        }
    }

    fn slot(self, connection: &mut ConnectionDef) -> &mut Option<String> {
        match self {
            Self::Type => &mut connection.type_name,
            Self::Protocol => &mut connection.protocol,
            Self::Ip => &mut connection.ip,
            Self::HostIp => &mut connection.host_ip,
            Self::Port => &mut connection.port,
            Self::Feed => &mut connection.feed,
        }
    }
}

/// Parses a CME Globex configuration document.
///
/// # Arguments
/// * `xml` - Document content
///
/// # Errors
/// Returns `ConfigError` if the XML is malformed, a channel id is missing or
/// invalid, or a channel or connection is defined twice.
pub fn parse_config(xml: &str) -> Result<CmeConfig, ConfigError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut config = CmeConfig::new();
    let mut seen_root = false;
    let mut channel: Option<ChannelDef> = None;
    let mut connection: Option<ConnectionDef> = None;
    let mut field: Option<ConnectionField> = None;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                let name_bytes = e.name().as_ref().to_vec();
                let name = std::str::from_utf8(&name_bytes)?;
                match name {
                    "configuration" => seen_root = true,
                    "channel" => channel = Some(parse_channel(e)?),
                    "connection" if channel.is_some() => {
                        connection = Some(ConnectionDef::new(required_attr(e, "connection", "id")?));
                    }
                    _ if connection.is_some() => field = ConnectionField::from_name(name),
                    _ => {}
                }
            }
            Ok(Event::Empty(ref e)) => {
                let name_bytes = e.name().as_ref().to_vec();
                let name = std::str::from_utf8(&name_bytes)?;
                if name == "channel" {
                    config.add_channel(parse_channel(e)?)?;
                }
            }
            Ok(Event::Text(ref t)) => {
                if let (Some(conn), Some(f)) = (connection.as_mut(), field) {
                    let text = std::str::from_utf8(t.as_ref())?.trim();
                    if !text.is_empty() {
                        *f.slot(conn) = Some(text.to_string());
                    }
                }
            }
            Ok(Event::End(ref e)) => {
                let name_bytes = e.name().as_ref().to_vec();
                let name = std::str::from_utf8(&name_bytes)?;
                match name {
                    "connection" => {
                        if let (Some(ch), Some(conn)) = (channel.as_mut(), connection.take()) {
                            if ch.connection(&conn.id).is_some() {
                                return Err(ConfigError::duplicate("connection", conn.id));
                            }
                            ch.connections.push(conn);
                        }
                        field = None;
                    }
                    "channel" => {
                        if let Some(ch) = channel.take() {
                            config.add_channel(ch)?;
                        }
                    }
                    _ => field = None,
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(ConfigError::Xml(e)),
            _ => {}
        }
        buf.clear();
    }

    if !seen_root {
        return Err(ConfigError::InvalidStructure {
            message: "No configuration element found".to_string(),
        });
    }

    Ok(config)
}

/// Parses the `<channel>` element attributes.
fn parse_channel(e: &BytesStart<'_>) -> Result<ChannelDef, ConfigError> {
    let mut id: Option<u32> = None;
    let mut label = String::new();

    for attr in e.attributes().flatten() {
        let key = std::str::from_utf8(attr.key.as_ref())?;
        let value = std::str::from_utf8(&attr.value)?;

        match key {
            "id" => {
                id = Some(
                    value
                        .trim()
                        .parse()
                        .map_err(|_| ConfigError::invalid_attr("channel", "id", value))?,
                )
            }
            "label" => label = value.to_string(),
            _ => {}
        }
    }

    let id = id.ok_or_else(|| ConfigError::missing_attr("channel", "id"))?;
    Ok(ChannelDef::new(id, label))
}

/// Reads a required string attribute.
fn required_attr(e: &BytesStart<'_>, element: &str, attribute: &str) -> Result<String, ConfigError> {
    for attr in e.attributes().flatten() {
        if attr.key.as_ref() == attribute.as_bytes() {
            return Ok(std::str::from_utf8(&attr.value)?.trim().to_string());
        }
    }
    Err(ConfigError::missing_attr(element, attribute))
}

/// Parses a comma separated channel list such as `310,312,340`.
///
/// The result is sorted and free of duplicates.
///
/// # Errors
/// Returns `ConfigError::InvalidChannelList` if the list is empty or an entry
/// is not a positive integer.
pub fn parse_channel_list(input: &str) -> Result<Vec<u32>, ConfigError> {
    let invalid = |message: String| ConfigError::InvalidChannelList {
        input: input.to_string(),
        message,
    };

    let mut channels = Vec::new();
    for part in input.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let id: u32 = part
            .parse()
            .map_err(|_| invalid(format!("'{part}' is not a channel id")))?;
        if id == 0 {
            return Err(invalid("channel ids must be positive".to_string()));
        }
        channels.push(id);
    }

    if channels.is_empty() {
        return Err(invalid("no channels given".to_string()));
    }

    channels.sort_unstable();
    channels.dedup();
    Ok(channels)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channels::FeedKind;
    use mdparb_core::Line;

    const CONFIG: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<configuration environment="Production" updated="2014-01-01">
  <channel id="310" label="CME Globex Equity Futures">
    <products>
      <product code="ES"><group code="ES"/></product>
    </products>
    <connections>
      <connection id="310IA">
        <type feed-type="I">Incremental</type>
        <protocol>UDP/IP</protocol>
        <ip>224.0.31.1</ip>
        <host-ip>205.209.223.70</host-ip>
        <port>14310</port>
        <feed>A</feed>
      </connection>
      <connection id="310IB">
        <type feed-type="I">Incremental</type>
        <protocol>UDP/IP</protocol>
        <ip>224.0.32.1</ip>
        <host-ip>205.209.221.70</host-ip>
        <port>15310</port>
        <feed>B</feed>
      </connection>
      <connection id="310NA">
        <type feed-type="N">Instrument Replay</type>
        <ip>224.0.31.43</ip>
        <port>14352</port>
        <feed>A</feed>
      </connection>
    </connections>
  </channel>
  <channel id="312" label="CME Globex Equity Options">
    <connections>
      <connection id="312IA">
        <ip>224.0.31.3</ip>
        <port>14312</port>
      </connection>
      <connection id="312IB">
        <ip>224.0.32.3</ip>
        <port>bad</port>
      </connection>
    </connections>
  </channel>
</configuration>
"#;

    #[test]
    fn test_parse_channels() {
        let config = parse_config(CONFIG).unwrap();
        assert_eq!(config.channel_ids(), vec![310, 312]);
        assert_eq!(
            config.channel_label(310).unwrap(),
            "CME Globex Equity Futures"
        );

        let channel = config.channel(310).unwrap();
        assert_eq!(channel.connections.len(), 3);
        let ia = channel.connection("310IA").unwrap();
        assert_eq!(ia.type_name.as_deref(), Some("Incremental"));
        assert_eq!(ia.protocol.as_deref(), Some("UDP/IP"));
        assert_eq!(ia.host_ip.as_deref(), Some("205.209.223.70"));
        assert_eq!(ia.feed.as_deref(), Some("A"));
    }

    #[test]
    fn test_resolve_incremental_feeds() {
        let config = parse_config(CONFIG).unwrap();
        let feeds = config.incremental_feeds(310).unwrap();
        assert_eq!(feeds.feed_a.to_string(), "224.0.31.1:14310");
        assert_eq!(feeds.feed_b.to_string(), "224.0.32.1:15310");
        assert_eq!(
            config
                .feed(310, FeedKind::InstrumentDefinition, Line::A)
                .unwrap()
                .port,
            14352
        );
    }

    #[test]
    fn test_malformed_port_fails_on_lookup() {
        let config = parse_config(CONFIG).unwrap();
        assert!(config.feed(312, FeedKind::Incremental, Line::A).is_ok());
        let err = config.incremental_feeds(312).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidField { .. }));
    }

    #[test]
    fn test_channel_without_id() {
        let err = parse_config("<configuration><channel label=\"x\"></channel></configuration>")
            .unwrap_err();
        assert!(matches!(err, ConfigError::MissingAttribute { .. }));
    }

    #[test]
    fn test_invalid_channel_id() {
        let err = parse_config("<configuration><channel id=\"abc\"/></configuration>").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidAttribute { .. }));
    }

    #[test]
    fn test_duplicate_connection() {
        let xml = r#"<configuration><channel id="1"><connections>
            <connection id="1IA"><ip>224.0.0.1</ip><port>1</port></connection>
            <connection id="1IA"><ip>224.0.0.2</ip><port>2</port></connection>
        </connections></channel></configuration>"#;
        let err = parse_config(xml).unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateDefinition { .. }));
    }

    #[test]
    fn test_missing_root() {
        let err = parse_config("<other/>").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidStructure { .. }));
    }

    #[test]
    fn test_parse_channel_list() {
        assert_eq!(parse_channel_list("312, 310,312").unwrap(), vec![310, 312]);
        assert_eq!(parse_channel_list("7").unwrap(), vec![7]);
        assert!(parse_channel_list("").is_err());
        assert!(parse_channel_list("310,x").is_err());
        assert!(parse_channel_list("0").is_err());
    }
}
