//! Multicast feed endpoints.

use std::fmt;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};

/// A multicast group and port carrying one line of a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FeedEndpoint {
    /// Multicast group address.
    pub group: Ipv4Addr,
    /// UDP port.
    pub port: u16,
}

impl FeedEndpoint {
    /// Creates a new feed endpoint.
    #[must_use]
    pub const fn new(group: Ipv4Addr, port: u16) -> Self {
        Self { group, port }
    }

    /// Returns the endpoint as a socket address.
    #[must_use]
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::V4(SocketAddrV4::new(self.group, self.port))
    }
}

impl fmt::Display for FeedEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.group, self.port)
    }
}
