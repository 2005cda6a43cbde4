//! Multicast feed sockets.

use crate::error::TransportError;
use mdparb_core::FeedEndpoint;
use socket2::{Domain, Protocol, Socket, Type};
use std::net::{Ipv4Addr, SocketAddr};
use tokio::net::UdpSocket;

/// Default kernel receive buffer requested per socket.
pub const DEFAULT_RECV_BUFFER_SIZE: usize = 16 * 1024 * 1024;

/// Socket options shared by every feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MulticastConfig {
    /// Local interface used for group membership.
    pub interface: Ipv4Addr,
    /// Requested kernel receive buffer size in bytes.
    pub recv_buffer_size: usize,
    /// Bind to the group address instead of the wildcard address.
    ///
    /// Keeps sockets sharing a port from seeing each other's groups. Not
    /// supported on Windows.
    pub bind_to_group: bool,
}

impl Default for MulticastConfig {
    fn default() -> Self {
        Self {
            interface: Ipv4Addr::UNSPECIFIED,
            recv_buffer_size: DEFAULT_RECV_BUFFER_SIZE,
            bind_to_group: cfg!(unix),
        }
    }
}

impl MulticastConfig {
    /// Creates a config for the given interface.
    #[must_use]
    pub fn new(interface: Ipv4Addr) -> Self {
        Self {
            interface,
            ..Default::default()
        }
    }

    /// Sets the requested receive buffer size.
    #[must_use]
    pub fn recv_buffer_size(mut self, size: usize) -> Self {
        self.recv_buffer_size = size;
        self
    }

    /// Sets whether to bind to the group address.
    #[must_use]
    pub fn bind_to_group(mut self, enabled: bool) -> Self {
        self.bind_to_group = enabled;
        self
    }
}

/// A UDP socket subscribed to one feed.
#[derive(Debug)]
pub struct MulticastSocket {
    socket: UdpSocket,
    endpoint: FeedEndpoint,
    interface: Ipv4Addr,
    joined: bool,
}

impl MulticastSocket {
    /// Opens a socket and joins the feed's group.
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Errors
    /// Returns `TransportError` if the endpoint is not a multicast group or
    /// any socket operation fails.
    pub fn join(endpoint: FeedEndpoint, config: &MulticastConfig) -> Result<Self, TransportError> {
        if !endpoint.group.is_multicast() {
            return Err(TransportError::NotMulticast { endpoint });
        }

        let socket = Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP))
            .map_err(|e| TransportError::setup(endpoint, e))?;
        socket
            .set_reuse_address(true)
            .map_err(|e| TransportError::setup(endpoint, e))?;
        set_recv_buffer(&socket, endpoint, config.recv_buffer_size)?;
        socket
            .set_nonblocking(true)
            .map_err(|e| TransportError::setup(endpoint, e))?;

        let bind_ip = if config.bind_to_group {
            endpoint.group
        } else {
            Ipv4Addr::UNSPECIFIED
        };
        let bind_addr = SocketAddr::from((bind_ip, endpoint.port));
        socket
            .bind(&bind_addr.into())
            .map_err(|e| TransportError::setup(endpoint, e))?;

        socket
            .join_multicast_v4(&endpoint.group, &config.interface)
            .map_err(|e| TransportError::multicast(endpoint, format!("join failed: {e}")))?;
        socket
            .set_multicast_if_v4(&config.interface)
            .map_err(|e| TransportError::setup(endpoint, e))?;

        let socket = UdpSocket::from_std(socket.into())?;
        tracing::info!(%endpoint, interface = %config.interface, "joined multicast group");

        Ok(Self {
            socket,
            endpoint,
            interface: config.interface,
            joined: true,
        })
    }

    /// Wraps an already bound socket without joining any group.
    ///
    /// Used for unicast replays of a feed.
    #[must_use]
    pub fn from_socket(socket: UdpSocket, endpoint: FeedEndpoint) -> Self {
        Self {
            socket,
            endpoint,
            interface: Ipv4Addr::UNSPECIFIED,
            joined: false,
        }
    }

    /// Receives one datagram into `buf`.
    ///
    /// # Errors
    /// Returns IO error if the receive fails.
    pub async fn recv(&self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.socket.recv(buf).await
    }

    /// Leaves the group. Does nothing for sockets that never joined one.
    ///
    /// # Errors
    /// Returns `TransportError::Multicast` if the kernel rejects the request.
    pub fn leave(&self) -> Result<(), TransportError> {
        if !self.joined {
            return Ok(());
        }
        self.socket
            .leave_multicast_v4(self.endpoint.group, self.interface)
            .map_err(|e| TransportError::multicast(self.endpoint, format!("leave failed: {e}")))?;
        tracing::info!(endpoint = %self.endpoint, "left multicast group");
        Ok(())
    }

    /// Returns the feed endpoint.
    #[must_use]
    pub fn endpoint(&self) -> FeedEndpoint {
        self.endpoint
    }

    /// Returns the local address.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.socket.local_addr()
    }
}

/// Requests `size` bytes of receive buffer and warns if the kernel grants less.
fn set_recv_buffer(socket: &Socket, endpoint: FeedEndpoint, size: usize) -> Result<(), TransportError> {
    socket
        .set_recv_buffer_size(size)
        .map_err(|e| TransportError::setup(endpoint, e))?;
    let granted = socket
        .recv_buffer_size()
        .map_err(|e| TransportError::setup(endpoint, e))?;
    if granted < size {
        tracing::warn!(
            %endpoint,
            requested = size,
            granted,
            "receive buffer smaller than requested, raise net.core.rmem_max"
        );
    }
    Ok(())
}
