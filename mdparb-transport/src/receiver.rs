//! Per-feed receive tasks.

use crate::multicast::MulticastSocket;
use bytes::{Bytes, BytesMut};
use mdparb_core::Line;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Largest datagram read from a feed.
pub const DEFAULT_MAX_DATAGRAM_SIZE: usize = 1500;

/// A datagram received on one line of a channel.
#[derive(Debug, Clone)]
pub struct Datagram {
    /// Channel the feed belongs to.
    pub channel_id: u32,
    /// Line the datagram arrived on.
    pub line: Line,
    /// Raw datagram bytes, sequence header included.
    pub payload: Bytes,
    /// Receive time.
    pub received_at: Instant,
}

/// Reads datagrams from one feed socket and forwards them to a channel.
#[derive(Debug)]
pub struct FeedReceiver {
    socket: Arc<MulticastSocket>,
    channel_id: u32,
    line: Line,
    max_datagram_size: usize,
}

impl FeedReceiver {
    /// Creates a receiver for one line of a channel.
    #[must_use]
    pub fn new(socket: Arc<MulticastSocket>, channel_id: u32, line: Line) -> Self {
        Self {
            socket,
            channel_id,
            line,
            max_datagram_size: DEFAULT_MAX_DATAGRAM_SIZE,
        }
    }

    /// Sets the largest datagram read; longer datagrams are truncated by the kernel.
    #[must_use]
    pub fn max_datagram_size(mut self, size: usize) -> Self {
        self.max_datagram_size = size;
        self
    }

    /// Spawns the receive loop on the current runtime.
    ///
    /// The task ends when `tx` is closed. Receive errors are logged and the
    /// loop keeps going.
    pub fn spawn(self, tx: mpsc::Sender<Datagram>) -> JoinHandle<()> {
        tokio::spawn(self.run(tx))
    }

    async fn run(self, tx: mpsc::Sender<Datagram>) {
        let endpoint = self.socket.endpoint();
        let mut buf = BytesMut::with_capacity(self.max_datagram_size);
        tracing::debug!(channel = self.channel_id, line = %self.line, %endpoint, "receiver started");

        loop {
            buf.resize(self.max_datagram_size, 0);
            let len = match self.socket.recv(&mut buf).await {
                Ok(len) => len,
                Err(e) => {
                    tracing::warn!(
                        channel = self.channel_id,
                        line = %self.line,
                        %endpoint,
                        "receive failed: {}",
                        e
                    );
                    continue;
                }
            };
            buf.truncate(len);

            let datagram = Datagram {
                channel_id: self.channel_id,
                line: self.line,
                payload: buf.split().freeze(),
                received_at: Instant::now(),
            };
            if tx.send(datagram).await.is_err() {
                break;
            }
        }

        tracing::debug!(channel = self.channel_id, line = %self.line, %endpoint, "receiver stopped");
    }
}
