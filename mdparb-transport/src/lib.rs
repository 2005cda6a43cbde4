//! # mdparb Transport
//!
//! Multicast transport for A/B market data feeds.
//!
//! This crate provides:
//! - [`multicast`] - Socket setup, group join/leave and receive buffer sizing
//! - [`receiver`] - Per-feed receive tasks forwarding datagrams over a channel

pub mod error;
pub mod multicast;
pub mod receiver;

pub use error::TransportError;
pub use multicast::{MulticastConfig, MulticastSocket};
pub use receiver::{Datagram, FeedReceiver};
