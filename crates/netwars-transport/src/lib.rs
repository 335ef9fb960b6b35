//! Transport abstraction layer for Netwars.
//!
//! Provides the [`Transport`] and [`Connection`] traits and the TCP
//! implementation the game server listens on. Connections deal in raw
//! byte chunks: message boundaries are the protocol layer's business.

#![allow(async_fn_in_trait)]

mod error;
mod tcp;

pub use error::TransportError;
pub use tcp::{TcpConnection, TcpTransport};

use std::fmt;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};

/// Identity of one accepted socket.
///
/// A player keeps their name across reconnects but every socket gets a
/// fresh id, so the server can tell a rebound seat's new socket from the
/// old one still draining. Ids are never reused within a process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

/// Next id handed out by [`ConnectionId::next`]. Starts at 1.
static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

impl ConnectionId {
    /// Wraps a raw id. Tests use this to build ids by hand.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Allocates the id for a newly accepted socket.
    pub fn next() -> Self {
        Self(NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

/// Logged as `conn-N`.
impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Accepts new incoming connections.
pub trait Transport: Send + Sync + 'static {
    /// The connection type produced by this transport.
    type Connection: Connection;
    /// The error type for transport operations.
    type Error: std::error::Error + Send + Sync;

    /// Waits for and accepts the next incoming connection.
    async fn accept(&mut self) -> Result<Self::Connection, Self::Error>;

    /// Returns the address the transport is listening on.
    fn local_addr(&self) -> Result<SocketAddr, Self::Error>;
}

/// A single connection that can send and receive bytes.
///
/// Sending and receiving must be usable concurrently from different
/// tasks: a reader blocked in [`recv`](Self::recv) may not stall a
/// writer.
pub trait Connection: Send + Sync + 'static {
    /// The error type for connection operations.
    type Error: std::error::Error + Send + Sync;

    /// Sends data to the remote peer.
    async fn send(&self, data: &[u8]) -> Result<(), Self::Error>;

    /// Receives the next chunk of bytes from the remote peer.
    ///
    /// Chunks carry no framing: one chunk may hold part of a message or
    /// several messages. Returns `Ok(None)` when the peer closed the
    /// connection.
    async fn recv(&self) -> Result<Option<Vec<u8>>, Self::Error>;

    /// Shuts down the sending side of the connection.
    async fn close(&self) -> Result<(), Self::Error>;

    /// Returns the unique identifier for this connection.
    fn id(&self) -> ConnectionId;
}
