//! WebSocket transport layer for Roshambo.
//!
//! Browsers speak JSON over WebSocket text frames, so this layer deals in
//! `String` messages. Each accepted socket becomes a [`WebSocketConnection`]
//! whose send and receive halves are independently lockable: room
//! broadcasts must go out while the connection's reader task is parked in
//! [`WebSocketConnection::recv`].

mod error;
mod websocket;

pub use error::TransportError;
pub use websocket::{WebSocketConnection, WebSocketTransport};

use std::fmt;

/// Opaque identifier for a live connection.
///
/// Connection ids are transient: a client that drops and reconnects gets a
/// fresh id. Durable player identity lives in the session/room layers and
/// is keyed by `PlayerId`, never by this.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Creates a new `ConnectionId` from a raw `u64`.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the underlying `u64` value.
    pub fn into_inner(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}
