//! Error types for the session layer.

use roshambo_transport::ConnectionId;

/// Errors that can occur during session tracking.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The connection is already bound to a player. A connection speaks
    /// for at most one player at a time.
    #[error("connection {0} is already in a room")]
    AlreadyBound(ConnectionId),
}
