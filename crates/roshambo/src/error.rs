//! Unified error type for the server.

use roshambo_protocol::ProtocolError;
use roshambo_room::RoomError;
use roshambo_session::SessionError;
use roshambo_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` attribute on each variant auto-generates `From` impls,
/// so the `?` operator converts sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum RoshamboError {
    /// A transport-level error (bind, accept, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode, invalid message).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A session-level error (connection binding).
    #[error(transparent)]
    Session(#[from] SessionError),

    /// A room-level error (not found, wrong phase, authorization).
    #[error(transparent)]
    Room(#[from] RoomError),
}
