//! Error types for the room layer.
//!
//! Every rejected intent leaves room state unchanged and turns into a
//! single `error` event to the originating connection, so the `#[error]`
//! strings here are player-facing text, not log lines.

use roshambo_protocol::RoomId;

/// Errors that can occur during room operations.
#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    /// No room with the given code exists.
    #[error("Room not found")]
    NotFound,

    /// A non-host attempted a host-only operation. The inner string names
    /// the operation, e.g. "start the game".
    #[error("Only the host can {0}")]
    NotHost(&'static str),

    /// Not enough contestants to start a round.
    #[error("Need at least {0} players to start")]
    NotEnoughPlayers(usize),

    /// Strict parity is on and the contestant count is odd.
    #[error("Need an even number of players to start")]
    OddPlayerCount,

    /// The username is already taken in this room (case-insensitive).
    #[error("Username \"{0}\" is already taken")]
    UsernameTaken(String),

    /// The username failed validation. The inner string says why.
    #[error("{0}")]
    InvalidUsername(String),

    /// The operation does not apply in the room's current phase.
    #[error("{0}")]
    WrongPhase(&'static str),

    /// The target player is not in this room.
    #[error("Player not found")]
    PlayerNotFound,

    /// The host tried to kick themselves.
    #[error("You cannot kick yourself")]
    CannotKickSelf,

    /// The player has no match this round (host, bye, or late arrival).
    #[error("You are not playing this round")]
    NotInRound,

    /// No disconnected seat matches the rejoin request.
    #[error("No disconnected player with that name")]
    RejoinFailed,

    /// Chat is locked for non-hosts.
    #[error("Chat is locked")]
    ChatLocked,

    /// The chat message failed validation. The inner string says why.
    #[error("{0}")]
    InvalidMessage(String),

    /// The player is sending chat messages too quickly.
    #[error("You are sending messages too quickly")]
    RateLimited,

    /// The room's command channel is closed (actor gone).
    #[error("Room {0} is unavailable")]
    Unavailable(RoomId),
}
