//! The per-connection session record.

use roshambo_protocol::{PlayerId, RoomId};

/// The server's record of one live connection's place in the game.
///
/// Created when a connection successfully creates, joins, or rejoins a
/// room; removed when the connection drops or the player is removed.
#[derive(Debug, Clone)]
pub struct Session {
    /// The stable player this connection speaks for.
    pub player_id: PlayerId,

    /// The room the player belongs to (by internal id, which survives
    /// code rotation).
    pub room_id: RoomId,

    /// Username at bind time, kept for logging.
    pub username: String,
}
