//! Client-to-server intents.

use serde::{Deserialize, Serialize};

use crate::{Choice, MessageId, PlayerId};

/// Everything a client may ask the server to do.
///
/// `#[serde(tag = "type", rename_all = "kebab-case")]` produces the flat
/// tagged shape the browser sends, e.g.
/// `{ "type": "make-choice", "choice": "rock" }`.
///
/// Host-only intents (`start-game`, `kick-player`, `return-to-lobby`,
/// `cancel-game`, `change-room-code`, `toggle-chat-lock`) are still plain
/// variants here; authorization is the room's job, not the parser's.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ClientIntent {
    // -- Room membership --
    /// Create a fresh room with the sender as host.
    CreateRoom { username: String },

    /// Join an existing room by its public code.
    JoinRoom { room_code: String, username: String },

    /// Reclaim a disconnected seat by room code + username.
    RejoinRoom { room_code: String, username: String },

    // -- Game flow --
    /// Host only: start the first round from the lobby.
    StartGame,

    /// Lock in a move for the current round.
    MakeChoice { choice: Choice },

    /// Host only: remove a player from the room.
    KickPlayer { player_id: PlayerId },

    /// Host only: stop the game and reset scores back to the lobby.
    ReturnToLobby,

    /// Host only: abort the game in progress.
    CancelGame,

    /// Host only: rotate the room's public code.
    ChangeRoomCode,

    // -- Chat --
    ChatMessage { text: String },

    /// Host only: remove a message from the room's chat log.
    DeleteMessage { message_id: MessageId },

    /// Host only: toggle whether non-hosts may chat.
    ToggleChatLock,
}
