//! Core types shared by intents, events, and the game logic.

use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A stable identifier for a player within a room.
///
/// Allocated by the server the first time a username joins a room and kept
/// for the player's whole stay, across disconnects and rejoins. Connection
/// handles come and go; this does not.
///
/// `#[serde(transparent)]` makes `PlayerId(42)` serialize as plain `42`,
/// which is what the browser client expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub u64);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P-{}", self.0)
    }
}

/// The stable internal identifier of a room.
///
/// Never shown to players; joining always goes through the public
/// [`RoomCode`], which can rotate while this id stays fixed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(pub u64);

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "R-{}", self.0)
    }
}

/// An identifier for one chat message, unique within its room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(pub u64);

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "M-{}", self.0)
    }
}

/// The short human-shareable code players type (or deep-link) to join.
///
/// Codes are matched case-insensitively, so the canonical form stored and
/// sent on the wire is uppercase. Generation (alphabet, length, uniqueness)
/// lives with the room registry; this type only carries the value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomCode(String);

impl RoomCode {
    /// Canonicalizes the given code to uppercase.
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into().to_uppercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Game values
// ---------------------------------------------------------------------------

/// A player's move for one round.
///
/// Serialized lowercase (`"rock"`) to match what the browser sends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Choice {
    Rock,
    Paper,
    Scissors,
}

/// The per-player result of one round, from that player's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Win,
    Lose,
    Tie,
}

// ---------------------------------------------------------------------------
// Recipient: who should receive an event?
// ---------------------------------------------------------------------------

/// Specifies who should receive a server event.
///
/// Room logic returns lists of `(Recipient, ServerEvent)` pairs; the
/// dispatch layer turns each pair into actual sends. This keeps the game
/// logic free of any knowledge of connections.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recipient {
    /// Every player in the room.
    All,

    /// One specific player.
    Player(PlayerId),

    /// Everyone except the specified player.
    AllExcept(PlayerId),
}

// ---------------------------------------------------------------------------
// Payload structs
// ---------------------------------------------------------------------------

/// One entry in a `player-list` broadcast.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerInfo {
    pub player_id: PlayerId,
    pub username: String,
    pub is_host: bool,
    pub wins: u32,
    /// False while the player is inside the reconnection grace window.
    pub connected: bool,
    /// Whether the player has locked in a choice this round. The choice
    /// itself is never broadcast before resolution.
    pub has_chosen: bool,
}

/// One row of the standings sent with `game-results` and `game-over`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub player_id: PlayerId,
    pub username: String,
    pub wins: u32,
}

/// One chat message as stored and broadcast.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatEntry {
    pub message_id: MessageId,
    pub player_id: PlayerId,
    pub username: String,
    pub text: String,
    /// Milliseconds since the Unix epoch, for client-side ordering.
    pub timestamp_ms: u64,
}

// =========================================================================
// Tests
// =========================================================================
