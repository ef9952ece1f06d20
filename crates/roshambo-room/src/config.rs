//! Room configuration and phase machine.

// ---------------------------------------------------------------------------
// RoomConfig
// ---------------------------------------------------------------------------

/// Configuration for a room instance.
///
/// One copy per room; the server builder can override the defaults for
/// every room it creates.
#[derive(Debug, Clone)]
pub struct RoomConfig {
    /// Minimum contestants (non-host players) required to start a round.
    pub min_players: usize,

    /// Whether an odd contestant count may start, leaving one bye per
    /// round. Off by default: strict parity.
    pub allow_bye: bool,

    /// How long players have to lock in a choice each round.
    pub round_secs: u64,

    /// How long results are shown before the next round starts.
    pub results_secs: u64,

    /// Cumulative wins that end the game.
    pub win_threshold: u32,

    /// How long a disconnected player keeps their seat before removal.
    pub reconnect_grace_secs: u64,

    /// Chat log capacity; the oldest message is evicted beyond this.
    pub chat_capacity: usize,

    /// Maximum chat message length in characters.
    pub chat_max_len: usize,

    /// Minimum interval between chat messages from one player.
    pub chat_min_interval_ms: u64,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            min_players: 2,
            allow_bye: false,
            round_secs: 30,
            results_secs: 5,
            win_threshold: 10,
            reconnect_grace_secs: 30,
            chat_capacity: 100,
            chat_max_len: 500,
            chat_min_interval_ms: 1000,
        }
    }
}

// ---------------------------------------------------------------------------
// Phase
// ---------------------------------------------------------------------------

/// The lifecycle phase of a room.
///
/// ```text
/// Lobby → Playing → Results → Playing   (next round)
///                      │
///                      └────→ Finished  (win threshold reached)
/// ```
///
/// Any of Playing/Results/Finished returns to Lobby via the host's
/// return-to-lobby or cancel, which also resets scores and the round
/// counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Accepting joins; no round running.
    Lobby,

    /// A round is underway; the round timer is armed.
    Playing,

    /// Round resolved; standings shown while the results timer runs.
    Results,

    /// Somebody reached the win threshold. No automatic restart.
    Finished,
}

impl Phase {
    /// Whether new players may join. Only the lobby accepts joins;
    /// mid-game arrivals go through the rejoin path instead.
    pub fn is_joinable(&self) -> bool {
        matches!(self, Self::Lobby)
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Lobby => write!(f, "Lobby"),
            Self::Playing => write!(f, "Playing"),
            Self::Results => write!(f, "Results"),
            Self::Finished => write!(f, "Finished"),
        }
    }
}
