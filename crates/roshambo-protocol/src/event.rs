//! Server-to-client events.

use serde::{Deserialize, Serialize};

use crate::{ChatEntry, Choice, LeaderboardEntry, MessageId, Outcome, PlayerId, PlayerInfo, RoomCode};

/// Everything the server may push to a client.
///
/// Same flat kebab-case tagging as [`crate::ClientIntent`]. Several events
/// are personalized per player (`game-started`, `game-results`), so the
/// room builds a distinct value per recipient rather than one broadcast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ServerEvent {
    // -- Room membership --
    RoomCreated {
        room_code: RoomCode,
        player_id: PlayerId,
        /// Shareable deep link carrying the room code.
        join_url: String,
    },

    RoomJoined {
        room_code: RoomCode,
        player_id: PlayerId,
        join_url: String,
    },

    /// The seat was reclaimed; the player keeps their id, score, host
    /// status, and any choice already made this round.
    RejoinSucceeded {
        room_code: RoomCode,
        player_id: PlayerId,
    },

    RejoinFailed {
        message: String,
    },

    /// Full roster snapshot, broadcast after every roster mutation.
    PlayerList {
        players: Vec<PlayerInfo>,
    },

    PlayerJoined {
        username: String,
    },

    PlayerLeft {
        username: String,
    },

    PlayerKicked {
        username: String,
    },

    /// Sent only to the player being removed.
    Kicked,

    /// Sent only to the player who just inherited host status.
    BecameHost,

    /// The previous host is gone; `new_host` now runs the room.
    HostLeft {
        new_host: String,
    },

    // -- Game flow --
    /// Personalized round start. `opponent` is `None` for the host and for
    /// a player sitting out as the bye.
    GameStarted {
        round_number: u32,
        timer_secs: u64,
        opponent: Option<String>,
    },

    /// Personalized round resolution. The `your_*`/`opponent_*` fields are
    /// `None` for the host and the bye, who have no result of their own.
    GameResults {
        round_number: u32,
        leaderboard: Vec<LeaderboardEntry>,
        your_result: Option<Outcome>,
        opponent_name: Option<String>,
        your_choice: Option<Choice>,
        opponent_choice: Option<Choice>,
    },

    /// Somebody reached the win threshold. `winners` holds every username
    /// at the top score in case of a tie at the threshold.
    GameOver {
        winners: Vec<String>,
        leaderboard: Vec<LeaderboardEntry>,
    },

    ReturnedToLobby,

    GameCancelled,

    RoomCodeChanged {
        room_code: RoomCode,
        join_url: String,
    },

    // -- Chat --
    ChatMessage {
        message: ChatEntry,
    },

    /// Backlog replay for a (re)joining player, oldest first.
    ChatHistory {
        messages: Vec<ChatEntry>,
    },

    MessageDeleted {
        message_id: MessageId,
    },

    ChatLocked {
        locked: bool,
    },

    // -- Errors --
    /// A rejected intent. Sent only to the originating connection.
    Error {
        message: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_room_created_json_shape() {
        let event = ServerEvent::RoomCreated {
            room_code: RoomCode::new("AB3K9X"),
            player_id: PlayerId(1),
            join_url: "https://roshambo.example/?room=AB3K9X".into(),
        };
        let json: serde_json::Value = serde_json::to_value(&event).unwrap();

        assert_eq!(json["type"], "room-created");
        assert_eq!(json["room_code"], "AB3K9X");
        assert_eq!(json["player_id"], 1);
        assert_eq!(json["join_url"], "https://roshambo.example/?room=AB3K9X");
    }

    #[test]
    fn test_game_started_opponent_is_null_for_host() {
        let event = ServerEvent::GameStarted {
            round_number: 1,
            timer_secs: 30,
            opponent: None,
        };
        let json: serde_json::Value = serde_json::to_value(&event).unwrap();

        assert_eq!(json["type"], "game-started");
        assert_eq!(json["round_number"], 1);
        assert_eq!(json["timer_secs"], 30);
        assert!(json["opponent"].is_null());
    }

    #[test]
    fn test_game_results_personalized_fields() {
        let event = ServerEvent::GameResults {
            round_number: 2,
            leaderboard: vec![LeaderboardEntry {
                player_id: PlayerId(2),
                username: "bob".into(),
                wins: 1,
            }],
            your_result: Some(Outcome::Win),
            opponent_name: Some("carol".into()),
            your_choice: Some(Choice::Rock),
            opponent_choice: Some(Choice::Scissors),
        };
        let json: serde_json::Value = serde_json::to_value(&event).unwrap();

        assert_eq!(json["type"], "game-results");
        assert_eq!(json["your_result"], "win");
        assert_eq!(json["your_choice"], "rock");
        assert_eq!(json["opponent_choice"], "scissors");
        assert_eq!(json["leaderboard"][0]["username"], "bob");
    }

    #[test]
    fn test_error_event_json_shape() {
        let event = ServerEvent::Error { message: "Room not found".into() };
        let json: serde_json::Value = serde_json::to_value(&event).unwrap();

        assert_eq!(json["type"], "error");
        assert_eq!(json["message"], "Room not found");
    }

    #[test]
    fn test_player_list_round_trip() {
        let event = ServerEvent::PlayerList {
            players: vec![PlayerInfo {
                player_id: PlayerId(1),
                username: "alice".into(),
                is_host: true,
                wins: 0,
                connected: true,
                has_chosen: false,
            }],
        };
        let text = serde_json::to_string(&event).unwrap();
        let decoded: ServerEvent = serde_json::from_str(&text).unwrap();
        assert_eq!(event, decoded);
    }

    #[test]
    fn test_chat_locked_json_shape() {
        let event = ServerEvent::ChatLocked { locked: true };
        let json: serde_json::Value = serde_json::to_value(&event).unwrap();

        assert_eq!(json["type"], "chat-locked");
        assert_eq!(json["locked"], true);
    }

    #[test]
    fn test_unit_events_serialize_with_only_the_tag() {
        let json: serde_json::Value =
            serde_json::to_value(&ServerEvent::ReturnedToLobby).unwrap();
        assert_eq!(json, serde_json::json!({ "type": "returned-to-lobby" }));

        let json: serde_json::Value =
            serde_json::to_value(&ServerEvent::Kicked).unwrap();
        assert_eq!(json, serde_json::json!({ "type": "kicked" }));
    }
}
