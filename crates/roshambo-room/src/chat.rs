//! Bounded per-room chat log.

use std::collections::{HashMap, VecDeque};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use roshambo_protocol::{ChatEntry, MessageId, PlayerId};

use crate::{RoomConfig, RoomError};

/// The chat history of one room.
///
/// Holds at most `capacity` messages, evicting the oldest. The lock gate
/// and the per-player rate limit are enforced here; host authorization
/// for lock/delete is the room's job.
pub struct ChatLog {
    entries: VecDeque<ChatEntry>,
    locked: bool,
    next_id: u64,
    last_sent: HashMap<PlayerId, Instant>,
    capacity: usize,
    max_len: usize,
    min_interval: Duration,
}

impl ChatLog {
    pub fn new(config: &RoomConfig) -> Self {
        Self {
            entries: VecDeque::with_capacity(config.chat_capacity),
            locked: false,
            next_id: 1,
            last_sent: HashMap::new(),
            capacity: config.chat_capacity,
            max_len: config.chat_max_len,
            min_interval: Duration::from_millis(config.chat_min_interval_ms),
        }
    }

    /// Validates and appends one message, returning the stored entry for
    /// broadcasting.
    pub fn push(
        &mut self,
        player_id: PlayerId,
        username: &str,
        text: &str,
        is_host: bool,
    ) -> Result<ChatEntry, RoomError> {
        if self.locked && !is_host {
            return Err(RoomError::ChatLocked);
        }

        let text = text.trim();
        if text.is_empty() {
            return Err(RoomError::InvalidMessage(
                "Message cannot be empty".into(),
            ));
        }
        if text.chars().count() > self.max_len {
            return Err(RoomError::InvalidMessage(format!(
                "Message is too long (max {} characters)",
                self.max_len
            )));
        }

        if let Some(last) = self.last_sent.get(&player_id) {
            if last.elapsed() < self.min_interval {
                return Err(RoomError::RateLimited);
            }
        }
        self.last_sent.insert(player_id, Instant::now());

        let entry = ChatEntry {
            message_id: MessageId(self.next_id),
            player_id,
            username: username.to_owned(),
            text: text.to_owned(),
            timestamp_ms: unix_millis(),
        };
        self.next_id += 1;

        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(entry.clone());
        Ok(entry)
    }

    /// Removes one message. Returns whether it existed.
    pub fn delete(&mut self, message_id: MessageId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.message_id != message_id);
        self.entries.len() != before
    }

    /// The full backlog, oldest first.
    pub fn history(&self) -> Vec<ChatEntry> {
        self.entries.iter().cloned().collect()
    }

    /// Flips the lock gate and returns the new state.
    pub fn toggle_lock(&mut self) -> bool {
        self.locked = !self.locked;
        self.locked
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    /// Drops the rate-limit record for a removed player.
    pub fn forget_player(&mut self, player_id: PlayerId) {
        self.last_sent.remove(&player_id);
    }
}

fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn log() -> ChatLog {
        ChatLog::new(&RoomConfig::default())
    }

    /// Config with rate limiting disabled so tests can post repeatedly.
    fn unlimited() -> ChatLog {
        ChatLog::new(&RoomConfig {
            chat_min_interval_ms: 0,
            ..RoomConfig::default()
        })
    }

    #[test]
    fn test_push_assigns_sequential_message_ids() {
        let mut chat = unlimited();
        let a = chat.push(PlayerId(1), "alice", "hi", false).unwrap();
        let b = chat.push(PlayerId(2), "bob", "hey", false).unwrap();
        assert_eq!(a.message_id, MessageId(1));
        assert_eq!(b.message_id, MessageId(2));
    }

    #[test]
    fn test_push_trims_and_rejects_empty_text() {
        let mut chat = log();
        let err = chat.push(PlayerId(1), "alice", "   ", false);
        assert!(matches!(err, Err(RoomError::InvalidMessage(_))));

        let entry = chat.push(PlayerId(1), "alice", "  hi  ", false).unwrap();
        assert_eq!(entry.text, "hi");
    }

    #[test]
    fn test_push_rejects_overlong_text() {
        let mut chat = log();
        let long = "x".repeat(501);
        let err = chat.push(PlayerId(1), "alice", &long, false);
        assert!(matches!(err, Err(RoomError::InvalidMessage(_))));
    }

    #[test]
    fn test_rate_limit_blocks_rapid_messages() {
        let mut chat = log();
        chat.push(PlayerId(1), "alice", "one", false).unwrap();
        let err = chat.push(PlayerId(1), "alice", "two", false);
        assert!(matches!(err, Err(RoomError::RateLimited)));

        // Another player is unaffected.
        chat.push(PlayerId(2), "bob", "hey", false).unwrap();
    }

    #[test]
    fn test_lock_blocks_non_hosts_only() {
        let mut chat = unlimited();
        assert!(chat.toggle_lock());

        let err = chat.push(PlayerId(1), "alice", "hi", false);
        assert!(matches!(err, Err(RoomError::ChatLocked)));

        chat.push(PlayerId(2), "host", "announcement", true).unwrap();

        assert!(!chat.toggle_lock());
        chat.push(PlayerId(1), "alice", "hi", false).unwrap();
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let mut chat = ChatLog::new(&RoomConfig {
            chat_capacity: 3,
            chat_min_interval_ms: 0,
            ..RoomConfig::default()
        });
        for i in 1..=4 {
            chat.push(PlayerId(1), "alice", &format!("m{i}"), false).unwrap();
        }

        let history = chat.history();
        assert_eq!(history.len(), 3);
        assert_eq!(history[0].text, "m2");
        assert_eq!(history[2].text, "m4");
    }

    #[test]
    fn test_delete_removes_one_message() {
        let mut chat = unlimited();
        let entry = chat.push(PlayerId(1), "alice", "oops", false).unwrap();
        chat.push(PlayerId(1), "alice", "keep", false).unwrap();

        assert!(chat.delete(entry.message_id));
        assert!(!chat.delete(entry.message_id), "second delete is a no-op");

        let history = chat.history();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].text, "keep");
    }
}
