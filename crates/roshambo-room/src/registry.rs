//! Registry of live rooms, keyed by id and by public code.
//!
//! The registry spawns room actors and owns the code-to-room mapping, so
//! code uniqueness and rotation are decided here while everything about a
//! room's interior stays inside its actor.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use rand::Rng;
use roshambo_protocol::{PlayerId, RoomCode, RoomId};
use tokio::sync::mpsc;

use crate::actor::{spawn_room, EventSender, JoinReply, RoomHandle};
use crate::{RoomConfig, RoomError};

static NEXT_ROOM_ID: AtomicU64 = AtomicU64::new(1);

/// Characters used in generated room codes. Ambiguous glyphs (0/O, 1/I/L)
/// are left out so codes survive being read aloud.
const CODE_ALPHABET: &[u8] = b"ABCDEFGHJKMNPQRSTUVWXYZ23456789";
const CODE_LEN: usize = 6;

/// All live rooms on this server.
pub struct RoomRegistry {
    rooms: HashMap<RoomId, RoomHandle>,
    codes: HashMap<RoomCode, RoomId>,
    config: RoomConfig,
    public_url: String,
    reaper_tx: mpsc::UnboundedSender<RoomId>,
}

impl RoomRegistry {
    /// Creates a registry plus the reaper channel on which emptied rooms
    /// report themselves for removal.
    pub fn new(
        config: RoomConfig,
        public_url: impl Into<String>,
    ) -> (Self, mpsc::UnboundedReceiver<RoomId>) {
        let (reaper_tx, reaper_rx) = mpsc::unbounded_channel();
        let registry = Self {
            rooms: HashMap::new(),
            codes: HashMap::new(),
            config,
            public_url: public_url.into(),
            reaper_tx,
        };
        (registry, reaper_rx)
    }

    /// Spawns a new room and enrolls its creator as host.
    pub async fn create_room(
        &mut self,
        host_username: &str,
        sender: EventSender,
    ) -> Result<JoinReply, RoomError> {
        let room_id = RoomId(NEXT_ROOM_ID.fetch_add(1, Ordering::Relaxed));
        let code = self.generate_code();

        let handle = spawn_room(
            room_id,
            code.clone(),
            self.config.clone(),
            &self.public_url,
            self.reaper_tx.clone(),
        );

        // A failed host join (bad username) leaves the actor empty; let it
        // shut down rather than register a dead room.
        let reply = match handle.join_host(host_username, sender).await {
            Ok(reply) => reply,
            Err(e) => {
                handle.shutdown().await;
                return Err(e);
            }
        };

        tracing::info!(%room_id, %code, "room created");
        self.rooms.insert(room_id, handle);
        self.codes.insert(code, room_id);
        Ok(reply)
    }

    pub fn lookup_by_code(&self, code: &RoomCode) -> Option<RoomHandle> {
        self.codes.get(code).and_then(|id| self.rooms.get(id)).cloned()
    }

    pub fn lookup_by_id(&self, room_id: RoomId) -> Option<RoomHandle> {
        self.rooms.get(&room_id).cloned()
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    /// Replaces a room's public code with a fresh one. The room itself
    /// checks that `actor` is the host; the code map only changes if it
    /// accepts.
    pub async fn rotate_code(
        &mut self,
        room_id: RoomId,
        actor: PlayerId,
    ) -> Result<RoomCode, RoomError> {
        let handle = self.rooms.get(&room_id).ok_or(RoomError::NotFound)?;
        let new_code = self.generate_code();
        let new_code = handle.rotate(actor, new_code).await?;

        self.codes.retain(|_, id| *id != room_id);
        self.codes.insert(new_code.clone(), room_id);
        tracing::info!(%room_id, code = %new_code, "room code rotated");
        Ok(new_code)
    }

    /// Tears down a room and drops its mappings.
    pub async fn destroy_room(&mut self, room_id: RoomId) {
        if let Some(handle) = self.rooms.remove(&room_id) {
            handle.shutdown().await;
        }
        self.codes.retain(|_, id| *id != room_id);
        tracing::info!(%room_id, "room destroyed");
    }

    /// Drops the mappings of a room whose actor already stopped (reaper
    /// path). No shutdown message is sent.
    pub fn remove_mappings(&mut self, room_id: RoomId) {
        self.rooms.remove(&room_id);
        self.codes.retain(|_, id| *id != room_id);
    }

    /// Safety-net sweep: removes rooms that are empty or whose actor is
    /// gone without having reported itself. Returns the ids removed.
    pub async fn sweep(&mut self) -> Vec<RoomId> {
        let handles: Vec<(RoomId, RoomHandle)> = self
            .rooms
            .iter()
            .map(|(id, handle)| (*id, handle.clone()))
            .collect();

        let mut removed = Vec::new();
        for (room_id, handle) in handles {
            match handle.info().await {
                Ok(info) if info.player_count == 0 => {
                    self.destroy_room(room_id).await;
                    removed.push(room_id);
                }
                Ok(_) => {}
                Err(_) => {
                    self.remove_mappings(room_id);
                    removed.push(room_id);
                }
            }
        }

        if !removed.is_empty() {
            tracing::debug!(count = removed.len(), "sweep removed rooms");
        }
        removed
    }

    /// Generates a code not currently in use.
    fn generate_code(&self) -> RoomCode {
        let mut rng = rand::rng();
        loop {
            let raw: String = (0..CODE_LEN)
                .map(|_| {
                    let i = rng.random_range(0..CODE_ALPHABET.len());
                    CODE_ALPHABET[i] as char
                })
                .collect();
            let code = RoomCode::new(raw);
            if !self.codes.contains_key(&code) {
                return code;
            }
        }
    }
}
