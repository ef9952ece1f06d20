//! The session manager: tracks every connection's binding.
//!
//! # Concurrency note
//!
//! `SessionManager` is not thread-safe by itself: it uses a plain
//! `HashMap` and is meant to live behind the server's `tokio::sync::Mutex`.
//! Keeping it synchronous here avoids hidden locking.

use std::collections::HashMap;

use roshambo_protocol::{PlayerId, RoomId};
use roshambo_transport::ConnectionId;

use crate::{Session, SessionError};

/// Maps live connections to the player and room they act for.
#[derive(Default)]
pub struct SessionManager {
    sessions: HashMap<ConnectionId, Session>,
}

impl SessionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds a connection to a player in a room.
    ///
    /// # Errors
    /// Returns [`SessionError::AlreadyBound`] if the connection already
    /// has a binding; a client must leave before joining elsewhere.
    pub fn bind(
        &mut self,
        conn: ConnectionId,
        player_id: PlayerId,
        room_id: RoomId,
        username: impl Into<String>,
    ) -> Result<&Session, SessionError> {
        if self.sessions.contains_key(&conn) {
            return Err(SessionError::AlreadyBound(conn));
        }

        let username = username.into();
        tracing::info!(%conn, %player_id, %room_id, username, "session bound");
        Ok(self
            .sessions
            .entry(conn)
            .or_insert(Session { player_id, room_id, username }))
    }

    /// Removes a connection's binding, returning it for teardown.
    ///
    /// Absent bindings are fine: a connection that never joined a room
    /// disconnects with nothing to unbind.
    pub fn unbind(&mut self, conn: ConnectionId) -> Option<Session> {
        let session = self.sessions.remove(&conn);
        if let Some(s) = &session {
            tracing::info!(%conn, player_id = %s.player_id, "session unbound");
        }
        session
    }

    pub fn get(&self, conn: ConnectionId) -> Option<&Session> {
        self.sessions.get(&conn)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
