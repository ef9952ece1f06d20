//! Per-connection handler: intent decoding, membership flow, and event
//! forwarding.
//!
//! Each accepted connection gets its own tokio task running this handler,
//! plus a writer task that drains the player's event channel onto the
//! socket. A connection starts unbound; the first successful
//! create/join/rejoin binds it to a player in a room, and from then on
//! gameplay intents are routed to that room's actor.

use std::sync::Arc;

use roshambo_protocol::{
    ClientIntent, Codec, RoomCode, ServerEvent,
};
use roshambo_room::{EventSender, JoinReply, RoomError};
use roshambo_transport::{ConnectionId, WebSocketConnection};
use tokio::sync::mpsc;

use crate::server::ServerState;
use crate::RoshamboError;

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection(
    conn: WebSocketConnection,
    state: Arc<ServerState>,
) -> Result<(), RoshamboError> {
    let conn_id = conn.id();
    tracing::debug!(%conn_id, "handling new connection");

    let (event_tx, event_rx) = mpsc::unbounded_channel();
    let writer = tokio::spawn(forward_events(
        event_rx,
        conn.clone(),
        Arc::clone(&state),
        conn_id,
    ));

    loop {
        let text = match conn.recv().await {
            Ok(Some(text)) => text,
            Ok(None) => {
                tracing::debug!(%conn_id, "connection closed cleanly");
                break;
            }
            Err(e) => {
                tracing::debug!(%conn_id, error = %e, "recv error");
                break;
            }
        };

        let intent: ClientIntent = match state.codec.decode(&text) {
            Ok(intent) => intent,
            Err(e) => {
                tracing::debug!(%conn_id, error = %e, "failed to decode intent");
                send_error(&event_tx, "Invalid message");
                continue;
            }
        };

        handle_intent(&state, conn_id, &event_tx, intent).await;
    }

    // Teardown: the seat survives for the reconnection grace period.
    let session = state.sessions.lock().await.unbind(conn_id);
    if let Some(session) = session {
        let handle = state.rooms.lock().await.lookup_by_id(session.room_id);
        if let Some(handle) = handle {
            handle.disconnect(session.player_id).await;
        }
    }
    writer.abort();
    Ok(())
}

/// Routes one decoded intent. Membership intents are resolved here;
/// everything else goes to the bound room's actor.
async fn handle_intent(
    state: &Arc<ServerState>,
    conn_id: ConnectionId,
    event_tx: &EventSender,
    intent: ClientIntent,
) {
    match intent {
        ClientIntent::CreateRoom { username } => {
            if state.sessions.lock().await.get(conn_id).is_some() {
                send_error(event_tx, "Already in a room");
                return;
            }

            let result = {
                let mut rooms = state.rooms.lock().await;
                rooms.create_room(&username, event_tx.clone()).await
            };
            match result {
                Ok(reply) => {
                    bind(state, conn_id, &username, &reply).await;
                    let _ = event_tx.send(ServerEvent::RoomCreated {
                        room_code: reply.room_code,
                        player_id: reply.player_id,
                        join_url: reply.join_url,
                    });
                }
                Err(e) => send_error(event_tx, &e.to_string()),
            }
        }

        ClientIntent::JoinRoom { room_code, username } => {
            if state.sessions.lock().await.get(conn_id).is_some() {
                send_error(event_tx, "Already in a room");
                return;
            }

            let code = RoomCode::new(room_code);
            let Some(handle) = state.rooms.lock().await.lookup_by_code(&code)
            else {
                send_error(event_tx, &RoomError::NotFound.to_string());
                return;
            };

            match handle.join(&username, event_tx.clone()).await {
                Ok(reply) => {
                    bind(state, conn_id, &username, &reply).await;
                    let _ = event_tx.send(ServerEvent::RoomJoined {
                        room_code: reply.room_code,
                        player_id: reply.player_id,
                        join_url: reply.join_url,
                    });
                }
                Err(e) => send_error(event_tx, &e.to_string()),
            }
        }

        ClientIntent::RejoinRoom { room_code, username } => {
            if state.sessions.lock().await.get(conn_id).is_some() {
                send_error(event_tx, "Already in a room");
                return;
            }

            let code = RoomCode::new(room_code);
            let Some(handle) = state.rooms.lock().await.lookup_by_code(&code)
            else {
                let _ = event_tx.send(ServerEvent::RejoinFailed {
                    message: RoomError::NotFound.to_string(),
                });
                return;
            };

            match handle.rejoin(&username, event_tx.clone()).await {
                Ok(reply) => {
                    bind(state, conn_id, &username, &reply).await;
                    let _ = event_tx.send(ServerEvent::RejoinSucceeded {
                        room_code: reply.room_code,
                        player_id: reply.player_id,
                    });
                }
                Err(e) => {
                    let _ = event_tx.send(ServerEvent::RejoinFailed {
                        message: e.to_string(),
                    });
                }
            }
        }

        ClientIntent::ChangeRoomCode => {
            let Some((player_id, room_id)) = binding(state, conn_id).await else {
                send_error(event_tx, "Not in a room");
                return;
            };
            let result = {
                let mut rooms = state.rooms.lock().await;
                rooms.rotate_code(room_id, player_id).await
            };
            // The room broadcasts room-code-changed itself on success.
            if let Err(e) = result {
                send_error(event_tx, &e.to_string());
            }
        }

        // Gameplay and chat go to the room actor; rejections come back to
        // this connection as error events.
        other => {
            let Some((player_id, room_id)) = binding(state, conn_id).await else {
                send_error(event_tx, "Not in a room");
                return;
            };
            let handle = state.rooms.lock().await.lookup_by_id(room_id);
            match handle {
                Some(handle) => {
                    if let Err(e) = handle.intent(player_id, other).await {
                        send_error(event_tx, &e.to_string());
                    }
                }
                None => send_error(event_tx, &RoomError::NotFound.to_string()),
            }
        }
    }
}

async fn bind(
    state: &Arc<ServerState>,
    conn_id: ConnectionId,
    username: &str,
    reply: &JoinReply,
) {
    let mut sessions = state.sessions.lock().await;
    if let Err(e) =
        sessions.bind(conn_id, reply.player_id, reply.room_id, username)
    {
        tracing::warn!(%conn_id, error = %e, "session bind failed");
    }
}

async fn binding(
    state: &Arc<ServerState>,
    conn_id: ConnectionId,
) -> Option<(roshambo_protocol::PlayerId, roshambo_protocol::RoomId)> {
    let sessions = state.sessions.lock().await;
    sessions.get(conn_id).map(|s| (s.player_id, s.room_id))
}

fn send_error(event_tx: &EventSender, message: &str) {
    let _ = event_tx.send(ServerEvent::Error { message: message.to_string() });
}

/// Writer task: drains the player's event channel onto the socket.
///
/// A `kicked` event also clears this connection's binding, so the same
/// socket can immediately create or join another room.
async fn forward_events(
    mut event_rx: mpsc::UnboundedReceiver<ServerEvent>,
    conn: WebSocketConnection,
    state: Arc<ServerState>,
    conn_id: ConnectionId,
) {
    while let Some(event) = event_rx.recv().await {
        let kicked = matches!(event, ServerEvent::Kicked);

        match state.codec.encode(&event) {
            Ok(text) => {
                if conn.send(&text).await.is_err() {
                    break;
                }
            }
            Err(e) => {
                tracing::warn!(%conn_id, error = %e, "failed to encode event");
                continue;
            }
        }

        if kicked {
            state.sessions.lock().await.unbind(conn_id);
        }
    }
}
