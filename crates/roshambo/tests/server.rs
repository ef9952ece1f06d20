//! End-to-end tests over real WebSocket connections: create, join, play a
//! round, chat, kick, and code rotation.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use roshambo::{RoomConfig, RoshamboServer};
use roshambo_protocol::{
    Choice, ClientIntent, Outcome, PlayerId, ServerEvent,
};
use tokio_tungstenite::tungstenite::Message;

// =========================================================================
// Helpers
// =========================================================================

type ClientWs = tokio_tungstenite::WebSocketStream<
    tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
>;

/// Starts a server on a random port with snappy timers and returns the
/// address.
async fn start_server() -> String {
    let server = RoshamboServer::builder()
        .bind("127.0.0.1:0")
        .room_config(RoomConfig {
            round_secs: 2,
            results_secs: 1,
            chat_min_interval_ms: 0,
            ..RoomConfig::default()
        })
        .build()
        .await
        .expect("server should build");

    let addr = server
        .local_addr()
        .expect("should have local addr")
        .to_string();

    tokio::spawn(async move {
        let _ = server.run().await;
    });

    // Give the accept loop a moment to start.
    tokio::time::sleep(Duration::from_millis(10)).await;
    addr
}

async fn connect(addr: &str) -> ClientWs {
    let (ws, _) = tokio_tungstenite::connect_async(format!("ws://{addr}"))
        .await
        .expect("should connect");
    ws
}

async fn send(ws: &mut ClientWs, intent: &ClientIntent) {
    let text = serde_json::to_string(intent).expect("encode intent");
    ws.send(Message::text(text)).await.expect("send intent");
}

/// Reads events until `extract` returns a value, with a 5s overall cap.
async fn expect_event<T>(
    ws: &mut ClientWs,
    extract: impl Fn(ServerEvent) -> Option<T>,
) -> T {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    loop {
        let msg = tokio::time::timeout_at(deadline, ws.next())
            .await
            .expect("timed out waiting for event")
            .expect("stream ended")
            .expect("recv failed");
        let text = msg.into_text().expect("text frame");
        let event: ServerEvent =
            serde_json::from_str(text.as_str()).expect("decode event");
        if let Some(value) = extract(event) {
            return value;
        }
    }
}

/// Creates a room and returns (room code, host player id).
async fn create_room(ws: &mut ClientWs, username: &str) -> (String, PlayerId) {
    send(ws, &ClientIntent::CreateRoom { username: username.into() }).await;
    expect_event(ws, |e| match e {
        ServerEvent::RoomCreated { room_code, player_id, .. } => {
            Some((room_code.as_str().to_string(), player_id))
        }
        _ => None,
    })
    .await
}

async fn join_room(ws: &mut ClientWs, code: &str, username: &str) -> PlayerId {
    send(
        ws,
        &ClientIntent::JoinRoom {
            room_code: code.into(),
            username: username.into(),
        },
    )
    .await;
    expect_event(ws, |e| match e {
        ServerEvent::RoomJoined { player_id, .. } => Some(player_id),
        _ => None,
    })
    .await
}

/// Host plus two contestants in a fresh room.
async fn room_of_three(addr: &str) -> (String, ClientWs, ClientWs, ClientWs) {
    let mut host = connect(addr).await;
    let (code, _) = create_room(&mut host, "host").await;
    let mut alice = connect(addr).await;
    join_room(&mut alice, &code, "alice").await;
    let mut bob = connect(addr).await;
    join_room(&mut bob, &code, "bob").await;
    (code, host, alice, bob)
}

// =========================================================================
// Membership
// =========================================================================

#[tokio::test]
async fn test_create_room_returns_code_and_join_url() {
    let addr = start_server().await;
    let mut ws = connect(&addr).await;

    send(&mut ws, &ClientIntent::CreateRoom { username: "host".into() }).await;
    let (code, url) = expect_event(&mut ws, |e| match e {
        ServerEvent::RoomCreated { room_code, join_url, .. } => {
            Some((room_code, join_url))
        }
        _ => None,
    })
    .await;

    assert_eq!(code.as_str().len(), 6);
    assert!(url.contains(code.as_str()), "join url embeds the code: {url}");
}

#[tokio::test]
async fn test_join_with_lowercased_code_succeeds() {
    let addr = start_server().await;
    let (code, _host, _alice, _bob) = room_of_three(&addr).await;

    let mut carol = connect(&addr).await;
    join_room(&mut carol, &code.to_lowercase(), "carol").await;
}

#[tokio::test]
async fn test_join_unknown_code_gets_error() {
    let addr = start_server().await;
    let mut ws = connect(&addr).await;

    send(
        &mut ws,
        &ClientIntent::JoinRoom {
            room_code: "ZZZZZZ".into(),
            username: "alice".into(),
        },
    )
    .await;

    let message = expect_event(&mut ws, |e| match e {
        ServerEvent::Error { message } => Some(message),
        _ => None,
    })
    .await;
    assert_eq!(message, "Room not found");
}

#[tokio::test]
async fn test_duplicate_username_rejected() {
    let addr = start_server().await;
    let (code, _host, _alice, _bob) = room_of_three(&addr).await;

    let mut dup = connect(&addr).await;
    send(
        &mut dup,
        &ClientIntent::JoinRoom { room_code: code, username: "Alice".into() },
    )
    .await;

    let message = expect_event(&mut dup, |e| match e {
        ServerEvent::Error { message } => Some(message),
        _ => None,
    })
    .await;
    assert!(message.contains("taken"), "got: {message}");
}

#[tokio::test]
async fn test_second_create_on_same_connection_rejected() {
    let addr = start_server().await;
    let mut ws = connect(&addr).await;
    create_room(&mut ws, "host").await;

    send(&mut ws, &ClientIntent::CreateRoom { username: "host2".into() }).await;
    let message = expect_event(&mut ws, |e| match e {
        ServerEvent::Error { message } => Some(message),
        _ => None,
    })
    .await;
    assert_eq!(message, "Already in a room");
}

#[tokio::test]
async fn test_garbage_frame_gets_error_and_connection_survives() {
    let addr = start_server().await;
    let mut ws = connect(&addr).await;

    ws.send(Message::text("not json")).await.expect("send");
    let message = expect_event(&mut ws, |e| match e {
        ServerEvent::Error { message } => Some(message),
        _ => None,
    })
    .await;
    assert_eq!(message, "Invalid message");

    // The connection still works.
    create_room(&mut ws, "host").await;
}

// =========================================================================
// Game flow
// =========================================================================

#[tokio::test]
async fn test_full_round_rock_beats_scissors() {
    let addr = start_server().await;
    let (_code, mut host, mut alice, mut bob) = room_of_three(&addr).await;

    send(&mut host, &ClientIntent::StartGame).await;

    let opponent = expect_event(&mut alice, |e| match e {
        ServerEvent::GameStarted { opponent, .. } => Some(opponent),
        _ => None,
    })
    .await;
    assert_eq!(opponent.as_deref(), Some("bob"));

    send(&mut alice, &ClientIntent::MakeChoice { choice: Choice::Rock }).await;
    send(&mut bob, &ClientIntent::MakeChoice { choice: Choice::Scissors }).await;

    let (result, opponent_choice) = expect_event(&mut alice, |e| match e {
        ServerEvent::GameResults { your_result, opponent_choice, .. } => {
            Some((your_result, opponent_choice))
        }
        _ => None,
    })
    .await;
    assert_eq!(result, Some(Outcome::Win));
    assert_eq!(opponent_choice, Some(Choice::Scissors));

    let bob_result = expect_event(&mut bob, |e| match e {
        ServerEvent::GameResults { your_result, .. } => Some(your_result),
        _ => None,
    })
    .await;
    assert_eq!(bob_result, Some(Outcome::Lose));
}

#[tokio::test]
async fn test_round_times_out_and_next_round_starts() {
    let addr = start_server().await;
    let (_code, mut host, mut alice, _bob) = room_of_three(&addr).await;

    send(&mut host, &ClientIntent::StartGame).await;
    expect_event(&mut alice, |e| match e {
        ServerEvent::GameStarted { round_number: 1, .. } => Some(()),
        _ => None,
    })
    .await;

    // Nobody chooses. The 2s round timer forces a double-forfeit tie and
    // the 1s results timer rolls into round 2.
    let round = expect_event(&mut alice, |e| match e {
        ServerEvent::GameStarted { round_number, .. } => Some(round_number),
        _ => None,
    })
    .await;
    assert_eq!(round, 2);
}

#[tokio::test]
async fn test_non_host_cannot_start_game() {
    let addr = start_server().await;
    let (_code, _host, mut alice, _bob) = room_of_three(&addr).await;

    send(&mut alice, &ClientIntent::StartGame).await;
    let message = expect_event(&mut alice, |e| match e {
        ServerEvent::Error { message } => Some(message),
        _ => None,
    })
    .await;
    assert!(message.contains("host"), "got: {message}");
}

// =========================================================================
// Disconnect and rejoin
// =========================================================================

#[tokio::test]
async fn test_drop_and_rejoin_keeps_player_id() {
    let addr = start_server().await;
    let (code, _host, mut alice, mut bob) = room_of_three(&addr).await;

    let bob_id = expect_player_id(&mut bob, "bob").await;
    drop(bob);
    tokio::time::sleep(Duration::from_millis(50)).await;

    // Alice sees the roster flip bob to disconnected.
    expect_event(&mut alice, |e| match e {
        ServerEvent::PlayerList { players } => {
            match players.iter().find(|p| p.username == "bob") {
                Some(p) if !p.connected => Some(()),
                _ => None,
            }
        }
        _ => None,
    })
    .await;

    let mut bob2 = connect(&addr).await;
    send(
        &mut bob2,
        &ClientIntent::RejoinRoom { room_code: code, username: "bob".into() },
    )
    .await;
    let rejoined_id = expect_event(&mut bob2, |e| match e {
        ServerEvent::RejoinSucceeded { player_id, .. } => Some(player_id),
        _ => None,
    })
    .await;
    assert_eq!(rejoined_id, bob_id);
}

#[tokio::test]
async fn test_rejoin_while_still_connected_fails() {
    let addr = start_server().await;
    let (code, _host, _alice, _bob) = room_of_three(&addr).await;

    let mut imp = connect(&addr).await;
    send(
        &mut imp,
        &ClientIntent::RejoinRoom { room_code: code, username: "bob".into() },
    )
    .await;
    expect_event(&mut imp, |e| match e {
        ServerEvent::RejoinFailed { .. } => Some(()),
        _ => None,
    })
    .await;
}

/// Reads the player list until `username` appears, returning their id.
async fn expect_player_id(ws: &mut ClientWs, username: &str) -> PlayerId {
    let username = username.to_string();
    expect_event(ws, move |e| match e {
        ServerEvent::PlayerList { players } => players
            .iter()
            .find(|p| p.username == username)
            .map(|p| p.player_id),
        _ => None,
    })
    .await
}

// =========================================================================
// Kick and rotation
// =========================================================================

#[tokio::test]
async fn test_kicked_player_can_join_another_room() {
    let addr = start_server().await;
    let (_code, mut host, mut alice, _bob) = room_of_three(&addr).await;

    let alice_id = expect_player_id(&mut host, "alice").await;
    send(&mut host, &ClientIntent::KickPlayer { player_id: alice_id }).await;

    expect_event(&mut alice, |e| match e {
        ServerEvent::Kicked => Some(()),
        _ => None,
    })
    .await;

    // The same connection is free to start over.
    create_room(&mut alice, "alice").await;
}

#[tokio::test]
async fn test_change_room_code_invalidates_old_code() {
    let addr = start_server().await;
    let (code, mut host, mut alice, _bob) = room_of_three(&addr).await;

    send(&mut host, &ClientIntent::ChangeRoomCode).await;
    let new_code = expect_event(&mut alice, |e| match e {
        ServerEvent::RoomCodeChanged { room_code, .. } => Some(room_code),
        _ => None,
    })
    .await;
    assert_ne!(new_code.as_str(), code);

    // Old code is dead, new code works.
    let mut carol = connect(&addr).await;
    send(
        &mut carol,
        &ClientIntent::JoinRoom { room_code: code, username: "carol".into() },
    )
    .await;
    let message = expect_event(&mut carol, |e| match e {
        ServerEvent::Error { message } => Some(message),
        _ => None,
    })
    .await;
    assert_eq!(message, "Room not found");

    join_room(&mut carol, new_code.as_str(), "carol").await;
}

// =========================================================================
// Chat
// =========================================================================

#[tokio::test]
async fn test_chat_message_broadcast_and_history_on_join() {
    let addr = start_server().await;
    let (code, mut host, mut alice, _bob) = room_of_three(&addr).await;

    send(
        &mut alice,
        &ClientIntent::ChatMessage { text: "good luck all".into() },
    )
    .await;
    let text = expect_event(&mut host, |e| match e {
        ServerEvent::ChatMessage { message } => Some(message.text),
        _ => None,
    })
    .await;
    assert_eq!(text, "good luck all");

    // A later joiner receives the backlog.
    let mut carol = connect(&addr).await;
    send(
        &mut carol,
        &ClientIntent::JoinRoom { room_code: code, username: "carol".into() },
    )
    .await;
    let backlog = expect_event(&mut carol, |e| match e {
        ServerEvent::ChatHistory { messages } => Some(messages),
        _ => None,
    })
    .await;
    assert_eq!(backlog.len(), 1);
    assert_eq!(backlog[0].text, "good luck all");
}

#[tokio::test]
async fn test_chat_intent_without_room_gets_error() {
    let addr = start_server().await;
    let mut ws = connect(&addr).await;

    send(&mut ws, &ClientIntent::ChatMessage { text: "hello?".into() }).await;
    let message = expect_event(&mut ws, |e| match e {
        ServerEvent::Error { message } => Some(message),
        _ => None,
    })
    .await;
    assert_eq!(message, "Not in a room");
}
