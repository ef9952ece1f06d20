//! Room actor: an isolated tokio task that owns one [`Room`].
//!
//! All mutations of a room happen inside its single command loop, so the
//! room is the unit of mutual exclusion with no locking. The loop selects
//! over the command channel and the room's three timer slots (round,
//! results, grace); timer arming and cancellation are centralized in one
//! place after every step, so a phase transition can never leave a stale
//! deadline behind.

use std::collections::HashMap;
use std::time::Duration;

use roshambo_protocol::{
    ClientIntent, PlayerId, Recipient, RoomCode, RoomId, ServerEvent,
};
use roshambo_timer::TimerSlot;
use tokio::sync::{mpsc, oneshot};

use crate::{Events, Phase, Room, RoomConfig, RoomError};

/// Channel sender for delivering events to one player's connection task.
pub type EventSender = mpsc::UnboundedSender<ServerEvent>;

/// Default command channel size for room actors.
const CHANNEL_SIZE: usize = 64;

/// What a successful join/rejoin hands back to the connection handler.
#[derive(Debug, Clone)]
pub struct JoinReply {
    pub player_id: PlayerId,
    pub room_id: RoomId,
    pub room_code: RoomCode,
    pub join_url: String,
}

/// A snapshot of room metadata for listings and the sweep.
#[derive(Debug, Clone)]
pub struct RoomInfo {
    pub room_id: RoomId,
    pub code: RoomCode,
    pub phase: Phase,
    pub player_count: usize,
}

/// Commands sent to a room actor through its channel.
pub(crate) enum RoomCommand {
    /// Enroll a new player. `host` only for the room creator.
    Join {
        username: String,
        host: bool,
        sender: EventSender,
        reply: oneshot::Sender<Result<JoinReply, RoomError>>,
    },

    /// Reclaim a disconnected seat by username.
    Rejoin {
        username: String,
        sender: EventSender,
        reply: oneshot::Sender<Result<JoinReply, RoomError>>,
    },

    /// The player's connection dropped; start their grace period.
    Disconnect { player_id: PlayerId },

    /// Explicit leave; the seat is removed immediately.
    Leave { player_id: PlayerId },

    /// A gameplay or chat intent. Rejections go back to the origin as an
    /// `error` event, so no reply channel is needed.
    Intent {
        player_id: PlayerId,
        intent: ClientIntent,
    },

    /// Install a fresh public code (authorization checked by the room).
    Rotate {
        actor: PlayerId,
        new_code: RoomCode,
        reply: oneshot::Sender<Result<RoomCode, RoomError>>,
    },

    /// Request a metadata snapshot.
    Info { reply: oneshot::Sender<RoomInfo> },

    /// Shut down the room.
    Shutdown,
}

/// Handle to a running room actor. Cheap to clone.
#[derive(Clone)]
pub struct RoomHandle {
    room_id: RoomId,
    sender: mpsc::Sender<RoomCommand>,
}

impl RoomHandle {
    pub fn room_id(&self) -> RoomId {
        self.room_id
    }

    /// Enrolls a new player and returns their seat.
    pub async fn join(
        &self,
        username: &str,
        sender: EventSender,
    ) -> Result<JoinReply, RoomError> {
        self.join_inner(username, false, sender).await
    }

    /// Enrolls the room creator as host.
    pub(crate) async fn join_host(
        &self,
        username: &str,
        sender: EventSender,
    ) -> Result<JoinReply, RoomError> {
        self.join_inner(username, true, sender).await
    }

    async fn join_inner(
        &self,
        username: &str,
        host: bool,
        sender: EventSender,
    ) -> Result<JoinReply, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(RoomCommand::Join {
                username: username.to_owned(),
                host,
                sender,
                reply: reply_tx,
            })
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id))?;
        reply_rx
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id))?
    }

    /// Reclaims a disconnected seat.
    pub async fn rejoin(
        &self,
        username: &str,
        sender: EventSender,
    ) -> Result<JoinReply, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(RoomCommand::Rejoin {
                username: username.to_owned(),
                sender,
                reply: reply_tx,
            })
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id))?;
        reply_rx
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id))?
    }

    /// Reports a dropped connection (fire-and-forget).
    pub async fn disconnect(&self, player_id: PlayerId) {
        let _ = self
            .sender
            .send(RoomCommand::Disconnect { player_id })
            .await;
    }

    /// Removes a player immediately (fire-and-forget).
    pub async fn leave(&self, player_id: PlayerId) {
        let _ = self.sender.send(RoomCommand::Leave { player_id }).await;
    }

    /// Routes a gameplay or chat intent (fire-and-forget; rejections come
    /// back to the origin as `error` events).
    pub async fn intent(
        &self,
        player_id: PlayerId,
        intent: ClientIntent,
    ) -> Result<(), RoomError> {
        self.sender
            .send(RoomCommand::Intent { player_id, intent })
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id))
    }

    pub(crate) async fn rotate(
        &self,
        actor: PlayerId,
        new_code: RoomCode,
    ) -> Result<RoomCode, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(RoomCommand::Rotate { actor, new_code, reply: reply_tx })
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id))?;
        reply_rx
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id))?
    }

    pub async fn info(&self) -> Result<RoomInfo, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(RoomCommand::Info { reply: reply_tx })
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id))?;
        reply_rx
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id))
    }

    pub async fn shutdown(&self) {
        let _ = self.sender.send(RoomCommand::Shutdown).await;
    }
}

/// The internal room actor state. Runs inside a tokio task.
struct RoomActor {
    room: Room,
    /// Per-player outbound channels; pruned when seats are removed.
    senders: HashMap<PlayerId, EventSender>,
    receiver: mpsc::Receiver<RoomCommand>,
    round_timer: TimerSlot,
    results_timer: TimerSlot,
    grace_timer: TimerSlot,
    /// Where the actor reports itself for destruction once empty.
    reaper: mpsc::UnboundedSender<RoomId>,
}

impl RoomActor {
    async fn run(mut self) {
        let room_id = self.room.id();
        tracing::info!(%room_id, code = %self.room.code(), "room actor started");

        loop {
            tokio::select! {
                cmd = self.receiver.recv() => {
                    match cmd {
                        Some(RoomCommand::Shutdown) | None => break,
                        Some(cmd) => self.step(|actor| actor.handle_command(cmd)),
                    }
                }
                _ = self.round_timer.fired() => {
                    tracing::debug!(%room_id, "round timer fired");
                    self.step(|actor| {
                        let events = actor.room.resolve_round();
                        actor.dispatch(events);
                    });
                }
                _ = self.results_timer.fired() => {
                    self.step(|actor| {
                        let events = actor.room.begin_next_round();
                        actor.dispatch(events);
                    });
                }
                _ = self.grace_timer.fired() => {
                    self.step(|actor| {
                        let events = actor.room.expire_disconnected();
                        actor.dispatch(events);
                    });
                }
            }

            if self.room.is_empty() {
                tracing::info!(%room_id, "room empty, reporting for teardown");
                let _ = self.reaper.send(room_id);
                break;
            }
        }

        tracing::info!(%room_id, "room actor stopped");
    }

    /// Runs one unit of work, then resolves the round early if everyone
    /// left in it has chosen, re-syncs timers, and prunes senders.
    ///
    /// This is the single choke point for timer management: whenever the
    /// phase or round changed, the slots are re-armed for the new phase
    /// and the superseded one is cancelled. Early resolution lives here
    /// too, so a choice, a kick, or a grace expiry that completes the
    /// round all end it the same way.
    fn step(&mut self, work: impl FnOnce(&mut Self)) {
        let before = (self.room.phase(), self.room.round_number());
        work(self);
        if self.room.all_submitted() {
            let events = self.room.resolve_round();
            self.dispatch(events);
        }
        self.sync_phase_timers(before);
        self.sync_grace_timer();
        let room = &self.room;
        self.senders.retain(|id, _| room.contains(*id));
    }

    fn handle_command(&mut self, cmd: RoomCommand) {
        match cmd {
            RoomCommand::Join { username, host, sender, reply } => {
                let result = self.handle_join(&username, host, sender);
                let _ = reply.send(result);
            }
            RoomCommand::Rejoin { username, sender, reply } => {
                let result = self.handle_rejoin(&username, sender);
                let _ = reply.send(result);
            }
            RoomCommand::Disconnect { player_id } => {
                let events = self.room.mark_disconnected(player_id);
                self.senders.remove(&player_id);
                self.dispatch(events);
            }
            RoomCommand::Leave { player_id } => {
                let events = self.room.leave(player_id);
                self.dispatch(events);
            }
            RoomCommand::Intent { player_id, intent } => {
                self.handle_intent(player_id, intent);
            }
            RoomCommand::Rotate { actor, new_code, reply } => {
                let result = match self.room.rotate_code(actor, new_code) {
                    Ok(events) => {
                        self.dispatch(events);
                        Ok(self.room.code().clone())
                    }
                    Err(e) => Err(e),
                };
                let _ = reply.send(result);
            }
            RoomCommand::Info { reply } => {
                let _ = reply.send(RoomInfo {
                    room_id: self.room.id(),
                    code: self.room.code().clone(),
                    phase: self.room.phase(),
                    player_count: self.room.player_count(),
                });
            }
            RoomCommand::Shutdown => unreachable!("handled in the loop"),
        }
    }

    fn handle_join(
        &mut self,
        username: &str,
        host: bool,
        sender: EventSender,
    ) -> Result<JoinReply, RoomError> {
        let (player_id, events) = self.room.add_player(username, host)?;
        self.senders.insert(player_id, sender);
        self.dispatch(events);
        Ok(self.join_reply(player_id))
    }

    fn handle_rejoin(
        &mut self,
        username: &str,
        sender: EventSender,
    ) -> Result<JoinReply, RoomError> {
        let (player_id, events) = self.room.rejoin(username)?;
        self.senders.insert(player_id, sender);
        self.dispatch(events);
        Ok(self.join_reply(player_id))
    }

    fn join_reply(&self, player_id: PlayerId) -> JoinReply {
        JoinReply {
            player_id,
            room_id: self.room.id(),
            room_code: self.room.code().clone(),
            join_url: self.room.join_url(),
        }
    }

    /// Routes one gameplay/chat intent; a rejection becomes an `error`
    /// event to the origin and nothing else changes.
    fn handle_intent(&mut self, player_id: PlayerId, intent: ClientIntent) {
        let result = match intent {
            ClientIntent::StartGame => self.room.start_game(player_id),
            ClientIntent::MakeChoice { choice } => {
                self.room.make_choice(player_id, choice)
            }
            ClientIntent::KickPlayer { player_id: target } => {
                self.room.kick(player_id, target)
            }
            ClientIntent::ReturnToLobby => self.room.return_to_lobby(player_id),
            ClientIntent::CancelGame => self.room.cancel_game(player_id),
            ClientIntent::ChatMessage { text } => {
                self.room.chat_message(player_id, &text)
            }
            ClientIntent::DeleteMessage { message_id } => {
                self.room.delete_message(player_id, message_id)
            }
            ClientIntent::ToggleChatLock => self.room.toggle_chat_lock(player_id),
            // Membership and rotation intents are resolved by the
            // connection handler before a room is involved.
            ClientIntent::CreateRoom { .. }
            | ClientIntent::JoinRoom { .. }
            | ClientIntent::RejoinRoom { .. }
            | ClientIntent::ChangeRoomCode => {
                tracing::warn!(
                    room_id = %self.room.id(),
                    %player_id,
                    "membership intent routed to a room actor, ignoring"
                );
                return;
            }
        };

        match result {
            Ok(events) => self.dispatch(events),
            Err(e) => {
                tracing::debug!(
                    room_id = %self.room.id(),
                    %player_id,
                    error = %e,
                    "intent rejected"
                );
                self.send_to(
                    player_id,
                    ServerEvent::Error { message: e.to_string() },
                );
            }
        }
    }

    fn sync_phase_timers(&mut self, before: (Phase, u32)) {
        let now = (self.room.phase(), self.room.round_number());
        if now == before {
            return;
        }
        match now.0 {
            Phase::Playing => {
                self.round_timer
                    .arm(Duration::from_secs(self.room.config().round_secs));
                self.results_timer.cancel();
            }
            Phase::Results => {
                self.results_timer
                    .arm(Duration::from_secs(self.room.config().results_secs));
                self.round_timer.cancel();
            }
            Phase::Lobby | Phase::Finished => {
                self.round_timer.cancel();
                self.results_timer.cancel();
            }
        }
    }

    fn sync_grace_timer(&mut self) {
        match self.room.next_grace_expiry() {
            Some(until) => self.grace_timer.arm(until),
            None => {
                self.grace_timer.cancel();
            }
        }
    }

    /// Delivers events to the right recipients. Senders whose connection
    /// is gone drop the event silently.
    fn dispatch(&self, events: Events) {
        for (recipient, event) in events {
            match recipient {
                Recipient::All => {
                    for sender in self.senders.values() {
                        let _ = sender.send(event.clone());
                    }
                }
                Recipient::Player(id) => self.send_to(id, event),
                Recipient::AllExcept(excluded) => {
                    for (id, sender) in &self.senders {
                        if *id != excluded {
                            let _ = sender.send(event.clone());
                        }
                    }
                }
            }
        }
    }

    fn send_to(&self, player_id: PlayerId, event: ServerEvent) {
        if let Some(sender) = self.senders.get(&player_id) {
            let _ = sender.send(event);
        }
    }
}

/// Spawns a new room actor task and returns a handle to it.
pub(crate) fn spawn_room(
    room_id: RoomId,
    code: RoomCode,
    config: RoomConfig,
    public_url: &str,
    reaper: mpsc::UnboundedSender<RoomId>,
) -> RoomHandle {
    let (tx, rx) = mpsc::channel(CHANNEL_SIZE);

    let actor = RoomActor {
        room: Room::new(room_id, code, config, public_url),
        senders: HashMap::new(),
        receiver: rx,
        round_timer: TimerSlot::new("round"),
        results_timer: TimerSlot::new("results"),
        grace_timer: TimerSlot::new("grace"),
        reaper,
    };

    tokio::spawn(actor.run());

    RoomHandle { room_id, sender: tx }
}
