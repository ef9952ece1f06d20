//! The room state machine.
//!
//! `Room` is a plain synchronous struct: every mutation takes the intent,
//! validates it, updates state, and returns the events to deliver as
//! `(Recipient, ServerEvent)` pairs. The actor owns a `Room`, feeds it
//! commands and timer firings, and dispatches whatever comes back. Keeping
//! the machine synchronous makes every rule testable without a runtime.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use roshambo_game::{
    build_leaderboard, resolve_submissions, winners, Pairings,
};
use roshambo_protocol::{
    Choice, LeaderboardEntry, MessageId, Outcome, PlayerId, PlayerInfo,
    Recipient, RoomCode, RoomId, ServerEvent,
};
use tokio::time::Instant;

use crate::{ChatLog, Phase, RoomConfig, RoomError};

/// Counter for generating stable player ids.
static NEXT_PLAYER_ID: AtomicU64 = AtomicU64::new(1);

const MAX_USERNAME_LEN: usize = 24;

/// Events to deliver after a mutation.
pub type Events = Vec<(Recipient, ServerEvent)>;

/// One seat in the roster.
///
/// The seat survives disconnection for the grace period, so everything a
/// rejoining player needs to pick up where they left off lives here.
#[derive(Debug, Clone)]
pub struct Player {
    pub id: PlayerId,
    pub username: String,
    pub is_host: bool,
    pub connected: bool,
    pub disconnected_at: Option<Instant>,
    /// This round's move, if locked in.
    pub choice: Option<Choice>,
    /// Cumulative wins; reset on return-to-lobby and cancel.
    pub wins: u32,
    /// Derived, round-scoped fields; cleared at round start.
    pub round_result: Option<Outcome>,
    pub opponent: Option<PlayerId>,
}

impl Player {
    fn new(username: String, is_host: bool) -> Self {
        Self {
            id: PlayerId(NEXT_PLAYER_ID.fetch_add(1, Ordering::Relaxed)),
            username,
            is_host,
            connected: true,
            disconnected_at: None,
            choice: None,
            wins: 0,
            round_result: None,
            opponent: None,
        }
    }
}

/// One room's whole state: roster, phase, pairings, chat.
///
/// Owned exclusively by its actor task; nothing here is shared.
pub struct Room {
    id: RoomId,
    code: RoomCode,
    public_url: String,
    phase: Phase,
    round_number: u32,
    roster: HashMap<PlayerId, Player>,
    pairings: Pairings,
    chat: ChatLog,
    config: RoomConfig,
}

impl Room {
    pub fn new(
        id: RoomId,
        code: RoomCode,
        config: RoomConfig,
        public_url: impl Into<String>,
    ) -> Self {
        Self {
            id,
            code,
            public_url: public_url.into(),
            phase: Phase::Lobby,
            round_number: 0,
            roster: HashMap::new(),
            pairings: Pairings::empty(),
            chat: ChatLog::new(&config),
            config,
        }
    }

    // -----------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------

    pub fn id(&self) -> RoomId {
        self.id
    }

    pub fn code(&self) -> &RoomCode {
        &self.code
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn round_number(&self) -> u32 {
        self.round_number
    }

    pub fn is_empty(&self) -> bool {
        self.roster.is_empty()
    }

    pub fn player_count(&self) -> usize {
        self.roster.len()
    }

    pub fn host_id(&self) -> Option<PlayerId> {
        self.roster.values().find(|p| p.is_host).map(|p| p.id)
    }

    pub fn config(&self) -> &RoomConfig {
        &self.config
    }

    pub fn contains(&self, player_id: PlayerId) -> bool {
        self.roster.contains_key(&player_id)
    }

    /// The shareable deep link for the current code.
    pub fn join_url(&self) -> String {
        format!("{}/?room={}", self.public_url.trim_end_matches('/'), self.code)
    }

    /// Whether every paired player still in the roster has locked in a
    /// choice. Seats removed mid-round no longer block early resolution.
    pub fn all_submitted(&self) -> bool {
        self.phase == Phase::Playing
            && self.pairings.paired_players().all(|id| {
                self.roster.get(&id).is_none_or(|p| p.choice.is_some())
            })
    }

    // -----------------------------------------------------------------
    // Roster: join, rejoin, disconnect, leave, kick
    // -----------------------------------------------------------------

    /// Enrolls a new player. `is_host` only for the room creator.
    pub fn add_player(
        &mut self,
        username: &str,
        is_host: bool,
    ) -> Result<(PlayerId, Events), RoomError> {
        let username = validate_username(username)?;
        if !is_host && !self.phase.is_joinable() {
            return Err(RoomError::WrongPhase("Game already in progress"));
        }
        if self.find_by_username(&username).is_some() {
            return Err(RoomError::UsernameTaken(username));
        }

        let player = Player::new(username.clone(), is_host);
        let id = player.id;
        self.roster.insert(id, player);
        tracing::info!(room_id = %self.id, player_id = %id, username, "player joined");

        let mut events: Events = vec![
            (
                Recipient::AllExcept(id),
                ServerEvent::PlayerJoined { username },
            ),
            self.player_list_event(),
        ];
        events.extend(self.welcome_events(id));
        Ok((id, events))
    }

    /// Reclaims a disconnected seat by case-insensitive username.
    ///
    /// On a miss nothing is mutated; on a hit the seat keeps its id,
    /// score, host status, and any choice already made this round.
    pub fn rejoin(
        &mut self,
        username: &str,
    ) -> Result<(PlayerId, Events), RoomError> {
        let id = self
            .find_by_username(username)
            .filter(|id| !self.roster[id].connected)
            .ok_or(RoomError::RejoinFailed)?;

        let player = self.roster.get_mut(&id).expect("found above");
        player.connected = true;
        player.disconnected_at = None;
        tracing::info!(room_id = %self.id, player_id = %id, username, "player rejoined");

        let mut events: Events = vec![self.player_list_event()];
        events.extend(self.welcome_events(id));
        Ok((id, events))
    }

    /// Marks a player disconnected; the seat stays for the grace period.
    pub fn mark_disconnected(&mut self, player_id: PlayerId) -> Events {
        let Some(player) = self.roster.get_mut(&player_id) else {
            return Vec::new();
        };
        player.connected = false;
        player.disconnected_at = Some(Instant::now());
        tracing::info!(
            room_id = %self.id,
            %player_id,
            "player disconnected, grace period started"
        );
        vec![self.player_list_event()]
    }

    /// Explicit leave: the seat is removed immediately, no grace.
    pub fn leave(&mut self, player_id: PlayerId) -> Events {
        let Some(player) = self.roster.get(&player_id) else {
            return Vec::new();
        };
        let username = player.username.clone();

        let mut events: Events =
            vec![(Recipient::All, ServerEvent::PlayerLeft { username })];
        events.extend(self.remove_from_roster(player_id));
        events
    }

    /// Host-only: removes a player immediately.
    pub fn kick(
        &mut self,
        actor: PlayerId,
        target: PlayerId,
    ) -> Result<Events, RoomError> {
        self.require_host(actor, "kick players")?;
        if actor == target {
            return Err(RoomError::CannotKickSelf);
        }
        let username = self
            .roster
            .get(&target)
            .map(|p| p.username.clone())
            .ok_or(RoomError::PlayerNotFound)?;
        tracing::info!(room_id = %self.id, player_id = %target, "player kicked");

        let mut events: Events = vec![
            (Recipient::Player(target), ServerEvent::Kicked),
            (
                Recipient::AllExcept(target),
                ServerEvent::PlayerKicked { username },
            ),
        ];
        events.extend(self.remove_from_roster(target));
        Ok(events)
    }

    /// Removes every seat whose grace period has elapsed.
    pub fn expire_disconnected(&mut self) -> Events {
        let grace = Duration::from_secs(self.config.reconnect_grace_secs);
        let overdue: Vec<PlayerId> = self
            .roster
            .values()
            .filter(|p| {
                p.disconnected_at
                    .is_some_and(|at| at.elapsed() >= grace)
            })
            .map(|p| p.id)
            .collect();

        let mut events = Events::new();
        for id in overdue {
            let username = self.roster[&id].username.clone();
            tracing::info!(
                room_id = %self.id,
                player_id = %id,
                "grace period elapsed, removing player"
            );
            events.push((Recipient::All, ServerEvent::PlayerLeft { username }));
            events.extend(self.remove_from_roster(id));
        }
        events
    }

    /// Time until the next disconnected seat expires, if any.
    pub fn next_grace_expiry(&self) -> Option<Duration> {
        let grace = Duration::from_secs(self.config.reconnect_grace_secs);
        self.roster
            .values()
            .filter_map(|p| p.disconnected_at)
            .map(|at| {
                (at + grace).saturating_duration_since(Instant::now())
            })
            .min()
    }

    // -----------------------------------------------------------------
    // Game flow
    // -----------------------------------------------------------------

    /// Host-only: starts the first round from the lobby.
    pub fn start_game(&mut self, actor: PlayerId) -> Result<Events, RoomError> {
        self.require_host(actor, "start the game")?;
        if self.phase != Phase::Lobby {
            return Err(RoomError::WrongPhase("Game already in progress"));
        }
        let contestants = self.eligible_contestants()?;
        Ok(self.start_round(contestants))
    }

    /// Starts the next round automatically when the results timer fires.
    ///
    /// If departures have made a round impossible (too few contestants,
    /// or odd under strict parity), the room falls back to the lobby
    /// instead, with the usual full reset.
    pub fn begin_next_round(&mut self) -> Events {
        if self.phase != Phase::Results {
            return Vec::new();
        }
        match self.eligible_contestants() {
            Ok(contestants) => self.start_round(contestants),
            Err(_) => {
                tracing::info!(
                    room_id = %self.id,
                    "cannot continue to next round, returning to lobby"
                );
                self.reset_to_lobby();
                vec![
                    (Recipient::All, ServerEvent::ReturnedToLobby),
                    self.player_list_event(),
                ]
            }
        }
    }

    /// Locks in (or replaces) a player's move for the current round.
    pub fn make_choice(
        &mut self,
        player_id: PlayerId,
        choice: Choice,
    ) -> Result<Events, RoomError> {
        if self.phase != Phase::Playing {
            return Err(RoomError::WrongPhase("No round in progress"));
        }
        if self.pairings.opponent_of(player_id).is_none() {
            return Err(RoomError::NotInRound);
        }
        let player = self
            .roster
            .get_mut(&player_id)
            .ok_or(RoomError::PlayerNotFound)?;
        player.choice = Some(choice);

        Ok(vec![self.player_list_event()])
    }

    /// Resolves the current round: scores, standings, threshold check.
    ///
    /// Safe to trigger redundantly (early resolution racing the round
    /// timer): outside `Playing` this is a silent no-op.
    pub fn resolve_round(&mut self) -> Events {
        if self.phase != Phase::Playing {
            return Vec::new();
        }

        let pairs = self.pairings.pairs().to_vec();
        for (a, b) in pairs {
            let choice_a = self.roster.get(&a).and_then(|p| p.choice);
            let choice_b = self.roster.get(&b).and_then(|p| p.choice);
            let (for_a, for_b) = resolve_submissions(choice_a, choice_b);
            self.record_result(a, for_a);
            self.record_result(b, for_b);
        }

        let board = self.leaderboard();
        let champions = winners(&board, self.config.win_threshold);
        self.phase = if champions.is_empty() {
            Phase::Results
        } else {
            Phase::Finished
        };
        tracing::info!(
            room_id = %self.id,
            round = self.round_number,
            phase = %self.phase,
            "round resolved"
        );

        let mut events: Events = self
            .roster
            .values()
            .map(|p| {
                (
                    Recipient::Player(p.id),
                    self.results_event_for(p, &board),
                )
            })
            .collect();
        if !champions.is_empty() {
            events.push((
                Recipient::All,
                ServerEvent::GameOver {
                    winners: champions,
                    leaderboard: board,
                },
            ));
        }
        events.push(self.player_list_event());
        events
    }

    /// Host-only: stops the game and resets everything back to the lobby.
    pub fn return_to_lobby(
        &mut self,
        actor: PlayerId,
    ) -> Result<Events, RoomError> {
        self.require_host(actor, "return to the lobby")?;
        if self.phase == Phase::Lobby {
            return Err(RoomError::WrongPhase("Already in the lobby"));
        }
        self.reset_to_lobby();
        Ok(vec![
            (Recipient::All, ServerEvent::ReturnedToLobby),
            self.player_list_event(),
        ])
    }

    /// Host-only: aborts the game in progress.
    pub fn cancel_game(&mut self, actor: PlayerId) -> Result<Events, RoomError> {
        self.require_host(actor, "cancel the game")?;
        if self.phase == Phase::Lobby {
            return Err(RoomError::WrongPhase("No game in progress"));
        }
        self.reset_to_lobby();
        Ok(vec![
            (Recipient::All, ServerEvent::GameCancelled),
            self.player_list_event(),
        ])
    }

    /// Installs a fresh public code (host authorization checked here, code
    /// generation and registry swap handled by the caller).
    pub fn rotate_code(
        &mut self,
        actor: PlayerId,
        new_code: RoomCode,
    ) -> Result<Events, RoomError> {
        self.require_host(actor, "change the room code")?;
        tracing::info!(room_id = %self.id, old = %self.code, new = %new_code, "room code rotated");
        self.code = new_code;
        Ok(vec![(
            Recipient::All,
            ServerEvent::RoomCodeChanged {
                room_code: self.code.clone(),
                join_url: self.join_url(),
            },
        )])
    }

    // -----------------------------------------------------------------
    // Chat
    // -----------------------------------------------------------------

    pub fn chat_message(
        &mut self,
        player_id: PlayerId,
        text: &str,
    ) -> Result<Events, RoomError> {
        let (username, is_host) = {
            let player = self
                .roster
                .get(&player_id)
                .ok_or(RoomError::PlayerNotFound)?;
            (player.username.clone(), player.is_host)
        };
        let entry = self.chat.push(player_id, &username, text, is_host)?;
        Ok(vec![(
            Recipient::All,
            ServerEvent::ChatMessage { message: entry },
        )])
    }

    pub fn delete_message(
        &mut self,
        actor: PlayerId,
        message_id: MessageId,
    ) -> Result<Events, RoomError> {
        self.require_host(actor, "delete messages")?;
        if !self.chat.delete(message_id) {
            return Err(RoomError::InvalidMessage("Message not found".into()));
        }
        Ok(vec![(
            Recipient::All,
            ServerEvent::MessageDeleted { message_id },
        )])
    }

    pub fn toggle_chat_lock(
        &mut self,
        actor: PlayerId,
    ) -> Result<Events, RoomError> {
        self.require_host(actor, "lock the chat")?;
        let locked = self.chat.toggle_lock();
        Ok(vec![(Recipient::All, ServerEvent::ChatLocked { locked })])
    }

    // -----------------------------------------------------------------
    // Snapshots
    // -----------------------------------------------------------------

    pub fn player_infos(&self) -> Vec<PlayerInfo> {
        let mut infos: Vec<PlayerInfo> = self
            .roster
            .values()
            .map(|p| PlayerInfo {
                player_id: p.id,
                username: p.username.clone(),
                is_host: p.is_host,
                wins: p.wins,
                connected: p.connected,
                has_chosen: p.choice.is_some(),
            })
            .collect();
        // Host first, then join order by id, so every broadcast renders
        // the roster identically.
        infos.sort_by_key(|p| (!p.is_host, p.player_id.0));
        infos
    }

    /// Standings over contestants (the host is an observer, not a row).
    pub fn leaderboard(&self) -> Vec<LeaderboardEntry> {
        build_leaderboard(self.roster.values().filter(|p| !p.is_host).map(
            |p| LeaderboardEntry {
                player_id: p.id,
                username: p.username.clone(),
                wins: p.wins,
            },
        ))
    }

    // -----------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------

    fn player_list_event(&self) -> (Recipient, ServerEvent) {
        (
            Recipient::All,
            ServerEvent::PlayerList { players: self.player_infos() },
        )
    }

    /// Catch-up events for a freshly (re)joined player.
    fn welcome_events(&self, id: PlayerId) -> Events {
        vec![
            (
                Recipient::Player(id),
                ServerEvent::ChatHistory { messages: self.chat.history() },
            ),
            (
                Recipient::Player(id),
                ServerEvent::ChatLocked { locked: self.chat.is_locked() },
            ),
        ]
    }

    fn find_by_username(&self, username: &str) -> Option<PlayerId> {
        self.roster
            .values()
            .find(|p| p.username.eq_ignore_ascii_case(username))
            .map(|p| p.id)
    }

    fn require_host(
        &self,
        actor: PlayerId,
        action: &'static str,
    ) -> Result<(), RoomError> {
        match self.roster.get(&actor) {
            Some(p) if p.is_host => Ok(()),
            Some(_) => Err(RoomError::NotHost(action)),
            None => Err(RoomError::PlayerNotFound),
        }
    }

    /// Connected non-host players, validated against the start rules.
    fn eligible_contestants(&self) -> Result<Vec<PlayerId>, RoomError> {
        let contestants: Vec<PlayerId> = self
            .roster
            .values()
            .filter(|p| !p.is_host && p.connected)
            .map(|p| p.id)
            .collect();

        if contestants.len() < self.config.min_players {
            return Err(RoomError::NotEnoughPlayers(self.config.min_players));
        }
        if contestants.len() % 2 != 0 && !self.config.allow_bye {
            return Err(RoomError::OddPlayerCount);
        }
        Ok(contestants)
    }

    /// The one place a round begins: bumps the round number, clears the
    /// round-scoped fields, computes pairings, and announces per player.
    fn start_round(&mut self, contestants: Vec<PlayerId>) -> Events {
        self.phase = Phase::Playing;
        self.round_number += 1;
        for player in self.roster.values_mut() {
            player.choice = None;
            player.round_result = None;
            player.opponent = None;
        }

        self.pairings = Pairings::generate(&contestants);
        for &(a, b) in self.pairings.pairs() {
            if let Some(p) = self.roster.get_mut(&a) {
                p.opponent = Some(b);
            }
            if let Some(p) = self.roster.get_mut(&b) {
                p.opponent = Some(a);
            }
        }
        tracing::info!(
            room_id = %self.id,
            round = self.round_number,
            pairs = self.pairings.pairs().len(),
            bye = ?self.pairings.bye(),
            "round started"
        );

        let mut events: Events = self
            .roster
            .values()
            .map(|p| {
                let opponent = p
                    .opponent
                    .and_then(|id| self.roster.get(&id))
                    .map(|o| o.username.clone());
                (
                    Recipient::Player(p.id),
                    ServerEvent::GameStarted {
                        round_number: self.round_number,
                        timer_secs: self.config.round_secs,
                        opponent,
                    },
                )
            })
            .collect();
        events.push(self.player_list_event());
        events
    }

    fn record_result(&mut self, id: PlayerId, outcome: Outcome) {
        if let Some(player) = self.roster.get_mut(&id) {
            player.round_result = Some(outcome);
            if outcome == Outcome::Win {
                player.wins += 1;
            }
        }
    }

    fn results_event_for(
        &self,
        player: &Player,
        board: &[LeaderboardEntry],
    ) -> ServerEvent {
        let opponent = player.opponent.and_then(|id| self.roster.get(&id));
        ServerEvent::GameResults {
            round_number: self.round_number,
            leaderboard: board.to_vec(),
            your_result: player.round_result,
            opponent_name: opponent.map(|o| o.username.clone()),
            your_choice: player.choice,
            opponent_choice: opponent.and_then(|o| o.choice),
        }
    }

    /// Full reset: scores, round counter, pairings, round-scoped fields.
    fn reset_to_lobby(&mut self) {
        self.phase = Phase::Lobby;
        self.round_number = 0;
        self.pairings = Pairings::empty();
        for player in self.roster.values_mut() {
            player.wins = 0;
            player.choice = None;
            player.round_result = None;
            player.opponent = None;
        }
    }

    /// Removes a seat and handles the host-transfer policy: when the host
    /// leaves, an arbitrary remaining player (connected preferred)
    /// inherits the room.
    fn remove_from_roster(&mut self, player_id: PlayerId) -> Events {
        let Some(removed) = self.roster.remove(&player_id) else {
            return Vec::new();
        };
        self.chat.forget_player(player_id);

        let mut events = Events::new();
        if removed.is_host {
            let heir = self
                .roster
                .values()
                .filter(|p| p.connected)
                .map(|p| p.id)
                .next()
                .or_else(|| self.roster.keys().next().copied());
            if let Some(heir) = heir {
                let new_host = self.roster.get_mut(&heir).expect("chosen above");
                new_host.is_host = true;
                let name = new_host.username.clone();
                tracing::info!(
                    room_id = %self.id,
                    new_host = %heir,
                    "host left, transferring host status"
                );
                events.push((Recipient::Player(heir), ServerEvent::BecameHost));
                events.push((
                    Recipient::All,
                    ServerEvent::HostLeft { new_host: name },
                ));
            }
        }
        if !self.roster.is_empty() {
            events.push(self.player_list_event());
        }
        events
    }
}

fn validate_username(username: &str) -> Result<String, RoomError> {
    let trimmed = username.trim();
    if trimmed.is_empty() {
        return Err(RoomError::InvalidUsername(
            "Username cannot be empty".into(),
        ));
    }
    if trimmed.chars().count() > MAX_USERNAME_LEN {
        return Err(RoomError::InvalidUsername(format!(
            "Username is too long (max {MAX_USERNAME_LEN} characters)"
        )));
    }
    Ok(trimmed.to_owned())
}

// =========================================================================
// Tests
// =========================================================================
