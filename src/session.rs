#![cfg(feature = "std")]

//! The per-peer session state machine.
//!
//! [`Session`] is synchronous and owns no I/O: every input is an [`Event`]
//! and every output is an [`Effect`] for the driver to carry out. The two
//! peers run the same machine; they differ only in [`Role`].

use rand::Rng;

use crate::core::{Board, GameEngine, GameStatus, Outcome, RoomCode, Symbol};
use crate::protocol::Message;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Created the room; decides symbols and owns rematch timing.
    Host,
    /// Connected to an existing room.
    Joiner,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No channel and no board.
    Idle,
    /// Host: room registered, nobody connected yet.
    AwaitingOpponent,
    /// Joiner: channel open, waiting for the host's `start`.
    AwaitingStart,
    Playing,
    GameOver(Outcome),
}

/// Something the local player asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Place our symbol on cell `0..9`.
    Play(usize),
    RequestRematch,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// The channel to the opponent is open.
    Opened { remote_username: String },
    Local(Command),
    Remote(Message),
    /// The channel closed under us.
    Closed,
}

/// Notifications for whatever front end presents the game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Update {
    Started {
        symbol: Symbol,
        my_turn: bool,
        opponent: String,
    },
    Moved {
        board: Board,
        index: usize,
        symbol: Symbol,
        my_turn: bool,
    },
    Finished {
        outcome: Outcome,
        line: Option<[usize; 3]>,
        board: Board,
        rematch_offered: bool,
    },
    /// The opponent asked for a rematch first.
    OpponentWantsRematch,
    /// We asked for a rematch and wait for the other side.
    AwaitingRematch,
    /// Session torn down locally; back to idle.
    Left,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    Send(Message),
    Notify(Update),
    /// Flush pending sends, then close the channel.
    Teardown,
}

pub struct Session {
    role: Role,
    room: RoomCode,
    local_username: String,
    remote_username: Option<String>,
    phase: Phase,
    game: Option<GameEngine>,
    quit_received: bool,
    effects: Vec<Effect>,
}

impl Session {
    /// Session for the player who registered `room`.
    pub fn host(room: RoomCode, local_username: impl Into<String>) -> Self {
        Self::new(Role::Host, room, local_username.into(), None, Phase::AwaitingOpponent)
    }

    /// Session for a player whose channel to `room` has just opened.
    pub fn joiner(
        room: RoomCode,
        local_username: impl Into<String>,
        remote_username: Option<String>,
    ) -> Self {
        Self::new(
            Role::Joiner,
            room,
            local_username.into(),
            remote_username,
            Phase::AwaitingStart,
        )
    }

    fn new(
        role: Role,
        room: RoomCode,
        local_username: String,
        remote_username: Option<String>,
        phase: Phase,
    ) -> Self {
        Self {
            role,
            room,
            local_username,
            remote_username,
            phase,
            game: None,
            quit_received: false,
            effects: Vec::new(),
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn room(&self) -> RoomCode {
        self.room
    }

    pub fn local_username(&self) -> &str {
        &self.local_username
    }

    pub fn remote_username(&self) -> Option<&str> {
        self.remote_username.as_deref()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn game(&self) -> Option<&GameEngine> {
        self.game.as_ref()
    }

    pub fn is_idle(&self) -> bool {
        self.phase == Phase::Idle
    }

    /// Feed one event through the machine and collect what must happen next.
    pub fn handle<R: Rng + ?Sized>(&mut self, event: Event, rng: &mut R) -> Vec<Effect> {
        if self.phase == Phase::Idle {
            log::debug!("Session idle, dropping {:?}", event);
            return Vec::new();
        }
        match event {
            Event::Opened { remote_username } => self.on_open(remote_username, rng),
            Event::Local(cmd) => self.on_command(cmd, rng),
            Event::Remote(msg) => self.on_message(msg, rng),
            Event::Closed => {
                if self.quit_received {
                    log::debug!("Channel closed after opponent quit");
                } else {
                    log::info!("Channel closed without quit");
                    self.abort(Outcome::OpponentDisconnected);
                }
            }
        }
        std::mem::take(&mut self.effects)
    }

    fn on_open<R: Rng + ?Sized>(&mut self, remote_username: String, rng: &mut R) {
        log::info!("Channel open with {}", remote_username);
        self.remote_username = Some(remote_username);
        if self.role == Role::Host && self.phase == Phase::AwaitingOpponent {
            self.start_new_game(rng);
        }
    }

    /// Host only: flip a coin for who starts and announce the game.
    fn start_new_game<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let host_starts = rng.random_bool(0.5);
        self.begin_round(host_starts);
    }

    /// Host only: start a game where the host moves first iff `host_starts`.
    /// The first mover always plays X.
    fn begin_round(&mut self, host_starts: bool) {
        if self.role != Role::Host {
            log::debug!("Joiner waits for the host to start the game");
            return;
        }
        let symbol = if host_starts { Symbol::X } else { Symbol::O };
        self.game = Some(GameEngine::new(symbol, host_starts));
        self.phase = Phase::Playing;
        log::info!(
            "Game started in room {}: host plays {}, {}",
            self.room,
            symbol,
            if host_starts { "host starts" } else { "joiner starts" }
        );
        self.effects.push(Effect::Send(Message::Start {
            symbol: symbol.opponent(),
            start_turn: !host_starts,
            opponent_name: self.local_username.clone(),
        }));
        self.effects.push(Effect::Notify(Update::Started {
            symbol,
            my_turn: host_starts,
            opponent: self.remote_username.clone().unwrap_or_default(),
        }));
    }

    fn on_command<R: Rng + ?Sized>(&mut self, cmd: Command, rng: &mut R) {
        match cmd {
            Command::Play(index) => self.play_local(index),
            Command::RequestRematch => self.request_rematch(rng),
            Command::Quit => self.quit(),
        }
    }

    fn play_local(&mut self, index: usize) {
        if self.phase != Phase::Playing {
            log::debug!("Ignoring move at {} outside of play", index);
            return;
        }
        let Some(game) = self.game.as_mut() else {
            return;
        };
        match game.play_local(index) {
            Ok(status) => {
                let symbol = game.local_symbol();
                self.effects.push(Effect::Send(Message::Move {
                    index: index as u8,
                    symbol,
                }));
                self.after_move(index, symbol, status);
            }
            Err(e) => log::debug!("Ignoring move at {}: {}", index, e),
        }
    }

    fn after_move(&mut self, index: usize, symbol: Symbol, status: GameStatus) {
        let Some(game) = self.game.as_ref() else {
            return;
        };
        let board = *game.board();
        self.effects.push(Effect::Notify(Update::Moved {
            board,
            index,
            symbol,
            my_turn: game.local_turn(),
        }));
        if let GameStatus::Over { outcome, line } = status {
            log::info!("Game over in room {}: {:?}", self.room, outcome);
            self.phase = Phase::GameOver(outcome);
            self.effects.push(Effect::Notify(Update::Finished {
                outcome,
                line,
                board,
                rematch_offered: outcome.offers_rematch(),
            }));
        }
    }

    fn request_rematch<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let Some(game) = self.game.as_mut() else {
            return;
        };
        if !game.request_rematch_local() {
            log::debug!("Rematch not available or already requested");
            return;
        }
        self.effects.push(Effect::Send(Message::PlayAgain));
        if self.role == Role::Host && game.rematch_agreed() {
            self.restart(rng);
        } else {
            self.effects.push(Effect::Notify(Update::AwaitingRematch));
        }
    }

    /// Host only: both sides agreed, begin the next game.
    fn restart<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        log::info!("Both players want a rematch, restarting");
        self.start_new_game(rng);
        self.effects.push(Effect::Send(Message::Restart));
    }

    fn quit(&mut self) {
        log::info!("Leaving room {}", self.room);
        self.effects.push(Effect::Send(Message::Quit));
        self.effects.push(Effect::Teardown);
        self.reset();
        self.effects.push(Effect::Notify(Update::Left));
    }

    /// Drop all game and peer state and return to idle.
    pub fn reset(&mut self) {
        self.phase = Phase::Idle;
        self.game = None;
        self.remote_username = None;
        self.quit_received = false;
    }

    fn on_message<R: Rng + ?Sized>(&mut self, msg: Message, rng: &mut R) {
        log::debug!("Received {}", msg.kind());
        match msg {
            Message::Start {
                symbol,
                start_turn,
                opponent_name,
            } => {
                if self.role == Role::Host {
                    log::warn!("Host ignores start from joiner");
                    return;
                }
                self.game = Some(GameEngine::new(symbol, start_turn));
                self.phase = Phase::Playing;
                self.remote_username = Some(opponent_name.clone());
                log::info!("Game started by {}: playing {}", opponent_name, symbol);
                self.effects.push(Effect::Notify(Update::Started {
                    symbol,
                    my_turn: start_turn,
                    opponent: opponent_name,
                }));
            }
            Message::Move { index, symbol } => {
                if self.phase != Phase::Playing {
                    log::warn!("Ignoring move at {} outside of play", index);
                    return;
                }
                let Some(game) = self.game.as_mut() else {
                    return;
                };
                match game.apply_remote(index as usize, symbol) {
                    Ok(status) => self.after_move(index as usize, symbol, status),
                    Err(e) => log::warn!("Ignoring opponent move at {}: {}", index, e),
                }
            }
            Message::PlayAgain => {
                let Some(game) = self.game.as_mut() else {
                    return;
                };
                if !game.request_rematch_remote() {
                    log::debug!("Ignoring play-again: no rematch pending");
                    return;
                }
                if self.role == Role::Host && game.rematch_agreed() {
                    self.restart(rng);
                } else if !game.rematch_requested_locally() {
                    self.effects.push(Effect::Notify(Update::OpponentWantsRematch));
                }
            }
            Message::Restart => {
                if self.role == Role::Host {
                    log::warn!("Host ignores restart from joiner");
                } else if self.phase == Phase::Playing {
                    log::debug!("Restart confirmed, new game already running");
                } else {
                    self.game = None;
                    self.phase = Phase::AwaitingStart;
                }
            }
            Message::Quit => {
                self.quit_received = true;
                self.abort(Outcome::OpponentQuit);
            }
            Message::RoomFull => self.abort(Outcome::OpponentRoomFull),
            Message::Hello { .. } | Message::HelloAck { .. } => {
                log::warn!("Ignoring {} after the channel opened", msg.kind());
            }
            Message::Unknown => log::warn!("Ignoring unknown message"),
        }
    }

    /// Force the game over for a reason the board did not decide. An earlier
    /// abort is never overwritten.
    fn abort(&mut self, outcome: Outcome) {
        if let Phase::GameOver(prev) = self.phase {
            if prev.is_abort() {
                return;
            }
        }
        let board = match self.game.as_mut() {
            Some(game) => {
                game.abort(outcome);
                *game.board()
            }
            None => Board::new(),
        };
        log::info!("Game ended in room {}: {:?}", self.room, outcome);
        self.phase = Phase::GameOver(outcome);
        self.effects.push(Effect::Notify(Update::Finished {
            outcome,
            line: None,
            board,
            rematch_offered: false,
        }));
    }
}
