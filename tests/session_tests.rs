use p2p_tictactoe::{
    Board, Command, Effect, Event, GameStatus, Message, Outcome, Phase, RoomCode, Session,
    Symbol, Update,
};
use rand::rngs::SmallRng;
use rand::{RngCore, SeedableRng};
use std::collections::VecDeque;

/// Every draw yields the same word, so `random_bool(0.5)` always lands the
/// same way: all zeros falls below one half, all ones above.
struct FixedCoin(u64);

impl FixedCoin {
    fn host_starts(host_starts: bool) -> Self {
        FixedCoin(if host_starts { 0 } else { u64::MAX })
    }
}

impl RngCore for FixedCoin {
    fn next_u32(&mut self) -> u32 {
        self.0 as u32
    }

    fn next_u64(&mut self) -> u64 {
        self.0
    }

    fn fill_bytes(&mut self, dst: &mut [u8]) {
        dst.fill(self.0 as u8);
    }
}

/// Host and joiner sessions wired back to back, with every effect recorded.
struct Pair {
    host: Session,
    joiner: Session,
    rng: FixedCoin,
    to_host: VecDeque<Event>,
    to_joiner: VecDeque<Event>,
    host_updates: Vec<Update>,
    joiner_updates: Vec<Update>,
    host_sent: Vec<Message>,
    joiner_sent: Vec<Message>,
}

impl Pair {
    /// Joiner is connected, host has accepted; `host_starts` fixes the coin.
    fn started(host_starts: bool) -> Self {
        let room = RoomCode::parse("AB12C9").unwrap();
        let mut pair = Pair {
            host: Session::host(room, "Host"),
            joiner: Session::joiner(room, "Guest", Some("Host".into())),
            rng: FixedCoin::host_starts(host_starts),
            to_host: VecDeque::new(),
            to_joiner: VecDeque::new(),
            host_updates: Vec::new(),
            joiner_updates: Vec::new(),
            host_sent: Vec::new(),
            joiner_sent: Vec::new(),
        };
        assert_eq!(pair.host.phase(), Phase::AwaitingOpponent);
        assert_eq!(pair.joiner.phase(), Phase::AwaitingStart);
        // The host learns the joiner's name when the channel opens.
        pair.host_event(Event::Opened {
            remote_username: "Guest".into(),
        });
        assert!(matches!(pair.host_sent[0], Message::Start { .. }));
        assert_eq!(pair.host.game().unwrap().local_turn(), host_starts);
        pair.pump();
        pair.host_sent.clear();
        pair.joiner_sent.clear();
        pair
    }

    fn host_event(&mut self, event: Event) {
        let effects = self.host.handle(event, &mut self.rng);
        self.route(true, effects);
    }

    fn joiner_event(&mut self, event: Event) {
        let effects = self.joiner.handle(event, &mut self.rng);
        self.route(false, effects);
    }

    fn route(&mut self, from_host: bool, effects: Vec<Effect>) {
        for effect in effects {
            match (effect, from_host) {
                (Effect::Send(msg), true) => {
                    self.host_sent.push(msg.clone());
                    self.to_joiner.push_back(Event::Remote(msg));
                }
                (Effect::Send(msg), false) => {
                    self.joiner_sent.push(msg.clone());
                    self.to_host.push_back(Event::Remote(msg));
                }
                (Effect::Notify(u), true) => self.host_updates.push(u),
                (Effect::Notify(u), false) => self.joiner_updates.push(u),
                (Effect::Teardown, true) => self.to_joiner.push_back(Event::Closed),
                (Effect::Teardown, false) => self.to_host.push_back(Event::Closed),
            }
        }
    }

    /// Deliver queued events until both sides are quiet.
    fn pump(&mut self) {
        loop {
            if let Some(ev) = self.to_joiner.pop_front() {
                self.joiner_event(ev);
            } else if let Some(ev) = self.to_host.pop_front() {
                self.host_event(ev);
            } else {
                break;
            }
        }
    }

    fn play(&mut self, host: bool, cell: usize) {
        let ev = Event::Local(Command::Play(cell));
        if host {
            self.host_event(ev);
        } else {
            self.joiner_event(ev);
        }
        self.pump();
    }

    fn board(&self, host: bool) -> Board {
        let session = if host { &self.host } else { &self.joiner };
        *session.game().unwrap().board()
    }
}

#[test]
fn test_opening_starts_a_game_and_sends_start() {
    let room = RoomCode::parse("AB12C9").unwrap();
    let mut host = Session::host(room, "Host");
    let mut rng = SmallRng::seed_from_u64(3);
    let effects = host.handle(
        Event::Opened {
            remote_username: "Guest".into(),
        },
        &mut rng,
    );
    assert_eq!(host.phase(), Phase::Playing);
    assert_eq!(host.remote_username(), Some("Guest"));
    let game = host.game().unwrap();
    let host_symbol = game.local_symbol();
    // First mover plays X.
    assert_eq!(game.local_turn(), host_symbol == Symbol::X);
    assert!(effects.contains(&Effect::Send(Message::Start {
        symbol: host_symbol.opponent(),
        start_turn: !game.local_turn(),
        opponent_name: "Host".into(),
    })));
}

#[test]
fn test_host_starting_room_scenario() {
    let pair = Pair::started(true);
    let host = pair.host.game().unwrap();
    assert_eq!(*host.board(), Board::new());
    assert_eq!(host.local_symbol(), Symbol::X);
    assert!(host.local_turn());

    let joiner = pair.joiner.game().unwrap();
    assert_eq!(pair.joiner.phase(), Phase::Playing);
    assert_eq!(joiner.local_symbol(), Symbol::O);
    assert!(!joiner.local_turn());
    assert_eq!(
        pair.joiner_updates.last(),
        Some(&Update::Started {
            symbol: Symbol::O,
            my_turn: false,
            opponent: "Host".into()
        })
    );
}

#[test]
fn test_moves_mirror_and_flip_turns() {
    let mut pair = Pair::started(false);
    assert!(pair.joiner.game().unwrap().local_turn());
    pair.play(false, 4);
    assert_eq!(pair.joiner_sent.last(), Some(&Message::Move { index: 4, symbol: Symbol::X }));
    assert!(pair.host.game().unwrap().local_turn());
    assert!(!pair.joiner.game().unwrap().local_turn());
    assert_eq!(pair.board(true), pair.board(false));
}

#[test]
fn test_out_of_turn_and_occupied_moves_are_ignored() {
    let mut pair = Pair::started(true);
    pair.play(false, 0);
    assert!(pair.joiner_sent.is_empty());
    pair.play(true, 0);
    pair.play(false, 0);
    assert_eq!(pair.joiner_sent.len(), 0);
    assert_eq!(pair.board(false).get(0), Ok(Some(Symbol::X)));
}

#[test]
fn test_win_ends_both_sides() {
    let mut pair = Pair::started(true);
    for (host, cell) in [(true, 0), (false, 3), (true, 1), (false, 4), (true, 2)] {
        pair.play(host, cell);
    }
    assert_eq!(pair.host.phase(), Phase::GameOver(Outcome::Win));
    assert_eq!(pair.joiner.phase(), Phase::GameOver(Outcome::Loss));
    assert_eq!(
        pair.joiner.game().unwrap().status(),
        GameStatus::Over {
            outcome: Outcome::Loss,
            line: Some([0, 1, 2])
        }
    );
    assert!(pair.host_updates.contains(&Update::Finished {
        outcome: Outcome::Win,
        line: Some([0, 1, 2]),
        board: pair.board(true),
        rematch_offered: true,
    }));
    // Further moves do nothing.
    pair.play(false, 8);
    assert_eq!(pair.board(false).get(8), Ok(None));
}

fn finished_pair() -> Pair {
    let mut pair = Pair::started(true);
    for (host, cell) in [(true, 0), (false, 3), (true, 1), (false, 4), (true, 2)] {
        pair.play(host, cell);
    }
    pair
}

fn count_starts(sent: &[Message]) -> usize {
    sent.iter().filter(|m| matches!(m, Message::Start { .. })).count()
}

#[test]
fn test_rematch_host_first() {
    let mut pair = finished_pair();
    pair.host_event(Event::Local(Command::RequestRematch));
    assert_eq!(pair.host_updates.last(), Some(&Update::AwaitingRematch));
    pair.pump();
    assert_eq!(pair.joiner_updates.last(), Some(&Update::OpponentWantsRematch));
    assert!(pair.joiner.game().unwrap().rematch_requested_remotely());
    assert_eq!(count_starts(&pair.host_sent), 0);

    pair.joiner_event(Event::Local(Command::RequestRematch));
    pair.pump();
    assert_eq!(count_starts(&pair.host_sent), 1);
    assert_eq!(pair.host_sent.last(), Some(&Message::Restart));
    assert_eq!(pair.host.phase(), Phase::Playing);
    assert_eq!(pair.joiner.phase(), Phase::Playing);
    assert_eq!(pair.board(true), Board::new());
    assert_eq!(pair.board(false), Board::new());
    assert_ne!(
        pair.host.game().unwrap().local_turn(),
        pair.joiner.game().unwrap().local_turn()
    );
}

#[test]
fn test_rematch_joiner_first() {
    let mut pair = finished_pair();
    pair.joiner_event(Event::Local(Command::RequestRematch));
    assert_eq!(pair.joiner_updates.last(), Some(&Update::AwaitingRematch));
    pair.pump();
    assert_eq!(pair.host_updates.last(), Some(&Update::OpponentWantsRematch));

    pair.host_event(Event::Local(Command::RequestRematch));
    pair.pump();
    assert_eq!(count_starts(&pair.host_sent), 1);
    assert_eq!(pair.joiner.phase(), Phase::Playing);
    assert_eq!(
        pair.host.game().unwrap().local_symbol().opponent(),
        pair.joiner.game().unwrap().local_symbol()
    );
}

#[test]
fn test_joiner_never_restarts_on_its_own() {
    let mut pair = finished_pair();
    pair.joiner_event(Event::Local(Command::RequestRematch));
    pair.joiner_event(Event::Remote(Message::PlayAgain));
    assert!(count_starts(&pair.joiner_sent) == 0);
    assert!(!pair.joiner_sent.contains(&Message::Restart));
    assert_eq!(pair.joiner.phase(), Phase::GameOver(Outcome::Loss));
}

#[test]
fn test_rematch_before_game_over_is_ignored() {
    let mut pair = Pair::started(true);
    pair.host_event(Event::Local(Command::RequestRematch));
    assert!(pair.host_sent.iter().all(|m| *m != Message::PlayAgain));
}

#[test]
fn test_quit_mid_game() {
    let mut pair = Pair::started(true);
    pair.play(true, 4);
    pair.joiner_event(Event::Local(Command::Quit));
    assert!(pair.joiner.is_idle());
    assert!(pair.joiner.game().is_none());
    assert_eq!(pair.joiner_updates.last(), Some(&Update::Left));
    pair.pump();
    assert_eq!(pair.host.phase(), Phase::GameOver(Outcome::OpponentQuit));
    // The close that follows the quit does not change the reason.
    assert_eq!(
        pair.host_updates
            .iter()
            .filter(|u| matches!(u, Update::Finished { .. }))
            .count(),
        1
    );
    assert_eq!(
        pair.host_updates.last(),
        Some(&Update::Finished {
            outcome: Outcome::OpponentQuit,
            line: None,
            board: pair.board(true),
            rematch_offered: false,
        })
    );
}

#[test]
fn test_quit_after_game_over_replaces_result() {
    let mut pair = finished_pair();
    pair.host_event(Event::Local(Command::RequestRematch));
    pair.host_event(Event::Local(Command::Quit));
    pair.pump();
    assert_eq!(pair.joiner.phase(), Phase::GameOver(Outcome::OpponentQuit));
    assert!(!pair.joiner.game().unwrap().rematch_offered());
    pair.joiner_event(Event::Local(Command::RequestRematch));
    assert!(!pair.joiner_sent.contains(&Message::PlayAgain));
}

#[test]
fn test_disconnect_without_quit() {
    let mut pair = Pair::started(true);
    pair.joiner_event(Event::Closed);
    assert_eq!(pair.joiner.phase(), Phase::GameOver(Outcome::OpponentDisconnected));
    // A late quit never overwrites the first abort.
    pair.joiner_event(Event::Remote(Message::Quit));
    assert_eq!(pair.joiner.phase(), Phase::GameOver(Outcome::OpponentDisconnected));
}

#[test]
fn test_room_full_rejection() {
    let room = RoomCode::parse("AB12C9").unwrap();
    let mut joiner = Session::joiner(room, "Late", None);
    let mut rng = SmallRng::seed_from_u64(0);
    let effects = joiner.handle(Event::Remote(Message::RoomFull), &mut rng);
    assert_eq!(joiner.phase(), Phase::GameOver(Outcome::OpponentRoomFull));
    assert_eq!(
        effects,
        vec![Effect::Notify(Update::Finished {
            outcome: Outcome::OpponentRoomFull,
            line: None,
            board: Board::new(),
            rematch_offered: false,
        })]
    );
}

#[test]
fn test_unknown_and_stray_messages_are_ignored() {
    let mut pair = Pair::started(true);
    let before = pair.board(false);
    pair.joiner_event(Event::Remote(Message::Unknown));
    pair.host_event(Event::Remote(Message::Start {
        symbol: Symbol::X,
        start_turn: true,
        opponent_name: "Mallory".into(),
    }));
    pair.host_event(Event::Remote(Message::Restart));
    pair.joiner_event(Event::Remote(Message::Move { index: 42, symbol: Symbol::X }));
    assert_eq!(pair.board(false), before);
    assert_eq!(pair.host.phase(), Phase::Playing);
    assert_eq!(pair.joiner.phase(), Phase::Playing);
    assert_eq!(pair.host.game().unwrap().local_symbol(), Symbol::X);
}

#[test]
fn test_idle_session_ignores_everything() {
    let mut pair = Pair::started(true);
    pair.host_event(Event::Local(Command::Quit));
    let mut rng = SmallRng::seed_from_u64(0);
    assert!(pair.host.handle(Event::Remote(Message::PlayAgain), &mut rng).is_empty());
    assert!(pair.host.handle(Event::Closed, &mut rng).is_empty());
}
