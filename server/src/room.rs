//! Room membership and the round state machine
//!
//! A room moves through `Idle → Countdown → RoundActive → Ended → Idle`.
//! `RoomState` is plain data with synchronous transitions: each transition
//! returns the messages it wants delivered (and the timer it wants scheduled)
//! instead of sending anything itself. Callers hold the room's lock only
//! while running a transition and do the delivery after releasing it.
//!
//! Timers are tagged with the round epoch they were scheduled for. A timer
//! that fires for an older epoch, or finds the room in a different phase,
//! does nothing.

use crate::error::GameError;
use crate::hub::ConnectionId;
use crate::words::is_derivable;
use log::{debug, info};
use shared::ServerMessage;
use tokio::sync::{Mutex, MutexGuard};

/// Players that must opt in before a round can start
pub const MIN_PLAYERS: usize = 2;

pub const START_PROMPT: &str = "press start to play";
pub const ALONE_NOTICE: &str = "cannot play alone";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Countdown,
    RoundActive,
    Ended,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    pub conn: ConnectionId,
    pub name: String,
}

/// A message and the connections it goes to, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub targets: Vec<ConnectionId>,
    pub message: ServerMessage,
}

/// One-shot callback a transition asks the caller to schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timer {
    BeginRound { epoch: u64 },
    EndRound { epoch: u64 },
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct Effects {
    pub deliveries: Vec<Delivery>,
    pub timer: Option<Timer>,
}

/// What a finished round produced, handed out while the room sits in `Ended`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundOutcome {
    /// Top scorer and their word count, if anyone scored
    pub winner: Option<(String, u32)>,
    /// End-of-round notice for the players of the round
    pub notice: Delivery,
}

/// Accepted-word counts for the current round, in first-scored order.
#[derive(Debug, Default, Clone)]
pub struct RoundTally {
    entries: Vec<TallyEntry>,
}

#[derive(Debug, Clone)]
struct TallyEntry {
    player: String,
    words: u32,
    // acceptance sequence number at which `words` was reached
    reached_at: u64,
}

impl RoundTally {
    /// Adds one word for `player`; returns the new count.
    pub fn credit(&mut self, player: &str, sequence: u64) -> u32 {
        match self.entries.iter_mut().find(|entry| entry.player == player) {
            Some(entry) => {
                entry.words += 1;
                entry.reached_at = sequence;
                entry.words
            }
            None => {
                self.entries.push(TallyEntry {
                    player: player.to_string(),
                    words: 1,
                    reached_at: sequence,
                });
                1
            }
        }
    }

    /// Highest count among players accepted by `eligible`. Equal counts go to
    /// whoever reached that count first.
    pub fn leader<F>(&self, eligible: F) -> Option<(&str, u32)>
    where
        F: Fn(&str) -> bool,
    {
        self.entries
            .iter()
            .filter(|entry| eligible(&entry.player))
            .min_by(|a, b| {
                b.words
                    .cmp(&a.words)
                    .then(a.reached_at.cmp(&b.reached_at))
            })
            .map(|entry| (entry.player.as_str(), entry.words))
    }

    pub fn scores(&self) -> Vec<(String, u32)> {
        self.entries
            .iter()
            .map(|entry| (entry.player.clone(), entry.words))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// Everything a room knows. Only mutated through `Room::lock`.
#[derive(Debug)]
pub struct RoomState {
    name: String,
    members: Vec<Member>,
    active: Vec<Member>,
    phase: Phase,
    reference: String,
    history: Vec<String>,
    tally: RoundTally,
    epoch: u64,
    accepted: u64,
}

impl RoomState {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            members: Vec::new(),
            active: Vec::new(),
            phase: Phase::Idle,
            reference: String::new(),
            history: Vec::new(),
            tally: RoundTally::default(),
            epoch: 0,
            accepted: 0,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Reference word of the running round, empty outside `RoundActive`
    pub fn reference_word(&self) -> &str {
        &self.reference
    }

    pub fn members(&self) -> &[Member] {
        &self.members
    }

    pub fn active_players(&self) -> &[Member] {
        &self.active
    }

    pub fn history(&self) -> &[String] {
        &self.history
    }

    pub fn scores(&self) -> Vec<(String, u32)> {
        self.tally.scores()
    }

    pub fn is_member(&self, conn: ConnectionId) -> bool {
        self.members.iter().any(|member| member.conn == conn)
    }

    pub fn is_active(&self, conn: ConnectionId) -> bool {
        self.active.iter().any(|member| member.conn == conn)
    }

    fn member_ids(&self) -> Vec<ConnectionId> {
        self.members.iter().map(|member| member.conn).collect()
    }

    fn active_ids(&self) -> Vec<ConnectionId> {
        self.active.iter().map(|member| member.conn).collect()
    }

    /// Adds a member. Returns the join notice for all members, or `None` if
    /// the connection was already in the room.
    pub fn join(&mut self, conn: ConnectionId, name: &str) -> Option<Delivery> {
        if self.is_member(conn) {
            return None;
        }

        self.members.push(Member {
            conn,
            name: name.to_string(),
        });
        info!("{} joined room {}", name, self.name);

        Some(Delivery {
            targets: self.member_ids(),
            message: ServerMessage::info(format!("{} joined {}", name, self.name)),
        })
    }

    /// Removes a member (and their round enrolment). Returns the leave notice
    /// for the remaining members, or `None` if the connection was not here.
    pub fn leave(&mut self, conn: ConnectionId) -> Option<Delivery> {
        let index = self.members.iter().position(|member| member.conn == conn)?;
        let member = self.members.remove(index);
        self.active.retain(|active| active.conn != conn);
        info!("{} left room {}", member.name, self.name);

        Some(Delivery {
            targets: self.member_ids(),
            message: ServerMessage::info(format!("{} left {}", member.name, self.name)),
        })
    }

    /// Opts a member into the next round.
    ///
    /// The first request from `Idle` opens the countdown, prompts every
    /// member and asks for the `BeginRound` timer. Requests during the
    /// countdown just enrol the caller.
    pub fn request_start(&mut self, conn: ConnectionId) -> Result<Effects, GameError> {
        let member = self
            .members
            .iter()
            .find(|member| member.conn == conn)
            .cloned()
            .ok_or_else(|| GameError::NotInRoom(self.name.clone()))?;

        match self.phase {
            Phase::Idle => {
                self.phase = Phase::Countdown;
                self.epoch += 1;
                info!(
                    "Room {}: countdown for round {} started by {}",
                    self.name, self.epoch, member.name
                );
                self.active = vec![member];

                Ok(Effects {
                    deliveries: vec![Delivery {
                        targets: self.member_ids(),
                        message: ServerMessage::info(START_PROMPT),
                    }],
                    timer: Some(Timer::BeginRound { epoch: self.epoch }),
                })
            }
            Phase::Countdown => {
                if !self.is_active(conn) {
                    debug!("Room {}: {} opted in", self.name, member.name);
                    self.active.push(member);
                }
                Ok(Effects::default())
            }
            Phase::RoundActive | Phase::Ended => Err(GameError::RoundInProgress),
        }
    }

    /// Countdown timer callback: starts the round with `word` if enough
    /// players opted in, otherwise returns the room to `Idle`.
    pub fn begin_round(&mut self, epoch: u64, word: &str) -> Effects {
        if self.phase != Phase::Countdown || self.epoch != epoch {
            debug!(
                "Room {}: ignoring stale countdown timer for round {}",
                self.name, epoch
            );
            return Effects::default();
        }

        let targets = self.active_ids();

        if self.active.len() < MIN_PLAYERS {
            info!("Room {}: not enough players, back to idle", self.name);
            self.active.clear();
            self.phase = Phase::Idle;

            return Effects {
                deliveries: vec![Delivery {
                    targets,
                    message: ServerMessage::info(ALONE_NOTICE),
                }],
                timer: None,
            };
        }

        self.reference = word.to_string();
        self.phase = Phase::RoundActive;
        info!(
            "Room {}: round {} started with {} players",
            self.name,
            self.epoch,
            self.active.len()
        );

        Effects {
            deliveries: vec![Delivery {
                targets,
                message: ServerMessage::Start {
                    word: word.to_string(),
                },
            }],
            timer: Some(Timer::EndRound { epoch }),
        }
    }

    /// Scores a submission from an enrolled player.
    ///
    /// Accepted words must be non-empty, derivable from the reference word
    /// and new this round. On success returns the full tally for the round's
    /// players; every failure is `WordRejected`.
    pub fn submit_word(&mut self, conn: ConnectionId, word: &str) -> Result<Delivery, GameError> {
        if self.phase != Phase::RoundActive || word.is_empty() {
            return Err(GameError::WordRejected);
        }

        let player = self
            .active
            .iter()
            .find(|member| member.conn == conn)
            .map(|member| member.name.clone())
            .ok_or(GameError::WordRejected)?;

        if !is_derivable(&self.reference, word) || self.history.iter().any(|w| w == word) {
            debug!("Room {}: rejected {:?} from {}", self.name, word, player);
            return Err(GameError::WordRejected);
        }

        self.accepted += 1;
        let count = self.tally.credit(&player, self.accepted);
        self.history.push(word.to_string());
        debug!(
            "Room {}: accepted {:?} from {} ({} words)",
            self.name, word, player, count
        );

        Ok(Delivery {
            targets: self.active_ids(),
            message: ServerMessage::Score {
                scores: self.tally.scores(),
            },
        })
    }

    /// Round timer callback: closes the round and picks the winner among the
    /// players still enrolled. The room stays in `Ended` until `reset`.
    pub fn finish_round(&mut self, epoch: u64) -> Option<RoundOutcome> {
        if self.phase != Phase::RoundActive || self.epoch != epoch {
            debug!(
                "Room {}: ignoring stale round timer for round {}",
                self.name, epoch
            );
            return None;
        }

        self.phase = Phase::Ended;
        self.reference.clear();

        let active = &self.active;
        let winner = self
            .tally
            .leader(|name| active.iter().any(|member| member.name == name))
            .map(|(name, words)| (name.to_string(), words));

        let message = match &winner {
            Some((name, words)) => format!(
                "round over, winner: {} ({} {})",
                name,
                words,
                if *words == 1 { "word" } else { "words" }
            ),
            None if self.history.is_empty() => "round over, no words were found".to_string(),
            // Everyone who scored has left
            None => "round over, no winner".to_string(),
        };
        info!("Room {}: {}", self.name, message);

        Some(RoundOutcome {
            winner,
            notice: Delivery {
                targets: self.active_ids(),
                message: ServerMessage::End { message },
            },
        })
    }

    /// Clears the finished round and returns to `Idle`.
    pub fn reset(&mut self) {
        if self.phase != Phase::Ended {
            return;
        }

        self.active.clear();
        self.tally.clear();
        self.history.clear();
        self.phase = Phase::Idle;
    }

    /// Checks the phase/word/tally invariants and that round players are
    /// members.
    pub fn is_consistent(&self) -> bool {
        let word_matches_phase = (self.phase == Phase::RoundActive) == !self.reference.is_empty();
        let tally_empty_when_waiting =
            !matches!(self.phase, Phase::Idle | Phase::Countdown) || self.tally.is_empty();
        let active_are_members = self.active.iter().all(|a| self.is_member(a.conn));

        word_matches_phase && tally_empty_when_waiting && active_are_members
    }
}

/// A named room behind its own lock.
#[derive(Debug)]
pub struct Room {
    name: String,
    state: Mutex<RoomState>,
}

impl Room {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            state: Mutex::new(RoomState::new(name.clone())),
            name,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Locks the room. Keep the guard only for the duration of a transition.
    pub async fn lock(&self) -> MutexGuard<'_, RoomState> {
        self.state.lock().await
    }

    pub async fn phase(&self) -> Phase {
        self.state.lock().await.phase()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn room_with(players: &[(ConnectionId, &str)]) -> RoomState {
        let mut room = RoomState::new("R1");
        for (conn, name) in players {
            room.join(*conn, name);
        }
        room
    }

    /// Room in `RoundActive` with reference `word` and every member enrolled
    fn active_room(word: &str, players: &[(ConnectionId, &str)]) -> RoomState {
        let mut room = room_with(players);
        for (conn, _) in players {
            room.request_start(*conn).unwrap();
        }
        room.begin_round(1, word);
        assert_eq!(room.phase(), Phase::RoundActive);
        room
    }

    #[test]
    fn test_new_room_is_idle() {
        let room = RoomState::new("lobby");
        assert_eq!(room.phase(), Phase::Idle);
        assert_eq!(room.reference_word(), "");
        assert!(room.members().is_empty());
        assert!(room.is_consistent());
    }

    #[test]
    fn test_join_notifies_all_members() {
        let mut room = RoomState::new("R1");
        room.join(1, "alice");
        let delivery = room.join(2, "bob").unwrap();

        assert_eq!(delivery.targets, vec![1, 2]);
        assert_eq!(delivery.message, ServerMessage::info("bob joined R1"));
        assert!(room.join(2, "bob").is_none());
        assert_eq!(room.members().len(), 2);
    }

    #[test]
    fn test_leave_notifies_remaining_members() {
        let mut room = room_with(&[(1, "alice"), (2, "bob")]);

        let delivery = room.leave(1).unwrap();
        assert_eq!(delivery.targets, vec![2]);
        assert_eq!(delivery.message, ServerMessage::info("alice left R1"));
        assert!(room.leave(1).is_none());
    }

    #[test]
    fn test_first_start_opens_countdown() {
        let mut room = room_with(&[(1, "alice"), (2, "bob")]);

        let effects = room.request_start(1).unwrap();

        assert_eq!(room.phase(), Phase::Countdown);
        assert_eq!(effects.timer, Some(Timer::BeginRound { epoch: 1 }));
        assert_eq!(effects.deliveries.len(), 1);
        assert_eq!(effects.deliveries[0].targets, vec![1, 2]);
        assert_eq!(effects.deliveries[0].message, ServerMessage::info(START_PROMPT));
        assert_eq!(room.active_players().len(), 1);
        assert!(room.is_consistent());
    }

    #[test]
    fn test_start_during_countdown_only_enrols() {
        let mut room = room_with(&[(1, "alice"), (2, "bob")]);
        room.request_start(1).unwrap();

        let effects = room.request_start(2).unwrap();
        assert_eq!(effects, Effects::default());
        assert_eq!(room.active_players().len(), 2);

        // Repeated request does not enrol twice
        room.request_start(2).unwrap();
        assert_eq!(room.active_players().len(), 2);
    }

    #[test]
    fn test_start_requires_membership() {
        let mut room = room_with(&[(1, "alice")]);
        let result = room.request_start(9);
        assert!(matches!(result, Err(GameError::NotInRoom(_))));
        assert_eq!(room.phase(), Phase::Idle);
    }

    #[test]
    fn test_two_players_begin_round() {
        let mut room = room_with(&[(1, "alice"), (2, "bob")]);
        room.request_start(1).unwrap();
        room.request_start(2).unwrap();

        let effects = room.begin_round(1, "server");

        assert_eq!(room.phase(), Phase::RoundActive);
        assert_eq!(room.reference_word(), "server");
        assert_eq!(effects.timer, Some(Timer::EndRound { epoch: 1 }));
        assert_eq!(effects.deliveries[0].targets, vec![1, 2]);
        assert_eq!(
            effects.deliveries[0].message,
            ServerMessage::Start {
                word: "server".to_string()
            }
        );
        assert!(room.is_consistent());
    }

    #[test]
    fn test_lonely_player_returns_to_idle() {
        let mut room = room_with(&[(1, "alice"), (2, "bob")]);
        room.request_start(1).unwrap();

        let effects = room.begin_round(1, "server");

        assert_eq!(room.phase(), Phase::Idle);
        assert_eq!(room.reference_word(), "");
        assert!(room.active_players().is_empty());
        assert_eq!(effects.timer, None);
        assert_eq!(effects.deliveries[0].targets, vec![1]);
        assert_eq!(effects.deliveries[0].message, ServerMessage::info(ALONE_NOTICE));
        assert!(room.is_consistent());
    }

    #[test]
    fn test_countdown_counts_players_present_at_fire_time() {
        let mut room = room_with(&[(1, "alice"), (2, "bob")]);
        room.request_start(1).unwrap();
        room.request_start(2).unwrap();
        room.leave(2);

        room.begin_round(1, "server");
        assert_eq!(room.phase(), Phase::Idle);
    }

    #[test]
    fn test_stale_timers_are_ignored() {
        let mut room = room_with(&[(1, "alice"), (2, "bob")]);
        room.request_start(1).unwrap();
        room.begin_round(1, "server");
        assert_eq!(room.phase(), Phase::Idle);

        // New countdown is epoch 2; the epoch 1 timer must not start it
        room.request_start(1).unwrap();
        room.request_start(2).unwrap();
        assert_eq!(room.begin_round(1, "server"), Effects::default());
        assert_eq!(room.phase(), Phase::Countdown);

        room.begin_round(2, "server");
        assert!(room.finish_round(1).is_none());
        assert_eq!(room.phase(), Phase::RoundActive);
    }

    #[test]
    fn test_valid_word_updates_tally() {
        let mut room = active_room("server", &[(1, "alice"), (2, "bob")]);

        let delivery = room.submit_word(1, "rev").unwrap();

        assert_eq!(delivery.targets, vec![1, 2]);
        assert_eq!(
            delivery.message,
            ServerMessage::Score {
                scores: vec![("alice".to_string(), 1)]
            }
        );
        assert_eq!(room.history(), &["rev".to_string()]);
    }

    #[test]
    fn test_duplicate_word_is_rejected() {
        let mut room = active_room("server", &[(1, "alice"), (2, "bob")]);

        room.submit_word(1, "rev").unwrap();
        assert!(matches!(room.submit_word(1, "rev"), Err(GameError::WordRejected)));
        assert!(matches!(room.submit_word(2, "rev"), Err(GameError::WordRejected)));
        assert_eq!(room.scores(), vec![("alice".to_string(), 1)]);
    }

    #[test]
    fn test_underivable_and_empty_words_are_rejected() {
        let mut room = active_room("server", &[(1, "alice"), (2, "bob")]);

        assert!(room.submit_word(1, "rez").is_err());
        assert!(room.submit_word(1, "sss").is_err());
        assert!(room.submit_word(1, "").is_err());
        assert!(room.history().is_empty());
        assert!(room.scores().is_empty());
    }

    #[test]
    fn test_submissions_need_active_round_and_enrolment() {
        let mut room = room_with(&[(1, "alice"), (2, "bob"), (3, "carol")]);
        assert!(room.submit_word(1, "rev").is_err());

        room.request_start(1).unwrap();
        room.request_start(2).unwrap();
        assert!(room.submit_word(1, "rev").is_err());

        room.begin_round(1, "server");
        // carol never opted in
        assert!(room.submit_word(3, "rev").is_err());
        assert!(room.submit_word(2, "rev").is_ok());
    }

    #[test]
    fn test_start_refused_while_round_runs() {
        let mut room = active_room("server", &[(1, "alice"), (2, "bob")]);
        assert!(matches!(room.request_start(1), Err(GameError::RoundInProgress)));

        room.finish_round(1).unwrap();
        assert!(matches!(room.request_start(1), Err(GameError::RoundInProgress)));

        room.reset();
        assert!(room.request_start(1).is_ok());
    }

    #[test]
    fn test_finish_round_picks_top_scorer() {
        let mut room = active_room("server", &[(1, "alice"), (2, "bob")]);
        room.submit_word(1, "rev").unwrap();
        room.submit_word(2, "serve").unwrap();
        room.submit_word(2, "ever").unwrap();

        let outcome = room.finish_round(1).unwrap();

        assert_eq!(outcome.winner, Some(("bob".to_string(), 2)));
        assert_eq!(outcome.notice.targets, vec![1, 2]);
        assert_eq!(
            outcome.notice.message,
            ServerMessage::End {
                message: "round over, winner: bob (2 words)".to_string()
            }
        );
        assert_eq!(room.phase(), Phase::Ended);
        assert_eq!(room.reference_word(), "");
        assert!(room.is_consistent());
    }

    #[test]
    fn test_tie_goes_to_first_to_reach_maximum() {
        let mut room = active_room("server", &[(1, "alice"), (2, "bob")]);
        room.submit_word(1, "rev").unwrap();
        room.submit_word(2, "serve").unwrap();
        room.submit_word(2, "ever").unwrap();
        room.submit_word(1, "err").unwrap();

        // Both have 2; bob got there first
        let outcome = room.finish_round(1).unwrap();
        assert_eq!(outcome.winner, Some(("bob".to_string(), 2)));
    }

    #[test]
    fn test_departed_player_cannot_win() {
        let mut room = active_room("server", &[(1, "alice"), (2, "bob")]);
        room.submit_word(1, "rev").unwrap();
        room.submit_word(1, "err").unwrap();
        room.submit_word(2, "serve").unwrap();
        room.leave(1);

        let outcome = room.finish_round(1).unwrap();
        assert_eq!(outcome.winner, Some(("bob".to_string(), 1)));
        assert_eq!(outcome.notice.targets, vec![2]);
    }

    #[test]
    fn test_departed_scorers_leave_no_winner() {
        let mut room = active_room("server", &[(1, "alice"), (2, "bob")]);
        room.submit_word(2, "rev").unwrap();
        room.leave(2);

        let outcome = room.finish_round(1).unwrap();
        assert_eq!(outcome.winner, None);
        assert_eq!(outcome.notice.targets, vec![1]);
        assert_eq!(
            outcome.notice.message,
            ServerMessage::End {
                message: "round over, no winner".to_string()
            }
        );
    }

    #[test]
    fn test_joining_mid_round_only_watches() {
        let mut room = active_room("server", &[(1, "alice"), (2, "bob")]);

        let notice = room.join(3, "carol").unwrap();
        assert_eq!(notice.targets, vec![1, 2, 3]);
        assert_eq!(notice.message, ServerMessage::info("carol joined R1"));
        assert!(room.is_member(3));
        assert!(!room.is_active(3));

        assert!(matches!(room.submit_word(3, "rev"), Err(GameError::WordRejected)));
        assert!(matches!(room.request_start(3), Err(GameError::RoundInProgress)));

        // Score updates go to the round's players only
        let delivery = room.submit_word(1, "rev").unwrap();
        assert_eq!(delivery.targets, vec![1, 2]);
        assert_eq!(room.scores(), vec![("alice".to_string(), 1)]);

        let outcome = room.finish_round(1).unwrap();
        assert_eq!(outcome.notice.targets, vec![1, 2]);
        assert!(room.is_consistent());
    }

    #[test]
    fn test_round_without_words_has_no_winner() {
        let mut room = active_room("server", &[(1, "alice"), (2, "bob")]);

        let outcome = room.finish_round(1).unwrap();
        assert_eq!(outcome.winner, None);
        assert_eq!(
            outcome.notice.message,
            ServerMessage::End {
                message: "round over, no words were found".to_string()
            }
        );
    }

    #[test]
    fn test_reset_clears_round_state() {
        let mut room = active_room("server", &[(1, "alice"), (2, "bob")]);
        room.submit_word(1, "rev").unwrap();
        room.finish_round(1).unwrap();

        room.reset();

        assert_eq!(room.phase(), Phase::Idle);
        assert!(room.active_players().is_empty());
        assert!(room.history().is_empty());
        assert!(room.scores().is_empty());
        assert_eq!(room.members().len(), 2);
        assert!(room.is_consistent());
    }

    #[test]
    fn test_word_history_is_per_round() {
        let mut room = active_room("server", &[(1, "alice"), (2, "bob")]);
        room.submit_word(1, "rev").unwrap();
        room.finish_round(1).unwrap();
        room.reset();

        room.request_start(1).unwrap();
        room.request_start(2).unwrap();
        room.begin_round(2, "server");
        assert!(room.submit_word(2, "rev").is_ok());
    }

    #[test]
    fn test_tally_leader_filter() {
        let mut tally = RoundTally::default();
        tally.credit("alice", 1);
        tally.credit("bob", 2);
        tally.credit("bob", 3);

        assert_eq!(tally.leader(|_| true), Some(("bob", 2)));
        assert_eq!(tally.leader(|name| name != "bob"), Some(("alice", 1)));
        assert_eq!(tally.leader(|_| false), None);
        assert_eq!(
            tally.scores(),
            vec![("alice".to_string(), 1), ("bob".to_string(), 2)]
        );
    }

    #[tokio::test]
    async fn test_room_lock_serializes_transitions() {
        let room = std::sync::Arc::new(Room::new("R1"));
        {
            let mut state = room.lock().await;
            state.join(1, "alice");
            state.join(2, "bob");
        }

        let mut handles = Vec::new();
        for conn in [1, 2] {
            let room = std::sync::Arc::clone(&room);
            handles.push(tokio::spawn(async move {
                room.lock().await.request_start(conn).unwrap()
            }));
        }

        let mut timers = 0;
        for handle in handles {
            if handle.await.unwrap().timer.is_some() {
                timers += 1;
            }
        }

        // Exactly one request opened the countdown
        assert_eq!(timers, 1);
        assert_eq!(room.phase().await, Phase::Countdown);
        assert_eq!(room.lock().await.active_players().len(), 2);
    }
}
