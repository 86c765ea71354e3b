//! Match state machine shared by both players' connection handlers.
//!
//! Every operation takes the match lock for its whole duration, so the two
//! handlers never observe each other's half-applied updates. [`Match::fire`]
//! performs the turn check, the shot and the turn switch in one critical
//! section; handlers must use it rather than composing [`Match::is_turn_of`],
//! [`Match::resolve_shot`] and [`Match::advance_turn`] themselves.
//!
//! Once a match is [`Phase::Finished`], mutating calls return
//! [`MatchError::Finished`] and change nothing; `advance_turn` is a no-op.

use core::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

use log::{debug, info};

use crate::board::Board;
use crate::common::{ConnectionId, Coordinate, MatchId, PlacementError, ShotOutcome};
use crate::config::FLEET_SIZE;
use crate::protocol::Reply;
use crate::ship::{Orientation, ShipKind};
use crate::transport::Outbox;

/// Lifecycle of a match. Only ever moves forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Phase {
    WaitingForOpponent,
    PlacingShips,
    InProgress,
    Finished,
}

/// One of the two participant positions. `First` is the creator and fires first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    First,
    Second,
}

impl Slot {
    pub fn other(self) -> Slot {
        match self {
            Slot::First => Slot::Second,
            Slot::Second => Slot::First,
        }
    }

    fn index(self) -> usize {
        match self {
            Slot::First => 0,
            Slot::Second => 1,
        }
    }
}

/// Routing information for one participant: who they are and where replies go.
#[derive(Debug, Clone)]
pub struct Peer {
    pub name: String,
    pub connection: ConnectionId,
    pub outbox: Outbox,
}

impl Peer {
    pub fn new(name: impl Into<String>, connection: ConnectionId, outbox: Outbox) -> Self {
        Self {
            name: name.into(),
            connection,
            outbox,
        }
    }

    /// Queue a reply for this participant.
    pub fn send(&self, reply: Reply) -> bool {
        self.outbox.send(reply)
    }
}

/// Outcome of a successful [`Match::join`].
#[derive(Debug, Clone)]
pub enum JoinOutcome {
    /// Took the first slot; nobody to play against yet.
    Waiting,
    /// Took the second slot; ship placement begins.
    Paired { opponent: Peer },
}

/// Outcome of a successful [`Match::mark_ready`].
#[derive(Debug, Clone)]
pub enum ReadyOutcome {
    /// Ready, but the opponent is not (or has not joined yet).
    Waiting,
    /// The caller had already declared ready; nothing changed.
    AlreadyReady,
    /// This call made both players ready; play starts with `first` to move.
    Started { first: Peer, second: Peer },
}

impl ReadyOutcome {
    /// The call flipped the caller's ready flag.
    pub fn becomes_ready(&self) -> bool {
        !matches!(self, ReadyOutcome::AlreadyReady)
    }

    /// The call triggered the placement → play transition.
    pub fn both_ready(&self) -> bool {
        matches!(self, ReadyOutcome::Started { .. })
    }
}

/// Everything a handler needs to announce one resolved shot.
#[derive(Debug, Clone)]
pub struct ShotReport {
    pub target: Coordinate,
    pub outcome: ShotOutcome,
    /// Kind of the ship this shot sank, if any.
    pub sunk: Option<ShipKind>,
    /// The shot defeated the opponent and ended the match.
    pub finished: bool,
    pub shooter: Peer,
    pub opponent: Peer,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchError {
    /// Both slots are taken.
    Full,
    /// The connection does not play in this match.
    NotParticipant,
    /// The match is over.
    Finished,
    /// The operation is not allowed in the current phase.
    WrongPhase(Phase),
    NotYourTurn,
    /// The player already declared ready; the fleet is locked.
    AlreadyReady,
    DuplicateShip(ShipKind),
    FleetIncomplete { placed: usize },
    Placement(PlacementError),
}

impl From<PlacementError> for MatchError {
    fn from(err: PlacementError) -> Self {
        MatchError::Placement(err)
    }
}

impl fmt::Display for MatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchError::Full => write!(f, "Match is already full"),
            MatchError::NotParticipant => write!(f, "You are not playing in this match"),
            MatchError::Finished => write!(f, "Match has already finished"),
            MatchError::WrongPhase(phase) => match phase {
                Phase::WaitingForOpponent => write!(f, "Waiting for an opponent to join"),
                Phase::PlacingShips => write!(f, "Ships are still being placed"),
                Phase::InProgress => write!(f, "Match is already in progress"),
                Phase::Finished => write!(f, "Match has already finished"),
            },
            MatchError::NotYourTurn => write!(f, "It is not your turn"),
            MatchError::AlreadyReady => write!(f, "You are already ready; the fleet is locked"),
            MatchError::DuplicateShip(kind) => write!(f, "{} is already placed", kind),
            MatchError::FleetIncomplete { placed } => write!(
                f,
                "Place all ships first ({} of {} placed)",
                placed, FLEET_SIZE
            ),
            MatchError::Placement(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for MatchError {}

struct Participant {
    peer: Peer,
    board: Board,
    ready: bool,
}

struct MatchState {
    phase: Phase,
    players: [Option<Participant>; 2],
    turn: Slot,
    winner: Option<Slot>,
}

impl MatchState {
    fn slot_of(&self, connection: ConnectionId) -> Option<Slot> {
        [Slot::First, Slot::Second].into_iter().find(|slot| {
            self.players[slot.index()]
                .as_ref()
                .is_some_and(|p| p.peer.connection == connection)
        })
    }

    fn player(&self, slot: Slot) -> Option<&Participant> {
        self.players[slot.index()].as_ref()
    }

    fn player_mut(&mut self, slot: Slot) -> Option<&mut Participant> {
        self.players[slot.index()].as_mut()
    }

    fn require_slot(&self, connection: ConnectionId) -> Result<Slot, MatchError> {
        self.slot_of(connection).ok_or(MatchError::NotParticipant)
    }

    fn require_in_progress(&self) -> Result<(), MatchError> {
        match self.phase {
            Phase::InProgress => Ok(()),
            Phase::Finished => Err(MatchError::Finished),
            other => Err(MatchError::WrongPhase(other)),
        }
    }

    /// Shoot the board opposite `shooter`, finishing the match on defeat.
    fn resolve(&mut self, shooter: Slot, target: Coordinate) -> Result<ShotReport, MatchError> {
        self.require_in_progress()?;
        let shooter_peer = self
            .player(shooter)
            .map(|p| p.peer.clone())
            .ok_or(MatchError::NotParticipant)?;
        let defender = self
            .player_mut(shooter.other())
            .ok_or(MatchError::WrongPhase(Phase::WaitingForOpponent))?;
        let outcome = defender.board.shoot(target);
        let sunk = match outcome {
            ShotOutcome::Sunk => defender.board.ship_sunk_at(target).map(|s| s.kind()),
            _ => None,
        };
        let finished = outcome.is_fresh() && defender.board.is_defeated();
        let opponent = defender.peer.clone();
        if finished {
            self.phase = Phase::Finished;
            self.winner = Some(shooter);
        }
        Ok(ShotReport {
            target,
            outcome,
            sunk,
            finished,
            shooter: shooter_peer,
            opponent,
        })
    }

    fn ready(&mut self, connection: ConnectionId) -> Result<ReadyOutcome, MatchError> {
        if self.phase == Phase::Finished {
            return Err(MatchError::Finished);
        }
        let slot = self.require_slot(connection)?;
        let player = self.player_mut(slot).ok_or(MatchError::NotParticipant)?;
        if player.ready {
            return Ok(ReadyOutcome::AlreadyReady);
        }
        let placed = player.board.ship_count();
        if placed != FLEET_SIZE {
            return Err(MatchError::FleetIncomplete { placed });
        }
        player.ready = true;

        let both_ready = self.players.iter().all(|p| p.as_ref().is_some_and(|p| p.ready));
        if self.phase != Phase::PlacingShips || !both_ready {
            return Ok(ReadyOutcome::Waiting);
        }
        let (Some(first), Some(second)) = (self.player(Slot::First), self.player(Slot::Second))
        else {
            return Ok(ReadyOutcome::Waiting);
        };
        let outcome = ReadyOutcome::Started {
            first: first.peer.clone(),
            second: second.peer.clone(),
        };
        self.phase = Phase::InProgress;
        self.turn = Slot::First;
        Ok(outcome)
    }

    fn take_turn(
        &mut self,
        connection: ConnectionId,
        target: Coordinate,
    ) -> Result<ShotReport, MatchError> {
        let slot = self.require_slot(connection)?;
        self.require_in_progress()?;
        if self.turn != slot {
            return Err(MatchError::NotYourTurn);
        }
        let report = self.resolve(slot, target)?;
        if report.outcome.is_fresh() && !report.finished {
            self.advance();
        }
        Ok(report)
    }

    fn advance(&mut self) {
        if self.phase == Phase::InProgress {
            self.turn = self.turn.other();
        }
    }
}

/// A game between two participants.
pub struct Match {
    id: MatchId,
    state: Mutex<MatchState>,
}

impl Match {
    pub fn new(id: MatchId) -> Self {
        Self {
            id,
            state: Mutex::new(MatchState {
                phase: Phase::WaitingForOpponent,
                players: [None, None],
                turn: Slot::First,
                winner: None,
            }),
        }
    }

    pub fn id(&self) -> MatchId {
        self.id
    }

    fn lock(&self) -> MutexGuard<'_, MatchState> {
        // a panicking holder leaves no partial update behind: every
        // operation validates before it mutates
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn phase(&self) -> Phase {
        self.lock().phase
    }

    /// Take the first free slot. Filling the second one starts ship placement.
    pub fn join(&self, peer: Peer) -> Result<JoinOutcome, MatchError> {
        let mut state = self.lock();
        if state.phase == Phase::Finished {
            return Err(MatchError::Finished);
        }
        if state.player(Slot::First).is_none() {
            state.players[Slot::First.index()] = Some(Participant {
                peer,
                board: Board::new(),
                ready: false,
            });
            return Ok(JoinOutcome::Waiting);
        }
        if state.player(Slot::Second).is_some() {
            return Err(MatchError::Full);
        }
        let opponent = state
            .player(Slot::First)
            .map(|p| p.peer.clone())
            .ok_or(MatchError::Full)?;
        info!(
            "Match {}: {} joined {}, placing ships",
            self.id, peer.name, opponent.name
        );
        state.players[Slot::Second.index()] = Some(Participant {
            peer,
            board: Board::new(),
            ready: false,
        });
        state.phase = Phase::PlacingShips;
        Ok(JoinOutcome::Paired { opponent })
    }

    /// Place a ship on the caller's own board.
    ///
    /// Only one ship of each kind is accepted, and none after the caller
    /// declared ready. Phase gating beyond "not finished" is up to the caller.
    pub fn place_ship(
        &self,
        connection: ConnectionId,
        kind: ShipKind,
        origin: Coordinate,
        orientation: Orientation,
    ) -> Result<(), MatchError> {
        let mut state = self.lock();
        if state.phase == Phase::Finished {
            return Err(MatchError::Finished);
        }
        let slot = state.require_slot(connection)?;
        let player = state.player_mut(slot).ok_or(MatchError::NotParticipant)?;
        if player.ready {
            return Err(MatchError::AlreadyReady);
        }
        if player.board.has_ship(kind) {
            return Err(MatchError::DuplicateShip(kind));
        }
        player.board.place(kind, origin, orientation)?;
        Ok(())
    }

    /// Declare the caller's fleet complete.
    ///
    /// When this makes both players ready the match moves to
    /// [`Phase::InProgress`] with [`Slot::First`] to move; only that call
    /// returns [`ReadyOutcome::Started`].
    pub fn mark_ready(&self, connection: ConnectionId) -> Result<ReadyOutcome, MatchError> {
        self.mark_ready_with(connection, |_| {})
    }

    /// [`Match::mark_ready`], running `announce` on success before the lock
    /// is released. `announce` must not call back into this match.
    pub fn mark_ready_with<F>(
        &self,
        connection: ConnectionId,
        announce: F,
    ) -> Result<ReadyOutcome, MatchError>
    where
        F: FnOnce(&ReadyOutcome),
    {
        let mut state = self.lock();
        let outcome = state.ready(connection)?;
        if let ReadyOutcome::Started { first, second } = &outcome {
            info!("Match {} started: {} vs {}", self.id, first.name, second.name);
        }
        announce(&outcome);
        Ok(outcome)
    }

    /// The match is in play and `connection` holds the turn.
    pub fn is_turn_of(&self, connection: ConnectionId) -> bool {
        let state = self.lock();
        state.phase == Phase::InProgress && state.slot_of(connection) == Some(state.turn)
    }

    /// Fire at the opponent's board without touching the turn marker.
    pub fn resolve_shot(
        &self,
        connection: ConnectionId,
        target: Coordinate,
    ) -> Result<ShotReport, MatchError> {
        let mut state = self.lock();
        let slot = state.require_slot(connection)?;
        state.resolve(slot, target)
    }

    /// Hand the turn to the other participant. No-op unless in play.
    pub fn advance_turn(&self) {
        self.lock().advance();
    }

    /// Take a turn: check it is the caller's, resolve the shot, then either
    /// finish the match or pass the turn. A repeat shot keeps the turn with
    /// the shooter.
    pub fn fire(
        &self,
        connection: ConnectionId,
        target: Coordinate,
    ) -> Result<ShotReport, MatchError> {
        self.fire_with(connection, target, |_| {})
    }

    /// [`Match::fire`], running `announce` on the report before the lock is
    /// released, so replies are queued before the opponent can act on the
    /// new turn. `announce` must not call back into this match.
    pub fn fire_with<F>(
        &self,
        connection: ConnectionId,
        target: Coordinate,
        announce: F,
    ) -> Result<ShotReport, MatchError>
    where
        F: FnOnce(&ShotReport),
    {
        let mut state = self.lock();
        let report = state.take_turn(connection, target)?;
        if report.finished {
            info!("Match {} finished, winner: {}", self.id, report.shooter.name);
            for peer in [&report.shooter, &report.opponent] {
                if let Some(player) = state.slot_of(peer.connection).and_then(|s| state.player(s)) {
                    debug!("Final board of {}:\n{}", peer.name, player.board.render(true));
                }
            }
        }
        announce(&report);
        Ok(report)
    }

    /// End the match early because `connection` left.
    ///
    /// Returns the opponent to notify, or `None` if the match had already
    /// finished (normally or by an earlier call).
    pub fn abandon(&self, connection: ConnectionId) -> Option<Peer> {
        let mut state = self.lock();
        if state.phase == Phase::Finished {
            return None;
        }
        state.phase = Phase::Finished;
        let slot = state.slot_of(connection)?;
        state.player(slot.other()).map(|p| p.peer.clone())
    }

    pub fn participant_of(&self, connection: ConnectionId) -> Option<Peer> {
        let state = self.lock();
        let slot = state.slot_of(connection)?;
        state.player(slot).map(|p| p.peer.clone())
    }

    pub fn opponent_of(&self, connection: ConnectionId) -> Option<Peer> {
        let state = self.lock();
        let slot = state.slot_of(connection)?;
        state.player(slot.other()).map(|p| p.peer.clone())
    }

    pub fn winner(&self) -> Option<Peer> {
        let state = self.lock();
        state
            .winner
            .and_then(|slot| state.player(slot))
            .map(|p| p.peer.clone())
    }

    /// Rendered board of `connection`, ships revealed or not.
    pub fn render_board(&self, connection: ConnectionId, reveal_ships: bool) -> Option<String> {
        let state = self.lock();
        let slot = state.slot_of(connection)?;
        state.player(slot).map(|p| p.board.render(reveal_ships))
    }
}

impl fmt::Debug for Match {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.lock();
        f.debug_struct("Match")
            .field("id", &self.id)
            .field("phase", &state.phase)
            .field("turn", &state.turn)
            .field("players", &state.players.iter().flatten().map(|p| &p.peer.name).collect::<Vec<_>>())
            .finish()
    }
}
