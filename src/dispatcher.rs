//! Per-connection command loop.
//!
//! A [`Dispatcher`] reads requests from one client, applies them to the
//! registry or the client's match, and queues replies for this client and
//! its opponent. Every rejected request is answered with `ERROR` and leaves
//! the connection open.

use core::fmt;
use std::sync::Arc;

use log::{debug, info, warn};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::oneshot;

use crate::common::{ConnectionId, Coordinate, MatchId, ShotOutcome};
use crate::game::{JoinOutcome, Match, MatchError, Peer, Phase, ReadyOutcome, ShotReport};
use crate::protocol::{Message, ProtocolError, Reply, Request};
use crate::registry::{Registry, RegistryError};
use crate::ship::{Orientation, ShipKind};
use crate::transport::{line, pump, Inbound, Outbox};

/// Greeting sent as soon as a client connects.
pub const WELCOME: &str = "Connected to the Battleship server";

/// Reason given to a player whose opponent went away.
pub const OPPONENT_LEFT: &str = "Opponent disconnected";

/// Why a request was refused. The `Display` text is sent back in `ERROR`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    Protocol(ProtocolError),
    Registry(RegistryError),
    Match(MatchError),
    /// `CONECTAR` must come before creating or joining a match.
    NameRequired,
    EmptyName,
    /// Names are fixed while the player is in a match.
    NameLocked,
    NotInMatch,
    OutOfRange(Coordinate),
}

impl From<ProtocolError> for DispatchError {
    fn from(e: ProtocolError) -> Self {
        DispatchError::Protocol(e)
    }
}

impl From<RegistryError> for DispatchError {
    fn from(e: RegistryError) -> Self {
        DispatchError::Registry(e)
    }
}

impl From<MatchError> for DispatchError {
    fn from(e: MatchError) -> Self {
        DispatchError::Match(e)
    }
}

impl fmt::Display for DispatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DispatchError::Protocol(e) => write!(f, "{}", e),
            DispatchError::Registry(e) => write!(f, "{}", e),
            DispatchError::Match(e) => write!(f, "{}", e),
            DispatchError::NameRequired => write!(f, "Send CONECTAR with your name first"),
            DispatchError::EmptyName => write!(f, "Name must not be empty"),
            DispatchError::NameLocked => write!(f, "Cannot change name during a match"),
            DispatchError::NotInMatch => write!(f, "You are not in a match"),
            DispatchError::OutOfRange(c) => write!(f, "Coordinate {} is off the board", c),
        }
    }
}

impl std::error::Error for DispatchError {}

/// Whether the read loop should keep going after a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Stop,
}

pub struct Dispatcher {
    connection: ConnectionId,
    name: Option<String>,
    registry: Arc<Registry>,
    outbox: Outbox,
    departed: bool,
}

impl Dispatcher {
    pub fn new(connection: ConnectionId, registry: Arc<Registry>, outbox: Outbox) -> Self {
        Self {
            connection,
            name: None,
            registry,
            outbox,
            departed: false,
        }
    }

    pub fn connection(&self) -> ConnectionId {
        self.connection
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    fn reply(&self, reply: Reply) {
        self.outbox.send(reply);
    }

    fn peer(&self) -> Result<Peer, DispatchError> {
        let name = self.name.clone().ok_or(DispatchError::NameRequired)?;
        Ok(Peer::new(name, self.connection, self.outbox.clone()))
    }

    fn current_match(&self) -> Result<Arc<Match>, DispatchError> {
        self.registry
            .match_for(self.connection)
            .ok_or(DispatchError::NotInMatch)
    }

    /// Greet the client, serve requests until it leaves, then clean up.
    ///
    /// Cleanup runs however the loop ends, including on read errors.
    pub async fn run<R: Inbound + ?Sized>(&mut self, inbound: &mut R) -> anyhow::Result<()> {
        self.reply(Reply::Welcome(WELCOME.to_string()));
        let result = loop {
            match inbound.recv().await {
                Ok(Some(msg)) => {
                    if self.handle_message(&msg) == Flow::Stop {
                        break Ok(());
                    }
                }
                Ok(None) => break Ok(()),
                Err(e) => break Err(e),
            }
        };
        self.disconnect();
        result
    }

    /// Decode and apply one message. Malformed messages get an `ERROR` reply.
    pub fn handle_message(&mut self, msg: &Message) -> Flow {
        debug!("{} <- {}", self.connection, msg);
        match Request::try_from(msg) {
            Ok(request) => self.handle(request),
            Err(e) => {
                self.reject(e.into());
                Flow::Continue
            }
        }
    }

    pub fn handle(&mut self, request: Request) -> Flow {
        let result = match request {
            Request::Connect { name } => self.connect(name),
            Request::CreateMatch => self.create_match(),
            Request::JoinMatch { id } => self.join_match(id),
            Request::PlaceShip {
                kind,
                origin,
                orientation,
            } => self.place_ship(kind, origin, orientation),
            Request::Ready => self.ready(),
            Request::Fire { target } => self.fire(target),
            Request::Disconnect => return Flow::Stop,
        };
        if let Err(e) = result {
            self.reject(e);
        }
        Flow::Continue
    }

    fn reject(&self, err: DispatchError) {
        debug!("{} rejected: {}", self.connection, err);
        self.reply(Reply::error(err));
    }

    fn connect(&mut self, name: String) -> Result<(), DispatchError> {
        if name.is_empty() {
            return Err(DispatchError::EmptyName);
        }
        if self.registry.match_for(self.connection).is_some() {
            return Err(DispatchError::NameLocked);
        }
        info!("Player {} connected as {}", self.connection, name);
        self.name = Some(name);
        Ok(())
    }

    fn create_match(&mut self) -> Result<(), DispatchError> {
        let game = self.registry.create(self.peer()?)?;
        self.reply(Reply::MatchCreated(game.id()));
        self.reply(Reply::WaitingForOpponent);
        Ok(())
    }

    fn join_match(&mut self, id: MatchId) -> Result<(), DispatchError> {
        let me = self.peer()?;
        let (_, outcome) = self.registry.join(id, me.clone())?;
        match outcome {
            JoinOutcome::Paired { opponent } => {
                self.reply(Reply::OpponentJoined(opponent.name.clone()));
                opponent.send(Reply::OpponentJoined(me.name));
                self.reply(Reply::PlaceShips);
                opponent.send(Reply::PlaceShips);
            }
            JoinOutcome::Waiting => self.reply(Reply::WaitingForOpponent),
        }
        Ok(())
    }

    fn place_ship(
        &mut self,
        kind: ShipKind,
        origin: Coordinate,
        orientation: Orientation,
    ) -> Result<(), DispatchError> {
        let game = self.current_match()?;
        match game.phase() {
            Phase::PlacingShips => {}
            Phase::Finished => return Err(MatchError::Finished.into()),
            other => return Err(MatchError::WrongPhase(other).into()),
        }
        game.place_ship(self.connection, kind, origin, orientation)?;
        self.reply(Reply::ShipPlaced(kind));
        Ok(())
    }

    fn ready(&mut self) -> Result<(), DispatchError> {
        let game = self.current_match()?;
        game.mark_ready_with(self.connection, |outcome| {
            if let ReadyOutcome::Started { first, second } = outcome {
                first.send(Reply::YourTurn);
                second.send(Reply::WaitTurn);
            }
        })?;
        Ok(())
    }

    fn fire(&mut self, target: Coordinate) -> Result<(), DispatchError> {
        if !target.is_valid() {
            return Err(DispatchError::OutOfRange(target));
        }
        let game = self.current_match()?;
        let report = game.fire_with(self.connection, target, announce)?;
        if report.finished {
            self.registry.retire(game.id());
        }
        Ok(())
    }

    /// Leave the current match, if any: tell the opponent and retire it.
    ///
    /// Runs once; later calls, including the one from `Drop`, do nothing.
    pub fn disconnect(&mut self) {
        if self.departed {
            return;
        }
        self.departed = true;
        let who = self.name.as_deref().unwrap_or("<unnamed>");
        if let Some(game) = self.registry.match_for(self.connection) {
            if let Some(opponent) = game.abandon(self.connection) {
                opponent.send(Reply::error(OPPONENT_LEFT));
            }
            if self.registry.retire(game.id()) {
                info!("Match {} abandoned by {}", game.id(), who);
            }
        }
        info!("Player {} ({}) disconnected", self.connection, who);
    }
}

impl Drop for Dispatcher {
    // also covers a task that unwinds out of `run`
    fn drop(&mut self) {
        self.disconnect();
    }
}

/// Queue the replies for one shot. Runs under the match lock.
fn announce(report: &ShotReport) {
    let ShotReport {
        target,
        outcome,
        sunk,
        finished,
        shooter,
        opponent,
    } = report;
    let (target, outcome) = (*target, *outcome);

    shooter.send(Reply::ShotResult { outcome, target });
    if outcome == ShotOutcome::AlreadyShot {
        shooter.send(Reply::YourTurn);
        return;
    }
    opponent.send(Reply::OpponentShot { target, outcome });
    if let Some(kind) = *sunk {
        shooter.send(Reply::ShipSunk(kind));
        opponent.send(Reply::ShipSunk(kind));
    }
    if *finished {
        shooter.send(Reply::Victory);
        opponent.send(Reply::Defeat {
            winner: shooter.name.clone(),
        });
    } else {
        shooter.send(Reply::WaitTurn);
        opponent.send(Reply::YourTurn);
    }
}

/// Serve one client over any byte stream until it disconnects.
///
/// Replies are written by a separate task so that the opponent's dispatcher
/// can route messages here without waiting on this socket.
pub async fn serve_connection<S>(
    stream: S,
    connection: ConnectionId,
    registry: Arc<Registry>,
    max_line_len: usize,
) -> anyhow::Result<()>
where
    S: AsyncRead + AsyncWrite + Send + 'static,
{
    let (mut reader, writer) = line::split(stream, max_line_len);
    let (outbox, mailbox) = Outbox::channel();
    let (stop, stopped) = oneshot::channel();
    let writer = tokio::spawn(pump(mailbox, writer, stopped));

    let mut dispatcher = Dispatcher::new(connection, registry, outbox);
    let result = dispatcher.run(&mut reader).await;
    drop(dispatcher);

    let _ = stop.send(());
    match writer.await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => debug!("{} writer stopped: {}", connection, e),
        Err(e) => warn!("{} writer task failed: {}", connection, e),
    }
    result
}
