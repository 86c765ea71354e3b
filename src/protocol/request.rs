//! Client-to-server commands.

use alloc::string::{String, ToString};
use core::fmt;

use super::*;
use crate::common::{Coordinate, MatchId};
use crate::ship::{Orientation, ShipKind};

/// Everything a client may ask of the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    /// Announce the player's name.
    Connect { name: String },
    CreateMatch,
    JoinMatch { id: MatchId },
    PlaceShip {
        kind: ShipKind,
        origin: Coordinate,
        orientation: Orientation,
    },
    /// All five ships placed.
    Ready,
    Fire { target: Coordinate },
    Disconnect,
}

/// Reasons a message cannot be turned into a [`Request`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    UnknownCommand(String),
    MissingParameters {
        command: &'static str,
        expected: usize,
        got: usize,
    },
    InvalidNumber { field: &'static str, value: String },
    UnknownShipKind(String),
    InvalidOrientation(String),
    UnknownOutcome(String),
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProtocolError::UnknownCommand(c) => write!(f, "Unknown command: {}", c),
            ProtocolError::MissingParameters {
                command,
                expected,
                got,
            } => write!(
                f,
                "{} expects {} parameter(s), got {}",
                command, expected, got
            ),
            ProtocolError::InvalidNumber { field, value } => {
                write!(f, "Invalid {}: '{}' is not a number", field, value)
            }
            ProtocolError::UnknownShipKind(k) => write!(f, "Unknown ship kind: {}", k),
            ProtocolError::InvalidOrientation(o) => {
                write!(f, "Invalid orientation '{}' (use H or V)", o)
            }
            ProtocolError::UnknownOutcome(o) => write!(f, "Unknown shot outcome: {}", o),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ProtocolError {}

fn require(msg: &Message, command: &'static str, expected: usize) -> Result<(), ProtocolError> {
    if msg.params().len() < expected {
        return Err(ProtocolError::MissingParameters {
            command,
            expected,
            got: msg.params().len(),
        });
    }
    Ok(())
}

fn number(msg: &Message, index: usize, field: &'static str) -> Result<i32, ProtocolError> {
    let raw = msg.get(index).unwrap_or_default();
    raw.trim().parse().map_err(|_| ProtocolError::InvalidNumber {
        field,
        value: raw.to_string(),
    })
}

impl TryFrom<&Message> for Request {
    type Error = ProtocolError;

    fn try_from(msg: &Message) -> Result<Self, Self::Error> {
        match msg.command() {
            CONECTAR => {
                require(msg, CONECTAR, 1)?;
                Ok(Request::Connect {
                    name: msg.get(0).unwrap_or_default().trim().to_string(),
                })
            }
            CREAR_PARTIDA => Ok(Request::CreateMatch),
            UNIR_PARTIDA => {
                require(msg, UNIR_PARTIDA, 1)?;
                let raw = msg.get(0).unwrap_or_default();
                let id = raw.parse().map_err(|_| ProtocolError::InvalidNumber {
                    field: "match id",
                    value: raw.to_string(),
                })?;
                Ok(Request::JoinMatch { id })
            }
            COLOCAR_BARCO => {
                require(msg, COLOCAR_BARCO, 4)?;
                let raw_kind = msg.get(0).unwrap_or_default();
                let kind = raw_kind
                    .parse()
                    .map_err(|_| ProtocolError::UnknownShipKind(raw_kind.to_string()))?;
                let row = number(msg, 1, "row")?;
                let col = number(msg, 2, "column")?;
                let raw_orientation = msg.get(3).unwrap_or_default();
                let orientation = raw_orientation
                    .parse()
                    .map_err(|_| ProtocolError::InvalidOrientation(raw_orientation.to_string()))?;
                Ok(Request::PlaceShip {
                    kind,
                    origin: Coordinate::new(row, col),
                    orientation,
                })
            }
            LISTO => Ok(Request::Ready),
            DISPARAR => {
                require(msg, DISPARAR, 2)?;
                let row = number(msg, 0, "row")?;
                let col = number(msg, 1, "column")?;
                Ok(Request::Fire {
                    target: Coordinate::new(row, col),
                })
            }
            DESCONECTAR => Ok(Request::Disconnect),
            other => Err(ProtocolError::UnknownCommand(other.to_string())),
        }
    }
}

impl From<Request> for Message {
    fn from(req: Request) -> Self {
        match req {
            Request::Connect { name } => Message::new(CONECTAR).param(name),
            Request::CreateMatch => Message::new(CREAR_PARTIDA),
            Request::JoinMatch { id } => Message::new(UNIR_PARTIDA).param(id),
            Request::PlaceShip {
                kind,
                origin,
                orientation,
            } => Message::new(COLOCAR_BARCO)
                .param(kind.token())
                .param(origin.row)
                .param(origin.col)
                .param(orientation.token()),
            Request::Ready => Message::new(LISTO),
            Request::Fire { target } => Message::new(DISPARAR).param(target.row).param(target.col),
            Request::Disconnect => Message::new(DESCONECTAR),
        }
    }
}
