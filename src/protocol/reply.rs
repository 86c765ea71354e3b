//! Server-to-client notifications.

use alloc::string::{String, ToString};

use super::*;
use crate::common::{Coordinate, MatchId, ShotOutcome};
use crate::ship::ShipKind;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Welcome(String),
    MatchCreated(MatchId),
    WaitingForOpponent,
    OpponentJoined(String),
    PlaceShips,
    ShipPlaced(ShipKind),
    YourTurn,
    WaitTurn,
    /// Result of the recipient's own shot.
    ShotResult {
        outcome: ShotOutcome,
        target: Coordinate,
    },
    /// The opponent fired at the recipient's board.
    OpponentShot {
        target: Coordinate,
        outcome: ShotOutcome,
    },
    ShipSunk(ShipKind),
    Victory,
    Defeat { winner: String },
    Error(String),
}

impl Reply {
    /// An `ERROR` reply carrying the `Display` text of `err`.
    pub fn error(err: impl ToString) -> Self {
        Reply::Error(err.to_string())
    }
}

impl From<Reply> for Message {
    fn from(reply: Reply) -> Self {
        match reply {
            Reply::Welcome(text) => Message::new(BIENVENIDA).param(text),
            Reply::MatchCreated(id) => Message::new(PARTIDA_CREADA).param(id),
            Reply::WaitingForOpponent => Message::new(ESPERANDO_RIVAL),
            Reply::OpponentJoined(name) => Message::new(RIVAL_CONECTADO).param(name),
            Reply::PlaceShips => Message::new(COLOCAR_BARCOS),
            Reply::ShipPlaced(kind) => Message::new(BARCO_COLOCADO).param(kind.token()),
            Reply::YourTurn => Message::new(TU_TURNO),
            Reply::WaitTurn => Message::new(ESPERA_TURNO),
            Reply::ShotResult { outcome, target } => Message::new(RESULTADO_DISPARO)
                .param(outcome.token())
                .param(target.row)
                .param(target.col),
            Reply::OpponentShot { target, outcome } => Message::new(DISPARO_RIVAL)
                .param(target.row)
                .param(target.col)
                .param(outcome.token()),
            Reply::ShipSunk(kind) => Message::new(BARCO_HUNDIDO).param(kind.token()),
            Reply::Victory => Message::new(VICTORIA),
            Reply::Defeat { winner } => Message::new(DERROTA).param(winner),
            Reply::Error(text) => Message::new(ERROR).param(text),
        }
    }
}

impl TryFrom<&Message> for Reply {
    type Error = ProtocolError;

    /// Parse a server line, as a client would.
    fn try_from(msg: &Message) -> Result<Self, ProtocolError> {
        let text = |i: usize| msg.get(i).unwrap_or_default().to_string();
        let num = |i: usize, field: &'static str| -> Result<i32, ProtocolError> {
            let raw = msg.get(i).unwrap_or_default();
            raw.parse().map_err(|_| ProtocolError::InvalidNumber {
                field,
                value: raw.to_string(),
            })
        };
        let outcome = |i: usize| -> Result<ShotOutcome, ProtocolError> {
            let raw = msg.get(i).unwrap_or_default();
            raw.parse().map_err(|_| ProtocolError::UnknownOutcome(raw.to_string()))
        };
        let kind = |i: usize| -> Result<ShipKind, ProtocolError> {
            let raw = msg.get(i).unwrap_or_default();
            raw.parse().map_err(|_| ProtocolError::UnknownShipKind(raw.to_string()))
        };
        Ok(match msg.command() {
            BIENVENIDA => Reply::Welcome(text(0)),
            PARTIDA_CREADA => {
                let raw = msg.get(0).unwrap_or_default();
                Reply::MatchCreated(raw.parse().map_err(|_| ProtocolError::InvalidNumber {
                    field: "match id",
                    value: raw.to_string(),
                })?)
            }
            ESPERANDO_RIVAL => Reply::WaitingForOpponent,
            RIVAL_CONECTADO => Reply::OpponentJoined(text(0)),
            COLOCAR_BARCOS => Reply::PlaceShips,
            BARCO_COLOCADO => Reply::ShipPlaced(kind(0)?),
            TU_TURNO => Reply::YourTurn,
            ESPERA_TURNO => Reply::WaitTurn,
            RESULTADO_DISPARO => Reply::ShotResult {
                outcome: outcome(0)?,
                target: Coordinate::new(num(1, "row")?, num(2, "column")?),
            },
            DISPARO_RIVAL => Reply::OpponentShot {
                target: Coordinate::new(num(0, "row")?, num(1, "column")?),
                outcome: outcome(2)?,
            },
            BARCO_HUNDIDO => Reply::ShipSunk(kind(0)?),
            VICTORIA => Reply::Victory,
            DERROTA => Reply::Defeat { winner: text(0) },
            ERROR => Reply::Error(text(0)),
            other => return Err(ProtocolError::UnknownCommand(other.to_string())),
        })
    }
}
