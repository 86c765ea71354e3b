//! Line-oriented text protocol: `COMMAND|param|param\r\n`.
//!
//! [`Message`] is the untyped codec layer. [`Request`] and [`Reply`] are the
//! closed command sets for each direction, converted to and from messages.

use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::fmt;

pub mod reply;
pub mod request;

pub use reply::Reply;
pub use request::{ProtocolError, Request};

/// Field separator inside a line. Parameters must not contain it; it is not escaped.
pub const DELIMITER: char = '|';
/// Line terminator appended by [`Message::encode`].
pub const TERMINATOR: &str = "\r\n";

// Client -> server
pub const CONECTAR: &str = "CONECTAR";
pub const CREAR_PARTIDA: &str = "CREAR_PARTIDA";
pub const UNIR_PARTIDA: &str = "UNIR_PARTIDA";
pub const COLOCAR_BARCO: &str = "COLOCAR_BARCO";
pub const LISTO: &str = "LISTO";
pub const DISPARAR: &str = "DISPARAR";
pub const DESCONECTAR: &str = "DESCONECTAR";

// Server -> client
pub const BIENVENIDA: &str = "BIENVENIDA";
pub const PARTIDA_CREADA: &str = "PARTIDA_CREADA";
pub const ESPERANDO_RIVAL: &str = "ESPERANDO_RIVAL";
pub const RIVAL_CONECTADO: &str = "RIVAL_CONECTADO";
pub const COLOCAR_BARCOS: &str = "COLOCAR_BARCOS";
pub const BARCO_COLOCADO: &str = "BARCO_COLOCADO";
pub const TU_TURNO: &str = "TU_TURNO";
pub const ESPERA_TURNO: &str = "ESPERA_TURNO";
pub const RESULTADO_DISPARO: &str = "RESULTADO_DISPARO";
pub const DISPARO_RIVAL: &str = "DISPARO_RIVAL";
pub const BARCO_HUNDIDO: &str = "BARCO_HUNDIDO";
pub const VICTORIA: &str = "VICTORIA";
pub const DERROTA: &str = "DERROTA";
pub const ERROR: &str = "ERROR";

/// A command token plus its positional parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    command: String,
    params: Vec<String>,
}

impl Message {
    /// A message without parameters.
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            params: Vec::new(),
        }
    }

    pub fn with_params<I, S>(command: impl Into<String>, params: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: ToString,
    {
        Self {
            command: command.into(),
            params: params.into_iter().map(|p| p.to_string()).collect(),
        }
    }

    /// Append one parameter.
    pub fn param(mut self, value: impl ToString) -> Self {
        self.params.push(value.to_string());
        self
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    pub fn params(&self) -> &[String] {
        &self.params
    }

    /// Parameter at `index`, if present.
    pub fn get(&self, index: usize) -> Option<&str> {
        self.params.get(index).map(String::as_str)
    }

    /// Serialize to a single terminated line.
    pub fn encode(&self) -> String {
        let mut line = self.command.clone();
        for p in &self.params {
            line.push(DELIMITER);
            line.push_str(p);
        }
        line.push_str(TERMINATOR);
        line
    }

    /// Parse one line. Returns `None` for a blank line; anything else yields
    /// a message, possibly with fewer parameters than its command needs.
    ///
    /// Every field is kept, empty ones included: `CMD|a|` has params `["a", ""]`.
    pub fn decode(line: &str) -> Option<Self> {
        let line = line.trim_end_matches(['\r', '\n']);
        if line.is_empty() {
            return None;
        }
        let mut parts = line.split(DELIMITER);
        let command = parts.next().unwrap_or_default();
        Some(Self::with_params(command, parts))
    }
}

impl fmt::Display for Message {
    /// Log form: `CMD(p1, p2)`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.command)?;
        if !self.params.is_empty() {
            f.write_str("(")?;
            for (i, p) in self.params.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                f.write_str(p)?;
            }
            f.write_str(")")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_without_params() {
        assert_eq!(Message::new(LISTO).encode(), "LISTO\r\n");
    }

    #[test]
    fn decode_strips_terminators() {
        let msg = Message::decode("DISPARAR|3|4\r\n").unwrap();
        assert_eq!(msg.command(), DISPARAR);
        assert_eq!(msg.params(), ["3", "4"]);
        let msg = Message::decode("DISPARAR|3|4\n").unwrap();
        assert_eq!(msg.get(1), Some("4"));
    }

    #[test]
    fn decode_blank_is_none() {
        assert!(Message::decode("").is_none());
        assert!(Message::decode("\r\n").is_none());
    }

    #[test]
    fn decode_keeps_empty_fields() {
        let msg = Message::decode("CONECTAR|ana||").unwrap();
        assert_eq!(msg.params(), ["ana", "", ""]);
        let msg = Message::decode("CONECTAR|").unwrap();
        assert_eq!(msg.params(), [""]);
        let msg = Message::decode("LISTO").unwrap();
        assert!(msg.params().is_empty());
    }

    #[test]
    fn display_is_log_friendly() {
        let msg = Message::new(RESULTADO_DISPARO).param("AGUA").param(1).param(2);
        assert_eq!(msg.to_string(), "RESULTADO_DISPARO(AGUA, 1, 2)");
    }
}
