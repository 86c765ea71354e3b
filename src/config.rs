use crate::ship::ShipKind;

pub const BOARD_SIZE: u8 = 10;
pub const FLEET_SIZE: usize = 5;
pub const FLEET: [ShipKind; FLEET_SIZE] = [
    ShipKind::Carrier,
    ShipKind::Battleship,
    ShipKind::Cruiser,
    ShipKind::Submarine,
    ShipKind::Destroyer,
];

/// Total number of ship segments in a complete fleet.
pub const TOTAL_SHIP_CELLS: usize = 5 + 4 + 3 + 3 + 2;

pub const DEFAULT_PORT: u16 = 5001;
pub const DEFAULT_MAX_MATCHES: usize = 16;

/// Longest line accepted from a client, terminator included.
pub const MAX_LINE_LEN: usize = 1024;

/// Smallest line cap a server may be configured with. Every request of the
/// protocol apart from long player names fits.
pub const MIN_LINE_LEN: usize = 64;

/// Runtime settings of the match server.
#[cfg(feature = "std")]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub bind: std::string::String,
    pub port: u16,
    pub max_matches: usize,
    pub max_line_len: usize,
}

#[cfg(feature = "std")]
impl ServerConfig {
    /// `host:port` string suitable for binding a listener.
    pub fn address(&self) -> std::string::String {
        std::format!("{}:{}", self.bind, self.port)
    }

    /// Reject settings the server cannot run with.
    pub fn validate(&self) -> anyhow::Result<()> {
        let most = tokio::sync::Semaphore::MAX_PERMITS;
        if self.max_matches == 0 || self.max_matches > most {
            return Err(anyhow::anyhow!(
                "--max-matches must be between 1 and {}, got {}",
                most,
                self.max_matches
            ));
        }
        if self.max_line_len < MIN_LINE_LEN {
            return Err(anyhow::anyhow!(
                "--max-line-len must be at least {}, got {}",
                MIN_LINE_LEN,
                self.max_line_len
            ));
        }
        Ok(())
    }
}

#[cfg(feature = "std")]
impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0".into(),
            port: DEFAULT_PORT,
            max_matches: DEFAULT_MAX_MATCHES,
            max_line_len: MAX_LINE_LEN,
        }
    }
}
