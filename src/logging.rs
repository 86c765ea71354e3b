#![cfg(feature = "std")]

use std::env;
use std::io::Write;

use log::{self, Level, LevelFilter, Metadata, Record};

/// Environment variable holding the log level (`error` .. `trace`).
pub const LOG_ENV: &str = "BATTLESHIP_LOG";

/// Prints `LEVEL target - message`; warnings and errors go to stderr.
struct ServerLogger;

impl log::Log for ServerLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let line = format!("{:<5} {} - {}", record.level(), record.target(), record.args());
        // a closed stdout must not take the server down
        let _ = match record.level() {
            Level::Error | Level::Warn => writeln!(std::io::stderr(), "{}", line),
            _ => writeln!(std::io::stdout(), "{}", line),
        };
    }

    fn flush(&self) {
        let _ = std::io::stdout().flush();
    }
}

static LOGGER: ServerLogger = ServerLogger;

/// Parse a level name, falling back to `info`.
pub fn parse_level(value: Option<&str>) -> LevelFilter {
    value
        .and_then(|lvl| lvl.trim().parse().ok())
        .unwrap_or(LevelFilter::Info)
}

/// Install the logger with the level from `BATTLESHIP_LOG` (default `info`).
///
/// Calling it again is harmless; only the first call installs the logger.
pub fn init_logging() {
    let level = parse_level(env::var(LOG_ENV).ok().as_deref());
    let _ = log::set_logger(&LOGGER).map(|()| log::set_max_level(level));
}
