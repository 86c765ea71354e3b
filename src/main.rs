#[cfg(not(feature = "std"))]
fn main() {}

#[cfg(feature = "std")]
use battleship_server::{
    init_logging, Server, ServerConfig, DEFAULT_MAX_MATCHES, DEFAULT_PORT, MAX_LINE_LEN,
};
#[cfg(feature = "std")]
use clap::Parser;
#[cfg(feature = "std")]
use log::{error, info};

/// Multiplayer Battleship match server.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[cfg(feature = "std")]
struct Cli {
    /// Address to listen on
    #[arg(long, default_value = "0.0.0.0")]
    bind: String,
    /// TCP port to listen on
    #[arg(short, long, default_value_t = DEFAULT_PORT)]
    port: u16,
    /// Maximum number of matches played at the same time
    #[arg(long, default_value_t = DEFAULT_MAX_MATCHES)]
    max_matches: usize,
    /// Longest accepted protocol line, in bytes
    #[arg(long, default_value_t = MAX_LINE_LEN)]
    max_line_len: usize,
}

#[cfg(feature = "std")]
impl From<Cli> for ServerConfig {
    fn from(cli: Cli) -> Self {
        ServerConfig {
            bind: cli.bind,
            port: cli.port,
            max_matches: cli.max_matches,
            max_line_len: cli.max_line_len,
        }
    }
}

#[cfg(feature = "std")]
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();
    let cli = Cli::parse();
    let server = Server::bind(ServerConfig::from(cli)).await?;

    tokio::select! {
        result = server.run() => {
            if let Err(e) = result {
                error!("Server stopped: {}", e);
                return Err(e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
        }
    }
    Ok(())
}
