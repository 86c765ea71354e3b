use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use log::{info, warn};
use tokio::net::TcpListener;

use crate::common::ConnectionId;
use crate::config::ServerConfig;
use crate::dispatcher::serve_connection;
use crate::registry::Registry;

/// TCP front end: accepts clients and hands each one to its own task.
pub struct Server {
    listener: TcpListener,
    registry: Arc<Registry>,
    max_line_len: usize,
    next_connection: AtomicU64,
}

impl Server {
    /// Validate `config` and start listening.
    pub async fn bind(config: ServerConfig) -> anyhow::Result<Self> {
        config.validate()?;
        let listener = TcpListener::bind(config.address())
            .await
            .map_err(|e| anyhow::anyhow!("Failed to bind {}: {}", config.address(), e))?;
        info!(
            "Battleship server listening on {} (max {} matches)",
            listener.local_addr()?,
            config.max_matches
        );
        Ok(Self {
            listener,
            registry: Arc::new(Registry::new(config.max_matches)),
            max_line_len: config.max_line_len,
            next_connection: AtomicU64::new(1),
        })
    }

    pub fn local_addr(&self) -> anyhow::Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    pub fn registry(&self) -> Arc<Registry> {
        Arc::clone(&self.registry)
    }

    /// Accept clients forever. A failed accept is logged and skipped.
    pub async fn run(&self) -> anyhow::Result<()> {
        loop {
            let (stream, addr) = match self.listener.accept().await {
                Ok(accepted) => accepted,
                Err(e) => {
                    warn!("Accept failed: {}", e);
                    continue;
                }
            };
            if let Err(e) = stream.set_nodelay(true) {
                warn!("Could not set TCP_NODELAY for {}: {}", addr, e);
            }
            let connection =
                ConnectionId(self.next_connection.fetch_add(1, Ordering::Relaxed));
            info!("Client {} connected from {}", connection, addr);

            let registry = Arc::clone(&self.registry);
            let max_line_len = self.max_line_len;
            tokio::spawn(async move {
                if let Err(e) = serve_connection(stream, connection, registry, max_line_len).await
                {
                    warn!("Connection {} from {} ended with an error: {}", connection, addr, e);
                }
            });
        }
    }
}
