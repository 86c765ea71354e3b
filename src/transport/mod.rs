use crate::protocol::Message;

/// Receiving side of a connection.
#[async_trait::async_trait]
pub trait Inbound: Send {
    /// Next message, or `None` once the peer closed the stream.
    async fn recv(&mut self) -> anyhow::Result<Option<Message>>;
}

/// Sending side of a connection.
#[async_trait::async_trait]
pub trait Outbound: Send {
    async fn send(&mut self, msg: &Message) -> anyhow::Result<()>;
    /// Flush and close the stream.
    async fn close(&mut self) -> anyhow::Result<()>;
}

pub mod line;
pub mod outbox;
pub mod tcp;

pub use line::{LineReader, LineWriter};
pub use outbox::{pump, Mailbox, Outbox};
