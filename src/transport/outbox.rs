use tokio::sync::{mpsc, oneshot};

use crate::protocol::Message;
use crate::transport::Outbound;

/// Queue of messages waiting to be written to one connection.
pub type Mailbox = mpsc::UnboundedReceiver<Message>;

/// Cloneable route to one connection's writer.
///
/// Sending never blocks, so it is safe to call while holding a match lock.
/// Messages sent after the connection is gone are dropped.
#[derive(Debug, Clone)]
pub struct Outbox {
    tx: mpsc::UnboundedSender<Message>,
}

impl Outbox {
    pub fn channel() -> (Outbox, Mailbox) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Outbox { tx }, rx)
    }

    /// Queue `msg`. Returns `false` if the connection's writer has stopped.
    pub fn send(&self, msg: impl Into<Message>) -> bool {
        self.tx.send(msg.into()).is_ok()
    }

    /// The writer for this outbox has shut down.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Drain `mailbox` into `out` until `shutdown` fires (or its sender is
/// dropped), then flush whatever is still queued and close the stream.
///
/// Stops early if a write fails or every [`Outbox`] handle is gone.
pub async fn pump<O: Outbound>(
    mut mailbox: Mailbox,
    mut out: O,
    mut shutdown: oneshot::Receiver<()>,
) -> anyhow::Result<()> {
    loop {
        tokio::select! {
            msg = mailbox.recv() => match msg {
                Some(msg) => out.send(&msg).await?,
                None => break,
            },
            _ = &mut shutdown => {
                mailbox.close();
                while let Ok(msg) = mailbox.try_recv() {
                    out.send(&msg).await?;
                }
                break;
            }
        }
    }
    out.close().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncReadExt;

    use crate::protocol::Reply;
    use crate::transport::LineWriter;

    #[tokio::test]
    async fn flushes_queued_replies_on_shutdown() {
        let (outbox, mailbox) = Outbox::channel();
        let (mut client, server) = tokio::io::duplex(1024);
        let (stop, stopped) = oneshot::channel();

        assert!(outbox.send(Reply::WaitingForOpponent));
        assert!(outbox.send(Reply::YourTurn));
        // a clone kept elsewhere must not keep the writer alive
        let _held = outbox.clone();
        stop.send(()).unwrap();
        pump(mailbox, LineWriter::new(server), stopped).await.unwrap();

        let mut received = String::new();
        client.read_to_string(&mut received).await.unwrap();
        assert_eq!(received, "ESPERANDO_RIVAL\r\nTU_TURNO\r\n");
        assert!(outbox.is_closed());
    }
}
