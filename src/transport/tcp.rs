use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpStream, ToSocketAddrs};

use crate::config::MAX_LINE_LEN;
use crate::protocol::Message;
use crate::transport::{Inbound, LineReader, LineWriter, Outbound};

/// Line protocol over a TCP stream, for clients and tooling talking to the server.
pub struct TcpTransport {
    reader: LineReader<OwnedReadHalf>,
    writer: LineWriter<OwnedWriteHalf>,
}

impl TcpTransport {
    pub fn new(stream: TcpStream) -> Self {
        let (read, write) = stream.into_split();
        Self {
            reader: LineReader::with_limit(read, MAX_LINE_LEN),
            writer: LineWriter::new(write),
        }
    }

    pub async fn connect<A: ToSocketAddrs>(addr: A) -> anyhow::Result<Self> {
        let stream = TcpStream::connect(addr).await?;
        stream.set_nodelay(true)?;
        Ok(Self::new(stream))
    }
}

#[async_trait::async_trait]
impl Inbound for TcpTransport {
    async fn recv(&mut self) -> anyhow::Result<Option<Message>> {
        self.reader.recv().await
    }
}

#[async_trait::async_trait]
impl Outbound for TcpTransport {
    async fn send(&mut self, msg: &Message) -> anyhow::Result<()> {
        self.writer.send(msg).await
    }

    async fn close(&mut self) -> anyhow::Result<()> {
        self.writer.close().await
    }
}
