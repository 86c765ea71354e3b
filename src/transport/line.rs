use tokio::io::{
    AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader, ReadHalf,
    WriteHalf,
};

use crate::config::MAX_LINE_LEN;
use crate::protocol::Message;
use crate::transport::{Inbound, Outbound};

/// Reads `\n`-terminated lines and decodes them into messages.
///
/// Blank lines are skipped. A line longer than the configured limit is an
/// error; the connection is expected to be dropped afterwards.
pub struct LineReader<R> {
    reader: BufReader<R>,
    max_line_len: usize,
    buf: Vec<u8>,
}

impl<R: AsyncRead + Unpin + Send> LineReader<R> {
    pub fn new(inner: R) -> Self {
        Self::with_limit(inner, MAX_LINE_LEN)
    }

    pub fn with_limit(inner: R, max_line_len: usize) -> Self {
        Self {
            reader: BufReader::new(inner),
            max_line_len,
            buf: Vec::new(),
        }
    }
}

#[async_trait::async_trait]
impl<R: AsyncRead + Unpin + Send> Inbound for LineReader<R> {
    async fn recv(&mut self) -> anyhow::Result<Option<Message>> {
        loop {
            self.buf.clear();
            let limit = self.max_line_len as u64 + 1;
            let n = (&mut self.reader)
                .take(limit)
                .read_until(b'\n', &mut self.buf)
                .await
                .map_err(|e| match e.kind() {
                    std::io::ErrorKind::ConnectionReset => {
                        anyhow::anyhow!("Connection reset by peer")
                    }
                    _ => anyhow::anyhow!("Read error: {}", e),
                })?;
            if n == 0 {
                return Ok(None);
            }
            if self.buf.len() > self.max_line_len && self.buf.last() != Some(&b'\n') {
                return Err(anyhow::anyhow!(
                    "Line too long: more than {} bytes",
                    self.max_line_len
                ));
            }
            let line = String::from_utf8_lossy(&self.buf);
            if let Some(msg) = Message::decode(&line) {
                return Ok(Some(msg));
            }
        }
    }
}

/// Encodes messages as `\r\n`-terminated lines.
pub struct LineWriter<W> {
    writer: W,
}

impl<W: AsyncWrite + Unpin + Send> LineWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }
}

#[async_trait::async_trait]
impl<W: AsyncWrite + Unpin + Send> Outbound for LineWriter<W> {
    async fn send(&mut self, msg: &Message) -> anyhow::Result<()> {
        let line = msg.encode();
        self.writer
            .write_all(line.as_bytes())
            .await
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::BrokenPipe | std::io::ErrorKind::ConnectionReset => {
                    anyhow::anyhow!("Connection closed by peer")
                }
                _ => anyhow::anyhow!("Write error: {}", e),
            })?;
        self.writer.flush().await?;
        Ok(())
    }

    async fn close(&mut self) -> anyhow::Result<()> {
        self.writer.shutdown().await?;
        Ok(())
    }
}

/// Split any bidirectional byte stream into a line reader and writer.
pub fn split<S>(stream: S, max_line_len: usize) -> (LineReader<ReadHalf<S>>, LineWriter<WriteHalf<S>>)
where
    S: AsyncRead + AsyncWrite + Send,
{
    let (read, write) = tokio::io::split(stream);
    (
        LineReader::with_limit(read, max_line_len),
        LineWriter::new(write),
    )
}
