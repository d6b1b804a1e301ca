//! A transport that speaks newline-delimited JSON over the server process's
//! own stdin/stdout. Grounded in the teacher's `start_stdio_connection`
//! (`app-server/src/transport.rs`): a `BufReader`-wrapped `tokio::io::stdin`
//! read line by line, a `tokio::io::stdout` written with a trailing `\n` per
//! frame. Unlike the app-server's version, this one drives a single
//! `Transport` rather than fanning out to a connection-table, matching
//! `mcp-client`'s `ChildProcessTransport` shape on the other end of the wire.

use async_trait::async_trait;
use mcp_core::transport::Transport;
use mcp_core::transport::TransportError;
use tokio::io::AsyncBufReadExt;
use tokio::io::AsyncWriteExt;
use tokio::io::BufReader;
use tokio::io::Lines;
use tokio::io::Stdin;
use tokio::io::Stdout;

pub struct StdioTransport {
    stdout: Stdout,
    lines: Lines<BufReader<Stdin>>,
}

impl StdioTransport {
    pub fn new() -> Self {
        Self {
            stdout: tokio::io::stdout(),
            lines: BufReader::new(tokio::io::stdin()).lines(),
        }
    }
}

impl Default for StdioTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for StdioTransport {
    async fn send(&mut self, frame: Vec<u8>) -> Result<(), TransportError> {
        self.stdout.write_all(&frame).await?;
        self.stdout.write_all(b"\n").await?;
        self.stdout.flush().await?;
        Ok(())
    }

    async fn recv(&mut self) -> Option<Result<Vec<u8>, TransportError>> {
        match self.lines.next_line().await {
            Ok(Some(line)) => Some(Ok(line.into_bytes())),
            Ok(None) => None,
            Err(err) => Some(Err(TransportError::Io(err))),
        }
    }
}
