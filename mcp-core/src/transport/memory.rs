use tokio::sync::mpsc;

use super::Transport;
use super::TransportError;

/// Capacity of the bounded channel backing each direction of an
/// [`InMemoryTransport`] pair. Mirrors the bounded-channel sizing used
/// elsewhere in this workspace's transport layer; a peer that falls this far
/// behind is a bug, not a load condition worth tuning for.
const CHANNEL_CAPACITY: usize = 128;

/// An in-process transport backed by a pair of bounded `mpsc` channels.
///
/// [`InMemoryTransport::pair`] returns two halves wired to each other, which
/// is how the integration tests run a real `Client`/`Server` pair without a
/// subprocess or socket in between.
pub struct InMemoryTransport {
    tx: mpsc::Sender<Vec<u8>>,
    rx: mpsc::Receiver<Vec<u8>>,
}

impl InMemoryTransport {
    pub fn pair() -> (Self, Self) {
        let (a_tx, b_rx) = mpsc::channel(CHANNEL_CAPACITY);
        let (b_tx, a_rx) = mpsc::channel(CHANNEL_CAPACITY);
        (
            InMemoryTransport { tx: a_tx, rx: a_rx },
            InMemoryTransport { tx: b_tx, rx: b_rx },
        )
    }
}

#[async_trait::async_trait]
impl Transport for InMemoryTransport {
    async fn send(&mut self, frame: Vec<u8>) -> Result<(), TransportError> {
        self.tx
            .send(frame)
            .await
            .map_err(|_| TransportError::Closed)
    }

    async fn recv(&mut self) -> Option<Result<Vec<u8>, TransportError>> {
        self.rx.recv().await.map(Ok)
    }
}
