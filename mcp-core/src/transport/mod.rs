mod memory;

pub use memory::InMemoryTransport;

use async_trait::async_trait;

/// A transport failure. `message` is included in logs; transports that can
/// distinguish a hiccup from a dead connection should prefer
/// [`TransportError::Transient`] for the former so callers can back off and
/// retry rather than tearing the session down.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("transport io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("transport is closed")]
    Closed,

    #[error("transient transport error: {0}")]
    Transient(String),
}

/// A bidirectional, message-oriented, order-preserving channel carrying
/// length-delimited-in-spirit frames (in practice, one JSON document per
/// frame; how a given implementation delimits frames on the underlying byte
/// stream -- newline, length-prefix, whatever -- is its own business).
///
/// This is a pull-based rendering of the protocol's `send`/`receive` pair:
/// `recv` returns `None` once the peer has cleanly closed the transport and
/// no more frames will ever arrive, and `Some(Err(_))` for a frame-level
/// failure that doesn't necessarily mean the transport is dead.
///
/// Implementations must be safe to use as `Box<dyn Transport>`; `recv` takes
/// `&mut self` rather than returning a `Stream` so the trait stays object
/// safe without boxing an associated stream type per implementation.
#[async_trait]
pub trait Transport: Send {
    async fn send(&mut self, frame: Vec<u8>) -> Result<(), TransportError>;

    async fn recv(&mut self) -> Option<Result<Vec<u8>, TransportError>>;
}
