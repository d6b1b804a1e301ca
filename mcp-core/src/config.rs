use std::time::Duration;

/// Tunables shared by both `Server` and `Client`. All fields have defaults
/// matching the values the protocol spec calls out by name (10 ms backoffs,
/// a 128-message channel capacity); embedders only need to build a
/// `Config` when they want to deviate.
#[derive(Debug, Clone)]
pub struct Config {
    /// Whether the strict lifecycle and capability gates are enforced. See
    /// §4.F: in strict mode, requests before the handshake (server side) or
    /// calls to capability-gated helpers before negotiation (client side)
    /// fail fast rather than reaching the transport.
    pub strict: bool,

    /// How long the dispatch loop waits before retrying after a
    /// [`crate::transport::TransportError::Transient`].
    pub transient_retry_backoff: Duration,

    /// How long the server waits after answering `initialize` before
    /// emitting the `notifications/initialized` notification.
    pub post_initialize_notification_delay: Duration,

    /// Capacity of the bounded channel used internally by reference
    /// transports (`InMemoryTransport`, `ChildProcessTransport`).
    pub channel_capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            strict: true,
            transient_retry_backoff: Duration::from_millis(10),
            post_initialize_notification_delay: Duration::from_millis(10),
            channel_capacity: 128,
        }
    }
}
