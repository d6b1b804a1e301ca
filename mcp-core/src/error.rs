use mcp_types::ErrorCode;
use mcp_types::JsonRpcErrorObject;

/// Everything that can go wrong while handling one JSON-RPC frame.
///
/// Variants that carry a `code` are representable on the wire as a
/// [`JsonRpcErrorObject`] via [`ProtocolError::into_wire_error`]; the rest
/// (`TransientTransport`, `TypeMismatch`) never cross the wire and are only
/// ever surfaced to the local caller.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("malformed JSON-RPC frame: {0}")]
    ParseError(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("method not found: {0}")]
    MethodNotFound(String),

    #[error("invalid params for {method}: {source}")]
    InvalidParams {
        method: String,
        source: serde_json::Error,
    },

    #[error("internal error: {0}")]
    Internal(String),

    #[error("peer is not in a state that permits this operation: {0}")]
    LifecycleViolation(String),

    #[error("required capability was not negotiated: {0}")]
    CapabilityNotNegotiated(String),

    /// The response to a request didn't decode as the type the caller
    /// asked for. This is a local bug (mismatched `R::Result`), not
    /// something the peer did wrong, so it never becomes a wire error.
    #[error("response did not match the expected result type: {0}")]
    TypeMismatch(serde_json::Error),

    /// The transport hiccuped in a way that might clear up on its own
    /// (a `WouldBlock`-style condition on a pipe, say). Callers may retry
    /// after the configured backoff; see `Config::transient_retry_backoff`.
    #[error("transient transport error: {0}")]
    TransientTransport(String),

    #[error("transport closed")]
    TransportClosed,

    /// The peer answered a request with a JSON-RPC error object. This is
    /// the client-side mirror of [`ProtocolError::into_wire_error`]: it
    /// reconstructs a local error from a wire error rather than the other
    /// way around, so it is never itself re-encoded onto the wire.
    #[error("peer returned error {code}: {message}")]
    RemoteError {
        code: i32,
        message: String,
        data: Option<serde_json::Value>,
    },
}

impl ProtocolError {
    pub fn invalid_params(method: impl Into<String>, source: serde_json::Error) -> Self {
        ProtocolError::InvalidParams {
            method: method.into(),
            source,
        }
    }

    /// The JSON-RPC error code this variant maps to, for variants that are
    /// ever actually sent back to a peer.
    pub fn wire_code(&self) -> ErrorCode {
        match self {
            ProtocolError::ParseError(_) => ErrorCode::PARSE_ERROR,
            ProtocolError::InvalidRequest(_) => ErrorCode::INVALID_REQUEST,
            ProtocolError::MethodNotFound(_) => ErrorCode::METHOD_NOT_FOUND,
            ProtocolError::InvalidParams { .. } => ErrorCode::INVALID_PARAMS,
            ProtocolError::LifecycleViolation(_) | ProtocolError::CapabilityNotNegotiated(_) => {
                ErrorCode::INVALID_REQUEST
            }
            ProtocolError::Internal(_)
            | ProtocolError::TypeMismatch(_)
            | ProtocolError::TransientTransport(_)
            | ProtocolError::TransportClosed
            | ProtocolError::RemoteError { .. } => ErrorCode::INTERNAL_ERROR,
        }
    }

    /// Builds the local error a client sees when a request comes back with
    /// a JSON-RPC error object.
    pub fn from_wire_error(error: JsonRpcErrorObject) -> Self {
        ProtocolError::RemoteError {
            code: error.code,
            message: error.message,
            data: error.data,
        }
    }

    /// The text that goes on the wire in the `message` field. Unlike
    /// `Display` (which prefixes every variant with its taxonomy name for
    /// logs), `InvalidRequest`/`MethodNotFound`/`Internal` already carry a
    /// self-contained user-facing string -- e.g. "Server is not
    /// initialized", "Client disconnected" -- and must reach the peer
    /// unprefixed (§4.D, §8 S2, S3, S5). Every other variant's `Display`
    /// impl doubles as its wire message.
    fn wire_message(&self) -> String {
        match self {
            ProtocolError::InvalidRequest(message)
            | ProtocolError::MethodNotFound(message)
            | ProtocolError::Internal(message) => message.clone(),
            other => other.to_string(),
        }
    }

    pub fn into_wire_error(self) -> JsonRpcErrorObject {
        let code = self.wire_code();
        let message = self.wire_message();
        JsonRpcErrorObject::new(code.as_i32(), message)
    }
}

pub type Result<T> = std::result::Result<T, ProtocolError>;
