//! The dispatch loop shared by both peer facades (component E). A single
//! task owns the transport for the lifetime of the session -- per §5,
//! "the transport is exclusively owned by one peer for its entire
//! lifetime" -- and multiplexes three things onto it: outbound frames
//! queued by the facade, inbound frames read off the wire, and response
//! frames produced by concurrently-running inbound-request handlers.

use std::sync::Arc;

use mcp_types::JsonRpcError;
use mcp_types::JsonRpcMessage;
use mcp_types::JsonRpcNotification;
use mcp_types::JsonRpcResponse;
use tokio::sync::RwLock;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;
use tracing::error;
use tracing::info;
use tracing::warn;

use crate::codec;
use crate::codec::Classified;
use crate::config::Config;
use crate::error::ProtocolError;
use crate::notifications::NotificationRegistry;
use crate::pending::PendingTable;
use crate::registry::MethodRegistry;
use crate::transport::Transport;
use crate::transport::TransportError;

/// Per-role hook invoked before an inbound request or notification is
/// dispatched. The server's implementation enforces the strict
/// initialize-before-use gate (§4.F); the client's is a no-op, since the
/// spec places no such requirement on inbound traffic reaching a client.
pub type RequestGate = Arc<dyn Fn(&str) -> Result<(), ProtocolError> + Send + Sync>;
pub type NotificationGate = Arc<dyn Fn(&str) -> bool + Send + Sync>;

/// Whether malformed frames get a diagnostic `ParseError` reply. Only the
/// server side does this (§4.A: "attempt a best-effort extraction of any
/// present id... server side only").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Client,
    Server,
}

pub struct EngineHandles {
    pub outgoing_tx: mpsc::Sender<JsonRpcMessage>,
    pub pending: PendingTable,
    pub join_handle: JoinHandle<()>,
}

/// Spawns the dispatch loop and returns the handles a facade needs to
/// drive it: the channel for outbound traffic, the pending-request table,
/// and the loop's own task handle (for `stop`).
///
/// `methods` and `notifications` are supplied by the caller rather than
/// created here, so a facade can register handlers both before and after
/// `start`/`connect`: registration only ever touches the registry, which
/// exists independently of whether a dispatch loop is currently running
/// against it.
#[allow(clippy::too_many_arguments)]
pub fn spawn(
    mut transport: Box<dyn Transport>,
    role: Role,
    config: Config,
    methods: Arc<RwLock<MethodRegistry>>,
    notifications: Arc<RwLock<NotificationRegistry>>,
    request_gate: RequestGate,
    notification_gate: NotificationGate,
) -> EngineHandles {
    let (outgoing_tx, mut outgoing_rx) = mpsc::channel::<JsonRpcMessage>(config.channel_capacity);
    let pending = PendingTable::new();

    let loop_methods = Arc::clone(&methods);
    let loop_notifications = Arc::clone(&notifications);
    let loop_pending = pending.clone();
    let loop_outgoing_tx = outgoing_tx.clone();
    let backoff = config.transient_retry_backoff;

    let join_handle = tokio::spawn(async move {
        loop {
            tokio::select! {
                outbound = outgoing_rx.recv() => {
                    match outbound {
                        Some(message) => {
                            if let Err(err) = send_frame(&mut transport, &message).await {
                                error!(error = %err, "fatal transport send error; terminating dispatch loop");
                                break;
                            }
                        }
                        None => break,
                    }
                }
                inbound = transport.recv() => {
                    match inbound {
                        Some(Ok(bytes)) => {
                            handle_inbound(
                                &bytes,
                                role,
                                &loop_methods,
                                &loop_notifications,
                                &loop_pending,
                                &loop_outgoing_tx,
                                &request_gate,
                                &notification_gate,
                            );
                        }
                        Some(Err(TransportError::Transient(message))) => {
                            debug!(message, "transient transport error; backing off");
                            tokio::time::sleep(backoff).await;
                        }
                        Some(Err(err)) => {
                            error!(error = %err, "fatal transport error; terminating dispatch loop");
                            break;
                        }
                        None => break,
                    }
                }
            }
        }
        loop_pending.drain_on_disconnect().await;
    });

    EngineHandles {
        outgoing_tx,
        pending,
        join_handle,
    }
}

async fn send_frame(
    transport: &mut Box<dyn Transport>,
    message: &JsonRpcMessage,
) -> Result<(), TransportError> {
    match codec::encode(message) {
        Ok(bytes) => transport.send(bytes).await,
        Err(err) => {
            error!(error = %err, "failed to encode outbound message; dropping it");
            Ok(())
        }
    }
}

/// Classifies one inbound frame and routes it. Requests and notifications
/// are dispatched on their own spawned tasks so a slow handler never blocks
/// the loop from reading the next frame (§5: "Handlers themselves may
/// execute concurrently with each other and with the dispatch loop").
/// Responses and errors resolve synchronously against the pending table,
/// which is cheap enough not to need a task of its own.
#[allow(clippy::too_many_arguments)]
fn handle_inbound(
    bytes: &[u8],
    role: Role,
    methods: &Arc<RwLock<MethodRegistry>>,
    notifications: &Arc<RwLock<NotificationRegistry>>,
    pending: &PendingTable,
    outgoing_tx: &mpsc::Sender<JsonRpcMessage>,
    request_gate: &RequestGate,
    notification_gate: &NotificationGate,
) {
    match codec::classify_frame(bytes) {
        Classified::Response(JsonRpcResponse { id, result, .. }) => {
            let pending = pending.clone();
            tokio::spawn(async move { pending.resolve(id, result).await });
        }
        Classified::Error(JsonRpcError { id, error, .. }) => {
            let pending = pending.clone();
            tokio::spawn(async move { pending.reject(id, error).await });
        }
        Classified::Request(request) => {
            let methods = Arc::clone(methods);
            let outgoing_tx = outgoing_tx.clone();
            let request_gate = Arc::clone(request_gate);
            tokio::spawn(async move {
                let id = request.id.clone();
                let outcome = match request_gate(&request.method) {
                    Ok(()) => {
                        let params = request.params.unwrap_or(serde_json::Value::Null);
                        methods.read().await.dispatch(&request.method, params).await
                    }
                    Err(err) => Err(err),
                };
                let method = request.method.clone();
                let message = match outcome {
                    Ok(result) => JsonRpcMessage::Response(JsonRpcResponse::new(id, result)),
                    Err(err) => {
                        warn!(method = %method, error = %err, "request failed");
                        JsonRpcMessage::Error(JsonRpcError::new(id, err.into_wire_error()))
                    }
                };
                let _ = outgoing_tx.send(message).await;
            });
        }
        Classified::Notification(JsonRpcNotification { method, params, .. }) => {
            if !notification_gate(&method) {
                info!(method, "dropping notification: peer not yet initialized");
                return;
            }
            let notifications = Arc::clone(notifications);
            tokio::spawn(async move {
                let params = params.unwrap_or(serde_json::Value::Null);
                notifications.read().await.dispatch(&method, params).await;
            });
        }
        Classified::Malformed { recovered_id } => {
            if role == Role::Server {
                let error = codec::parse_error_response(recovered_id);
                let outgoing_tx = outgoing_tx.clone();
                tokio::spawn(async move {
                    let _ = outgoing_tx.send(JsonRpcMessage::Error(error)).await;
                });
            } else {
                warn!("received malformed frame; ignoring");
            }
        }
    }
}
