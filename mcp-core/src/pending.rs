use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::AtomicI64;
use std::sync::atomic::Ordering;

use mcp_types::JsonRpcErrorObject;
use mcp_types::RequestId;
use serde_json::Value;
use tokio::sync::Mutex;
use tokio::sync::oneshot;
use tracing::warn;

use crate::error::ProtocolError;

type Resumer = oneshot::Sender<Result<Value, JsonRpcErrorObject>>;

/// The client's table of in-flight requests, keyed by id.
///
/// Each entry's resumer is untyped (`Result<Value, JsonRpcErrorObject>`);
/// re-decoding to the caller's `R::Result` happens back at the
/// `send_request::<R>()` call site, monomorphized per request type, rather
/// than through a boxed `dyn Fn` stored in the table. This mirrors the
/// teacher client's `pending: Arc<Mutex<HashMap<i64, oneshot::Sender<_>>>>`
/// generalized from integer-only ids to the full `RequestId` space.
#[derive(Clone)]
pub struct PendingTable {
    inner: Arc<Mutex<HashMap<RequestId, Resumer>>>,
    next_id: Arc<AtomicI64>,
}

impl Default for PendingTable {
    fn default() -> Self {
        Self {
            inner: Arc::new(Mutex::new(HashMap::new())),
            next_id: Arc::new(AtomicI64::new(1)),
        }
    }
}

impl PendingTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates a fresh request id, unique within this table's lifetime.
    pub fn allocate_id(&self) -> RequestId {
        RequestId::Integer(self.next_id.fetch_add(1, Ordering::SeqCst))
    }

    /// Registers a waiter for `id`, returning the receiving half. Callers
    /// must register *before* handing the request to the transport, so a
    /// reply that arrives immediately cannot race ahead of the table
    /// insert (see the teacher's `send_request` comment to the same
    /// effect).
    pub async fn register(&self, id: RequestId) -> oneshot::Receiver<Result<Value, JsonRpcErrorObject>> {
        let (tx, rx) = oneshot::channel();
        self.inner.lock().await.insert(id, tx);
        rx
    }

    /// Removes and forgets the waiter for `id` without resolving it. Used
    /// when the caller is giving up (send failed synchronously, or a
    /// timeout elapsed) and the entry would otherwise leak.
    pub async fn remove(&self, id: &RequestId) {
        self.inner.lock().await.remove(id);
    }

    /// Resolves the waiter for `id` with a successful result. Logs and
    /// drops if no matching entry exists (response for an id we never
    /// sent, or already resolved).
    pub async fn resolve(&self, id: RequestId, result: Value) {
        self.complete(id, Ok(result)).await;
    }

    /// Resolves the waiter for `id` with a JSON-RPC error.
    pub async fn reject(&self, id: RequestId, error: JsonRpcErrorObject) {
        self.complete(id, Err(error)).await;
    }

    async fn complete(&self, id: RequestId, outcome: Result<Value, JsonRpcErrorObject>) {
        let resumer = self.inner.lock().await.remove(&id);
        match resumer {
            Some(tx) => {
                let _ = tx.send(outcome);
            }
            None => warn!(%id, "no pending request for this id; dropping"),
        }
    }

    /// Drains every remaining waiter, completing each with
    /// `InternalError("Client disconnected")`. Called once, on disconnect.
    pub async fn drain_on_disconnect(&self) {
        let mut guard = self.inner.lock().await;
        for (_, tx) in guard.drain() {
            let error = ProtocolError::Internal("Client disconnected".to_string()).into_wire_error();
            let _ = tx.send(Err(error));
        }
    }

    #[cfg(test)]
    pub async fn len(&self) -> usize {
        self.inner.lock().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn resolve_completes_the_matching_waiter_and_removes_the_entry() {
        let table = PendingTable::new();
        let id = table.allocate_id();
        let rx = table.register(id.clone()).await;
        assert_eq!(table.len().await, 1);
        table.resolve(id, serde_json::json!({"ok": true})).await;
        assert_eq!(table.len().await, 0);
        let result = rx.await.unwrap().unwrap();
        assert_eq!(result, serde_json::json!({"ok": true}));
    }

    #[tokio::test]
    async fn resolve_for_unknown_id_is_a_no_op() {
        let table = PendingTable::new();
        table.resolve(RequestId::Integer(999), serde_json::json!(null)).await;
        assert_eq!(table.len().await, 0);
    }

    #[tokio::test]
    async fn drain_on_disconnect_completes_every_waiter_with_an_error() {
        let table = PendingTable::new();
        let id_a = table.allocate_id();
        let id_b = table.allocate_id();
        let rx_a = table.register(id_a).await;
        let rx_b = table.register(id_b).await;
        table.drain_on_disconnect().await;
        assert!(rx_a.await.unwrap().is_err());
        assert!(rx_b.await.unwrap().is_err());
        assert_eq!(table.len().await, 0);
    }

    #[tokio::test]
    async fn drain_on_disconnect_uses_the_exact_wire_message() {
        let table = PendingTable::new();
        let id = table.allocate_id();
        let rx = table.register(id).await;
        table.drain_on_disconnect().await;
        let error = rx.await.unwrap().unwrap_err();
        assert_eq!(error.message, "Client disconnected");
    }
}
