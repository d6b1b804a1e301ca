use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::RwLock;

use mcp_types::McpNotification;
use serde_json::Value;
use tracing::debug;
use tracing::warn;

type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

type ErasedHandler = Arc<dyn Fn(Value) -> BoxFuture<'static, Result<(), String>> + Send + Sync>;

/// Maps notification names to zero or more handlers, invoked in
/// registration order. A notification handler's failure is logged and
/// swallowed: notifications are fire-and-forget, and one handler's error
/// must never prevent the rest from running, nor produce a wire response.
#[derive(Default, Clone)]
pub struct NotificationRegistry {
    handlers: std::collections::HashMap<&'static str, Arc<RwLock<Vec<ErasedHandler>>>>,
}

impl NotificationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `handler` to the list for `N::METHOD`. Unlike
    /// [`crate::registry::MethodRegistry::register`], this never replaces
    /// an existing entry.
    pub fn on<N, H, Fut>(&mut self, handler: H)
    where
        N: McpNotification,
        H: Fn(N::Params) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), String>> + Send + 'static,
    {
        let handler = Arc::new(handler);
        let erased: ErasedHandler = Arc::new(move |raw_params: Value| {
            let handler = Arc::clone(&handler);
            Box::pin(async move {
                let params: N::Params = serde_json::from_value(raw_params)
                    .map_err(|e| format!("invalid params for {}: {e}", N::METHOD))?;
                handler(params).await
            })
        });
        self.handlers
            .entry(N::METHOD)
            .or_default()
            .write()
            .expect("notification handler list lock poisoned")
            .push(erased);
    }

    /// Invokes every handler registered for `method`, in registration
    /// order, sequentially (per §5, these are "not parallelized").
    /// Iteration works from a snapshot taken at the start of the call, so a
    /// handler registering a new handler for the same method mid-dispatch
    /// does not extend the current pass.
    pub async fn dispatch(&self, method: &str, params: Value) {
        let Some(handlers) = self.handlers.get(method) else {
            debug!(method, "dropping unknown notification");
            return;
        };
        let snapshot: Vec<ErasedHandler> = handlers
            .read()
            .expect("notification handler list lock poisoned")
            .clone();
        for handler in snapshot {
            if let Err(message) = handler(params.clone()).await {
                warn!(method, error = %message, "notification handler failed");
            }
        }
    }
}
