use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use mcp_types::McpRequest;
use serde_json::Value;

use crate::error::ProtocolError;

type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A single method's erased handler: decode params, run the user closure,
/// encode the result. Erasure happens once, at registration time, so the
/// registry itself never needs to be generic over `M`.
type ErasedHandler =
    Arc<dyn Fn(Value) -> BoxFuture<'static, Result<Value, ProtocolError>> + Send + Sync>;

/// Maps method names to a single erased handler each. Registering a method
/// that is already present replaces the existing entry, matching §4.B's
/// "re-registering replaces" rule.
#[derive(Default, Clone)]
pub struct MethodRegistry {
    handlers: HashMap<&'static str, ErasedHandler>,
}

impl MethodRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler` for the wire method named by `M::METHOD`. The
    /// handler receives the already-decoded `M::Params` and returns
    /// `M::Result` or a [`ProtocolError`]; decoding and encoding at the
    /// edges are handled by [`MethodRegistry::dispatch`].
    pub fn register<M, H, Fut>(&mut self, handler: H)
    where
        M: McpRequest,
        H: Fn(M::Params) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<M::Result, ProtocolError>> + Send + 'static,
    {
        let handler = Arc::new(handler);
        let erased: ErasedHandler = Arc::new(move |raw_params: Value| {
            let handler = Arc::clone(&handler);
            Box::pin(async move {
                let params: M::Params = serde_json::from_value(raw_params)
                    .map_err(|e| ProtocolError::invalid_params(M::METHOD, e))?;
                let result = handler(params).await?;
                serde_json::to_value(result).map_err(|e| ProtocolError::Internal(e.to_string()))
            })
        });
        self.handlers.insert(M::METHOD, erased);
    }

    pub fn contains(&self, method: &str) -> bool {
        self.handlers.contains_key(method)
    }

    /// Looks up `method`, decodes `params` into its parameter type, invokes
    /// the handler, and encodes the result back to a `Value`. Matches the
    /// dispatch steps in §4.B: missing method, bad params, and handler
    /// failure each surface as a distinct [`ProtocolError`].
    pub async fn dispatch(&self, method: &str, params: Value) -> Result<Value, ProtocolError> {
        let handler = self
            .handlers
            .get(method)
            .ok_or_else(|| ProtocolError::MethodNotFound(format!("Unknown method: {method}")))?
            .clone();
        handler(params).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mcp_types::PingRequest;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn registered_handler_is_invoked_with_decoded_params() {
        let mut registry = MethodRegistry::new();
        registry.register::<PingRequest, _, _>(|_params| async { Ok(serde_json::json!({})) });
        let result = registry
            .dispatch(PingRequest::METHOD, Value::Null)
            .await
            .unwrap();
        assert_eq!(result, serde_json::json!({}));
    }

    #[tokio::test]
    async fn unregistered_method_is_method_not_found() {
        let registry = MethodRegistry::new();
        let err = registry.dispatch("nonexistent", Value::Null).await.unwrap_err();
        assert!(matches!(err, ProtocolError::MethodNotFound(_)));
    }

    #[tokio::test]
    async fn re_registering_a_method_replaces_the_handler() {
        let mut registry = MethodRegistry::new();
        registry.register::<PingRequest, _, _>(|_| async { Ok(serde_json::json!("first")) });
        registry.register::<PingRequest, _, _>(|_| async { Ok(serde_json::json!("second")) });
        let result = registry
            .dispatch(PingRequest::METHOD, Value::Null)
            .await
            .unwrap();
        assert_eq!(result, serde_json::json!("second"));
    }
}
