use std::future::Future;
use std::sync::Arc;
use std::sync::Mutex;

use mcp_core::Config;
use mcp_core::ProtocolError;
use mcp_core::engine;
use mcp_core::engine::EngineHandles;
use mcp_core::engine::Role;
use mcp_core::lifecycle::ClientSessionState;
use mcp_core::notifications::NotificationRegistry;
use mcp_core::registry::MethodRegistry;
use mcp_core::transport::Transport;
use mcp_types::CURRENT_PROTOCOL_VERSION;
use mcp_types::ClientCapabilities;
use mcp_types::Implementation;
use mcp_types::InitializeRequest;
use mcp_types::InitializeRequestParams;
use mcp_types::InitializeResult;
use mcp_types::JsonRpcMessage;
use mcp_types::JsonRpcNotification;
use mcp_types::JsonRpcRequest;
use mcp_types::McpNotification;
use mcp_types::McpRequest;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::RwLock;

use crate::methods::CallToolParams;
use crate::methods::CallToolRequest;
use crate::methods::CallToolResult;
use crate::methods::CursorParams;
use crate::methods::GetPromptParams;
use crate::methods::GetPromptRequest;
use crate::methods::GetPromptResult;
use crate::methods::ListPromptsRequest;
use crate::methods::ListPromptsResult;
use crate::methods::ListResourcesRequest;
use crate::methods::ListResourcesResult;
use crate::methods::ListToolsRequest;
use crate::methods::ListToolsResult;
use crate::methods::ReadResourceParams;
use crate::methods::ReadResourceRequest;
use crate::methods::ReadResourceResult;
use crate::methods::SubscribeParams;
use crate::methods::SubscribeRequest;

/// The client side of an MCP session. Owns nothing about the wire beyond
/// the channel handed to the dispatch loop spawned in [`Client::connect`];
/// everything else -- registries, the pending table, the lifecycle flag --
/// lives behind [`mcp_core::engine`] and [`mcp_core::lifecycle`].
pub struct Client {
    engine: EngineHandles,
    notifications: Arc<RwLock<NotificationRegistry>>,
    state: Arc<Mutex<ClientSessionState>>,
    config: Config,
}

impl Client {
    /// Binds `transport` and spawns the dispatch loop. Does not send
    /// `initialize`; call [`Client::initialize`] once connected.
    pub fn connect(transport: Box<dyn Transport>, config: Config) -> Self {
        let state = Arc::new(Mutex::new(ClientSessionState::new()));
        let methods = Arc::new(RwLock::new(MethodRegistry::new()));
        let notifications = Arc::new(RwLock::new(NotificationRegistry::new()));
        let request_gate: engine::RequestGate = Arc::new(|_method| Ok(()));
        let notification_gate: engine::NotificationGate = Arc::new(|_method| true);
        let engine = engine::spawn(
            transport,
            Role::Client,
            config.clone(),
            Arc::clone(&methods),
            Arc::clone(&notifications),
            request_gate,
            notification_gate,
        );
        Self {
            engine,
            notifications,
            state,
            config,
        }
    }

    /// Registers `handler` for notifications named `N::METHOD`. Multiple
    /// handlers for the same name run in registration order (§5).
    pub async fn on_notification<N, H, Fut>(&self, handler: H)
    where
        N: McpNotification,
        H: Fn(N::Params) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), String>> + Send + 'static,
    {
        self.notifications.write().await.on::<N, H, Fut>(handler);
    }

    /// Sends the typed request `R` and awaits its response. The single
    /// primitive every high-level helper composes atop.
    pub async fn send<R>(&self, params: R::Params) -> Result<R::Result, ProtocolError>
    where
        R: McpRequest,
        R::Params: Serialize,
        R::Result: DeserializeOwned,
    {
        let id = self.engine.pending.allocate_id();
        let params_value = serde_json::to_value(&params)
            .map_err(|e| ProtocolError::Internal(e.to_string()))?;
        let params_field = if params_value.is_null() {
            None
        } else {
            Some(params_value)
        };
        let request = JsonRpcRequest::new(id.clone(), R::METHOD, params_field);

        let rx = self.engine.pending.register(id.clone()).await;

        if self
            .engine
            .outgoing_tx
            .send(JsonRpcMessage::Request(request))
            .await
            .is_err()
        {
            self.engine.pending.remove(&id).await;
            return Err(ProtocolError::TransportClosed);
        }

        let outcome = rx.await.map_err(|_| ProtocolError::TransportClosed)?;
        match outcome {
            Ok(value) => serde_json::from_value(value).map_err(ProtocolError::TypeMismatch),
            Err(error_object) => Err(ProtocolError::from_wire_error(error_object)),
        }
    }

    /// Sends a fire-and-forget notification. Never awaits a reply.
    pub async fn notify<N>(&self, params: N::Params) -> Result<(), ProtocolError>
    where
        N: McpNotification,
        N::Params: Serialize,
    {
        let params_value = serde_json::to_value(&params)
            .map_err(|e| ProtocolError::Internal(e.to_string()))?;
        let params_field = if params_value.is_null() {
            None
        } else {
            Some(params_value)
        };
        let notification = JsonRpcNotification::new(N::METHOD, params_field);
        self.engine
            .outgoing_tx
            .send(JsonRpcMessage::Notification(notification))
            .await
            .map_err(|_| ProtocolError::TransportClosed)
    }

    /// Issues `initialize` and stores the negotiated server info,
    /// capabilities, and instructions. Required before any
    /// capability-gated helper in strict mode.
    pub async fn initialize(
        &self,
        client_info: Implementation,
        client_capabilities: ClientCapabilities,
    ) -> Result<InitializeResult, ProtocolError> {
        {
            let mut state = self.state.lock().expect("client state lock poisoned");
            state.begin_initialize();
        }
        let params = InitializeRequestParams {
            protocol_version: CURRENT_PROTOCOL_VERSION.to_string(),
            capabilities: client_capabilities,
            client_info,
        };
        let result = self.send::<InitializeRequest>(params).await?;
        if result.protocol_version != CURRENT_PROTOCOL_VERSION {
            return Err(ProtocolError::InvalidRequest(format!(
                "server negotiated unsupported protocol version {}",
                result.protocol_version
            )));
        }
        {
            let mut state = self.state.lock().expect("client state lock poisoned");
            state.complete_initialize(
                result.server_info.clone(),
                result.capabilities.clone(),
                result.instructions.clone(),
            );
        }
        Ok(result)
    }

    /// Cancels every pending request with `InternalError`, stops the
    /// dispatch loop, and drops the transport.
    pub async fn disconnect(&self) {
        self.engine.join_handle.abort();
        self.engine.pending.drain_on_disconnect().await;
        self.state.lock().expect("client state lock poisoned").terminate();
    }

    fn require_capability(
        &self,
        method: &'static str,
        predicate: impl FnOnce(&mcp_types::ServerCapabilities) -> bool,
    ) -> Result<(), ProtocolError> {
        let state = self.state.lock().expect("client state lock poisoned");
        state.require_capability(self.config.strict, method, predicate)
    }

    pub async fn ping(&self) -> Result<Value, ProtocolError> {
        self.send::<mcp_types::PingRequest>(None).await
    }

    pub async fn list_prompts(
        &self,
        cursor: Option<String>,
    ) -> Result<ListPromptsResult, ProtocolError> {
        self.require_capability("listPrompts", |caps| caps.has_prompts())?;
        self.send::<ListPromptsRequest>(CursorParams { cursor }).await
    }

    pub async fn get_prompt(
        &self,
        name: String,
        arguments: Option<Value>,
    ) -> Result<GetPromptResult, ProtocolError> {
        self.require_capability("getPrompt", |caps| caps.has_prompts())?;
        self.send::<GetPromptRequest>(GetPromptParams { name, arguments })
            .await
    }

    pub async fn list_resources(
        &self,
        cursor: Option<String>,
    ) -> Result<ListResourcesResult, ProtocolError> {
        self.require_capability("listResources", |caps| caps.has_resources())?;
        self.send::<ListResourcesRequest>(CursorParams { cursor }).await
    }

    pub async fn read_resource(&self, uri: String) -> Result<ReadResourceResult, ProtocolError> {
        self.require_capability("readResource", |caps| caps.has_resources())?;
        self.send::<ReadResourceRequest>(ReadResourceParams { uri }).await
    }

    pub async fn subscribe_to_resource(&self, uri: String) -> Result<Value, ProtocolError> {
        self.require_capability("subscribeToResource", |caps| {
            caps.resources_support_subscribe()
        })?;
        self.send::<SubscribeRequest>(SubscribeParams { uri }).await
    }

    pub async fn list_tools(&self, cursor: Option<String>) -> Result<ListToolsResult, ProtocolError> {
        self.require_capability("listTools", |caps| caps.has_tools())?;
        self.send::<ListToolsRequest>(CursorParams { cursor }).await
    }

    pub async fn call_tool(
        &self,
        name: String,
        arguments: Option<Value>,
    ) -> Result<CallToolResult, ProtocolError> {
        self.require_capability("callTool", |caps| caps.has_tools())?;
        self.send::<CallToolRequest>(CallToolParams { name, arguments })
            .await
    }
}
