use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::Mutex as StdMutex;
use std::sync::Weak;

use mcp_core::Config;
use mcp_core::ProtocolError;
use mcp_core::engine;
use mcp_core::engine::Role;
use mcp_core::lifecycle::ServerSessionState;
use mcp_core::notifications::NotificationRegistry;
use mcp_core::registry::MethodRegistry;
use mcp_core::transport::Transport;
use mcp_types::ClientCapabilities;
use mcp_types::CURRENT_PROTOCOL_VERSION;
use mcp_types::Implementation;
use mcp_types::InitializeRequest;
use mcp_types::InitializeRequestParams;
use mcp_types::InitializeResult;
use mcp_types::InitializedNotification;
use mcp_types::JsonRpcMessage;
use mcp_types::JsonRpcNotification;
use mcp_types::JsonRpcResponse;
use mcp_types::McpNotification;
use mcp_types::McpRequest;
use mcp_types::PingRequest;
use mcp_types::ServerCapabilities;
use serde::Serialize;
use tokio::sync::Mutex as AsyncMutex;
use tokio::sync::RwLock;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::subscriptions::SubscriptionTable;

type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// An embedder-supplied callback invoked with `(clientInfo, clientCapabilities)`
/// before the session becomes `Initialized`. Throwing a [`ProtocolError`]
/// vetoes the handshake: the client sees that error instead of a successful
/// `InitializeResult`, and the server stays in `Fresh` (§9, "Optional
/// initialize-hook injection").
pub type InitializeHook =
    Arc<dyn Fn(Implementation, ClientCapabilities) -> BoxFuture<'static, Result<(), ProtocolError>> + Send + Sync>;

/// The server side of an MCP session (component G). A `Server` is built once
/// with its identity and capabilities, handlers are registered against it
/// (before or after [`Server::start`] -- registration only ever touches the
/// registry, which is independent of whether a dispatch loop is running),
/// and `start` binds a transport and begins serving.
pub struct Server {
    config: Config,
    server_info: Implementation,
    capabilities: ServerCapabilities,
    instructions: Option<String>,
    methods: Arc<RwLock<MethodRegistry>>,
    notifications: Arc<RwLock<NotificationRegistry>>,
    state: Arc<StdMutex<ServerSessionState>>,
    subscriptions: Arc<StdMutex<SubscriptionTable>>,
    outgoing_tx: StdMutex<Option<mpsc::Sender<JsonRpcMessage>>>,
    join_handle: AsyncMutex<Option<JoinHandle<()>>>,
}

impl Server {
    pub fn new(
        server_info: Implementation,
        capabilities: ServerCapabilities,
        instructions: Option<String>,
        config: Config,
    ) -> Self {
        Self {
            config,
            server_info,
            capabilities,
            instructions,
            methods: Arc::new(RwLock::new(MethodRegistry::new())),
            notifications: Arc::new(RwLock::new(NotificationRegistry::new())),
            state: Arc::new(StdMutex::new(ServerSessionState::new())),
            subscriptions: Arc::new(StdMutex::new(SubscriptionTable::new())),
            outgoing_tx: StdMutex::new(None),
            join_handle: AsyncMutex::new(None),
        }
    }

    /// A clone of the handle to this session's resource-subscription table
    /// (§3, §9). Core defines only the shape; embedders registering their
    /// own `resources/subscribe`/`resources/unsubscribe` handlers capture
    /// this handle to maintain it and decide what "subscribed" means.
    pub fn subscriptions(&self) -> Arc<StdMutex<SubscriptionTable>> {
        Arc::clone(&self.subscriptions)
    }

    /// Registers `handler` for the wire method named by `M::METHOD`,
    /// replacing any prior handler for that name (§4.B: idempotent in
    /// effect). May be called before or after [`Server::start`].
    pub async fn register_method<M, H, Fut>(&self, handler: H)
    where
        M: McpRequest,
        H: Fn(M::Params) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<M::Result, ProtocolError>> + Send + 'static,
    {
        self.methods.write().await.register::<M, H, Fut>(handler);
    }

    /// Appends `handler` to the list for notifications named `N::METHOD`.
    /// Multiple handlers for the same name run in registration order (§5).
    pub async fn on_notification<N, H, Fut>(&self, handler: H)
    where
        N: McpNotification,
        H: Fn(N::Params) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), String>> + Send + 'static,
    {
        self.notifications.write().await.on::<N, H, Fut>(handler);
    }

    /// Installs the default `initialize`/`ping` handlers, binds `transport`,
    /// and spawns the dispatch loop. The core's `Transport` abstraction has
    /// no separate connect step of its own -- constructing a transport (a
    /// `StdioTransport::new()`, a `ChildProcessTransport::spawn(..).await?`)
    /// is what "connecting" means here, so there is no further failure mode
    /// for `start` itself to report.
    pub async fn start(&self, transport: Box<dyn Transport>, initialize_hook: Option<InitializeHook>) {
        let strict = self.config.strict;

        let gate_state = Arc::clone(&self.state);
        let request_gate: engine::RequestGate = Arc::new(move |method: &str| {
            gate_state
                .lock()
                .expect("server state lock poisoned")
                .check_strict_gate(method, strict)
        });

        let notif_gate_state = Arc::clone(&self.state);
        let notification_gate: engine::NotificationGate = Arc::new(move |method: &str| {
            notif_gate_state
                .lock()
                .expect("server state lock poisoned")
                .check_strict_notification_gate(method, strict)
        });

        let engine = engine::spawn(
            transport,
            Role::Server,
            self.config.clone(),
            Arc::clone(&self.methods),
            Arc::clone(&self.notifications),
            request_gate,
            notification_gate,
        );

        self.install_default_handlers(initialize_hook, engine.outgoing_tx.clone())
            .await;

        *self.outgoing_tx.lock().expect("server outgoing_tx lock poisoned") = Some(engine.outgoing_tx);
        *self.join_handle.lock().await = Some(engine.join_handle);
    }

    async fn install_default_handlers(
        &self,
        initialize_hook: Option<InitializeHook>,
        outgoing_tx: mpsc::Sender<JsonRpcMessage>,
    ) {
        let state = Arc::downgrade(&self.state);
        let server_info = self.server_info.clone();
        let capabilities = self.capabilities.clone();
        let instructions = self.instructions.clone();
        let post_initialize_delay = self.config.post_initialize_notification_delay;

        self.methods
            .write()
            .await
            .register::<InitializeRequest, _, _>(move |params: InitializeRequestParams| {
                let state = Weak::clone(&state);
                let server_info = server_info.clone();
                let capabilities = capabilities.clone();
                let instructions = instructions.clone();
                let initialize_hook = initialize_hook.clone();
                let outgoing_tx = outgoing_tx.clone();
                async move {
                    handle_initialize(
                        state,
                        server_info,
                        capabilities,
                        instructions,
                        initialize_hook,
                        outgoing_tx,
                        post_initialize_delay,
                        params,
                    )
                    .await
                }
            });

        self.methods
            .write()
            .await
            .register::<PingRequest, _, _>(|_params: Option<()>| async {
                Ok(serde_json::json!({}))
            });
    }

    /// Sends `response` directly to the transport, bypassing the registry.
    /// Most registered method handlers never need this -- the dispatch loop
    /// already turns their return value into a `Response`/`Error` frame --
    /// but it lets a handler that answered immediately push a later,
    /// out-of-band response for work it deferred.
    pub async fn send(&self, response: JsonRpcResponse) -> Result<(), ProtocolError> {
        let tx = self
            .outgoing_tx
            .lock()
            .expect("server outgoing_tx lock poisoned")
            .clone();
        match tx {
            Some(tx) => tx
                .send(JsonRpcMessage::Response(response))
                .await
                .map_err(|_| ProtocolError::TransportClosed),
            None => Err(ProtocolError::Internal("no transport is bound".to_string())),
        }
    }

    /// Sends a fire-and-forget notification to the client.
    pub async fn notify<N>(&self, params: N::Params) -> Result<(), ProtocolError>
    where
        N: McpNotification,
        N::Params: Serialize,
    {
        let tx = self
            .outgoing_tx
            .lock()
            .expect("server outgoing_tx lock poisoned")
            .clone();
        let tx = tx.ok_or_else(|| ProtocolError::Internal("no transport is bound".to_string()))?;
        let params_value =
            serde_json::to_value(&params).map_err(|e| ProtocolError::Internal(e.to_string()))?;
        let params_field = if params_value.is_null() {
            None
        } else {
            Some(params_value)
        };
        let notification = JsonRpcNotification::new(N::METHOD, params_field);
        tx.send(JsonRpcMessage::Notification(notification))
            .await
            .map_err(|_| ProtocolError::TransportClosed)
    }

    /// Cancels the dispatch task and drops the bound transport. Safe to call
    /// repeatedly: the second call finds nothing left to cancel.
    pub async fn stop(&self) {
        if let Some(handle) = self.join_handle.lock().await.take() {
            handle.abort();
        }
        *self.outgoing_tx.lock().expect("server outgoing_tx lock poisoned") = None;
        self.state
            .lock()
            .expect("server state lock poisoned")
            .terminate();
    }

    /// Awaits natural termination of the dispatch task (a fatal transport
    /// error, or the transport's own EOF). Returns immediately if the
    /// server was never started, or has already been stopped.
    pub async fn wait_until_completed(&self) {
        let handle = self.join_handle.lock().await.take();
        if let Some(handle) = handle {
            let _ = handle.await;
        }
    }
}

#[allow(clippy::too_many_arguments)]
async fn handle_initialize(
    state: Weak<StdMutex<ServerSessionState>>,
    server_info: Implementation,
    capabilities: ServerCapabilities,
    instructions: Option<String>,
    initialize_hook: Option<InitializeHook>,
    outgoing_tx: mpsc::Sender<JsonRpcMessage>,
    post_initialize_delay: std::time::Duration,
    params: InitializeRequestParams,
) -> Result<InitializeResult, ProtocolError> {
    let state = state
        .upgrade()
        .ok_or_else(|| ProtocolError::Internal("server state was dropped".to_string()))?;

    {
        let guard = state.lock().expect("server state lock poisoned");
        guard.begin_initialize()?;
    }

    if params.protocol_version != CURRENT_PROTOCOL_VERSION {
        return Err(ProtocolError::InvalidRequest(format!(
            "unsupported protocol version: {}",
            params.protocol_version
        )));
    }

    if let Some(hook) = initialize_hook {
        hook(params.client_info.clone(), params.capabilities.clone()).await?;
    }

    {
        let mut guard = state.lock().expect("server state lock poisoned");
        guard.complete_initialize(params.client_info, params.capabilities);
    }

    let result = InitializeResult {
        protocol_version: CURRENT_PROTOCOL_VERSION.to_string(),
        capabilities,
        server_info,
        instructions,
    };

    // §9's Open Question: the ~10ms delay before emitting
    // `notifications/initialized` is preserved as a tunable
    // (`Config::post_initialize_notification_delay`) but its exact value is
    // not something any test should assert on.
    tokio::spawn(async move {
        tokio::time::sleep(post_initialize_delay).await;
        let notification = JsonRpcNotification::new(InitializedNotification::METHOD, None);
        let _ = outgoing_tx.send(JsonRpcMessage::Notification(notification)).await;
    });

    Ok(result)
}
