use mcp_types::ClientCapabilities;
use mcp_types::Implementation;
use mcp_types::ServerCapabilities;

use crate::error::ProtocolError;

/// Lifecycle states shared by both peer roles. `Initializing` is the
/// client-only in-flight state between sending `initialize` and receiving
/// its response; a server peer jumps straight from `Fresh` to `Initialized`
/// when it answers the request, since it has no client-style round trip of
/// its own to wait out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Fresh,
    Initializing,
    Initialized,
    Terminated,
}

/// Server-side session state: the lifecycle flag plus whatever the peer
/// told us about itself during the handshake.
#[derive(Debug, Default)]
pub struct ServerSessionState {
    state: Option<LifecycleState>,
    pub client_info: Option<Implementation>,
    pub client_capabilities: Option<ClientCapabilities>,
}

impl ServerSessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> LifecycleState {
        self.state.unwrap_or(LifecycleState::Fresh)
    }

    /// Enforces the "only one `initialize`, ever" rule. Returns the error
    /// the handler should reply with if this is not a legal transition.
    pub fn begin_initialize(&self) -> Result<(), ProtocolError> {
        match self.state() {
            LifecycleState::Fresh => Ok(()),
            LifecycleState::Initialized => Err(ProtocolError::InvalidRequest(
                "Server is already initialized".to_string(),
            )),
            LifecycleState::Initializing | LifecycleState::Terminated => Err(
                ProtocolError::LifecycleViolation("unexpected initialize".to_string()),
            ),
        }
    }

    pub fn complete_initialize(
        &mut self,
        client_info: Implementation,
        client_capabilities: ClientCapabilities,
    ) {
        self.client_info = Some(client_info);
        self.client_capabilities = Some(client_capabilities);
        self.state = Some(LifecycleState::Initialized);
    }

    pub fn terminate(&mut self) {
        self.state = Some(LifecycleState::Terminated);
    }

    /// In strict mode, every method but `initialize`/`ping` is rejected
    /// until the handshake completes. Call this before dispatch for every
    /// inbound request.
    pub fn check_strict_gate(&self, method: &str, strict: bool) -> Result<(), ProtocolError> {
        if !strict {
            return Ok(());
        }
        if method == "initialize" || method == "ping" {
            return Ok(());
        }
        if self.state() != LifecycleState::Initialized {
            return Err(ProtocolError::InvalidRequest(
                "Server is not initialized".to_string(),
            ));
        }
        Ok(())
    }

    /// The notification analogue of [`Self::check_strict_gate`]. Inbound
    /// notifications have no response channel, so a rejection here is
    /// logged by the caller rather than turned into a wire error.
    pub fn check_strict_notification_gate(&self, method: &str, strict: bool) -> bool {
        if !strict {
            return true;
        }
        if method == "notifications/initialized" {
            return true;
        }
        self.state() == LifecycleState::Initialized
    }
}

/// Client-side session state: the lifecycle flag plus what the server told
/// us about itself.
#[derive(Debug, Default)]
pub struct ClientSessionState {
    state: Option<LifecycleState>,
    pub server_info: Option<Implementation>,
    pub server_capabilities: Option<ServerCapabilities>,
    pub instructions: Option<String>,
}

impl ClientSessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> LifecycleState {
        self.state.unwrap_or(LifecycleState::Fresh)
    }

    pub fn begin_initialize(&mut self) {
        self.state = Some(LifecycleState::Initializing);
    }

    pub fn complete_initialize(
        &mut self,
        server_info: Implementation,
        server_capabilities: ServerCapabilities,
        instructions: Option<String>,
    ) {
        self.server_info = Some(server_info);
        self.server_capabilities = Some(server_capabilities);
        self.instructions = instructions;
        self.state = Some(LifecycleState::Initialized);
    }

    pub fn terminate(&mut self) {
        self.state = Some(LifecycleState::Terminated);
    }

    /// A capability-gated helper (`listTools`, `subscribeToResource`, ...)
    /// calls this first, in strict mode, with a predicate over whatever
    /// server capability it needs. Fails fast with `MethodNotFound` (never
    /// touching the transport) if capabilities are unset or the predicate
    /// rejects them.
    pub fn require_capability(
        &self,
        strict: bool,
        method: &'static str,
        predicate: impl FnOnce(&ServerCapabilities) -> bool,
    ) -> Result<(), ProtocolError> {
        if !strict {
            return Ok(());
        }
        match &self.server_capabilities {
            Some(capabilities) if predicate(capabilities) => Ok(()),
            _ => Err(ProtocolError::MethodNotFound(method.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mcp_types::ToolsCapability;

    #[test]
    fn server_rejects_a_second_initialize() {
        let mut state = ServerSessionState::new();
        state.complete_initialize(Implementation::new("c", "1"), ClientCapabilities::default());
        assert!(state.begin_initialize().is_err());
    }

    #[test]
    fn strict_gate_rejects_everything_but_initialize_and_ping_before_handshake() {
        let state = ServerSessionState::new();
        assert!(state.check_strict_gate("initialize", true).is_ok());
        assert!(state.check_strict_gate("ping", true).is_ok());
        assert!(state.check_strict_gate("tools/list", true).is_err());
    }

    #[test]
    fn non_strict_gate_never_rejects() {
        let state = ServerSessionState::new();
        assert!(state.check_strict_gate("tools/list", false).is_ok());
    }

    #[test]
    fn strict_notification_gate_rejects_before_handshake() {
        let state = ServerSessionState::new();
        assert!(!state.check_strict_notification_gate("whatever", true));
        assert!(state.check_strict_notification_gate("whatever", false));
    }

    #[test]
    fn client_capability_gate_fails_fast_without_capabilities() {
        let state = ClientSessionState::new();
        let result = state.require_capability(true, "listTools", |caps| caps.has_tools());
        assert!(matches!(result, Err(ProtocolError::MethodNotFound(_))));
    }

    #[test]
    fn client_capability_gate_passes_when_negotiated() {
        let mut state = ClientSessionState::new();
        let mut capabilities = ServerCapabilities::default();
        capabilities.tools = Some(ToolsCapability::default());
        state.complete_initialize(Implementation::new("s", "1"), capabilities, None);
        let result = state.require_capability(true, "listTools", |caps| caps.has_tools());
        assert!(result.is_ok());
    }

    #[test]
    fn non_strict_client_skips_the_capability_check_entirely() {
        let state = ClientSessionState::new();
        let result = state.require_capability(false, "listTools", |caps| caps.has_tools());
        assert!(result.is_ok());
    }
}
