//! End-to-end tests wiring a real `mcp_client::Client` against a real
//! `mcp_server::Server` over `InMemoryTransport`, rather than a facade
//! driving a raw transport directly (the unit tests inside each facade's
//! own crate already cover that). These exercise the same scenarios from
//! the protocol's testable-properties list, but through both typed
//! facades at once, the way an embedder actually uses the crate.

use std::sync::Arc;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;

use mcp_client::Client;
use mcp_core::Config;
use mcp_core::ProtocolError;
use mcp_core::transport::InMemoryTransport;
use mcp_server::Server;
use mcp_types::ClientCapabilities;
use mcp_types::Implementation;
use mcp_types::InitializedNotification;
use mcp_types::McpRequest;
use mcp_types::ServerCapabilities;
use mcp_types::ToolsCapability;
use pretty_assertions::assert_eq;

struct EchoRequest;

impl McpRequest for EchoRequest {
    const METHOD: &'static str = "echo";
    type Params = String;
    type Result = String;
}

#[tokio::test]
async fn handshake_then_a_custom_method_round_trips() {
    let server = Server::new(
        Implementation::new("test-server", "1.0.0"),
        ServerCapabilities::default(),
        Some("be nice".to_string()),
        Config::default(),
    );
    server
        .register_method::<EchoRequest, _, _>(|params: String| async move { Ok(params) })
        .await;

    let (server_transport, client_transport) = InMemoryTransport::pair();
    server.start(Box::new(server_transport), None).await;

    let client = Client::connect(Box::new(client_transport), Config::default());

    let initialized_count = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&initialized_count);
    client
        .on_notification::<InitializedNotification, _, _>(move |_params| {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        })
        .await;

    let result = client
        .initialize(Implementation::new("test-client", "0.1.0"), ClientCapabilities::default())
        .await
        .expect("handshake should succeed");
    assert_eq!(result.server_info.name, "test-server");
    assert_eq!(result.instructions.as_deref(), Some("be nice"));

    let echoed = client
        .send::<EchoRequest>("hello".to_string())
        .await
        .expect("custom method should round-trip");
    assert_eq!(echoed, "hello");

    // The initialized notification is emitted asynchronously after the
    // initialize response; give the server's spawned task a beat to land it
    // without asserting on the exact delay (§9's Open Question).
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    assert_eq!(initialized_count.load(Ordering::SeqCst), 1);

    client.disconnect().await;
    server.stop().await;
}

#[tokio::test]
async fn strict_server_rejects_a_request_issued_before_the_handshake() {
    let server = Server::new(
        Implementation::new("test-server", "1.0.0"),
        ServerCapabilities::default(),
        None,
        Config::default(),
    );
    server
        .register_method::<EchoRequest, _, _>(|params: String| async move { Ok(params) })
        .await;

    let (server_transport, client_transport) = InMemoryTransport::pair();
    server.start(Box::new(server_transport), None).await;
    let client = Client::connect(Box::new(client_transport), Config::default());

    let err = client
        .send::<EchoRequest>("too soon".to_string())
        .await
        .unwrap_err();
    match err {
        ProtocolError::RemoteError { message, .. } => {
            assert_eq!(message, "Server is not initialized");
        }
        other => panic!("expected a remote InvalidRequest error, got {other:?}"),
    }

    client.disconnect().await;
    server.stop().await;
}

#[tokio::test]
async fn disconnect_drains_a_request_the_server_never_answers() {
    // No handler is registered for `echo`, so once past the handshake the
    // server answers with MethodNotFound rather than hanging -- to exercise
    // a request that's still genuinely pending when disconnect fires, use a
    // handler that never completes.
    let server = Server::new(
        Implementation::new("test-server", "1.0.0"),
        ServerCapabilities::default(),
        None,
        Config::default(),
    );
    server
        .register_method::<EchoRequest, _, _>(|_params: String| async move {
            std::future::pending::<Result<String, ProtocolError>>().await
        })
        .await;

    let (server_transport, client_transport) = InMemoryTransport::pair();
    server.start(Box::new(server_transport), None).await;
    let client = Client::connect(Box::new(client_transport), Config::default());

    client
        .initialize(Implementation::new("test-client", "0.1.0"), ClientCapabilities::default())
        .await
        .unwrap();

    let client = Arc::new(client);
    let waiter_client = Arc::clone(&client);
    let waiter = tokio::spawn(async move { waiter_client.send::<EchoRequest>("stuck".to_string()).await });

    // Give the request time to actually reach the pending table before we
    // disconnect out from under it.
    tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    client.disconnect().await;

    let outcome = waiter.await.expect("waiter task should not panic");
    match outcome {
        Err(ProtocolError::RemoteError { message, .. }) => {
            assert_eq!(message, "Client disconnected");
        }
        other => panic!("expected the waiter to observe disconnect, got {other:?}"),
    }

    server.stop().await;
}

#[tokio::test]
async fn non_strict_client_calls_list_tools_even_though_the_server_never_advertised_it() {
    let server = Server::new(
        Implementation::new("test-server", "1.0.0"),
        ServerCapabilities::default(),
        None,
        Config::default(),
    );
    server
        .register_method::<mcp_client::ListToolsRequest, _, _>(|_params| async move {
            Ok(mcp_client::ListToolsResult {
                tools: vec![],
                next_cursor: None,
            })
        })
        .await;

    let (server_transport, client_transport) = InMemoryTransport::pair();
    server.start(Box::new(server_transport), None).await;

    let config = Config {
        strict: false,
        ..Config::default()
    };
    let client = Client::connect(Box::new(client_transport), config);
    client
        .initialize(Implementation::new("test-client", "0.1.0"), ClientCapabilities::default())
        .await
        .unwrap();

    let result = client.list_tools(None).await.expect("non-strict call should reach the server");
    assert_eq!(result.tools.len(), 0);

    client.disconnect().await;
    server.stop().await;
}

#[tokio::test]
async fn strict_client_fails_fast_when_the_server_never_advertised_tools() {
    let server = Server::new(
        Implementation::new("test-server", "1.0.0"),
        ServerCapabilities {
            tools: None,
            ..ServerCapabilities::default()
        },
        None,
        Config::default(),
    );
    let (server_transport, client_transport) = InMemoryTransport::pair();
    server.start(Box::new(server_transport), None).await;

    let client = Client::connect(Box::new(client_transport), Config::default());
    client
        .initialize(Implementation::new("test-client", "0.1.0"), ClientCapabilities::default())
        .await
        .unwrap();

    let err = client.list_tools(None).await.unwrap_err();
    assert!(matches!(err, ProtocolError::MethodNotFound(_)));

    client.disconnect().await;
    server.stop().await;
}

#[tokio::test]
async fn strict_client_succeeds_once_the_server_advertises_tools() {
    let server = Server::new(
        Implementation::new("test-server", "1.0.0"),
        ServerCapabilities {
            tools: Some(ToolsCapability::default()),
            ..ServerCapabilities::default()
        },
        None,
        Config::default(),
    );
    server
        .register_method::<mcp_client::ListToolsRequest, _, _>(|_params| async move {
            Ok(mcp_client::ListToolsResult {
                tools: vec![],
                next_cursor: None,
            })
        })
        .await;

    let (server_transport, client_transport) = InMemoryTransport::pair();
    server.start(Box::new(server_transport), None).await;

    let client = Client::connect(Box::new(client_transport), Config::default());
    client
        .initialize(Implementation::new("test-client", "0.1.0"), ClientCapabilities::default())
        .await
        .unwrap();

    let result = client.list_tools(None).await.expect("tools capability was negotiated");
    assert_eq!(result.tools.len(), 0);

    client.disconnect().await;
    server.stop().await;
}
