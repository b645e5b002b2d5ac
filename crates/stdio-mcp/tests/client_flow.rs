//! Client integration tests: correlation against a real in-process server,
//! a scripted fake server, and the shipped binaries.

use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};
use tokio::io::{AsyncWriteExt, BufReader, DuplexStream, ReadHalf, WriteHalf};
use tokio::task::JoinHandle;

use stdio_mcp::client::process::ServerProcess;
use stdio_mcp::config::{ClientConfig, ServerConfig};
use stdio_mcp::server::default_registry;
use stdio_mcp::transport::{encode_frame, FrameReader, Framing, StdioTransport};
use stdio_mcp::types::*;
use stdio_mcp::{HandlerRegistry, McpClient};

// ─────────────────────── helpers ───────────────────────

const WAIT: Duration = Duration::from_secs(5);

/// Connect a client to a real server task over one in-memory pipe.
fn connect(registry: HandlerRegistry) -> (McpClient, JoinHandle<McpResult<()>>) {
    let (client_io, server_io) = tokio::io::duplex(64 * 1024);
    let (server_read, server_write) = tokio::io::split(server_io);
    let transport = StdioTransport::new(registry, ServerConfig::default());
    let server = tokio::spawn(async move { transport.serve(server_read, server_write).await });

    let (client_read, client_write) = tokio::io::split(client_io);
    let config = ClientConfig::default().with_request_timeout(Some(WAIT));
    (McpClient::connect(client_read, client_write, config), server)
}

/// The far end of a client connection, driven by hand.
struct FakeServer {
    frames: FrameReader<BufReader<ReadHalf<DuplexStream>>>,
    writer: WriteHalf<DuplexStream>,
}

impl FakeServer {
    async fn recv(&mut self) -> Value {
        let frame = tokio::time::timeout(WAIT, self.frames.read_frame())
            .await
            .expect("timed out waiting for the client")
            .expect("client closed its output");
        serde_json::from_slice(&frame).unwrap()
    }

    async fn send(&mut self, msg: Value) {
        self.writer
            .write_all(&encode_frame(msg.to_string().as_bytes()))
            .await
            .unwrap();
    }
}

fn connect_fake() -> (McpClient, FakeServer) {
    let (client_io, server_io) = tokio::io::duplex(64 * 1024);
    let (server_read, server_write) = tokio::io::split(server_io);
    let (client_read, client_write) = tokio::io::split(client_io);
    let config = ClientConfig::default().with_request_timeout(Some(WAIT));
    let client = McpClient::connect(client_read, client_write, config);
    let fake = FakeServer {
        frames: FrameReader::new(BufReader::new(server_read), Framing::ContentLength),
        writer: server_write,
    };
    (client, fake)
}

fn standard() -> HandlerRegistry {
    default_registry(&ServerConfig::default())
}

// ═══════════════════════════════════════════════════════
// AGAINST THE REAL SERVER
// ═══════════════════════════════════════════════════════

/// Test 1: handshake and every list/read/get method
#[tokio::test]
async fn test_01_full_session() {
    let (client, server) = connect(standard());

    let init = client.initialize().await.unwrap();
    assert_eq!(init.protocol_version, MCP_VERSION);
    assert_eq!(init.server_info.name, SERVER_NAME);
    assert!(client.server_info().is_some());

    client.ping().await.unwrap();

    let tools = client.list_tools().await.unwrap();
    assert_eq!(tools.tools.len(), 2);

    let result = client
        .call_tool("random_string", Some(json!({"length": 20})))
        .await
        .unwrap();
    assert!(!result.is_error());
    assert_eq!(result.first_text().unwrap().len(), 20);

    let resources = client.list_resources().await.unwrap();
    assert_eq!(resources.resources[0].uri, "data://random_data");
    let templates = client.list_resource_templates().await.unwrap();
    assert!(!templates.resource_templates.is_empty());

    let data = client
        .read_resource("data://random_data?length=16")
        .await
        .unwrap();
    assert_eq!(data.contents[0].text.as_deref().unwrap().len(), 16);

    let prompts = client.list_prompts().await.unwrap();
    assert_eq!(prompts.prompts[0].name, "query");
    let prompt = client
        .get_prompt("query", Some(json!({"topic": "volcanoes"})))
        .await
        .unwrap();
    assert!(prompt.messages[0]
        .content
        .as_text()
        .unwrap()
        .contains("volcanoes"));

    client.shutdown(WAIT).await.unwrap();
    tokio::time::timeout(WAIT, server)
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    println!("TEST 01 — Full Session: PASS");
}

/// Test 2: error responses surface as peer errors with their code
#[tokio::test]
async fn test_02_error_responses() {
    let (client, _server) = connect(standard());
    client.initialize().await.unwrap();

    match client.call("unknown/method", None).await {
        Err(McpError::Rpc(err)) => assert_eq!(err.code, error_codes::METHOD_NOT_FOUND),
        other => panic!("expected MethodNotFound, got {other:?}"),
    }

    match client.call_tool("no_such_tool", None).await {
        Err(McpError::Rpc(err)) => assert_eq!(err.code, mcp_error_codes::TOOL_NOT_FOUND),
        other => panic!("expected ToolNotFound, got {other:?}"),
    }
    println!("TEST 02 — Error Responses: PASS");
}

/// Test 3: concurrent calls each get their own response
#[tokio::test]
async fn test_03_concurrent_calls() {
    let (client, _server) = connect(standard());
    client.initialize().await.unwrap();
    let client = Arc::new(client);

    let mut handles = Vec::new();
    for length in 1..=24usize {
        let client = client.clone();
        handles.push(tokio::spawn(async move {
            let result = client
                .call_tool("random_string", Some(json!({ "length": length })))
                .await
                .unwrap();
            (length, result.first_text().unwrap().len())
        }));
    }

    for handle in handles {
        let (asked, got) = handle.await.unwrap();
        assert_eq!(asked, got);
    }
    println!("TEST 03 — Concurrent Calls: PASS");
}

/// Test 4: a stalled request times out without poisoning the connection
#[tokio::test]
async fn test_04_timeout() {
    let mut registry = standard();
    registry.register_fn("test/stall", |_| async {
        std::future::pending::<()>().await;
        Ok(Value::Null)
    });
    let (client, _server) = connect(registry);
    client.initialize().await.unwrap();

    let pending = client.send("test/stall", None).await.unwrap();
    let outcome = pending.wait(Some(Duration::from_millis(50))).await;
    assert!(matches!(outcome, Err(McpError::Timeout(_))));

    client.ping().await.unwrap();
    println!("TEST 04 — Timeout: PASS");
}

// ═══════════════════════════════════════════════════════
// AGAINST A SCRIPTED SERVER
// ═══════════════════════════════════════════════════════

/// Test 5: ids start at 1 and responses may arrive out of order
#[tokio::test]
async fn test_05_out_of_order_responses() {
    let (client, mut fake) = connect_fake();

    let first = client.send("a", None).await.unwrap();
    let second = client.send("b", None).await.unwrap();
    assert_eq!(*first.id(), RequestId::Number(1));
    assert_eq!(*second.id(), RequestId::Number(2));

    let req_a = fake.recv().await;
    let req_b = fake.recv().await;
    assert_eq!(req_a["method"], "a");
    assert_eq!(req_b["method"], "b");

    fake.send(json!({"jsonrpc": "2.0", "id": 2, "result": "for b"}))
        .await;
    // Floating-point id still correlates.
    fake.send(json!({"jsonrpc": "2.0", "id": 1.0, "result": "for a"}))
        .await;

    assert_eq!(second.wait(Some(WAIT)).await.unwrap().get(), "\"for b\"");
    assert_eq!(first.wait(Some(WAIT)).await.unwrap().get(), "\"for a\"");
    println!("TEST 05 — Out Of Order Responses: PASS");
}

/// Test 6: server-initiated requests are refused, not misrouted
#[tokio::test]
async fn test_06_server_initiated_request() {
    let (client, mut fake) = connect_fake();
    let pending = client.send("ping", None).await.unwrap();
    let _ = fake.recv().await;

    fake.send(json!({"jsonrpc": "2.0", "id": 1, "method": "sampling/createMessage"}))
        .await;
    let reply = fake.recv().await;
    assert_eq!(reply["id"], 1);
    assert_eq!(reply["error"]["code"], error_codes::METHOD_NOT_FOUND);

    // The client's own call with the same id is still waiting.
    fake.send(json!({"jsonrpc": "2.0", "id": 1, "result": {}}))
        .await;
    assert_eq!(pending.wait(Some(WAIT)).await.unwrap().get(), "{}");
    println!("TEST 06 — Server Initiated Request: PASS");
}

/// Test 7: end of stream fails every pending call
#[tokio::test]
async fn test_07_end_of_stream_fails_pending() {
    let (client, mut fake) = connect_fake();
    let pending = client.send("tools/list", None).await.unwrap();
    let _ = fake.recv().await;

    drop(fake);
    let outcome = pending.wait(Some(WAIT)).await;
    assert!(matches!(outcome, Err(McpError::ConnectionClosed)));

    let after = client.send("ping", None).await;
    assert!(matches!(after, Err(McpError::ConnectionClosed)));
    println!("TEST 07 — End Of Stream: PASS");
}

/// Test 8: close sends EOF to the server
#[tokio::test]
async fn test_08_close_sends_eof() {
    let (client, mut fake) = connect_fake();
    client.notify("notifications/initialized", None).await.unwrap();
    let note = fake.recv().await;
    assert!(note.get("id").is_none());

    client.close().await.unwrap();
    let next = tokio::time::timeout(WAIT, fake.frames.read_frame())
        .await
        .unwrap();
    assert!(next.is_err());
    println!("TEST 08 — Close Sends EOF: PASS");
}

/// Test 9: a malformed reply carrying our id fails the call at once
#[tokio::test]
async fn test_09_malformed_reply_fails_call() {
    let (client, mut fake) = connect_fake();
    let pending = client.send("tools/list", None).await.unwrap();
    let _ = fake.recv().await;

    fake.send(json!({"jsonrpc": "2.0", "id": 1, "error": "boom"}))
        .await;

    // No client timeout: only the reply itself can resolve the call.
    let outcome = tokio::time::timeout(WAIT, pending.wait(None))
        .await
        .expect("malformed reply left the call waiting");
    assert!(matches!(outcome, Err(McpError::MalformedReply(_))));

    // The connection is still usable afterwards.
    let next = client.send("ping", None).await.unwrap();
    let _ = fake.recv().await;
    fake.send(json!({"jsonrpc": "2.0", "id": 2, "result": {}}))
        .await;
    assert_eq!(next.wait(Some(WAIT)).await.unwrap().get(), "{}");
    println!("TEST 09 — Malformed Reply Fails Call: PASS");
}

/// Test 10: a result of the wrong shape is a client-side decode failure
#[tokio::test]
async fn test_10_unexpected_result_shape() {
    let (client, mut fake) = connect_fake();
    let server = tokio::spawn(async move {
        let req = fake.recv().await;
        fake.send(json!({"jsonrpc": "2.0", "id": req["id"], "result": {"tools": "nope"}}))
            .await;
        fake
    });

    let outcome = client.list_tools().await;
    assert!(matches!(outcome, Err(McpError::MalformedReply(_))));
    let _fake = server.await.unwrap();
    println!("TEST 10 — Unexpected Result Shape: PASS");
}

// ═══════════════════════════════════════════════════════
// BINARIES
// ═══════════════════════════════════════════════════════

/// Test 11: spawn the real server binary as a child process
#[tokio::test]
async fn test_11_spawned_server() {
    let process = ServerProcess::spawn(
        env!("CARGO_BIN_EXE_stdio-mcp"),
        &["--log-level".to_string(), "warn".to_string()],
        ClientConfig::default(),
    )
    .unwrap();

    let init = process.client().initialize().await.unwrap();
    assert_eq!(init.server_info.name, SERVER_NAME);
    let tools = process.client().list_tools().await.unwrap();
    assert!(tools.tools.iter().any(|t| t.name == "random_string"));

    let status = process.shutdown(WAIT).await.unwrap();
    assert!(status.map(|s| s.success()).unwrap_or(false));
    println!("TEST 11 — Spawned Server: PASS");
}

/// Test 12: the client binary reports a JSON summary
#[test]
fn test_12_client_binary() {
    let output = std::process::Command::new(env!("CARGO_BIN_EXE_stdio-mcp-client"))
        .args([
            "--server",
            env!("CARGO_BIN_EXE_stdio-mcp"),
            "--server-arg=--log-level=warn",
            "--log-level",
            "warn",
            "--call-tool",
            "random_string",
            "--tool-args",
            r#"{"length": 5}"#,
            "--read",
            "data://random_data?length=3",
            "--prompt",
            "query",
        ])
        .output()
        .unwrap();
    assert!(
        output.status.success(),
        "client failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let report: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["server"]["name"], SERVER_NAME);
    assert_eq!(
        report["tool_result"]["content"][0]["text"]
            .as_str()
            .unwrap()
            .len(),
        5
    );
    assert_eq!(
        report["resource"]["contents"][0]["text"]
            .as_str()
            .unwrap()
            .len(),
        3
    );
    assert_eq!(report["prompt"]["messages"][0]["role"], "assistant");
    println!("TEST 12 — Client Binary: PASS");
}
