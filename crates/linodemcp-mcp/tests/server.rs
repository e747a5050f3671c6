//! JSON-RPC behavior over the stdio transport.

mod common;

use linodemcp_client::fake::FakeClient;
use linodemcp_mcp::protocol::codes;
use linodemcp_mcp::{McpServer, default_registry};
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, DuplexStream, Lines};
use tokio::task::JoinHandle;

struct Session {
    input: DuplexStream,
    output: Lines<BufReader<DuplexStream>>,
    task: JoinHandle<Result<(), linodemcp_mcp::McpError>>,
}

impl Session {
    fn start(server: Arc<McpServer>) -> Self {
        let (input, server_input) = tokio::io::duplex(64 * 1024);
        let (server_output, output) = tokio::io::duplex(64 * 1024);
        let task = tokio::spawn(server.serve(server_input, server_output));
        Self {
            input,
            output: BufReader::new(output).lines(),
            task,
        }
    }

    async fn send(&mut self, message: Value) {
        let mut line = serde_json::to_vec(&message).unwrap();
        line.push(b'\n');
        self.input.write_all(&line).await.unwrap();
    }

    async fn send_raw(&mut self, line: &str) {
        self.input.write_all(line.as_bytes()).await.unwrap();
        self.input.write_all(b"\n").await.unwrap();
    }

    async fn recv(&mut self) -> Value {
        let line = tokio::time::timeout(Duration::from_secs(5), self.output.next_line())
            .await
            .expect("response in time")
            .unwrap()
            .expect("open output");
        serde_json::from_str(&line).unwrap()
    }

    async fn close(self) {
        drop(self.input);
        self.task.await.unwrap().unwrap();
    }
}

#[tokio::test]
async fn test_initialize_then_list() {
    let (server, _) = common::server(FakeClient::new()).await;
    let mut session = Session::start(server);

    session
        .send(json!({"jsonrpc": "2.0", "id": 1, "method": "initialize", "params": {}}))
        .await;
    let response = session.recv().await;
    assert_eq!(response["id"], 1);
    assert_eq!(response["result"]["serverInfo"]["name"], "linodemcp");

    session
        .send(json!({"jsonrpc": "2.0", "method": "notifications/initialized"}))
        .await;
    session
        .send(json!({"jsonrpc": "2.0", "id": 2, "method": "tools/list"}))
        .await;
    let response = session.recv().await;
    assert_eq!(response["id"], 2);
    assert_eq!(response["result"]["tools"].as_array().unwrap().len(), 30);

    session.close().await;
}

#[tokio::test]
async fn test_parse_error_keeps_session_alive() {
    let (server, _) = common::server(FakeClient::new()).await;
    let mut session = Session::start(server);

    session.send_raw("{\"jsonrpc\": ").await;
    let response = session.recv().await;
    assert_eq!(response["error"]["code"], codes::PARSE_ERROR);
    assert_eq!(response["id"], Value::Null);

    session
        .send(json!({"jsonrpc": "2.0", "id": "p", "method": "ping"}))
        .await;
    assert_eq!(session.recv().await["id"], "p");

    session.close().await;
}

#[tokio::test]
async fn test_tool_failure_is_result_not_error() {
    let (server, _) = common::server(FakeClient::new()).await;
    let mut session = Session::start(server);

    session
        .send(json!({
            "jsonrpc": "2.0",
            "id": 3,
            "method": "tools/call",
            "params": {"name": "linode.instances.get", "arguments": {}}
        }))
        .await;
    let response = session.recv().await;
    assert!(response.get("error").is_none());
    assert_eq!(response["result"]["isError"], true);
    assert_eq!(
        response["result"]["structuredContent"]["error"]["field"],
        "linode_id"
    );

    session.close().await;
}

#[tokio::test]
async fn test_cancel_in_flight_call() {
    let fake = FakeClient::new();
    fake.stall();
    let (server, fake) = common::server(fake).await;
    let mut session = Session::start(server.clone());

    session
        .send(json!({
            "jsonrpc": "2.0",
            "id": 10,
            "method": "tools/call",
            "params": {"name": "linode.regions.list", "arguments": {}}
        }))
        .await;
    session
        .send(json!({
            "jsonrpc": "2.0",
            "method": "notifications/cancelled",
            "params": {"requestId": 10, "reason": "user aborted"}
        }))
        .await;

    let response = session.recv().await;
    assert_eq!(response["id"], 10);
    assert_eq!(response["error"]["code"], codes::REQUEST_CANCELLED);
    assert_eq!(server.in_flight(), 0);

    // The abandoned fetch left the slot empty; a later call fetches normally.
    fake.release();
    session
        .send(json!({
            "jsonrpc": "2.0",
            "id": 11,
            "method": "tools/call",
            "params": {"name": "linode.regions.list", "arguments": {}}
        }))
        .await;
    let response = session.recv().await;
    assert_eq!(response["id"], 11);
    assert_eq!(response["result"]["isError"], false);

    session.close().await;
}

#[tokio::test]
async fn test_end_of_input_cancels_outstanding_calls() {
    let fake = FakeClient::new();
    fake.stall();
    let (server, _) = common::server(fake).await;
    let mut session = Session::start(server.clone());

    session
        .send(json!({
            "jsonrpc": "2.0",
            "id": 20,
            "method": "tools/call",
            "params": {"name": "linode.types.list", "arguments": {}}
        }))
        .await;

    let Session {
        input,
        mut output,
        task,
    } = session;
    drop(input);
    tokio::time::timeout(Duration::from_secs(5), task)
        .await
        .expect("serve returns after EOF")
        .unwrap()
        .unwrap();

    let line = output.next_line().await.unwrap().unwrap();
    let response: Value = serde_json::from_str(&line).unwrap();
    assert_eq!(response["error"]["code"], codes::REQUEST_CANCELLED);
    assert!(server.shutdown_token().is_cancelled());
}

#[test]
fn test_every_input_schema_compiles() {
    for definition in default_registry().unwrap().definitions() {
        let validator = jsonschema::validator_for(&definition.input_schema)
            .unwrap_or_else(|e| panic!("{}: {e}", definition.name));
        assert!(
            !validator.is_valid(&json!("not an object")),
            "{}",
            definition.name
        );
    }
}

#[test]
fn test_create_instance_schema_matches_decoder() {
    let registry = default_registry().unwrap();
    let definition = registry
        .definitions()
        .into_iter()
        .find(|d| d.name == "linode.instances.create")
        .unwrap();
    let validator = jsonschema::validator_for(&definition.input_schema).unwrap();

    assert!(validator.is_valid(&json!({
        "region": "us-east",
        "type": "g6-nanode-1",
        "label": "web-3",
        "tags": ["prod"]
    })));
    assert!(!validator.is_valid(&json!({"region": "us-east", "type": "g6-nanode-1"})));
    assert!(!validator.is_valid(&json!({
        "region": "us-east",
        "type": "g6-nanode-1",
        "label": "web-3",
        "booted": "yes"
    })));
}
