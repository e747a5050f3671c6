//! MCP server implementation.
//!
//! This module provides the JSON-RPC front end: method routing, per-request
//! cancellation, and the stdio transport. The HTTP transport lives in
//! [`crate::http_transport`] and calls back into [`McpServer::handle_request`].

use crate::dispatcher::Dispatcher;
use crate::error::{McpError, ToolError};
use crate::http_transport::HttpServer;
use crate::protocol::*;
use linodemcp_core::{McpConfig, Transport};
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

/// The MCP server.
pub struct McpServer {
    config: McpConfig,
    dispatcher: Dispatcher,
    /// Requests still running, keyed by JSON-encoded id.
    in_flight: Mutex<HashMap<String, InFlight>>,
    generation: AtomicU64,
    shutdown: CancellationToken,
}

/// Table entry for one running request. A later request reusing the id
/// replaces the entry, and the generation tells the two apart on completion.
struct InFlight {
    generation: u64,
    cancel: CancellationToken,
}

/// Handle returned by [`McpServer::begin`] and consumed by [`McpServer::finish`].
struct CallKey {
    id: String,
    generation: u64,
}

impl McpServer {
    /// Create a new MCP server with the given configuration.
    pub fn new(config: McpConfig, dispatcher: Dispatcher) -> Self {
        Self {
            config,
            dispatcher,
            in_flight: Mutex::new(HashMap::new()),
            generation: AtomicU64::new(0),
            shutdown: CancellationToken::new(),
        }
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Token whose cancellation stops the transport and every in-flight call.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Number of requests currently running.
    pub fn in_flight(&self) -> usize {
        self.calls().len()
    }

    /// Start the MCP server on the configured transport.
    pub async fn run(self: Arc<Self>) -> Result<(), McpError> {
        match self.config.transport {
            Transport::Stdio => self.run_stdio().await,
            Transport::Http => self.run_http().await,
        }
    }

    /// Run the server with stdio transport.
    pub async fn run_stdio(self: Arc<Self>) -> Result<(), McpError> {
        tracing::info!("Starting MCP server with stdio transport");
        self.serve(tokio::io::stdin(), tokio::io::stdout()).await
    }

    /// Run the server with HTTP transport.
    pub async fn run_http(self: Arc<Self>) -> Result<(), McpError> {
        let addr = self.config.bind_addr();
        let shutdown = self.shutdown_token();
        HttpServer::new(addr, self).run(shutdown).await
    }

    /// Serve line-delimited JSON-RPC from `reader`, writing responses to `writer`.
    ///
    /// Each request runs as its own task; responses go through a single writer
    /// task, so they may arrive out of request order. At end of input every
    /// in-flight call is cancelled and awaited before returning.
    pub async fn serve<R, W>(self: Arc<Self>, reader: R, writer: W) -> Result<(), McpError>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let (tx, rx) = mpsc::channel::<JsonRpcResponse>(64);
        let writer_task = tokio::spawn(write_responses(writer, rx));

        let mut lines = BufReader::new(reader).lines();
        let mut workers = JoinSet::new();
        loop {
            let line = tokio::select! {
                _ = self.shutdown.cancelled() => break,
                line = lines.next_line() => line?,
            };
            let Some(line) = line else { break };
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let request: JsonRpcRequest = match serde_json::from_str(line) {
                Ok(request) => request,
                Err(e) => {
                    tracing::warn!(error = %e, "unparseable JSON-RPC message");
                    let message = format!("Parse error: {e}");
                    let response = JsonRpcResponse::error(None, codes::PARSE_ERROR, message);
                    if tx.send(response).await.is_err() {
                        break;
                    }
                    continue;
                }
            };

            // Registered before spawning so a cancel notification that follows
            // immediately still finds the token.
            let (key, cancel) = self.begin(&request);
            let server = self.clone();
            let tx = tx.clone();
            workers.spawn(async move {
                let response = server.respond(request, cancel).await;
                server.finish(key);
                if let Some(response) = response {
                    let _ = tx.send(response).await;
                }
            });
        }

        tracing::info!(in_flight = self.in_flight(), "input closed, stopping");
        self.shutdown.cancel();
        while workers.join_next().await.is_some() {}
        drop(tx);

        writer_task
            .await
            .map_err(|e| McpError::TransportError(e.to_string()))?
    }

    /// Handle a JSON-RPC request. Notifications produce no response.
    pub async fn handle_request(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        let (key, cancel) = self.begin(&request);
        let response = self.respond(request, cancel).await;
        self.finish(key);
        response
    }

    fn calls(&self) -> MutexGuard<'_, HashMap<String, InFlight>> {
        self.in_flight.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn begin(&self, request: &JsonRpcRequest) -> (Option<CallKey>, CancellationToken) {
        let cancel = self.shutdown.child_token();
        let key = request.id.as_ref().map(|id| CallKey {
            id: id.to_string(),
            generation: self.generation.fetch_add(1, Ordering::Relaxed),
        });
        if let Some(key) = &key {
            let entry = InFlight {
                generation: key.generation,
                cancel: cancel.clone(),
            };
            self.calls().insert(key.id.clone(), entry);
        }
        (key, cancel)
    }

    /// Drop the table entry for `key` unless a later request with the same id owns it.
    fn finish(&self, key: Option<CallKey>) {
        let Some(key) = key else { return };
        let mut calls = self.calls();
        if calls
            .get(&key.id)
            .is_some_and(|entry| entry.generation == key.generation)
        {
            calls.remove(&key.id);
        }
    }

    async fn respond(
        &self,
        request: JsonRpcRequest,
        cancel: CancellationToken,
    ) -> Option<JsonRpcResponse> {
        let id = request.id.clone();
        let notification = request.is_notification();

        let response = match request.method.as_str() {
            "initialize" => self.handle_initialize(id),
            "ping" => JsonRpcResponse::success(id, json!({})),
            "tools/list" => self.handle_list_tools(id),
            "tools/call" => self.handle_call_tool(id, request.params, &cancel).await,
            "shutdown" => self.handle_shutdown(id),
            "notifications/initialized" | "initialized" => return None,
            "notifications/cancelled" => {
                self.handle_cancelled(request.params);
                return None;
            }
            _ if notification => {
                tracing::debug!(method = %request.method, "ignoring notification");
                return None;
            }
            _ => JsonRpcResponse::error(
                id,
                codes::METHOD_NOT_FOUND,
                format!("Method not found: {}", request.method),
            ),
        };

        // Requests without an id get no response.
        if notification {
            return None;
        }
        Some(response)
    }

    fn handle_initialize(&self, id: Option<Value>) -> JsonRpcResponse {
        let result = json!({
            "protocolVersion": PROTOCOL_VERSION,
            "serverInfo": ServerInfo {
                name: "linodemcp".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
            "capabilities": {
                "tools": {
                    "listChanged": false
                }
            }
        });
        JsonRpcResponse::success(id, result)
    }

    fn handle_list_tools(&self, id: Option<Value>) -> JsonRpcResponse {
        let result = ListToolsResponse {
            tools: self.dispatcher.registry().definitions(),
        };
        match serde_json::to_value(result) {
            Ok(result) => JsonRpcResponse::success(id, result),
            Err(e) => JsonRpcResponse::error(id, codes::INTERNAL_ERROR, e.to_string()),
        }
    }

    async fn handle_call_tool(
        &self,
        id: Option<Value>,
        params: Option<Value>,
        cancel: &CancellationToken,
    ) -> JsonRpcResponse {
        let params: CallToolParams = match params {
            Some(p) => match serde_json::from_value(p) {
                Ok(params) => params,
                Err(e) => {
                    return JsonRpcResponse::error(
                        id,
                        codes::INVALID_PARAMS,
                        format!("Invalid params: {e}"),
                    );
                }
            },
            None => return JsonRpcResponse::error(id, codes::INVALID_PARAMS, "Missing params"),
        };

        match self.dispatcher.dispatch(cancel, &params.name, params.arguments).await {
            Ok(result) => match serde_json::to_value(result.into_response()) {
                Ok(result) => JsonRpcResponse::success(id, result),
                Err(e) => JsonRpcResponse::error(id, codes::INTERNAL_ERROR, e.to_string()),
            },
            Err(ToolError::Cancelled) => {
                JsonRpcResponse::error(id, codes::REQUEST_CANCELLED, "Request cancelled")
            }
            Err(err) => {
                let data = serde_json::to_value(err.payload()).unwrap_or(Value::Null);
                JsonRpcResponse::error(id, codes::INTERNAL_ERROR, err.to_string()).with_data(data)
            }
        }
    }

    fn handle_cancelled(&self, params: Option<Value>) {
        let Some(params) = params.and_then(|p| serde_json::from_value::<CancelledParams>(p).ok())
        else {
            tracing::debug!("cancellation notification without a request id");
            return;
        };
        let key = params.request_id.to_string();
        match self.calls().get(&key) {
            Some(entry) => {
                tracing::info!(
                    request_id = %key,
                    reason = params.reason.as_deref().unwrap_or(""),
                    "cancelling request"
                );
                entry.cancel.cancel();
            }
            None => tracing::debug!(request_id = %key, "cancellation for unknown request"),
        }
    }

    fn handle_shutdown(&self, id: Option<Value>) -> JsonRpcResponse {
        tracing::info!("MCP server shutdown requested");
        JsonRpcResponse::success(id, Value::Null)
    }
}

async fn write_responses<W>(
    mut writer: W,
    mut rx: mpsc::Receiver<JsonRpcResponse>,
) -> Result<(), McpError>
where
    W: AsyncWrite + Unpin,
{
    while let Some(response) = rx.recv().await {
        let mut line = serde_json::to_vec(&response)?;
        line.push(b'\n');
        writer.write_all(&line).await?;
        writer.flush().await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accounts::AccountManager;
    use crate::catalog::default_registry;
    use linodemcp_client::fake::{FakeClient, FakeClientFactory};
    use std::time::Duration;

    fn server() -> McpServer {
        let factory = FakeClientFactory::new(Arc::new(FakeClient::new()));
        let accounts = AccountManager::new(Arc::new(factory), Duration::from_secs(300)).unwrap();
        let dispatcher = Dispatcher::new(default_registry().unwrap(), Arc::new(accounts));
        McpServer::new(McpConfig::default(), dispatcher)
    }

    #[tokio::test]
    async fn test_initialize() {
        let server = server();
        let request = JsonRpcRequest::new(1, "initialize", None);

        let response = server.handle_request(request).await.unwrap();
        let result = response.result.unwrap();
        assert_eq!(result["serverInfo"]["name"], "linodemcp");
        assert_eq!(result["protocolVersion"], PROTOCOL_VERSION);
        assert!(response.error.is_none());
    }

    #[tokio::test]
    async fn test_list_tools_sorted() {
        let server = server();
        let response = server
            .handle_request(JsonRpcRequest::new(1, "tools/list", None))
            .await
            .unwrap();
        let tools = response.result.unwrap()["tools"].as_array().unwrap().clone();
        let names: Vec<String> = tools
            .iter()
            .map(|t| t["name"].as_str().unwrap().to_string())
            .collect();
        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(names, sorted);
        assert!(tools[0].get("inputSchema").is_some());
    }

    #[tokio::test]
    async fn test_call_nonexistent_tool_is_tool_error() {
        let server = server();
        let request = JsonRpcRequest::new(
            1,
            "tools/call",
            Some(json!({
                "name": "nonexistent",
                "arguments": {}
            })),
        );

        let response = server.handle_request(request).await.unwrap();
        assert!(response.error.is_none());
        let result = response.result.unwrap();
        assert_eq!(result["isError"], json!(true));
        assert!(result["content"][0]["text"].as_str().unwrap().contains("nonexistent"));
    }

    #[tokio::test]
    async fn test_call_without_params() {
        let server = server();
        let response = server
            .handle_request(JsonRpcRequest::new(1, "tools/call", None))
            .await
            .unwrap();
        assert_eq!(response.error.unwrap().code, codes::INVALID_PARAMS);
    }

    #[tokio::test]
    async fn test_unknown_method() {
        let server = server();
        let response = server
            .handle_request(JsonRpcRequest::new(7, "resources/list", None))
            .await
            .unwrap();
        assert_eq!(response.error.unwrap().code, codes::METHOD_NOT_FOUND);
        assert_eq!(response.id, Some(json!(7)));
    }

    #[tokio::test]
    async fn test_notifications_get_no_response() {
        let server = server();
        let request: JsonRpcRequest = serde_json::from_value(json!({
            "jsonrpc": "2.0",
            "method": "notifications/initialized"
        }))
        .unwrap();
        assert!(server.handle_request(request).await.is_none());
        assert_eq!(server.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_ping() {
        let server = server();
        let response = server
            .handle_request(JsonRpcRequest::new("a", "ping", None))
            .await
            .unwrap();
        assert_eq!(response.result, Some(json!({})));
    }

    fn cancel_notification(id: Value) -> Option<Value> {
        Some(json!({ "requestId": id, "reason": "user" }))
    }

    #[test]
    fn test_reused_id_stays_cancellable_after_earlier_finishes() {
        let server = server();
        let request = JsonRpcRequest::new(1, "tools/call", None);

        let (first_key, first) = server.begin(&request);
        let (second_key, second) = server.begin(&request);
        server.finish(first_key);
        assert_eq!(server.in_flight(), 1);

        server.handle_cancelled(cancel_notification(json!(1)));
        assert!(second.is_cancelled());
        assert!(!first.is_cancelled());

        server.finish(second_key);
        assert_eq!(server.in_flight(), 0);
    }

    #[test]
    fn test_finish_removes_own_entry() {
        let server = server();
        let (key, cancel) = server.begin(&JsonRpcRequest::new("abc", "tools/call", None));
        assert_eq!(server.in_flight(), 1);

        server.finish(key);
        assert_eq!(server.in_flight(), 0);
        server.handle_cancelled(cancel_notification(json!("abc")));
        assert!(!cancel.is_cancelled());
    }
}
