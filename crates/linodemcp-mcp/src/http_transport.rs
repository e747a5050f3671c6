//! HTTP transport for MCP server.
//!
//! One JSON-RPC message per POST to `/mcp`. Requests share the server's
//! in-flight table with stdio, so `notifications/cancelled` posted on a second
//! connection cancels a call still running on the first.

use crate::error::McpError;
use crate::protocol::{JsonRpcRequest, JsonRpcResponse, codes};
use crate::server::McpServer;
use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;

/// Create the HTTP router for MCP.
pub fn create_router(server: Arc<McpServer>) -> Router {
    Router::new()
        .route("/mcp", post(handle_mcp_post))
        .route("/health", get(handle_health))
        .layer(TraceLayer::new_for_http())
        .with_state(server)
}

/// Handle POST requests to /mcp (JSON-RPC over HTTP).
async fn handle_mcp_post(
    State(server): State<Arc<McpServer>>,
    request: Result<Json<JsonRpcRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match request {
        Ok(request) => request,
        Err(rejection) => {
            let response = JsonRpcResponse::error(
                None,
                codes::PARSE_ERROR,
                format!("Parse error: {}", rejection.body_text()),
            );
            return (StatusCode::BAD_REQUEST, Json(response)).into_response();
        }
    };

    match server.handle_request(request).await {
        Some(response) => (StatusCode::OK, Json(response)).into_response(),
        None => StatusCode::ACCEPTED.into_response(),
    }
}

/// Handle health check requests.
async fn handle_health(State(server): State<Arc<McpServer>>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "linodemcp",
        "version": env!("CARGO_PKG_VERSION"),
        "tools": server.dispatcher().registry().len(),
    }))
}

/// HTTP server for MCP transport.
pub struct HttpServer {
    addr: String,
    server: Arc<McpServer>,
}

impl HttpServer {
    /// Create a new HTTP server bound to `addr` once run.
    pub fn new(addr: impl Into<String>, server: Arc<McpServer>) -> Self {
        Self {
            addr: addr.into(),
            server,
        }
    }

    /// Run the HTTP server until `shutdown` is cancelled.
    pub async fn run(self, shutdown: CancellationToken) -> Result<(), McpError> {
        let app = create_router(self.server);

        let listener = tokio::net::TcpListener::bind(&self.addr)
            .await
            .map_err(|e| {
                McpError::StartupFailed(format!("Failed to bind to {}: {e}", self.addr))
            })?;

        tracing::info!(addr = %self.addr, "MCP HTTP server listening");

        axum::serve(listener, app)
            .with_graceful_shutdown(async move { shutdown.cancelled().await })
            .await
            .map_err(|e| McpError::TransportError(e.to_string()))?;

        tracing::info!("MCP HTTP server stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accounts::AccountManager;
    use crate::catalog::default_registry;
    use crate::dispatcher::Dispatcher;
    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use linodemcp_client::fake::{FakeClient, FakeClientFactory};
    use linodemcp_core::McpConfig;
    use std::time::Duration;
    use tower::ServiceExt;

    fn app() -> Router {
        let factory = FakeClientFactory::new(Arc::new(FakeClient::new()));
        let accounts = AccountManager::new(Arc::new(factory), Duration::from_secs(300)).unwrap();
        let dispatcher = Dispatcher::new(default_registry().unwrap(), Arc::new(accounts));
        create_router(Arc::new(McpServer::new(McpConfig::default(), dispatcher)))
    }

    fn post(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/mcp")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let response = app()
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["service"], "linodemcp");
        assert_eq!(body["tools"], 30);
    }

    #[tokio::test]
    async fn test_post_ping() {
        let response = app()
            .oneshot(post(r#"{"jsonrpc":"2.0","id":1,"method":"ping"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["id"], 1);
        assert_eq!(body["result"], serde_json::json!({}));
    }

    #[tokio::test]
    async fn test_post_notification_is_accepted() {
        let response = app()
            .oneshot(post(r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::ACCEPTED);
    }

    #[tokio::test]
    async fn test_post_garbage_is_parse_error() {
        let response = app().oneshot(post("{not json")).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["error"]["code"], codes::PARSE_ERROR);
    }
}
