//! HTTP client tests against a local stand-in for the REST API.

use axum::extract::{Path, Query};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use linodemcp_client::{
    Credential, DomainApi, HttpClient, InstanceApi, ReferenceApi, StackScriptApi, UpstreamError,
};
use linodemcp_core::UpstreamConfig;
use serde::Deserialize;
use serde_json::{Value, json};

#[derive(Debug, Deserialize)]
struct PageQuery {
    page: u32,
    page_size: u32,
}

async fn regions(headers: HeaderMap, Query(query): Query<PageQuery>) -> (StatusCode, Json<Value>) {
    let authorized = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        == Some("Bearer test-token");
    if !authorized {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({"errors": [{"reason": "Invalid Token"}]})),
        );
    }

    assert_eq!(query.page_size, 25);
    let data = match query.page {
        1 => json!([{"id": "us-east", "label": "Newark, NJ", "country": "us"}]),
        _ => json!([{"id": "us-west", "label": "Fremont, CA", "country": "us"}]),
    };
    (
        StatusCode::OK,
        Json(json!({"data": data, "page": query.page, "pages": 2, "results": 2})),
    )
}

async fn instance(Path(id): Path<u64>) -> (StatusCode, Json<Value>) {
    if id == 7 {
        return (
            StatusCode::OK,
            Json(json!({
                "id": 7,
                "label": "web-7",
                "status": "running",
                "region": "us-east",
                "type": "g6-nanode-1",
                "created": "2024-05-01T10:00:00",
                "updated": "2024-05-01T10:00:00"
            })),
        );
    }
    (
        StatusCode::NOT_FOUND,
        Json(json!({"errors": [{"reason": "Not found"}]})),
    )
}

async fn create_domain(Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    if body["domain"] == "bad" {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"errors": [{"field": "domain", "reason": "Invalid domain name"}]})),
        );
    }
    (
        StatusCode::OK,
        Json(json!({"id": 1, "domain": body["domain"], "type": body["type"]})),
    )
}

async fn stackscripts(headers: HeaderMap) -> Json<Value> {
    let filter = headers
        .get("x-filter")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();
    let label = if filter.contains("mine") { "mine" } else { "all" };
    Json(json!({"data": [{"id": 1, "label": label}], "page": 1, "pages": 1, "results": 1}))
}

async fn spawn_upstream() -> String {
    let app = Router::new()
        .route("/v4/regions", get(regions))
        .route("/v4/linode/instances/{id}", get(instance))
        .route("/v4/domains", post(create_domain))
        .route("/v4/linode/stackscripts", get(stackscripts));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}/v4")
}

fn client(base_url: &str, token: &str) -> HttpClient {
    let config = UpstreamConfig {
        base_url: base_url.to_string(),
        timeout_secs: 5,
        page_size: 25,
    };
    HttpClient::new(&Credential::new(token), &config).unwrap()
}

#[tokio::test]
async fn test_list_follows_pagination_in_order() {
    let base = spawn_upstream().await;
    let regions = client(&base, "test-token").list_regions().await.unwrap();
    let ids: Vec<_> = regions.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["us-east", "us-west"]);
}

#[tokio::test]
async fn test_error_reasons_are_verbatim() {
    let base = spawn_upstream().await;
    let err = client(&base, "wrong-token").list_regions().await.unwrap_err();
    assert_eq!(
        err,
        UpstreamError::Api {
            status: 401,
            reasons: vec!["Invalid Token".to_string()]
        }
    );
}

#[tokio::test]
async fn test_get_and_not_found() {
    let base = spawn_upstream().await;
    let client = client(&base, "test-token");

    let found = client.get_instance(7).await.unwrap();
    assert_eq!(found.label, "web-7");
    assert_eq!(found.instance_type.as_deref(), Some("g6-nanode-1"));

    let missing = client.get_instance(8).await.unwrap_err();
    assert!(missing.is_not_found());
}

#[tokio::test]
async fn test_field_errors_are_prefixed() {
    let base = spawn_upstream().await;
    let request = linodemcp_client::CreateDomainRequest {
        domain: "bad".into(),
        domain_type: "master".into(),
        ..Default::default()
    };
    let err = client(&base, "test-token")
        .create_domain(&request)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("domain: Invalid domain name"));
}

#[tokio::test]
async fn test_stackscript_filter_header() {
    let base = spawn_upstream().await;
    let client = client(&base, "test-token");
    assert_eq!(client.list_stackscripts(true).await.unwrap()[0].label, "mine");
    assert_eq!(client.list_stackscripts(false).await.unwrap()[0].label, "all");
}
