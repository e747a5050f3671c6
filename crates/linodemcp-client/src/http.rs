//! HTTP implementation of the upstream client.

use crate::api::*;
use crate::credential::Credential;
use crate::error::UpstreamError;
use crate::models::*;
use async_trait::async_trait;
use linodemcp_core::UpstreamConfig;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use reqwest::{RequestBuilder, Response};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;

const USER_AGENT: &str = concat!("linodemcp/", env!("CARGO_PKG_VERSION"));

/// Error body the API returns with non-success statuses.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    errors: Vec<ErrorEntry>,
}

#[derive(Debug, Deserialize)]
struct ErrorEntry {
    #[serde(default)]
    field: Option<String>,
    reason: String,
}

/// Client for the REST API bound to one credential.
pub struct HttpClient {
    http: reqwest::Client,
    base_url: String,
    page_size: u32,
}

impl HttpClient {
    /// Build a client. Fails when the token is unusable or the base URL is invalid.
    pub fn new(credential: &Credential, config: &UpstreamConfig) -> Result<Self, UpstreamError> {
        if credential.is_blank() {
            return Err(UpstreamError::InvalidCredential(
                "token is empty".to_string(),
            ));
        }

        reqwest::Url::parse(&config.base_url).map_err(|e| {
            UpstreamError::InvalidCredential(format!(
                "base URL '{}' is invalid: {e}",
                config.base_url
            ))
        })?;

        let mut auth = HeaderValue::from_str(&format!("Bearer {}", credential.expose()))
            .map_err(|_| {
                UpstreamError::InvalidCredential(
                    "token contains characters not allowed in a header".to_string(),
                )
            })?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| UpstreamError::InvalidCredential(e.to_string()))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            page_size: config.page_size,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, UpstreamError> {
        self.send(self.http.get(self.url(path))).await
    }

    async fn post<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &Value,
    ) -> Result<T, UpstreamError> {
        self.send(self.http.post(self.url(path)).json(body)).await
    }

    async fn post_unit(&self, path: &str, body: &Value) -> Result<(), UpstreamError> {
        self.send_unit(self.http.post(self.url(path)).json(body)).await
    }

    async fn delete(&self, path: &str) -> Result<(), UpstreamError> {
        self.send_unit(self.http.delete(self.url(path))).await
    }

    /// Fetch every page of a list endpoint, preserving upstream order.
    async fn list<T: DeserializeOwned>(
        &self,
        path: &str,
        filter: Option<&Value>,
    ) -> Result<Vec<T>, UpstreamError> {
        let mut items = Vec::new();
        let mut page = 1u32;

        loop {
            let mut request = self
                .http
                .get(self.url(path))
                .query(&[("page", page), ("page_size", self.page_size)]);
            if let Some(filter) = filter {
                request = request.header("X-Filter", filter.to_string());
            }

            let body: Page<T> = self.send(request).await?;
            items.extend(body.data);

            page += 1;
            if page > body.pages {
                break;
            }
        }

        tracing::debug!(path, count = items.len(), "listed upstream resources");
        Ok(items)
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, UpstreamError> {
        let response = check_status(request.send().await?).await?;
        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| UpstreamError::Decode(e.to_string()))
    }

    async fn send_unit(&self, request: RequestBuilder) -> Result<(), UpstreamError> {
        check_status(request.send().await?).await?;
        Ok(())
    }
}

/// Turn a non-success response into [`UpstreamError::Api`], keeping the
/// upstream reasons verbatim.
async fn check_status(response: Response) -> Result<Response, UpstreamError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let reasons: Vec<String> = serde_json::from_str::<ErrorBody>(&body)
        .map(|parsed| {
            parsed
                .errors
                .into_iter()
                .map(|e| match e.field {
                    Some(field) => format!("{field}: {}", e.reason),
                    None => e.reason,
                })
                .collect()
        })
        .unwrap_or_default();

    let reasons = if reasons.is_empty() {
        vec![status.canonical_reason().unwrap_or("unknown error").to_string()]
    } else {
        reasons
    };

    tracing::debug!(status = status.as_u16(), ?reasons, "upstream request failed");
    Err(UpstreamError::Api {
        status: status.as_u16(),
        reasons,
    })
}

fn to_body<T: serde::Serialize>(value: &T) -> Result<Value, UpstreamError> {
    serde_json::to_value(value).map_err(|e| UpstreamError::Decode(e.to_string()))
}

fn config_body(config_id: Option<u64>) -> Value {
    match config_id {
        Some(id) => json!({ "config_id": id }),
        None => json!({}),
    }
}

#[async_trait]
impl ReferenceApi for HttpClient {
    async fn list_regions(&self) -> Result<Vec<Region>, UpstreamError> {
        self.list("regions", None).await
    }

    async fn list_types(&self) -> Result<Vec<InstanceType>, UpstreamError> {
        self.list("linode/types", None).await
    }

    async fn list_kernels(&self) -> Result<Vec<Kernel>, UpstreamError> {
        self.list("linode/kernels", None).await
    }
}

#[async_trait]
impl ProfileApi for HttpClient {
    async fn get_profile(&self) -> Result<Profile, UpstreamError> {
        self.get("profile").await
    }
}

#[async_trait]
impl InstanceApi for HttpClient {
    async fn list_instances(&self) -> Result<Vec<Instance>, UpstreamError> {
        self.list("linode/instances", None).await
    }

    async fn get_instance(&self, id: u64) -> Result<Instance, UpstreamError> {
        self.get(&format!("linode/instances/{id}")).await
    }

    async fn create_instance(
        &self,
        request: &CreateInstanceRequest,
    ) -> Result<Instance, UpstreamError> {
        self.post("linode/instances", &to_body(request)?).await
    }

    async fn delete_instance(&self, id: u64) -> Result<(), UpstreamError> {
        self.delete(&format!("linode/instances/{id}")).await
    }

    async fn boot_instance(&self, id: u64, config_id: Option<u64>) -> Result<(), UpstreamError> {
        self.post_unit(&format!("linode/instances/{id}/boot"), &config_body(config_id))
            .await
    }

    async fn reboot_instance(
        &self,
        id: u64,
        config_id: Option<u64>,
    ) -> Result<(), UpstreamError> {
        self.post_unit(&format!("linode/instances/{id}/reboot"), &config_body(config_id))
            .await
    }

    async fn shutdown_instance(&self, id: u64) -> Result<(), UpstreamError> {
        self.post_unit(&format!("linode/instances/{id}/shutdown"), &json!({}))
            .await
    }
}

#[async_trait]
impl DomainApi for HttpClient {
    async fn list_domains(&self) -> Result<Vec<Domain>, UpstreamError> {
        self.list("domains", None).await
    }

    async fn get_domain(&self, id: u64) -> Result<Domain, UpstreamError> {
        self.get(&format!("domains/{id}")).await
    }

    async fn create_domain(&self, request: &CreateDomainRequest) -> Result<Domain, UpstreamError> {
        self.post("domains", &to_body(request)?).await
    }

    async fn delete_domain(&self, id: u64) -> Result<(), UpstreamError> {
        self.delete(&format!("domains/{id}")).await
    }

    async fn list_domain_records(
        &self,
        domain_id: u64,
    ) -> Result<Vec<DomainRecord>, UpstreamError> {
        self.list(&format!("domains/{domain_id}/records"), None).await
    }
}

#[async_trait]
impl FirewallApi for HttpClient {
    async fn list_firewalls(&self) -> Result<Vec<Firewall>, UpstreamError> {
        self.list("networking/firewalls", None).await
    }

    async fn get_firewall(&self, id: u64) -> Result<Firewall, UpstreamError> {
        self.get(&format!("networking/firewalls/{id}")).await
    }

    async fn create_firewall(
        &self,
        request: &CreateFirewallRequest,
    ) -> Result<Firewall, UpstreamError> {
        self.post("networking/firewalls", &to_body(request)?).await
    }

    async fn update_firewall_rules(
        &self,
        id: u64,
        rules: &FirewallRules,
    ) -> Result<FirewallRules, UpstreamError> {
        let request = self
            .http
            .put(self.url(&format!("networking/firewalls/{id}/rules")))
            .json(&to_body(rules)?);
        self.send(request).await
    }

    async fn delete_firewall(&self, id: u64) -> Result<(), UpstreamError> {
        self.delete(&format!("networking/firewalls/{id}")).await
    }
}

#[async_trait]
impl DatabaseApi for HttpClient {
    async fn list_databases(&self) -> Result<Vec<Database>, UpstreamError> {
        self.list("databases/instances", None).await
    }
}

#[async_trait]
impl NetworkingApi for HttpClient {
    async fn list_ip_addresses(&self) -> Result<Vec<IpAddress>, UpstreamError> {
        self.list("networking/ips", None).await
    }

    async fn list_vpcs(&self) -> Result<Vec<Vpc>, UpstreamError> {
        self.list("vpcs", None).await
    }
}

#[async_trait]
impl StackScriptApi for HttpClient {
    async fn list_stackscripts(&self, mine: bool) -> Result<Vec<StackScript>, UpstreamError> {
        let filter = mine.then(|| json!({ "mine": true }));
        self.list("linode/stackscripts", filter.as_ref()).await
    }

    async fn get_stackscript(&self, id: u64) -> Result<StackScript, UpstreamError> {
        self.get(&format!("linode/stackscripts/{id}")).await
    }

    async fn create_stackscript(
        &self,
        request: &CreateStackScriptRequest,
    ) -> Result<StackScript, UpstreamError> {
        self.post("linode/stackscripts", &to_body(request)?).await
    }

    async fn delete_stackscript(&self, id: u64) -> Result<(), UpstreamError> {
        self.delete(&format!("linode/stackscripts/{id}")).await
    }
}

/// Builds [`HttpClient`]s that share one upstream configuration.
#[derive(Debug, Clone)]
pub struct HttpClientFactory {
    config: UpstreamConfig,
}

impl HttpClientFactory {
    /// Create a factory for the given upstream settings.
    pub fn new(config: UpstreamConfig) -> Self {
        Self { config }
    }
}

impl ClientFactory for HttpClientFactory {
    fn connect(&self, credential: &Credential) -> Result<Arc<dyn UpstreamClient>, UpstreamError> {
        Ok(Arc::new(HttpClient::new(credential, &self.config)?))
    }
}
