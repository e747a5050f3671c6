//! Capability traits, one per resource family.

use crate::credential::Credential;
use crate::error::UpstreamError;
use crate::models::*;
use async_trait::async_trait;
use std::sync::Arc;

/// Slow-changing catalogs that are safe to memoize.
#[async_trait]
pub trait ReferenceApi: Send + Sync {
    async fn list_regions(&self) -> Result<Vec<Region>, UpstreamError>;
    async fn list_types(&self) -> Result<Vec<InstanceType>, UpstreamError>;
    async fn list_kernels(&self) -> Result<Vec<Kernel>, UpstreamError>;
}

#[async_trait]
pub trait ProfileApi: Send + Sync {
    async fn get_profile(&self) -> Result<Profile, UpstreamError>;
}

#[async_trait]
pub trait InstanceApi: Send + Sync {
    async fn list_instances(&self) -> Result<Vec<Instance>, UpstreamError>;
    async fn get_instance(&self, id: u64) -> Result<Instance, UpstreamError>;
    async fn create_instance(
        &self,
        request: &CreateInstanceRequest,
    ) -> Result<Instance, UpstreamError>;
    async fn delete_instance(&self, id: u64) -> Result<(), UpstreamError>;
    /// Boot with the given config profile, or the last-used one when `None`.
    async fn boot_instance(&self, id: u64, config_id: Option<u64>) -> Result<(), UpstreamError>;
    async fn reboot_instance(&self, id: u64, config_id: Option<u64>)
    -> Result<(), UpstreamError>;
    async fn shutdown_instance(&self, id: u64) -> Result<(), UpstreamError>;
}

#[async_trait]
pub trait DomainApi: Send + Sync {
    async fn list_domains(&self) -> Result<Vec<Domain>, UpstreamError>;
    async fn get_domain(&self, id: u64) -> Result<Domain, UpstreamError>;
    async fn create_domain(&self, request: &CreateDomainRequest) -> Result<Domain, UpstreamError>;
    async fn delete_domain(&self, id: u64) -> Result<(), UpstreamError>;
    async fn list_domain_records(&self, domain_id: u64)
    -> Result<Vec<DomainRecord>, UpstreamError>;
}

#[async_trait]
pub trait FirewallApi: Send + Sync {
    async fn list_firewalls(&self) -> Result<Vec<Firewall>, UpstreamError>;
    async fn get_firewall(&self, id: u64) -> Result<Firewall, UpstreamError>;
    async fn create_firewall(
        &self,
        request: &CreateFirewallRequest,
    ) -> Result<Firewall, UpstreamError>;
    /// Replace the whole rule set; returns the rules as stored upstream.
    async fn update_firewall_rules(
        &self,
        id: u64,
        rules: &FirewallRules,
    ) -> Result<FirewallRules, UpstreamError>;
    async fn delete_firewall(&self, id: u64) -> Result<(), UpstreamError>;
}

#[async_trait]
pub trait DatabaseApi: Send + Sync {
    /// Managed databases of every engine.
    async fn list_databases(&self) -> Result<Vec<Database>, UpstreamError>;
}

#[async_trait]
pub trait NetworkingApi: Send + Sync {
    async fn list_ip_addresses(&self) -> Result<Vec<IpAddress>, UpstreamError>;
    async fn list_vpcs(&self) -> Result<Vec<Vpc>, UpstreamError>;
}

#[async_trait]
pub trait StackScriptApi: Send + Sync {
    /// List StackScripts; `mine` restricts the listing to the caller's own.
    async fn list_stackscripts(&self, mine: bool) -> Result<Vec<StackScript>, UpstreamError>;
    async fn get_stackscript(&self, id: u64) -> Result<StackScript, UpstreamError>;
    async fn create_stackscript(
        &self,
        request: &CreateStackScriptRequest,
    ) -> Result<StackScript, UpstreamError>;
    async fn delete_stackscript(&self, id: u64) -> Result<(), UpstreamError>;
}

/// Every resource family against one cloud account.
///
/// Implementations must be safe for concurrent use by many handlers.
pub trait UpstreamClient:
    ReferenceApi
    + ProfileApi
    + InstanceApi
    + DomainApi
    + FirewallApi
    + DatabaseApi
    + NetworkingApi
    + StackScriptApi
{
}

impl<T> UpstreamClient for T where
    T: ReferenceApi
        + ProfileApi
        + InstanceApi
        + DomainApi
        + FirewallApi
        + DatabaseApi
        + NetworkingApi
        + StackScriptApi
{
}

/// Builds clients from credentials.
pub trait ClientFactory: Send + Sync {
    /// Construct a client bound to `credential`. Does no network I/O.
    fn connect(&self, credential: &Credential) -> Result<Arc<dyn UpstreamClient>, UpstreamError>;
}
