//! Resource models returned by (and sent to) the REST API.
//!
//! Field names follow the API's JSON. Timestamps are kept as the strings the
//! API delivers (`YYYY-MM-DDTHH:MM:SS`); nothing here reformats them.

use serde::{Deserialize, Serialize};

/// One page of a paginated list endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    #[serde(default = "first_page")]
    pub page: u32,
    #[serde(default = "first_page")]
    pub pages: u32,
    #[serde(default)]
    pub results: u32,
}

fn first_page() -> u32 {
    1
}

// =============================================================================
// REFERENCE DATA
// =============================================================================

/// A datacenter region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub id: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub capabilities: Vec<String>,
}

/// Hourly and monthly price of an instance type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Price {
    #[serde(default)]
    pub hourly: f64,
    #[serde(default)]
    pub monthly: f64,
}

/// An instance type (plan).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstanceType {
    pub id: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub class: String,
    #[serde(default)]
    pub vcpus: u32,
    /// Memory in MB.
    #[serde(default)]
    pub memory: u64,
    /// Disk in MB.
    #[serde(default)]
    pub disk: u64,
    /// Monthly network transfer in GB.
    #[serde(default)]
    pub transfer: u64,
    #[serde(default)]
    pub price: Price,
}

/// A bootable kernel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Kernel {
    pub id: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub architecture: String,
    #[serde(default)]
    pub kvm: bool,
    #[serde(default)]
    pub pvops: bool,
    #[serde(default)]
    pub deprecated: bool,
    #[serde(default)]
    pub built: Option<String>,
}

// =============================================================================
// PROFILE
// =============================================================================

/// The profile of the user owning the token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub timezone: String,
    #[serde(default)]
    pub restricted: bool,
    #[serde(default)]
    pub two_factor_auth: bool,
}

// =============================================================================
// INSTANCES
// =============================================================================

/// Hardware allocation of an instance.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceSpecs {
    #[serde(default)]
    pub vcpus: u32,
    #[serde(default)]
    pub memory: u64,
    #[serde(default)]
    pub disk: u64,
    #[serde(default)]
    pub transfer: u64,
}

/// A compute instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instance {
    pub id: u64,
    pub label: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub region: String,
    #[serde(rename = "type", default)]
    pub instance_type: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub ipv4: Vec<String>,
    #[serde(default)]
    pub ipv6: Option<String>,
    #[serde(default)]
    pub specs: Option<InstanceSpecs>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub hypervisor: Option<String>,
    #[serde(default)]
    pub created: String,
    #[serde(default)]
    pub updated: String,
}

/// Body of an instance creation request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CreateInstanceRequest {
    pub region: String,
    #[serde(rename = "type")]
    pub instance_type: String,
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root_pass: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub authorized_keys: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub booted: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub private_ip: Option<bool>,
}

// =============================================================================
// DOMAINS
// =============================================================================

/// A DNS zone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Domain {
    pub id: u64,
    pub domain: String,
    #[serde(rename = "type", default)]
    pub domain_type: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub soa_email: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub ttl_sec: u32,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub created: String,
    #[serde(default)]
    pub updated: String,
}

/// Body of a domain creation request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CreateDomainRequest {
    pub domain: String,
    #[serde(rename = "type")]
    pub domain_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub soa_email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

/// A record inside a DNS zone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainRecord {
    pub id: u64,
    #[serde(rename = "type")]
    pub record_type: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub target: String,
    #[serde(default)]
    pub priority: u32,
    #[serde(default)]
    pub weight: u32,
    #[serde(default)]
    pub port: u32,
    #[serde(default)]
    pub ttl_sec: u32,
}

// =============================================================================
// FIREWALLS
// =============================================================================

/// Address lists a firewall rule matches.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FirewallAddresses {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ipv4: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ipv6: Option<Vec<String>>,
}

/// A single firewall rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FirewallRule {
    /// `ACCEPT` or `DROP`.
    pub action: String,
    /// `TCP`, `UDP`, `ICMP` or `IPENCAP`.
    pub protocol: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ports: Option<String>,
    #[serde(default)]
    pub addresses: FirewallAddresses,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// The full rule set of a firewall.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FirewallRules {
    pub inbound_policy: String,
    pub outbound_policy: String,
    #[serde(default)]
    pub inbound: Vec<FirewallRule>,
    #[serde(default)]
    pub outbound: Vec<FirewallRule>,
}

impl Default for FirewallRules {
    fn default() -> Self {
        Self {
            inbound_policy: "ACCEPT".to_string(),
            outbound_policy: "ACCEPT".to_string(),
            inbound: Vec::new(),
            outbound: Vec::new(),
        }
    }
}

/// A cloud firewall.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Firewall {
    pub id: u64,
    pub label: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub rules: FirewallRules,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub created: String,
    #[serde(default)]
    pub updated: String,
}

/// Body of a firewall creation request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CreateFirewallRequest {
    pub label: String,
    pub rules: FirewallRules,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

// =============================================================================
// DATABASES
// =============================================================================

/// Connection hosts of a managed database.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseHosts {
    #[serde(default)]
    pub primary: Option<String>,
    #[serde(default)]
    pub secondary: Option<String>,
}

/// A managed database cluster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Database {
    pub id: u64,
    pub label: String,
    #[serde(default)]
    pub engine: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub region: String,
    #[serde(default)]
    pub status: String,
    #[serde(rename = "type", default)]
    pub database_type: String,
    #[serde(default)]
    pub cluster_size: u32,
    #[serde(default)]
    pub hosts: DatabaseHosts,
    #[serde(default)]
    pub created: String,
    #[serde(default)]
    pub updated: String,
}

// =============================================================================
// NETWORKING
// =============================================================================

/// An IP address assigned to (or reserved by) the account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IpAddress {
    pub address: String,
    #[serde(rename = "type", default)]
    pub address_type: String,
    #[serde(default)]
    pub public: bool,
    #[serde(default)]
    pub linode_id: Option<u64>,
    #[serde(default)]
    pub region: String,
    #[serde(default)]
    pub gateway: Option<String>,
    #[serde(default)]
    pub prefix: u32,
    #[serde(default)]
    pub rdns: Option<String>,
}

/// A subnet inside a VPC.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VpcSubnet {
    pub id: u64,
    pub label: String,
    #[serde(default)]
    pub ipv4: Option<String>,
}

/// A virtual private cloud.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vpc {
    pub id: u64,
    pub label: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub region: String,
    #[serde(default)]
    pub subnets: Vec<VpcSubnet>,
    #[serde(default)]
    pub created: String,
    #[serde(default)]
    pub updated: String,
}

// =============================================================================
// STACKSCRIPTS
// =============================================================================

/// A deployment script.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackScript {
    pub id: u64,
    pub label: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub is_public: bool,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub deployments_total: u64,
    #[serde(default)]
    pub rev_note: Option<String>,
    #[serde(default)]
    pub script: Option<String>,
    #[serde(default)]
    pub created: String,
    #[serde(default)]
    pub updated: String,
}

/// Body of a StackScript creation request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CreateStackScriptRequest {
    pub label: String,
    pub script: String,
    pub images: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_public: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rev_note: Option<String>,
}
