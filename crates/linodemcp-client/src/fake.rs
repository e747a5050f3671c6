//! In-memory upstream for tests.
//!
//! [`FakeClient`] serves canned data, counts every operation, and can be told
//! to fail, to add latency, or to stall reference fetches until released.

use crate::api::*;
use crate::credential::Credential;
use crate::error::UpstreamError;
use crate::models::*;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::watch;

#[derive(Debug, Default)]
struct FakeState {
    profile: Option<Profile>,
    regions: Vec<Region>,
    types: Vec<InstanceType>,
    kernels: Vec<Kernel>,
    instances: Vec<Instance>,
    domains: Vec<Domain>,
    records: HashMap<u64, Vec<DomainRecord>>,
    firewalls: Vec<Firewall>,
    databases: Vec<Database>,
    ips: Vec<IpAddress>,
    vpcs: Vec<Vpc>,
    stackscripts: Vec<StackScript>,
    failure: Option<UpstreamError>,
    latency: Option<Duration>,
    calls: HashMap<&'static str, usize>,
    log: Vec<String>,
}

/// In-memory [`UpstreamClient`].
pub struct FakeClient {
    state: Mutex<FakeState>,
    stalled: watch::Sender<bool>,
    next_id: AtomicU64,
}

impl Default for FakeClient {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeClient {
    /// A client with a small, fixed catalog of every resource family.
    pub fn new() -> Self {
        let state = FakeState {
            profile: Some(Profile {
                username: "tester".into(),
                email: "tester@example.com".into(),
                timezone: "UTC".into(),
                restricted: false,
                two_factor_auth: true,
            }),
            regions: vec![region("us-east", "Newark, NJ"), region("us-west", "Fremont, CA")],
            types: vec![
                instance_type("g6-nanode-1", "Nanode 1GB", "nanode", 1, 1024),
                instance_type("g6-standard-2", "Linode 4GB", "standard", 2, 4096),
            ],
            kernels: vec![
                kernel("linode/grub2", "GRUB 2", "x86_64"),
                kernel("linode/direct-disk", "Direct Disk", "x86_64"),
            ],
            instances: vec![
                instance(101, "web-1", "running"),
                instance(102, "db-1", "offline"),
            ],
            domains: vec![Domain {
                id: 201,
                domain: "example.com".into(),
                domain_type: "master".into(),
                status: "active".into(),
                soa_email: Some("admin@example.com".into()),
                description: None,
                ttl_sec: 300,
                tags: vec![],
                created: "2024-01-01T00:00:00".into(),
                updated: "2024-01-01T00:00:00".into(),
            }],
            records: HashMap::from([(
                201,
                vec![DomainRecord {
                    id: 301,
                    record_type: "A".into(),
                    name: "www".into(),
                    target: "203.0.113.10".into(),
                    priority: 0,
                    weight: 0,
                    port: 0,
                    ttl_sec: 300,
                }],
            )]),
            firewalls: vec![Firewall {
                id: 401,
                label: "edge".into(),
                status: "enabled".into(),
                rules: FirewallRules {
                    inbound_policy: "DROP".into(),
                    outbound_policy: "ACCEPT".into(),
                    inbound: vec![FirewallRule {
                        action: "ACCEPT".into(),
                        protocol: "TCP".into(),
                        ports: Some("22".into()),
                        addresses: FirewallAddresses {
                            ipv4: Some(vec!["0.0.0.0/0".into()]),
                            ipv6: None,
                        },
                        label: Some("ssh".into()),
                        description: None,
                    }],
                    outbound: vec![],
                },
                tags: vec![],
                created: "2024-01-01T00:00:00".into(),
                updated: "2024-01-01T00:00:00".into(),
            }],
            databases: vec![Database {
                id: 501,
                label: "orders".into(),
                engine: "postgresql".into(),
                version: "16".into(),
                region: "us-east".into(),
                status: "active".into(),
                database_type: "g6-dedicated-2".into(),
                cluster_size: 1,
                hosts: DatabaseHosts {
                    primary: Some("orders.example.net".into()),
                    secondary: None,
                },
                created: "2024-01-01T00:00:00".into(),
                updated: "2024-01-01T00:00:00".into(),
            }],
            ips: vec![
                IpAddress {
                    address: "203.0.113.10".into(),
                    address_type: "ipv4".into(),
                    public: true,
                    linode_id: Some(101),
                    region: "us-east".into(),
                    gateway: Some("203.0.113.1".into()),
                    prefix: 24,
                    rdns: None,
                },
                IpAddress {
                    address: "192.168.128.5".into(),
                    address_type: "ipv4".into(),
                    public: false,
                    linode_id: None,
                    region: "us-east".into(),
                    gateway: None,
                    prefix: 17,
                    rdns: None,
                },
            ],
            vpcs: vec![Vpc {
                id: 601,
                label: "internal".into(),
                description: None,
                region: "us-east".into(),
                subnets: vec![VpcSubnet {
                    id: 602,
                    label: "apps".into(),
                    ipv4: Some("10.0.0.0/24".into()),
                }],
                created: "2024-01-01T00:00:00".into(),
                updated: "2024-01-01T00:00:00".into(),
            }],
            stackscripts: vec![StackScript {
                id: 701,
                label: "bootstrap".into(),
                username: "tester".into(),
                description: Some("Initial setup".into()),
                is_public: false,
                images: vec!["linode/debian12".into()],
                deployments_total: 3,
                rev_note: None,
                script: Some("#!/bin/bash\necho hi".into()),
                created: "2024-01-01T00:00:00".into(),
                updated: "2024-01-01T00:00:00".into(),
            }],
            ..Default::default()
        };

        Self {
            state: Mutex::new(state),
            stalled: watch::Sender::new(false),
            next_id: AtomicU64::new(1000),
        }
    }

    /// Replace the region catalog.
    pub fn with_regions(self, regions: Vec<Region>) -> Self {
        self.lock().regions = regions;
        self
    }

    /// Delay every operation by `latency`.
    pub fn with_latency(self, latency: Duration) -> Self {
        self.lock().latency = Some(latency);
        self
    }

    /// Make every subsequent operation fail with `error` (or succeed again with `None`).
    pub fn set_failure(&self, error: Option<UpstreamError>) {
        self.lock().failure = error;
    }

    /// Replace the region catalog in place.
    pub fn set_regions(&self, regions: Vec<Region>) {
        self.lock().regions = regions;
    }

    /// Block reference fetches until [`release`](Self::release) is called.
    pub fn stall(&self) {
        self.stalled.send_replace(true);
    }

    /// Let stalled reference fetches continue.
    pub fn release(&self) {
        self.stalled.send_replace(false);
    }

    /// How many times `operation` was invoked.
    pub fn calls(&self, operation: &str) -> usize {
        self.lock().calls.get(operation).copied().unwrap_or(0)
    }

    /// Mutating operations in invocation order, e.g. `delete_instance:101`.
    pub fn mutations(&self) -> Vec<String> {
        self.lock().log.clone()
    }

    fn lock(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Count the call, then apply latency and any configured failure.
    async fn enter(&self, operation: &'static str) -> Result<(), UpstreamError> {
        let (latency, failure) = {
            let mut state = self.lock();
            *state.calls.entry(operation).or_default() += 1;
            (state.latency, state.failure.clone())
        };
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
        match failure {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    async fn enter_reference(&self, operation: &'static str) -> Result<(), UpstreamError> {
        let mut stalled = self.stalled.subscribe();
        let _ = stalled.wait_for(|stalled| !*stalled).await;
        self.enter(operation).await
    }

    fn record(&self, entry: String) {
        self.lock().log.push(entry);
    }

    fn allocate_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }
}

fn not_found() -> UpstreamError {
    UpstreamError::Api {
        status: 404,
        reasons: vec!["Not found".to_string()],
    }
}

fn find<T: Clone>(items: &[T], pred: impl Fn(&T) -> bool) -> Result<T, UpstreamError> {
    items.iter().find(|item| pred(item)).cloned().ok_or_else(not_found)
}

fn remove<T>(items: &mut Vec<T>, pred: impl Fn(&T) -> bool) -> Result<(), UpstreamError> {
    let before = items.len();
    items.retain(|item| !pred(item));
    if items.len() == before {
        Err(not_found())
    } else {
        Ok(())
    }
}

/// A region with the given id and label.
pub fn region(id: &str, label: &str) -> Region {
    Region {
        id: id.to_string(),
        label: label.to_string(),
        country: "us".to_string(),
        status: "ok".to_string(),
        capabilities: vec!["Linodes".to_string()],
    }
}

fn instance_type(id: &str, label: &str, class: &str, vcpus: u32, memory: u64) -> InstanceType {
    InstanceType {
        id: id.to_string(),
        label: label.to_string(),
        class: class.to_string(),
        vcpus,
        memory,
        disk: memory * 25,
        transfer: 1000,
        price: Price {
            hourly: 0.0075 * f64::from(vcpus),
            monthly: 5.0 * f64::from(vcpus),
        },
    }
}

fn kernel(id: &str, label: &str, architecture: &str) -> Kernel {
    Kernel {
        id: id.to_string(),
        label: label.to_string(),
        version: "2.00".to_string(),
        architecture: architecture.to_string(),
        kvm: true,
        pvops: false,
        deprecated: false,
        built: None,
    }
}

fn instance(id: u64, label: &str, status: &str) -> Instance {
    Instance {
        id,
        label: label.to_string(),
        status: status.to_string(),
        region: "us-east".to_string(),
        instance_type: Some("g6-nanode-1".to_string()),
        image: Some("linode/debian12".to_string()),
        ipv4: vec![format!("203.0.113.{}", id % 256)],
        ipv6: None,
        specs: Some(InstanceSpecs {
            vcpus: 1,
            memory: 1024,
            disk: 25600,
            transfer: 1000,
        }),
        tags: vec![],
        hypervisor: Some("kvm".to_string()),
        created: "2024-01-01T00:00:00".to_string(),
        updated: "2024-01-01T00:00:00".to_string(),
    }
}

#[async_trait]
impl ReferenceApi for FakeClient {
    async fn list_regions(&self) -> Result<Vec<Region>, UpstreamError> {
        self.enter_reference("list_regions").await?;
        Ok(self.lock().regions.clone())
    }

    async fn list_types(&self) -> Result<Vec<InstanceType>, UpstreamError> {
        self.enter_reference("list_types").await?;
        Ok(self.lock().types.clone())
    }

    async fn list_kernels(&self) -> Result<Vec<Kernel>, UpstreamError> {
        self.enter_reference("list_kernels").await?;
        Ok(self.lock().kernels.clone())
    }
}

#[async_trait]
impl ProfileApi for FakeClient {
    async fn get_profile(&self) -> Result<Profile, UpstreamError> {
        self.enter("get_profile").await?;
        self.lock().profile.clone().ok_or_else(not_found)
    }
}

#[async_trait]
impl InstanceApi for FakeClient {
    async fn list_instances(&self) -> Result<Vec<Instance>, UpstreamError> {
        self.enter("list_instances").await?;
        Ok(self.lock().instances.clone())
    }

    async fn get_instance(&self, id: u64) -> Result<Instance, UpstreamError> {
        self.enter("get_instance").await?;
        find(&self.lock().instances, |i| i.id == id)
    }

    async fn create_instance(
        &self,
        request: &CreateInstanceRequest,
    ) -> Result<Instance, UpstreamError> {
        self.enter("create_instance").await?;
        let mut created = instance(self.allocate_id(), &request.label, "provisioning");
        created.region = request.region.clone();
        created.instance_type = Some(request.instance_type.clone());
        created.image = request.image.clone();
        created.tags = request.tags.clone();
        self.lock().instances.push(created.clone());
        self.record(format!("create_instance:{}", request.label));
        Ok(created)
    }

    async fn delete_instance(&self, id: u64) -> Result<(), UpstreamError> {
        self.enter("delete_instance").await?;
        remove(&mut self.lock().instances, |i| i.id == id)?;
        self.record(format!("delete_instance:{id}"));
        Ok(())
    }

    async fn boot_instance(&self, id: u64, config_id: Option<u64>) -> Result<(), UpstreamError> {
        self.enter("boot_instance").await?;
        find(&self.lock().instances, |i| i.id == id)?;
        self.record(format!("boot_instance:{id}:{}", config_id.unwrap_or(0)));
        Ok(())
    }

    async fn reboot_instance(
        &self,
        id: u64,
        config_id: Option<u64>,
    ) -> Result<(), UpstreamError> {
        self.enter("reboot_instance").await?;
        find(&self.lock().instances, |i| i.id == id)?;
        self.record(format!("reboot_instance:{id}:{}", config_id.unwrap_or(0)));
        Ok(())
    }

    async fn shutdown_instance(&self, id: u64) -> Result<(), UpstreamError> {
        self.enter("shutdown_instance").await?;
        find(&self.lock().instances, |i| i.id == id)?;
        self.record(format!("shutdown_instance:{id}"));
        Ok(())
    }
}

#[async_trait]
impl DomainApi for FakeClient {
    async fn list_domains(&self) -> Result<Vec<Domain>, UpstreamError> {
        self.enter("list_domains").await?;
        Ok(self.lock().domains.clone())
    }

    async fn get_domain(&self, id: u64) -> Result<Domain, UpstreamError> {
        self.enter("get_domain").await?;
        find(&self.lock().domains, |d| d.id == id)
    }

    async fn create_domain(&self, request: &CreateDomainRequest) -> Result<Domain, UpstreamError> {
        self.enter("create_domain").await?;
        let created = Domain {
            id: self.allocate_id(),
            domain: request.domain.clone(),
            domain_type: request.domain_type.clone(),
            status: "active".into(),
            soa_email: request.soa_email.clone(),
            description: request.description.clone(),
            ttl_sec: 0,
            tags: request.tags.clone(),
            created: "2024-06-01T12:00:00".into(),
            updated: "2024-06-01T12:00:00".into(),
        };
        self.lock().domains.push(created.clone());
        self.record(format!("create_domain:{}", request.domain));
        Ok(created)
    }

    async fn delete_domain(&self, id: u64) -> Result<(), UpstreamError> {
        self.enter("delete_domain").await?;
        remove(&mut self.lock().domains, |d| d.id == id)?;
        self.record(format!("delete_domain:{id}"));
        Ok(())
    }

    async fn list_domain_records(
        &self,
        domain_id: u64,
    ) -> Result<Vec<DomainRecord>, UpstreamError> {
        self.enter("list_domain_records").await?;
        self.lock().records.get(&domain_id).cloned().ok_or_else(not_found)
    }
}

#[async_trait]
impl FirewallApi for FakeClient {
    async fn list_firewalls(&self) -> Result<Vec<Firewall>, UpstreamError> {
        self.enter("list_firewalls").await?;
        Ok(self.lock().firewalls.clone())
    }

    async fn get_firewall(&self, id: u64) -> Result<Firewall, UpstreamError> {
        self.enter("get_firewall").await?;
        find(&self.lock().firewalls, |f| f.id == id)
    }

    async fn create_firewall(
        &self,
        request: &CreateFirewallRequest,
    ) -> Result<Firewall, UpstreamError> {
        self.enter("create_firewall").await?;
        let created = Firewall {
            id: self.allocate_id(),
            label: request.label.clone(),
            status: "enabled".into(),
            rules: request.rules.clone(),
            tags: request.tags.clone(),
            created: "2024-06-01T12:00:00".into(),
            updated: "2024-06-01T12:00:00".into(),
        };
        self.lock().firewalls.push(created.clone());
        self.record(format!("create_firewall:{}", request.label));
        Ok(created)
    }

    async fn update_firewall_rules(
        &self,
        id: u64,
        rules: &FirewallRules,
    ) -> Result<FirewallRules, UpstreamError> {
        self.enter("update_firewall_rules").await?;
        let mut state = self.lock();
        let firewall = state
            .firewalls
            .iter_mut()
            .find(|f| f.id == id)
            .ok_or_else(not_found)?;
        firewall.rules = rules.clone();
        state.log.push(format!("update_firewall_rules:{id}"));
        Ok(rules.clone())
    }

    async fn delete_firewall(&self, id: u64) -> Result<(), UpstreamError> {
        self.enter("delete_firewall").await?;
        remove(&mut self.lock().firewalls, |f| f.id == id)?;
        self.record(format!("delete_firewall:{id}"));
        Ok(())
    }
}

#[async_trait]
impl DatabaseApi for FakeClient {
    async fn list_databases(&self) -> Result<Vec<Database>, UpstreamError> {
        self.enter("list_databases").await?;
        Ok(self.lock().databases.clone())
    }
}

#[async_trait]
impl NetworkingApi for FakeClient {
    async fn list_ip_addresses(&self) -> Result<Vec<IpAddress>, UpstreamError> {
        self.enter("list_ip_addresses").await?;
        Ok(self.lock().ips.clone())
    }

    async fn list_vpcs(&self) -> Result<Vec<Vpc>, UpstreamError> {
        self.enter("list_vpcs").await?;
        Ok(self.lock().vpcs.clone())
    }
}

#[async_trait]
impl StackScriptApi for FakeClient {
    async fn list_stackscripts(&self, mine: bool) -> Result<Vec<StackScript>, UpstreamError> {
        self.enter("list_stackscripts").await?;
        let state = self.lock();
        let username = state
            .profile
            .as_ref()
            .map(|p| p.username.clone())
            .unwrap_or_default();
        Ok(state
            .stackscripts
            .iter()
            .filter(|s| !mine || s.username == username)
            .cloned()
            .collect())
    }

    async fn get_stackscript(&self, id: u64) -> Result<StackScript, UpstreamError> {
        self.enter("get_stackscript").await?;
        find(&self.lock().stackscripts, |s| s.id == id)
    }

    async fn create_stackscript(
        &self,
        request: &CreateStackScriptRequest,
    ) -> Result<StackScript, UpstreamError> {
        self.enter("create_stackscript").await?;
        let created = StackScript {
            id: self.allocate_id(),
            label: request.label.clone(),
            username: "tester".into(),
            description: request.description.clone(),
            is_public: request.is_public.unwrap_or(false),
            images: request.images.clone(),
            deployments_total: 0,
            rev_note: request.rev_note.clone(),
            script: Some(request.script.clone()),
            created: "2024-06-01T12:00:00".into(),
            updated: "2024-06-01T12:00:00".into(),
        };
        self.lock().stackscripts.push(created.clone());
        self.record(format!("create_stackscript:{}", request.label));
        Ok(created)
    }

    async fn delete_stackscript(&self, id: u64) -> Result<(), UpstreamError> {
        self.enter("delete_stackscript").await?;
        remove(&mut self.lock().stackscripts, |s| s.id == id)?;
        self.record(format!("delete_stackscript:{id}"));
        Ok(())
    }
}

/// Factory handing out one shared [`FakeClient`].
///
/// Blank credentials and credentials starting with `invalid` are rejected the
/// way the HTTP factory rejects unusable tokens.
pub struct FakeClientFactory {
    client: Arc<FakeClient>,
}

impl FakeClientFactory {
    /// Factory that hands out `client` for every accepted credential.
    pub fn new(client: Arc<FakeClient>) -> Self {
        Self { client }
    }
}

impl ClientFactory for FakeClientFactory {
    fn connect(&self, credential: &Credential) -> Result<Arc<dyn UpstreamClient>, UpstreamError> {
        if credential.is_blank() || credential.expose().starts_with("invalid") {
            return Err(UpstreamError::InvalidCredential(
                "token rejected".to_string(),
            ));
        }
        Ok(self.client.clone())
    }
}
