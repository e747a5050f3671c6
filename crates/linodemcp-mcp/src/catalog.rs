//! The built-in tool catalog.

use crate::handlers::ToolHandler;
use crate::handlers::{
    databases, domains, firewalls, instances, networking, profile, reference, stackscripts,
};
use crate::tools::{RegistryError, ToolRegistry};
use std::sync::Arc;

/// Register every built-in tool.
pub fn register_all(registry: &mut ToolRegistry) -> Result<(), RegistryError> {
    let handlers: Vec<Arc<dyn ToolHandler>> = vec![
        Arc::new(profile::GetProfile),
        // Reference data and cache control
        Arc::new(reference::ListRegions),
        Arc::new(reference::ListTypes),
        Arc::new(reference::ListKernels),
        Arc::new(reference::CacheStatsTool),
        Arc::new(reference::CacheInvalidateTool),
        // Instances
        Arc::new(instances::ListInstances),
        Arc::new(instances::GetInstance),
        Arc::new(instances::CreateInstance),
        Arc::new(instances::DeleteInstance),
        Arc::new(instances::BootInstance),
        Arc::new(instances::RebootInstance),
        Arc::new(instances::ShutdownInstance),
        // DNS
        Arc::new(domains::ListDomains),
        Arc::new(domains::GetDomain),
        Arc::new(domains::CreateDomain),
        Arc::new(domains::DeleteDomain),
        Arc::new(domains::ListDomainRecords),
        // Firewalls
        Arc::new(firewalls::ListFirewalls),
        Arc::new(firewalls::GetFirewall),
        Arc::new(firewalls::CreateFirewall),
        Arc::new(firewalls::UpdateFirewallRules),
        Arc::new(firewalls::DeleteFirewall),
        // Databases and networking
        Arc::new(databases::ListDatabases),
        Arc::new(networking::ListIpAddresses),
        Arc::new(networking::ListVpcs),
        // StackScripts
        Arc::new(stackscripts::ListStackScripts),
        Arc::new(stackscripts::GetStackScript),
        Arc::new(stackscripts::CreateStackScript),
        Arc::new(stackscripts::DeleteStackScript),
    ];

    for handler in handlers {
        registry.register(handler)?;
    }
    Ok(())
}

/// A registry holding the built-in catalog.
pub fn default_registry() -> Result<ToolRegistry, RegistryError> {
    let mut registry = ToolRegistry::new();
    register_all(&mut registry)?;
    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_registers_cleanly() {
        let registry = default_registry().unwrap();
        assert_eq!(registry.len(), 30);
        assert!(registry.contains("linode.instances.create"));
        assert!(registry.contains("linode.firewalls.rules.update"));
    }

    #[test]
    fn test_registering_twice_fails() {
        let mut registry = default_registry().unwrap();
        assert!(matches!(
            register_all(&mut registry),
            Err(RegistryError::DuplicateName(_))
        ));
    }

    #[test]
    fn test_every_tool_is_annotated() {
        for definition in default_registry().unwrap().definitions() {
            let annotations = definition.annotations.expect("annotations");
            assert!(annotations.read_only.is_some(), "{}", definition.name);
            assert!(definition.description.is_some());
        }
    }
}
