// ── Resource catalog ──
//
// One module per API namespace. `register_all` is the single place a new
// resource type has to be added.

pub mod actions;
pub mod auth_ldap_servers;
pub mod auth_radius_servers;
pub mod auth_user_groups;
pub mod endpoint_policies;
pub mod network_dns_rules;
pub mod network_hosts;
pub mod network_ipam;
pub mod private_access;
pub mod security_dlp_sensors;
pub mod security_policies;
pub mod security_video_filter_profile;
pub mod security_web_filter_profile;
pub mod system_local_certificates;

use crate::error::CoreError;
use crate::resource::{ActionResource, ResourceRegistry, StandardResource, split_import_id};

/// Path segment selecting the internal or outbound profile set.
pub(crate) const PROFILE_DIRECTIONS: &[&str] = &["internal-profiles", "outbound-profiles"];

/// Split a `direction/primary_key` import id and check the direction.
pub(crate) fn import_directional(id: &str) -> Result<(String, String), CoreError> {
    let (direction, key) = split_import_id(id, "direction", "primary_key")?;
    if !PROFILE_DIRECTIONS.contains(&direction.as_str()) {
        return Err(CoreError::InvalidImportId {
            id: id.to_owned(),
            reason: format!(
                "direction must be one of {}, got \"{direction}\"",
                PROFILE_DIRECTIONS.join(", ")
            ),
        });
    }
    Ok((direction, key))
}

pub fn register_all(registry: &mut ResourceRegistry) {
    // Auth
    registry.register(StandardResource::<auth_ldap_servers::LdapServers>::new());
    registry.register(StandardResource::<auth_radius_servers::RadiusServers>::new());
    registry.register(StandardResource::<auth_user_groups::UserGroups>::new());

    // Endpoint
    registry.register(StandardResource::<endpoint_policies::EndpointPolicies>::new());
    registry.register(ActionResource::<actions::EndpointDisconnectAction>::new());

    // Network
    registry.register(StandardResource::<network_hosts::NetworkHosts>::new());
    registry.register(StandardResource::<network_dns_rules::DnsRules>::new());
    registry.register(StandardResource::<network_ipam::IpamSettings>::new());

    // Security
    registry.register(StandardResource::<security_dlp_sensors::DlpSensors>::new());
    registry.register(StandardResource::<security_web_filter_profile::WebFilterProfiles>::new());
    registry.register(StandardResource::<security_video_filter_profile::VideoFilterProfiles>::new());
    registry.register(StandardResource::<security_policies::InternalPolicies>::new());
    registry.register(StandardResource::<security_policies::OutboundPolicies>::new());
    registry.register(ActionResource::<actions::ProfileGroupCloneAction>::new());

    // System
    registry.register(StandardResource::<system_local_certificates::LocalCertificates>::new());

    // Private access
    registry.register(private_access::ServiceConnections);
    registry.register(private_access::ServiceConnectionRegionCost);

    // Infra
    registry.register(ActionResource::<actions::EnableManagementAction>::new());
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn builtin_registry_carries_the_full_catalog() {
        let registry = ResourceRegistry::builtin();
        assert_eq!(registry.len(), 18);
        for name in [
            "fortisase_network_hosts",
            "fortisase_security_web_filter_profile",
            "fortisase_private_access_service_connection_region_cost",
            "fortisase_infra_enable_management",
        ] {
            assert!(registry.get(name).is_some(), "{name}");
        }
    }

    #[test]
    fn every_type_name_is_prefixed() {
        for name in ResourceRegistry::builtin().type_names() {
            assert!(name.starts_with("fortisase_"), "{name}");
        }
    }

    #[test]
    fn directional_import_checks_direction() {
        let (direction, key) = import_directional("internal-profiles/default").unwrap();
        assert_eq!(direction, "internal-profiles");
        assert_eq!(key, "default");
        assert!(matches!(
            import_directional("inbound-profiles/default"),
            Err(CoreError::InvalidImportId { .. })
        ));
    }
}
