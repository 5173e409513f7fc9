// ── Internal and outbound security policies ──
//
// Both policy kinds reference profile groups, so their mutations share the
// profile-group lock with the filter profiles.

use fortisase_api::JsonMap;
use serde::{Deserialize, Serialize};

use crate::codec::{Body, DecodeError, Fields};
use crate::error::CoreError;
use crate::lock::PROFILE_GROUP;
use crate::reference::{Datasource, Reference};
use crate::resource::{ApiObject, require_import_id};
use crate::schema::{Attribute, Schema};

const ADDRESSES: &[Datasource] = &[Datasource::NetworkHosts, Datasource::NetworkHostGroups];
const SERVICES: &[Datasource] = &[Datasource::SecurityServices, Datasource::SecurityServiceGroups];
const SCHEDULES: &[Datasource] = &[
    Datasource::SecurityOnetimeSchedules,
    Datasource::SecurityRecurringSchedules,
    Datasource::SecurityScheduleGroups,
];

/// Attributes both policy kinds share.
fn policy_schema(description: &'static str, destinations: &[Datasource]) -> Schema {
    Schema::new(description)
        .with_id()
        .attr(
            "primary_key",
            Attribute::string().required().length(1, 35).requires_replace(),
        )
        .attr("enabled", Attribute::boolean().optional_computed())
        .attr(
            "scope",
            Attribute::string()
                .optional_computed()
                .one_of(["vpn-user", "all"]),
        )
        .attr(
            "sources",
            Attribute::list_of(Reference::schema(ADDRESSES)).required().size(1, 256),
        )
        .attr(
            "destinations",
            Attribute::list_of(Reference::schema(destinations))
                .required()
                .size(1, 256),
        )
        .attr(
            "services",
            Attribute::list_of(Reference::schema(SERVICES)).required().size(1, 256),
        )
        .attr(
            "action",
            Attribute::string().required().one_of(["accept", "deny"]),
        )
        .attr(
            "schedule",
            Attribute::object(Reference::schema(SCHEDULES)).optional_computed(),
        )
        .attr(
            "profile_group",
            Attribute::object(Reference::schema(&[Datasource::SecurityProfileGroups])).optional(),
        )
        .attr(
            "log_traffic",
            Attribute::string()
                .optional_computed()
                .one_of(["all", "utm", "disable"]),
        )
        .attr("comments", Attribute::string().optional().length(0, 1023))
}

// ── Internal policies ────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InternalPolicy {
    pub id: Option<String>,
    pub primary_key: Option<String>,
    pub enabled: Option<bool>,
    pub scope: Option<String>,
    pub sources: Option<Vec<Reference>>,
    pub destinations: Option<Vec<Reference>>,
    pub services: Option<Vec<Reference>>,
    pub action: Option<String>,
    pub schedule: Option<Reference>,
    pub profile_group: Option<Reference>,
    pub log_traffic: Option<String>,
    pub comments: Option<String>,
}

pub struct InternalPolicies;

impl ApiObject for InternalPolicies {
    type Model = InternalPolicy;

    const TYPE_NAME: &'static str = "fortisase_security_internal_policies";
    const PATH: &'static str = "security/internal-policies";
    const LOCK: Option<&'static str> = Some(PROFILE_GROUP);

    fn schema() -> Schema {
        policy_schema("Policy for traffic between remote users and private networks.", ADDRESSES)
    }

    fn primary_key(model: &InternalPolicy) -> Option<String> {
        model.primary_key.clone()
    }

    fn id(model: &InternalPolicy) -> Option<&str> {
        model.id.as_deref()
    }

    fn set_id(model: &mut InternalPolicy, id: String) {
        model.id = Some(id);
    }

    fn expand(model: &InternalPolicy, _prior: Option<&InternalPolicy>) -> JsonMap {
        let mut body = Body::new();
        body.put_str("primaryKey", model.primary_key.as_deref())
            .put_bool("enabled", model.enabled)
            .put_str("scope", model.scope.as_deref())
            .put_refs("sources", model.sources.as_deref())
            .put_refs("destinations", model.destinations.as_deref())
            .put_refs("services", model.services.as_deref())
            .put_str("action", model.action.as_deref())
            .put_object("schedule", model.schedule.as_ref())
            .put_object("profileGroup", model.profile_group.as_ref())
            .put_str("logTraffic", model.log_traffic.as_deref())
            .put_str("comments", model.comments.as_deref());
        body.into_map()
    }

    fn flatten(data: &JsonMap, known: &InternalPolicy) -> Result<InternalPolicy, DecodeError> {
        let f = Fields::root(data);
        Ok(InternalPolicy {
            id: known.id.clone(),
            // The server numbers policies itself; the configured name stays the key.
            primary_key: known.primary_key.clone().or(f.string("primaryKey")?),
            enabled: f.boolean("enabled")?,
            scope: f.string("scope")?,
            sources: f.list("sources")?,
            destinations: f.list("destinations")?,
            services: f.list("services")?,
            action: f.string("action")?,
            schedule: f.object("schedule")?,
            profile_group: f.object("profileGroup")?,
            log_traffic: f.string("logTraffic")?,
            comments: f.string("comments")?,
        })
    }

    fn import(id: &str) -> Result<InternalPolicy, CoreError> {
        let key = require_import_id(id)?;
        Ok(InternalPolicy {
            id: Some(key.clone()),
            primary_key: Some(key),
            ..InternalPolicy::default()
        })
    }
}

// ── Outbound policies ────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutboundPolicy {
    pub id: Option<String>,
    pub primary_key: Option<String>,
    pub enabled: Option<bool>,
    pub scope: Option<String>,
    pub users: Option<Vec<Reference>>,
    pub sources: Option<Vec<Reference>>,
    pub destinations: Option<Vec<Reference>>,
    pub services: Option<Vec<Reference>>,
    pub action: Option<String>,
    pub schedule: Option<Reference>,
    pub profile_group: Option<Reference>,
    pub force_cert_inspection: Option<bool>,
    pub log_traffic: Option<String>,
    pub comments: Option<String>,
}

pub struct OutboundPolicies;

impl ApiObject for OutboundPolicies {
    type Model = OutboundPolicy;

    const TYPE_NAME: &'static str = "fortisase_security_outbound_policies";
    const PATH: &'static str = "security/outbound-policies";
    const LOCK: Option<&'static str> = Some(PROFILE_GROUP);

    fn schema() -> Schema {
        policy_schema(
            "Policy for traffic from remote users to the internet.",
            &[
                Datasource::NetworkHosts,
                Datasource::NetworkHostGroups,
                Datasource::NetworkInternetServices,
                Datasource::NetworkWildcardFqdns,
            ],
        )
        .attr(
            "users",
            Attribute::list_of(Reference::schema(&[
                Datasource::AuthUsers,
                Datasource::AuthUserGroups,
            ]))
            .optional(),
        )
        .attr("force_cert_inspection", Attribute::boolean().optional_computed())
    }

    fn primary_key(model: &OutboundPolicy) -> Option<String> {
        model.primary_key.clone()
    }

    fn id(model: &OutboundPolicy) -> Option<&str> {
        model.id.as_deref()
    }

    fn set_id(model: &mut OutboundPolicy, id: String) {
        model.id = Some(id);
    }

    fn expand(model: &OutboundPolicy, _prior: Option<&OutboundPolicy>) -> JsonMap {
        let mut body = Body::new();
        body.put_str("primaryKey", model.primary_key.as_deref())
            .put_bool("enabled", model.enabled)
            .put_str("scope", model.scope.as_deref())
            .put_refs("users", model.users.as_deref())
            .put_refs("sources", model.sources.as_deref())
            .put_refs("destinations", model.destinations.as_deref())
            .put_refs("services", model.services.as_deref())
            .put_str("action", model.action.as_deref())
            .put_object("schedule", model.schedule.as_ref())
            .put_object("profileGroup", model.profile_group.as_ref())
            .put_bool("forceCertInspection", model.force_cert_inspection)
            .put_str("logTraffic", model.log_traffic.as_deref())
            .put_str("comments", model.comments.as_deref());
        body.into_map()
    }

    fn flatten(data: &JsonMap, known: &OutboundPolicy) -> Result<OutboundPolicy, DecodeError> {
        let f = Fields::root(data);
        Ok(OutboundPolicy {
            id: known.id.clone(),
            primary_key: known.primary_key.clone().or(f.string("primaryKey")?),
            enabled: f.boolean("enabled")?,
            scope: f.string("scope")?,
            users: f.list("users")?,
            sources: f.list("sources")?,
            destinations: f.list("destinations")?,
            services: f.list("services")?,
            action: f.string("action")?,
            schedule: f.object("schedule")?,
            profile_group: f.object("profileGroup")?,
            force_cert_inspection: f.boolean("forceCertInspection")?,
            log_traffic: f.string("logTraffic")?,
            comments: f.string("comments")?,
        })
    }

    fn import(id: &str) -> Result<OutboundPolicy, CoreError> {
        let key = require_import_id(id)?;
        Ok(OutboundPolicy {
            id: Some(key.clone()),
            primary_key: Some(key),
            ..OutboundPolicy::default()
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    fn outbound() -> OutboundPolicy {
        OutboundPolicy {
            primary_key: Some("allow-web".into()),
            enabled: Some(true),
            users: Some(vec![Reference::new("staff", Datasource::AuthUserGroups)]),
            sources: Some(vec![Reference::new("all", Datasource::NetworkHosts)]),
            destinations: Some(vec![Reference::new(
                "Google-Web",
                Datasource::NetworkInternetServices,
            )]),
            services: Some(vec![Reference::new("HTTPS", Datasource::SecurityServices)]),
            action: Some("accept".into()),
            profile_group: Some(Reference::new("default", Datasource::SecurityProfileGroups)),
            log_traffic: Some("utm".into()),
            ..OutboundPolicy::default()
        }
    }

    #[test]
    fn outbound_round_trip() {
        let model = outbound();
        let wire = OutboundPolicies::expand(&model, None);
        assert_eq!(OutboundPolicies::flatten(&wire, &model).unwrap(), model);
    }

    #[test]
    fn server_numbered_key_does_not_replace_configured_name() {
        let model = outbound();
        let mut wire = OutboundPolicies::expand(&model, None);
        wire.insert("primaryKey".into(), json!(42));
        let state = OutboundPolicies::flatten(&wire, &model).unwrap();
        assert_eq!(state.primary_key.as_deref(), Some("allow-web"));

        let internal = InternalPolicy {
            primary_key: Some("to-dc".into()),
            ..InternalPolicy::default()
        };
        let wire = json!({ "primaryKey": 7, "action": "deny" });
        let state = InternalPolicies::flatten(wire.as_object().unwrap(), &internal).unwrap();
        assert_eq!(state.primary_key.as_deref(), Some("to-dc"));
        assert_eq!(state.action.as_deref(), Some("deny"));
    }

    #[test]
    fn internal_destinations_exclude_internet_services() {
        let diags = InternalPolicies::schema().validate(&json!({
            "primary_key": "to-dc",
            "sources": [{ "primary_key": "all", "datasource": "network/hosts" }],
            "destinations": [{ "primary_key": "x", "datasource": "network/internet-services" }],
            "services": [{ "primary_key": "ALL", "datasource": "security/services" }],
            "action": "accept",
        }));
        assert_eq!(
            diags.iter().filter_map(|d| d.attribute.as_deref()).collect::<Vec<_>>(),
            vec!["destinations[0].datasource"]
        );
    }

    #[test]
    fn empty_sources_are_rejected() {
        let diags = InternalPolicies::schema().validate(&json!({
            "primary_key": "to-dc",
            "sources": [],
            "destinations": [{ "primary_key": "dc", "datasource": "network/host-groups" }],
            "services": [{ "primary_key": "ALL", "datasource": "security/services" }],
            "action": "deny",
        }));
        assert!(diags.has_errors());
    }
}
