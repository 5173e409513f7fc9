// ── Action resources ──
//
// Imperative calls with no object to track afterwards. Every input forces
// replacement, so a changed configuration fires the action again.

use fortisase_api::JsonMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::PROFILE_DIRECTIONS;
use crate::codec::Body;
use crate::lock::PROFILE_GROUP;
use crate::resource::Action;
use crate::schema::{Attribute, Schema};

// ── Profile group clone ──────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileGroupClone {
    pub id: Option<String>,
    pub direction: Option<String>,
    pub source: Option<String>,
    pub primary_key: Option<String>,
}

pub struct ProfileGroupCloneAction;

impl Action for ProfileGroupCloneAction {
    type Model = ProfileGroupClone;

    const TYPE_NAME: &'static str = "fortisase_security_profile_group_clone";
    const PATH: &'static str = "security/{direction}/profile-groups/{source}/clone";
    const LOCK: Option<&'static str> = Some(PROFILE_GROUP);

    fn schema() -> Schema {
        Schema::new(
            "Copies an existing profile group under a new name. \
             The copy is not managed afterwards.",
        )
        .with_id()
        .attr(
            "direction",
            Attribute::string()
                .required()
                .one_of(PROFILE_DIRECTIONS.iter().copied())
                .requires_replace(),
        )
        .attr(
            "source",
            Attribute::string()
                .required()
                .requires_replace()
                .describe("Profile group to copy."),
        )
        .attr(
            "primary_key",
            Attribute::string()
                .required()
                .length(1, 47)
                .requires_replace()
                .describe("Name of the new profile group."),
        )
    }

    fn path_params(model: &ProfileGroupClone) -> Vec<(&'static str, String)> {
        let mut params = Vec::with_capacity(2);
        if let Some(direction) = &model.direction {
            params.push(("direction", direction.clone()));
        }
        if let Some(source) = &model.source {
            params.push(("source", source.clone()));
        }
        params
    }

    fn body(model: &ProfileGroupClone) -> JsonMap {
        let mut body = Body::new();
        body.put_str("primaryKey", model.primary_key.as_deref());
        body.into_map()
    }

    fn derive_id(model: &ProfileGroupClone) -> String {
        format!(
            "{}/{}",
            model.direction.as_deref().unwrap_or_default(),
            model.primary_key.as_deref().unwrap_or_default()
        )
    }

    fn set_id(model: &mut ProfileGroupClone, id: String) {
        model.id = Some(id);
    }
}

// ── Endpoint disconnect ──────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointDisconnect {
    pub id: Option<String>,
    pub endpoints: Option<Vec<String>>,
}

pub struct EndpointDisconnectAction;

impl Action for EndpointDisconnectAction {
    type Model = EndpointDisconnect;

    const TYPE_NAME: &'static str = "fortisase_endpoint_disconnect";
    const PATH: &'static str = "endpoint/disconnect";

    fn schema() -> Schema {
        Schema::new("Disconnects managed endpoints from the SASE tunnel.")
            .with_id()
            .attr(
                "endpoints",
                Attribute::strings()
                    .required()
                    .size(1, 1024)
                    .requires_replace()
                    .describe("Endpoint identifiers to disconnect."),
            )
    }

    fn body(model: &EndpointDisconnect) -> JsonMap {
        let mut body = Body::new();
        body.put_strings("endpoints", model.endpoints.as_deref());
        body.into_map()
    }

    fn derive_id(model: &EndpointDisconnect) -> String {
        model.endpoints.as_deref().unwrap_or_default().join(",")
    }

    fn set_id(model: &mut EndpointDisconnect, id: String) {
        model.id = Some(id);
    }
}

// ── Enable management ────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnableManagement {
    pub id: Option<String>,
}

pub struct EnableManagementAction;

impl Action for EnableManagementAction {
    type Model = EnableManagement;

    const TYPE_NAME: &'static str = "fortisase_infra_enable_management";
    const PATH: &'static str = "infra/management/enable";

    fn schema() -> Schema {
        Schema::new("Turns on API management of the tenant. Runs once; destroying it does nothing.")
            .with_id()
    }

    fn body(_model: &EnableManagement) -> JsonMap {
        let mut body = JsonMap::new();
        body.insert("enable".into(), Value::Bool(true));
        body
    }

    fn derive_id(_model: &EnableManagement) -> String {
        "infra-management".into()
    }

    fn set_id(model: &mut EnableManagement, id: String) {
        model.id = Some(id);
    }
}
