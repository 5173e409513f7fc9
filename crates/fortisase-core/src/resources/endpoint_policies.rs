// ── Endpoint policies ──
//
// Bind users and groups to the connection, protection and sandbox
// profiles FortiClient applies on their endpoints.

use fortisase_api::JsonMap;
use serde::{Deserialize, Serialize};

use crate::codec::{Body, DecodeError, Expand, Fields, Flatten};
use crate::error::CoreError;
use crate::reference::{Datasource, Reference};
use crate::resource::{ApiObject, require_import_id};
use crate::schema::{Attribute, Schema};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointPolicy {
    pub id: Option<String>,
    pub primary_key: Option<String>,
    pub enabled: Option<bool>,
    pub users: Option<Vec<Reference>>,
    pub user_groups: Option<Vec<Reference>>,
    pub profiles: Option<PolicyProfiles>,
    pub priority: Option<f64>,
    pub comments: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyProfiles {
    pub connection_profile: Option<Reference>,
    pub protection_profile: Option<Reference>,
    pub sandbox_profile: Option<Reference>,
}

impl PolicyProfiles {
    fn schema() -> Schema {
        Schema::new("Profiles applied to matching endpoints")
            .attr(
                "connection_profile",
                Attribute::object(Reference::schema(&[Datasource::EndpointConnectionProfiles]))
                    .optional(),
            )
            .attr(
                "protection_profile",
                Attribute::object(Reference::schema(&[Datasource::EndpointProtectionProfiles]))
                    .optional(),
            )
            .attr(
                "sandbox_profile",
                Attribute::object(Reference::schema(&[Datasource::EndpointSandboxProfiles]))
                    .optional(),
            )
    }
}

impl Expand for PolicyProfiles {
    fn expand(&self) -> JsonMap {
        let mut body = Body::new();
        body.put_object("connectionProfile", self.connection_profile.as_ref())
            .put_object("protectionProfile", self.protection_profile.as_ref())
            .put_object("sandboxProfile", self.sandbox_profile.as_ref());
        body.into_map()
    }
}

impl Flatten for PolicyProfiles {
    fn flatten(fields: &Fields<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            connection_profile: fields.object("connectionProfile")?,
            protection_profile: fields.object("protectionProfile")?,
            sandbox_profile: fields.object("sandboxProfile")?,
        })
    }
}

pub struct EndpointPolicies;

impl ApiObject for EndpointPolicies {
    type Model = EndpointPolicy;

    const TYPE_NAME: &'static str = "fortisase_endpoint_policies";
    const PATH: &'static str = "endpoint/policies";

    fn schema() -> Schema {
        Schema::new("Endpoint policy assigning FortiClient profiles to users.")
            .with_id()
            .attr(
                "primary_key",
                Attribute::string().required().length(1, 35).requires_replace(),
            )
            .attr("enabled", Attribute::boolean().optional_computed())
            .attr(
                "users",
                Attribute::list_of(Reference::schema(&[Datasource::AuthUsers])).optional(),
            )
            .attr(
                "user_groups",
                Attribute::list_of(Reference::schema(&[Datasource::AuthUserGroups])).optional(),
            )
            .attr("profiles", Attribute::object(PolicyProfiles::schema()).optional())
            .attr(
                "priority",
                Attribute::number()
                    .optional_computed()
                    .between(1.0, 1000.0)
                    .describe("Evaluation order; lower numbers match first."),
            )
            .attr("comments", Attribute::string().optional().length(0, 1023))
    }

    fn primary_key(model: &EndpointPolicy) -> Option<String> {
        model.primary_key.clone()
    }

    fn id(model: &EndpointPolicy) -> Option<&str> {
        model.id.as_deref()
    }

    fn set_id(model: &mut EndpointPolicy, id: String) {
        model.id = Some(id);
    }

    fn expand(model: &EndpointPolicy, _prior: Option<&EndpointPolicy>) -> JsonMap {
        let mut body = Body::new();
        body.put_str("primaryKey", model.primary_key.as_deref())
            .put_bool("enabled", model.enabled)
            .put_refs("users", model.users.as_deref())
            .put_refs("userGroups", model.user_groups.as_deref())
            .put_object("profile", model.profiles.as_ref())
            .put_number("priority", model.priority)
            .put_str("comments", model.comments.as_deref());
        body.into_map()
    }

    fn flatten(data: &JsonMap, known: &EndpointPolicy) -> Result<EndpointPolicy, DecodeError> {
        let f = Fields::root(data);
        Ok(EndpointPolicy {
            id: known.id.clone(),
            primary_key: f.string("primaryKey")?.or_else(|| known.primary_key.clone()),
            enabled: f.boolean("enabled")?,
            users: f.list("users")?,
            user_groups: f.list("userGroups")?,
            profiles: f.object("profile")?,
            priority: f.number("priority")?,
            comments: f.string("comments")?,
        })
    }

    fn import(id: &str) -> Result<EndpointPolicy, CoreError> {
        let key = require_import_id(id)?;
        Ok(EndpointPolicy {
            id: Some(key.clone()),
            primary_key: Some(key),
            ..EndpointPolicy::default()
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn round_trip() {
        let model = EndpointPolicy {
            primary_key: Some("engineering".into()),
            enabled: Some(true),
            user_groups: Some(vec![Reference::new("eng", Datasource::AuthUserGroups)]),
            profiles: Some(PolicyProfiles {
                connection_profile: Some(Reference::new(
                    "default",
                    Datasource::EndpointConnectionProfiles,
                )),
                protection_profile: Some(Reference::new(
                    "strict",
                    Datasource::EndpointProtectionProfiles,
                )),
                sandbox_profile: None,
            }),
            priority: Some(3.0),
            comments: Some("managed by terraform".into()),
            ..EndpointPolicy::default()
        };
        let wire = EndpointPolicies::expand(&model, None);
        assert_eq!(EndpointPolicies::flatten(&wire, &model).unwrap(), model);
    }
}
