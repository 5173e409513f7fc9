// ── User groups ──

use fortisase_api::JsonMap;
use serde::{Deserialize, Serialize};

use crate::codec::{Body, DecodeError, Expand, Fields, Flatten};
use crate::error::CoreError;
use crate::reference::{Datasource, Reference};
use crate::resource::{ApiObject, require_import_id};
use crate::schema::{Attribute, Schema};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserGroup {
    pub id: Option<String>,
    pub primary_key: Option<String>,
    pub local_users: Option<Vec<Reference>>,
    pub remote_groups: Option<Vec<RemoteGroup>>,
    pub fsso_groups: Option<Vec<Reference>>,
}

/// Membership mirrored from an LDAP or RADIUS server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteGroup {
    pub server: Reference,
    /// Group name on the remote server; all users of the server when unset.
    pub group: Option<String>,
}

impl RemoteGroup {
    fn schema() -> Schema {
        Schema::new("Remote server group")
            .attr(
                "server",
                Attribute::object(Reference::schema(&[
                    Datasource::AuthLdapServers,
                    Datasource::AuthRadiusServers,
                ]))
                .required(),
            )
            .attr("group", Attribute::string().optional().length(1, 511))
    }
}

impl Expand for RemoteGroup {
    fn expand(&self) -> JsonMap {
        let mut body = Body::new();
        body.put_object("server", Some(&self.server))
            .put_str("group", self.group.as_deref());
        body.into_map()
    }
}

impl Flatten for RemoteGroup {
    fn flatten(fields: &Fields<'_>) -> Result<Self, DecodeError> {
        let server = fields.object("server")?.ok_or_else(|| DecodeError {
            path: format!("{}.server", fields.path()),
            expected: "an object",
            found: "null",
        })?;
        Ok(Self {
            server,
            group: fields.string("group")?,
        })
    }
}

pub struct UserGroups;

impl ApiObject for UserGroups {
    type Model = UserGroup;

    const TYPE_NAME: &'static str = "fortisase_auth_user_groups";
    const PATH: &'static str = "auth/user-groups";

    fn schema() -> Schema {
        Schema::new("Group of local, remote or FSSO users referenced by policies.")
            .with_id()
            .attr(
                "primary_key",
                Attribute::string().required().length(1, 79).requires_replace(),
            )
            .attr(
                "local_users",
                Attribute::list_of(Reference::schema(&[Datasource::AuthUsers])).optional(),
            )
            .attr("remote_groups", Attribute::list_of(RemoteGroup::schema()).optional())
            .attr(
                "fsso_groups",
                Attribute::list_of(Reference::schema(&[Datasource::AuthFssoUsers])).optional(),
            )
    }

    fn primary_key(model: &UserGroup) -> Option<String> {
        model.primary_key.clone()
    }

    fn id(model: &UserGroup) -> Option<&str> {
        model.id.as_deref()
    }

    fn set_id(model: &mut UserGroup, id: String) {
        model.id = Some(id);
    }

    fn expand(model: &UserGroup, _prior: Option<&UserGroup>) -> JsonMap {
        let mut body = Body::new();
        body.put_str("primaryKey", model.primary_key.as_deref())
            .put_refs("localUsers", model.local_users.as_deref())
            .put_list("remoteGroups", model.remote_groups.as_deref())
            .put_refs("fssoGroups", model.fsso_groups.as_deref());
        body.into_map()
    }

    fn flatten(data: &JsonMap, known: &UserGroup) -> Result<UserGroup, DecodeError> {
        let f = Fields::root(data);
        Ok(UserGroup {
            id: known.id.clone(),
            primary_key: f.string("primaryKey")?.or_else(|| known.primary_key.clone()),
            local_users: f.list("localUsers")?,
            remote_groups: f.list("remoteGroups")?,
            fsso_groups: f.list("fssoGroups")?,
        })
    }

    fn import(id: &str) -> Result<UserGroup, CoreError> {
        let key = require_import_id(id)?;
        Ok(UserGroup {
            id: Some(key.clone()),
            primary_key: Some(key),
            ..UserGroup::default()
        })
    }
}
