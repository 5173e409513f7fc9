// ── LDAP servers ──

use fortisase_api::JsonMap;
use serde::{Deserialize, Serialize};

use crate::codec::{Body, DecodeError, Fields, resend};
use crate::error::CoreError;
use crate::lock::AUTH_SERVERS;
use crate::reference::{Datasource, Reference};
use crate::resource::{ApiObject, require_import_id};
use crate::schema::{Attribute, Schema};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LdapServer {
    pub id: Option<String>,
    pub primary_key: Option<String>,
    pub server: Option<String>,
    pub secondary_server: Option<String>,
    pub tertiary_server: Option<String>,
    pub port: Option<f64>,
    pub cnid: Option<String>,
    pub dn: Option<String>,
    pub bind_type: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub secure_connection: Option<String>,
    pub certificate: Option<Reference>,
    pub server_identity_check: Option<bool>,
    pub advanced_group_matching: Option<bool>,
    pub group_member_check: Option<String>,
    pub member_attribute: Option<String>,
}

pub struct LdapServers;

impl ApiObject for LdapServers {
    type Model = LdapServer;

    const TYPE_NAME: &'static str = "fortisase_auth_ldap_servers";
    const PATH: &'static str = "auth/ldap-servers";
    const LOCK: Option<&'static str> = Some(AUTH_SERVERS);

    fn schema() -> Schema {
        Schema::new("LDAP server used to authenticate remote users.")
            .with_id()
            .attr(
                "primary_key",
                Attribute::string().required().length(1, 35).requires_replace(),
            )
            .attr("server", Attribute::string().required().length(1, 63))
            .attr("secondary_server", Attribute::string().optional().length(0, 63))
            .attr("tertiary_server", Attribute::string().optional().length(0, 63))
            .attr(
                "port",
                Attribute::number().optional_computed().between(1.0, 65535.0),
            )
            .attr(
                "cnid",
                Attribute::string()
                    .optional_computed()
                    .length(1, 20)
                    .describe("Common name identifier, `cn` by default."),
            )
            .attr("dn", Attribute::string().required().length(1, 511))
            .attr(
                "bind_type",
                Attribute::string()
                    .optional_computed()
                    .one_of(["simple", "anonymous", "regular"]),
            )
            .attr("username", Attribute::string().optional().length(0, 511))
            .attr(
                "password",
                Attribute::string()
                    .optional()
                    .sensitive()
                    .length(0, 128)
                    .describe("Bind password. Sent on update only when it changes."),
            )
            .attr(
                "secure_connection",
                Attribute::string()
                    .optional_computed()
                    .one_of(["disable", "starttls", "ldaps"]),
            )
            .attr(
                "certificate",
                Attribute::object(Reference::schema(&[
                    Datasource::CaCertificates,
                    Datasource::LocalCertificates,
                ]))
                .optional(),
            )
            .attr("server_identity_check", Attribute::boolean().optional_computed())
            .attr("advanced_group_matching", Attribute::boolean().optional_computed())
            .attr(
                "group_member_check",
                Attribute::string().optional_computed().one_of([
                    "user-attr",
                    "group-object",
                    "posix-group-object",
                ]),
            )
            .attr("member_attribute", Attribute::string().optional_computed())
    }

    fn primary_key(model: &LdapServer) -> Option<String> {
        model.primary_key.clone()
    }

    fn id(model: &LdapServer) -> Option<&str> {
        model.id.as_deref()
    }

    fn set_id(model: &mut LdapServer, id: String) {
        model.id = Some(id);
    }

    fn expand(model: &LdapServer, prior: Option<&LdapServer>) -> JsonMap {
        let mut body = Body::new();
        body.put_str("primaryKey", model.primary_key.as_deref())
            .put_str("server", model.server.as_deref())
            .put_str("secondaryServer", model.secondary_server.as_deref())
            .put_str("tertiaryServer", model.tertiary_server.as_deref())
            .put_number("port", model.port)
            .put_str("cnid", model.cnid.as_deref())
            .put_str("dn", model.dn.as_deref())
            .put_str("bindType", model.bind_type.as_deref())
            .put_str("username", model.username.as_deref())
            .put_str(
                "password",
                resend(&model.password, prior.map(|p| &p.password)).map(String::as_str),
            )
            .put_str("secureConnection", model.secure_connection.as_deref())
            .put_object("certificate", model.certificate.as_ref())
            .put_bool("serverIdentityCheck", model.server_identity_check)
            .put_bool("advancedGroupMatchingEnabled", model.advanced_group_matching)
            .put_str("groupMemberCheck", model.group_member_check.as_deref())
            .put_str("memberAttribute", model.member_attribute.as_deref());
        body.into_map()
    }

    fn flatten(data: &JsonMap, known: &LdapServer) -> Result<LdapServer, DecodeError> {
        let f = Fields::root(data);
        Ok(LdapServer {
            id: known.id.clone(),
            primary_key: f.string("primaryKey")?.or_else(|| known.primary_key.clone()),
            server: f.string("server")?,
            secondary_server: f.string("secondaryServer")?,
            tertiary_server: f.string("tertiaryServer")?,
            port: f.number("port")?,
            cnid: f.string("cnid")?,
            dn: f.string("dn")?,
            bind_type: f.string("bindType")?,
            username: f.string("username")?,
            // Never echoed by the API.
            password: known.password.clone(),
            secure_connection: f.string("secureConnection")?,
            certificate: f.object("certificate")?,
            server_identity_check: f.boolean("serverIdentityCheck")?,
            advanced_group_matching: f.boolean("advancedGroupMatchingEnabled")?,
            group_member_check: f.string("groupMemberCheck")?,
            member_attribute: f.string("memberAttribute")?,
        })
    }

    fn import(id: &str) -> Result<LdapServer, CoreError> {
        let key = require_import_id(id)?;
        Ok(LdapServer {
            id: Some(key.clone()),
            primary_key: Some(key),
            ..LdapServer::default()
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    fn sample() -> LdapServer {
        LdapServer {
            primary_key: Some("corp".into()),
            server: Some("ldap.corp.example".into()),
            secondary_server: Some("ldap2.corp.example".into()),
            port: Some(636.0),
            cnid: Some("sAMAccountName".into()),
            dn: Some("dc=corp,dc=example".into()),
            bind_type: Some("regular".into()),
            username: Some("cn=svc,dc=corp,dc=example".into()),
            password: Some("hunter2".into()),
            secure_connection: Some("ldaps".into()),
            certificate: Some(Reference::new("corp-root", Datasource::CaCertificates)),
            server_identity_check: Some(true),
            advanced_group_matching: Some(false),
            group_member_check: Some("user-attr".into()),
            member_attribute: Some("memberOf".into()),
            ..LdapServer::default()
        }
    }

    #[test]
    fn expand_uses_api_key_names() {
        let body = serde_json::Value::Object(LdapServers::expand(&sample(), None));
        assert_eq!(body["primaryKey"], json!("corp"));
        assert_eq!(body["port"], json!(636));
        assert_eq!(body["password"], json!("hunter2"));
        assert_eq!(
            body["certificate"],
            json!({ "primaryKey": "corp-root", "datasource": "system/certificate/ca-certificates" })
        );
        assert!(body.get("tertiaryServer").is_none());
    }

    #[test]
    fn flatten_round_trips_expand() {
        let model = sample();
        let mut wire = LdapServers::expand(&model, None);
        wire.remove("password");
        let back = LdapServers::flatten(&wire, &model).unwrap();
        assert_eq!(back, model);
    }

    #[test]
    fn unchanged_password_is_not_resent() {
        let prior = sample();
        let mut plan = sample();
        plan.server = Some("ldap3.corp.example".into());
        let body = LdapServers::expand(&plan, Some(&prior));
        assert!(!body.contains_key("password"));
        assert_eq!(body.get("server"), Some(&json!("ldap3.corp.example")));

        plan.password = Some("rotated".into());
        let body = LdapServers::expand(&plan, Some(&prior));
        assert_eq!(body.get("password"), Some(&json!("rotated")));
    }

    #[test]
    fn schema_accepts_minimal_config() {
        let diags = LdapServers::schema().validate(&json!({
            "primary_key": "corp",
            "server": "10.0.0.10",
            "dn": "dc=corp,dc=example",
        }));
        assert!(diags.is_empty(), "{diags:?}");
    }

    #[test]
    fn schema_rejects_bad_bind_type_and_port() {
        let diags = LdapServers::schema().validate(&json!({
            "primary_key": "corp",
            "server": "10.0.0.10",
            "dn": "dc=corp",
            "bind_type": "kerberos",
            "port": 0,
        }));
        assert_eq!(diags.len(), 2);
    }

    #[test]
    fn import_seeds_key_and_id() {
        let model = LdapServers::import("corp").unwrap();
        assert_eq!(model.id.as_deref(), Some("corp"));
        assert_eq!(model.primary_key.as_deref(), Some("corp"));
    }
}
