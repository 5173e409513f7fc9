// ── RADIUS servers ──

use fortisase_api::JsonMap;
use serde::{Deserialize, Serialize};

use crate::codec::{Body, DecodeError, Fields, resend};
use crate::error::CoreError;
use crate::lock::AUTH_SERVERS;
use crate::resource::{ApiObject, require_import_id};
use crate::schema::{Attribute, Schema};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RadiusServer {
    pub id: Option<String>,
    pub primary_key: Option<String>,
    pub auth_type: Option<String>,
    pub primary_server: Option<String>,
    pub primary_secret: Option<String>,
    pub secondary_server: Option<String>,
    pub secondary_secret: Option<String>,
    pub nas_ip: Option<String>,
    pub timeout: Option<f64>,
    pub include_called_station_id: Option<bool>,
    pub include_calling_station_id: Option<bool>,
}

pub struct RadiusServers;

impl ApiObject for RadiusServers {
    type Model = RadiusServer;

    const TYPE_NAME: &'static str = "fortisase_auth_radius_servers";
    const PATH: &'static str = "auth/radius-servers";
    const LOCK: Option<&'static str> = Some(AUTH_SERVERS);

    fn schema() -> Schema {
        Schema::new("RADIUS server used to authenticate remote users.")
            .with_id()
            .attr(
                "primary_key",
                Attribute::string().required().length(1, 35).requires_replace(),
            )
            .attr(
                "auth_type",
                Attribute::string()
                    .optional_computed()
                    .one_of(["auto", "ms_chap_v2", "ms_chap", "chap", "pap"]),
            )
            .attr("primary_server", Attribute::string().required().length(1, 63))
            .attr(
                "primary_secret",
                Attribute::string().required().sensitive().length(1, 128),
            )
            .attr("secondary_server", Attribute::string().optional().length(0, 63))
            .attr(
                "secondary_secret",
                Attribute::string().optional().sensitive().length(0, 128),
            )
            .attr("nas_ip", Attribute::string().optional_computed())
            .attr(
                "timeout",
                Attribute::number()
                    .optional_computed()
                    .between(1.0, 300.0)
                    .describe("Seconds to wait for the server to answer."),
            )
            .attr("include_called_station_id", Attribute::boolean().optional_computed())
            .attr("include_calling_station_id", Attribute::boolean().optional_computed())
    }

    fn primary_key(model: &RadiusServer) -> Option<String> {
        model.primary_key.clone()
    }

    fn id(model: &RadiusServer) -> Option<&str> {
        model.id.as_deref()
    }

    fn set_id(model: &mut RadiusServer, id: String) {
        model.id = Some(id);
    }

    fn expand(model: &RadiusServer, prior: Option<&RadiusServer>) -> JsonMap {
        let primary_secret = resend(&model.primary_secret, prior.map(|p| &p.primary_secret));
        let secondary_secret =
            resend(&model.secondary_secret, prior.map(|p| &p.secondary_secret));

        let mut body = Body::new();
        body.put_str("primaryKey", model.primary_key.as_deref())
            .put_str("authType", model.auth_type.as_deref())
            .put_str("primaryServer", model.primary_server.as_deref())
            .put_str("primarySecret", primary_secret.map(String::as_str))
            .put_str("secondaryServer", model.secondary_server.as_deref())
            .put_str("secondarySecret", secondary_secret.map(String::as_str))
            .put_str("nasIp", model.nas_ip.as_deref())
            .put_number("timeout", model.timeout)
            .put_bool("includeCalledStationId", model.include_called_station_id)
            .put_bool("includeCallingStationId", model.include_calling_station_id);
        body.into_map()
    }

    fn flatten(data: &JsonMap, known: &RadiusServer) -> Result<RadiusServer, DecodeError> {
        let f = Fields::root(data);
        Ok(RadiusServer {
            id: known.id.clone(),
            primary_key: f.string("primaryKey")?.or_else(|| known.primary_key.clone()),
            auth_type: f.string("authType")?,
            primary_server: f.string("primaryServer")?,
            primary_secret: known.primary_secret.clone(),
            secondary_server: f.string("secondaryServer")?,
            secondary_secret: known.secondary_secret.clone(),
            nas_ip: f.string("nasIp")?,
            timeout: f.number("timeout")?,
            include_called_station_id: f.boolean("includeCalledStationId")?,
            include_calling_station_id: f.boolean("includeCallingStationId")?,
        })
    }

    fn import(id: &str) -> Result<RadiusServer, CoreError> {
        let key = require_import_id(id)?;
        Ok(RadiusServer {
            id: Some(key.clone()),
            primary_key: Some(key),
            ..RadiusServer::default()
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    fn sample() -> RadiusServer {
        RadiusServer {
            primary_key: Some("nps".into()),
            auth_type: Some("ms_chap_v2".into()),
            primary_server: Some("10.0.0.20".into()),
            primary_secret: Some("s1".into()),
            secondary_server: Some("10.0.0.21".into()),
            secondary_secret: Some("s2".into()),
            timeout: Some(5.0),
            ..RadiusServer::default()
        }
    }

    #[test]
    fn create_sends_both_secrets() {
        let body = RadiusServers::expand(&sample(), None);
        assert_eq!(body.get("primarySecret"), Some(&json!("s1")));
        assert_eq!(body.get("secondarySecret"), Some(&json!("s2")));
    }

    #[test]
    fn update_sends_only_the_rotated_secret() {
        let prior = sample();
        let mut plan = sample();
        plan.secondary_secret = Some("s2-rotated".into());
        let body = RadiusServers::expand(&plan, Some(&prior));
        assert!(!body.contains_key("primarySecret"));
        assert_eq!(body.get("secondarySecret"), Some(&json!("s2-rotated")));
        assert_eq!(body.get("primaryServer"), Some(&json!("10.0.0.20")));
    }

    #[test]
    fn secrets_survive_flatten() {
        let model = sample();
        let Some(wire) = serde_json::json!({
            "primaryKey": "nps",
            "authType": "ms_chap_v2",
            "primaryServer": "10.0.0.20",
            "secondaryServer": "10.0.0.21",
            "timeout": 5,
        })
        .as_object()
        .cloned() else {
            unreachable!()
        };
        let back = RadiusServers::flatten(&wire, &model).unwrap();
        assert_eq!(back, model);
    }
}
