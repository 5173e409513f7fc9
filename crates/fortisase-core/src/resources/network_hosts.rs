// ── Network hosts ──
//
// Address objects: a subnet, an IP range, an FQDN or a country.

use fortisase_api::JsonMap;
use serde::{Deserialize, Serialize};

use crate::codec::{Body, DecodeError, Fields};
use crate::error::CoreError;
use crate::resource::{ApiObject, require_import_id};
use crate::schema::{Attribute, Schema};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkHost {
    pub id: Option<String>,
    pub primary_key: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub subnet: Option<String>,
    pub start_ip: Option<String>,
    pub end_ip: Option<String>,
    pub fqdn: Option<String>,
    pub country_id: Option<String>,
    pub location: Option<String>,
    pub comments: Option<String>,
}

pub struct NetworkHosts;

impl ApiObject for NetworkHosts {
    type Model = NetworkHost;

    const TYPE_NAME: &'static str = "fortisase_network_hosts";
    const PATH: &'static str = "network/hosts";

    fn schema() -> Schema {
        Schema::new("Address object referenced by policies.")
            .with_id()
            .attr(
                "primary_key",
                Attribute::string().required().length(1, 79).requires_replace(),
            )
            .attr(
                "type",
                Attribute::string()
                    .required()
                    .one_of(["ipmask", "iprange", "fqdn", "geography"])
                    .requires_replace(),
            )
            .attr(
                "subnet",
                Attribute::string()
                    .optional()
                    .describe("CIDR, for `ipmask` hosts."),
            )
            .attr("start_ip", Attribute::string().optional())
            .attr("end_ip", Attribute::string().optional())
            .attr("fqdn", Attribute::string().optional().length(1, 255))
            .attr(
                "country_id",
                Attribute::string()
                    .optional()
                    .length(2, 2)
                    .describe("ISO 3166 country code, for `geography` hosts."),
            )
            .attr(
                "location",
                Attribute::string()
                    .optional_computed()
                    .one_of(["internal", "external", "unspecified"]),
            )
            .attr("comments", Attribute::string().optional().length(0, 255))
    }

    fn primary_key(model: &NetworkHost) -> Option<String> {
        model.primary_key.clone()
    }

    fn id(model: &NetworkHost) -> Option<&str> {
        model.id.as_deref()
    }

    fn set_id(model: &mut NetworkHost, id: String) {
        model.id = Some(id);
    }

    fn expand(model: &NetworkHost, _prior: Option<&NetworkHost>) -> JsonMap {
        let mut body = Body::new();
        body.put_str("primaryKey", model.primary_key.as_deref())
            .put_str("type", model.kind.as_deref())
            .put_str("subnet", model.subnet.as_deref())
            .put_str("startIp", model.start_ip.as_deref())
            .put_str("endIp", model.end_ip.as_deref())
            .put_str("fqdn", model.fqdn.as_deref())
            .put_str("countryId", model.country_id.as_deref())
            .put_str("location", model.location.as_deref())
            .put_str("comments", model.comments.as_deref());
        body.into_map()
    }

    fn flatten(data: &JsonMap, known: &NetworkHost) -> Result<NetworkHost, DecodeError> {
        let f = Fields::root(data);
        Ok(NetworkHost {
            id: known.id.clone(),
            primary_key: f.string("primaryKey")?.or_else(|| known.primary_key.clone()),
            kind: f.string("type")?,
            subnet: f.string("subnet")?,
            start_ip: f.string("startIp")?,
            end_ip: f.string("endIp")?,
            fqdn: f.string("fqdn")?,
            country_id: f.string("countryId")?,
            location: f.string("location")?,
            comments: f.string("comments")?,
        })
    }

    fn import(id: &str) -> Result<NetworkHost, CoreError> {
        let key = require_import_id(id)?;
        Ok(NetworkHost {
            id: Some(key.clone()),
            primary_key: Some(key),
            ..NetworkHost::default()
        })
    }
}
