// ── IPAM settings ──

use fortisase_api::JsonMap;
use serde::{Deserialize, Serialize};

use crate::codec::{Body, DecodeError, Expand, Fields, Flatten};
use crate::error::CoreError;
use crate::resource::{ApiObject, ObjectKind, require_import_id};
use crate::schema::{Attribute, Schema};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Ipam {
    pub id: Option<String>,
    pub primary_key: Option<String>,
    pub enabled: Option<bool>,
    pub pool_subnet_size: Option<f64>,
    pub pools: Option<Vec<IpPool>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IpPool {
    pub name: String,
    pub subnet: String,
}

impl Expand for IpPool {
    fn expand(&self) -> JsonMap {
        let mut body = Body::new();
        body.put_str("name", Some(&self.name))
            .put_str("subnet", Some(&self.subnet));
        body.into_map()
    }
}

impl Flatten for IpPool {
    fn flatten(fields: &Fields<'_>) -> Result<Self, DecodeError> {
        let required = |key: &str| -> Result<String, DecodeError> {
            fields.string(key)?.ok_or_else(|| DecodeError {
                path: format!("{}.{key}", fields.path()),
                expected: "a string",
                found: "null",
            })
        };
        Ok(Self {
            name: required("name")?,
            subnet: required("subnet")?,
        })
    }
}

pub struct IpamSettings;

impl ApiObject for IpamSettings {
    type Model = Ipam;

    const TYPE_NAME: &'static str = "fortisase_network_ipam";
    const PATH: &'static str = "network/ipam";
    const KIND: ObjectKind = ObjectKind::Singleton;

    fn schema() -> Schema {
        let pool = Schema::new("Address pool")
            .attr("name", Attribute::string().required().length(1, 35))
            .attr("subnet", Attribute::string().required());

        Schema::new("Tenant IP address management. Destroying it only removes it from state.")
            .with_id()
            .attr(
                "primary_key",
                Attribute::string().required().length(1, 35).requires_replace(),
            )
            .attr("enabled", Attribute::boolean().optional_computed())
            .attr(
                "pool_subnet_size",
                Attribute::number()
                    .optional_computed()
                    .between(8.0, 29.0)
                    .describe("Prefix length carved out of the pools per PoP."),
            )
            .attr("pools", Attribute::list_of(pool).optional().size(0, 16))
    }

    fn primary_key(model: &Ipam) -> Option<String> {
        model.primary_key.clone()
    }

    fn id(model: &Ipam) -> Option<&str> {
        model.id.as_deref()
    }

    fn set_id(model: &mut Ipam, id: String) {
        model.id = Some(id);
    }

    fn expand(model: &Ipam, _prior: Option<&Ipam>) -> JsonMap {
        let mut body = Body::new();
        body.put_str("primaryKey", model.primary_key.as_deref())
            .put_bool("enabled", model.enabled)
            .put_number("poolSubnetSize", model.pool_subnet_size)
            .put_list("pools", model.pools.as_deref());
        body.into_map()
    }

    fn flatten(data: &JsonMap, known: &Ipam) -> Result<Ipam, DecodeError> {
        let f = Fields::root(data);
        Ok(Ipam {
            id: known.id.clone(),
            primary_key: f.string("primaryKey")?.or_else(|| known.primary_key.clone()),
            enabled: f.boolean("enabled")?,
            pool_subnet_size: f.number("poolSubnetSize")?,
            pools: f.list("pools")?,
        })
    }

    fn import(id: &str) -> Result<Ipam, CoreError> {
        let key = require_import_id(id)?;
        Ok(Ipam {
            id: Some(key.clone()),
            primary_key: Some(key),
            ..Ipam::default()
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn numeric_string_subnet_size_is_accepted() {
        let Some(wire) = json!({
            "primaryKey": "ipam",
            "enabled": true,
            "poolSubnetSize": "24",
            "pools": [{ "name": "a", "subnet": "100.64.0.0/16" }],
        })
        .as_object()
        .cloned() else {
            unreachable!()
        };
        let model = IpamSettings::flatten(&wire, &Ipam::default()).unwrap();
        assert_eq!(model.pool_subnet_size, Some(24.0));
        assert_eq!(model.pools.unwrap()[0].subnet, "100.64.0.0/16");
    }
}
