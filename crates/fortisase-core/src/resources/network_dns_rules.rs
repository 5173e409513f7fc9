// ── DNS rules ──
//
// Always present server side; the rule key is chosen by the operator.

use fortisase_api::JsonMap;
use serde::{Deserialize, Serialize};

use crate::codec::{Body, DecodeError, Expand, Fields, Flatten};
use crate::error::CoreError;
use crate::resource::{ApiObject, ObjectKind, require_import_id};
use crate::schema::{Attribute, Schema};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DnsRule {
    pub id: Option<String>,
    pub primary_key: Option<String>,
    pub primary_dns: Option<String>,
    pub secondary_dns: Option<String>,
    pub domains: Option<Vec<String>>,
    pub pop_dns_override: Option<Vec<PopDnsOverride>>,
}

/// Per-PoP resolver override.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PopDnsOverride {
    pub pop: String,
    pub primary_dns: Option<String>,
    pub secondary_dns: Option<String>,
}

impl Expand for PopDnsOverride {
    fn expand(&self) -> JsonMap {
        let mut body = Body::new();
        body.put_str("pop", Some(&self.pop))
            .put_str("primaryDns", self.primary_dns.as_deref())
            .put_str("secondaryDns", self.secondary_dns.as_deref());
        body.into_map()
    }
}

impl Flatten for PopDnsOverride {
    fn flatten(fields: &Fields<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            pop: fields.string("pop")?.ok_or_else(|| DecodeError {
                path: format!("{}.pop", fields.path()),
                expected: "a string",
                found: "null",
            })?,
            primary_dns: fields.string("primaryDns")?,
            secondary_dns: fields.string("secondaryDns")?,
        })
    }
}

pub struct DnsRules;

impl ApiObject for DnsRules {
    type Model = DnsRule;

    const TYPE_NAME: &'static str = "fortisase_network_dns_rules";
    const PATH: &'static str = "network/dns-rules";
    const KIND: ObjectKind = ObjectKind::Singleton;

    fn schema() -> Schema {
        let pop_override = Schema::new("Resolver override for one point of presence")
            .attr("pop", Attribute::string().required().length(1, 35))
            .attr("primary_dns", Attribute::string().optional())
            .attr("secondary_dns", Attribute::string().optional());

        Schema::new("DNS resolution rule. Destroying it only removes it from state.")
            .with_id()
            .attr(
                "primary_key",
                Attribute::string().required().length(1, 35).requires_replace(),
            )
            .attr("primary_dns", Attribute::string().optional_computed())
            .attr("secondary_dns", Attribute::string().optional_computed())
            .attr("domains", Attribute::strings().optional().size(0, 256))
            .attr("pop_dns_override", Attribute::list_of(pop_override).optional())
    }

    fn primary_key(model: &DnsRule) -> Option<String> {
        model.primary_key.clone()
    }

    fn id(model: &DnsRule) -> Option<&str> {
        model.id.as_deref()
    }

    fn set_id(model: &mut DnsRule, id: String) {
        model.id = Some(id);
    }

    fn expand(model: &DnsRule, _prior: Option<&DnsRule>) -> JsonMap {
        let mut body = Body::new();
        body.put_str("primaryKey", model.primary_key.as_deref())
            .put_str("primaryDns", model.primary_dns.as_deref())
            .put_str("secondaryDns", model.secondary_dns.as_deref())
            .put_strings("domains", model.domains.as_deref())
            .put_list("popDnsOverride", model.pop_dns_override.as_deref());
        body.into_map()
    }

    fn flatten(data: &JsonMap, known: &DnsRule) -> Result<DnsRule, DecodeError> {
        let f = Fields::root(data);
        Ok(DnsRule {
            id: known.id.clone(),
            primary_key: f.string("primaryKey")?.or_else(|| known.primary_key.clone()),
            primary_dns: f.string("primaryDns")?,
            secondary_dns: f.string("secondaryDns")?,
            domains: f.strings("domains")?,
            pop_dns_override: f.list("popDnsOverride")?,
        })
    }

    fn import(id: &str) -> Result<DnsRule, CoreError> {
        let key = require_import_id(id)?;
        Ok(DnsRule {
            id: Some(key.clone()),
            primary_key: Some(key),
            ..DnsRule::default()
        })
    }
}
