// ── Private access service connections ──
//
// Service connections are applied asynchronously: the object exists as
// soon as the POST returns, but the tunnel configuration is pushed to the
// PoPs afterwards and `config_state` moves to `success` (or `failed`).
// Create and update wait for that; delete waits for the object to vanish.

use std::collections::BTreeMap;

use async_trait::async_trait;
use fortisase_api::{InputModel, JsonMap};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::codec::{Body, DecodeError, Expand, Fields, Flatten};
use crate::context::ProviderContext;
use crate::error::CoreError;
use crate::poll::{PollStatus, poll_until};
use crate::reference::{Datasource, Reference};
use crate::resource::{Resource, require_import_id, response_primary_key};
use crate::schema::{AttrKind, Attribute, Schema};

const CONNECTIONS_PATH: &str = "private-access/service-connections";
const REGION_COST_PATH: &str = "private-access/service-connections/{service_connection_id}/region-cost";

/// Interpret `config_state` from a service connection read.
fn apply_status(data: JsonMap, what: &str) -> Result<PollStatus<JsonMap>, CoreError> {
    let state = Fields::root(&data).string("config_state")?;
    match state.as_deref() {
        Some("success") => Ok(PollStatus::Ready(data)),
        Some(failed @ ("failed" | "error")) => Err(CoreError::PollFailed {
            what: what.to_owned(),
            state: failed.to_owned(),
        }),
        Some(other) => Ok(PollStatus::Pending(other.to_owned())),
        None => Ok(PollStatus::Pending("no config_state".into())),
    }
}

/// Poll the connection until its configuration is applied; returns the
/// final read.
async fn wait_applied(ctx: &ProviderContext, id: &str) -> Result<JsonMap, CoreError> {
    let what = format!("service connection {id}");
    let label = what.as_str();
    poll_until(&ctx.poll().apply, ctx.cancel_token(), label, |attempt| async move {
        debug!(id, attempt, "checking config_state");
        let data = ctx
            .api()
            .read(CONNECTIONS_PATH, &InputModel::keyed(id))
            .await?;
        apply_status(data, label)
    })
    .await
}

// ── Service connections ──────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConnection {
    pub id: Option<String>,
    pub primary_key: Option<String>,
    pub alias: Option<String>,
    pub ipsec_remote_gw: Option<String>,
    pub ipsec_ike_version: Option<String>,
    pub authentication: Option<String>,
    pub ipsec_pre_shared_key: Option<String>,
    pub ipsec_cert_name: Option<Reference>,
    pub bgp_peer_ip: Option<String>,
    pub overlay_network_id: Option<String>,
    pub route_map_tag: Option<String>,
    pub backup_links: Option<Vec<BackupLink>>,
    pub config_state: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackupLink {
    pub ipsec_remote_gw: String,
    pub ipsec_ike_version: Option<String>,
}

impl Expand for BackupLink {
    fn expand(&self) -> JsonMap {
        let mut body = Body::new();
        body.put_str("ipsec_remote_gw", Some(&self.ipsec_remote_gw))
            .put_str("ipsec_ike_version", self.ipsec_ike_version.as_deref());
        body.into_map()
    }
}

impl Flatten for BackupLink {
    fn flatten(fields: &Fields<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            ipsec_remote_gw: fields.string("ipsec_remote_gw")?.ok_or_else(|| DecodeError {
                path: format!("{}.ipsec_remote_gw", fields.path()),
                expected: "a string",
                found: "null",
            })?,
            ipsec_ike_version: fields.string("ipsec_ike_version")?,
        })
    }
}

pub struct ServiceConnections;

impl ServiceConnections {
    fn expand(model: &ServiceConnection) -> JsonMap {
        let mut body = Body::new();
        body.put_str("alias", model.alias.as_deref())
            .put_str("ipsec_remote_gw", model.ipsec_remote_gw.as_deref())
            .put_str("ipsec_ike_version", model.ipsec_ike_version.as_deref())
            .put_str("authentication", model.authentication.as_deref())
            .put_str("ipsec_pre_shared_key", model.ipsec_pre_shared_key.as_deref())
            .put_object("ipsec_cert_name", model.ipsec_cert_name.as_ref())
            .put_str("bgp_peer_ip", model.bgp_peer_ip.as_deref())
            .put_str("overlay_network_id", model.overlay_network_id.as_deref())
            .put_str("route_map_tag", model.route_map_tag.as_deref())
            .put_list("backup_links", model.backup_links.as_deref());
        body.into_map()
    }

    fn flatten(data: &JsonMap, known: &ServiceConnection) -> Result<ServiceConnection, DecodeError> {
        let f = Fields::root(data);
        Ok(ServiceConnection {
            id: known.id.clone(),
            primary_key: f.string("primaryKey")?.or_else(|| known.primary_key.clone()),
            alias: f.string("alias")?,
            ipsec_remote_gw: f.string("ipsec_remote_gw")?,
            ipsec_ike_version: f.string("ipsec_ike_version")?,
            authentication: f.string("authentication")?,
            ipsec_pre_shared_key: known.ipsec_pre_shared_key.clone(),
            ipsec_cert_name: f.object("ipsec_cert_name")?,
            bgp_peer_ip: f.string("bgp_peer_ip")?,
            overlay_network_id: f.string("overlay_network_id")?,
            route_map_tag: f.string("route_map_tag")?,
            backup_links: f.list("backup_links")?,
            config_state: f.string("config_state")?,
        })
    }

    fn stored_id(model: &ServiceConnection) -> Result<String, CoreError> {
        model.id.clone().ok_or_else(|| CoreError::MissingId {
            resource: Self::TYPE_NAME.into(),
            field: "id".into(),
        })
    }

    const TYPE_NAME: &'static str = "fortisase_private_access_service_connections";
}

#[async_trait]
impl Resource for ServiceConnections {
    type Model = ServiceConnection;

    fn type_name(&self) -> &'static str {
        Self::TYPE_NAME
    }

    fn schema(&self) -> Schema {
        let backup_link = Schema::new("Secondary tunnel endpoint")
            .attr("ipsec_remote_gw", Attribute::string().required())
            .attr(
                "ipsec_ike_version",
                Attribute::string().optional_computed().one_of(["1", "2"]),
            );

        Schema::new(
            "IPsec service connection from the SASE PoPs to a private network. \
             Create, update and delete wait for the configuration to be applied.",
        )
        .with_id()
        .attr(
            "primary_key",
            Attribute::string().computed().use_state_for_unknown(),
        )
        .attr("alias", Attribute::string().required().length(1, 35))
        .attr("ipsec_remote_gw", Attribute::string().required())
        .attr(
            "ipsec_ike_version",
            Attribute::string().optional_computed().one_of(["1", "2"]),
        )
        .attr(
            "authentication",
            Attribute::string().optional_computed().one_of(["psk", "pki"]),
        )
        .attr(
            "ipsec_pre_shared_key",
            Attribute::string().optional().sensitive().length(6, 128),
        )
        .attr(
            "ipsec_cert_name",
            Attribute::object(Reference::schema(&[Datasource::LocalCertificates])).optional(),
        )
        .attr("bgp_peer_ip", Attribute::string().optional_computed())
        .attr("overlay_network_id", Attribute::string().optional_computed())
        .attr("route_map_tag", Attribute::string().optional_computed())
        .attr("backup_links", Attribute::list_of(backup_link).optional().size(0, 4))
        .attr(
            "config_state",
            Attribute::string()
                .computed()
                .describe("Backend apply status: `success` once the PoPs carry the tunnel."),
        )
    }

    async fn create(
        &self,
        ctx: &ProviderContext,
        plan: ServiceConnection,
    ) -> Result<ServiceConnection, CoreError> {
        let input = InputModel::new().with_body(Self::expand(&plan));
        let resp = ctx.api().create(CONNECTIONS_PATH, &input).await?;
        let id = response_primary_key(&resp).ok_or_else(|| CoreError::MissingId {
            resource: Self::TYPE_NAME.into(),
            field: "primaryKey".into(),
        })?;
        debug!(%id, "service connection created, waiting for apply");

        let data = wait_applied(ctx, &id).await?;
        let mut state = Self::flatten(&data, &plan)?;
        state.id = Some(id.clone());
        state.primary_key = Some(id.clone());
        info!(resource = Self::TYPE_NAME, %id, "created");
        Ok(state)
    }

    async fn read(
        &self,
        ctx: &ProviderContext,
        state: ServiceConnection,
    ) -> Result<Option<ServiceConnection>, CoreError> {
        let id = Self::stored_id(&state)?;
        match ctx
            .api()
            .read(CONNECTIONS_PATH, &InputModel::keyed(id.as_str()))
            .await
        {
            Ok(data) => Ok(Some(Self::flatten(&data, &state)?)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn update(
        &self,
        ctx: &ProviderContext,
        prior: ServiceConnection,
        plan: ServiceConnection,
    ) -> Result<ServiceConnection, CoreError> {
        let id = Self::stored_id(&prior)?;
        let input = InputModel::keyed(id.as_str()).with_body(Self::expand(&plan));
        ctx.api().update(CONNECTIONS_PATH, &input).await?;

        let data = wait_applied(ctx, &id).await?;
        let mut state = Self::flatten(&data, &plan)?;
        state.id = Some(id.clone());
        state.primary_key = Some(id.clone());
        info!(resource = Self::TYPE_NAME, %id, "updated");
        Ok(state)
    }

    async fn delete(&self, ctx: &ProviderContext, state: ServiceConnection) -> Result<(), CoreError> {
        let id = Self::stored_id(&state)?;
        let input = InputModel::keyed(id.as_str());
        match ctx.api().delete(CONNECTIONS_PATH, &input).await {
            Ok(_) => {}
            Err(e) if e.is_not_found() => return Ok(()),
            Err(e) => return Err(e.into()),
        }

        let what = format!("deletion of service connection {id}");
        let input = &input;
        poll_until(&ctx.poll().delete, ctx.cancel_token(), &what, |_| async move {
            // Any read failure counts as gone; the API answers some deleted
            // connections with 500 rather than 404.
            let status = match ctx.api().read(CONNECTIONS_PATH, input).await {
                Ok(data) if !data.is_empty() => PollStatus::Pending(
                    Fields::root(&data)
                        .string("config_state")
                        .ok()
                        .flatten()
                        .unwrap_or_else(|| "still present".into()),
                ),
                _ => PollStatus::Ready(()),
            };
            Ok::<_, CoreError>(status)
        })
        .await?;

        info!(resource = Self::TYPE_NAME, %id, "deleted");
        Ok(())
    }

    fn import_state(&self, id: &str) -> Result<ServiceConnection, CoreError> {
        let key = require_import_id(id)?;
        Ok(ServiceConnection {
            id: Some(key.clone()),
            primary_key: Some(key),
            ..ServiceConnection::default()
        })
    }
}

// ── Region cost ──────────────────────────────────────────────────────

/// Region keys are written `us_east_1` in configuration and `us-east-1`
/// on the wire.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegionCost {
    pub id: Option<String>,
    pub service_connection_id: Option<String>,
    pub region_cost: Option<BTreeMap<String, f64>>,
}

pub struct ServiceConnectionRegionCost;

impl ServiceConnectionRegionCost {
    const TYPE_NAME: &'static str = "fortisase_private_access_service_connection_region_cost";

    fn input(connection: &str) -> InputModel {
        InputModel::new().with_path_param("service_connection_id", connection)
    }

    fn connection_id(model: &RegionCost) -> Result<String, CoreError> {
        model
            .service_connection_id
            .clone()
            .ok_or_else(|| CoreError::MissingId {
                resource: Self::TYPE_NAME.into(),
                field: "service_connection_id".into(),
            })
    }

    fn expand(model: &RegionCost) -> JsonMap {
        let wire: Option<BTreeMap<String, f64>> = model.region_cost.as_ref().map(|costs| {
            costs
                .iter()
                .map(|(region, cost)| (region.replace('_', "-"), *cost))
                .collect()
        });
        let mut body = Body::new();
        body.put_number_map("region_cost", wire.as_ref());
        body.into_map()
    }

    fn flatten(data: &JsonMap, known: &RegionCost) -> Result<RegionCost, DecodeError> {
        let costs = Fields::root(data).number_map("region_cost")?.map(|costs| {
            costs
                .into_iter()
                .map(|(region, cost)| (region.replace('-', "_"), cost))
                .collect()
        });
        Ok(RegionCost {
            id: known.id.clone(),
            service_connection_id: known.service_connection_id.clone(),
            region_cost: costs,
        })
    }

    async fn apply(ctx: &ProviderContext, plan: &RegionCost) -> Result<RegionCost, CoreError> {
        let connection = Self::connection_id(plan)?;
        let input = Self::input(&connection).with_body(Self::expand(plan));
        ctx.api().update(REGION_COST_PATH, &input).await?;

        wait_applied(ctx, &connection).await?;

        let data = ctx
            .api()
            .read(REGION_COST_PATH, &Self::input(&connection))
            .await?;
        let mut state = Self::flatten(&data, plan)?;
        state.id = Some(connection.clone());
        info!(resource = Self::TYPE_NAME, %connection, "region cost applied");
        Ok(state)
    }
}

#[async_trait]
impl Resource for ServiceConnectionRegionCost {
    type Model = RegionCost;

    fn type_name(&self) -> &'static str {
        Self::TYPE_NAME
    }

    fn schema(&self) -> Schema {
        Schema::new(
            "Per-region routing cost of a service connection. \
             Destroying it only removes it from state.",
        )
        .with_id()
        .attr(
            "service_connection_id",
            Attribute::string().required().requires_replace(),
        )
        .attr(
            "region_cost",
            Attribute::map_of(AttrKind::Number)
                .required()
                .between(0.0, 255.0)
                .describe("Cost per region, keyed like `us_east_1`."),
        )
    }

    async fn create(&self, ctx: &ProviderContext, plan: RegionCost) -> Result<RegionCost, CoreError> {
        Self::apply(ctx, &plan).await
    }

    async fn read(
        &self,
        ctx: &ProviderContext,
        state: RegionCost,
    ) -> Result<Option<RegionCost>, CoreError> {
        let connection = Self::connection_id(&state)?;
        match ctx
            .api()
            .read(REGION_COST_PATH, &Self::input(&connection))
            .await
        {
            Ok(data) => Ok(Some(Self::flatten(&data, &state)?)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn update(
        &self,
        ctx: &ProviderContext,
        _prior: RegionCost,
        plan: RegionCost,
    ) -> Result<RegionCost, CoreError> {
        Self::apply(ctx, &plan).await
    }

    async fn delete(&self, _ctx: &ProviderContext, state: RegionCost) -> Result<(), CoreError> {
        debug!(
            connection = state.service_connection_id.as_deref().unwrap_or_default(),
            "region cost has no backend delete, removing from state only"
        );
        Ok(())
    }

    fn import_state(&self, id: &str) -> Result<RegionCost, CoreError> {
        let connection = require_import_id(id)?;
        Ok(RegionCost {
            id: Some(connection.clone()),
            service_connection_id: Some(connection),
            region_cost: None,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::{Value, json};

    use super::*;

    fn object(value: Value) -> JsonMap {
        match value {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[test]
    fn apply_status_classifies_config_state() {
        let ready = apply_status(object(json!({ "config_state": "success" })), "sc").unwrap();
        assert!(matches!(ready, PollStatus::Ready(_)));

        let pending = apply_status(object(json!({ "config_state": "updating" })), "sc").unwrap();
        assert_eq!(pending, PollStatus::Pending("updating".into()));

        let err = apply_status(object(json!({ "config_state": "failed" })), "sc").unwrap_err();
        assert!(matches!(err, CoreError::PollFailed { ref state, .. } if state == "failed"));
    }

    #[test]
    fn region_keys_are_hyphenated_on_the_wire() {
        let model = RegionCost {
            service_connection_id: Some("sc-1".into()),
            region_cost: Some(BTreeMap::from([
                ("us_east_1".to_owned(), 10.0),
                ("europe_west_2".to_owned(), 20.0),
            ])),
            ..RegionCost::default()
        };
        let wire = ServiceConnectionRegionCost::expand(&model);
        assert_eq!(
            Value::Object(wire.clone()),
            json!({ "region_cost": { "europe-west-2": 20, "us-east-1": 10 } })
        );
        assert_eq!(
            ServiceConnectionRegionCost::flatten(&wire, &model).unwrap(),
            model
        );
    }

    #[test]
    fn service_connection_round_trip_keeps_psk() {
        let model = ServiceConnection {
            primary_key: Some("sc-1".into()),
            alias: Some("dc-east".into()),
            ipsec_remote_gw: Some("198.51.100.7".into()),
            ipsec_ike_version: Some("2".into()),
            authentication: Some("psk".into()),
            ipsec_pre_shared_key: Some("correct horse".into()),
            backup_links: Some(vec![BackupLink {
                ipsec_remote_gw: "198.51.100.8".into(),
                ipsec_ike_version: None,
            }]),
            ..ServiceConnection::default()
        };
        let mut wire = ServiceConnections::expand(&model);
        wire.remove("ipsec_pre_shared_key");
        wire.insert("primaryKey".into(), json!("sc-1"));
        assert_eq!(ServiceConnections::flatten(&wire, &model).unwrap(), model);
    }

    #[test]
    fn backup_link_errors_name_the_index() {
        let wire = object(json!({
            "backup_links": [
                { "ipsec_remote_gw": "198.51.100.8" },
                { "ipsec_remote_gw": ["bad"] },
            ],
        }));
        let err = ServiceConnections::flatten(&wire, &ServiceConnection::default()).unwrap_err();
        assert_eq!(err.path, "backup_links[1].ipsec_remote_gw");
    }
}
