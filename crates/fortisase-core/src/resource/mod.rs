// ── Resource lifecycle ──
//
// `Resource` is the typed lifecycle every resource type implements.
// `StandardResource` covers the common collection/singleton shape and
// `ActionResource` the fire-and-settle one; eventually-consistent
// resources implement `Resource` directly. `DynResource` erases the
// model type for the registry.

mod action;
mod registry;
mod standard;

use std::fmt::Debug;

use async_trait::async_trait;
use fortisase_api::JsonMap;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::context::ProviderContext;
use crate::error::CoreError;
use crate::schema::Schema;

pub use action::{Action, ActionResource};
pub use registry::{DynResource, Plan, PlanAction, ResourceRegistry, Response, unknown_type};
pub use standard::{ApiObject, ObjectKind, StandardResource};

/// Bounds shared by every resource model.
pub trait Model:
    Clone + Debug + Default + PartialEq + Serialize + DeserializeOwned + Send + Sync + 'static
{
}

impl<T> Model for T where
    T: Clone + Debug + Default + PartialEq + Serialize + DeserializeOwned + Send + Sync + 'static
{
}

#[async_trait]
pub trait Resource: Send + Sync + 'static {
    type Model: Model;

    /// Terraform type name, e.g. `fortisase_network_hosts`.
    fn type_name(&self) -> &'static str;

    fn schema(&self) -> Schema;

    async fn create(&self, ctx: &ProviderContext, plan: Self::Model)
    -> Result<Self::Model, CoreError>;

    /// `Ok(None)` when the object no longer exists.
    async fn read(
        &self,
        ctx: &ProviderContext,
        state: Self::Model,
    ) -> Result<Option<Self::Model>, CoreError>;

    async fn update(
        &self,
        ctx: &ProviderContext,
        prior: Self::Model,
        plan: Self::Model,
    ) -> Result<Self::Model, CoreError>;

    async fn delete(&self, ctx: &ProviderContext, state: Self::Model) -> Result<(), CoreError>;

    /// Seed state from an import id; the next read fills the rest.
    fn import_state(&self, id: &str) -> Result<Self::Model, CoreError>;
}

// ── Shared helpers ───────────────────────────────────────────────────

/// Split `"direction/primary_key"`.
pub fn split_import_id(id: &str, first: &str, second: &str) -> Result<(String, String), CoreError> {
    match id.split_once('/') {
        Some((a, b)) if !a.is_empty() && !b.is_empty() => Ok((a.to_owned(), b.to_owned())),
        _ => Err(CoreError::InvalidImportId {
            id: id.to_owned(),
            reason: format!("expected \"{first}/{second}\""),
        }),
    }
}

/// Reject empty import ids for single-key resources.
pub fn require_import_id(id: &str) -> Result<String, CoreError> {
    let id = id.trim();
    if id.is_empty() {
        Err(CoreError::InvalidImportId {
            id: id.to_owned(),
            reason: "the import id must not be empty".into(),
        })
    } else {
        Ok(id.to_owned())
    }
}

/// Key the API assigned in a create response.
///
/// `primaryKey` is a string for most collections and a number for some
/// server-numbered ones (policies).
pub fn response_primary_key(resp: &JsonMap) -> Option<String> {
    match resp.get("primaryKey")? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
