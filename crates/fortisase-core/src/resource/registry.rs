// ── Type-erased resources ──
//
// `DynResource` exposes any `Resource` over JSON state so that a protocol
// shim or the CLI can drive resources by type name. Errors are folded into
// diagnostics here; nothing below this layer sees `Diagnostics`.

use std::sync::Arc;

use async_trait::async_trait;
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use super::{Model, Resource};
use crate::context::ProviderContext;
use crate::diag::{Diagnostic, Diagnostics};
use crate::error::CoreError;
use crate::schema::{AttrMode, Schema, values_equal};

/// New state plus whatever went wrong producing it.
///
/// `state` is `None` when the resource does not exist (after delete, or a
/// read that found nothing) or when an error prevented producing it.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Response {
    pub state: Option<Value>,
    pub diagnostics: Diagnostics,
}

impl Response {
    fn ok(state: Value) -> Self {
        Self {
            state: Some(state),
            diagnostics: Diagnostics::new(),
        }
    }

    fn failed(diagnostics: Diagnostics) -> Self {
        Self {
            state: None,
            diagnostics,
        }
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.has_errors()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PlanAction {
    Create,
    Update,
    Replace,
    NoOp,
}

/// What applying `config` over `prior` would do.
#[derive(Debug, Clone, Serialize)]
pub struct Plan {
    pub action: PlanAction,
    /// Attributes that differ from prior state.
    pub changed: Vec<String>,
    /// Subset of `changed` that forces replacement.
    pub replace_paths: Vec<String>,
    pub diagnostics: Diagnostics,
}

#[async_trait]
pub trait DynResource: Send + Sync {
    fn type_name(&self) -> &'static str;

    fn schema(&self) -> Schema;

    fn validate(&self, config: &Value) -> Diagnostics;

    fn plan(&self, prior: Option<&Value>, config: &Value) -> Plan;

    async fn create(&self, ctx: &ProviderContext, config: &Value) -> Response;

    async fn read(&self, ctx: &ProviderContext, state: &Value) -> Response;

    async fn update(&self, ctx: &ProviderContext, prior: &Value, config: &Value) -> Response;

    async fn delete(&self, ctx: &ProviderContext, state: &Value) -> Diagnostics;

    fn import_state(&self, id: &str) -> Response;
}

struct Erased<R>(R);

impl<R: Resource> Erased<R> {
    fn decode<M: Model>(&self, value: &Value, what: &str) -> Result<M, Diagnostics> {
        serde_json::from_value(value.clone()).map_err(|e| {
            Diagnostics::from(CoreError::Validation {
                resource: self.0.type_name().into(),
                message: format!("cannot decode {what}: {e}"),
            })
        })
    }

    fn encode(&self, model: &R::Model) -> Response {
        match serde_json::to_value(model) {
            Ok(state) => Response::ok(state),
            Err(e) => Response::failed(
                CoreError::Internal(format!("cannot encode {} state: {e}", self.0.type_name()))
                    .into(),
            ),
        }
    }

    fn checked_plan(&self, config: &Value) -> Result<R::Model, Diagnostics> {
        let diags = self.0.schema().validate(config);
        if diags.has_errors() {
            return Err(diags);
        }
        self.decode(config, "configuration")
    }
}

#[async_trait]
impl<R: Resource> DynResource for Erased<R> {
    fn type_name(&self) -> &'static str {
        self.0.type_name()
    }

    fn schema(&self) -> Schema {
        self.0.schema()
    }

    fn validate(&self, config: &Value) -> Diagnostics {
        match self.checked_plan(config) {
            Ok(_) => Diagnostics::new(),
            Err(diags) => diags,
        }
    }

    fn plan(&self, prior: Option<&Value>, config: &Value) -> Plan {
        let diagnostics = self.validate(config);
        let Some(prior) = prior else {
            return Plan {
                action: PlanAction::Create,
                changed: Vec::new(),
                replace_paths: Vec::new(),
                diagnostics,
            };
        };

        let schema = self.0.schema();
        let changed = changed_attributes(&schema, prior, config);
        let replace_paths = schema.replace_paths(prior, config);
        let action = if !replace_paths.is_empty() {
            PlanAction::Replace
        } else if changed.is_empty() {
            PlanAction::NoOp
        } else {
            PlanAction::Update
        };

        Plan {
            action,
            changed,
            replace_paths,
            diagnostics,
        }
    }

    async fn create(&self, ctx: &ProviderContext, config: &Value) -> Response {
        let plan = match self.checked_plan(config) {
            Ok(plan) => plan,
            Err(diags) => return Response::failed(diags),
        };
        match self.0.create(ctx, plan).await {
            Ok(state) => self.encode(&state),
            Err(e) => Response::failed(e.into()),
        }
    }

    async fn read(&self, ctx: &ProviderContext, state: &Value) -> Response {
        let current = match self.decode::<R::Model>(state, "state") {
            Ok(current) => current,
            Err(diags) => return Response::failed(diags),
        };
        match self.0.read(ctx, current).await {
            Ok(Some(fresh)) => self.encode(&fresh),
            Ok(None) => Response::default(),
            Err(e) => Response::failed(e.into()),
        }
    }

    async fn update(&self, ctx: &ProviderContext, prior: &Value, config: &Value) -> Response {
        let plan = match self.checked_plan(config) {
            Ok(plan) => plan,
            Err(diags) => return Response::failed(diags),
        };
        let replace = self.0.schema().replace_paths(prior, config);
        if !replace.is_empty() {
            return Response::failed(
                CoreError::RequiresReplace {
                    resource: self.0.type_name().into(),
                    attributes: replace,
                }
                .into(),
            );
        }
        let prior = match self.decode::<R::Model>(prior, "prior state") {
            Ok(prior) => prior,
            Err(diags) => return Response::failed(diags),
        };
        match self.0.update(ctx, prior, plan).await {
            Ok(state) => self.encode(&state),
            Err(e) => Response::failed(e.into()),
        }
    }

    async fn delete(&self, ctx: &ProviderContext, state: &Value) -> Diagnostics {
        let current = match self.decode::<R::Model>(state, "state") {
            Ok(current) => current,
            Err(diags) => return diags,
        };
        match self.0.delete(ctx, current).await {
            Ok(()) => Diagnostics::new(),
            Err(e) => e.into(),
        }
    }

    fn import_state(&self, id: &str) -> Response {
        match self.0.import_state(id) {
            Ok(model) => self.encode(&model),
            Err(e) => Response::failed(e.into()),
        }
    }
}

/// Configurable attributes whose configured value differs from prior
/// state. Unset optional+computed attributes keep the API's value.
fn changed_attributes(schema: &Schema, prior: &Value, config: &Value) -> Vec<String> {
    schema
        .attributes
        .iter()
        .filter(|(_, attr)| attr.is_configurable())
        .filter_map(|(name, attr)| {
            let planned = config.get(*name).unwrap_or(&Value::Null);
            if planned.is_null() && attr.mode == AttrMode::OptionalComputed {
                return None;
            }
            let before = prior.get(*name).unwrap_or(&Value::Null);
            (!values_equal(before, planned)).then(|| (*name).to_owned())
        })
        .collect()
}

// ── Registry ─────────────────────────────────────────────────────────

/// Resource types by Terraform type name.
#[derive(Default)]
pub struct ResourceRegistry {
    resources: IndexMap<&'static str, Arc<dyn DynResource>>,
}

impl ResourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every resource type this crate ships.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        crate::resources::register_all(&mut registry);
        registry
    }

    pub fn register<R: Resource>(&mut self, resource: R) {
        let name = resource.type_name();
        debug!(resource = name, "registering resource type");
        self.resources.insert(name, Arc::new(Erased(resource)));
    }

    pub fn get(&self, type_name: &str) -> Option<Arc<dyn DynResource>> {
        self.resources.get(type_name).cloned()
    }

    pub fn type_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.resources.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn DynResource>> {
        self.resources.values()
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}

impl std::fmt::Debug for ResourceRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.resources.keys()).finish()
    }
}

/// Error diagnostic for an unknown type name.
pub fn unknown_type(type_name: &str) -> Diagnostic {
    Diagnostic::error(
        "Unknown resource type",
        format!("\"{type_name}\" is not a FortiSASE resource type"),
    )
}
