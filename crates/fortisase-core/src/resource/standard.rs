// ── Generic CRUD orchestration ──
//
// Most resources are a plain configuration object: create, read back,
// update in place, delete. `ApiObject` describes one such object type and
// `StandardResource` drives its lifecycle.

use std::marker::PhantomData;

use async_trait::async_trait;
use fortisase_api::{InputModel, JsonMap};
use tracing::{debug, info, warn};

use super::{Model, Resource, response_primary_key};
use crate::codec::DecodeError;
use crate::context::ProviderContext;
use crate::error::CoreError;
use crate::schema::Schema;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
    /// POST to create, DELETE to destroy; the API may assign the key.
    Collection,
    /// Always exists server side: create is a PUT on the client key,
    /// delete only forgets state.
    Singleton,
}

/// Static description of one configuration object type.
pub trait ApiObject: Send + Sync + 'static {
    type Model: Model;

    const TYPE_NAME: &'static str;
    /// Path template relative to the API root.
    const PATH: &'static str;
    const KIND: ObjectKind = ObjectKind::Collection;
    /// Named lock held across create, update and delete.
    const LOCK: Option<&'static str> = None;

    fn schema() -> Schema;

    /// Client-chosen key, if the model carries one.
    fn primary_key(model: &Self::Model) -> Option<String>;

    fn id(model: &Self::Model) -> Option<&str>;

    fn set_id(model: &mut Self::Model, id: String);

    /// Values for `{name}` placeholders in `PATH`.
    fn path_params(_model: &Self::Model) -> Vec<(&'static str, String)> {
        Vec::new()
    }

    /// Request body. `prior` is set on update.
    fn expand(model: &Self::Model, prior: Option<&Self::Model>) -> JsonMap;

    /// Response body to model. `known` is the plan or prior state, for
    /// values the API never echoes back.
    fn flatten(data: &JsonMap, known: &Self::Model) -> Result<Self::Model, DecodeError>;

    fn import(id: &str) -> Result<Self::Model, CoreError>;
}

/// `Resource` implementation shared by every `ApiObject`.
pub struct StandardResource<O>(PhantomData<fn() -> O>);

impl<O> StandardResource<O> {
    pub const fn new() -> Self {
        Self(PhantomData)
    }
}

impl<O> Default for StandardResource<O> {
    fn default() -> Self {
        Self::new()
    }
}

impl<O: ApiObject> StandardResource<O> {
    fn input(model: &O::Model) -> InputModel {
        O::path_params(model)
            .into_iter()
            .fold(InputModel::new(), |input, (name, value)| {
                input.with_path_param(name, value)
            })
    }

    fn missing_id() -> CoreError {
        CoreError::MissingId {
            resource: O::TYPE_NAME.into(),
            field: "id".into(),
        }
    }

    fn stored_id(model: &O::Model) -> Result<String, CoreError> {
        O::id(model).map(str::to_owned).ok_or_else(Self::missing_id)
    }

    async fn read_back(
        ctx: &ProviderContext,
        key: &str,
        known: &O::Model,
    ) -> Result<O::Model, CoreError> {
        let input = Self::input(known).with_mkey(key);
        let data = ctx.api().read(O::PATH, &input).await?;
        let mut state = O::flatten(&data, known)?;
        O::set_id(&mut state, key.to_owned());
        Ok(state)
    }
}

#[async_trait]
impl<O: ApiObject> Resource for StandardResource<O> {
    type Model = O::Model;

    fn type_name(&self) -> &'static str {
        O::TYPE_NAME
    }

    fn schema(&self) -> Schema {
        O::schema()
    }

    async fn create(&self, ctx: &ProviderContext, plan: O::Model) -> Result<O::Model, CoreError> {
        let _guard = ctx.lock(O::LOCK).await;
        let body = O::expand(&plan, None);

        let key = match O::KIND {
            ObjectKind::Collection => {
                debug!(resource = O::TYPE_NAME, "create");
                let resp = ctx
                    .api()
                    .create(O::PATH, &Self::input(&plan).with_body(body))
                    .await?;
                match response_primary_key(&resp) {
                    Some(key) => key,
                    None => {
                        warn!(
                            resource = O::TYPE_NAME,
                            "create response carried no primaryKey, using the planned key"
                        );
                        O::primary_key(&plan).ok_or_else(Self::missing_id)?
                    }
                }
            }
            ObjectKind::Singleton => {
                let key = O::primary_key(&plan).ok_or_else(Self::missing_id)?;
                debug!(resource = O::TYPE_NAME, %key, "create singleton");
                let input = Self::input(&plan).with_mkey(key.as_str()).with_body(body);
                ctx.api().update(O::PATH, &input).await?;
                key
            }
        };

        let state = Self::read_back(ctx, &key, &plan).await?;
        info!(resource = O::TYPE_NAME, id = %key, "created");
        Ok(state)
    }

    async fn read(
        &self,
        ctx: &ProviderContext,
        state: O::Model,
    ) -> Result<Option<O::Model>, CoreError> {
        let id = Self::stored_id(&state)?;
        debug!(resource = O::TYPE_NAME, %id, "read");
        match Self::read_back(ctx, &id, &state).await {
            Ok(fresh) => Ok(Some(fresh)),
            Err(e) if e.is_not_found() => {
                info!(resource = O::TYPE_NAME, %id, "gone, removing from state");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    async fn update(
        &self,
        ctx: &ProviderContext,
        prior: O::Model,
        plan: O::Model,
    ) -> Result<O::Model, CoreError> {
        let _guard = ctx.lock(O::LOCK).await;
        let id = Self::stored_id(&prior)?;
        debug!(resource = O::TYPE_NAME, %id, "update");

        let body = O::expand(&plan, Some(&prior));
        let input = Self::input(&plan).with_mkey(id.as_str()).with_body(body);
        ctx.api().update(O::PATH, &input).await?;

        let state = Self::read_back(ctx, &id, &plan).await?;
        info!(resource = O::TYPE_NAME, %id, "updated");
        Ok(state)
    }

    async fn delete(&self, ctx: &ProviderContext, state: O::Model) -> Result<(), CoreError> {
        let _guard = ctx.lock(O::LOCK).await;
        let id = Self::stored_id(&state)?;

        if O::KIND == ObjectKind::Singleton {
            debug!(resource = O::TYPE_NAME, %id, "singleton, removing from state only");
            return Ok(());
        }

        let input = Self::input(&state).with_mkey(id.as_str());
        match ctx.api().delete(O::PATH, &input).await {
            Ok(_) => {
                info!(resource = O::TYPE_NAME, %id, "deleted");
                Ok(())
            }
            Err(e) if e.is_not_found() => {
                debug!(resource = O::TYPE_NAME, %id, "already gone");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    fn import_state(&self, id: &str) -> Result<O::Model, CoreError> {
        O::import(id)
    }
}
