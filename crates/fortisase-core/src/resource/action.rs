// ── Action resources ──
//
// Imperative operations modeled as resources: fire once on create, then
// wait for the backend to settle. There is nothing to read back or delete,
// so read echoes state and delete only forgets it.

use std::marker::PhantomData;

use async_trait::async_trait;
use fortisase_api::{InputModel, JsonMap};
use tracing::{debug, info};

use super::{Model, Resource};
use crate::context::ProviderContext;
use crate::error::CoreError;
use crate::poll;
use crate::schema::Schema;

pub trait Action: Send + Sync + 'static {
    type Model: Model;

    const TYPE_NAME: &'static str;
    const PATH: &'static str;
    const LOCK: Option<&'static str> = None;

    fn schema() -> Schema;

    fn path_params(_model: &Self::Model) -> Vec<(&'static str, String)> {
        Vec::new()
    }

    fn body(model: &Self::Model) -> JsonMap;

    /// Identifier derived from the action's inputs.
    fn derive_id(model: &Self::Model) -> String;

    fn set_id(model: &mut Self::Model, id: String);
}

pub struct ActionResource<A>(PhantomData<fn() -> A>);

impl<A> ActionResource<A> {
    pub const fn new() -> Self {
        Self(PhantomData)
    }
}

impl<A> Default for ActionResource<A> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<A: Action> Resource for ActionResource<A> {
    type Model = A::Model;

    fn type_name(&self) -> &'static str {
        A::TYPE_NAME
    }

    fn schema(&self) -> Schema {
        A::schema()
    }

    async fn create(&self, ctx: &ProviderContext, plan: A::Model) -> Result<A::Model, CoreError> {
        let guard = ctx.lock(A::LOCK).await;

        let input = A::path_params(&plan)
            .into_iter()
            .fold(InputModel::new(), |input, (name, value)| {
                input.with_path_param(name, value)
            })
            .with_body(A::body(&plan));
        debug!(resource = A::TYPE_NAME, "firing action");
        ctx.api().create(A::PATH, &input).await?;
        // The lock only covers the write; settling waits without it.
        drop(guard);

        poll::settle(ctx.poll().settle, ctx.cancel_token(), A::TYPE_NAME).await?;

        let mut state = plan;
        let id = A::derive_id(&state);
        A::set_id(&mut state, id);
        info!(resource = A::TYPE_NAME, "action completed");
        Ok(state)
    }

    async fn read(
        &self,
        _ctx: &ProviderContext,
        state: A::Model,
    ) -> Result<Option<A::Model>, CoreError> {
        Ok(Some(state))
    }

    /// Every input forces replacement, so an update only ever carries
    /// the prior identity forward.
    async fn update(
        &self,
        _ctx: &ProviderContext,
        prior: A::Model,
        plan: A::Model,
    ) -> Result<A::Model, CoreError> {
        let mut state = plan;
        let id = A::derive_id(&prior);
        A::set_id(&mut state, id);
        Ok(state)
    }

    async fn delete(&self, _ctx: &ProviderContext, _state: A::Model) -> Result<(), CoreError> {
        Ok(())
    }

    fn import_state(&self, id: &str) -> Result<A::Model, CoreError> {
        Err(CoreError::InvalidImportId {
            id: id.to_owned(),
            reason: format!("{} cannot be imported", A::TYPE_NAME),
        })
    }
}
