//! Command handlers and the per-invocation session they share.

pub mod config_cmd;
pub mod lifecycle;
pub mod resources;
pub mod state_cmd;
pub mod util;

use std::path::PathBuf;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use fortisase_core::{DynResource, ProviderContext, ResourceRegistry};

use crate::cli::{Command, GlobalOpts};
use crate::config::{self, Config};
use crate::error::CliError;
use crate::output;
use crate::state::StateFile;

/// What every handler needs: the registry, the config and where state lives.
///
/// The API context is built on demand so offline commands (`validate`,
/// `plan`, `state`) work without credentials.
pub struct Session {
    pub registry: ResourceRegistry,
    pub config: Config,
    pub state_path: PathBuf,
    pub color: bool,
    cancel: CancellationToken,
}

impl Session {
    pub fn new(global: &GlobalOpts, config: Config, cancel: CancellationToken) -> Self {
        let state_path = config::state_path(global, &config);
        Self {
            registry: ResourceRegistry::builtin(),
            config,
            state_path,
            color: output::should_color(global.color),
            cancel,
        }
    }

    pub fn resource(&self, type_name: &str) -> Result<Arc<dyn DynResource>, CliError> {
        self.registry
            .get(type_name)
            .ok_or_else(|| CliError::UnknownType {
                type_name: type_name.to_owned(),
            })
    }

    pub fn context(&self, global: &GlobalOpts) -> Result<ProviderContext, CliError> {
        let provider = config::resolve_provider_config(global, &self.config)?;
        tracing::debug!(hostname = %provider.hostname, "building provider context");
        Ok(ProviderContext::from_config(&provider)?.with_cancellation(self.cancel.clone()))
    }

    pub fn load_state(&self) -> Result<StateFile, CliError> {
        StateFile::load(&self.state_path)
    }

    pub fn save_state(&self, state: &StateFile) -> Result<(), CliError> {
        state.save(&self.state_path)
    }
}

/// Dispatch everything except `config` and `completions`.
pub async fn dispatch(
    cmd: Command,
    global: &GlobalOpts,
    session: &Session,
) -> Result<(), CliError> {
    match cmd {
        Command::Resources(args) => resources::handle(args, session, global),
        Command::Validate(args) => lifecycle::validate(&args, session, global),
        Command::Plan(args) => lifecycle::plan(&args, session, global),
        Command::Apply(args) => lifecycle::apply(&args, session, global).await,
        Command::Refresh(args) => lifecycle::refresh(&args, session, global).await,
        Command::Destroy(args) => lifecycle::destroy(&args, session, global).await,
        Command::Import(args) => lifecycle::import(&args, session, global).await,
        Command::State(args) => state_cmd::handle(args, session, global),
        Command::Config(_) | Command::Completions(_) => Err(CliError::Validation {
            field: "command".into(),
            reason: "handled before dispatch".into(),
        }),
    }
}
