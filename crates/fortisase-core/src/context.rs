// ── Provider context ──
//
// Everything a resource handler needs besides its own model: the API
// client, the named lock registry, poll tuning and a cancellation token.
// Cheap to clone; every clone shares the same locks and token.

use std::sync::Arc;

use fortisase_api::ResourceApi;
use tokio_util::sync::CancellationToken;

use crate::config::{PollSettings, ProviderConfig};
use crate::error::CoreError;
use crate::lock::{LockRegistry, NamedGuard};

#[derive(Clone)]
pub struct ProviderContext {
    api: Arc<dyn ResourceApi>,
    locks: Arc<LockRegistry>,
    poll: PollSettings,
    cancel: CancellationToken,
}

impl ProviderContext {
    pub fn new(api: Arc<dyn ResourceApi>) -> Self {
        Self {
            api,
            locks: Arc::new(LockRegistry::new()),
            poll: PollSettings::default(),
            cancel: CancellationToken::new(),
        }
    }

    /// Build the HTTP client described by `config` and wrap it.
    pub fn from_config(config: &ProviderConfig) -> Result<Self, CoreError> {
        let client = config.build_client()?;
        Ok(Self::new(Arc::new(client)).with_poll_settings(config.poll.clone()))
    }

    #[must_use]
    pub fn with_poll_settings(mut self, poll: PollSettings) -> Self {
        self.poll = poll;
        self
    }

    #[must_use]
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn api(&self) -> &dyn ResourceApi {
        self.api.as_ref()
    }

    pub fn locks(&self) -> &LockRegistry {
        &self.locks
    }

    pub fn poll(&self) -> &PollSettings {
        &self.poll
    }

    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Acquire `group` if the resource declares one.
    pub async fn lock(&self, group: Option<&str>) -> Option<NamedGuard> {
        match group {
            Some(name) => Some(self.locks.acquire(name).await),
            None => None,
        }
    }
}

impl std::fmt::Debug for ProviderContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderContext")
            .field("locks", &self.locks.len())
            .field("poll", &self.poll)
            .field("cancelled", &self.cancel.is_cancelled())
            .finish_non_exhaustive()
    }
}
