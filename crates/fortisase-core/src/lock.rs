// ── Named resource locks ──
//
// Serializes mutations against backend objects that are implicitly linked
// (policies sharing profile groups, auth servers sharing one namespace).
// Process-local only; nothing here coordinates separate provider runs.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, trace};

/// Policies, filter profiles and profile-group clones.
pub const PROFILE_GROUP: &str = "profile-group";

/// LDAP and RADIUS servers.
pub const AUTH_SERVERS: &str = "auth-servers";

#[derive(Debug, Default)]
pub struct LockRegistry {
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl LockRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for the named lock. Released when the guard drops.
    pub async fn acquire(&self, name: &str) -> NamedGuard {
        let mutex = Arc::clone(
            self.locks
                .entry(name.to_owned())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .value(),
        );

        debug!(lock = name, "waiting for lock");
        let guard = mutex.lock_owned().await;
        debug!(lock = name, "lock acquired");

        NamedGuard {
            name: name.to_owned(),
            _guard: guard,
        }
    }

    /// Number of distinct lock names seen so far.
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}

#[derive(Debug)]
pub struct NamedGuard {
    name: String,
    _guard: OwnedMutexGuard<()>,
}

impl NamedGuard {
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Drop for NamedGuard {
    fn drop(&mut self) {
        trace!(lock = %self.name, "lock released");
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn same_name_is_exclusive() {
        let locks = LockRegistry::new();
        let held = locks.acquire(PROFILE_GROUP).await;

        let second = tokio::time::timeout(Duration::from_millis(50), locks.acquire(PROFILE_GROUP));
        assert!(second.await.is_err(), "second holder got in");

        drop(held);
        let again = tokio::time::timeout(Duration::from_millis(50), locks.acquire(PROFILE_GROUP));
        assert!(again.await.is_ok());
    }

    #[tokio::test]
    async fn different_names_do_not_block() {
        let locks = LockRegistry::new();
        let _profile = locks.acquire(PROFILE_GROUP).await;
        let auth = tokio::time::timeout(Duration::from_millis(50), locks.acquire(AUTH_SERVERS));
        assert_eq!(auth.await.map(|g| g.name().to_owned()).ok().as_deref(), Some(AUTH_SERVERS));
        assert_eq!(locks.len(), 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_holders_never_overlap() {
        let locks = Arc::new(LockRegistry::new());
        let inside = Arc::new(AtomicUsize::new(0));
        let max_seen = Arc::new(AtomicUsize::new(0));

        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let locks = Arc::clone(&locks);
                let inside = Arc::clone(&inside);
                let max_seen = Arc::clone(&max_seen);
                tokio::spawn(async move {
                    let _guard = locks.acquire(AUTH_SERVERS).await;
                    let now = inside.fetch_add(1, Ordering::SeqCst) + 1;
                    max_seen.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(5)).await;
                    inside.fetch_sub(1, Ordering::SeqCst);
                })
            })
            .collect();

        for task in tasks {
            task.await.ok();
        }
        assert_eq!(max_seen.load(Ordering::SeqCst), 1);
    }
}
