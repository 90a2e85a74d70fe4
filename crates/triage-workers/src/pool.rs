use std::path::PathBuf;
use std::sync::Arc;

use rand::seq::SliceRandom;
use tracing::{info, warn};

use triage_core::config::WorkersConfig;
use triage_store::Store;

use crate::api::{Connect, UserApi};
use crate::error::{Result, WorkerError};
use crate::identity::{enumerate_identities, ProxyDescriptor, WorkerIdentity};

/// A connected worker session leased from the pool.
///
/// The holder has exclusive use of the identity and must call
/// [`LeasedWorker::release`] on every exit path.
pub struct LeasedWorker {
    pub identity: WorkerIdentity,
    api: Box<dyn UserApi>,
}

impl std::fmt::Debug for LeasedWorker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LeasedWorker")
            .field("identity", &self.identity)
            .finish()
    }
}

impl LeasedWorker {
    pub fn api(&self) -> &dyn UserApi {
        self.api.as_ref()
    }

    /// Disconnect the session.
    pub async fn release(self) {
        self.api.disconnect().await;
    }
}

/// Enumerates worker identities and hands them out under the per-identity
/// group-creation quota. The quota count is read from the repository and
/// is advisory (capacity planning, not a hard invariant).
pub struct WorkerPool {
    sessions_dir: PathBuf,
    group_limit: u32,
    proxy: triage_core::config::ProxyConfig,
    store: Store,
    connector: Arc<dyn Connect>,
}

impl WorkerPool {
    pub fn new(config: &WorkersConfig, store: Store, connector: Arc<dyn Connect>) -> Self {
        Self {
            sessions_dir: PathBuf::from(&config.sessions_dir),
            group_limit: config.group_limit,
            proxy: config.proxy.clone(),
            store,
            connector,
        }
    }

    /// Pick an identity fit for creating a new operator group.
    ///
    /// Shuffles for fairness, skips identities at or over the group quota,
    /// then connects lazily — unauthorized or unreachable sessions are
    /// skipped too. Returns [`WorkerError::Exhausted`] when nothing
    /// qualifies; the caller surfaces that as a visible operational error.
    pub async fn acquire_for_group_creation(&self) -> Result<LeasedWorker> {
        let mut identities = enumerate_identities(&self.sessions_dir)?;
        identities.shuffle(&mut rand::rng());

        for identity in identities {
            let created = match self.store.count_groups_created_by(&identity.name) {
                Ok(n) => n,
                Err(e) => {
                    warn!(identity = %identity.name, error = %e, "group count lookup failed, skipping");
                    continue;
                }
            };
            if created >= self.group_limit {
                info!(
                    identity = %identity.name,
                    created,
                    limit = self.group_limit,
                    "identity at group limit, skipping"
                );
                continue;
            }

            match self.connect_checked(&identity).await {
                Ok(api) => {
                    info!(identity = %identity.name, created, "worker identity acquired");
                    return Ok(LeasedWorker { identity, api });
                }
                Err(e) => {
                    warn!(identity = %identity.name, error = %e, "identity unusable, skipping");
                }
            }
        }

        warn!("no worker identity available: all at group limit, unauthorized or failing");
        Err(WorkerError::Exhausted)
    }

    /// Open a named identity without capacity checks. Used by the janitor:
    /// groups must be deleted by the identity that created them.
    pub async fn by_name(&self, name: &str) -> Result<LeasedWorker> {
        let identity = enumerate_identities(&self.sessions_dir)?
            .into_iter()
            .find(|i| i.name == name)
            .ok_or_else(|| WorkerError::UnknownIdentity {
                name: name.to_string(),
            })?;
        let api = self.connect_checked(&identity).await?;
        Ok(LeasedWorker { identity, api })
    }

    /// Connect and verify authorization; disconnects on failure.
    async fn connect_checked(&self, identity: &WorkerIdentity) -> Result<Box<dyn UserApi>> {
        let proxy = ProxyDescriptor::sticky(&self.proxy, &identity.name);
        let api = self.connector.connect(identity, &proxy).await?;
        match api.is_authorized().await {
            Ok(true) => Ok(api),
            Ok(false) => {
                api.disconnect().await;
                Err(WorkerError::Unauthorized {
                    name: identity.name.clone(),
                })
            }
            Err(e) => {
                api.disconnect().await;
                Err(e)
            }
        }
    }
}
