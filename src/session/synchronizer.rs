// SPDX-License-Identifier: GPL-3.0-only
use futures_util::future::{BoxFuture, FutureExt, Shared};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, error, info, warn};
use crate::backend::ProfileBackend;
use crate::session::cache::ProfileCache;
use crate::session::models::{BackendProfile, Credential, NewUser};

type PendingSync = Shared<BoxFuture<'static, Option<BackendProfile>>>;
type InFlightSlot = Arc<Mutex<Option<PendingSync>>>;

/// Creates-or-fetches the backend profile for a credential.
///
/// At most one sync runs at a time: callers arriving while one is pending
/// await that same operation instead of starting another. The sync itself
/// runs on its own task, so it completes even if every caller goes away.
pub struct Synchronizer {
    cache: Arc<ProfileCache>,
    backend: Arc<dyn ProfileBackend>,
    in_flight: InFlightSlot,
}

/// Empties the in-flight slot when the sync task ends, including by panic.
struct InFlightReset(InFlightSlot);

impl Drop for InFlightReset {
    fn drop(&mut self) {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).take();
    }
}

impl Synchronizer {
    pub fn new(cache: Arc<ProfileCache>, backend: Arc<dyn ProfileBackend>) -> Self {
        Self {
            cache,
            backend,
            in_flight: Arc::new(Mutex::new(None)),
        }
    }

    /// Backend profile for `credential`, or `None` when the backend could not
    /// produce a synced one. Failures are logged here and never returned.
    pub async fn sync_user_with_backend(&self, credential: &Credential) -> Option<BackendProfile> {
        let pending = {
            let mut slot = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
            match slot.as_ref() {
                Some(pending) => {
                    debug!(email = %credential.email, "Joining in-flight profile sync");
                    pending.clone()
                }
                None => {
                    // The task cannot clear the slot before we fill it: its
                    // reset takes the same lock we are holding.
                    let pending = self.start(credential.clone());
                    *slot = Some(pending.clone());
                    pending
                }
            }
        };

        pending.await
    }

    fn start(&self, credential: Credential) -> PendingSync {
        let cache = Arc::clone(&self.cache);
        let backend = Arc::clone(&self.backend);
        let reset = InFlightReset(Arc::clone(&self.in_flight));

        let task = tokio::spawn(async move {
            let _reset = reset;
            run_sync(&cache, backend.as_ref(), &credential).await
        });

        async move {
            match task.await {
                Ok(profile) => profile,
                Err(e) => {
                    error!(error = %e, "Profile sync task failed");
                    None
                }
            }
        }
        .boxed()
        .shared()
    }
}

async fn run_sync(
    cache: &ProfileCache,
    backend: &dyn ProfileBackend,
    credential: &Credential,
) -> Option<BackendProfile> {
    if let Some(cached) = cache.read().await {
        debug!(email = %credential.email, "Using cached backend profile");
        return Some(cached);
    }

    info!(email = %credential.email, "Syncing user with backend");

    let profile = match backend.create_user(&NewUser::from(credential)).await {
        Ok(profile) => profile,
        Err(e) => {
            warn!(error = %e, email = %credential.email, "Backend sync failed");
            return None;
        }
    };

    if !profile.is_synced() {
        warn!(email = %credential.email, "Backend returned a profile without an id");
        return None;
    }

    if let Err(e) = cache.write(&profile).await {
        error!(error = %e, "Failed to cache backend profile");
        return None;
    }

    info!(user_id = profile.id.as_deref().unwrap_or_default(), "User synced with backend");
    Some(profile)
}
