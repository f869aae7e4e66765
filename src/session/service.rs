// SPDX-License-Identifier: GPL-3.0-only
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, warn};
use crate::backend::{BackendError, ProfileBackend};
use crate::session::cache::ProfileCache;
use crate::session::credential::CredentialStore;
use crate::session::models::{BackendProfile, Credential, NewUser};
use crate::session::synchronizer::Synchronizer;
use crate::storage::KeyValueStore;
use crate::validation::validate_profile_changes;

#[derive(thiserror::Error, Debug)]
pub enum ProfileUpdateError {
    #[error("No synced profile; sign in again")]
    NotSynced,

    #[error("Invalid profile fields: {0:?}")]
    Invalid(BTreeMap<String, String>),

    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error("Failed to store profile: {0}")]
    Storage(#[from] anyhow::Error),
}

/// Everything the app asks about "the current user"
pub struct SessionService {
    credentials: CredentialStore,
    cache: Arc<ProfileCache>,
    synchronizer: Synchronizer,
    backend: Arc<dyn ProfileBackend>,
}

impl SessionService {
    pub fn new(store: Arc<dyn KeyValueStore>, backend: Arc<dyn ProfileBackend>) -> Self {
        let cache = Arc::new(ProfileCache::new(store));
        Self {
            credentials: CredentialStore::new(),
            synchronizer: Synchronizer::new(Arc::clone(&cache), Arc::clone(&backend)),
            cache,
            backend,
        }
    }

    /// Record a fresh identity-provider login and sync it with the backend
    pub async fn sign_in(&self, credential: Credential) -> Option<BackendProfile> {
        self.credentials.set(credential.clone()).await;
        self.synchronizer.sync_user_with_backend(&credential).await
    }

    /// Cached profile, syncing first if a credential is held but nothing is cached
    pub async fn current_user(&self) -> Option<BackendProfile> {
        if let Some(profile) = self.cache.read().await {
            return Some(profile);
        }

        let credential = self.credentials.current().await?;
        self.synchronizer.sync_user_with_backend(&credential).await
    }

    /// Cached profile only; never touches the network
    pub async fn get_user_session(&self) -> Option<BackendProfile> {
        self.cache.read().await
    }

    pub async fn credential(&self) -> Option<Credential> {
        self.credentials.current().await
    }

    pub async fn sign_out(&self) -> anyhow::Result<()> {
        self.credentials.clear().await;
        self.cache.clear().await?;

        info!("Signed out");
        Ok(())
    }

    pub async fn check_email_verified(&self, email: &str) -> bool {
        match self.backend.get_user_by_email(email).await {
            Ok(Some(profile)) => profile.email_verified,
            Ok(None) => false,
            Err(e) => {
                warn!(error = %e, email = %email, "Could not check email verification");
                false
            }
        }
    }

    pub async fn send_verification_code(&self, email: &str) -> Result<(), BackendError> {
        self.backend.send_verification_code(email).await
    }

    /// Confirm the emailed code, then make sure a backend user exists and cache it
    pub async fn confirm_verification_code(
        &self,
        email: &str,
        code: &str,
        name: Option<&str>,
    ) -> anyhow::Result<BackendProfile> {
        self.backend.confirm_verification_code(email, code).await?;

        let profile = match self.backend.get_user_by_email(email).await? {
            Some(profile) => profile,
            None => {
                let name = name
                    .map(str::trim)
                    .filter(|name| !name.is_empty())
                    .unwrap_or_else(|| email.split('@').next().unwrap_or(email));
                let user = NewUser {
                    name: name.to_string(),
                    email: email.to_string(),
                    profile_pic: None,
                    email_verified: Some(true),
                };
                self.backend.create_user(&user).await?
            }
        };

        if !profile.is_synced() {
            return Err(anyhow::anyhow!("Backend returned a user record without an id"));
        }

        self.cache.write(&profile).await?;
        info!(email = %email, "Email verified");
        Ok(profile)
    }

    /// Re-fetch the cached profile from the backend. Keeps the cached copy on failure.
    pub async fn refresh_profile(&self) -> Option<BackendProfile> {
        let cached = self.cache.read().await?;
        let id = cached.id.clone().unwrap_or_default();

        match self.backend.get_user_by_id(&id).await {
            Ok(Some(fresh)) if fresh.is_synced() => match self.cache.write(&fresh).await {
                Ok(()) => Some(fresh),
                Err(e) => {
                    warn!(error = %e, "Failed to cache refreshed profile");
                    Some(cached)
                }
            },
            Ok(_) => {
                warn!(user_id = %id, "Backend has no usable record for cached user");
                Some(cached)
            }
            Err(e) => {
                warn!(error = %e, user_id = %id, "Profile refresh failed");
                Some(cached)
            }
        }
    }

    /// Validate and send profile edits, then cache the merged result
    pub async fn update_profile(
        &self,
        edited: &Map<String, Value>,
    ) -> Result<BackendProfile, ProfileUpdateError> {
        let saved = self.cache.read().await.ok_or(ProfileUpdateError::NotSynced)?;
        let id = saved.id.clone().ok_or(ProfileUpdateError::NotSynced)?;

        let validated = validate_profile_changes(&saved, edited);
        if !validated.is_valid() {
            return Err(ProfileUpdateError::Invalid(validated.field_errors()));
        }

        if validated.changes.is_empty() {
            if validated.cleared.is_empty() {
                return Ok(saved);
            }
            return Err(ProfileUpdateError::Invalid(validated.field_errors()));
        }

        if !validated.cleared.is_empty() {
            warn!(user_id = %id, cleared = ?validated.cleared, "Ignoring emptied profile fields");
        }

        let server_data = self.backend.update_user(&id, &validated.changes).await?;

        let mut updated = saved;
        updated.merge_fields(&validated.changes);
        updated.merge_fields(&server_data);
        self.cache.write(&updated).await?;

        info!(user_id = %id, fields = validated.changes.len(), "Profile updated");
        Ok(updated)
    }
}
