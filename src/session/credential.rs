// SPDX-License-Identifier: GPL-3.0-only
use tokio::sync::RwLock;
use tracing::info;
use crate::session::models::Credential;

/// Holds the identity-provider assertion for the signed-in user.
/// Login and logout happen outside this crate; we only mirror the result.
#[derive(Debug, Default)]
pub struct CredentialStore {
    current: RwLock<Option<Credential>>,
}

impl CredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn current(&self) -> Option<Credential> {
        self.current.read().await.clone()
    }

    pub async fn set(&self, credential: Credential) {
        info!(email = %credential.email, "Credential stored");
        *self.current.write().await = Some(credential);
    }

    pub async fn clear(&self) {
        if self.current.write().await.take().is_some() {
            info!("Credential cleared");
        }
    }
}
