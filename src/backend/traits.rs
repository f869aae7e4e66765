// SPDX-License-Identifier: GPL-3.0-only
use async_trait::async_trait;
use serde_json::{Map, Value};
use crate::session::models::{BackendProfile, NewUser};

#[derive(thiserror::Error, Debug)]
pub enum BackendError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Backend returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Malformed backend response: {0}")]
    Malformed(String),
}

/// Festival backend operations used by the session layer
#[async_trait]
pub trait ProfileBackend: Send + Sync {
    /// Create the user record, or return the existing one for this email
    async fn create_user(&self, user: &NewUser) -> Result<BackendProfile, BackendError>;
    
    /// Look a user up by email
    async fn get_user_by_email(&self, email: &str) -> Result<Option<BackendProfile>, BackendError>;
    
    /// Look a user up by server id
    async fn get_user_by_id(&self, id: &str) -> Result<Option<BackendProfile>, BackendError>;
    
    /// Apply field changes; returns whatever fields the server echoes back
    async fn update_user(
        &self,
        id: &str,
        changes: &Map<String, Value>,
    ) -> Result<Map<String, Value>, BackendError>;
    
    /// Ask the backend to email a verification code
    async fn send_verification_code(&self, email: &str) -> Result<(), BackendError>;
    
    /// Confirm a previously emailed verification code
    async fn confirm_verification_code(&self, email: &str, code: &str) -> Result<(), BackendError>;
}
