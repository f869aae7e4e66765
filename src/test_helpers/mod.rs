// SPDX-License-Identifier: GPL-3.0-only
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::{HashMap, VecDeque};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::RwLock;

use crate::backend::{BackendError, ProfileBackend};
use crate::config::Config;
use crate::session::models::{BackendProfile, Credential, NewUser};
use crate::storage::KeyValueStore;

/// In-memory key-value store
#[derive(Default)]
pub struct MemoryStore {
    values: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
        Ok(self.values.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> anyhow::Result<()> {
        self.values.write().await.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> anyhow::Result<()> {
        self.values.write().await.remove(key);
        Ok(())
    }

    async fn multi_set(&self, pairs: &[(&str, &str)]) -> anyhow::Result<()> {
        let mut values = self.values.write().await;
        for (key, value) in pairs {
            values.insert(key.to_string(), value.to_string());
        }
        Ok(())
    }

    async fn multi_remove(&self, keys: &[&str]) -> anyhow::Result<()> {
        let mut values = self.values.write().await;
        for key in keys {
            values.remove(*key);
        }
        Ok(())
    }
}

/// Store whose every operation fails
pub struct FailingStore;

#[async_trait]
impl KeyValueStore for FailingStore {
    async fn get(&self, _key: &str) -> anyhow::Result<Option<String>> {
        Err(anyhow::anyhow!("disk unavailable"))
    }

    async fn set(&self, _key: &str, _value: &str) -> anyhow::Result<()> {
        Err(anyhow::anyhow!("disk unavailable"))
    }

    async fn remove(&self, _key: &str) -> anyhow::Result<()> {
        Err(anyhow::anyhow!("disk unavailable"))
    }

    async fn multi_set(&self, _pairs: &[(&str, &str)]) -> anyhow::Result<()> {
        Err(anyhow::anyhow!("disk unavailable"))
    }

    async fn multi_remove(&self, _keys: &[&str]) -> anyhow::Result<()> {
        Err(anyhow::anyhow!("disk unavailable"))
    }
}

/// Scripted create-or-get outcome
pub enum CreateOutcome {
    Profile(BackendProfile),
    Fail(u16),
}

/// Fake festival backend that counts calls and answers from a script
#[derive(Default)]
pub struct ScriptedBackend {
    create_script: Mutex<VecDeque<CreateOutcome>>,
    create_delay: Mutex<Duration>,
    users: Mutex<HashMap<String, BackendProfile>>,
    valid_codes: Mutex<HashMap<String, String>>,
    update_echo: Mutex<Map<String, Value>>,
    pub create_calls: AtomicUsize,
    pub update_calls: Mutex<Vec<(String, Map<String, Value>)>>,
    pub sent_codes: Mutex<Vec<String>>,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the answer of the next create-or-get call
    pub fn push_create(&self, outcome: CreateOutcome) -> &Self {
        self.create_script.lock().unwrap().push_back(outcome);
        self
    }

    /// Keep create-or-get calls in flight for `delay`
    pub fn with_create_delay(self, delay: Duration) -> Self {
        *self.create_delay.lock().unwrap() = delay;
        self
    }

    /// Register an existing user, reachable by email and id
    pub fn add_user(&self, profile: BackendProfile) {
        self.users.lock().unwrap().insert(profile.email.clone(), profile);
    }

    pub fn accept_code(&self, email: &str, code: &str) {
        self.valid_codes.lock().unwrap().insert(email.to_string(), code.to_string());
    }

    /// Fields the update route echoes back
    pub fn echo_on_update(&self, fields: Value) {
        if let Value::Object(map) = fields {
            *self.update_echo.lock().unwrap() = map;
        }
    }

    pub fn create_count(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ProfileBackend for ScriptedBackend {
    async fn create_user(&self, user: &NewUser) -> Result<BackendProfile, BackendError> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);

        let delay = *self.create_delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let outcome = self.create_script.lock().unwrap().pop_front();
        match outcome {
            Some(CreateOutcome::Profile(profile)) => Ok(profile),
            Some(CreateOutcome::Fail(status)) => Err(BackendError::Status {
                status,
                message: "scripted failure".to_string(),
            }),
            None => Ok(BackendProfile {
                id: Some(format!("id-{}", user.email)),
                email: user.email.clone(),
                name: user.name.clone(),
                profile_pic: user.profile_pic.clone(),
                email_verified: user.email_verified.unwrap_or(false),
                extra: Map::new(),
            }),
        }
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<BackendProfile>, BackendError> {
        Ok(self.users.lock().unwrap().get(email).cloned())
    }

    async fn get_user_by_id(&self, id: &str) -> Result<Option<BackendProfile>, BackendError> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .values()
            .find(|profile| profile.id.as_deref() == Some(id))
            .cloned())
    }

    async fn update_user(
        &self,
        id: &str,
        changes: &Map<String, Value>,
    ) -> Result<Map<String, Value>, BackendError> {
        self.update_calls
            .lock()
            .unwrap()
            .push((id.to_string(), changes.clone()));
        Ok(self.update_echo.lock().unwrap().clone())
    }

    async fn send_verification_code(&self, email: &str) -> Result<(), BackendError> {
        self.sent_codes.lock().unwrap().push(email.to_string());
        Ok(())
    }

    async fn confirm_verification_code(&self, email: &str, code: &str) -> Result<(), BackendError> {
        match self.valid_codes.lock().unwrap().get(email) {
            Some(valid) if valid == code => Ok(()),
            _ => Err(BackendError::Status {
                status: 400,
                message: "Invalid code".to_string(),
            }),
        }
    }
}

pub fn test_credential(email: &str) -> Credential {
    Credential {
        display_name: "Test User".to_string(),
        email: email.to_string(),
        photo_url: None,
    }
}

pub fn synced_profile(id: &str, email: &str) -> BackendProfile {
    BackendProfile {
        id: Some(id.to_string()),
        email: email.to_string(),
        name: "Test User".to_string(),
        ..Default::default()
    }
}

/// Memory store and scripted backend behind the trait objects the crate uses
pub fn test_collaborators() -> (Arc<MemoryStore>, Arc<ScriptedBackend>) {
    (Arc::new(MemoryStore::new()), Arc::new(ScriptedBackend::new()))
}

/// Create a test configuration with temporary paths
pub fn create_test_config() -> Config {
    let temp_dir = std::env::temp_dir().join(format!("verge-test-{}", uuid::Uuid::new_v4()));

    Config {
        data_db_path: temp_dir.join("test_verge.db"),
        backend_api_url: "http://localhost:3000".to_string(),
        backend_api_key: None,
        local_api_bind: SocketAddr::from_str("127.0.0.1:0").unwrap(), // Use port 0 to auto-assign
        request_timeout_secs: 5,
        platform_fee: 20,
        log_level: "error".to_string(), // Reduce log noise in tests
        log_format: crate::logging::LogFormat::Pretty,
    }
}

/// Path inside a fresh temporary directory
pub fn temp_db_path() -> (tempfile::TempDir, PathBuf) {
    let dir = tempfile::TempDir::new().expect("Failed to create temp directory");
    let path = dir.path().join("verge.db");
    (dir, path)
}
