// SPDX-License-Identifier: GPL-3.0-only
pub mod models;
pub mod cache;
pub mod credential;
pub mod synchronizer;
pub mod service;

pub use models::{BackendProfile, Credential, NewUser};
pub use cache::ProfileCache;
pub use credential::CredentialStore;
pub use synchronizer::Synchronizer;
pub use service::{ProfileUpdateError, SessionService};
