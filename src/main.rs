// SPDX-License-Identifier: GPL-3.0-only
mod api;
mod backend;
mod config;
mod logging;
mod session;
mod storage;
mod stores;
mod utils;
mod validation;

#[cfg(test)]
mod test_helpers;

use std::sync::Arc;
use tokio::signal;
use tracing::{error, info};

use api::{ApiHandlers, HttpServer};
use backend::{BackendClient, ProfileBackend};
use config::Config;
use logging::setup_logging;
use session::SessionService;
use storage::{KeyValueStore, SqliteStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = Config::load()?;
    
    // Initialize logging
    setup_logging(&config.log_level, config.log_format)?;
    
    info!("Starting verge-core v{}", env!("CARGO_PKG_VERSION"));
    
    if let Some(parent) = config.data_db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    
    let store: Arc<dyn KeyValueStore> = Arc::new(SqliteStore::new(&config.data_db_path).await?);
    info!(path = %config.data_db_path.display(), "Local storage initialized");
    
    let backend: Arc<dyn ProfileBackend> = Arc::new(BackendClient::new(
        config.backend_api_url.clone(),
        config.backend_api_key.clone(),
        config.request_timeout(),
    )?);
    
    let session = Arc::new(SessionService::new(Arc::clone(&store), backend));
    
    // Warm start: report whether a synced profile survived the last run
    match session.get_user_session().await {
        Some(profile) => info!(email = %profile.email, "Restored cached session"),
        None => info!("No cached session; starting as guest"),
    }
    
    let handlers = ApiHandlers::new(session, store, config.platform_fee);
    let http_server = HttpServer::new(handlers, config.local_api_bind);
    let http_task = tokio::spawn(async move {
        if let Err(e) = http_server.serve().await {
            error!(error = %e, "HTTP server error");
        }
    });
    
    info!("All services started. Waiting for shutdown signal...");
    
    match signal::ctrl_c().await {
        Ok(()) => {
            info!("Received shutdown signal (Ctrl+C)");
        }
        Err(err) => {
            error!(error = %err, "Unable to listen for shutdown signal");
        }
    }
    
    info!("Initiating graceful shutdown...");
    http_task.abort();
    
    info!("Shutdown complete");
    Ok(())
}
