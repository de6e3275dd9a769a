/// Public library interface for the habit rules service
///
/// This module exports the HTTP server and the public types that can be used
/// by other applications or tests.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tokio::net::TcpListener;

// Internal modules
mod domain;
mod storage;
mod lifecycle;
mod api;

// Re-export public modules and types
pub use domain::*;
pub use storage::{HabitStorage, PageParams, PageRequest, SqliteStorage, StorageError, MAX_PAGE_SIZE};
pub use lifecycle::*;
pub use api::{router, ApiError, AppState, USER_ID_HEADER};

/// Errors that can occur during server operation
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Database error: {0}")]
    Database(#[from] storage::StorageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Runtime settings for the server
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address the HTTP listener binds to
    pub bind: SocketAddr,
    /// Page size for listings that don't ask for one
    pub page_size: u32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([127, 0, 0, 1], 8000)),
            page_size: 10,
        }
    }
}

/// Main habit server exposing the REST endpoints
///
/// This server keeps habits in a SQLite database and runs the habit rules
/// before every create and update.
pub struct HabitServer {
    storage: Arc<Mutex<SqliteStorage>>,
    config: ServerConfig,
}

impl HabitServer {
    /// Create a new habit server with the specified database path
    ///
    /// This will initialize the SQLite database with the required schema
    /// if it doesn't already exist.
    pub fn new(db_path: PathBuf, config: ServerConfig) -> Result<Self, ServerError> {
        tracing::info!("Initializing habit server with database: {:?}", db_path);

        let storage = SqliteStorage::new(db_path)?;

        Ok(Self {
            storage: Arc::new(Mutex::new(storage)),
            config,
        })
    }

    /// Router serving this server's storage
    pub fn router(&self) -> axum::Router {
        router(AppState::new(self.storage.clone(), self.config.page_size))
    }

    /// Serve HTTP until Ctrl-C
    pub async fn run(self) -> Result<(), ServerError> {
        let listener = TcpListener::bind(self.config.bind).await?;
        tracing::info!("Habit server listening on {}", listener.local_addr()?);

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        Ok(())
    }

    /// Get the shared storage handle (useful for testing)
    pub fn storage(&self) -> &Arc<Mutex<SqliteStorage>> {
        &self.storage
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
