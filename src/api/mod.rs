/// HTTP surface for the habit service
///
/// Routes mirror the REST layout clients already use, trailing slashes
/// included. All state lives behind one mutex so a request's
/// read-validate-write sequence can't interleave with another writer.

pub mod error;
pub mod handlers;

pub use error::ApiError;
pub use handlers::USER_ID_HEADER;

use axum::{
    routing::{delete, get, post, put},
    Router,
};
use std::sync::{Arc, Mutex};
use tower_http::trace::TraceLayer;

use crate::storage::SqliteStorage;

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub storage: Arc<Mutex<SqliteStorage>>,
    /// Page size used when a request doesn't ask for one
    pub page_size: u32,
}

impl AppState {
    pub fn new(storage: Arc<Mutex<SqliteStorage>>, page_size: u32) -> Self {
        Self { storage, page_size }
    }
}

/// Build the router with every habit endpoint
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/habits/create/", post(handlers::create))
        .route("/habits/list/", get(handlers::list))
        .route("/habits/public/", get(handlers::public_list))
        .route("/habits/:id/", get(handlers::retrieve))
        .route("/habits/:id/update/", put(handlers::update))
        .route("/habits/:id/delete/", delete(handlers::delete))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
