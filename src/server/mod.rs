//! Server-side modules for the Pawlog sync server.

pub mod auth;
pub mod config;
pub mod routes;
pub mod storage;

pub use config::{hash_key, ApiKeyEntry, ApiKeyStore, AuthClient, ConfigFile, ServerConfig};
pub use storage::{Record, ServerStorage, ServerStorageError, SERVER_UPDATED_AT};

use axum::{
    middleware,
    routing::{get, put},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub api_keys: Arc<ApiKeyStore>,
    pub storage: ServerStorage,
}

impl AppState {
    pub fn new(api_keys: ApiKeyStore, storage: ServerStorage) -> Self {
        Self {
            api_keys: Arc::new(api_keys),
            storage,
        }
    }
}

/// Builds the full router: public `/health` plus the authenticated record API.
pub fn router(state: AppState) -> Router {
    let public_routes = Router::new().route("/health", get(routes::health));

    let protected_routes = Router::new()
        .route("/v1/{collection}", get(routes::list_records))
        .route(
            "/v1/{collection}/{id}",
            put(routes::put_record).delete(routes::delete_record),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::auth_middleware,
        ));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}
