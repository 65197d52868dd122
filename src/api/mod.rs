use axum::{
    Router,
    http::HeaderValue,
    middleware,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::constants::intervals::DATABASE_WAIT;
use crate::db::{Storage, Store};
use crate::services::{
    AuthService, Clock, StoreAuthService, StoreVaultService, SystemClock, VaultService,
};

pub mod auth;
mod data;
mod error;
mod observability;
mod system;
mod types;

pub use error::ApiError;
pub use types::*;

use metrics_exporter_prometheus::PrometheusHandle;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,

    pub store: Arc<dyn Storage>,

    pub auth: Arc<dyn AuthService>,

    pub vault: Arc<dyn VaultService>,

    pub start_time: std::time::Instant,

    pub prometheus_handle: Option<PrometheusHandle>,
}

/// Wires the services over an already opened store.
#[must_use]
pub fn create_app_state(
    config: Config,
    store: Arc<dyn Storage>,
    clock: Arc<dyn Clock>,
    prometheus_handle: Option<PrometheusHandle>,
) -> Arc<AppState> {
    let auth: Arc<dyn AuthService> = Arc::new(StoreAuthService::new(
        store.clone(),
        clock,
        &config.auth,
        config.security.clone(),
    ));

    let vault: Arc<dyn VaultService> = Arc::new(StoreVaultService::new(store.clone(), auth.clone()));

    Arc::new(AppState {
        config: Arc::new(config),
        store,
        auth,
        vault,
        start_time: std::time::Instant::now(),
        prometheus_handle,
    })
}

/// Connects to the configured database, waiting for it if needed, and
/// builds the state on the wall clock.
pub async fn create_app_state_from_config(
    config: Config,
    prometheus_handle: Option<PrometheusHandle>,
) -> anyhow::Result<Arc<AppState>> {
    let store = Store::connect_with_retry(
        &config.general.database_path,
        config.general.max_db_connections,
        config.general.min_db_connections,
        DATABASE_WAIT,
    )
    .await?;

    Ok(create_app_state(
        config,
        Arc::new(store),
        Arc::new(SystemClock),
        prometheus_handle,
    ))
}

pub fn router(state: Arc<AppState>) -> Router {
    let cors_origins = state.config.server.cors_allowed_origins.clone();

    let api_router = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/health", get(system::health))
        .route("/data", post(data::upload).get(data::list_names))
        .route("/data/{name}", get(data::get_data))
        .route("/metrics", get(observability::get_metrics))
        .with_state(state);

    let cors_layer = if cors_origins.iter().any(|o| o == "*") {
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> =
            cors_origins.iter().filter_map(|s| s.parse().ok()).collect();
        CorsLayer::new().allow_origin(origins)
    };

    Router::new()
        .nest("/api", api_router)
        .layer(cors_layer.allow_methods(Any).allow_headers(Any))
        .layer(middleware::from_fn(observability::logging_middleware))
        .layer(TraceLayer::new_for_http())
}
