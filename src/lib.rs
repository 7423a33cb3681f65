use std::sync::Arc;

use axum::{middleware, routing::get, Router};
use tracing::{error, info};

pub mod auth;
pub mod config;
pub mod errors;
pub mod http;
pub mod logging;
pub mod store;
pub mod transport;

use config::{Config, CorsConfig};
use store::{RecordStore, StoreError};

#[derive(Clone)]
pub struct AppState {
    pub api_key: Option<Arc<str>>,
    pub store: Arc<dyn RecordStore>,
}

impl AppState {
    pub fn new(api_key: Option<String>, store: Arc<dyn RecordStore>) -> Self {
        Self {
            api_key: api_key.map(Arc::<str>::from),
            store,
        }
    }
}

/// Acquires the table handle and wires the router. Nothing is served if this fails.
pub async fn initialize(config: &Config) -> Result<Router, StoreError> {
    let store = store::connect(&config.table).await.inspect_err(|err| {
        error!(
            table = %config.table.name,
            region = %config.table.region,
            error = %err,
            "error during application startup"
        );
    })?;

    info!(
        table = store.table_name(),
        region = %config.table.region,
        api_key_required = config.api_key.is_some(),
        "application initialized"
    );

    let state = AppState::new(config.api_key.clone(), store);
    Ok(build_app(state, &config.cors))
}

pub fn build_app(state: AppState, cors: &CorsConfig) -> Router {
    let resources = http::records::router(state.clone());
    compose(state, cors, resources)
}

/// Mounts an externally defined resource router next to the shell's own routes.
pub fn compose(state: AppState, cors: &CorsConfig, resources: Router<AppState>) -> Router {
    Router::new()
        .route("/", get(http::handlers::root))
        .route("/health", get(http::handlers::health))
        .merge(resources)
        .fallback(http::handlers::not_found)
        .method_not_allowed_fallback(http::handlers::method_not_allowed)
        .layer(middleware::from_fn(logging::request_logging_middleware))
        .layer(cors.layer())
        .with_state(state)
}
