//! HTTP surface for the report renderer.
//!
//! - `POST /api/generate-excel` : workbook attachment
//! - `POST /api/generate-ppt`   : deck attachment
//! - `GET  /api/health`         : liveness

pub mod config;
mod handlers;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use reportkit_render::SpecBrandAssets;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub use config::SpecServerConfig;
pub use handlers::*;

/// Shared read-only state.
#[derive(Clone)]
pub struct ApiState {
    pub assets: Arc<SpecBrandAssets>,
}

impl ApiState {
    #[must_use]
    pub fn new(assets: SpecBrandAssets) -> Self {
        Self {
            assets: Arc::new(assets),
        }
    }
}

impl Default for ApiState {
    fn default() -> Self {
        Self::new(SpecBrandAssets::default())
    }
}

pub fn build_router(state: ApiState) -> Router {
    Router::new()
        .route("/api/health", get(health_check))
        .route(
            "/api/generate-excel",
            post(generate_excel).get(health_excel).options(preflight),
        )
        .route(
            "/api/generate-ppt",
            post(generate_ppt).get(health_ppt).options(preflight),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Bind `addr` and serve until the process stops.
pub async fn start_server(addr: &str, state: ApiState) -> Result<(), std::io::Error> {
    tracing::info!("Starting report server on {}", addr);
    let listener = TcpListener::bind(addr).await?;
    serve(listener, state).await
}

/// Serve on an already bound listener.
pub async fn serve(listener: TcpListener, state: ApiState) -> Result<(), std::io::Error> {
    axum::serve(listener, build_router(state)).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_state_default_uses_embedded_assets() {
        let state = ApiState::default();
        assert!(!state.assets.logo_png.is_empty());
        assert!(!state.assets.background_png.is_empty());
    }
}
