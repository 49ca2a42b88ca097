use std::{future::Future, sync::Arc};

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::get,
};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::{clients::health::HealthChecker, models::health::BuildInfo};

pub struct AppState {
    pub health_checker: HealthChecker,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/__health", get(health_check))
        .route("/__gtg", get(good_to_go))
        .route("/__build-info", get(build_info))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn run_api_server<S>(
    listener: TcpListener,
    state: Arc<AppState>,
    shutdown: S,
) -> Result<(), std::io::Error>
where
    S: Future<Output = ()> + Send + 'static,
{
    info!(address = %listener.local_addr()?, "Health check server started");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await
}

async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    // Unhealthy checks are reported in the body, the endpoint itself answers 200.
    Json(state.health_checker.check_all().await)
}

async fn good_to_go(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let status = state.health_checker.gtg().await;

    if status.good_to_go {
        (StatusCode::OK, "OK".to_string())
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            status.message.unwrap_or_default(),
        )
    }
}

async fn build_info() -> impl IntoResponse {
    Json(BuildInfo {
        name: env!("CARGO_PKG_NAME").to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
