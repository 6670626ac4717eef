use crate::config::ApiConfig;
use crate::model::{PublicationRequest, PublishResult};
use crate::ports::MatchesIndexRepository;
use crate::publisher::{PublishError, ShotsPublisher};
use anyhow::{Context, Result};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info, instrument, warn};

/// Fixed message returned for every non-validation failure
pub const PUBLISH_FAILED_DETAIL: &str = "Falló la publicación en Supabase";

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub publisher: Arc<ShotsPublisher>,
    pub index: Arc<dyn MatchesIndexRepository>,
    pub service_name: String,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub detail: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(status: StatusCode, detail: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            detail: detail.into(),
        }),
    )
}

/// Create the API router
pub fn create_router(state: AppState, config: &ApiConfig) -> Router {
    let cors = if config.cors_enabled {
        if config.cors_origins.is_empty() {
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
        } else {
            let origins: Vec<_> = config
                .cors_origins
                .iter()
                .filter_map(|o| o.parse().ok())
                .collect();
            CorsLayer::new()
                .allow_origin(origins)
                .allow_methods(Any)
                .allow_headers(Any)
        }
    } else {
        CorsLayer::new()
    };

    Router::new()
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
        .route("/v1/shots/publish", post(publish_shots))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Health check endpoint
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": state.service_name
    }))
}

/// Readiness check endpoint
async fn readiness_check(State(state): State<AppState>) -> impl IntoResponse {
    match state.index.ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "status": "ready"
            })),
        ),
        Err(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(serde_json::json!({
                "status": "not_ready",
                "error": e.to_string()
            })),
        ),
    }
}

/// Publish a shots file and index it
#[instrument(skip(state, payload))]
async fn publish_shots(
    State(state): State<AppState>,
    payload: Result<Json<PublicationRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<PublishResult>), ApiError> {
    let Json(request) = payload.map_err(|rejection| {
        warn!(error = %rejection, "Rejected malformed publish request");
        api_error(StatusCode::UNPROCESSABLE_ENTITY, rejection.body_text())
    })?;

    match state.publisher.publish(&request).await {
        Ok(result) => {
            metrics::counter!("shots.publish.succeeded").increment(1);
            info!(
                match_id = %result.match_id,
                storage_path = %result.storage_path,
                size_bytes = result.size_bytes,
                "Shots published"
            );
            Ok((StatusCode::CREATED, Json(result)))
        }
        Err(PublishError::Validation(e)) => {
            metrics::counter!("shots.publish.rejected").increment(1);
            Err(api_error(StatusCode::BAD_REQUEST, e.to_string()))
        }
        Err(e) => {
            metrics::counter!("shots.publish.failed").increment(1);
            error!(
                error = %e,
                match_id = %request.match_id,
                storage_path = %request.storage_path,
                "Failed to publish shots"
            );
            Err(api_error(StatusCode::BAD_GATEWAY, PUBLISH_FAILED_DETAIL))
        }
    }
}

/// Start the API server, stopping once `shutdown` resolves
pub async fn start_api_server(
    state: AppState,
    config: &ApiConfig,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<()> {
    let router = create_router(state, config);
    let addr = format!("{}:{}", config.host, config.port);

    info!(address = %addr, "Starting publish API server");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await
        .context("API server error")?;

    Ok(())
}
