//! HTTP transport for the ticker analysis pipeline.
//!
//! Two endpoints plus a liveness probe. All payloads ride in a uniform
//! `{ success, data, error }` envelope; partial analysis data is still a
//! 200 because each report section carries its own error marker.

use std::sync::Arc;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use analysis_orchestrator::AnalysisOrchestrator;
use finbert_client::ClassifierCache;
use yahoo_client::{FeedConfig, YahooClient};

pub mod analysis_routes;

/// Standard response envelope.
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

/// Handler-level failures, mapped onto status codes at the boundary.
#[derive(Debug)]
pub enum AppError {
    BadRequest(String),
    NotFound(String),
    ModelUnavailable(String),
    BadGateway(String),
    Internal(anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest(m) => (StatusCode::BAD_REQUEST, m),
            AppError::NotFound(m) => (StatusCode::NOT_FOUND, m),
            AppError::ModelUnavailable(m) => (StatusCode::SERVICE_UNAVAILABLE, m),
            AppError::BadGateway(m) => (StatusCode::BAD_GATEWAY, m),
            AppError::Internal(e) => {
                tracing::error!(error = %e, "unhandled error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_string(),
                )
            }
        };

        (status, Json(ApiResponse::<()>::error(message))).into_response()
    }
}

impl<E: Into<anyhow::Error>> From<E> for AppError {
    fn from(e: E) -> Self {
        AppError::Internal(e.into())
    }
}

#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<AnalysisOrchestrator>,
}

/// Builds the full application router over a prepared state. Split out so
/// tests can drive the router without binding a socket.
pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(analysis_routes::analysis_routes())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn run_server() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let feed = Arc::new(YahooClient::new(FeedConfig::from_env()));
    let classifier_cache = Arc::new(ClassifierCache::from_env());

    if classifier_cache.config().prewarm {
        tracing::info!("pre-warming sentiment classifier");
        if let Err(e) = classifier_cache.warm().await {
            // Terminal for the process: analysis requests will replay this
            // failure, price-only requests keep working.
            tracing::error!(error = %e, "classifier pre-warm failed");
        }
    }

    let state = AppState {
        orchestrator: Arc::new(AnalysisOrchestrator::new(feed, classifier_cache)),
    };

    let host = std::env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port = std::env::var("API_PORT")
        .ok()
        .and_then(|p| p.parse::<u16>().ok())
        .unwrap_or(8000);

    let addr = format!("{}:{}", host, port);
    tracing::info!(%addr, "api server listening");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app(state)).await?;

    Ok(())
}
