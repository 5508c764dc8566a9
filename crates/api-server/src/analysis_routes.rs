//! Analysis API routes.
//!
//! Endpoints for full ticker analysis (prices + profile + scored news)
//! and the lightweight price-only quote.

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};

use sentiment_core::{
    AnalysisReport, FeedError, HistoryRange, PriceQuote, QuoteError, Ticker,
};

use crate::{ApiResponse, AppError, AppState};

const MAX_NEWS_LIMIT: u32 = 50;

#[derive(Deserialize)]
pub struct AnalyzeQuery {
    pub ticker: String,
    #[serde(default)]
    pub range: Option<String>,
    #[serde(default)]
    pub limit: Option<u32>,
}

#[derive(Deserialize)]
pub struct PriceQuery {
    pub ticker: String,
}

pub fn analysis_routes() -> Router<AppState> {
    Router::new()
        .route("/api/analyze", get(analyze_ticker))
        .route("/api/price", get(get_price))
        .route("/health", get(health))
}

async fn analyze_ticker(
    State(state): State<AppState>,
    Query(query): Query<AnalyzeQuery>,
) -> Result<Json<ApiResponse<AnalysisReport>>, AppError> {
    let ticker = Ticker::parse(&query.ticker).map_err(|e| AppError::BadRequest(e.to_string()))?;
    let range = match query.range.as_deref() {
        Some(raw) => raw
            .parse::<HistoryRange>()
            .map_err(|e| AppError::BadRequest(e.to_string()))?,
        None => HistoryRange::default(),
    };
    let limit = query.limit.map(|l| l.clamp(1, MAX_NEWS_LIMIT));

    let report = state
        .orchestrator
        .analyze(&ticker, range, limit)
        .await
        .map_err(|e| AppError::ModelUnavailable(e.to_string()))?;

    if report.all_sections_failed() {
        return Err(AppError::BadGateway(
            "all upstream feeds failed".to_string(),
        ));
    }

    Ok(Json(ApiResponse::success(report)))
}

async fn get_price(
    State(state): State<AppState>,
    Query(query): Query<PriceQuery>,
) -> Result<Json<ApiResponse<PriceQuote>>, AppError> {
    let ticker = Ticker::parse(&query.ticker).map_err(|e| AppError::BadRequest(e.to_string()))?;

    let quote = state
        .orchestrator
        .price_quote(&ticker)
        .await
        .map_err(|e| match e {
            QuoteError::Feed(FeedError::NotFound) => {
                AppError::NotFound(format!("no data for ticker {}", ticker))
            }
            other => AppError::BadGateway(other.to_string()),
        })?;

    Ok(Json(ApiResponse::success(quote)))
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
