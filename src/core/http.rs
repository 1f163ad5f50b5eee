//! HTTP endpoint server using Axum

use axum::{
    extract::{Path, Query, Request, State},
    http::StatusCode,
    middleware::Next,
    response::{Json, Response},
    routing::{get, post},
    Router,
};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use serde_json::{json, Value};
use std::path::Path as FsPath;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;
use tower::ServiceBuilder;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{info, Level};

use crate::analysis::Analyzer;
use crate::error::ApiError;
use crate::metrics::Metrics;
use crate::models::signal::AnalysisEntry;
use crate::services::portfolio;

#[derive(Clone)]
pub struct AppState {
    pub analyzer: Arc<Analyzer>,
    pub health: Arc<RwLock<HealthStatus>>,
    pub metrics: Arc<Metrics>,
    pub start_time: Arc<Instant>,
}

#[derive(Clone, Debug)]
pub struct HealthStatus {
    pub status: String,
}

impl Default for HealthStatus {
    fn default() -> Self {
        Self {
            status: "healthy".to_string(),
        }
    }
}

pub async fn health_check(State(state): State<AppState>) -> Result<Json<Value>, StatusCode> {
    let health = state.health.read().await;
    let uptime_seconds = state.start_time.elapsed().as_secs();
    Ok(Json(json!({
        "status": health.status,
        "uptime_seconds": uptime_seconds,
        "service": "equitix-signal-engine"
    })))
}

pub async fn metrics_handler(State(state): State<AppState>) -> Result<String, StatusCode> {
    state
        .metrics
        .export()
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)
}

/// Middleware to track HTTP request metrics
async fn metrics_middleware(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    state.metrics.http_requests_in_flight.inc();

    let response = next.run(request).await;
    let status = response.status();
    let duration = start.elapsed();

    state.metrics.http_requests_in_flight.dec();
    state.metrics.http_requests_total.inc();
    state
        .metrics
        .http_request_duration_seconds
        .observe(duration.as_secs_f64());

    if status.is_server_error() {
        tracing::error!(
            method = %method,
            path = %path,
            status = %status,
            duration_ms = duration.as_millis(),
            "HTTP request error"
        );
    }

    response
}

#[derive(Debug, Deserialize)]
struct DateQuery {
    date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
struct AnalyzeRequest {
    symbols: Vec<String>,
    date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
struct PurgeRequest {
    days: i64,
}

/// Active indicator/classification configuration.
async fn get_config(State(state): State<AppState>) -> Json<Value> {
    Json(json!(state.analyzer.config()))
}

/// Cache-first analysis of a single symbol.
async fn get_signal(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
    Query(query): Query<DateQuery>,
) -> Result<Json<Value>, ApiError> {
    let report = state
        .analyzer
        .analyze(std::slice::from_ref(&symbol), query.date)
        .await;

    match report.records.into_iter().next() {
        Some(AnalysisEntry::Record { record, source }) => {
            let mut body = json!(record);
            body["source"] = json!(source);
            Ok(Json(body))
        }
        Some(AnalysisEntry::Error(entry)) => Err(ApiError::Upstream(entry.error)),
        None => Err(ApiError::BadRequest(format!("invalid symbol: {}", symbol))),
    }
}

/// Batch analysis for an arbitrary symbol list.
async fn analyze(
    State(state): State<AppState>,
    Json(request): Json<AnalyzeRequest>,
) -> Result<Json<Value>, ApiError> {
    if request.symbols.is_empty() {
        return Err(ApiError::BadRequest(
            "symbols must be a non-empty list".to_string(),
        ));
    }

    let report = state.analyzer.analyze(&request.symbols, request.date).await;
    Ok(Json(json!({
        "records": report.records,
        "cachedCount": report.cached_count,
        "generatedCount": report.generated_count,
        "timestamp": Utc::now(),
    })))
}

/// Analysis of the configured portfolio list.
async fn get_portfolio(
    State(state): State<AppState>,
    Query(query): Query<DateQuery>,
) -> Result<Json<Value>, ApiError> {
    let symbols = portfolio::load_portfolio(FsPath::new(portfolio::PORTFOLIO_FILE));
    let report = state.analyzer.analyze(&symbols, query.date).await;
    let total = report.records.len();
    Ok(Json(json!({
        "records": report.records,
        "totalCount": total,
        "cachedCount": report.cached_count,
        "generatedCount": report.generated_count,
        "timestamp": Utc::now(),
    })))
}

/// Aggregate signal statistics over the portfolio.
async fn get_summary(
    State(state): State<AppState>,
    Query(query): Query<DateQuery>,
) -> Result<Json<Value>, ApiError> {
    let symbols = portfolio::load_portfolio(FsPath::new(portfolio::PORTFOLIO_FILE));
    let report = state.analyzer.analyze(&symbols, query.date).await;

    let records: Vec<_> = report.records.iter().filter_map(|e| e.record()).collect();
    let total = records.len();
    let buys = records
        .iter()
        .filter(|r| r.current_signal.is_buy_side())
        .count();
    let sells = records
        .iter()
        .filter(|r| r.current_signal.is_sell_side())
        .count();
    let holds = total - buys - sells;

    let rsi_values: Vec<f64> = records.iter().filter_map(|r| r.current_rsi).collect();
    let average_rsi = if rsi_values.is_empty() {
        0.0
    } else {
        let avg = rsi_values.iter().sum::<f64>() / rsi_values.len() as f64;
        (avg * 100.0).round() / 100.0
    };

    Ok(Json(json!({
        "totalStocks": total,
        "buySignals": buys,
        "sellSignals": sells,
        "holdSignals": holds,
        "averageRSI": average_rsi,
        "errors": report.error_count(),
        "timestamp": Utc::now(),
    })))
}

/// Raw cached record lookup; 404 when absent.
async fn get_cached(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
    Query(query): Query<DateQuery>,
) -> Result<Json<Value>, ApiError> {
    match state.analyzer.get_cached_record(&symbol, query.date).await {
        Some(record) => Ok(Json(json!(record))),
        None => Err(ApiError::NotFound(format!(
            "no cached record for {}",
            symbol.to_uppercase()
        ))),
    }
}

async fn get_stats(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let stats = state
        .analyzer
        .stats()
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    Ok(Json(json!(stats)))
}

/// Retention sweep: delete records older than the requested number of days.
async fn purge(
    State(state): State<AppState>,
    Json(request): Json<PurgeRequest>,
) -> Result<Json<Value>, ApiError> {
    if request.days <= 0 {
        return Err(ApiError::BadRequest(
            "days must be a positive integer".to_string(),
        ));
    }

    let deleted = state
        .analyzer
        .purge_older_than(request.days)
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    info!(days = request.days, deleted = deleted, "purged old records");
    Ok(Json(json!({ "deletedCount": deleted })))
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(metrics_handler))
        .route("/api/config", get(get_config))
        .route("/api/signals/{symbol}", get(get_signal))
        .route("/api/analyze", post(analyze))
        .route("/api/portfolio", get(get_portfolio))
        .route("/api/summary", get(get_summary))
        .route("/api/cache/{symbol}", get(get_cached))
        .route("/api/stats", get(get_stats))
        .route("/api/purge", post(purge))
        .layer(
            ServiceBuilder::new()
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(DefaultMakeSpan::new().level(Level::DEBUG))
                        .on_request(DefaultOnRequest::new().level(Level::DEBUG))
                        .on_response(DefaultOnResponse::new().level(Level::DEBUG)),
                )
                .layer(axum::middleware::from_fn_with_state(
                    state.clone(),
                    metrics_middleware,
                ))
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

pub async fn start_server(
    port: u16,
    analyzer: Arc<Analyzer>,
    metrics: Arc<Metrics>,
) -> Result<(), Box<dyn std::error::Error>> {
    let state = AppState {
        analyzer,
        health: Arc::new(RwLock::new(HealthStatus::default())),
        metrics,
        start_time: Arc::new(Instant::now()),
    };
    let app = create_router(state);
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;

    info!(port = port, "HTTP server listening on port {}", port);
    axum::serve(listener, app).await?;

    Ok(())
}
