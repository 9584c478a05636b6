//! HTTP scoring API

use crate::error::{AppError, AppResult};
use crate::metrics::{ServingMetrics, StatsSnapshot};
use crate::models::inference::{InferenceEngine, PredictionResult};
use crate::models::loader::FeatureImportance;
use crate::types::prediction::{PredictionResponse, ScoreResponse};
use axum::{
    extract::{rejection::JsonRejection, Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::sync::Arc;
use std::time::Instant;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::warn;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<InferenceEngine>,
    pub importance: Option<Arc<FeatureImportance>>,
    pub metrics: Arc<ServingMetrics>,
}

impl AppState {
    pub fn new(engine: InferenceEngine, importance: Option<FeatureImportance>) -> Self {
        Self {
            engine: Arc::new(engine),
            importance: importance.map(Arc::new),
            metrics: Arc::new(ServingMetrics::new()),
        }
    }
}

/// Create the router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/health", get(health))
        .route("/predict", post(predict))
        .route("/score", post(score))
        .route("/feature-importance", get(feature_importance))
        .route("/stats", get(stats))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

async fn home() -> Json<Value> {
    Json(json!({ "status": "FraudShield API is running" }))
}

#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
    version: &'static str,
    columns: usize,
    timestamp: i64,
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        columns: state.engine.feature_count(),
        timestamp: chrono::Utc::now().timestamp(),
    })
}

/// Score a transaction: `{prediction, fraud_probability}`
async fn predict(
    State(state): State<AppState>,
    payload: Result<Json<Map<String, Value>>, JsonRejection>,
) -> AppResult<Json<PredictionResponse>> {
    let result = run_scoring(&state, payload)?;
    Ok(Json(result.to_response()))
}

/// Score a transaction and include the risk band
async fn score(
    State(state): State<AppState>,
    payload: Result<Json<Map<String, Value>>, JsonRejection>,
) -> AppResult<Json<ScoreResponse>> {
    let result = run_scoring(&state, payload)?;
    Ok(Json(result.to_score_response(state.engine.threshold())))
}

fn run_scoring(
    state: &AppState,
    payload: Result<Json<Map<String, Value>>, JsonRejection>,
) -> AppResult<PredictionResult> {
    let start = Instant::now();

    let Json(object) = payload.map_err(|rejection| {
        state.metrics.record_rejection();
        warn!(error = %rejection.body_text(), "Rejected malformed request body");
        AppError::from(rejection)
    })?;

    match state.engine.predict_json(object) {
        Ok(result) => {
            state.metrics.record_prediction(start.elapsed(), &result);
            Ok(result)
        }
        Err(e) => {
            state.metrics.record_rejection();
            warn!(error = %e, "Rejected scoring request");
            Err(e.into())
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ImportanceQuery {
    pub top: Option<usize>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct ImportanceEntry {
    pub column: String,
    pub importance: f64,
}

async fn feature_importance(
    State(state): State<AppState>,
    Query(query): Query<ImportanceQuery>,
) -> AppResult<Json<Vec<ImportanceEntry>>> {
    let importance = state
        .importance
        .as_ref()
        .ok_or_else(|| AppError::NotFound("Feature importance not available".to_string()))?;

    Ok(Json(
        importance
            .ranked(query.top)
            .into_iter()
            .map(|(column, importance)| ImportanceEntry { column, importance })
            .collect(),
    ))
}

async fn stats(State(state): State<AppState>) -> Json<StatsSnapshot> {
    Json(state.metrics.snapshot())
}
