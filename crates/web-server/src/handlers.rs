use crate::{error::AppError, AppState};
use axum::{
    extract::{Path, Query, State},
    Json,
};
use core_types::Insight;
use engine::{AnalysisOptions, AnalysisRequest, ClientAnalysis};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use uuid::Uuid;

const DEFAULT_INSIGHT_LIMIT: i64 = 50;
const MAX_INSIGHT_LIMIT: i64 = 500;

#[derive(Debug, Deserialize)]
pub struct InsightQuery {
    limit: Option<i64>,
}

/// # GET /api/health
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// # GET /api/clients/:client_id/insights
/// The latest persisted insights of a client, newest first.
pub async fn get_client_insights(
    Path(client_id): Path<Uuid>,
    Query(query): Query<InsightQuery>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Insight>>, AppError> {
    let limit = query.limit.unwrap_or(DEFAULT_INSIGHT_LIMIT);
    if !(1..=MAX_INSIGHT_LIMIT).contains(&limit) {
        return Err(AppError::BadRequest(format!(
            "limit must be between 1 and {MAX_INSIGHT_LIMIT}"
        )));
    }
    let insights = state.repository.get_insights_for_client(client_id, limit).await?;
    Ok(Json(insights))
}

/// # POST /api/clients/:client_id/analyses
/// Runs an analysis now. The body holds `AnalysisOptions`; `{}` uses the defaults.
pub async fn create_analysis(
    Path(client_id): Path<Uuid>,
    State(state): State<Arc<AppState>>,
    Json(options): Json<AnalysisOptions>,
) -> Result<Json<ClientAnalysis>, AppError> {
    let request = AnalysisRequest::new(client_id).with_options(options);
    let analysis = state.orchestrator.analyze_client(&request).await?;
    Ok(Json(analysis))
}
