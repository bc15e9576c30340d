use axum::Json;
use axum::extract::{Query, State};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::models::job::{Job, JobFilters, JobStats};
use crate::scrapers::ScrapeParams;

use super::AppState;

#[derive(Debug, Deserialize)]
pub struct ScrapeRequest {
    pub source: Option<String>,
    pub keywords: Option<String>,
    pub location: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct Pagination {
    pub page: i64,
    pub limit: i64,
    pub total: i64,
    pub pages: i64,
}

#[derive(Debug, Serialize)]
pub struct JobListResponse {
    pub data: Vec<Job>,
    pub pagination: Pagination,
}

/// GET /api/jobs — read path over the canonical store.
pub async fn list(
    State(state): State<AppState>,
    Query(filters): Query<JobFilters>,
) -> Result<Json<JobListResponse>, AppError> {
    let data = Job::list(&state.pool, &filters).await?;
    let total = Job::count(&state.pool, &filters).await?;

    let page = filters.page.unwrap_or(1).max(1);
    let limit = filters.limit.unwrap_or(20).clamp(1, 100);
    let pages = if total == 0 { 0 } else { (total + limit - 1) / limit };

    Ok(Json(JobListResponse {
        data,
        pagination: Pagination {
            page,
            limit,
            total,
            pages,
        },
    }))
}

/// GET /api/jobs/stats — aggregate counts by source.
pub async fn stats(State(state): State<AppState>) -> Result<Json<JobStats>, AppError> {
    let stats = Job::stats(&state.pool).await?;
    Ok(Json(stats))
}

/// POST /api/jobs/scrape — manual trigger, equivalent to one scheduled
/// tick. `source` omitted or "all" runs every adapter; the response is
/// 200 with a per-source summary even when individual sources failed.
/// A named source runs alone and 404s when unregistered.
pub async fn scrape(
    State(state): State<AppState>,
    Json(req): Json<ScrapeRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    let mut params = ScrapeParams::default();
    if let Some(keywords) = req.keywords.filter(|k| !k.is_empty()) {
        params.keywords = keywords;
    }
    if let Some(location) = req.location.filter(|l| !l.is_empty()) {
        params.location = location;
    }

    match req.source.as_deref().filter(|s| !s.is_empty() && *s != "all") {
        Some(name) => {
            let run = state.orchestrator.run_one(name, &params).await?;
            Ok(Json(serde_json::json!({ "data": run })))
        }
        None => {
            let summary = state.orchestrator.run_all(&params).await?;
            Ok(Json(serde_json::json!({ "data": summary })))
        }
    }
}
