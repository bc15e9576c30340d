pub mod jobs;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use sqlx::PgPool;

use crate::orchestrator::Orchestrator;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub orchestrator: Arc<Orchestrator>,
}

pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .route("/jobs", get(jobs::list))
        .route("/jobs/scrape", post(jobs::scrape))
        .route("/jobs/stats", get(jobs::stats))
        .with_state(state);

    Router::new().nest("/api", api)
}
