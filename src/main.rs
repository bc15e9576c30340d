mod config;
mod db;
mod error;
mod models;
mod normalize;
mod orchestrator;
mod routes;
mod scheduler;
mod scrapers;
mod store;

use std::sync::Arc;

use axum::Router;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use clap::Parser;
use sqlx::PgPool;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use crate::config::{Command, Config};
use crate::orchestrator::Orchestrator;
use crate::routes::AppState;
use crate::store::PgStore;

async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

async fn readyz(pool: PgPool) -> impl IntoResponse {
    let result: Result<(i32,), _> = sqlx::query_as("SELECT 1").fetch_one(&pool).await;
    match result {
        Ok(_) => (StatusCode::OK, "ready"),
        Err(_) => (StatusCode::SERVICE_UNAVAILABLE, "not ready"),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("jobscout=info,tower_http=info")),
        )
        .init();

    let config = Config::parse();

    tracing::info!("Connecting to database...");
    let pool = db::create_pool(&config.database_url).await?;

    if config.run_migrations {
        tracing::info!("Running database migrations...");
        db::run_migrations(&pool).await?;
        tracing::info!("Migrations complete");
    }

    let orchestrator = Arc::new(Orchestrator::new(
        scrapers::registry(),
        Arc::new(PgStore::new(pool.clone())),
    ));

    match config.resolved_command() {
        Command::Scrape { source } => {
            let params = config.scrape_params();
            match source {
                Some(name) => {
                    let run = orchestrator.run_one(&name, &params).await?;
                    tracing::info!(
                        source = %run.source,
                        inserted = run.inserted,
                        updated = run.updated,
                        skipped = run.skipped,
                        error = run.error.as_deref().unwrap_or("none"),
                        "scrape finished"
                    );
                }
                None => {
                    let summary = orchestrator.run_all(&params).await?;
                    tracing::info!(
                        inserted = summary.total_inserted,
                        updated = summary.total_updated,
                        succeeded = summary.succeeded.len(),
                        failed = summary.failed.len(),
                        "scrape finished"
                    );
                    for failure in &summary.failed {
                        tracing::warn!(source = %failure.source, "source failed: {}", failure.error);
                    }
                }
            }
            Ok(())
        }
        Command::Serve { listen_addr } => {
            let _scheduler = scheduler::start(
                Arc::clone(&orchestrator),
                &config.scrape_schedule,
                config.scrape_params(),
            )
            .await?;

            let state = AppState {
                pool: pool.clone(),
                orchestrator,
            };

            let readyz_pool = pool.clone();
            let app = Router::new()
                .route("/healthz", get(healthz))
                .route("/readyz", get(move || readyz(readyz_pool.clone())))
                .merge(routes::router(state))
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive());

            let listener = tokio::net::TcpListener::bind(&listen_addr).await?;
            tracing::info!("Listening on {listen_addr}");
            axum::serve(listener, app).await?;

            Ok(())
        }
    }
}
