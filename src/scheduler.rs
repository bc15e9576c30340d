//! Periodic scraping on a configurable cron schedule. A tick behaves
//! exactly like a manual trigger of `run_all`; ticks that land while a
//! run is still in flight are skipped, not queued.

use std::sync::Arc;

use tokio_cron_scheduler::{Job, JobScheduler};

use crate::error::AppError;
use crate::orchestrator::Orchestrator;
use crate::scrapers::ScrapeParams;

pub async fn start(
    orchestrator: Arc<Orchestrator>,
    schedule: &str,
    params: ScrapeParams,
) -> anyhow::Result<JobScheduler> {
    let scheduler = JobScheduler::new().await?;

    let tick_orchestrator = Arc::clone(&orchestrator);
    let tick_params = params.clone();
    let scrape_job = Job::new_async(schedule, move |_uuid, _lock| {
        let orchestrator = Arc::clone(&tick_orchestrator);
        let params = tick_params.clone();
        Box::pin(async move {
            match orchestrator.run_all(&params).await {
                Ok(summary) => tracing::info!(
                    inserted = summary.total_inserted,
                    updated = summary.total_updated,
                    failed = summary.failed.len(),
                    "scheduled scrape finished"
                ),
                Err(AppError::Conflict(_)) => {
                    tracing::info!("previous scrape still in flight, skipping tick");
                }
                Err(e) => tracing::error!("scheduled scrape failed: {e}"),
            }
        })
    })?;

    scheduler.add(scrape_job).await?;
    scheduler.start().await?;

    tracing::info!(schedule, "scrape scheduler started");
    Ok(scheduler)
}
