//! Fan-out/fan-in over the registered scrapers. Each adapter's pipeline
//! (scrape → normalize each record → validate → upsert) runs as its own
//! task; a failure in one is recorded in the run summary and never
//! cancels or delays the others.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::Serialize;
use tokio::task::JoinSet;

use crate::error::AppError;
use crate::models::job::{NewJob, Source, UpsertOutcome};
use crate::normalize;
use crate::scrapers::{JobScraper, ScrapeError, ScrapeParams};
use crate::store::JobStore;

#[derive(Debug, Clone, Serialize)]
pub struct SourceSuccess {
    pub source: Source,
    pub inserted: i64,
    pub updated: i64,
    pub skipped: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SourceFailure {
    pub source: Source,
    pub error: String,
}

/// Per-invocation report; constructed fresh, logged, never persisted.
#[derive(Debug, Default, Serialize)]
pub struct RunSummary {
    pub succeeded: Vec<SourceSuccess>,
    pub failed: Vec<SourceFailure>,
    pub total_inserted: i64,
    pub total_updated: i64,
}

/// Result of a single-source run. An adapter failure is reported in
/// `error` rather than failing the call; only an unknown source name
/// is a hard error.
#[derive(Debug, Serialize)]
pub struct SingleRun {
    pub source: Source,
    pub inserted: i64,
    pub updated: i64,
    pub skipped: i64,
    pub records: Vec<NewJob>,
    pub error: Option<String>,
}

struct PipelineOutcome {
    found: usize,
    inserted: i64,
    updated: i64,
    skipped: i64,
    records: Vec<NewJob>,
}

pub struct Orchestrator {
    scrapers: Vec<Arc<dyn JobScraper>>,
    store: Arc<dyn JobStore>,
    run_active: AtomicBool,
}

/// Releases the in-flight flag when a run finishes on any path.
struct RunSlot<'a>(&'a AtomicBool);

impl Drop for RunSlot<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl Orchestrator {
    pub fn new(scrapers: Vec<Arc<dyn JobScraper>>, store: Arc<dyn JobStore>) -> Self {
        Self {
            scrapers,
            store,
            run_active: AtomicBool::new(false),
        }
    }

    /// Run every registered scraper concurrently and settle them all.
    ///
    /// Overlapping invocations are skipped, not queued: a second call
    /// while one is in flight gets `AppError::Conflict`. That is the
    /// only error this operation produces; per-source problems land in
    /// the summary.
    pub async fn run_all(&self, params: &ScrapeParams) -> Result<RunSummary, AppError> {
        let _slot = self.acquire_run_slot()?;

        tracing::info!(
            sources = self.scrapers.len(),
            keywords = %params.keywords,
            "starting scrape run"
        );

        let mut tasks = JoinSet::new();
        let mut task_sources: HashMap<tokio::task::Id, Source> = HashMap::new();
        for scraper in &self.scrapers {
            let scraper = Arc::clone(scraper);
            let store = Arc::clone(&self.store);
            let params = params.clone();
            let source = scraper.source();
            let handle = tasks.spawn(async move {
                let outcome = run_pipeline(scraper.as_ref(), store.as_ref(), &params).await;
                (source, outcome)
            });
            task_sources.insert(handle.id(), source);
        }

        let mut summary = RunSummary::default();
        while let Some(joined) = tasks.join_next_with_id().await {
            match joined {
                Ok((_, (source, Ok(outcome)))) => {
                    if outcome.found == 0 {
                        summary.failed.push(SourceFailure {
                            source,
                            error: "no jobs found".to_string(),
                        });
                        continue;
                    }
                    summary.total_inserted += outcome.inserted;
                    summary.total_updated += outcome.updated;
                    summary.succeeded.push(SourceSuccess {
                        source,
                        inserted: outcome.inserted,
                        updated: outcome.updated,
                        skipped: outcome.skipped,
                    });
                }
                Ok((_, (source, Err(e)))) => {
                    tracing::error!(%source, "scrape failed: {e}");
                    summary.failed.push(SourceFailure {
                        source,
                        error: e.to_string(),
                    });
                }
                Err(join_err) => {
                    // A panicked pipeline still gets its summary entry.
                    if let Some(source) = task_sources.get(&join_err.id()) {
                        tracing::error!(%source, "scrape task panicked: {join_err}");
                        summary.failed.push(SourceFailure {
                            source: *source,
                            error: format!("scrape task panicked: {join_err}"),
                        });
                    } else {
                        tracing::error!("scrape task failed without a source: {join_err}");
                    }
                }
            }
        }

        tracing::info!(
            inserted = summary.total_inserted,
            updated = summary.total_updated,
            failed = summary.failed.len(),
            "scrape run complete"
        );
        Ok(summary)
    }

    /// Run a single named scraper. Unknown names are the one condition
    /// that propagates to the caller.
    pub async fn run_one(&self, name: &str, params: &ScrapeParams) -> Result<SingleRun, AppError> {
        let scraper = name
            .parse::<Source>()
            .ok()
            .and_then(|source| self.scrapers.iter().find(|s| s.source() == source))
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("No scraper registered for source: {name}")))?;

        let source = scraper.source();
        match run_pipeline(scraper.as_ref(), self.store.as_ref(), params).await {
            Ok(outcome) => Ok(SingleRun {
                source,
                inserted: outcome.inserted,
                updated: outcome.updated,
                skipped: outcome.skipped,
                records: outcome.records,
                error: None,
            }),
            Err(e) => {
                tracing::error!(%source, "scrape failed: {e}");
                Ok(SingleRun {
                    source,
                    inserted: 0,
                    updated: 0,
                    skipped: 0,
                    records: Vec::new(),
                    error: Some(e.to_string()),
                })
            }
        }
    }

    fn acquire_run_slot(&self) -> Result<RunSlot<'_>, AppError> {
        self.run_active
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .map(|_| RunSlot(&self.run_active))
            .map_err(|_| AppError::Conflict("scrape run already in progress".to_string()))
    }
}

/// One adapter's full pipeline. Records failing the mandatory-field
/// gate are dropped and counted; a per-record persistence failure is
/// logged and does not abort the rest of the batch.
async fn run_pipeline(
    scraper: &dyn JobScraper,
    store: &dyn JobStore,
    params: &ScrapeParams,
) -> Result<PipelineOutcome, ScrapeError> {
    let source = scraper.source();
    let raw_jobs = scraper.scrape(params).await?;

    let mut outcome = PipelineOutcome {
        found: raw_jobs.len(),
        inserted: 0,
        updated: 0,
        skipped: 0,
        records: Vec::new(),
    };

    for raw in raw_jobs {
        let record = normalize::to_new_job(raw, source);
        if !record.has_mandatory_fields() {
            outcome.skipped += 1;
            tracing::debug!(%source, title = %record.title, "dropping record missing mandatory fields");
            continue;
        }

        match store.upsert(&record).await {
            Ok(UpsertOutcome::Inserted) => {
                outcome.inserted += 1;
                outcome.records.push(record);
            }
            Ok(UpsertOutcome::Updated) => {
                outcome.updated += 1;
                outcome.records.push(record);
            }
            Err(e) => {
                tracing::warn!(%source, title = %record.title, "failed to persist job: {e}");
            }
        }
    }

    Ok(outcome)
}
