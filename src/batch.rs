//! Batch and single-URL runners.
//!
//! [`run_all`] pulls the pending list once and processes it strictly in
//! order, one URL at a time, writing each outcome before moving on. Only an
//! unavailable sink (checked before any URL is touched) or an unreadable URL
//! source stops a run; per-URL failures and individual write errors do not.
//!
//! [`scrape_one`] is the synchronous single-URL variant: it stores the
//! outcome too, but hands failures back to the caller as an error.

use crate::errors::{ScrapeError, StoreError};
use crate::models::{ArticleRecord, Outcome};
use crate::orchestrator::{Mode, Orchestrator};
use crate::scrapers::{Fetcher, Renderer};
use crate::store::{ErrorLog, ResultSink, UrlSource};
use serde::Serialize;
use std::time::Instant;
use tracing::{error, info, instrument};

/// Counts for one batch run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Outcomes the sink refused to store.
    pub write_errors: usize,
}

/// Process every pending URL.
///
/// # Errors
///
/// [`StoreError::SinkUnavailable`] when the sink cannot be written (no URL
/// is processed), or the source's error when the pending list cannot be read.
#[instrument(level = "info", skip_all)]
pub async fn run_all<F, R, S>(
    orchestrator: &Orchestrator<F, R>,
    store: &S,
) -> Result<RunSummary, StoreError>
where
    F: Fetcher,
    R: Renderer,
    S: UrlSource + ResultSink + ErrorLog,
{
    let t0 = Instant::now();

    if let Err(e) = store.ensure_available().await {
        error!(error = %e, "Result sink unavailable; aborting run");
        return Err(e);
    }

    let urls = match store.list_pending().await {
        Ok(urls) => urls,
        Err(e) => {
            error!(error = %e, "Could not read pending URLs");
            store.record_error(&e.to_string(), "list_pending").await;
            return Err(e);
        }
    };

    let mut summary = RunSummary {
        total: urls.len(),
        ..RunSummary::default()
    };
    info!(total = summary.total, "Starting batch run");

    for (index, url) in urls.iter().enumerate() {
        info!(index, %url, "Processing URL");
        let outcome = orchestrator.process(url, Mode::Batch).await;

        if outcome.is_success() {
            summary.succeeded += 1;
        } else {
            summary.failed += 1;
        }
        if !write_outcome(store, &outcome).await {
            summary.write_errors += 1;
        }
    }

    info!(
        total = summary.total,
        succeeded = summary.succeeded,
        failed = summary.failed,
        write_errors = summary.write_errors,
        elapsed_ms = t0.elapsed().as_millis() as u64,
        "Batch run complete"
    );
    Ok(summary)
}

/// Extract one URL synchronously and store the outcome.
///
/// # Errors
///
/// [`ScrapeError::Store`] when the sink is unavailable, or
/// [`ScrapeError::Extraction`] carrying the joined failure reasons.
#[instrument(level = "info", skip(orchestrator, store))]
pub async fn scrape_one<F, R, S>(
    orchestrator: &Orchestrator<F, R>,
    store: &S,
    url: &str,
) -> Result<ArticleRecord, ScrapeError>
where
    F: Fetcher,
    R: Renderer,
    S: ResultSink + ErrorLog,
{
    store.ensure_available().await?;

    let outcome = orchestrator.process(url, Mode::Single).await;
    write_outcome(store, &outcome).await;

    match outcome {
        Outcome::Success(record) => Ok(record),
        Outcome::Failure(failure) => Err(ScrapeError::Extraction(failure.joined_reason())),
    }
}

/// Hand an outcome to the sink. Write errors are logged, never retried.
async fn write_outcome<S>(store: &S, outcome: &Outcome) -> bool
where
    S: ResultSink + ErrorLog,
{
    let (written, context) = match outcome {
        Outcome::Success(record) => (store.record_success(record).await, "record_success"),
        Outcome::Failure(failure) => (store.record_failure(failure).await, "record_failure"),
    };

    match written {
        Ok(()) => true,
        Err(e) => {
            error!(url = %outcome.url(), error = %e, context, "Failed to store outcome");
            store
                .record_error(&format!("{} ({})", e, outcome.url()), context)
                .await;
            false
        }
    }
}
