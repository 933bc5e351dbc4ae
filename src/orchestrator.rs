//! Per-URL extraction state machine.
//!
//! ```text
//! START ─▶ PRIMARY_ATTEMPTED ─┬─▶ ACCEPTED                  (gate passed)
//!                             └─▶ RENDER_ATTEMPTED ─┬─▶ ACCEPTED
//!                                                   └─▶ FAILED
//! ```
//!
//! A fetch error skips the gate and goes straight to rendering. The gate is
//! not applied to rendered documents: the renderer already refuses pages
//! with neither title nor text, and anything else it produces is accepted.
//!
//! Whatever happens inside, [`Orchestrator::process`] returns an
//! [`Outcome`]. Record-building errors and panics are caught at this
//! boundary and turned into a [`FailureRecord`].

use crate::dates::recover_date;
use crate::models::{ArticleRecord, ExtractionMethod, FailureRecord, Outcome, ParsedDocument, PublishDate};
use crate::quality;
use crate::scrapers::{Fetcher, Renderer};
use crate::utils::panic_message;
use futures::FutureExt;
use std::error::Error;
use std::panic::AssertUnwindSafe;
use std::time::Instant;
use tracing::{debug, error, info, instrument, warn};

type Unclassified = Box<dyn Error + Send + Sync>;

/// How failure reasons are reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Single-URL request: a failed render reports only the render failure.
    Single,
    /// Batch run: a failed render reports the primary-stage reasons too.
    Batch,
}

/// States of the per-URL machine, used in logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Start,
    PrimaryAttempted,
    RenderAttempted,
    Accepted,
    Failed,
}

pub struct Orchestrator<F, R> {
    fetcher: F,
    renderer: R,
}

impl<F, R> Orchestrator<F, R>
where
    F: Fetcher,
    R: Renderer,
{
    pub fn new(fetcher: F, renderer: R) -> Self {
        Self { fetcher, renderer }
    }

    /// Run the full fallback sequence for one URL.
    #[instrument(level = "info", skip(self, url), fields(%url))]
    pub async fn process(&self, url: &str, mode: Mode) -> Outcome {
        let t0 = Instant::now();
        let outcome = match AssertUnwindSafe(self.extract(url, mode)).catch_unwind().await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(e)) => {
                error!(error = %e, "Unexpected extraction error");
                Outcome::Failure(FailureRecord::new(url, vec![e.to_string()]))
            }
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                error!(%message, "Extraction panicked");
                Outcome::Failure(FailureRecord::new(url, vec![message]))
            }
        };

        let stage = if outcome.is_success() { Stage::Accepted } else { Stage::Failed };
        info!(
            ?stage,
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "Finished URL"
        );
        outcome
    }

    async fn extract(&self, url: &str, mode: Mode) -> Result<Outcome, Unclassified> {
        debug!(stage = ?Stage::Start, "Trying primary extractor");

        let primary_reasons = match self.fetcher.fetch_and_parse(url).await {
            Ok(doc) => {
                debug!(stage = ?Stage::PrimaryAttempted, "Running quality gate");
                if quality::is_acceptable(&doc) {
                    let record = build_record(doc, url, ExtractionMethod::Primary)?;
                    return Ok(Outcome::Success(record));
                }
                let reasons = quality::failure_reasons(&doc);
                warn!(?reasons, "Primary extraction rejected by quality gate");
                reasons
            }
            Err(e) => {
                warn!(error = %e, "Primary fetch failed; falling back to rendering");
                vec![format!("Primary fetch failed: {e}")]
            }
        };

        debug!(stage = ?Stage::RenderAttempted, "Trying rendering extractor");
        match self.renderer.render_and_parse(url).await {
            Ok(doc) => {
                let record = build_record(doc, url, ExtractionMethod::Rendered)?;
                Ok(Outcome::Success(record))
            }
            Err(e) => {
                warn!(error = %e, "Rendering failed");
                let render_reason = format!("Rendering failed: {e}");
                let reason = match mode {
                    Mode::Batch => {
                        let mut reasons = primary_reasons;
                        reasons.push(render_reason);
                        reasons
                    }
                    Mode::Single => vec![render_reason],
                };
                Ok(Outcome::Failure(FailureRecord::new(url, reason)))
            }
        }
    }
}

#[cfg(test)]
impl<F, R> Orchestrator<F, R> {
    pub(crate) fn parts(&self) -> (&F, &R) {
        (&self.fetcher, &self.renderer)
    }
}

/// Normalize a document into a record, recovering the date if needed.
fn build_record(
    doc: ParsedDocument,
    url: &str,
    method: ExtractionMethod,
) -> Result<ArticleRecord, Unclassified> {
    let publish_date = doc
        .publish_date
        .or_else(|| recover_date(&doc.html).map(PublishDate::Naive));
    Ok(ArticleRecord::from_document(doc, url, method, publish_date)?)
}
