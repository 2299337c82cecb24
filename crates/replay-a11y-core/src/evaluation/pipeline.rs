use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{anyhow, Context, Result};
use futures::FutureExt;
use serde_json::Value;
use tracing::{debug, instrument, Instrument};

use super::normalize::{coerce_timestamp, process_violations, reference_timestamp};
use super::splitter::JsonSegmentSplitter;
use super::{
    AccessibilityEngine, AccessibilityIssue, AxeResults, Page, ReplayDriver, ScanOptions,
    SessionSplitter,
};
use crate::storage::StorageProvider;
use crate::telemetry::{Reporter, Stage, TracingReporter};

/// Sequences download, reconstruction, replay and scanning for one session.
///
/// An evaluator is cheap to share; the page passed to each call must not be
/// used by another evaluation at the same time.
pub struct Evaluator<P: Page> {
    splitter: Arc<dyn SessionSplitter>,
    driver: Arc<dyn ReplayDriver<P>>,
    engine: Arc<dyn AccessibilityEngine<P>>,
    reporter: Arc<dyn Reporter>,
    options: ScanOptions,
}

impl<P: Page> Evaluator<P> {
    pub fn new(driver: Arc<dyn ReplayDriver<P>>, engine: Arc<dyn AccessibilityEngine<P>>) -> Self {
        Self {
            splitter: Arc::new(JsonSegmentSplitter),
            driver,
            engine,
            reporter: Arc::new(TracingReporter),
            options: ScanOptions::default(),
        }
    }

    pub fn with_splitter(mut self, splitter: Arc<dyn SessionSplitter>) -> Self {
        self.splitter = splitter;
        self
    }

    pub fn with_reporter(mut self, reporter: Arc<dyn Reporter>) -> Self {
        self.reporter = reporter;
        self
    }

    pub fn with_options(mut self, options: ScanOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &ScanOptions {
        &self.options
    }

    /// Evaluate the session stored under `filenames` on `page`.
    ///
    /// Best effort: unreadable segments and scan failures are reported and
    /// degrade the result instead of failing it. Splitter and replay errors
    /// are returned to the caller.
    #[instrument(name = "evaluate_session", skip_all, fields(segments = filenames.len()))]
    pub async fn run_evaluation(
        &self,
        storage: &dyn StorageProvider,
        page: &P,
        filenames: &[String],
    ) -> Result<Vec<AccessibilityIssue>> {
        let segments = self
            .staged(
                Stage::DownloadSegments,
                storage.download_from_filenames(filenames),
            )
            .await;

        let started = Instant::now();
        let events = self
            .splitter
            .split(&segments)
            .context("failed to split session segments")?;
        debug!(
            events = events.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "split session segments"
        );

        self.staged(Stage::PlaySession, self.driver.replay(page, &events))
            .await
            .context("failed to replay session events")?;

        let timestamp = reference_timestamp(&events);
        Ok(self.run_scan(page, &Value::from(timestamp)).await)
    }

    /// Scan the already replayed `page`. Never fails: an engine error or panic
    /// is reported with the page URL and yields no issues.
    pub async fn run_scan(&self, page: &P, timestamp: &Value) -> Vec<AccessibilityIssue> {
        let analysis = AssertUnwindSafe(self.engine.analyze(page, &self.options)).catch_unwind();
        let outcome = match self.staged(Stage::AccessibilityScan, analysis).await {
            Ok(outcome) => outcome,
            Err(_) => Err(anyhow!("accessibility engine panicked")),
        };

        match outcome {
            Ok(results) => self.normalize(&results, timestamp),
            Err(err) => {
                self.reporter
                    .capture_error(&err, &[("page.url", page.url())]);
                Vec::new()
            }
        }
    }

    fn normalize(&self, results: &AxeResults, timestamp: &Value) -> Vec<AccessibilityIssue> {
        let started = Instant::now();
        let issues = process_violations(results, coerce_timestamp(timestamp));
        debug!(
            issues = issues.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "normalized violations"
        );
        issues
    }

    async fn staged<F: Future>(&self, stage: Stage, work: F) -> F::Output {
        self.reporter.stage_started(stage);
        let started = Instant::now();
        let output = work.instrument(stage.span()).await;
        self.reporter.stage_finished(stage, started.elapsed());
        output
    }
}
