use std::fmt;
use std::time::Duration;

use tracing::{debug, error, info_span, Span};

/// Pipeline stages that are timed and wrapped in their own tracing span.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    DownloadSegments,
    PlaySession,
    AccessibilityScan,
}

impl Stage {
    pub fn span_name(self) -> &'static str {
        match self {
            Self::DownloadSegments => "download_segments",
            Self::PlaySession => "play_session",
            Self::AccessibilityScan => "run_accessibility_scan",
        }
    }

    /// Fresh `info` span for this stage.
    pub fn span(self) -> Span {
        match self {
            Self::DownloadSegments => info_span!("download_segments"),
            Self::PlaySession => info_span!("play_session"),
            Self::AccessibilityScan => info_span!("run_accessibility_scan"),
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.span_name())
    }
}

/// Key/value context attached to a captured error.
pub type Tags<'a> = &'a [(&'static str, String)];

/// Sink for recovered failures and stage timings.
///
/// Storage providers and the evaluator receive one of these instead of
/// reaching for a process-global error tracker, so tests can record what was
/// reported.
pub trait Reporter: Send + Sync {
    /// Report a failure that was recovered locally and not surfaced to the caller.
    fn capture_error(&self, error: &anyhow::Error, tags: Tags<'_>);

    fn stage_started(&self, _stage: Stage) {}

    fn stage_finished(&self, _stage: Stage, _elapsed: Duration) {}
}

/// Default reporter: recovered failures become `error` events, stage timings `debug` events.
#[derive(Debug, Default, Clone)]
pub struct TracingReporter;

impl Reporter for TracingReporter {
    fn capture_error(&self, err: &anyhow::Error, tags: Tags<'_>) {
        error!(error = %format!("{err:#}"), tags = %render_tags(tags), "recovered failure");
    }

    fn stage_finished(&self, stage: Stage, elapsed: Duration) {
        debug!(%stage, elapsed_ms = elapsed.as_millis() as u64, "stage finished");
    }
}

/// Reporter that drops everything.
#[derive(Debug, Default, Clone)]
pub struct NoopReporter;

impl Reporter for NoopReporter {
    fn capture_error(&self, _error: &anyhow::Error, _tags: Tags<'_>) {}
}

fn render_tags(tags: Tags<'_>) -> String {
    tags.iter()
        .map(|(key, value)| format!("{key}={value}"))
        .collect::<Vec<_>>()
        .join(" ")
}
