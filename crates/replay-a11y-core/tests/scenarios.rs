use std::io::Write;
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use flate2::{write::GzEncoder, Compression};
use replay_a11y_core::{
    coerce_timestamp, telemetry::Tags, AccessibilityEngine, AxeResults, Evaluator,
    MemoryStorageProvider, Page, ReplayDriver, Reporter, ScanOptions, SessionEvent,
    StorageProvider,
};
use serde_json::json;

fn gzip(text: &str) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(text.as_bytes()).unwrap();
    encoder.finish().unwrap()
}

fn names(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[derive(Default)]
struct CapturingReporter {
    tags: Mutex<Vec<Vec<(&'static str, String)>>>,
}

impl Reporter for CapturingReporter {
    fn capture_error(&self, _error: &anyhow::Error, tags: Tags<'_>) {
        self.tags.lock().unwrap().push(tags.to_vec());
    }
}

struct StaticPage;

impl Page for StaticPage {
    fn url(&self) -> String {
        "https://app.example.com/replay/42".into()
    }
}

struct NoopDriver;

#[async_trait]
impl ReplayDriver<StaticPage> for NoopDriver {
    async fn replay(&self, _page: &StaticPage, _events: &[SessionEvent]) -> Result<()> {
        Ok(())
    }
}

struct BrokenEngine;

#[async_trait]
impl AccessibilityEngine<StaticPage> for BrokenEngine {
    async fn analyze(&self, _page: &StaticPage, _options: &ScanOptions) -> Result<AxeResults> {
        Err(anyhow!("Execution context was destroyed"))
    }
}

#[tokio::test(flavor = "current_thread")]
async fn stored_segments_download_in_order() {
    let storage = MemoryStorageProvider::new("default", Arc::new(CapturingReporter::default()));
    storage.save("default", "a", gzip("test"));
    storage.save("default", "b", gzip("other"));

    assert_eq!(
        storage.download_from_filenames(&names(&["a", "b"])).await,
        vec!["test", "other"]
    );
}

#[tokio::test(flavor = "current_thread")]
async fn absent_segments_download_as_placeholders() {
    let reporter = Arc::new(CapturingReporter::default());
    let storage = MemoryStorageProvider::new("default", reporter.clone());

    assert_eq!(
        storage.download_from_filenames(&names(&["y", "z"])).await,
        vec!["[]", "[]"]
    );
    let tags = reporter.tags.lock().unwrap();
    assert_eq!(tags.len(), 2);
    assert!(tags
        .iter()
        .all(|set| set.contains(&("bucketName", "default".to_string()))));
}

#[tokio::test(flavor = "current_thread")]
async fn failing_scan_resolves_to_no_issues() {
    let reporter = Arc::new(CapturingReporter::default());
    let storage = MemoryStorageProvider::new("default", reporter.clone());
    storage.save("default", "seg", gzip(r#"[{"type":2,"timestamp":1700000000000}]"#));

    let evaluator = Evaluator::new(Arc::new(NoopDriver), Arc::new(BrokenEngine))
        .with_reporter(reporter.clone());
    let issues = evaluator
        .run_evaluation(&storage, &StaticPage, &names(&["seg"]))
        .await
        .expect("scan failures must not reject the evaluation");

    assert!(issues.is_empty());
    assert_eq!(
        *reporter.tags.lock().unwrap(),
        vec![vec![(
            "page.url",
            "https://app.example.com/replay/42".to_string()
        )]]
    );
}

#[test]
fn malformed_timestamps_coerce_to_zero() {
    assert_eq!(coerce_timestamp(&serde_json::Value::from(f64::NAN)), 0.0);
    assert_eq!(coerce_timestamp(&json!("1234")), 1234.0);
}
