use anyhow::Result as AnyResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub mod normalize;
pub mod pipeline;
pub mod splitter;

/// Severity reported by the accessibility engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Impact {
    Minor,
    Moderate,
    Serious,
    Critical,
}

/// One sub-check that contributed to a node failing a rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProblemAlternative {
    pub id: String,
    pub message: String,
}

/// A DOM node implicated in an issue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProblemElement {
    pub alternatives: Vec<ProblemAlternative>,
    /// Serialized HTML of the node.
    pub element: String,
    /// Engine locator for the node; a selector list, nested for frames and shadow roots.
    pub target: Value,
}

/// A single finding from one scan of a reconstructed session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessibilityIssue {
    pub elements: Vec<ProblemElement>,
    pub help_url: String,
    pub help: String,
    pub id: String,
    pub impact: Option<Impact>,
    /// Session time at which the scan was taken; shared by every issue of one evaluation.
    pub timestamp: f64,
}

/// Results as emitted by the accessibility engine. Only violations are consumed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AxeResults {
    #[serde(default)]
    pub violations: Vec<RawViolation>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawViolation {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub help: String,
    #[serde(default)]
    pub help_url: String,
    #[serde(default)]
    pub impact: Option<Impact>,
    #[serde(default)]
    pub nodes: Vec<RawNode>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawNode {
    #[serde(default)]
    pub html: String,
    #[serde(default)]
    pub target: Value,
    #[serde(default)]
    pub any: Vec<RawCheck>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawCheck {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub message: String,
}

/// One recorded state change of a web session.
///
/// Only `timestamp` is interpreted here; everything else is carried verbatim
/// for the replay driver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionEvent {
    #[serde(default)]
    pub timestamp: Value,
    #[serde(flatten)]
    pub data: serde_json::Map<String, Value>,
}

/// Engine configuration for one scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanOptions {
    /// Selector of the subtree to scan.
    pub include: String,
    pub tags: Vec<String>,
    pub disabled_rules: Vec<String>,
}

impl Default for ScanOptions {
    /// Scope to the replay frame with WCAG 2 A rules. Rules that misfire on a
    /// replayed DOM (frame titles, document landmarks, contrast, duplicate ids)
    /// are disabled.
    fn default() -> Self {
        Self {
            include: ".rr-player__frame".into(),
            tags: vec!["wcag2a".into()],
            disabled_rules: [
                "frame-title",
                "page-has-heading-one",
                "landmark-one-main",
                "color-contrast",
                "duplicate-id-active",
                "duplicate-id-aria",
                "duplicate-id",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
        }
    }
}

/// Handle to a live browser page. An evaluation has exclusive use of its page.
pub trait Page: Send + Sync {
    fn url(&self) -> String;
}

/// Turns downloaded segment texts into an ordered event stream. Pure; never retried.
pub trait SessionSplitter: Send + Sync {
    fn split(&self, segments: &[String]) -> AnyResult<Vec<SessionEvent>>;
}

/// Feeds session events into a live page until it reflects the recorded DOM.
#[async_trait]
pub trait ReplayDriver<P: Page>: Send + Sync {
    async fn replay(&self, page: &P, events: &[SessionEvent]) -> AnyResult<()>;
}

/// The accessibility scanning engine.
#[async_trait]
pub trait AccessibilityEngine<P: Page>: Send + Sync {
    async fn analyze(&self, page: &P, options: &ScanOptions) -> AnyResult<AxeResults>;
}
