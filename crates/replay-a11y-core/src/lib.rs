pub mod evaluation;
pub mod report;
pub mod storage;
pub mod telemetry;

pub use evaluation::{
    normalize::{coerce_timestamp, process_violations, reference_timestamp},
    pipeline::Evaluator,
    splitter::JsonSegmentSplitter,
    AccessibilityEngine, AccessibilityIssue, AxeResults, Impact, Page, ProblemAlternative,
    ProblemElement, ReplayDriver, ScanOptions, SessionEvent, SessionSplitter,
};
pub use report::{render_issues, OutputFormat};
pub use storage::{
    new_storage, GcsStorageProvider, MemoryStorageProvider, ProviderKind, S3StorageProvider,
    StorageProvider, StorageSettings, PLACEHOLDER_SEGMENT,
};
pub use telemetry::{NoopReporter, Reporter, Stage, TracingReporter};
