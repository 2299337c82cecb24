use anyhow::{Context, Result};

use super::normalize::coerce_timestamp;
use super::{SessionEvent, SessionSplitter};

/// Treats every segment as a JSON array of events.
///
/// Segments are concatenated in download order and then stable-sorted by
/// timestamp, so events that share a timestamp keep their recorded order.
#[derive(Debug, Default, Clone)]
pub struct JsonSegmentSplitter;

impl SessionSplitter for JsonSegmentSplitter {
    fn split(&self, segments: &[String]) -> Result<Vec<SessionEvent>> {
        let mut events = Vec::new();
        for (idx, segment) in segments.iter().enumerate() {
            let parsed: Vec<SessionEvent> = serde_json::from_str(segment)
                .with_context(|| format!("segment {idx} is not a JSON array of session events"))?;
            events.extend(parsed);
        }
        events.sort_by(|a, b| {
            coerce_timestamp(&a.timestamp).total_cmp(&coerce_timestamp(&b.timestamp))
        });
        Ok(events)
    }
}
