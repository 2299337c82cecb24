use serde_json::Value;

use super::{AccessibilityIssue, AxeResults, ProblemAlternative, ProblemElement, SessionEvent};

/// Coerce an arbitrary timestamp value into a number.
///
/// Numbers pass through, numeric strings are parsed (surrounding whitespace
/// ignored, blank is 0), booleans map to 1/0. Anything else, and any result
/// that is NaN or infinite, yields 0.
pub fn coerce_timestamp(value: &Value) -> f64 {
    let number = match value {
        Value::Number(number) => number.as_f64().unwrap_or(f64::NAN),
        Value::String(text) => parse_numeric(text),
        Value::Bool(flag) => f64::from(u8::from(*flag)),
        Value::Null => 0.0,
        Value::Array(_) | Value::Object(_) => f64::NAN,
    };
    if number.is_finite() {
        number
    } else {
        0.0
    }
}

fn parse_numeric(text: &str) -> f64 {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return 0.0;
    }
    // `f64::from_str` also accepts `inf`/`nan` spellings; those fall out as non-finite.
    trimmed.parse::<f64>().unwrap_or(f64::NAN)
}

/// Latest timestamp across `events`, starting from 0.
pub fn reference_timestamp(events: &[SessionEvent]) -> f64 {
    events
        .iter()
        .map(|event| coerce_timestamp(&event.timestamp))
        .fold(0.0, f64::max)
}

/// Map engine violations onto [`AccessibilityIssue`]s, stamping each with `timestamp`.
///
/// Total and order-preserving: one issue per violation, one element per node,
/// one alternative per contributing check.
pub fn process_violations(results: &AxeResults, timestamp: f64) -> Vec<AccessibilityIssue> {
    results
        .violations
        .iter()
        .map(|violation| AccessibilityIssue {
            elements: violation
                .nodes
                .iter()
                .map(|node| ProblemElement {
                    alternatives: node
                        .any
                        .iter()
                        .map(|check| ProblemAlternative {
                            id: check.id.clone(),
                            message: check.message.clone(),
                        })
                        .collect(),
                    element: node.html.clone(),
                    target: node.target.clone(),
                })
                .collect(),
            help_url: violation.help_url.clone(),
            help: violation.help.clone(),
            id: violation.id.clone(),
            impact: violation.impact,
            timestamp,
        })
        .collect()
}
