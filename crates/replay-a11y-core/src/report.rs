use std::fmt::Write;

use crate::evaluation::{AccessibilityIssue, Impact};

/// Format styles supported when printing evaluation results.
#[derive(Debug, Clone, Copy)]
pub enum OutputFormat {
    Human,
    Json,
}

/// Produce a report string from normalized issues using the desired format.
pub fn render_issues(issues: &[AccessibilityIssue], format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Human => render_human(issues),
        OutputFormat::Json => Ok(serde_json::to_string_pretty(issues)?),
    }
}

fn render_human(issues: &[AccessibilityIssue]) -> anyhow::Result<String> {
    let mut out = String::new();
    if issues.is_empty() {
        writeln!(out, "No accessibility issues detected.")?;
        return Ok(out);
    }

    let affected: usize = issues.iter().map(|issue| issue.elements.len()).sum();
    writeln!(
        out,
        "{} issue(s) affecting {} element(s) at session time {}",
        issues.len(),
        affected,
        issues[0].timestamp
    )?;
    writeln!(out)?;

    for issue in issues {
        writeln!(
            out,
            "  - {id} [{impact}] {help}",
            id = issue.id,
            impact = impact_label(issue.impact),
            help = issue.help,
        )?;
        writeln!(out, "    {}", issue.help_url)?;
        for element in &issue.elements {
            writeln!(
                out,
                "    * {target}: {html}",
                target = element.target,
                html = single_line(&element.element),
            )?;
            for alternative in &element.alternatives {
                writeln!(out, "      {}: {}", alternative.id, alternative.message)?;
            }
        }
    }

    Ok(out)
}

fn impact_label(impact: Option<Impact>) -> &'static str {
    match impact {
        Some(Impact::Minor) => "minor",
        Some(Impact::Moderate) => "moderate",
        Some(Impact::Serious) => "serious",
        Some(Impact::Critical) => "critical",
        None => "unknown",
    }
}

fn single_line(input: &str) -> String {
    input
        .chars()
        .map(|c| match c {
            '\n' | '\r' => ' ',
            _ => c,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluation::{ProblemAlternative, ProblemElement};
    use serde_json::json;

    fn sample_issues() -> Vec<AccessibilityIssue> {
        vec![AccessibilityIssue {
            elements: vec![ProblemElement {
                alternatives: vec![ProblemAlternative {
                    id: "has-alt".into(),
                    message: "Element does not have an alt attribute".into(),
                }],
                element: "<img\nsrc=\"a.png\">".into(),
                target: json!(["img"]),
            }],
            help_url: "https://example.com/image-alt".into(),
            help: "Images must have alternate text".into(),
            id: "image-alt".into(),
            impact: None,
            timestamp: 1500.0,
        }]
    }

    #[test]
    fn human_report_lists_issues() {
        let output = render_issues(&sample_issues(), OutputFormat::Human).unwrap();
        assert!(output.contains("1 issue(s) affecting 1 element(s)"));
        assert!(output.contains("image-alt [unknown]"));
        assert!(output.contains("<img src=\"a.png\">"));
        assert!(output.contains("has-alt"));
    }

    #[test]
    fn human_report_for_clean_scan() {
        let output = render_issues(&[], OutputFormat::Human).unwrap();
        assert!(output.contains("No accessibility issues detected."));
    }

    #[test]
    fn json_report_serializes() {
        let output = render_issues(&sample_issues(), OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value[0]["id"], json!("image-alt"));
        assert_eq!(value[0]["impact"], json!(null));
        assert!(value[0]["elements"].is_array());
    }
}
