//! Text summary builder for CLI output.
//!
//! Formats human-readable lines for a finished watch, including totals
//! scaled by the sampling fraction.

use crate::model::{QueryStatus, SearchOutcome};

/// Pre-formatted lines for text output.
pub struct TextSummary {
    pub lines: Vec<String>,
}

/// Build a text summary from a finished watch outcome.
pub fn build_text_summary(outcome: &SearchOutcome) -> TextSummary {
    let mut lines = Vec::new();

    if !outcome.query_text.is_empty() {
        lines.push(format!("Query: {}", outcome.query_text));
    }
    lines.push(format!(
        "Job {}: {}",
        outcome.query_id,
        outcome.status.label().to_uppercase().replace('_', " ")
    ));

    if outcome.sample_fraction < 1.0 {
        lines.push(format!(
            "Data estimated based on sampling fraction of {}%",
            (outcome.sample_fraction * 100.0).round() as i64
        ));
    }

    match outcome.grants.as_deref() {
        Some(grants) if !grants.is_empty() => {
            let fraction = if outcome.sample_fraction > 0.0 {
                outcome.sample_fraction
            } else {
                1.0
            };
            let estimated_count = (grants.len() as f64 / fraction).round() as i64;
            let total_amount: f64 = grants.iter().filter_map(|g| g.amount).sum();
            let estimated_amount = (total_amount / fraction).round() as i64;
            lines.push(format!(
                "Totals: {} grants for ${}",
                estimated_count, estimated_amount
            ));
        }
        _ => {
            if outcome.status == QueryStatus::Success {
                lines.push("No matching grants.".to_string());
            }
        }
    }

    TextSummary { lines }
}

/// One streamed result line for text mode.
pub fn format_grant_line(grant: &crate::model::Grant) -> String {
    let title = grant.title.as_deref().unwrap_or("(untitled)");
    let source = grant.datasource.as_deref().unwrap_or("-");
    match grant.amount {
        Some(amount) => format!("{}\t{}\t{}\t${:.0}", grant.id, title, source, amount),
        None => format!("{}\t{}\t{}\t-", grant.id, title, source),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Grant;

    fn grant(id: &str, amount: Option<f64>) -> Grant {
        Grant {
            id: id.to_string(),
            title: Some(format!("Grant {id}")),
            agency: None,
            datasource: Some("NSF 2024".to_string()),
            amount,
            due_date: None,
            status: None,
            award_url: None,
            description: None,
            reason: None,
        }
    }

    fn outcome(grants: Option<Vec<Grant>>, fraction: f64) -> SearchOutcome {
        SearchOutcome {
            timestamp_utc: String::new(),
            query_id: 42,
            query_text: "NSF grants on renewable energy".to_string(),
            status: QueryStatus::Success,
            grants,
            sample_fraction: fraction,
        }
    }

    #[test]
    fn totals_scale_by_sampling_fraction() {
        let out = outcome(
            Some(vec![grant("a", Some(100_000.0)), grant("b", Some(50_000.0))]),
            0.5,
        );
        let summary = build_text_summary(&out);
        assert!(summary
            .lines
            .iter()
            .any(|l| l == "Data estimated based on sampling fraction of 50%"));
        assert!(summary.lines.iter().any(|l| l == "Totals: 4 grants for $300000"));
    }

    #[test]
    fn full_fraction_omits_sampling_note() {
        let out = outcome(Some(vec![grant("a", Some(10.0))]), 1.0);
        let summary = build_text_summary(&out);
        assert!(!summary.lines.iter().any(|l| l.contains("sampling fraction")));
        assert!(summary.lines.iter().any(|l| l == "Totals: 1 grants for $10"));
    }

    #[test]
    fn absent_result_set_reports_no_matches() {
        let summary = build_text_summary(&outcome(None, 1.0));
        assert!(summary.lines.iter().any(|l| l == "No matching grants."));
    }

    #[test]
    fn grants_without_amounts_still_count() {
        let out = outcome(Some(vec![grant("a", None), grant("b", None)]), 1.0);
        let summary = build_text_summary(&out);
        assert!(summary.lines.iter().any(|l| l == "Totals: 2 grants for $0"));
    }
}
