use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use nucleiview_core::Severity;

use crate::DisplayRow;

/// Counts of displayed findings per severity label.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanSummary {
    pub total: usize,
    pub by_severity: BTreeMap<String, usize>,
}

impl ScanSummary {
    pub fn from_rows(rows: &[DisplayRow]) -> Self {
        let mut summary = Self::default();
        for row in rows {
            summary.total += 1;
            *summary.by_severity.entry(row.severity.clone()).or_insert(0) += 1;
        }
        summary
    }

    /// Severity counts ordered from most to least severe, unknown labels last.
    pub fn ordered_counts(&self) -> Vec<(&str, usize)> {
        let mut counts: Vec<(&str, usize)> = self
            .by_severity
            .iter()
            .map(|(label, count)| (label.as_str(), *count))
            .collect();
        counts.sort_by_key(|(label, _)| std::cmp::Reverse(label.parse::<Severity>().ok()));
        counts
    }

    /// One-line description such as `3 results (1 Critical, 2 High)`.
    pub fn headline(&self) -> String {
        let noun = if self.total == 1 { "result" } else { "results" };
        if self.total == 0 {
            return format!("0 {}", noun);
        }
        let parts: Vec<String> = self
            .ordered_counts()
            .into_iter()
            .map(|(label, count)| format!("{} {}", count, label))
            .collect();
        format!("{} {} ({})", self.total, noun, parts.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(severity: &str) -> DisplayRow {
        DisplayRow {
            severity: severity.to_string(),
            name: "n".to_string(),
            matched_url: "u".to_string(),
            template_id: "t".to_string(),
            description: "d...".to_string(),
        }
    }

    #[test]
    fn test_summary_counts() {
        let summary = ScanSummary::from_rows(&[row("High"), row("Critical"), row("High")]);
        assert_eq!(summary.total, 3);
        assert_eq!(summary.by_severity.get("High"), Some(&2));
        assert_eq!(summary.headline(), "3 results (1 Critical, 2 High)");
    }

    #[test]
    fn test_unknown_labels_sort_last() {
        let summary = ScanSummary::from_rows(&[row("N/A"), row("Info"), row("Medium")]);
        let labels: Vec<&str> = summary.ordered_counts().into_iter().map(|(l, _)| l).collect();
        assert_eq!(labels, vec!["Medium", "Info", "N/A"]);
    }

    #[test]
    fn test_empty_summary() {
        let summary = ScanSummary::from_rows(&[]);
        assert_eq!(summary.total, 0);
        assert_eq!(summary.headline(), "0 results");
    }
}
