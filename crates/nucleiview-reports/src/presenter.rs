//! Maps scan records to the fixed display shape.

use anyhow::Result;
use serde::{Deserialize, Serialize};

use nucleiview_core::ScanResultRecord;

/// Maximum number of characters of a description shown in a row.
pub const DESCRIPTION_LIMIT: usize = 100;

const NOT_AVAILABLE: &str = "N/A";
const NO_DESCRIPTION: &str = "No description";
const ELLIPSIS: &str = "...";

/// One table row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayRow {
    #[serde(rename = "Severity")]
    pub severity: String,
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Matched URL")]
    pub matched_url: String,
    #[serde(rename = "Template ID")]
    pub template_id: String,
    #[serde(rename = "Description")]
    pub description: String,
}

impl From<&ScanResultRecord> for DisplayRow {
    fn from(record: &ScanResultRecord) -> Self {
        Self {
            severity: record
                .severity()
                .map(capitalize)
                .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            name: record.name().unwrap_or(NOT_AVAILABLE).to_string(),
            matched_url: record.host.as_deref().unwrap_or(NOT_AVAILABLE).to_string(),
            template_id: record
                .template_id
                .as_deref()
                .unwrap_or(NOT_AVAILABLE)
                .to_string(),
            description: shorten_description(record.description().unwrap_or(NO_DESCRIPTION)),
        }
    }
}

/// Build display rows in input order.
pub fn present(records: &[ScanResultRecord]) -> Vec<DisplayRow> {
    records.iter().map(DisplayRow::from).collect()
}

/// Render rows as a pretty-printed JSON array.
pub fn to_json(rows: &[DisplayRow]) -> Result<String> {
    Ok(serde_json::to_string_pretty(rows)?)
}

/// Upper-case the first character and lower-case the rest.
fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

/// Keep the first [`DESCRIPTION_LIMIT`] characters and always append `...`,
/// even when nothing was cut.
fn shorten_description(description: &str) -> String {
    let mut shortened: String = description.chars().take(DESCRIPTION_LIMIT).collect();
    shortened.push_str(ELLIPSIS);
    shortened
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(line: &str) -> ScanResultRecord {
        ScanResultRecord::from_json_line(line).unwrap()
    }

    #[test]
    fn test_present_record_without_description() {
        let rows = present(&[record(
            r#"{"host":"https://example.com","template-id":"ssl-issuer","info":{"severity":"high","name":"Weak Cipher"}}"#,
        )]);

        assert_eq!(
            rows,
            vec![DisplayRow {
                severity: "High".to_string(),
                name: "Weak Cipher".to_string(),
                matched_url: "https://example.com".to_string(),
                template_id: "ssl-issuer".to_string(),
                description: "No description...".to_string(),
            }]
        );
    }

    #[test]
    fn test_present_record_without_info() {
        let row = DisplayRow::from(&record(r#"{"host":"https://example.com"}"#));

        assert_eq!(row.severity, "N/A");
        assert_eq!(row.name, "N/A");
        assert_eq!(row.template_id, "N/A");
        assert_eq!(row.description, "No description...");
        assert_eq!(row.matched_url, "https://example.com");
    }

    #[test]
    fn test_present_empty_record() {
        let row = DisplayRow::from(&ScanResultRecord::default());
        assert_eq!(row.matched_url, "N/A");
        assert_eq!(row.severity, "N/A");
    }

    #[test]
    fn test_ellipsis_is_always_appended() {
        let row = DisplayRow::from(&record(r#"{"info":{"description":"Short"}}"#));
        assert_eq!(row.description, "Short...");

        let row = DisplayRow::from(&record(r#"{"info":{"description":""}}"#));
        assert_eq!(row.description, "...");
    }

    #[test]
    fn test_long_description_is_cut_at_limit() {
        let long = "é".repeat(150);
        let line = format!(r#"{{"info":{{"description":"{}"}}}}"#, long);
        let row = DisplayRow::from(&record(&line));

        assert_eq!(row.description.chars().count(), DESCRIPTION_LIMIT + 3);
        assert!(row.description.starts_with(&"é".repeat(DESCRIPTION_LIMIT)));
        assert!(row.description.ends_with("..."));
    }

    #[test]
    fn test_severity_capitalization() {
        assert_eq!(capitalize("critical"), "Critical");
        assert_eq!(capitalize("HIGH"), "High");
        assert_eq!(capitalize("unknown"), "Unknown");
        assert_eq!(capitalize(""), "");
    }

    #[test]
    fn test_rows_keep_input_order() {
        let rows = present(&[
            record(r#"{"template-id":"first"}"#),
            record(r#"{"template-id":"second"}"#),
        ]);
        assert_eq!(rows[0].template_id, "first");
        assert_eq!(rows[1].template_id, "second");
        assert!(present(&[]).is_empty());
    }

    #[test]
    fn test_json_uses_column_titles() {
        let rows = present(&[record(r#"{"host":"h","template-id":"t"}"#)]);
        let json: serde_json::Value = serde_json::from_str(&to_json(&rows).unwrap()).unwrap();

        assert_eq!(json[0]["Matched URL"], "h");
        assert_eq!(json[0]["Template ID"], "t");
        assert_eq!(json[0]["Severity"], "N/A");
    }
}
