//! JSONL parser for nuclei output files.

use tracing::warn;

use nucleiview_core::ScanResultRecord;

use crate::DecodePolicy;

/// Records recovered from one output file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedOutput {
    /// Records in file order.
    pub records: Vec<ScanResultRecord>,
    /// Lines that could not be decoded or parsed.
    pub malformed_lines: usize,
}

/// Parse newline-delimited JSON records.
///
/// Blank lines are ignored. A line that fails to decode or parse is skipped
/// with a warning; it never aborts the remaining lines.
pub fn parse_jsonl(bytes: &[u8], policy: DecodePolicy) -> ParsedOutput {
    let mut parsed = ParsedOutput::default();

    for (index, raw_line) in bytes.split(|b| *b == b'\n').enumerate() {
        let line_no = index + 1;

        let line = match policy.decode(raw_line) {
            Ok(line) => line,
            Err(e) => {
                warn!("Skipping line {}: invalid UTF-8: {}", line_no, e);
                parsed.malformed_lines += 1;
                continue;
            }
        };

        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match ScanResultRecord::from_json_line(line) {
            Ok(record) => parsed.records.push(record),
            Err(e) => {
                warn!(
                    "Skipping line {}: JSON parse error: {} - line: {}",
                    line_no,
                    e,
                    line.chars().take(100).collect::<String>()
                );
                parsed.malformed_lines += 1;
            }
        }
    }

    parsed
}
