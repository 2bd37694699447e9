use serde::{Deserialize, Serialize};

use crate::SeverityFilter;

/// A single user-triggered scan.
///
/// The target is passed to the scanner untouched; validating that it looks
/// like a URL is left to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanRequest {
    pub target: String,
    pub severities: SeverityFilter,
}

impl ScanRequest {
    pub fn new(target: impl Into<String>, severities: SeverityFilter) -> Self {
        Self {
            target: target.into(),
            severities,
        }
    }
}
