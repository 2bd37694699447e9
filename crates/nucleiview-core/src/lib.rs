//! Core types for the nucleiview scanner front-end.
//!
//! This crate provides the types shared by the runner, the presenter and the CLI:
//! - Severity levels and severity filters
//! - Scan requests
//! - Result records as emitted by nuclei in JSONL mode

mod record;
mod request;
mod severity;

pub use record::{FindingInfo, ScanResultRecord};
pub use request::ScanRequest;
pub use severity::{Severity, SeverityFilter, SeverityParseError};
