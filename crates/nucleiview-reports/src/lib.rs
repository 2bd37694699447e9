//! Result presentation for nucleiview.
//!
//! This crate turns raw scan records into display rows:
//! - Fixed five-column rows with defaults for missing fields
//! - Per-severity summaries
//! - JSON rendering of rows

pub mod presenter;
pub mod summary;

pub use presenter::{present, to_json, DisplayRow, DESCRIPTION_LIMIT};
pub use summary::ScanSummary;
