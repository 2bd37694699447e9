pub mod cli;
pub mod config;

// Re-export the scan and presentation entry points for convenience
pub use nucleiview_core::{FindingInfo, ScanRequest, ScanResultRecord, Severity, SeverityFilter};
pub use nucleiview_reports::{present, DisplayRow};
pub use nucleiview_runner::{run_scan, NucleiConfig, NucleiRunner, ScanError, ScanOutcome};
