//! nuclei CLI integration for nucleiview.
//!
//! This crate runs the nuclei scanner as a subprocess, reads the JSONL file it
//! writes and turns each line into a [`ScanResultRecord`]. Every invocation
//! gets its own temporary directory, which is removed on every exit path.

mod decode;
mod executor;
mod parser;

pub use decode::{DecodePolicy, UnknownDecodePolicy};
pub use executor::{NucleiRunner, ScanError, ScanOutcome};
pub use parser::{parse_jsonl, ParsedOutput};

pub use tokio_util::sync::CancellationToken;

use std::path::PathBuf;

use nucleiview_core::ScanResultRecord;

/// Configuration for the nuclei runner.
#[derive(Debug, Clone)]
pub struct NucleiConfig {
    /// Path to the nuclei binary (defaults to "nuclei" in PATH).
    pub nuclei_path: PathBuf,
    /// Timeout in seconds for a whole scan. 0 disables the timeout.
    pub timeout_secs: u64,
    /// How invalid UTF-8 in the tool output is handled.
    pub decode_policy: DecodePolicy,
    /// Parent directory for per-scan temporary directories.
    pub work_dir: Option<PathBuf>,
    /// Extra arguments appended after the standard ones.
    pub extra_args: Vec<String>,
    /// Directory to save nuclei execution logs (optional).
    pub log_dir: Option<PathBuf>,
}

impl Default for NucleiConfig {
    fn default() -> Self {
        Self {
            nuclei_path: PathBuf::from("nuclei"),
            timeout_secs: 1800,
            decode_policy: DecodePolicy::default(),
            work_dir: None,
            extra_args: Vec::new(),
            log_dir: None,
        }
    }
}

impl NucleiConfig {
    /// Create a new configuration with the specified nuclei path.
    pub fn new(nuclei_path: PathBuf) -> Self {
        Self {
            nuclei_path,
            ..Default::default()
        }
    }

    /// Set the timeout in seconds.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    pub fn with_decode_policy(mut self, policy: DecodePolicy) -> Self {
        self.decode_policy = policy;
        self
    }

    /// Set the parent directory for temporary scan output.
    pub fn with_work_dir(mut self, dir: PathBuf) -> Self {
        self.work_dir = Some(dir);
        self
    }

    pub fn with_extra_args(mut self, args: Vec<String>) -> Self {
        self.extra_args = args;
        self
    }

    /// Set the log directory for saving execution logs.
    pub fn with_log_dir(mut self, dir: PathBuf) -> Self {
        self.log_dir = Some(dir);
        self
    }
}

/// Run a scan with the default configuration, collapsing every failure into
/// an empty result.
///
/// `severities` is a comma-joined list such as `"critical,high"`; an empty
/// string leaves the choice to nuclei. Failures are reported through `tracing`.
pub async fn run_scan(target: &str, severities: &str) -> Vec<ScanResultRecord> {
    NucleiRunner::new(NucleiConfig::default())
        .run_scan(target, severities)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = NucleiConfig::default();
        assert_eq!(config.nuclei_path, PathBuf::from("nuclei"));
        assert_eq!(config.timeout_secs, 1800);
        assert_eq!(config.decode_policy, DecodePolicy::Replace);
        assert!(config.work_dir.is_none());
        assert!(config.extra_args.is_empty());
    }

    #[test]
    fn test_config_builder() {
        let config = NucleiConfig::new(PathBuf::from("/opt/nuclei"))
            .with_timeout(0)
            .with_decode_policy(DecodePolicy::Strict)
            .with_extra_args(vec!["-silent".to_string()]);
        assert_eq!(config.nuclei_path, PathBuf::from("/opt/nuclei"));
        assert_eq!(config.timeout_secs, 0);
        assert_eq!(config.decode_policy, DecodePolicy::Strict);
        assert_eq!(config.extra_args, vec!["-silent".to_string()]);
    }
}
