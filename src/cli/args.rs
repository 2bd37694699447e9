use anyhow::Result;
use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;

use nucleiview_runner::DecodePolicy;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about,
    long_about = None
)]
pub struct Args {
    /// Target URL to scan (e.g. https://example.com)
    pub target: Option<String>,

    /// Comma-separated severities: info, low, medium, high, critical.
    /// An empty value leaves the choice to nuclei
    #[arg(short, long)]
    pub severity: Option<String>,

    /// Path to the nuclei binary
    #[arg(long)]
    pub nuclei_path: Option<PathBuf>,

    /// Scan timeout in seconds (0 disables it)
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Output format
    #[arg(short, long, value_enum)]
    pub format: Option<OutputFormat>,

    /// Handling of invalid UTF-8 in nuclei output (replace, ignore, strict)
    #[arg(long)]
    pub decode_policy: Option<DecodePolicy>,

    /// Parent directory for temporary scan output
    #[arg(long)]
    pub work_dir: Option<PathBuf>,

    /// Directory to save nuclei execution logs
    #[arg(long)]
    pub log_dir: Option<PathBuf>,

    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbosity: u8,

    #[arg(long)]
    pub debug: bool,

    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Print the default configuration and exit
    #[arg(long)]
    pub generate_config: bool,
}

#[derive(ValueEnum, Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        <Self as ValueEnum>::from_str(s, true)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ScanArgs {
    pub target: Option<String>,
    pub severity: Option<String>,
    pub nuclei_path: Option<PathBuf>,
    pub timeout: Option<u64>,
    pub format: Option<OutputFormat>,
    pub decode_policy: Option<DecodePolicy>,
    pub work_dir: Option<PathBuf>,
    pub log_dir: Option<PathBuf>,
    pub verbosity: u8,
    pub debug: bool,
    pub config: Option<PathBuf>,
    pub generate_config: bool,
}

impl From<&Args> for ScanArgs {
    fn from(args: &Args) -> Self {
        ScanArgs {
            target: args.target.clone(),
            severity: args.severity.clone(),
            nuclei_path: args.nuclei_path.clone(),
            timeout: args.timeout,
            format: args.format,
            decode_policy: args.decode_policy,
            work_dir: args.work_dir.clone(),
            log_dir: args.log_dir.clone(),
            verbosity: args.verbosity,
            debug: args.debug,
            config: args.config.clone(),
            generate_config: args.generate_config,
        }
    }
}

pub fn validate_scan_args(args: &ScanArgs) -> Result<()> {
    if let Some(ref target) = args.target {
        if target.trim().is_empty() {
            return Err(anyhow::anyhow!("Enter a target URL first"));
        }
    }

    if let Some(ref work_dir) = args.work_dir {
        if !work_dir.is_dir() {
            return Err(anyhow::anyhow!(
                "Work directory does not exist: {}",
                work_dir.display()
            ));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_parse_full_command_line() {
        let args = Args::try_parse_from([
            "nucleiview",
            "https://example.com",
            "-s",
            "critical,high",
            "--timeout",
            "60",
            "--format",
            "json",
            "--decode-policy",
            "strict",
            "-vv",
        ])
        .unwrap();

        let scan_args = ScanArgs::from(&args);
        assert_eq!(scan_args.target.as_deref(), Some("https://example.com"));
        assert_eq!(scan_args.severity.as_deref(), Some("critical,high"));
        assert_eq!(scan_args.timeout, Some(60));
        assert_eq!(scan_args.format, Some(OutputFormat::Json));
        assert_eq!(scan_args.decode_policy, Some(DecodePolicy::Strict));
        assert_eq!(scan_args.verbosity, 2);
    }

    #[test]
    fn test_invalid_decode_policy_is_rejected() {
        let result = Args::try_parse_from(["nucleiview", "https://example.com", "--decode-policy", "lossy"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_blank_target_is_rejected() {
        let args = ScanArgs {
            target: Some("   ".to_string()),
            ..ScanArgs::default()
        };
        assert!(validate_scan_args(&args).is_err());
    }

    #[test]
    fn test_output_format_from_str() {
        assert_eq!("JSON".parse::<OutputFormat>(), Ok(OutputFormat::Json));
        assert!("xml".parse::<OutputFormat>().is_err());
    }
}
