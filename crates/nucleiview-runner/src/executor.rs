//! nuclei CLI executor.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::time::{Duration, Instant};

use tempfile::TempDir;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use nucleiview_core::{ScanRequest, ScanResultRecord, SeverityFilter, SeverityParseError};

use crate::parser::parse_jsonl;
use crate::{DecodePolicy, NucleiConfig};

/// Name of the JSONL file nuclei writes inside the per-scan directory.
const OUTPUT_FILE_NAME: &str = "results.jsonl";

/// Errors that can occur during a nuclei scan.
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("nuclei binary not found at: {0}")]
    BinaryNotFound(PathBuf),

    #[error("Failed to spawn nuclei process: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("nuclei exited with code {code}: {stderr}")]
    NonZeroExit { code: i32, stderr: String },

    #[error("nuclei timed out after {timeout_secs} seconds")]
    Timeout { timeout_secs: u64 },

    #[error("Scan cancelled")]
    Cancelled,

    #[error("Failed to access scan output: {0}")]
    Artifact(#[source] std::io::Error),

    #[error("nuclei {stream} is not valid UTF-8: {source}")]
    Decode {
        stream: &'static str,
        #[source]
        source: std::str::Utf8Error,
    },

    #[error(transparent)]
    InvalidSeverity(#[from] SeverityParseError),
}

/// Result of a scan that ran to completion.
#[derive(Debug, Clone, Default)]
pub struct ScanOutcome {
    /// Findings in the order nuclei emitted them.
    pub records: Vec<ScanResultRecord>,
    /// Output lines skipped because they could not be parsed.
    pub malformed_lines: usize,
    /// Wall-clock duration in milliseconds.
    pub duration_ms: u64,
}

impl ScanOutcome {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }
}

/// Raw process output before decoding.
struct RawOutput {
    status: ExitStatus,
    stdout: Vec<u8>,
    stderr: Vec<u8>,
}

enum Interrupt {
    Timeout,
    Cancelled,
}

/// Executor for the nuclei CLI.
pub struct NucleiRunner {
    nuclei_path: PathBuf,
    timeout_secs: u64,
    decode_policy: DecodePolicy,
    work_dir: Option<PathBuf>,
    extra_args: Vec<String>,
    log_dir: Option<PathBuf>,
}

impl NucleiRunner {
    /// Create a new runner with the given configuration.
    pub fn new(config: NucleiConfig) -> Self {
        // Create log directory if specified
        if let Some(ref log_dir) = config.log_dir {
            std::fs::create_dir_all(log_dir).ok();
        }

        Self {
            nuclei_path: config.nuclei_path,
            timeout_secs: config.timeout_secs,
            decode_policy: config.decode_policy,
            work_dir: config.work_dir,
            extra_args: config.extra_args,
            log_dir: config.log_dir,
        }
    }

    /// Scan `target` and return whatever findings could be collected.
    ///
    /// Every failure is logged and collapsed into an empty result, so callers
    /// cannot tell "no findings" from "scan failed". Use [`NucleiRunner::scan`]
    /// when that distinction matters.
    pub async fn run_scan(&self, target: &str, severities: &str) -> Vec<ScanResultRecord> {
        match self.scan_target(target, severities).await {
            Ok(outcome) => outcome.records,
            Err(e) => {
                error!("nuclei scan of {} failed: {}", target, e);
                Vec::new()
            }
        }
    }

    /// Parse a comma-joined severity list and scan `target`.
    pub async fn scan_target(
        &self,
        target: &str,
        severities: &str,
    ) -> Result<ScanOutcome, ScanError> {
        let severities = SeverityFilter::parse(severities)?;
        self.scan(&ScanRequest::new(target, severities)).await
    }

    /// Run one scan to completion, bounded by the configured timeout.
    pub async fn scan(&self, request: &ScanRequest) -> Result<ScanOutcome, ScanError> {
        self.scan_with_cancel(request, &CancellationToken::new()).await
    }

    /// Run one scan that stops early when `cancel` fires.
    ///
    /// The per-scan directory is removed before this returns, whatever the result.
    pub async fn scan_with_cancel(
        &self,
        request: &ScanRequest,
        cancel: &CancellationToken,
    ) -> Result<ScanOutcome, ScanError> {
        let start_time = Instant::now();

        let artifact_dir = self.create_artifact_dir()?;
        let output_path = artifact_dir.path().join(OUTPUT_FILE_NAME);

        let raw = self.spawn_nuclei_process(request, &output_path, cancel).await?;

        self.write_execution_log(
            request,
            &output_path,
            &raw.status,
            &String::from_utf8_lossy(&raw.stdout),
            &String::from_utf8_lossy(&raw.stderr),
        );

        // The exit status wins over the decode policy.
        if !raw.status.success() {
            return Err(ScanError::NonZeroExit {
                code: raw.status.code().unwrap_or(-1),
                stderr: String::from_utf8_lossy(&raw.stderr).trim().to_string(),
            });
        }

        let stdout = self
            .decode_policy
            .decode(&raw.stdout)
            .map_err(|source| ScanError::Decode { stream: "stdout", source })?;
        let stderr = self
            .decode_policy
            .decode(&raw.stderr)
            .map_err(|source| ScanError::Decode { stream: "stderr", source })?;

        if !stdout.trim().is_empty() {
            debug!("nuclei stdout: {}", stdout.trim());
        }
        if !stderr.trim().is_empty() {
            debug!("nuclei stderr: {}", stderr.trim());
        }

        let bytes = match tokio::fs::read(&output_path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("nuclei wrote no output file, treating as no findings");
                Vec::new()
            }
            Err(e) => return Err(ScanError::Artifact(e)),
        };

        let parsed = parse_jsonl(&bytes, self.decode_policy);
        if parsed.malformed_lines > 0 {
            warn!(
                "Skipped {} malformed line(s) in nuclei output",
                parsed.malformed_lines
            );
        }

        let duration_ms = start_time.elapsed().as_millis() as u64;
        info!(
            "nuclei scan of {} finished in {}ms with {} finding(s)",
            request.target,
            duration_ms,
            parsed.records.len()
        );

        Ok(ScanOutcome {
            records: parsed.records,
            malformed_lines: parsed.malformed_lines,
            duration_ms,
        })
    }

    /// Command-line arguments for one invocation.
    pub fn build_args(&self, request: &ScanRequest, output_path: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec!["-u".into(), request.target.clone().into()];

        if !request.severities.is_empty() {
            args.push("-severity".into());
            args.push(request.severities.to_arg().into());
        }

        args.push("-jsonl".into());
        args.push("-o".into());
        args.push(output_path.as_os_str().to_owned());

        args.extend(self.extra_args.iter().map(OsString::from));
        args
    }

    fn create_artifact_dir(&self) -> Result<TempDir, ScanError> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("nucleiview-");

        let dir = match self.work_dir {
            Some(ref parent) => builder.tempdir_in(parent),
            None => builder.tempdir(),
        }
        .map_err(ScanError::Artifact)?;

        debug!("Scan output directory: {}", dir.path().display());
        Ok(dir)
    }

    /// Spawn nuclei and wait for it, killing it on timeout or cancellation.
    async fn spawn_nuclei_process(
        &self,
        request: &ScanRequest,
        output_path: &Path,
        cancel: &CancellationToken,
    ) -> Result<RawOutput, ScanError> {
        let mut cmd = Command::new(&self.nuclei_path);

        cmd.args(self.build_args(request, output_path))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        debug!("Spawning nuclei process: {:?}", cmd);

        let mut child = cmd.spawn().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ScanError::BinaryNotFound(self.nuclei_path.clone())
            } else {
                ScanError::Spawn(e)
            }
        })?;

        let finished = tokio::select! {
            result = collect_output(&mut child) => Ok(result),
            _ = deadline(self.timeout_secs) => Err(Interrupt::Timeout),
            _ = cancel.cancelled() => Err(Interrupt::Cancelled),
        };

        match finished {
            Ok(result) => result.map_err(ScanError::Spawn),
            Err(interrupt) => {
                if let Err(e) = child.kill().await {
                    warn!("Failed to kill nuclei process: {}", e);
                }
                match interrupt {
                    Interrupt::Timeout => {
                        warn!("nuclei timed out after {} seconds", self.timeout_secs);
                        Err(ScanError::Timeout {
                            timeout_secs: self.timeout_secs,
                        })
                    }
                    Interrupt::Cancelled => {
                        warn!("nuclei scan cancelled");
                        Err(ScanError::Cancelled)
                    }
                }
            }
        }
    }

    fn write_execution_log(
        &self,
        request: &ScanRequest,
        output_path: &Path,
        status: &ExitStatus,
        stdout: &str,
        stderr: &str,
    ) {
        let Some(ref log_dir) = self.log_dir else {
            return;
        };

        let command_line = std::iter::once(self.nuclei_path.as_os_str().to_owned())
            .chain(self.build_args(request, output_path))
            .map(|arg| arg.to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join(" ");

        let timestamp = chrono::Utc::now().format("%Y%m%d_%H%M%S_%3f");
        let log_file = log_dir.join(format!("nuclei_{}.log", timestamp));
        let log_content = format!(
            "=== nuclei Execution Log ===\n\
             Timestamp: {}\n\
             Command: {}\n\
             Status: {}\n\
             \n\
             === STDOUT ===\n\
             {}\n\
             \n\
             === STDERR ===\n\
             {}\n",
            chrono::Utc::now().to_rfc3339(),
            command_line,
            status,
            stdout,
            stderr
        );
        if let Err(e) = std::fs::write(&log_file, &log_content) {
            warn!("Failed to write nuclei log: {}", e);
        } else {
            info!("nuclei log saved: {}", log_file.display());
        }
    }
}

/// Drain both pipes, then reap the child.
async fn collect_output(child: &mut Child) -> std::io::Result<RawOutput> {
    let mut stdout = child.stdout.take();
    let mut stderr = child.stderr.take();

    let (stdout, stderr) = tokio::try_join!(read_pipe(stdout.as_mut()), read_pipe(stderr.as_mut()))?;
    let status = child.wait().await?;

    Ok(RawOutput {
        status,
        stdout,
        stderr,
    })
}

async fn read_pipe<R: AsyncRead + Unpin>(pipe: Option<&mut R>) -> std::io::Result<Vec<u8>> {
    let mut buf = Vec::new();
    if let Some(pipe) = pipe {
        pipe.read_to_end(&mut buf).await?;
    }
    Ok(buf)
}

async fn deadline(timeout_secs: u64) {
    if timeout_secs == 0 {
        std::future::pending::<()>().await;
    } else {
        tokio::time::sleep(Duration::from_secs(timeout_secs)).await;
    }
}
