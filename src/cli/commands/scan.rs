use anyhow::{anyhow, Result};
use std::collections::HashMap;

use nucleiview_core::ScanRequest;
use nucleiview_reports::{present, to_json, ScanSummary};
use nucleiview_runner::{CancellationToken, NucleiRunner, ScanError};

use crate::cli::args::{OutputFormat, ScanArgs};
use crate::cli::ui::{progress, FindingsTable, StatusPrinter};
use crate::config::NucleiviewConfig;

pub async fn run_scan_command(args: ScanArgs, cancel: CancellationToken) -> Result<()> {
    // Load configuration with precedence: CLI args > env vars > config file
    let env_vars: HashMap<String, String> = std::env::vars().collect();
    let config = NucleiviewConfig::load_with_precedence(args.config.clone(), &args, &env_vars)?;

    let printer = StatusPrinter::new();

    let target = config
        .scan
        .target
        .clone()
        .filter(|target| !target.trim().is_empty())
        .ok_or_else(|| {
            anyhow!("Enter a target URL first (e.g. https://example.com), or set scan.target in a config file")
        })?;
    let request = ScanRequest::new(target, config.severity_filter()?);

    printer.status("Scanning", &request.target);
    if request.severities.is_empty() {
        printer.kv("severities", "nuclei default");
    } else {
        printer.kv("severities", &request.severities.to_arg());
    }

    let runner = NucleiRunner::new(config.to_runner_config());

    let spinner = progress::create_spinner("Scanning... this may take several minutes");
    let result = runner.scan_with_cancel(&request, &cancel).await;
    spinner.finish_and_clear();

    let outcome = match result {
        Ok(outcome) => outcome,
        Err(ScanError::Cancelled) => {
            printer.warning("Cancelled", "scan interrupted, nuclei stopped");
            std::process::exit(130);
        }
        Err(e) => {
            return Err(anyhow!(e).context(format!("Scan of {} failed", request.target)));
        }
    };

    if outcome.malformed_lines > 0 {
        printer.warning(
            "Skipped",
            &format!("{} malformed line(s) in nuclei output", outcome.malformed_lines),
        );
    }

    let rows = present(&outcome.records);

    if rows.is_empty() {
        printer.info(
            "Finished",
            "no vulnerabilities found for the selected severities",
        );
    } else {
        let summary = ScanSummary::from_rows(&rows);
        printer.success(
            "Finished",
            &format!(
                "{} in {:.1}s",
                summary.headline(),
                outcome.duration_ms as f64 / 1000.0
            ),
        );
    }

    match config.output.format {
        OutputFormat::Table => FindingsTable::new(&rows).print(),
        OutputFormat::Json => println!("{}", to_json(&rows)?),
    }

    Ok(())
}
