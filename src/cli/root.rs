use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use nucleiview_runner::CancellationToken;

use crate::cli::args::{validate_scan_args, Args, ScanArgs};
use crate::cli::commands::run_scan_command;
use crate::config::NucleiviewConfig;

pub struct RootCommand;

impl RootCommand {
    pub async fn execute(cancel: CancellationToken) -> Result<()> {
        let args = Args::parse();
        init_tracing(args.verbosity, args.debug);

        eprintln!(
            r#"
        ┌─┐
       ┌┘ └┐   N U C L E I V I E W
       └┐ ┌┘   v{}
        └─┘
"#,
            env!("CARGO_PKG_VERSION")
        );

        let scan_args = ScanArgs::from(&args);

        // Handle config generation mode
        if scan_args.generate_config {
            println!("{}", NucleiviewConfig::generate_default_config());
            return Ok(());
        }

        validate_scan_args(&scan_args)?;
        run_scan_command(scan_args, cancel).await
    }
}

/// Log to stderr; `RUST_LOG` wins over `-v`/`--debug`.
fn init_tracing(verbosity: u8, debug: bool) {
    let default_level = if debug || verbosity >= 2 {
        "debug"
    } else if verbosity == 1 {
        "info"
    } else {
        "warn"
    };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
