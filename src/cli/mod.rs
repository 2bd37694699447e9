pub mod args;
pub mod commands;
pub mod root;
pub mod ui;

pub use args::{validate_scan_args, Args, OutputFormat, ScanArgs};
pub use root::RootCommand;
