use anyhow::Result;
use dotenvy::dotenv;

use nucleiview::cli::RootCommand;
use nucleiview_runner::CancellationToken;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    // Handle Ctrl+C gracefully: the running scan kills nuclei and cleans up
    let cancel = CancellationToken::new();
    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("\nInterrupted by user");
            interrupt.cancel();
        }
    });

    RootCommand::execute(cancel).await
}
