//! Lane Counter - Main Entry Point

use anyhow::Result;
use clap::Parser;
use counter_cli::{init_logging, run_session, Args};
use tokio::sync::watch;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let settings = args.settings()?;
    init_logging(&settings.log_level, settings.log_json)?;

    info!("=== Lane Counter v{} ===", env!("CARGO_PKG_VERSION"));
    info!("Settings: {:?}", settings);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received");
            let _ = shutdown_tx.send(true);
        }
    });

    let summary = run_session(&settings, shutdown_rx).await?;

    if args.summary_json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!("{}", summary);
    }
    Ok(())
}
