//! Lane Counter Session Runner
//!
//! Command-line front end for the lane counting pipeline: configuration,
//! logging, the counting session itself and the final summary.

pub mod cli;
pub mod session;
pub mod settings;

pub use cli::Args;
pub use session::{run_session, Session};
pub use settings::Settings;

use anyhow::{Context, Result};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Initialize logging; `RUST_LOG` takes precedence over `level`
pub fn init_logging(level: &str, json: bool) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(level).with_context(|| format!("Invalid log level {:?}", level))?,
    };

    let builder = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr);

    let result = if json {
        tracing::subscriber::set_global_default(builder.json().finish())
    } else {
        tracing::subscriber::set_global_default(builder.finish())
    };
    result.context("Failed to set tracing subscriber")
}
