//! Train a generator with the default (or a JSON-supplied) configuration,
//! evaluate it against every strategy and print the report as JSON.
//!
//! Usage: `ipd-gan [config.json]`. Log verbosity follows `RUST_LOG`.

use std::process::ExitCode;

use ipd_adversarial::{run, RunConfig};
use tracing::error;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => RunConfig::from_path(path),
        None => Ok(RunConfig::default()),
    };

    match config.and_then(|config| run(&config)).and_then(|report| report.to_json_pretty()) {
        Ok(json) => {
            println!("{json}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!(error = %err, "run failed");
            ExitCode::FAILURE
        }
    }
}
