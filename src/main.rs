// DORA RoI - Register of Information compiler
// Copyright (c) 2025 DORA RoI Contributors
// Licensed under the MIT License

use clap::Parser;
use dora_roi::cli::Cli;
use dora_roi::config::load_config;
use dora_roi::logging::init_logging;
use std::process;

#[tokio::main]
async fn main() {
    // Optional: a missing .env is not an error
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    // Logging follows the config file when it loads; the command reports
    // config errors itself.
    let config = load_config(&cli.config).ok();
    let logging_config = config
        .as_ref()
        .map(|c| c.logging.clone())
        .unwrap_or_default();
    let log_level = cli
        .log_level
        .clone()
        .or_else(|| config.as_ref().map(|c| c.application.log_level.clone()))
        .unwrap_or_else(|| "warn".to_string());

    let guard = match init_logging(&log_level, &logging_config) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {e}");
            process::exit(2);
        }
    };

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "DORA RoI compiler");

    let exit_code = match cli.execute().await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(error = %e, "Command execution failed");
            eprintln!("Error: {e}");
            5
        }
    };

    // process::exit skips destructors; flush the file writer first
    drop(guard);
    process::exit(exit_code);
}
