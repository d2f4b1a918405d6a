//! CLI entry point for the vidmeta tool.

use std::io::{self, IsTerminal, Read};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{debug, error, info, warn};
use vidmeta_core::Orchestrator;

mod app_config;
mod cli;

use cli::Args;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    // Priority: RUST_LOG env var > quiet flag > verbose flag > default (info)
    let default_level = if args.quiet {
        "error"
    } else {
        match args.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    // Logs go to stderr; stdout carries the JSON result.
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    debug!(?args, "CLI arguments parsed");

    let input_text = if !args.text.is_empty() {
        args.text.join(" ")
    } else if !io::stdin().is_terminal() {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        buffer
    } else {
        info!("No input provided. Pipe share text via stdin or pass it as arguments.");
        info!("Example: vidmeta 'https://v.douyin.com/iRNBho6u/'");
        return Ok(ExitCode::SUCCESS);
    };

    if input_text.trim().is_empty() {
        info!("Input is empty, nothing to fetch");
        return Ok(ExitCode::SUCCESS);
    }

    let loaded = app_config::load_config(args.config.as_deref())?;
    if loaded.loaded_from_file {
        debug!(path = ?loaded.path, "config loaded from file");
    }
    let config = app_config::apply_cli_overrides(loaded.config, &args)?;

    let orchestrator = Orchestrator::open(&config).context("Failed to initialize fetcher")?;
    let result = orchestrator.fetch(&input_text, args.format).await;
    orchestrator.close();

    match result {
        Ok(outcome) => {
            if outcome.is_degraded() {
                warn!(
                    id = %outcome.entity_id,
                    "only placeholder data is available for this item"
                );
            }
            info!(
                id = %outcome.entity_id,
                strategy = %outcome.strategy,
                attempts = outcome.attempts.len(),
                "fetch complete"
            );
            let rendered =
                serde_json::to_string_pretty(&outcome).context("Failed to render result")?;
            println!("{rendered}");
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => {
            error!(kind = %err.kind(), "{err}");
            Ok(ExitCode::FAILURE)
        }
    }
}
