//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::Parser;

use vidmeta_core::orchestrator::MediaFormat;

/// Fetch short-video metadata from a share link or share text.
///
/// Accepts a URL or the text the app's share sheet produces, resolves the
/// item and prints its metadata as JSON.
#[derive(Parser, Debug)]
#[command(name = "vidmeta")]
#[command(author, version, about)]
pub struct Args {
    /// Share URL or share text; read from stdin when omitted
    pub text: Vec<String>,

    /// Desired media output type (png, webp)
    #[arg(short, long, default_value = "png")]
    pub format: MediaFormat,

    /// Path to a JSON config file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Business-level attempts per request (1-10)
    #[arg(short = 'r', long, value_parser = clap::value_parser!(u32).range(1..=10))]
    pub max_retries: Option<u32>,

    /// Per-attempt timeout in milliseconds (100-120000)
    #[arg(short = 't', long, value_parser = clap::value_parser!(u64).range(100..=120_000))]
    pub timeout_ms: Option<u64>,

    /// Seed for reproducible fingerprints, nonces and jitter
    #[arg(long)]
    pub seed: Option<u64>,

    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,
}
