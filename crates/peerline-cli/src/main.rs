//! peerline - peer-review citation pipeline
//!
//! Extracts peer-review and reference records from bulk metadata archives,
//! joins them into citation edges with time spans, and projects report tables.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use peerline_core::Verbosity;

mod cmd;
mod config;

use config::Config;

#[derive(Parser)]
#[command(name = "peerline")]
#[command(about = "Peer-review citation extraction and join pipeline")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    /// Config file path (default: ./peerline.toml or ~/.config/peerline/config.toml)
    #[arg(short, long, global = true)]
    config: Option<std::path::PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Extract peer or reference edges from an archive
    Extract(cmd::extract::ExtractArgs),
    /// Drop duplicate pair identifiers from an edge file
    Dedup(cmd::dedup::DedupArgs),
    /// Join peer and reference directories and compute time spans
    Join(cmd::join::JoinArgs),
    /// Derive Citation, Provenance and Venue tables from joined output
    Project(cmd::project::ProjectArgs),
    /// Show current configuration
    Config,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Progress context (TTY auto-detect)
    let progress = Arc::new(peerline_core::ProgressContext::new());

    // Logging:
    //   TTY:     quiet (warn) unless --debug, progress bars show activity
    //   non-TTY: info unless --debug, logs are the only progress indicator
    let is_tty = progress.is_tty();
    let multi = if is_tty { Some(progress.multi()) } else { None };
    peerline_core::init_logging(Verbosity::from_flags(is_tty, cli.debug), multi);

    peerline_core::install_signal_handlers().context("Failed to install signal handlers")?;

    let config = if let Some(path) = &cli.config {
        Config::from_file(path)?
    } else {
        Config::load()?
    };

    match cli.command {
        Command::Extract(args) => cmd::extract::run(args, &config, &progress),
        Command::Dedup(args) => cmd::dedup::run(args),
        Command::Join(args) => cmd::join::run(args, &config, &progress),
        Command::Project(args) => cmd::project::run(args, &config),
        Command::Config => {
            print_config(&config);
            Ok(())
        }
    }
}

fn print_config(config: &Config) {
    let rows = [
        (
            "Output directory",
            config.output.default_dir.display().to_string(),
        ),
        ("Batch size", config.extract.batch_size.to_string()),
        ("Workers", config.extract.max_workers.to_string()),
        (
            "Lookup table",
            config.extract.lookup_path.display().to_string(),
        ),
        ("Join column", config.join.column.clone()),
        ("Attribution URL", config.provenance.attribution_url.clone()),
        ("Source URL", config.provenance.source_url.clone()),
    ];
    cmd::print_summary("Setting", &rows);
}
