//! Extract subcommand - peer or reference edges from a metadata archive

use std::path::PathBuf;

use anyhow::{Result, bail};
use clap::{Args, ValueEnum};
use peerline_core::{SharedProgress, fmt_num};
use peerline_extract::RecordKind;

use crate::config::Config;

#[derive(Args, Debug)]
pub struct ExtractArgs {
    /// Zip archive of gzip-compressed JSON batches
    pub archive: PathBuf,

    /// Which items to keep
    #[arg(short, long, value_enum, default_value = "peer")]
    pub kind: Kind,

    /// Output directory (file named after the archive)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Explicit output file; repeat to write every batch to several files
    #[arg(long = "dest")]
    pub destinations: Vec<PathBuf>,

    /// Character lookup table for pair identifiers
    #[arg(long)]
    pub lookup: Option<PathBuf>,

    /// Archive entries per batch
    #[arg(short, long)]
    pub batch_size: Option<usize>,

    /// Parallel workers within a batch
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// Maximum number of archive entries to process
    #[arg(short = 'l', long)]
    pub limit: Option<usize>,

    /// Skip writing the deduplicated `_unique` copy of peer output
    #[arg(long)]
    pub no_dedup: bool,
}

#[derive(Clone, Copy, ValueEnum, Debug)]
pub enum Kind {
    Peer,
    NonPeer,
}

impl From<Kind> for RecordKind {
    fn from(k: Kind) -> Self {
        match k {
            Kind::Peer => RecordKind::PeerReview,
            Kind::NonPeer => RecordKind::NonPeerReview,
        }
    }
}

pub fn run(args: ExtractArgs, config: &Config, progress: &SharedProgress) -> Result<()> {
    let extract_config = peerline_extract::Config {
        archive: args.archive,
        kind: args.kind.into(),
        output_dir: args
            .output
            .unwrap_or_else(|| config.output.default_dir.clone()),
        destinations: args.destinations,
        lookup_path: args
            .lookup
            .unwrap_or_else(|| config.extract.lookup_path.clone()),
        batch_size: args.batch_size.unwrap_or(config.extract.batch_size),
        max_workers: args.workers.unwrap_or(config.extract.max_workers),
        max_entries: args.limit,
        deduplicate: !args.no_dedup,
    };

    log::info!("Extracting {} records", extract_config.kind);
    log::info!("  Archive: {}", extract_config.archive.display());
    log::info!("  Lookup: {}", extract_config.lookup_path.display());

    let summary = peerline_extract::run(&extract_config, progress)?;

    let mut rows = vec![
        (
            "Entries",
            format!(
                "{} in {} batches ({} failed)",
                fmt_num(summary.entries.entries),
                summary.batches,
                summary.entries.failed_entries
            ),
        ),
        (
            "Items",
            format!(
                "{} scanned, {} matched",
                fmt_num(summary.entries.items_scanned),
                fmt_num(summary.entries.matched)
            ),
        ),
        ("Rows", fmt_num(summary.rows_written)),
    ];
    for path in &summary.outputs {
        rows.push(("Output", path.display().to_string()));
    }
    for (path, unique) in &summary.unique_outputs {
        rows.push(("Unique", format!("{} ({} rows)", path.display(), fmt_num(*unique))));
    }
    rows.push(("Time", format!("{:.1}s", summary.elapsed.as_secs_f64())));
    super::print_summary("Extract", &rows);

    if summary.interrupted {
        bail!("Interrupted before all batches were processed");
    }
    Ok(())
}
