//! Dedup subcommand - drop repeated pair identifiers from an edge file

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use peerline_core::fmt_num;
use peerline_extract::{PAIR_IDENTIFIER_COLUMN, deduplicate, unique_path};

#[derive(Args, Debug)]
pub struct DedupArgs {
    /// Edge CSV file
    pub input: PathBuf,

    /// Output file (default: <input>_unique.csv)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Column whose values must be unique
    #[arg(long, default_value = PAIR_IDENTIFIER_COLUMN)]
    pub column: String,
}

pub fn run(args: DedupArgs) -> Result<()> {
    let output = args.output.unwrap_or_else(|| unique_path(&args.input));
    let stats = deduplicate(&args.input, &output, &args.column)?;

    super::print_summary(
        "Dedup",
        &[
            ("Input rows", fmt_num(stats.input_rows)),
            ("Kept", fmt_num(stats.output_rows)),
            ("Dropped", fmt_num(stats.dropped())),
            ("Output", output.display().to_string()),
        ],
    );
    Ok(())
}
