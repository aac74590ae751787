//! Join subcommand - merge peer edges with reference rows and add time spans

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use peerline_core::{SharedProgress, fmt_num};

use crate::config::Config;

#[derive(Args, Debug)]
pub struct JoinArgs {
    /// Directory of peer edge CSV files
    #[arg(long)]
    pub peer_dir: PathBuf,

    /// Directory of reference (non-peer) CSV files
    #[arg(long)]
    pub non_peer_dir: PathBuf,

    /// Output CSV file
    #[arg(short, long)]
    pub output: PathBuf,

    /// Join column (default from config: cited_identifier)
    #[arg(long)]
    pub column: Option<String>,
}

pub fn run(args: JoinArgs, config: &Config, progress: &SharedProgress) -> Result<()> {
    let join_config = peerline_join::JoinConfig {
        peer_dir: args.peer_dir,
        non_peer_dir: args.non_peer_dir,
        output: args.output,
        column: args.column.unwrap_or_else(|| config.join.column.clone()),
        provenance: (&config.provenance).into(),
    };

    let summary = peerline_join::run(&join_config, progress)?;

    super::print_summary(
        "Join",
        &[
            ("Peer rows", fmt_num(summary.peer_rows)),
            ("Reference rows", fmt_num(summary.reference_rows)),
            ("Joined rows", fmt_num(summary.joined_rows)),
            ("Invalid dates", fmt_num(summary.invalid_dates)),
            ("Output", summary.output.display().to_string()),
        ],
    );
    Ok(())
}
