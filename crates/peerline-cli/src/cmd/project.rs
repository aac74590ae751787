//! Project subcommand - Citation, Provenance and Venue tables from joined output

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use peerline_core::fmt_num;

use crate::config::Config;

#[derive(Args, Debug)]
pub struct ProjectArgs {
    /// Joined CSV produced by `peerline join`
    pub input: PathBuf,

    /// Directory for the projected tables
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,
}

pub fn run(args: ProjectArgs, config: &Config) -> Result<()> {
    let output_dir = args
        .output_dir
        .unwrap_or_else(|| config.output.default_dir.clone());
    let written = peerline_join::project_file(&args.input, &output_dir)?;

    let rows: Vec<(&str, String)> = written
        .iter()
        .map(|(path, count)| ("Table", format!("{} ({} rows)", path.display(), fmt_num(*count))))
        .collect();
    super::print_summary("Project", &rows);
    Ok(())
}
