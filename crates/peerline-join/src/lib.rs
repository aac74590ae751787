//! peerline-join: peer-review edges joined with the items they review
//!
//! Concatenates two directories of CSV tables, inner-joins them on the
//! cited identifier, stamps provenance and appends the citing→cited time
//! span. Narrow report tables can then be projected from the result.

mod config;
pub mod delta;
mod error;
pub mod join;
pub mod project;
pub mod table;

pub use config::{DEFAULT_JOIN_COLUMN, JoinConfig};
pub use delta::{INVALID_DATES, add_time_span, time_span};
pub use error::{JoinError, Side};
pub use join::{Provenance, annotate_provenance, inner_join, validate};
pub use project::{Projection, project_file};
pub use table::{Table, concatenate_directory, normalize_key};

use std::path::PathBuf;

use anyhow::{Context, Result};
use peerline_core::{ProgressContext, fmt_num};

/// Summary statistics from the join operation.
#[derive(Debug)]
pub struct JoinSummary {
    pub peer_rows: usize,
    pub reference_rows: usize,
    pub joined_rows: usize,
    /// Rows whose dates could not produce a time span
    pub invalid_dates: usize,
    pub output: PathBuf,
}

/// Run the join pipeline.
pub fn run(config: &JoinConfig, progress: &ProgressContext) -> Result<JoinSummary> {
    let line = progress.stage_line("join");

    line.set_message(format!("reading {}", config.peer_dir.display()));
    let peer = concatenate_directory(&config.peer_dir, &config.column)
        .with_context(|| format!("Failed to load {}", config.peer_dir.display()))?;
    line.set_message(format!("reading {}", config.non_peer_dir.display()));
    let references = concatenate_directory(&config.non_peer_dir, &config.column)
        .with_context(|| format!("Failed to load {}", config.non_peer_dir.display()))?;
    log::info!(
        "Loaded {} peer rows and {} reference rows",
        fmt_num(peer.len()),
        fmt_num(references.len())
    );

    // Nothing is written unless both sides carry the key
    validate(&peer, &references, &config.column)?;

    line.set_message(format!("joining on {}", config.column));
    let mut joined = inner_join(&peer, &references, &config.column)?;
    annotate_provenance(&mut joined, &config.provenance, chrono::Utc::now());

    line.set_message("computing time spans");
    let invalid_dates = add_time_span(&mut joined)?;

    line.set_message(format!("writing {}", config.output.display()));
    joined.write_csv(&config.output)?;
    line.finish_and_clear();

    let summary = JoinSummary {
        peer_rows: peer.len(),
        reference_rows: references.len(),
        joined_rows: joined.len(),
        invalid_dates,
        output: config.output.clone(),
    };

    log::info!("=== Join Summary ===");
    log::info!(
        "Rows: {} peer x {} reference -> {} joined",
        fmt_num(summary.peer_rows),
        fmt_num(summary.reference_rows),
        fmt_num(summary.joined_rows)
    );
    if summary.invalid_dates > 0 {
        log::warn!("{} rows have invalid dates", fmt_num(summary.invalid_dates));
    }
    log::info!("Output: {}", summary.output.display());
    Ok(summary)
}
