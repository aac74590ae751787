//! Main runner for an extraction pass

use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use peerline_core::{ProgressContext, fmt_num};

use crate::config::Config;
use crate::extractor::{BatchStats, Extractor};
use crate::record::RecordKind;
use crate::writer::{EdgeWriter, PAIR_IDENTIFIER_COLUMN, deduplicate, unique_path};

/// Extraction execution summary
#[derive(Debug)]
pub struct Summary {
    pub kind: RecordKind,
    pub batches: usize,
    pub entries: BatchStats,
    pub rows_written: usize,
    /// Output files written (one per destination)
    pub outputs: Vec<PathBuf>,
    /// Deduplicated copies with their row counts
    pub unique_outputs: Vec<(PathBuf, usize)>,
    pub interrupted: bool,
    pub elapsed: Duration,
}

impl Summary {
    pub fn log(&self) {
        log::info!("=== Extraction Summary ({}) ===", self.kind);
        log::info!(
            "Entries: {} processed in {} batches ({} failed)",
            fmt_num(self.entries.entries),
            self.batches,
            self.entries.failed_entries
        );
        log::info!(
            "Items: {} scanned, {} matched",
            fmt_num(self.entries.items_scanned),
            fmt_num(self.entries.matched)
        );
        log::info!("Rows: {} per destination", fmt_num(self.rows_written));
        for path in &self.outputs {
            log::info!("  -> {}", path.display());
        }
        for (path, rows) in &self.unique_outputs {
            log::info!("  -> {} ({} unique)", path.display(), fmt_num(*rows));
        }
        log::info!("Time: {:.1}s", self.elapsed.as_secs_f64());
        if self.entries.items_scanned > 0 && !self.elapsed.is_zero() {
            let rate = self.entries.items_scanned as f64 / self.elapsed.as_secs_f64();
            log::info!("Throughput: {rate:.0} items/sec");
        }
        if self.interrupted {
            log::warn!("Interrupted: only completed batches were written");
        }
    }
}

/// Extract one record kind from `config.archive` into its destinations.
pub fn run(config: &Config, progress: &ProgressContext) -> Result<Summary> {
    let start = Instant::now();
    let outputs = config.resolved_destinations();

    let mut extractor = Extractor::open(
        &config.archive,
        config.kind,
        config.batch_size,
        config.max_workers,
        config.max_entries,
    )?
    .with_progress(progress);
    log::info!(
        "Extracting {} records: {} batches of up to {} entries, {} workers",
        config.kind,
        extractor.batch_count(),
        config.batch_size,
        config.max_workers
    );

    let mut writer = EdgeWriter::new(config.kind, outputs.clone(), &config.lookup_path)?;

    let mut rows_written = 0;
    let mut batches = 0;
    for batch in extractor.by_ref() {
        let batch = batch?;
        rows_written += writer
            .write(&batch.records)
            .with_context(|| format!("Failed to write batch {}", batch.index + 1))?;
        batches += 1;
    }
    let interrupted = extractor.interrupted();

    let mut unique_outputs = Vec::new();
    if config.kind == RecordKind::PeerReview && config.deduplicate && !interrupted {
        let line = progress.stage_line("dedup");
        for path in writer.destinations() {
            line.set_message(path.display().to_string());
            let target = unique_path(path);
            let stats = deduplicate(path, &target, PAIR_IDENTIFIER_COLUMN)?;
            log::debug!(
                "{}: dropped {} duplicate pair identifiers",
                path.display(),
                stats.dropped()
            );
            unique_outputs.push((target, stats.output_rows));
        }
        line.finish_and_clear();
    }

    let summary = Summary {
        kind: config.kind,
        batches,
        entries: extractor.totals(),
        rows_written,
        outputs,
        unique_outputs,
        interrupted,
        elapsed: start.elapsed(),
    };
    summary.log();
    Ok(summary)
}
