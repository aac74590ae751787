//! Extraction run configuration

use std::path::{Path, PathBuf};

use crate::record::RecordKind;

/// Runtime configuration for one extraction run
#[derive(Debug, Clone)]
pub struct Config {
    /// Archive of gzip-compressed JSON payloads
    pub archive: PathBuf,
    /// Which subset of items to keep
    pub kind: RecordKind,
    /// Output directory used when `destinations` is empty
    pub output_dir: PathBuf,
    /// Explicit output files; every batch is appended to each of them
    pub destinations: Vec<PathBuf>,
    /// Character lookup table used to build pair identifiers
    pub lookup_path: PathBuf,
    /// Archive entries per batch
    pub batch_size: usize,
    /// Concurrent workers inside a batch
    pub max_workers: usize,
    /// Maximum entries to process (for testing)
    pub max_entries: Option<usize>,
    /// Write a `_unique` copy of peer outputs after extraction
    pub deduplicate: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            archive: PathBuf::new(),
            kind: RecordKind::PeerReview,
            output_dir: PathBuf::from("output"),
            destinations: Vec::new(),
            lookup_path: PathBuf::from("lookup.csv"),
            batch_size: 10,
            max_workers: 2,
            max_entries: None,
            deduplicate: true,
        }
    }
}

impl Config {
    /// Output files for this run: explicit destinations, else
    /// `<output_dir>/<archive stem>_<kind>_results.csv`.
    pub fn resolved_destinations(&self) -> Vec<PathBuf> {
        if !self.destinations.is_empty() {
            return self.destinations.clone();
        }
        vec![default_destination(&self.output_dir, &self.archive, self.kind)]
    }
}

fn default_destination(output_dir: &Path, archive: &Path, kind: RecordKind) -> PathBuf {
    let stem = archive
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "archive".to_string());
    output_dir.join(format!("{stem}_{}_results.csv", kind.file_tag()))
}
