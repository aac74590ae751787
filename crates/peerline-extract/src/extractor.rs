//! Batched archive extraction with a bounded per-batch worker pool.
//!
//! Entries are read out of the zip sequentially, then decompressed and
//! filtered in parallel. Each batch gets its own rayon pool which is torn
//! down before the batch is handed to the caller, so batch N+1 only starts
//! once the caller pulls it (after writing batch N).

use std::path::Path;
use std::sync::Mutex;

use anyhow::{Context, Result, bail};
use indicatif::ProgressBar;
use peerline_core::{
    Archive, ArchiveEntry, GZIP_JSON_SUFFIX, ProgressContext, WorkQueue, is_shutdown_requested,
};

use crate::record::{RecordKind, RelationRecord};
use crate::worker::{EntryOutput, process_entry};

/// Counters for one batch
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BatchStats {
    pub entries: usize,
    pub failed_entries: usize,
    pub items_scanned: usize,
    pub matched: usize,
}

impl BatchStats {
    fn absorb(&mut self, other: BatchStats) {
        self.entries += other.entries;
        self.failed_entries += other.failed_entries;
        self.items_scanned += other.items_scanned;
        self.matched += other.matched;
    }
}

/// Records matched in one batch. Order within a batch is unspecified.
#[derive(Debug)]
pub struct MatchedBatch {
    /// Zero-based batch position in archive order
    pub index: usize,
    pub records: Vec<RelationRecord>,
    pub stats: BatchStats,
}

/// Pull-based extractor yielding one [`MatchedBatch`] per call to `next`.
pub struct Extractor {
    archive: Archive,
    kind: RecordKind,
    max_workers: usize,
    batches: std::vec::IntoIter<Vec<ArchiveEntry>>,
    batch_count: usize,
    next_index: usize,
    totals: BatchStats,
    interrupted: bool,
    pb: ProgressBar,
}

impl std::fmt::Debug for Extractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Extractor")
            .field("archive", &self.archive.path())
            .field("kind", &self.kind)
            .field("batch", &self.next_index)
            .field("batch_count", &self.batch_count)
            .finish_non_exhaustive()
    }
}

impl Extractor {
    /// Open `path` and partition its compressed JSON entries into batches.
    pub fn open(
        path: &Path,
        kind: RecordKind,
        batch_size: usize,
        max_workers: usize,
        max_entries: Option<usize>,
    ) -> Result<Self> {
        if batch_size == 0 {
            bail!("batch size must be at least 1");
        }
        if max_workers == 0 {
            bail!("worker count must be at least 1");
        }

        let archive =
            Archive::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
        let mut entries = archive.entries_with_suffix(GZIP_JSON_SUFFIX);
        log::info!(
            "{}: {} compressed JSON entries of {} total",
            path.display(),
            entries.len(),
            archive.len()
        );
        if let Some(limit) = max_entries {
            entries.truncate(limit);
        }

        let batches: Vec<Vec<ArchiveEntry>> =
            entries.chunks(batch_size).map(<[_]>::to_vec).collect();

        Ok(Self {
            archive,
            kind,
            max_workers,
            batch_count: batches.len(),
            batches: batches.into_iter(),
            next_index: 0,
            totals: BatchStats::default(),
            interrupted: false,
            pb: ProgressBar::hidden(),
        })
    }

    /// Attach an entry progress bar from `progress`
    pub fn with_progress(mut self, progress: &ProgressContext) -> Self {
        let name = self
            .archive
            .path()
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let total = self.remaining_entries();
        self.pb = progress.entry_bar(&name, total);
        self
    }

    fn remaining_entries(&self) -> usize {
        self.batches.as_slice().iter().map(Vec::len).sum()
    }

    pub fn batch_count(&self) -> usize {
        self.batch_count
    }

    /// Counters accumulated over every batch yielded so far
    pub fn totals(&self) -> BatchStats {
        self.totals
    }

    /// Whether extraction stopped early on a shutdown request
    pub fn interrupted(&self) -> bool {
        self.interrupted
    }

    fn run_batch(&mut self, index: usize, entries: Vec<ArchiveEntry>) -> Result<MatchedBatch> {
        let mut stats = BatchStats {
            entries: entries.len(),
            ..Default::default()
        };

        // Sequential read: the zip reader needs &mut
        let mut raw = Vec::with_capacity(entries.len());
        for entry in entries {
            match self.archive.read_entry(&entry) {
                Ok(bytes) => raw.push((entry, bytes)),
                Err(e) => {
                    log::warn!("{}: {e}", entry.name);
                    stats.failed_entries += 1;
                }
            }
        }

        let workers = self.max_workers.min(raw.len()).max(1);
        let queue = WorkQueue::new(raw);
        let collected: Mutex<Vec<Result<EntryOutput, String>>> = Mutex::new(Vec::new());
        let kind = self.kind;

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(move |i| format!("extract-{i}"))
            .build()
            .context("Failed to create worker pool")?;

        pool.scope(|s| {
            for _ in 0..workers {
                s.spawn(|_| {
                    let mut local = Vec::new();
                    while let Some((_, (entry, bytes))) = queue.claim() {
                        local.push(
                            process_entry(bytes, kind).map_err(|e| format!("{}: {e}", entry.name)),
                        );
                    }
                    collected
                        .lock()
                        .unwrap_or_else(std::sync::PoisonError::into_inner)
                        .extend(local);
                });
            }
        });
        drop(pool);

        let mut records = Vec::new();
        let outcomes = collected
            .into_inner()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        for outcome in outcomes {
            match outcome {
                Ok(out) => {
                    stats.items_scanned += out.scanned;
                    records.extend(out.matched);
                }
                Err(msg) => {
                    log::warn!("{msg}");
                    stats.failed_entries += 1;
                }
            }
        }
        stats.matched = records.len();

        log::debug!(
            "Batch {}/{}: {} entries, {} items, {} {} matched ({} failed)",
            index + 1,
            self.batch_count,
            stats.entries,
            stats.items_scanned,
            stats.matched,
            self.kind,
            stats.failed_entries
        );

        Ok(MatchedBatch {
            index,
            records,
            stats,
        })
    }
}

impl Iterator for Extractor {
    type Item = Result<MatchedBatch>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.interrupted {
            return None;
        }
        if is_shutdown_requested() && !self.batches.as_slice().is_empty() {
            log::warn!(
                "Shutdown requested, stopping before batch {}/{}",
                self.next_index + 1,
                self.batch_count
            );
            self.interrupted = true;
            self.pb.abandon();
            return None;
        }

        let Some(entries) = self.batches.next() else {
            self.pb.finish_and_clear();
            return None;
        };
        let index = self.next_index;
        self.next_index += 1;

        let result = self.run_batch(index, entries);
        if let Ok(batch) = &result {
            self.totals.absorb(batch.stats);
            self.pb.inc(batch.stats.entries as u64);
            self.pb.set_message(format!("{} matched", self.totals.matched));
        }
        Some(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;

    use flate2::Compression;
    use flate2::write::GzEncoder;
    use tempfile::TempDir;
    use zip::write::SimpleFileOptions;

    fn gzip(data: &[u8]) -> Vec<u8> {
        let mut enc = GzEncoder::new(Vec::new(), Compression::default());
        enc.write_all(data).unwrap();
        enc.finish().unwrap()
    }

    fn dump(dir: &TempDir, entries: &[(&str, Vec<u8>)]) -> std::path::PathBuf {
        let path = dir.path().join("dump.zip");
        let mut zw = zip::ZipWriter::new(File::create(&path).unwrap());
        let opts = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);
        for (name, data) in entries {
            zw.start_file(*name, opts).unwrap();
            zw.write_all(data).unwrap();
        }
        zw.finish().unwrap();
        path
    }

    fn peer_entry(doi: &str) -> Vec<u8> {
        gzip(format!(r#"[{{"type":"peer-review","DOI":"{doi}"}},{{"type":"other"}}]"#).as_bytes())
    }

    #[test]
    fn batches_follow_archive_order() {
        let dir = TempDir::new().unwrap();
        let path = dump(
            &dir,
            &[
                ("0.json.gz", peer_entry("10.1/a")),
                ("1.json.gz", peer_entry("10.1/b")),
                ("2.json.gz", peer_entry("10.1/c")),
            ],
        );
        let ex = Extractor::open(&path, RecordKind::PeerReview, 2, 2, None).unwrap();
        assert_eq!(ex.batch_count(), 2);

        let batches: Vec<MatchedBatch> = ex.map(Result::unwrap).collect();
        assert_eq!(batches[0].index, 0);
        assert_eq!(batches[0].stats.entries, 2);
        assert_eq!(batches[1].records.len(), 1);
        assert_eq!(batches[1].records[0].identifier(), Some("10.1/c"));
    }

    #[test]
    fn bad_entry_counts_as_failure() {
        let dir = TempDir::new().unwrap();
        let path = dump(
            &dir,
            &[
                ("ok.json.gz", peer_entry("10.1/a")),
                ("bad.json.gz", b"garbage".to_vec()),
                ("odd.json.gz", gzip(br#"{"message":{}}"#)),
            ],
        );
        let mut ex = Extractor::open(&path, RecordKind::PeerReview, 10, 3, None).unwrap();
        let batch = ex.next().unwrap().unwrap();
        assert!(ex.next().is_none());

        assert_eq!(batch.records.len(), 1);
        assert_eq!(batch.stats.failed_entries, 2);
        assert_eq!(ex.totals().items_scanned, 2);
    }

    #[test]
    fn max_entries_truncates() {
        let dir = TempDir::new().unwrap();
        let path = dump(
            &dir,
            &[
                ("0.json.gz", peer_entry("10.1/a")),
                ("1.json.gz", peer_entry("10.1/b")),
            ],
        );
        let ex = Extractor::open(&path, RecordKind::PeerReview, 10, 1, Some(1)).unwrap();
        let records: Vec<_> = ex.flat_map(|b| b.unwrap().records).collect();
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn zero_batch_size_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dump(&dir, &[]);
        assert!(Extractor::open(&path, RecordKind::PeerReview, 0, 1, None).is_err());
        assert!(Extractor::open(&path, RecordKind::PeerReview, 1, 0, None).is_err());
    }

    #[test]
    fn empty_archive_yields_nothing() {
        let dir = TempDir::new().unwrap();
        let path = dump(&dir, &[("notes.txt", b"hi".to_vec())]);
        let mut ex = Extractor::open(&path, RecordKind::NonPeerReview, 5, 2, None).unwrap();
        assert_eq!(ex.batch_count(), 0);
        assert!(ex.next().is_none());
    }
}
