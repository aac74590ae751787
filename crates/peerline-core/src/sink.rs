//! Append-only CSV output with a header written exactly once per file

use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;

/// Buffered CSV writer over a single destination file.
///
/// The header row is written only when the file is empty at open time, so
/// repeated appends across batches (or runs) keep a single header.
pub struct CsvSink {
    writer: csv::Writer<File>,
    path: PathBuf,
    row_count: usize,
}

impl std::fmt::Debug for CsvSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CsvSink")
            .field("path", &self.path)
            .field("row_count", &self.row_count)
            .finish_non_exhaustive()
    }
}

impl CsvSink {
    /// Open `path` for appending, creating it (and parent dirs) if needed.
    pub fn append<H: AsRef<str>>(path: &Path, header: &[H]) -> io::Result<Self> {
        ensure_parent(path)?;
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        let is_empty = file.metadata()?.len() == 0;
        Self::from_file(file, path, header, is_empty)
    }

    /// Create or truncate `path` and write the header.
    pub fn create<H: AsRef<str>>(path: &Path, header: &[H]) -> io::Result<Self> {
        ensure_parent(path)?;
        let file = File::create(path)?;
        Self::from_file(file, path, header, true)
    }

    fn from_file<H: AsRef<str>>(
        file: File,
        path: &Path,
        header: &[H],
        write_header: bool,
    ) -> io::Result<Self> {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        if write_header {
            writer.write_record(header.iter().map(|h| AsRef::<str>::as_ref(h)))?;
        }
        Ok(Self {
            writer,
            path: path.to_path_buf(),
            row_count: 0,
        })
    }

    /// Write one serializable row (struct fields in declaration order).
    pub fn write_row<T: Serialize>(&mut self, row: &T) -> io::Result<()> {
        self.writer.serialize(row)?;
        self.row_count += 1;
        Ok(())
    }

    /// Write one row of raw string fields.
    pub fn write_record<I, F>(&mut self, record: I) -> io::Result<()>
    where
        I: IntoIterator<Item = F>,
        F: AsRef<[u8]>,
    {
        self.writer.write_record(record)?;
        self.row_count += 1;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Flush buffered rows to disk; returns rows written through this sink.
    pub fn finish(mut self) -> io::Result<usize> {
        self.writer.flush()?;
        Ok(self.row_count)
    }
}

fn ensure_parent(path: &Path) -> io::Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => fs::create_dir_all(parent),
        _ => Ok(()),
    }
}
