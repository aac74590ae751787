//! Zip archive access and gzip decompression for bulk metadata dumps.
//!
//! A dump is a single zip file holding many gzip-compressed JSON payloads.
//! Entries are read sequentially (the zip reader needs `&mut`), then handed
//! to workers as raw compressed bytes for parallel decompression.

use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;
use zip::ZipArchive;

use crate::error::EntryError;

/// Suffix identifying compressed JSON payloads inside an archive
pub const GZIP_JSON_SUFFIX: &str = ".json.gz";

/// Initial capacity multiplier for decompressed payloads (JSON compresses ~8x)
const INFLATE_RATIO_HINT: usize = 8;

/// A single payload inside the archive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    /// Position in the archive's central directory
    pub index: usize,
    /// Entry path inside the archive
    pub name: String,
}

/// Read-only handle over a zip archive on disk
pub struct Archive {
    path: PathBuf,
    zip: ZipArchive<File>,
}

impl std::fmt::Debug for Archive {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Archive")
            .field("path", &self.path)
            .field("entries", &self.zip.len())
            .finish_non_exhaustive()
    }
}

impl Archive {
    /// Open an archive and parse its central directory
    pub fn open(path: &Path) -> io::Result<Self> {
        let file = File::open(path)?;
        let zip = ZipArchive::new(file).map_err(io::Error::other)?;
        Ok(Self {
            path: path.to_path_buf(),
            zip,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Total number of entries (including directories and non-matching files)
    pub fn len(&self) -> usize {
        self.zip.len()
    }

    pub fn is_empty(&self) -> bool {
        self.zip.len() == 0
    }

    /// Entries whose name ends with `suffix`, in archive order
    pub fn entries_with_suffix(&self, suffix: &str) -> Vec<ArchiveEntry> {
        (0..self.zip.len())
            .filter_map(|index| {
                let name = self.zip.name_for_index(index)?;
                name.ends_with(suffix).then(|| ArchiveEntry {
                    index,
                    name: name.to_string(),
                })
            })
            .collect()
    }

    /// Read an entry's stored bytes (still gzip-compressed)
    pub fn read_entry(&mut self, entry: &ArchiveEntry) -> Result<Vec<u8>, EntryError> {
        let mut file = self
            .zip
            .by_index(entry.index)
            .map_err(|e| EntryError::Read(io::Error::other(e)))?;
        let mut buf = Vec::with_capacity(usize::try_from(file.size()).unwrap_or(0));
        file.read_to_end(&mut buf).map_err(EntryError::Read)?;
        Ok(buf)
    }
}

/// Decompress a complete gzip payload held in memory
pub fn gunzip(compressed: &[u8]) -> io::Result<Vec<u8>> {
    let mut out = Vec::with_capacity(compressed.len().saturating_mul(INFLATE_RATIO_HINT));
    GzDecoder::new(compressed).read_to_end(&mut out)?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
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

    fn write_zip(path: &Path, entries: &[(&str, Vec<u8>)]) {
        let mut zw = zip::ZipWriter::new(File::create(path).unwrap());
        let opts = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);
        for (name, data) in entries {
            zw.start_file(*name, opts).unwrap();
            zw.write_all(data).unwrap();
        }
        zw.finish().unwrap();
    }

    #[test]
    fn entries_filtered_by_suffix_in_order() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("dump.zip");
        write_zip(
            &path,
            &[
                ("b/2.json.gz", gzip(b"[]")),
                ("README.txt", b"hello".to_vec()),
                ("a/1.json.gz", gzip(b"[]")),
                ("a/1.json", b"[]".to_vec()),
            ],
        );

        let archive = Archive::open(&path).unwrap();
        assert_eq!(archive.len(), 4);
        let names: Vec<_> = archive
            .entries_with_suffix(GZIP_JSON_SUFFIX)
            .into_iter()
            .map(|e| e.name)
            .collect();
        assert_eq!(names, vec!["b/2.json.gz", "a/1.json.gz"]);
    }

    #[test]
    fn read_entry_then_gunzip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("dump.zip");
        write_zip(&path, &[("0.json.gz", gzip(br#"{"items":[]}"#))]);

        let mut archive = Archive::open(&path).unwrap();
        let entry = archive.entries_with_suffix(GZIP_JSON_SUFFIX).remove(0);
        let raw = archive.read_entry(&entry).unwrap();
        assert_eq!(gunzip(&raw).unwrap(), br#"{"items":[]}"#);
    }

    #[test]
    fn gunzip_rejects_plain_bytes() {
        assert!(gunzip(b"not gzip at all").is_err());
    }

    #[test]
    fn open_missing_archive() {
        let dir = TempDir::new().unwrap();
        assert!(Archive::open(&dir.path().join("missing.zip")).is_err());
    }

    #[test]
    fn open_non_zip_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("fake.zip");
        std::fs::write(&path, b"definitely not a zip").unwrap();
        assert!(Archive::open(&path).is_err());
    }
}
