//! In-memory string tables loaded from and written to CSV

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use peerline_core::CsvSink;

use crate::error::{JoinError, Side};

/// Header plus rows of string cells; every row has `headers.len()` cells.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(headers: Vec<String>) -> Self {
        Self {
            headers,
            rows: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Index of `name`, or [`JoinError::MissingColumn`] tagged with `side`
    pub fn require_column(&self, name: &str, side: Side) -> Result<usize, JoinError> {
        self.column_index(name).ok_or_else(|| JoinError::MissingColumn {
            column: name.to_string(),
            side,
        })
    }

    /// Append a column holding `value` in every row
    pub fn push_constant_column(&mut self, name: &str, value: &str) {
        self.headers.push(name.to_string());
        for row in &mut self.rows {
            row.push(value.to_string());
        }
    }

    /// Keep only `columns` (in the given order); unknown names are ignored.
    pub fn select(&self, columns: &[&str]) -> Table {
        let picked: Vec<usize> = columns
            .iter()
            .filter_map(|c| self.column_index(c))
            .collect();
        Table {
            headers: picked.iter().map(|&i| self.headers[i].clone()).collect(),
            rows: self
                .rows
                .iter()
                .map(|row| picked.iter().map(|&i| row[i].clone()).collect())
                .collect(),
        }
    }

    /// Read a whole CSV file (first line is the header)
    pub fn read_csv(path: &Path) -> Result<Table> {
        let mut reader = csv::Reader::from_path(path)
            .with_context(|| format!("Failed to open {}", path.display()))?;
        let headers: Vec<String> = reader
            .headers()
            .with_context(|| format!("Failed to read header of {}", path.display()))?
            .iter()
            .map(String::from)
            .collect();
        let mut table = Table::new(headers);
        for record in reader.records() {
            let record = record.with_context(|| format!("Failed to read {}", path.display()))?;
            table.rows.push(record.iter().map(String::from).collect());
        }
        Ok(table)
    }

    /// Write header and rows to `path`, replacing any existing file
    pub fn write_csv(&self, path: &Path) -> Result<usize> {
        let mut sink = CsvSink::create(path, &self.headers)
            .with_context(|| format!("Failed to create {}", path.display()))?;
        for row in &self.rows {
            sink.write_record(row)?;
        }
        Ok(sink.finish()?)
    }

    /// Reorder columns to `order`, which must name the same set of columns
    fn reorder(&mut self, order: &[String]) {
        let mapping: Vec<usize> = order
            .iter()
            .filter_map(|name| self.column_index(name))
            .collect();
        for row in &mut self.rows {
            *row = mapping.iter().map(|&i| std::mem::take(&mut row[i])).collect();
        }
        self.headers = order.to_vec();
    }

    fn has_same_columns(&self, other: &[String]) -> bool {
        let mut a: Vec<&String> = self.headers.iter().collect();
        let mut b: Vec<&String> = other.iter().collect();
        a.sort_unstable();
        b.sort_unstable();
        a == b
    }
}

/// Canonical form of a join key: trailing newlines and periods removed, lowercased
pub fn normalize_key(raw: &str) -> String {
    raw.trim_end_matches(['\n', '.']).to_lowercase()
}

/// `.csv` files directly under `dir`, sorted by file name
pub fn csv_files(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        bail!("{}: not a readable directory", dir.display());
    }
    let pattern = dir.join("*.csv");
    let mut files: Vec<PathBuf> = glob::glob(&pattern.to_string_lossy())
        .with_context(|| format!("Invalid path {}", dir.display()))?
        .filter_map(|entry| entry.ok())
        .filter(|p| p.is_file())
        .collect();
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

/// Load every CSV in `dir` into one table, normalizing `key` in each row.
///
/// All files must share the first file's column set; columns are reordered
/// to match it. Fails on an empty directory.
pub fn concatenate_directory(dir: &Path, key: &str) -> Result<Table> {
    let files = csv_files(dir)?;
    let Some((first, rest)) = files.split_first() else {
        return Err(JoinError::EmptyDirectory(dir.to_path_buf()).into());
    };

    let mut combined = Table::read_csv(first)?;
    for path in rest {
        let mut table = Table::read_csv(path)?;
        if !table.has_same_columns(&combined.headers) {
            return Err(JoinError::SchemaMismatch {
                file: path.clone(),
                expected: combined.headers.clone(),
                found: table.headers,
            }
            .into());
        }
        if table.headers != combined.headers {
            table.reorder(&combined.headers);
        }
        combined.rows.append(&mut table.rows);
    }

    if let Some(k) = combined.column_index(key) {
        for row in &mut combined.rows {
            row[k] = normalize_key(&row[k]);
        }
    }
    log::debug!(
        "{}: {} rows from {} files",
        dir.display(),
        combined.len(),
        files.len()
    );
    Ok(combined)
}
