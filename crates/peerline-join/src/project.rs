//! Narrow tables derived from the joined dataset

use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::join::{ATTRIBUTION_URL_COLUMN, GENERATION_TIMESTAMP_COLUMN, SOURCE_URL_COLUMN};
use crate::table::Table;

const PROVENANCE_COLUMNS: [&str; 3] = [
    ATTRIBUTION_URL_COLUMN,
    SOURCE_URL_COLUMN,
    GENERATION_TIMESTAMP_COLUMN,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Projection {
    /// Edge and dates, without venue or provenance columns
    Citation,
    /// Pair identifier with its provenance
    Provenance,
    /// Cited item with serial numbers and venue
    Venue,
}

impl Projection {
    pub const ALL: [Projection; 3] = [Self::Citation, Self::Provenance, Self::Venue];

    pub fn file_name(&self) -> &'static str {
        match self {
            Self::Citation => "Citation.csv",
            Self::Provenance => "Provenance.csv",
            Self::Venue => "Venue.csv",
        }
    }

    /// Project `table`; columns missing from the input are skipped.
    pub fn apply(&self, table: &Table) -> Table {
        match self {
            Self::Citation => {
                let keep: Vec<&str> = table
                    .headers
                    .iter()
                    .map(String::as_str)
                    .filter(|h| {
                        !matches!(*h, "cited_serial_numbers" | "cited_venue")
                            && !PROVENANCE_COLUMNS.contains(h)
                    })
                    .collect();
                table.select(&keep)
            }
            Self::Provenance => {
                let mut cols = vec!["entity_pair_identifier"];
                cols.extend(PROVENANCE_COLUMNS);
                table.select(&cols)
            }
            Self::Venue => {
                table.select(&["cited_identifier", "cited_serial_numbers", "cited_venue"])
            }
        }
    }
}

/// Write every projection of `input` into `output_dir`; returns paths with row counts.
pub fn project_file(input: &Path, output_dir: &Path) -> Result<Vec<(PathBuf, usize)>> {
    let table = Table::read_csv(input)?;
    let mut written = Vec::new();
    for projection in Projection::ALL {
        let path = output_dir.join(projection.file_name());
        let rows = projection.apply(&table).write_csv(&path)?;
        log::debug!("{}: {rows} rows", path.display());
        written.push((path, rows));
    }
    Ok(written)
}
