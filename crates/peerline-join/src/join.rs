//! Inner join of peer and reference tables, plus provenance stamping

use chrono::{DateTime, Utc};
use rustc_hash::FxHashMap;

use crate::error::{JoinError, Side};
use crate::table::Table;

pub const ATTRIBUTION_URL_COLUMN: &str = "attribution_url";
pub const SOURCE_URL_COLUMN: &str = "source_url";
pub const GENERATION_TIMESTAMP_COLUMN: &str = "generation_timestamp";

/// Default attribution (where the dump was obtained)
pub const DEFAULT_ATTRIBUTION_URL: &str =
    "https://academictorrents.com/details/d9e554f4f0c3047d9f49e448a7004f7aa1701b69";
/// Default source (the dump's own identifier)
pub const DEFAULT_SOURCE_URL: &str = "https://doi.org/10.13003/8wx5k";

/// Timestamp layout for `generation_timestamp`, e.g. `2024-06-01T12:00:00+0000`
const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%z";

/// Suffix for right-hand columns whose name is already taken on the left
const COLLISION_SUFFIX: &str = "_right";

/// Fail unless `column` exists in both tables.
pub fn validate(left: &Table, right: &Table, column: &str) -> Result<(), JoinError> {
    left.require_column(column, Side::Left)?;
    right.require_column(column, Side::Right)?;
    Ok(())
}

/// Inner join on `column`.
///
/// Output columns are the left columns followed by the right columns minus
/// the key. Rows with an empty key never match; duplicate keys on both sides
/// produce every pairing, in left-then-right row order.
pub fn inner_join(left: &Table, right: &Table, column: &str) -> Result<Table, JoinError> {
    let lk = left.require_column(column, Side::Left)?;
    let rk = right.require_column(column, Side::Right)?;

    let mut index: FxHashMap<&str, Vec<usize>> = FxHashMap::default();
    for (i, row) in right.rows.iter().enumerate() {
        let key = row[rk].as_str();
        if !key.is_empty() {
            index.entry(key).or_default().push(i);
        }
    }

    let right_cols: Vec<usize> = (0..right.headers.len()).filter(|&i| i != rk).collect();
    let mut headers = left.headers.clone();
    for &i in &right_cols {
        let name = &right.headers[i];
        if left.headers.contains(name) {
            headers.push(format!("{name}{COLLISION_SUFFIX}"));
        } else {
            headers.push(name.clone());
        }
    }

    let mut joined = Table::new(headers);
    for row in &left.rows {
        let Some(matches) = index.get(row[lk].as_str()) else {
            continue;
        };
        for &m in matches {
            let other = &right.rows[m];
            let mut out = Vec::with_capacity(joined.headers.len());
            out.extend(row.iter().cloned());
            out.extend(right_cols.iter().map(|&i| other[i].clone()));
            joined.rows.push(out);
        }
    }
    Ok(joined)
}

/// Fixed provenance values stamped on every joined row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Provenance {
    pub attribution_url: String,
    pub source_url: String,
}

impl Default for Provenance {
    fn default() -> Self {
        Self {
            attribution_url: DEFAULT_ATTRIBUTION_URL.to_string(),
            source_url: DEFAULT_SOURCE_URL.to_string(),
        }
    }
}

/// Append attribution, source and generation time columns (one timestamp per call)
pub fn annotate_provenance(table: &mut Table, provenance: &Provenance, now: DateTime<Utc>) {
    let stamp = now.format(TIMESTAMP_FORMAT).to_string();
    table.push_constant_column(ATTRIBUTION_URL_COLUMN, &provenance.attribution_url);
    table.push_constant_column(SOURCE_URL_COLUMN, &provenance.source_url);
    table.push_constant_column(GENERATION_TIMESTAMP_COLUMN, &stamp);
}
