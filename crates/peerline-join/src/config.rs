use std::path::PathBuf;

use crate::join::Provenance;

/// Join key shared by peer and reference tables
pub const DEFAULT_JOIN_COLUMN: &str = "cited_identifier";

/// Configuration for the join pipeline.
#[derive(Debug, Clone)]
pub struct JoinConfig {
    /// Directory of peer edge CSV files
    pub peer_dir: PathBuf,
    /// Directory of reference (non-peer) CSV files
    pub non_peer_dir: PathBuf,
    /// Joined + time span output file
    pub output: PathBuf,
    /// Column both sides are joined on
    pub column: String,
    pub provenance: Provenance,
}

impl Default for JoinConfig {
    fn default() -> Self {
        Self {
            peer_dir: PathBuf::from("output/peer"),
            non_peer_dir: PathBuf::from("output/non_peer"),
            output: PathBuf::from("output/joined.csv"),
            column: DEFAULT_JOIN_COLUMN.to_string(),
            provenance: Provenance::default(),
        }
    }
}
