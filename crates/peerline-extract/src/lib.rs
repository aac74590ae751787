//! Peerline Extract - peer-review citation edges from bulk metadata dumps
//!
//! Reads a zip of gzip-compressed JSON batches, keeps peer-review (or
//! non-peer-review) items and appends them as citation edge rows to CSV.
//! Peer edges carry a compact pair identifier built from a durable
//! character lookup table.
//!
//! # Example
//!
//! ```ignore
//! use peerline_core::ProgressContext;
//! use peerline_extract::{Config, RecordKind, run};
//!
//! let config = Config {
//!     archive: "crossref.zip".into(),
//!     kind: RecordKind::PeerReview,
//!     max_entries: Some(20),
//!     ..Default::default()
//! };
//!
//! let summary = run(&config, &ProgressContext::new())?;
//! println!("Wrote {} rows", summary.rows_written);
//! ```

pub mod config;
pub mod encoder;
pub mod extractor;
pub mod record;
pub mod runner;
pub mod worker;
pub mod writer;

// Re-exports
pub use config::Config;
pub use encoder::{Encoder, REGISTRANT_CODE, next_code};
pub use extractor::{BatchStats, Extractor, MatchedBatch};
pub use record::{Payload, RecordKind, RelationRecord};
pub use runner::{Summary, run};
pub use writer::{
    DedupStats, EdgeWriter, PAIR_IDENTIFIER_COLUMN, PEER_HEADER, PeerEdge, REFERENCE_HEADER,
    ReferenceEdge, deduplicate, unique_path,
};
