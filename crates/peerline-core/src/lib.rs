//! Peerline Core - Common infrastructure for citation extraction pipelines
//!
//! This crate provides reusable components for reading bulk metadata
//! archives, writing append-only tabular output, and reporting progress.

pub mod archive;
pub mod error;
pub mod logging;
pub mod progress;
pub mod shutdown;
pub mod sink;
pub mod work_queue;

// Re-exports for convenience
pub use archive::{Archive, ArchiveEntry, GZIP_JSON_SUFFIX, gunzip};
pub use error::EntryError;
pub use logging::{IndicatifLogger, Verbosity, init_logging};
pub use progress::{ProgressContext, SharedProgress, fmt_num};
pub use shutdown::{
    install_signal_handlers, is_shutdown_requested, request_shutdown, shutdown_flag,
};
pub use sink::CsvSink;
pub use work_queue::WorkQueue;
