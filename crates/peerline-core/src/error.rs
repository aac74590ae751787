//! Common error type for per-entry archive processing

use std::io;

/// Error from processing a single archive entry (read + gunzip + parse).
///
/// Entry errors never abort a batch: the entry contributes zero records and
/// the failure is logged and counted.
#[derive(Debug)]
pub enum EntryError {
    /// Entry could not be read out of the archive
    Read(io::Error),
    /// Stored bytes are not a valid gzip stream
    Decompress(io::Error),
    /// Decompressed payload is not valid UTF-8 JSON
    Parse(serde_json::Error),
    /// JSON parsed, but is neither an object with `items` nor a bare list
    UnrecognizedShape,
}

impl std::fmt::Display for EntryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Read(e) => write!(f, "read: {e}"),
            Self::Decompress(e) => write!(f, "gunzip: {e}"),
            Self::Parse(e) => write!(f, "JSON decode: {e}"),
            Self::UnrecognizedShape => write!(f, "JSON structure not recognized"),
        }
    }
}

impl std::error::Error for EntryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Read(e) | Self::Decompress(e) => Some(e),
            Self::Parse(e) => Some(e),
            Self::UnrecognizedShape => None,
        }
    }
}

impl From<serde_json::Error> for EntryError {
    fn from(e: serde_json::Error) -> Self {
        Self::Parse(e)
    }
}
