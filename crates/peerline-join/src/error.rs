//! Schema-level failures that abort a join run

use std::fmt;
use std::path::PathBuf;

/// Which input of a join a column was expected in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
    /// Single-table stages (time span, projection)
    Input,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Left => write!(f, "left"),
            Self::Right => write!(f, "right"),
            Self::Input => write!(f, "input"),
        }
    }
}

#[derive(Debug)]
pub enum JoinError {
    /// A required column is absent from one input
    MissingColumn { column: String, side: Side },
    /// A file's column set differs from the first file in its directory
    SchemaMismatch {
        file: PathBuf,
        expected: Vec<String>,
        found: Vec<String>,
    },
    /// A directory holds no `.csv` files
    EmptyDirectory(PathBuf),
}

impl fmt::Display for JoinError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingColumn { column, side } => {
                write!(f, "column '{column}' missing from {side} dataset")
            }
            Self::SchemaMismatch {
                file,
                expected,
                found,
            } => write!(
                f,
                "{}: columns [{}] do not match [{}]",
                file.display(),
                found.join(", "),
                expected.join(", ")
            ),
            Self::EmptyDirectory(dir) => write!(f, "{}: no CSV files found", dir.display()),
        }
    }
}

impl std::error::Error for JoinError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_missing_column() {
        let err = JoinError::MissingColumn {
            column: "cited_identifier".into(),
            side: Side::Right,
        };
        assert_eq!(
            err.to_string(),
            "column 'cited_identifier' missing from right dataset"
        );
    }

    #[test]
    fn display_schema_mismatch() {
        let err = JoinError::SchemaMismatch {
            file: PathBuf::from("b.csv"),
            expected: vec!["a".into(), "b".into()],
            found: vec!["a".into()],
        };
        assert_eq!(err.to_string(), "b.csv: columns [a] do not match [a, b]");
    }
}
