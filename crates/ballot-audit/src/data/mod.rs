//! Loading transcribed ballots from disk.
//!
//! Ballot files hold one ballot per line as comma-separated candidate ids in
//! preference order:
//!
//! ```text
//! # round 2, batch 14
//! ranking
//! 3,1,2
//! 2
//! -
//! ```
//!
//! Lines starting with `#` are comments, an optional `ranking` header is
//! skipped, and a lone `-` is an exhausted (blank) ballot. Ids are not
//! checked against the roster here; malformed ballots are rejected and
//! reported when the round admits them.

mod csv;

pub use csv::{load_ballots, parse_ballots};

use std::fmt;

/// Errors that can occur while loading ballots.
#[derive(Debug)]
pub enum DataError {
    /// IO error reading the file.
    Io(std::io::Error),

    /// Structural problem on a specific line.
    Parse {
        /// Line number where the error occurred (1-indexed).
        line: usize,
        /// Description of the parse error.
        message: String,
    },

    /// A field that is not a candidate id.
    InvalidCandidate {
        /// Line number where the field was found (1-indexed).
        line: usize,
        /// The offending field.
        value: String,
    },
}

impl fmt::Display for DataError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataError::Io(e) => write!(f, "IO error: {}", e),
            DataError::Parse { line, message } => {
                write!(f, "Parse error at line {}: {}", line, message)
            }
            DataError::InvalidCandidate { line, value } => {
                write!(f, "Invalid candidate id at line {}: '{}'", line, value)
            }
        }
    }
}

impl std::error::Error for DataError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DataError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for DataError {
    fn from(e: std::io::Error) -> Self {
        DataError::Io(e)
    }
}
