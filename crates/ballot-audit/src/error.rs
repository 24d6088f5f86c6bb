//! Front-end error type.

use std::fmt;

use ballot_audit_core::{AuditError, ConfigError, TieBreakError};

use crate::data::DataError;

/// Anything that can go wrong while driving an audit from files.
#[derive(Debug)]
pub enum Error {
    /// Round-level failure from the engine.
    Audit(AuditError),

    /// Ballot file could not be loaded.
    Data(DataError),

    /// A report could not be serialized.
    Json(serde_json::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Audit(e) => write!(f, "{}", e),
            Error::Data(e) => write!(f, "ballot data error: {}", e),
            Error::Json(e) => write!(f, "JSON output error: {}", e),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Audit(e) => Some(e),
            Error::Data(e) => Some(e),
            Error::Json(e) => Some(e),
        }
    }
}

impl From<AuditError> for Error {
    fn from(e: AuditError) -> Self {
        Error::Audit(e)
    }
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Error::Audit(AuditError::Config(e))
    }
}

impl From<TieBreakError> for Error {
    fn from(e: TieBreakError) -> Self {
        Error::Audit(AuditError::TieBreak(e))
    }
}

impl From<DataError> for Error {
    fn from(e: DataError) -> Self {
        Error::Data(e)
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Json(e)
    }
}
