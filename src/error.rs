//! Hard errors raised while loading mapping tables
//!
//! Conversion itself never fails; see [`crate::diagnostic`] for the
//! recoverable conditions it reports instead.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MapperError {
    /// Strict resolution was requested and no exact table exists
    #[error("no mapping table for motion version '{version}' (strict resolution)")]
    UnresolvedVersion { version: String },

    /// The end of the fallback chain is missing; a packaging defect
    #[error("default mapping table for motion version '{version}' not found at {}", .path.display())]
    MissingDefaultTable { version: String, path: PathBuf },

    #[error("canonical mapping table not found at {}", .path.display())]
    MissingCanonicalTable { path: PathBuf },

    #[error("failed to read mapping table {}", .path.display())]
    TableRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse mapping table {}", .path.display())]
    TableParse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// The table parsed but violates the mapping-table contract
    #[error("invalid mapping table {}: {reason}", .path.display())]
    InvalidTable { path: PathBuf, reason: String },
}

pub type Result<T, E = MapperError> = std::result::Result<T, E>;
