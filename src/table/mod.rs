//! Declarative mapping tables
//!
//! - **canonical**: the fixed motionEye namespace (name → type)
//! - **daemon**: one motion version's namespace (name → daemon name / list group)
//! - **loader**: locating tables on disk with version fallback

pub mod canonical;
pub mod daemon;
pub mod loader;

pub use canonical::{CanonicalParameterSpec, CanonicalTable};
pub use daemon::{DaemonParameterSpec, DaemonTable, DaemonType, Resolution};
pub use loader::TableStore;

use serde::de::DeserializeOwned;
use std::path::Path;

use crate::error::{MapperError, Result};

/// Origin used in errors for tables parsed from in-memory strings
pub(crate) const INLINE_ORIGIN: &str = "<inline>";

pub(crate) fn parse_yaml<T: DeserializeOwned>(contents: &str, path: &Path) -> Result<T> {
    serde_yaml::from_str(contents).map_err(|source| MapperError::TableParse {
        path: path.to_path_buf(),
        source,
    })
}

/// Version strings end up in file names, so only a conservative charset is accepted
pub(crate) fn is_valid_version(version: &str) -> bool {
    !version.is_empty()
        && version
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_' | '+'))
        && !version.starts_with('.')
}

/// First two dot-separated components, if the version has more than two
pub(crate) fn major_minor(version: &str) -> Option<String> {
    let mut parts = version.split('.');
    let major = parts.next()?;
    let minor = parts.next()?;
    parts.next()?;
    Some(format!("{major}.{minor}"))
}
