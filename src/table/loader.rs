//! Locates mapping tables on disk and resolves daemon versions
//!
//! Resolution for a requested version `X.Y.Z`:
//! 1. `motion_X.Y.Z.yaml`
//! 2. strict mode stops here with [`MapperError::UnresolvedVersion`]
//! 3. `motion_X.Y.yaml`
//! 4. `motion_<default>.yaml`, with a warning
//! 5. [`MapperError::MissingDefaultTable`] if even that is absent

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::constants::tables::{
    CANONICAL_FILENAME, DAEMON_FILE_PREFIX, DEFAULT_VERSION, FILE_EXTENSION,
};
use crate::error::{MapperError, Result};
use crate::table::{CanonicalTable, DaemonTable, Resolution, is_valid_version, major_minor};

/// Directory of mapping tables plus the fallback version
#[derive(Debug, Clone)]
pub struct TableStore {
    root: PathBuf,
    default_version: String,
}

impl TableStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            default_version: DEFAULT_VERSION.to_string(),
        }
    }

    pub fn with_default_version(mut self, version: impl Into<String>) -> Self {
        self.default_version = version.into();
        self
    }

    pub fn default_version(&self) -> &str {
        &self.default_version
    }

    pub fn canonical_path(&self) -> PathBuf {
        self.root.join(CANONICAL_FILENAME)
    }

    pub fn daemon_path(&self, version: &str) -> PathBuf {
        self.root
            .join(format!("{DAEMON_FILE_PREFIX}{version}.{FILE_EXTENSION}"))
    }

    pub fn load_canonical(&self) -> Result<CanonicalTable> {
        let path = self.canonical_path();
        let contents = read_table(&path)?
            .ok_or_else(|| MapperError::MissingCanonicalTable { path: path.clone() })?;
        let table = CanonicalTable::parse(&contents, &path)?;
        info!(path = %path.display(), params = table.len(), "Loaded canonical table");
        Ok(table)
    }

    /// Resolve and load the daemon table for `version`
    pub fn load_daemon(&self, version: &str, strict: bool) -> Result<DaemonTable> {
        let valid = is_valid_version(version);
        if !valid {
            warn!(version = %version, "motion version is not usable as a table name");
        }
        let mut tried: Vec<String> = Vec::new();

        if valid {
            if let Some(table) = self.try_load(version, version, Resolution::Exact)? {
                return Ok(table);
            }
            tried.push(version.to_string());
        }

        if strict {
            return Err(MapperError::UnresolvedVersion {
                version: version.to_string(),
            });
        }

        if valid && let Some(prefix) = major_minor(version) {
            if let Some(table) = self.try_load(version, &prefix, Resolution::MajorMinor)? {
                return Ok(table);
            }
            tried.push(prefix);
        }

        let default = self.default_version.as_str();
        let path = self.daemon_path(default);
        if !is_valid_version(default) || tried.iter().any(|v| v == default) {
            return Err(MapperError::MissingDefaultTable {
                version: default.to_string(),
                path,
            });
        }

        match self.try_load(version, default, Resolution::Default)? {
            Some(table) => {
                warn!(requested = %version, fallback = %default, "No mapping table for motion version, falling back to default");
                Ok(table)
            }
            None => Err(MapperError::MissingDefaultTable {
                version: default.to_string(),
                path,
            }),
        }
    }

    /// Versions for which a daemon table file exists, sorted
    pub fn available_versions(&self) -> Result<Vec<String>> {
        let entries = fs::read_dir(&self.root).map_err(|source| MapperError::TableRead {
            path: self.root.clone(),
            source,
        })?;

        let suffix = format!(".{FILE_EXTENSION}");
        let mut versions: Vec<String> = entries
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| entry.file_name().into_string().ok())
            .filter_map(|name| {
                name.strip_prefix(DAEMON_FILE_PREFIX)
                    .and_then(|rest| rest.strip_suffix(&suffix))
                    .map(str::to_string)
            })
            .filter(|version| is_valid_version(version))
            .collect();
        versions.sort();
        Ok(versions)
    }

    fn try_load(
        &self,
        requested: &str,
        candidate: &str,
        resolution: Resolution,
    ) -> Result<Option<DaemonTable>> {
        let path = self.daemon_path(candidate);
        let Some(contents) = read_table(&path)? else {
            debug!(path = %path.display(), "mapping table not found");
            return Ok(None);
        };
        debug!(path = %path.display(), "mapping table found");

        let table = DaemonTable::parse(&contents, &path, requested, candidate, resolution)?;
        info!(requested = %requested, resolved = %candidate, resolution = %resolution, params = table.len(), "Loaded motion mapping table");
        Ok(Some(table))
    }
}

impl Default for TableStore {
    fn default() -> Self {
        Self::new(PathBuf::from(crate::constants::tables::DATA_SUBDIR))
    }
}

/// `Ok(None)` when the file does not exist; other I/O failures are errors
fn read_table(path: &Path) -> Result<Option<String>> {
    match fs::read_to_string(path) {
        Ok(contents) => Ok(Some(contents)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(source) => Err(MapperError::TableRead {
            path: path.to_path_buf(),
            source,
        }),
    }
}
