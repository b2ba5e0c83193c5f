//! Tool settings for the mapper CLI
//!
//! TOML file under the platform config dir, then environment overrides,
//! then validation that repairs unusable values with a warning.

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::constants::config::{
    APP_DIR, ENV_DEFAULT_VERSION, ENV_RESERVED_PREFIX, ENV_TABLES_DIR, FILENAME,
};
use crate::constants::{params, tables};
use crate::mapper::MotionConfigMapper;
use crate::table::{TableStore, is_valid_version};

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Directory holding `motioneye.yaml` and the `motion_<version>.yaml` tables
    #[serde(default = "default_tables_dir")]
    pub tables_dir: PathBuf,

    /// Last resort when no table matches the requested motion version
    #[serde(default = "default_version")]
    pub default_version: String,

    /// Marker for internal parameters that are never remapped
    #[serde(default = "default_reserved_prefix")]
    pub reserved_prefix: String,

    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_tables_dir() -> PathBuf {
    match dirs::data_dir() {
        Some(mut path) => {
            path.push(APP_DIR);
            path.push(tables::DATA_SUBDIR);
            path
        }
        None => PathBuf::from(tables::DATA_SUBDIR),
    }
}

fn default_version() -> String {
    tables::DEFAULT_VERSION.to_string()
}

fn default_reserved_prefix() -> String {
    params::RESERVED_PREFIX.to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            tables_dir: default_tables_dir(),
            default_version: default_version(),
            reserved_prefix: default_reserved_prefix(),
            log_level: default_log_level(),
        }
    }
}

impl Settings {
    pub fn path() -> PathBuf {
        let mut path = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push(APP_DIR);
        path.push(FILENAME);
        path
    }

    /// Load from `explicit` (must exist) or the default path (optional)
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = explicit.map(Path::to_path_buf).unwrap_or_else(Self::path);

        let mut settings = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read settings from {:?}", path))?;
            let settings = Self::from_toml_str(&contents)
                .with_context(|| format!("Failed to parse TOML from {:?}", path))?;
            info!(path = %path.display(), "Loaded settings");
            settings
        } else if explicit.is_some() {
            bail!("Settings file {:?} does not exist", path);
        } else {
            info!(path = %path.display(), "No settings file found, using defaults");
            Self::default()
        };

        settings.apply_overrides(|name| env::var(name).ok());
        settings.validate();
        Ok(settings)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self> {
        toml::from_str(contents).context("Invalid settings")
    }

    /// Apply overrides looked up by environment variable name
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(dir) = lookup(ENV_TABLES_DIR) {
            self.tables_dir = PathBuf::from(dir);
        }
        if let Some(version) = lookup(ENV_DEFAULT_VERSION) {
            self.default_version = version.trim().to_string();
        }
        if let Some(prefix) = lookup(ENV_RESERVED_PREFIX) {
            self.reserved_prefix = prefix;
        }
    }

    /// Replace unusable values with defaults
    pub fn validate(&mut self) {
        if !is_valid_version(&self.default_version) {
            warn!(default_version = %self.default_version, using = tables::DEFAULT_VERSION, "default_version is not a valid table version, using default");
            self.default_version = default_version();
        }

        if self.reserved_prefix.is_empty() {
            warn!(using = params::RESERVED_PREFIX, "reserved_prefix is empty, using default");
            self.reserved_prefix = default_reserved_prefix();
        }

        let level = self.log_level.to_lowercase();
        if LOG_LEVELS.contains(&level.as_str()) {
            self.log_level = level;
        } else {
            warn!(log_level = %self.log_level, "unknown log_level, using info");
            self.log_level = default_log_level();
        }
    }

    pub fn table_store(&self) -> TableStore {
        TableStore::new(&self.tables_dir).with_default_version(&self.default_version)
    }

    /// Mapper for `version` (or the default version) using these settings
    pub fn mapper(&self, version: Option<&str>, strict: bool) -> crate::error::Result<MotionConfigMapper> {
        Ok(MotionConfigMapper::open(self.table_store(), version, strict)?
            .with_reserved_prefix(&self.reserved_prefix))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_missing_fields_use_defaults() {
        let settings = Settings::from_toml_str("tables_dir = \"/opt/tables\"\n").unwrap();
        assert_eq!(settings.tables_dir, PathBuf::from("/opt/tables"));
        assert_eq!(settings.default_version, "4.4");
        assert_eq!(settings.reserved_prefix, "@");
        assert_eq!(settings.log_level, "info");
    }

    #[test]
    fn test_malformed_toml_is_error() {
        assert!(Settings::from_toml_str("tables_dir = [").is_err());
    }

    #[test]
    fn test_overrides() {
        let env: HashMap<&str, &str> = HashMap::from([
            (ENV_TABLES_DIR, "/srv/tables"),
            (ENV_DEFAULT_VERSION, " 4.2 "),
        ]);
        let mut settings = Settings::default();
        settings.apply_overrides(|name| env.get(name).map(|v| v.to_string()));

        assert_eq!(settings.tables_dir, PathBuf::from("/srv/tables"));
        assert_eq!(settings.default_version, "4.2");
        assert_eq!(settings.reserved_prefix, "@");
    }

    #[test]
    fn test_validate_repairs_values() {
        let mut settings = Settings {
            tables_dir: PathBuf::from("t"),
            default_version: "../4.4".to_string(),
            reserved_prefix: String::new(),
            log_level: "LOUD".to_string(),
        };
        settings.validate();

        assert_eq!(settings.default_version, "4.4");
        assert_eq!(settings.reserved_prefix, "@");
        assert_eq!(settings.log_level, "info");
    }

    #[test]
    fn test_load_reports_repairs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "default_version = \"../evil\"\nreserved_prefix = \"\"\n").unwrap();

        let logs = crate::test_support::captured_logs(|| {
            let settings = Settings::load(Some(&path)).unwrap();
            assert_eq!(settings.default_version, "4.4");
        });
        assert!(logs.contains("Loaded settings"));
        assert!(logs.contains("default_version is not a valid table version"));
        assert!(logs.contains("reserved_prefix is empty"));
    }

    #[test]
    fn test_validate_normalizes_log_level_case() {
        let mut settings = Settings {
            log_level: "DEBUG".to_string(),
            ..Settings::default()
        };
        settings.validate();
        assert_eq!(settings.log_level, "debug");
    }

    #[test]
    fn test_load_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "default_version = \"4.1\"\n").unwrap();

        let settings = Settings::load(Some(&path)).unwrap();
        assert_eq!(settings.table_store().default_version(), "4.1");

        assert!(Settings::load(Some(&dir.path().join("nope.toml"))).is_err());
    }
}
