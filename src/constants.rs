//! Application-wide constants
//!
//! File naming, fallback defaults and packing separators shared by the
//! table loader, the converter and the CLI.

/// Mapping table file layout
pub mod tables {
    /// Fixed table describing the canonical (motionEye) namespace
    pub const CANONICAL_FILENAME: &str = "motioneye.yaml";

    /// Daemon tables are named `motion_<version>.yaml`
    pub const DAEMON_FILE_PREFIX: &str = "motion_";

    /// Extension shared by all table files
    pub const FILE_EXTENSION: &str = "yaml";

    /// Version used when neither the exact nor the major.minor table exists
    pub const DEFAULT_VERSION: &str = "4.4";

    /// Directory name under the platform data dir that holds the tables
    pub const DATA_SUBDIR: &str = "tables";
}

/// Parameter conversion constants
pub mod params {
    /// Keys starting with this marker are internal and never remapped
    pub const RESERVED_PREFIX: &str = "@";

    /// Separator between items of a list-packed daemon option
    pub const LIST_SEPARATOR: char = ',';

    /// Separator between subkey and subvalue inside a packed item
    pub const PAIR_SEPARATOR: char = '=';

    /// Daemon spelling of boolean true
    pub const BOOL_ON: &str = "on";

    /// Daemon spelling of boolean false
    pub const BOOL_OFF: &str = "off";

    /// `mtype` value that marks a parameter as unsupported by a daemon version
    pub const UNSUPPORTED_MTYPE: &str = "none";
}

/// Tool configuration file and environment
pub mod config {
    /// Directory under the platform config/data dirs
    pub const APP_DIR: &str = "motion-config-mapper";

    /// Settings file name
    pub const FILENAME: &str = "config.toml";

    /// Overrides `tables_dir`
    pub const ENV_TABLES_DIR: &str = "MOTION_MAPPER_TABLES_DIR";

    /// Overrides `default_version`
    pub const ENV_DEFAULT_VERSION: &str = "MOTION_MAPPER_DEFAULT_VERSION";

    /// Overrides `reserved_prefix`
    pub const ENV_RESERVED_PREFIX: &str = "MOTION_MAPPER_RESERVED_PREFIX";

    /// Log level for the binary's subscriber
    pub const ENV_LOG_LEVEL: &str = "LOG_LEVEL";
}
