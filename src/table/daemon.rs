//! Per-version daemon (motion) namespace table

use indexmap::IndexMap;
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use crate::constants::params::UNSUPPORTED_MTYPE;
use crate::error::{MapperError, Result};
use crate::table::{INLINE_ORIGIN, parse_yaml};

#[derive(Debug, Deserialize)]
struct RawTable {
    #[serde(default)]
    params: Option<IndexMap<String, RawEntry>>,
}

#[derive(Debug, Deserialize)]
struct RawEntry {
    #[serde(default)]
    mname: Option<String>,
    #[serde(default)]
    mtype: Option<serde_yaml::Value>,
    #[serde(default)]
    mlist_name: Option<String>,
}

/// How a canonical parameter is expressed by one daemon version
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DaemonType {
    /// One-to-one rename (or identity)
    Normal,
    /// Packed as `subkey=value` inside the comma-separated option `list_group`
    ListMember { list_group: String },
    /// No daemon equivalent
    Unsupported,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DaemonParameterSpec {
    pub canonical_name: String,
    /// Empty means "same as the canonical name"
    pub daemon_name: String,
    pub daemon_type: DaemonType,
}

impl DaemonParameterSpec {
    /// Name used on the daemon side: the rename target, or the canonical name
    pub fn effective_name(&self) -> &str {
        if self.daemon_name.is_empty() {
            &self.canonical_name
        } else {
            &self.daemon_name
        }
    }

    pub fn list_group(&self) -> Option<&str> {
        match &self.daemon_type {
            DaemonType::ListMember { list_group } => Some(list_group),
            _ => None,
        }
    }
}

/// How the loader arrived at a table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Exact,
    MajorMinor,
    Default,
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Resolution::Exact => "exact",
            Resolution::MajorMinor => "major.minor",
            Resolution::Default => "default",
        };
        f.write_str(name)
    }
}

/// Parameter overrides for one motion version, plus reverse-lookup indexes
#[derive(Debug, Clone)]
pub struct DaemonTable {
    requested_version: String,
    version: String,
    resolution: Resolution,
    params: IndexMap<String, DaemonParameterSpec>,
    /// daemon name → canonical name, normal entries only, first declaration wins
    by_daemon_name: HashMap<String, String>,
    /// list group → (member name → canonical name)
    groups: HashMap<String, HashMap<String, String>>,
}

impl DaemonTable {
    /// Parse a table that is taken to be the exact match for `version`
    pub fn from_yaml_str(yaml: &str, version: &str) -> Result<Self> {
        Self::parse(yaml, Path::new(INLINE_ORIGIN), version, version, Resolution::Exact)
    }

    pub(crate) fn parse(
        contents: &str,
        path: &Path,
        requested_version: &str,
        version: &str,
        resolution: Resolution,
    ) -> Result<Self> {
        let raw: RawTable = parse_yaml(contents, path)?;
        let invalid = |reason: String| MapperError::InvalidTable {
            path: path.to_path_buf(),
            reason,
        };

        let mut params = IndexMap::new();
        let mut by_daemon_name = HashMap::new();
        let mut groups: HashMap<String, HashMap<String, String>> = HashMap::new();

        for (canonical_name, entry) in raw.params.unwrap_or_default() {
            let unsupported = entry
                .mtype
                .as_ref()
                .and_then(|v| v.as_str())
                .is_some_and(|t| t == UNSUPPORTED_MTYPE);

            let daemon_type = match (unsupported, entry.mlist_name) {
                (true, Some(_)) => {
                    return Err(invalid(format!(
                        "parameter '{canonical_name}' is both unsupported and a list member"
                    )));
                }
                (true, None) => DaemonType::Unsupported,
                (false, Some(group)) if group.trim().is_empty() => {
                    return Err(invalid(format!(
                        "parameter '{canonical_name}' has an empty mlist_name"
                    )));
                }
                (false, Some(group)) => DaemonType::ListMember { list_group: group },
                (false, None) => DaemonType::Normal,
            };

            let spec = DaemonParameterSpec {
                canonical_name: canonical_name.clone(),
                daemon_name: entry.mname.unwrap_or_default(),
                daemon_type,
            };

            match &spec.daemon_type {
                DaemonType::Normal => {
                    by_daemon_name
                        .entry(spec.effective_name().to_string())
                        .or_insert_with(|| canonical_name.clone());
                }
                DaemonType::ListMember { list_group } => {
                    groups
                        .entry(list_group.clone())
                        .or_default()
                        .entry(spec.effective_name().to_string())
                        .or_insert_with(|| canonical_name.clone());
                }
                DaemonType::Unsupported => {}
            }

            params.insert(canonical_name, spec);
        }

        Ok(Self {
            requested_version: requested_version.to_string(),
            version: version.to_string(),
            resolution,
            params,
            by_daemon_name,
            groups,
        })
    }

    /// Version the caller asked for
    pub fn requested_version(&self) -> &str {
        &self.requested_version
    }

    /// Version of the table actually loaded
    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    /// Override for a canonical parameter, if this version declares one
    pub fn get(&self, canonical_name: &str) -> Option<&DaemonParameterSpec> {
        self.params.get(canonical_name)
    }

    /// Canonical name behind a normal (non-list) daemon option
    pub fn canonical_for(&self, daemon_name: &str) -> Option<&str> {
        self.by_daemon_name.get(daemon_name).map(String::as_str)
    }

    pub fn is_list_group(&self, name: &str) -> bool {
        self.groups.contains_key(name)
    }

    /// Canonical name behind `subkey` inside the packed option `group`
    pub fn canonical_for_member(&self, group: &str, subkey: &str) -> Option<&str> {
        self.groups
            .get(group)
            .and_then(|members| members.get(subkey))
            .map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DaemonParameterSpec> + '_ {
        self.params.values()
    }
}
