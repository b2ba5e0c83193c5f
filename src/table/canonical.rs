//! Canonical (motionEye) namespace table

use indexmap::IndexMap;
use serde::Deserialize;
use std::path::Path;

use crate::error::{MapperError, Result};
use crate::table::{INLINE_ORIGIN, parse_yaml};
use crate::types::ParamType;

#[derive(Debug, Deserialize)]
struct RawTable {
    #[serde(default)]
    params: Option<IndexMap<String, RawEntry>>,
}

#[derive(Debug, Deserialize)]
struct RawEntry {
    #[serde(rename = "type")]
    param_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalParameterSpec {
    pub name: String,
    pub param_type: ParamType,
}

/// Every parameter name the controlling application knows, with its type
#[derive(Debug, Clone, Default)]
pub struct CanonicalTable {
    params: IndexMap<String, CanonicalParameterSpec>,
}

impl CanonicalTable {
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        Self::parse(yaml, Path::new(INLINE_ORIGIN))
    }

    pub(crate) fn parse(contents: &str, path: &Path) -> Result<Self> {
        let raw: RawTable = parse_yaml(contents, path)?;
        let mut params = IndexMap::new();

        for (name, entry) in raw.params.unwrap_or_default() {
            let param_type = match entry.param_type.as_deref() {
                Some("bool") => ParamType::Bool,
                Some("int") => ParamType::Int,
                Some("string") => ParamType::String,
                Some(other) => {
                    return Err(MapperError::InvalidTable {
                        path: path.to_path_buf(),
                        reason: format!("parameter '{name}' has unknown type '{other}'"),
                    });
                }
                None => {
                    return Err(MapperError::InvalidTable {
                        path: path.to_path_buf(),
                        reason: format!("parameter '{name}' has no type"),
                    });
                }
            };
            params.insert(name.clone(), CanonicalParameterSpec { name, param_type });
        }

        Ok(Self { params })
    }

    pub fn get(&self, name: &str) -> Option<&CanonicalParameterSpec> {
        self.params.get(name)
    }

    pub fn param_type(&self, name: &str) -> Option<ParamType> {
        self.params.get(name).map(|spec| spec.param_type)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.params.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CanonicalParameterSpec> + '_ {
        self.params.values()
    }
}
