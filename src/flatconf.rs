//! Flat `key value` configuration text, as written by motion and motionEye
//!
//! One pair per line; blank lines and lines starting with `#` or `;` are
//! ignored; the first whitespace run separates key from value.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use tracing::debug;

use crate::types::{ParamValue, ParameterSet};

/// Parse flat config text; every value comes back as a string
pub fn parse_str(contents: &str) -> ParameterSet {
    let mut params = ParameterSet::new();

    for (index, raw) in contents.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
            continue;
        }

        match line.split_once(char::is_whitespace) {
            Some((key, value)) if !value.trim().is_empty() => {
                params.insert(key, value.trim());
            }
            _ => debug!(line = index + 1, content = %line, "skipping config line without a value"),
        }
    }

    params
}

pub fn read_file(path: &Path) -> Result<ParameterSet> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {:?}", path))?;
    let params = parse_str(&contents);
    debug!(path = %path.display(), params = params.len(), "Read flat config");
    Ok(params)
}

/// Render parameters back to flat text, booleans as `on`/`off`
pub fn render(params: &ParameterSet) -> String {
    let mut out = String::new();
    for (key, value) in params.iter() {
        out.push_str(key);
        out.push(' ');
        match value {
            ParamValue::Str(s) => out.push_str(s),
            other => out.push_str(&other.to_string()),
        }
        out.push('\n');
    }
    out
}
