//! Recoverable conditions reported during conversion

use std::fmt;
use tracing::warn;

use crate::types::{ParamType, ParamValue, ParameterSet};

/// Something a conversion noticed but did not abort on
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// Key is not part of the canonical namespace; skipped
    UnknownParameter { key: String },

    /// Daemon version has no equivalent; value passed through untouched
    UnsupportedParameter { key: String },

    /// An item of a list-packed option is not a `subkey=value` pair
    InvalidPackedEntry { group: String, entry: String },

    /// Value could not be coerced to the canonical type; raw value kept
    InvalidValue { key: String, value: ParamValue, expected: ParamType },

    /// Formatting produced no value; key dropped from the output
    NoValueProduced { key: String },
}

impl Diagnostic {
    pub fn key(&self) -> &str {
        match self {
            Diagnostic::UnknownParameter { key }
            | Diagnostic::UnsupportedParameter { key }
            | Diagnostic::InvalidValue { key, .. }
            | Diagnostic::NoValueProduced { key } => key,
            Diagnostic::InvalidPackedEntry { group, .. } => group,
        }
    }

    fn log(&self) {
        match self {
            Diagnostic::UnknownParameter { key } => {
                warn!(key = %key, "parameter not found in canonical table, skipping");
            }
            Diagnostic::UnsupportedParameter { key } => {
                warn!(key = %key, "parameter is not supported by this motion version and has no effect");
            }
            Diagnostic::InvalidPackedEntry { group, entry } => {
                warn!(group = %group, entry = %entry, "malformed packed entry, expected subkey=value");
            }
            Diagnostic::InvalidValue { key, value, expected } => {
                warn!(key = %key, value = %value, expected = %expected, "value does not match canonical type, keeping raw value");
            }
            Diagnostic::NoValueProduced { key } => {
                warn!(key = %key, "no value produced for parameter, dropping it");
            }
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::UnknownParameter { key } => write!(f, "unknown parameter '{key}'"),
            Diagnostic::UnsupportedParameter { key } => write!(f, "unsupported parameter '{key}'"),
            Diagnostic::InvalidPackedEntry { group, entry } => {
                write!(f, "invalid entry '{entry}' in '{group}'")
            }
            Diagnostic::InvalidValue { key, value, expected } => {
                write!(f, "value '{value}' of '{key}' is not a valid {expected}")
            }
            Diagnostic::NoValueProduced { key } => write!(f, "no value produced for '{key}'"),
        }
    }
}

/// Best-effort result of converting one parameter set
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Conversion {
    pub params: ParameterSet,
    pub diagnostics: Vec<Diagnostic>,
}

impl Conversion {
    /// Log and remember a diagnostic
    pub(crate) fn report(&mut self, diagnostic: Diagnostic) {
        diagnostic.log();
        self.diagnostics.push(diagnostic);
    }

    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty()
    }
}
