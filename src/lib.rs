//! Translates motion daemon configuration between the stable motionEye
//! parameter namespace and the namespaces of individual motion versions.

pub mod constants;
pub mod diagnostic;
pub mod error;
pub mod flatconf;
pub mod mapper;
pub mod settings;
pub mod table;
pub mod types;

#[cfg(test)]
mod test_support;

pub use diagnostic::{Conversion, Diagnostic};
pub use error::MapperError;
pub use mapper::MotionConfigMapper;
pub use settings::Settings;
pub use table::{CanonicalTable, DaemonTable, DaemonType, Resolution, TableStore};
pub use types::{ParamType, ParamValue, ParameterSet};
