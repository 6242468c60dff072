pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use crate::config::CliConfig;
pub use crate::config::{LocalStorage, ValidatorSettings};

pub use crate::core::{
    bundle::OcaBundle, data_set::DataSet, engine::ValidationEngine, report::ValidationReport,
    validator::ValidateOptions,
};
pub use crate::utils::error::{OcaError, Result};
