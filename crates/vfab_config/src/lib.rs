//! Parsing and validation of `vfab.toml` scenario files.
//!
//! A scenario describes the fabrics, the netlist catalog, the request batches
//! and the cloudlet workload of one run. This crate reads it into a
//! strongly-typed [`ScenarioConfig`] and rejects inconsistent values before
//! anything is built from it.

#![warn(missing_docs)]

pub mod error;
pub mod loader;
pub mod types;

pub use error::ConfigError;
pub use loader::{load_config, load_config_file, load_config_from_str, DEFAULT_CONFIG_FILE};
pub use types::*;
