pub mod bindings;
pub mod classify;
pub mod compose;
pub mod config;
pub mod core;
pub mod domain;
pub mod manifest;
pub mod parse;
pub mod report;
pub mod utils;

#[cfg(feature = "cli")]
pub use crate::config::CliConfig;

pub use crate::config::{cli::LocalStorage, toml_config::TomlConfig};
pub use crate::core::{engine::ScanEngine, pipeline::HeaderPipeline};
pub use crate::utils::error::{Result, ScanError};
