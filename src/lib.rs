pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

pub use adapters::{dcim::DcimClient, storage::LocalStorage};
pub use config::ReportSettings;

#[cfg(feature = "cli")]
pub use config::cli::CliConfig;

pub use core::{engine::ReportEngine, pipeline::RackPipeline};
pub use utils::error::{ReportError, Result};
