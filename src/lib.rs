pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use config::{cli::LocalStorage, toml_config::TomlConfig};
pub use core::{
    estimator::{DilutionEstimator, Estimate, ReportMode},
    etl::{EtlEngine, RunSummary},
    pipeline::ReportPipeline,
    rounding::bank_round,
};
pub use domain::plate::{CountableRange, PlateReading, PlateType, ReadingGroup, Sign};
pub use utils::error::{EtlError, Result};
