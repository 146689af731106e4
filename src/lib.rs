pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use config::{cli::LocalStorage, toml_config::TomlConfig};
pub use core::{
    etl::{AnalysisEngine, RunOutcome},
    pipeline::HousingPipeline,
};
pub use domain::model::{AnalysisResult, ForecastPoint, PipelineWarning, Series, TrendModel};
pub use domain::services::forecaster::FORECAST_HORIZON;
pub use utils::error::{ForecastError, Result};
