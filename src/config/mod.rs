pub mod cli;
pub mod toml_config;

use crate::core::ConfigProvider;
use crate::utils::error::{ForecastError, Result};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};

pub const DEFAULT_REPORT_FILENAME: &str = "housing_report.zip";
pub const DEFAULT_MODEL_FILENAME: &str = "trend_model.json";
pub const SUPPORTED_INPUT_EXTENSIONS: [&str; 3] = ["csv", "tsv", "txt"];

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Serialize, Deserialize, clap::Parser)]
#[command(name = "housing-forecast")]
#[command(about = "Housing price trend analysis and 12-month forecast")]
pub struct CliConfig {
    /// Path to the housing price index dataset (csv or tsv)
    #[arg(short, long)]
    pub input: String,

    /// Region to forecast; falls back to the first region in the dataset
    #[arg(short, long)]
    pub region: Option<String>,

    #[arg(long, default_value = "./output")]
    pub output_path: String,

    #[arg(long, default_value = DEFAULT_MODEL_FILENAME)]
    pub model_file: String,

    #[arg(long, default_value = DEFAULT_REPORT_FILENAME)]
    pub report_file: String,

    #[arg(long, default_value = "5")]
    pub top_regions: usize,

    #[arg(long, value_delimiter = ',', default_value = "csv,json")]
    pub formats: Vec<String>,

    /// Field delimiter; inferred from the file extension when omitted
    #[arg(long)]
    pub delimiter: Option<char>,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Log CPU and memory usage per stage")]
    pub monitor: bool,
}

#[cfg(feature = "cli")]
impl ConfigProvider for CliConfig {
    fn input_path(&self) -> &str {
        &self.input
    }

    fn delimiter(&self) -> u8 {
        self.delimiter
            .map(|c| c as u8)
            .unwrap_or_else(|| delimiter_for_path(&self.input))
    }

    fn region(&self) -> Option<&str> {
        self.region.as_deref()
    }

    fn output_path(&self) -> &str {
        &self.output_path
    }

    fn top_regions(&self) -> usize {
        self.top_regions
    }

    fn output_formats(&self) -> &[String] {
        &self.formats
    }

    fn report_filename(&self) -> &str {
        &self.report_file
    }

    fn model_filename(&self) -> &str {
        &self.model_file
    }
}

#[cfg(feature = "cli")]
impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_path("input", &self.input)?;
        validation::validate_file_extensions(
            "input",
            std::slice::from_ref(&self.input),
            &SUPPORTED_INPUT_EXTENSIONS,
        )?;
        validation::validate_path("output_path", &self.output_path)?;
        validation::validate_path("model_file", &self.model_file)?;
        validation::validate_path("report_file", &self.report_file)?;
        validation::validate_positive_number("top_regions", self.top_regions, 1)?;
        validation::validate_output_formats("formats", &self.formats)?;
        if let Some(region) = &self.region {
            validation::validate_non_empty_string("region", region)?;
        }
        if let Some(delimiter) = self.delimiter {
            validate_delimiter("delimiter", delimiter)?;
        }
        Ok(())
    }
}

/// 依副檔名推斷分隔字元，`.tsv` 使用 tab，其餘使用逗號
pub fn delimiter_for_path(path: &str) -> u8 {
    match std::path::Path::new(path)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
    {
        Some(ext) if ext == "tsv" => b'\t',
        _ => b',',
    }
}

pub fn validate_delimiter(field_name: &str, delimiter: char) -> Result<()> {
    if !delimiter.is_ascii() || delimiter.is_ascii_alphanumeric() || delimiter == '"' {
        return Err(ForecastError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: delimiter.to_string(),
            reason: "Delimiter must be a single ASCII punctuation or whitespace character"
                .to_string(),
        });
    }
    Ok(())
}
