use crate::config::{
    delimiter_for_path, validate_delimiter, DEFAULT_MODEL_FILENAME, DEFAULT_REPORT_FILENAME,
    SUPPORTED_INPUT_EXTENSIONS,
};
use crate::core::report::ReportCompression;
use crate::core::ConfigProvider;
use crate::domain::services::aggregator::DEFAULT_TOP_REGIONS;
use crate::utils::error::{ForecastError, Result};
use crate::utils::validation::{self, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

const MAX_TOP_REGIONS: usize = 50;
const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    pub pipeline: PipelineConfig,
    pub dataset: DatasetConfig,
    #[serde(default)]
    pub analysis: AnalysisConfig,
    pub load: LoadConfig,
    pub monitoring: Option<MonitoringConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub name: String,
    pub description: Option<String>,
    pub version: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetConfig {
    pub path: String,
    pub delimiter: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalysisConfig {
    pub region: Option<String>,
    pub top_regions: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadConfig {
    pub output_path: String,
    pub output_formats: Vec<String>,
    pub report_filename: Option<String>,
    pub model_filename: Option<String>,
    pub compression: Option<CompressionConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompressionConfig {
    pub method: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringConfig {
    pub enabled: bool,
    pub log_level: Option<String>,
    pub json_logs: Option<bool>,
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(ForecastError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| ForecastError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${HPI_DATA})，未設定的變數保留原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| ForecastError::ConfigError {
            message: format!("invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    /// 驗證配置的合理性
    pub fn validate_config(&self) -> Result<()> {
        validation::validate_non_empty_string("pipeline.name", &self.pipeline.name)?;

        check_resolved("dataset.path", &self.dataset.path)?;
        check_resolved("load.output_path", &self.load.output_path)?;

        validation::validate_path("dataset.path", &self.dataset.path)?;
        validation::validate_file_extensions(
            "dataset.path",
            std::slice::from_ref(&self.dataset.path),
            &SUPPORTED_INPUT_EXTENSIONS,
        )?;

        if let Some(delimiter) = &self.dataset.delimiter {
            let mut chars = delimiter.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => validate_delimiter("dataset.delimiter", c)?,
                _ => {
                    return Err(ForecastError::InvalidConfigValueError {
                        field: "dataset.delimiter".to_string(),
                        value: delimiter.clone(),
                        reason: "Delimiter must be exactly one character".to_string(),
                    })
                }
            }
        }

        if let Some(region) = &self.analysis.region {
            validation::validate_non_empty_string("analysis.region", region)?;
        }

        validation::validate_range(
            "analysis.top_regions",
            self.top_regions(),
            1,
            MAX_TOP_REGIONS,
        )?;

        validation::validate_path("load.output_path", &self.load.output_path)?;
        validation::validate_output_formats("load.output_formats", &self.load.output_formats)?;
        ReportCompression::parse(self.compression()).map_err(|_| {
            ForecastError::InvalidConfigValueError {
                field: "load.compression.method".to_string(),
                value: self.compression().to_string(),
                reason: "Valid methods: deflated, stored".to_string(),
            }
        })?;

        if let Some(level) = self.monitoring.as_ref().and_then(|m| m.log_level.as_ref()) {
            if !LOG_LEVELS.contains(&level.as_str()) {
                return Err(ForecastError::InvalidConfigValueError {
                    field: "monitoring.log_level".to_string(),
                    value: level.clone(),
                    reason: format!("Valid levels: {}", LOG_LEVELS.join(", ")),
                });
            }
        }

        Ok(())
    }

    /// 取得監控設定
    pub fn monitoring_enabled(&self) -> bool {
        self.monitoring.as_ref().map(|m| m.enabled).unwrap_or(false)
    }

    pub fn log_level(&self) -> &str {
        self.monitoring
            .as_ref()
            .and_then(|m| m.log_level.as_deref())
            .unwrap_or("info")
    }

    pub fn json_logs(&self) -> bool {
        self.monitoring
            .as_ref()
            .and_then(|m| m.json_logs)
            .unwrap_or(false)
    }
}

/// 環境變數未設定時 `${VAR}` 會原樣保留，視為缺少該設定
fn check_resolved(field: &str, value: &str) -> Result<()> {
    match value.find("${") {
        Some(start) => {
            let var = value[start + 2..].split('}').next().unwrap_or_default();
            Err(ForecastError::MissingConfigError {
                field: format!("{} (environment variable {} is not set)", field, var),
            })
        }
        None => Ok(()),
    }
}

impl ConfigProvider for TomlConfig {
    fn input_path(&self) -> &str {
        &self.dataset.path
    }

    fn delimiter(&self) -> u8 {
        self.dataset
            .delimiter
            .as_ref()
            .and_then(|d| d.chars().next())
            .map(|c| c as u8)
            .unwrap_or_else(|| delimiter_for_path(&self.dataset.path))
    }

    fn region(&self) -> Option<&str> {
        self.analysis.region.as_deref()
    }

    fn output_path(&self) -> &str {
        &self.load.output_path
    }

    fn top_regions(&self) -> usize {
        self.analysis.top_regions.unwrap_or(DEFAULT_TOP_REGIONS)
    }

    fn output_formats(&self) -> &[String] {
        &self.load.output_formats
    }

    fn report_filename(&self) -> &str {
        self.load
            .report_filename
            .as_deref()
            .unwrap_or(DEFAULT_REPORT_FILENAME)
    }

    fn model_filename(&self) -> &str {
        self.load
            .model_filename
            .as_deref()
            .unwrap_or(DEFAULT_MODEL_FILENAME)
    }

    fn compression(&self) -> &str {
        self.load
            .compression
            .as_ref()
            .map(|c| c.method.as_str())
            .unwrap_or("deflated")
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
