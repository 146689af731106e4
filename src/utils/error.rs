use thiserror::Error;

#[derive(Error, Debug)]
pub enum ForecastError {
    #[error("Zip operation failed: {0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration validation failed for '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Data format error at line {line}, column '{column}': {message}")]
    DataFormatError {
        line: usize,
        column: String,
        message: String,
    },

    #[error("Data format error: required column '{column}' is missing")]
    MissingColumnError { column: String },

    #[error("Insufficient data for region '{region}': no usable observations")]
    InsufficientDataError { region: String },

    #[error("Data processing error: {message}")]
    ProcessingError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Io,
    Configuration,
    Data,
    Processing,
    Output,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl ForecastError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            ForecastError::IoError(_) => ErrorCategory::Io,
            ForecastError::ConfigError { .. }
            | ForecastError::ConfigValidationError { .. }
            | ForecastError::InvalidConfigValueError { .. }
            | ForecastError::MissingConfigError { .. } => ErrorCategory::Configuration,
            ForecastError::CsvError(_)
            | ForecastError::DataFormatError { .. }
            | ForecastError::MissingColumnError { .. } => ErrorCategory::Data,
            ForecastError::InsufficientDataError { .. } | ForecastError::ProcessingError { .. } => {
                ErrorCategory::Processing
            }
            ForecastError::ZipError(_) | ForecastError::SerializationError(_) => {
                ErrorCategory::Output
            }
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            // 預測階段的資料不足只影響預測，不影響趨勢序列
            ForecastError::InsufficientDataError { .. } => ErrorSeverity::Low,
            ForecastError::ConfigError { .. }
            | ForecastError::ConfigValidationError { .. }
            | ForecastError::InvalidConfigValueError { .. }
            | ForecastError::MissingConfigError { .. } => ErrorSeverity::Medium,
            ForecastError::CsvError(_)
            | ForecastError::DataFormatError { .. }
            | ForecastError::MissingColumnError { .. }
            | ForecastError::ProcessingError { .. } => ErrorSeverity::High,
            ForecastError::IoError(_)
            | ForecastError::ZipError(_)
            | ForecastError::SerializationError(_) => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            ForecastError::IoError(_) => {
                "Check that the input file exists and the output directory is writable".to_string()
            }
            ForecastError::CsvError(_) => {
                "Check the delimiter setting and that every row has the same number of fields"
                    .to_string()
            }
            ForecastError::ConfigError { .. } | ForecastError::ConfigValidationError { .. } => {
                "Review the configuration file for syntax errors".to_string()
            }
            ForecastError::InvalidConfigValueError { field, .. } => {
                format!("Provide a valid value for '{}'", field)
            }
            ForecastError::MissingConfigError { field } => {
                format!("Add the '{}' setting to the configuration", field)
            }
            ForecastError::DataFormatError { line, .. } => {
                format!("Fix or remove line {} of the input dataset", line)
            }
            ForecastError::MissingColumnError { column } => format!(
                "The dataset header must contain '{}' (expected: place_name, yr, period, index_nsa, index_sa)",
                column
            ),
            ForecastError::InsufficientDataError { .. } => {
                "Choose a region with at least one seasonally adjusted value".to_string()
            }
            ForecastError::ProcessingError { .. } => {
                "Re-run with --verbose to inspect the failing stage".to_string()
            }
            ForecastError::ZipError(_) | ForecastError::SerializationError(_) => {
                "Check free disk space and permissions of the output directory".to_string()
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Io => format!("Could not access a file: {}", self),
            ErrorCategory::Configuration => format!("Configuration problem: {}", self),
            ErrorCategory::Data => format!("The dataset could not be read: {}", self),
            ErrorCategory::Processing => format!("Analysis failed: {}", self),
            ErrorCategory::Output => format!("Could not write results: {}", self),
        }
    }

    /// 依嚴重程度決定結束碼
    pub fn exit_code(&self) -> i32 {
        match self.severity() {
            ErrorSeverity::Low => 0,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        }
    }
}

pub type Result<T> = std::result::Result<T, ForecastError>;
