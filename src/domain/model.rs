use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// 讀入的原始資料列，尚未補值與合成日期
#[derive(Debug, Clone, PartialEq)]
pub struct RawObservation {
    pub line: usize,
    pub region_name: String,
    pub year: i32,
    pub period: u32,
    pub index_nsa: Option<f64>,
    pub index_sa: Option<f64>,
}

/// 清理後的資料列：`index_sa` 已由 `index_nsa` 補值，`date` 為當月一日
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Observation {
    pub region_name: String,
    pub year: i32,
    pub period: u32,
    pub date: NaiveDate,
    pub index_nsa: Option<f64>,
    pub index_sa: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesPoint {
    pub date: NaiveDate,
    pub index_nsa: Option<f64>,
    pub index_sa: Option<f64>,
}

/// Date-ordered values for one region or for the national aggregate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Series {
    pub label: String,
    pub points: Vec<SeriesPoint>,
}

impl Series {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.points.last().map(|p| p.date)
    }
}

/// Fitted line `value = slope * step + intercept`.
///
/// Step 0 is `origin`; step `observations - 1` is `last_observed`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrendModel {
    pub slope: f64,
    pub intercept: f64,
    pub origin: NaiveDate,
    pub last_observed: NaiveDate,
    pub observations: usize,
}

impl TrendModel {
    pub fn predict(&self, step: usize) -> f64 {
        self.slope * step as f64 + self.intercept
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastPoint {
    pub step: usize,
    pub date: NaiveDate,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionSelection {
    pub requested: Option<String>,
    pub effective: String,
    pub substituted: bool,
}

/// 非致命狀況，會記錄在結果中並顯示給使用者
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PipelineWarning {
    RegionNotFound {
        requested: Option<String>,
        substitute: String,
    },
    ForecastSkipped {
        region: String,
        reason: String,
    },
}

impl PipelineWarning {
    pub fn message(&self) -> String {
        match self {
            PipelineWarning::RegionNotFound {
                requested: Some(requested),
                substitute,
            } => format!(
                "Region '{}' not found in dataset; using '{}' instead",
                requested, substitute
            ),
            PipelineWarning::RegionNotFound {
                requested: None,
                substitute,
            } => format!("No region requested; using '{}'", substitute),
            PipelineWarning::ForecastSkipped { region, reason } => {
                format!("Forecast for '{}' skipped: {}", region, reason)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasetSummary {
    pub rows: usize,
    pub regions: usize,
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
    pub backfilled_rows: usize,
    pub missing_index_sa: usize,
    pub latest_national_sa: Option<f64>,
    pub latest_national_nsa: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisResult {
    pub summary: DatasetSummary,
    pub national: Series,
    pub selection: Option<RegionSelection>,
    pub region: Series,
    pub top_regions: Vec<Series>,
    pub model: Option<TrendModel>,
    pub forecast: Vec<ForecastPoint>,
    pub warnings: Vec<PipelineWarning>,
}

/// load 階段寫出的檔案路徑
#[derive(Debug, Clone, PartialEq)]
pub struct LoadOutput {
    pub report_path: String,
    pub model_path: Option<String>,
}
