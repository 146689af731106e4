//! Rendering of the analysis result into the report bundle consumed by
//! charting and reporting tools.

use crate::domain::model::{AnalysisResult, ForecastPoint, Series};
use crate::utils::error::{ForecastError, Result};
use std::io::Write;
use zip::write::{SimpleFileOptions, ZipWriter};
use zip::CompressionMethod;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    Csv,
    Tsv,
    Json,
}

impl ReportFormat {
    pub fn parse(value: &str) -> Result<Self> {
        match value.to_ascii_lowercase().as_str() {
            "csv" => Ok(ReportFormat::Csv),
            "tsv" => Ok(ReportFormat::Tsv),
            "json" => Ok(ReportFormat::Json),
            other => Err(ForecastError::InvalidConfigValueError {
                field: "output_formats".to_string(),
                value: other.to_string(),
                reason: "Valid formats: csv, tsv, json".to_string(),
            }),
        }
    }

    fn delimited(self) -> Option<(u8, &'static str)> {
        match self {
            ReportFormat::Csv => Some((b',', "csv")),
            ReportFormat::Tsv => Some((b'\t', "tsv")),
            ReportFormat::Json => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportCompression {
    #[default]
    Deflated,
    Stored,
}

impl ReportCompression {
    pub fn parse(value: &str) -> Result<Self> {
        match value.to_ascii_lowercase().as_str() {
            "deflated" => Ok(ReportCompression::Deflated),
            "stored" => Ok(ReportCompression::Stored),
            other => Err(ForecastError::InvalidConfigValueError {
                field: "compression".to_string(),
                value: other.to_string(),
                reason: "Valid methods: deflated, stored".to_string(),
            }),
        }
    }

    fn method(self) -> CompressionMethod {
        match self {
            ReportCompression::Deflated => CompressionMethod::Deflated,
            ReportCompression::Stored => CompressionMethod::Stored,
        }
    }
}

/// 報表輸出設定，明確傳入 render_report，不使用全域狀態
#[derive(Debug, Clone, PartialEq)]
pub struct ReportConfig {
    pub formats: Vec<ReportFormat>,
    pub include_top_regions: bool,
    pub compression: ReportCompression,
}

impl ReportConfig {
    pub fn from_format_names(names: &[String]) -> Result<Self> {
        let mut formats = Vec::new();
        for name in names {
            let format = ReportFormat::parse(name)?;
            if !formats.contains(&format) {
                formats.push(format);
            }
        }
        Ok(Self {
            formats,
            include_top_regions: true,
            compression: ReportCompression::default(),
        })
    }

    pub fn with_compression(mut self, compression: ReportCompression) -> Self {
        self.compression = compression;
        self
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            formats: vec![ReportFormat::Csv, ReportFormat::Json],
            include_top_regions: true,
            compression: ReportCompression::default(),
        }
    }
}

/// Builds the ZIP bundle: one delimited table per series for each tabular
/// format, and `summary.json` when JSON is requested.
pub fn render_report(result: &AnalysisResult, config: &ReportConfig) -> Result<Vec<u8>> {
    let mut zip = ZipWriter::new(std::io::Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(config.compression.method());

    for format in &config.formats {
        match format.delimited() {
            Some((delimiter, ext)) => {
                let mut tables = vec![
                    (
                        format!("national.{}", ext),
                        series_table(std::slice::from_ref(&result.national), delimiter)?,
                    ),
                    (
                        format!("region.{}", ext),
                        series_table(std::slice::from_ref(&result.region), delimiter)?,
                    ),
                    (
                        format!("forecast.{}", ext),
                        forecast_table(&result.region.label, &result.forecast, delimiter)?,
                    ),
                ];
                if config.include_top_regions {
                    tables.push((
                        format!("top_regions.{}", ext),
                        series_table(&result.top_regions, delimiter)?,
                    ));
                }

                for (name, data) in tables {
                    zip.start_file(name, options)?;
                    zip.write_all(&data)?;
                }
            }
            None => {
                let summary = serde_json::json!({
                    "summary": result.summary,
                    "selection": result.selection,
                    "model": result.model,
                    "forecast": result.forecast,
                    "warnings": result.warnings,
                });
                zip.start_file("summary.json", options)?;
                zip.write_all(serde_json::to_string_pretty(&summary)?.as_bytes())?;
            }
        }
    }

    let cursor = zip.finish()?;
    Ok(cursor.into_inner())
}

/// Human-readable text summary printed by the binaries after a run.
pub fn console_summary(result: &AnalysisResult) -> String {
    let mut out = String::new();
    let summary = &result.summary;

    out.push_str(&format!(
        "Dataset: {} rows, {} regions",
        summary.rows, summary.regions
    ));
    if let (Some(first), Some(last)) = (summary.first_date, summary.last_date) {
        out.push_str(&format!(" ({} to {})", first.format("%Y-%m"), last.format("%Y-%m")));
    }
    out.push('\n');
    out.push_str(&format!(
        "Backfilled index_sa: {} rows, still missing: {} rows\n",
        summary.backfilled_rows, summary.missing_index_sa
    ));
    if let Some(latest) = summary.latest_national_sa {
        out.push_str(&format!("Latest national index (SA): {:.2}\n", latest));
    }

    for warning in &result.warnings {
        out.push_str(&format!("Warning: {}\n", warning.message()));
    }

    match &result.model {
        Some(model) => {
            out.push_str(&format!(
                "Trend for {}: {:+.4} per month (intercept {:.2}, {} observations)\n",
                result.region.label, model.slope, model.intercept, model.observations
            ));
            for point in &result.forecast {
                out.push_str(&format!(
                    "  {}  {:>10.2}\n",
                    point.date.format("%Y-%m"),
                    point.value
                ));
            }
        }
        None => out.push_str("No forecast produced\n"),
    }

    out
}

fn format_value(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn series_table(series: &[Series], delimiter: u8) -> Result<Vec<u8>> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .from_writer(Vec::new());
    writer.write_record(["label", "date", "index_nsa", "index_sa"])?;

    for s in series {
        for point in &s.points {
            writer.write_record([
                s.label.clone(),
                point.date.format("%Y-%m-%d").to_string(),
                format_value(point.index_nsa),
                format_value(point.index_sa),
            ])?;
        }
    }

    writer
        .into_inner()
        .map_err(|e| ForecastError::IoError(e.into_error()))
}

fn forecast_table(region: &str, forecast: &[ForecastPoint], delimiter: u8) -> Result<Vec<u8>> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .from_writer(Vec::new());
    writer.write_record(["label", "step", "date", "predicted_index_sa"])?;

    for point in forecast {
        writer.write_record([
            region.to_string(),
            point.step.to_string(),
            point.date.format("%Y-%m-%d").to_string(),
            point.value.to_string(),
        ])?;
    }

    writer
        .into_inner()
        .map_err(|e| ForecastError::IoError(e.into_error()))
}
