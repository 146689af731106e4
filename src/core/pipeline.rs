use crate::core::report::{render_report, ReportCompression, ReportConfig};
use crate::core::{AnalysisResult, ConfigProvider, LoadOutput, Pipeline, RawObservation, Storage};
use crate::domain::model::{PipelineWarning, Series};
use crate::domain::services::{aggregator, forecaster, loader, summary, trend};
use crate::utils::error::Result;
use std::path::Path;

/// 房價分析管道：source 讀取資料集，sink 寫出報表與模型
pub struct HousingPipeline<S: Storage, C: ConfigProvider> {
    source: S,
    sink: S,
    config: C,
}

impl<S: Storage, C: ConfigProvider> HousingPipeline<S, C> {
    pub fn new(source: S, sink: S, config: C) -> Self {
        Self {
            source,
            sink,
            config,
        }
    }
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider> Pipeline for HousingPipeline<S, C> {
    async fn extract(&self) -> Result<Vec<RawObservation>> {
        tracing::debug!("Reading dataset from: {}", self.config.input_path());
        let data = self.source.read_file(self.config.input_path()).await?;
        tracing::debug!("Dataset size: {} bytes", data.len());

        loader::parse_observations(&data, self.config.delimiter())
    }

    async fn transform(&self, data: Vec<RawObservation>) -> Result<AnalysisResult> {
        // 清理與彙總失敗時整個流程中止
        let cleaned = loader::clean(&data)?;
        let national = aggregator::national_series(&cleaned);
        let summary = summary::summarize(&data, &cleaned, &national);
        tracing::info!(
            "📋 {} rows, {} regions, {} rows backfilled",
            summary.rows,
            summary.regions,
            summary.backfilled_rows
        );

        let mut warnings = Vec::new();

        let selection = aggregator::select_region(&cleaned, self.config.region()).map(
            |(selection, warning)| {
                if let Some(warning) = warning {
                    tracing::warn!("⚠️ {}", warning.message());
                    warnings.push(warning);
                }
                selection
            },
        );

        let region = match &selection {
            Some(selection) => aggregator::region_series(&cleaned, &selection.effective),
            None => Series {
                label: self.config.region().unwrap_or_default().to_string(),
                points: Vec::new(),
            },
        };

        let top_regions = aggregator::top_regions(&cleaned, self.config.top_regions());

        // 預測階段的錯誤只影響預測，不影響已完成的序列
        let (model, forecast) = if region.is_empty() {
            let warning = PipelineWarning::ForecastSkipped {
                region: region.label.clone(),
                reason: "no observations for the selected region".to_string(),
            };
            tracing::warn!("⚠️ {}", warning.message());
            warnings.push(warning);
            (None, Vec::new())
        } else {
            match trend::fit_trend(&region).and_then(|model| {
                forecaster::forecast(&model).map(|points| (model, points))
            }) {
                Ok((model, points)) => {
                    tracing::info!(
                        "📈 Trend for '{}': slope {:.4}/month, {} forecast points",
                        region.label,
                        model.slope,
                        points.len()
                    );
                    (Some(model), points)
                }
                Err(e) => {
                    let warning = PipelineWarning::ForecastSkipped {
                        region: region.label.clone(),
                        reason: e.to_string(),
                    };
                    tracing::warn!("⚠️ {}", warning.message());
                    warnings.push(warning);
                    (None, Vec::new())
                }
            }
        };

        Ok(AnalysisResult {
            summary,
            national,
            selection,
            region,
            top_regions,
            model,
            forecast,
            warnings,
        })
    }

    async fn load(&self, result: &AnalysisResult) -> Result<LoadOutput> {
        let compression = ReportCompression::parse(self.config.compression())?;
        let report_config = ReportConfig::from_format_names(self.config.output_formats())?
            .with_compression(compression);
        let report = render_report(result, &report_config)?;

        tracing::debug!("Writing report ({} bytes) to storage", report.len());
        self.sink
            .write_file(self.config.report_filename(), &report)
            .await?;
        let report_path = join_output(self.config.output_path(), self.config.report_filename());

        // 只有成功擬合時才寫出模型
        let model_path = match &result.model {
            Some(model) => {
                let data = serde_json::to_vec_pretty(model)?;
                self.sink
                    .write_file(self.config.model_filename(), &data)
                    .await?;
                let path = join_output(self.config.output_path(), self.config.model_filename());
                tracing::debug!("Model saved to {}", path);
                Some(path)
            }
            None => None,
        };

        Ok(LoadOutput {
            report_path,
            model_path,
        })
    }
}

fn join_output(base: &str, file: &str) -> String {
    Path::new(base).join(file).display().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::TrendModel;
    use crate::utils::error::ForecastError;
    use chrono::Datelike;
    use std::collections::HashMap;
    use std::sync::Arc;
    use tokio::sync::Mutex;

    #[derive(Clone)]
    struct MockStorage {
        files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    }

    impl MockStorage {
        fn new() -> Self {
            Self {
                files: Arc::new(Mutex::new(HashMap::new())),
            }
        }

        async fn put(&self, path: &str, data: &str) {
            let mut files = self.files.lock().await;
            files.insert(path.to_string(), data.as_bytes().to_vec());
        }

        async fn get_file(&self, path: &str) -> Option<Vec<u8>> {
            let files = self.files.lock().await;
            files.get(path).cloned()
        }
    }

    impl Storage for MockStorage {
        async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
            let files = self.files.lock().await;
            files.get(path).cloned().ok_or_else(|| {
                ForecastError::IoError(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("File not found: {}", path),
                ))
            })
        }

        async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
            let mut files = self.files.lock().await;
            files.insert(path.to_string(), data.to_vec());
            Ok(())
        }
    }

    struct MockConfig {
        region: Option<String>,
        formats: Vec<String>,
    }

    impl MockConfig {
        fn new(region: Option<&str>) -> Self {
            Self {
                region: region.map(str::to_string),
                formats: vec!["csv".to_string(), "json".to_string()],
            }
        }
    }

    impl ConfigProvider for MockConfig {
        fn input_path(&self) -> &str {
            "hpi.csv"
        }

        fn delimiter(&self) -> u8 {
            b','
        }

        fn region(&self) -> Option<&str> {
            self.region.as_deref()
        }

        fn output_path(&self) -> &str {
            "test_output"
        }

        fn top_regions(&self) -> usize {
            5
        }

        fn output_formats(&self) -> &[String] {
            &self.formats
        }

        fn report_filename(&self) -> &str {
            "housing_report.zip"
        }

        fn model_filename(&self) -> &str {
            "trend_model.json"
        }
    }

    const DATASET: &str = "place_name,yr,period,index_nsa,index_sa
Texas,2020,2,101.0,102.0
Texas,2020,1,99.0,100.0
Ohio,2020,1,90.0,
Texas,2020,3,103.5,104.0
Ohio,2020,2,,
";

    async fn pipeline_with(
        region: Option<&str>,
        dataset: &str,
    ) -> (HousingPipeline<MockStorage, MockConfig>, MockStorage) {
        let source = MockStorage::new();
        source.put("hpi.csv", dataset).await;
        let sink = MockStorage::new();
        let pipeline = HousingPipeline::new(source, sink.clone(), MockConfig::new(region));
        (pipeline, sink)
    }

    #[tokio::test]
    async fn test_extract_parses_dataset() {
        let (pipeline, _) = pipeline_with(Some("Texas"), DATASET).await;

        let rows = pipeline.extract().await.unwrap();

        assert_eq!(rows.len(), 5);
        assert_eq!(rows[2].region_name, "Ohio");
        assert_eq!(rows[2].index_sa, None);
    }

    #[tokio::test]
    async fn test_extract_missing_file() {
        let pipeline = HousingPipeline::new(
            MockStorage::new(),
            MockStorage::new(),
            MockConfig::new(None),
        );

        let err = pipeline.extract().await.unwrap_err();
        assert!(matches!(err, ForecastError::IoError(_)));
    }

    #[tokio::test]
    async fn test_transform_selected_region() {
        let (pipeline, _) = pipeline_with(Some("Texas"), DATASET).await;
        let rows = pipeline.extract().await.unwrap();

        let result = pipeline.transform(rows).await.unwrap();

        assert!(result.warnings.is_empty());
        assert_eq!(result.region.label, "Texas");
        assert_eq!(result.region.len(), 3);
        assert_eq!(result.national.len(), 3);
        assert_eq!(result.forecast.len(), 12);
        let model = result.model.unwrap();
        assert!((model.slope - 2.0).abs() < 1e-9);
        assert!((model.intercept - 100.0).abs() < 1e-9);
        // Ohio 2020-01 is backfilled from index_nsa
        assert_eq!(result.national.points[0].index_sa, Some(95.0));
        assert_eq!(result.summary.backfilled_rows, 1);
    }

    #[tokio::test]
    async fn test_transform_unknown_region_falls_back_with_warning() {
        let (pipeline, _) = pipeline_with(Some("Atlantis"), DATASET).await;
        let rows = pipeline.extract().await.unwrap();

        let result = pipeline.transform(rows).await.unwrap();

        let selection = result.selection.unwrap();
        assert_eq!(selection.effective, "Texas");
        assert!(selection.substituted);
        assert_eq!(result.warnings.len(), 1);
        assert!(result.warnings[0].message().contains("Atlantis"));
        assert_eq!(result.forecast.len(), 12);
    }

    #[tokio::test]
    async fn test_transform_region_without_values_skips_forecast() {
        let dataset = "place_name,yr,period,index_nsa,index_sa\nUtah,2020,1,,\nUtah,2020,2,,\n";
        let (pipeline, _) = pipeline_with(Some("Utah"), dataset).await;
        let rows = pipeline.extract().await.unwrap();

        let result = pipeline.transform(rows).await.unwrap();

        assert!(result.model.is_none());
        assert!(result.forecast.is_empty());
        assert_eq!(result.national.len(), 2);
        assert!(matches!(
            result.warnings.last(),
            Some(PipelineWarning::ForecastSkipped { .. })
        ));
    }

    #[tokio::test]
    async fn test_transform_empty_dataset_keeps_running() {
        let dataset = "place_name,yr,period,index_nsa,index_sa\n";
        let (pipeline, _) = pipeline_with(Some("Texas"), dataset).await;
        let rows = pipeline.extract().await.unwrap();

        let result = pipeline.transform(rows).await.unwrap();

        assert!(result.selection.is_none());
        assert!(result.region.is_empty());
        assert!(result.national.is_empty());
        assert!(result.forecast.is_empty());
        assert_eq!(result.warnings.len(), 1);
    }

    #[tokio::test]
    async fn test_transform_bad_period_aborts() {
        let dataset = "place_name,yr,period,index_nsa,index_sa\nTexas,2020,13,1.0,1.0\n";
        let (pipeline, _) = pipeline_with(Some("Texas"), dataset).await;
        let rows = pipeline.extract().await.unwrap();

        let err = pipeline.transform(rows).await.unwrap_err();
        assert!(matches!(err, ForecastError::DataFormatError { .. }));
    }

    #[tokio::test]
    async fn test_load_writes_report_and_model() {
        let (pipeline, sink) = pipeline_with(Some("Texas"), DATASET).await;
        let rows = pipeline.extract().await.unwrap();
        let result = pipeline.transform(rows).await.unwrap();

        let output = pipeline.load(&result).await.unwrap();

        assert_eq!(output.report_path, "test_output/housing_report.zip");
        assert_eq!(output.model_path.as_deref(), Some("test_output/trend_model.json"));
        assert!(sink.get_file("housing_report.zip").await.is_some());

        let model_bytes = sink.get_file("trend_model.json").await.unwrap();
        let model: TrendModel = serde_json::from_slice(&model_bytes).unwrap();
        assert_eq!(Some(model), result.model);
    }

    #[tokio::test]
    async fn test_load_without_model_skips_model_file() {
        let dataset = "place_name,yr,period,index_nsa,index_sa\nUtah,2020,1,,\n";
        let (pipeline, sink) = pipeline_with(None, dataset).await;
        let rows = pipeline.extract().await.unwrap();
        let result = pipeline.transform(rows).await.unwrap();

        let output = pipeline.load(&result).await.unwrap();

        assert!(output.model_path.is_none());
        assert!(sink.get_file("trend_model.json").await.is_none());
        assert!(sink.get_file("housing_report.zip").await.is_some());
    }

    #[tokio::test]
    async fn test_forecast_failure_keeps_series_and_report() {
        // 最後觀測月份接近 chrono 日期上限，無法再往後推算
        let year = chrono::NaiveDate::MAX.year();
        let dataset = format!(
            "place_name,yr,period,index_nsa,index_sa\nTexas,{0},11,100.0,100.0\nTexas,{0},12,102.0,102.0\n",
            year
        );
        let (pipeline, sink) = pipeline_with(Some("Texas"), &dataset).await;
        let rows = pipeline.extract().await.unwrap();

        let result = pipeline.transform(rows).await.unwrap();

        assert!(result.model.is_none());
        assert!(result.forecast.is_empty());
        assert_eq!(result.region.len(), 2);
        assert_eq!(result.national.len(), 2);
        assert_eq!(result.top_regions.len(), 1);
        match result.warnings.last() {
            Some(PipelineWarning::ForecastSkipped { region, reason }) => {
                assert_eq!(region, "Texas");
                assert!(reason.contains("cannot advance"));
            }
            other => panic!("unexpected warning: {:?}", other),
        }

        let output = pipeline.load(&result).await.unwrap();
        assert!(output.model_path.is_none());
        assert!(sink.get_file("housing_report.zip").await.is_some());
    }
}
