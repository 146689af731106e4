use crate::core::{AnalysisResult, LoadOutput, Pipeline};
use crate::utils::error::Result;
use crate::utils::monitor::SystemMonitor;

/// Result of a complete run: the in-memory analysis plus the written files.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub result: AnalysisResult,
    pub output: LoadOutput,
}

pub struct AnalysisEngine<P: Pipeline> {
    pipeline: P,
    monitor: SystemMonitor,
}

impl<P: Pipeline> AnalysisEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self::new_with_monitoring(pipeline, false)
    }

    pub fn new_with_monitoring(pipeline: P, monitor_enabled: bool) -> Self {
        Self {
            pipeline,
            monitor: SystemMonitor::new(monitor_enabled),
        }
    }

    pub async fn run(&self) -> Result<RunOutcome> {
        tracing::info!("Starting housing price analysis...");
        self.monitor.log_stats("Start");

        // Extract
        tracing::info!("📥 Loading dataset...");
        let raw_data = self.pipeline.extract().await?;
        tracing::info!("Loaded {} rows", raw_data.len());
        self.monitor.log_stats("Extract");

        // Transform
        tracing::info!("🔄 Cleaning, aggregating and fitting trend...");
        let result = self.pipeline.transform(raw_data).await?;
        tracing::info!(
            "National series: {} dates, region series: {} points, forecast: {} points",
            result.national.len(),
            result.region.len(),
            result.forecast.len()
        );
        self.monitor.log_stats("Transform");

        // Load
        tracing::info!("💾 Writing report...");
        let output = self.pipeline.load(&result).await?;
        tracing::info!("Report saved to: {}", output.report_path);
        self.monitor.log_stats("Load");
        self.monitor.log_final_stats();

        Ok(RunOutcome { result, output })
    }

    pub fn monitoring_enabled(&self) -> bool {
        self.monitor.is_enabled()
    }
}
