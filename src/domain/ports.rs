use crate::domain::model::{AnalysisResult, LoadOutput, RawObservation};
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn input_path(&self) -> &str;
    fn delimiter(&self) -> u8;
    fn region(&self) -> Option<&str>;
    fn output_path(&self) -> &str;
    fn top_regions(&self) -> usize;
    fn output_formats(&self) -> &[String];
    fn report_filename(&self) -> &str;
    fn model_filename(&self) -> &str;

    /// ZIP 壓縮方式，預設 deflated
    fn compression(&self) -> &str {
        "deflated"
    }
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<Vec<RawObservation>>;
    async fn transform(&self, data: Vec<RawObservation>) -> Result<AnalysisResult>;
    async fn load(&self, result: &AnalysisResult) -> Result<LoadOutput>;
}
