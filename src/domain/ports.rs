use crate::core::estimator::ReportMode;
use crate::domain::model::{GroupErrorPolicy, OutputFormat, Record, ReportFormat, TransformResult};
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
    fn output_path(&self) -> &str;
    fn report_format(&self) -> ReportFormat;
    fn weighed(&self) -> bool;
    /// `0` groups by sample id.
    fn group_size(&self) -> usize;
    fn plate_type(&self) -> Option<&str>;
    /// Empty means use the recorded dilutions.
    fn dilutions(&self) -> &[i32];
    fn significant_digits(&self) -> usize;
    fn report_mode(&self) -> ReportMode;
    fn output_format(&self) -> OutputFormat;
    fn on_group_error(&self) -> GroupErrorPolicy;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<Vec<Record>>;
    async fn transform(&self, data: Vec<Record>) -> Result<TransformResult>;
    async fn load(&self, result: TransformResult) -> Result<String>;
}
