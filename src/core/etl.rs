use crate::core::Pipeline;
use crate::utils::error::Result;

pub struct EtlEngine<P: Pipeline> {
    pipeline: P,
}

/// What one run produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub output_path: String,
    pub plates: usize,
    pub groups: usize,
    pub failed_groups: usize,
}

impl<P: Pipeline> EtlEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self { pipeline }
    }

    pub async fn run(&self) -> Result<RunSummary> {
        tracing::info!("Starting CFU calculation...");

        // Extract
        let plates = self.pipeline.extract().await?;
        tracing::info!("Read {} plates", plates.len());
        let plate_count = plates.len();

        // Transform
        let result = self.pipeline.transform(plates).await?;
        tracing::info!(
            "Calculated {} plate groups ({} failed)",
            result.rows.len(),
            result.failed_groups
        );
        let groups = result.rows.len();
        let failed_groups = result.failed_groups;

        // Load
        let output_path = self.pipeline.load(result).await?;
        tracing::info!("Results saved to: {}", output_path);

        Ok(RunSummary {
            output_path,
            plates: plate_count,
            groups,
            failed_groups,
        })
    }
}
