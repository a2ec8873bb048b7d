use crate::core::estimator::DilutionEstimator;
use crate::core::grouping::{build_reading_group, effective_group_size, group_records};
use crate::core::reader::{read_manual_sheet, read_reader_report};
use crate::core::{ConfigProvider, Pipeline, Record, Storage, TransformResult};
use crate::domain::model::{GroupErrorPolicy, OutputFormat, ReportFormat, ResultRow};
use crate::utils::error::Result;

pub struct ReportPipeline<S: Storage, C: ConfigProvider> {
    storage: S,
    config: C,
}

impl<S: Storage, C: ConfigProvider> ReportPipeline<S, C> {
    pub fn new(storage: S, config: C) -> Self {
        Self { storage, config }
    }

    fn calculate_group(&self, estimator: &DilutionEstimator, records: &[Record]) -> Result<String> {
        let group = build_reading_group(records, self.config.weighed(), self.config.dilutions())?;
        let estimate = estimator.calculate(&group, self.config.report_mode())?;
        Ok(estimate.to_string())
    }
}

fn join<T: ToString>(items: impl Iterator<Item = T>) -> String {
    items.map(|item| item.to_string()).collect::<Vec<_>>().join(", ")
}

fn render(rows: &[ResultRow], format: OutputFormat) -> Result<Vec<u8>> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_vec_pretty(rows)?),
        OutputFormat::Csv | OutputFormat::Tsv => {
            let delimiter = if format == OutputFormat::Tsv { b'\t' } else { b',' };
            let mut writer = csv::WriterBuilder::new()
                .delimiter(delimiter)
                .from_writer(Vec::new());
            for row in rows {
                writer.serialize(row)?;
            }
            writer
                .into_inner()
                .map_err(|e| std::io::Error::other(e.to_string()).into())
        }
    }
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider> Pipeline for ReportPipeline<S, C> {
    async fn extract(&self) -> Result<Vec<Record>> {
        tracing::debug!("Reading plate report from: {}", self.config.input_path());
        let data = self.storage.read_file(self.config.input_path()).await?;

        match self.config.report_format() {
            ReportFormat::Reader => read_reader_report(&data, self.config.plate_type()),
            ReportFormat::Manual => read_manual_sheet(&data),
        }
    }

    async fn transform(&self, data: Vec<Record>) -> Result<TransformResult> {
        let estimator = DilutionEstimator::new(self.config.significant_digits());
        let size = effective_group_size(self.config.report_format(), self.config.group_size());
        let groups = group_records(data, size);
        tracing::debug!("Calculating {} plate groups", groups.len());

        let mut result = TransformResult::default();
        for records in groups {
            let counts = join(records.iter().map(|r| r.count));
            let plates = join(records.iter().map(|r| r.sample_id.as_str()));
            let date = records
                .iter()
                .filter_map(|r| r.recorded_at)
                .min()
                .map(|t| t.date().to_string())
                .unwrap_or_default();

            let (cfu, error) = match self.calculate_group(&estimator, &records) {
                Ok(cfu) => (cfu, String::new()),
                Err(e) => match self.config.on_group_error() {
                    GroupErrorPolicy::Abort => return Err(e),
                    GroupErrorPolicy::Skip => {
                        tracing::warn!("Skipping plates [{}]: {}", plates, e);
                        result.failed_groups += 1;
                        (String::new(), e.to_string())
                    }
                },
            };

            result.rows.push(ResultRow {
                cfu,
                counts,
                plates,
                date,
                error,
            });
        }

        Ok(result)
    }

    async fn load(&self, result: TransformResult) -> Result<String> {
        let output_path = self.config.output_path().to_string();
        let data = render(&result.rows, self.config.output_format())?;

        tracing::debug!(
            "Writing {} result rows ({} bytes) to {}",
            result.rows.len(),
            data.len(),
            output_path
        );
        self.storage.write_file(&output_path, &data).await?;

        Ok(output_path)
    }
}
