use crate::core::bundle::OcaBundle;
use crate::core::data_set::DataSet;
use crate::core::report::ValidationReport;
use crate::core::validator::{error_counts, ValidateOptions};
use crate::core::{ConfigProvider, Storage};
use crate::utils::error::Result;
use std::time::Instant;

pub struct ValidationEngine<S: Storage, C: ConfigProvider> {
    storage: S,
    config: C,
    options: ValidateOptions,
}

impl<S: Storage, C: ConfigProvider> ValidationEngine<S, C> {
    pub fn new(storage: S, config: C) -> Self {
        let options = ValidateOptions {
            show_data_preview: config.show_data_preview(),
            preview_rows: config.preview_rows(),
            enable_flagged_alarm: config.enable_flagged_alarm(),
            enable_version_alarm: config.enable_version_alarm(),
            oca_version: config.oca_version().to_string(),
            default_encoding: config.default_encoding().to_string(),
        };
        Self {
            storage,
            config,
            options,
        }
    }

    pub async fn run(&self) -> Result<ValidationReport> {
        let started = Instant::now();

        tracing::info!("Loading OCA bundle from {}", self.config.bundle_path());
        let bundle_bytes = self.storage.read_file(self.config.bundle_path()).await?;
        let bundle = OcaBundle::from_bytes(&bundle_bytes)?;
        tracing::info!("Bundle declares {} attribute(s)", bundle.attributes().len());

        tracing::info!("Loading data set from {}", self.config.data_set_path());
        let delimiter = DataSet::delimiter_for(self.config.data_set_path())?;
        let data_bytes = self.storage.read_file(self.config.data_set_path()).await?;
        let data_set = DataSet::from_bytes(&data_bytes, delimiter)?;
        tracing::info!(
            "Data set has {} row(s) and {} column(s)",
            data_set.len(),
            data_set.columns().len()
        );

        let report = bundle.validate(&data_set, &self.options)?;
        tracing::debug!("Format errors per attribute: {:?}", error_counts(&report.format_errors));
        tracing::debug!(
            "Entry code errors per attribute: {:?}",
            error_counts(&report.entry_code_errors)
        );

        if let Some(report_path) = self.config.report_path() {
            let json = serde_json::to_vec_pretty(&report)?;
            self.storage.write_file(report_path, &json).await?;
            tracing::info!("Report saved to: {}", report_path);
        }

        tracing::info!("Validation finished in {:?}", started.elapsed());
        Ok(report)
    }
}
