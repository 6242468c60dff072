use crate::core::ConfigProvider;
use crate::domain::model::{DEFAULT_ENCODING, ERR_THRESHOLD, OCA_VERSION};
use crate::utils::error::Result;
use crate::utils::validation::{validate_file_extension, validate_path, validate_range, Validate};
use clap::Parser;
use serde::{Deserialize, Serialize};
use super::toml_config::ValidatorSettings;

const DEFAULT_PREVIEW_ROWS: usize = 10;

#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(name = "oca-ds-validator")]
#[command(about = "Validate a CSV/TSV data set against an OCA bundle", version)]
pub struct CliConfig {
    /// OCA bundle (.json, or legacy .zip with meta.json)
    pub bundle: String,

    /// Data set to validate (.csv or .tsv)
    pub data_set: String,

    /// TOML settings file
    #[arg(short, long)]
    pub config: Option<String>,

    /// Write the full report as JSON to this path
    #[arg(short, long)]
    pub report: Option<String>,

    #[arg(long, help = "Log a preview of the data set before validating")]
    pub preview: bool,

    #[arg(long)]
    pub preview_rows: Option<usize>,

    #[arg(long, help = "Do not warn about flagged attributes")]
    pub no_flagged_alarm: bool,

    #[arg(long, help = "Do not warn about overlays of another OCA version")]
    pub no_version_alarm: bool,

    /// Print the errors of the first problematic column
    #[arg(long)]
    pub first_error: bool,

    /// Print the errors of one column
    #[arg(long)]
    pub column: Option<String>,

    /// Summarize sets larger than this by their size
    #[arg(long)]
    pub threshold: Option<usize>,

    /// Expected OCA specification version of the overlays
    #[arg(long)]
    pub oca_version: Option<String>,

    /// Encoding assumed for attributes the bundle declares none for
    #[arg(long)]
    pub default_encoding: Option<String>,

    #[arg(long, help = "Emit logs as JSON lines")]
    pub json_log: bool,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,
}

impl CliConfig {
    /// Fills options not given on the command line from a settings file.
    pub fn apply_settings(&mut self, settings: &ValidatorSettings) {
        if self.report.is_none() {
            self.report = settings.output.report_path.clone();
        }
        if self.preview_rows.is_none() {
            self.preview_rows = Some(settings.output.preview_rows);
        }
        if self.threshold.is_none() {
            self.threshold = Some(settings.validation.error_threshold);
        }
        if self.oca_version.is_none() {
            self.oca_version = Some(settings.validation.oca_version.clone());
        }
        if self.default_encoding.is_none() {
            self.default_encoding = Some(settings.validation.default_encoding.clone());
        }
        self.preview |= settings.output.preview;
        self.no_flagged_alarm |= !settings.alarms.flagged;
        self.no_version_alarm |= !settings.alarms.version;
    }
}

impl ConfigProvider for CliConfig {
    fn bundle_path(&self) -> &str {
        &self.bundle
    }

    fn data_set_path(&self) -> &str {
        &self.data_set
    }

    fn report_path(&self) -> Option<&str> {
        self.report.as_deref()
    }

    fn error_threshold(&self) -> usize {
        self.threshold.unwrap_or(ERR_THRESHOLD)
    }

    fn show_data_preview(&self) -> bool {
        self.preview
    }

    fn preview_rows(&self) -> usize {
        self.preview_rows.unwrap_or(DEFAULT_PREVIEW_ROWS)
    }

    fn oca_version(&self) -> &str {
        self.oca_version.as_deref().unwrap_or(OCA_VERSION)
    }

    fn default_encoding(&self) -> &str {
        self.default_encoding.as_deref().unwrap_or(DEFAULT_ENCODING)
    }

    fn enable_flagged_alarm(&self) -> bool {
        !self.no_flagged_alarm
    }

    fn enable_version_alarm(&self) -> bool {
        !self.no_version_alarm
    }
}

impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validate_path("bundle", &self.bundle)?;
        validate_file_extension("bundle", &self.bundle, &["json", "zip"])?;
        validate_path("data_set", &self.data_set)?;
        if let Some(report) = &self.report {
            validate_path("report", report)?;
        }
        validate_range("preview_rows", self.preview_rows(), 1, 10_000)?;
        Ok(())
    }
}
