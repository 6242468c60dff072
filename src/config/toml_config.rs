use crate::domain::model::{DEFAULT_ENCODING, ERR_THRESHOLD, OCA_VERSION};
use crate::utils::error::{OcaError, Result};
use crate::utils::validation::{validate_non_empty_string, validate_path, validate_range, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Settings file for the validator. Every section is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidatorSettings {
    pub validation: ValidationSettings,
    pub alarms: AlarmSettings,
    pub output: OutputSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationSettings {
    pub oca_version: String,
    pub error_threshold: usize,
    /// Encoding assumed for attributes the bundle declares none for
    pub default_encoding: String,
}

impl Default for ValidationSettings {
    fn default() -> Self {
        Self {
            oca_version: OCA_VERSION.to_string(),
            error_threshold: ERR_THRESHOLD,
            default_encoding: DEFAULT_ENCODING.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AlarmSettings {
    pub flagged: bool,
    pub version: bool,
}

impl Default for AlarmSettings {
    fn default() -> Self {
        Self {
            flagged: true,
            version: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSettings {
    pub report_path: Option<String>,
    pub preview: bool,
    pub preview_rows: usize,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            report_path: None,
            preview: false,
            preview_rows: 10,
        }
    }
}

impl ValidatorSettings {
    /// 從 TOML 檔案載入設定
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;
        Ok(toml::from_str(&processed_content)?)
    }

    /// Replaces `${VAR_NAME}` with the environment value; unknown variables are left as is.
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| OcaError::ConfigError {
            message: format!("environment variable pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }
}

impl Validate for ValidatorSettings {
    fn validate(&self) -> Result<()> {
        validate_non_empty_string("validation.oca_version", &self.validation.oca_version)?;
        validate_non_empty_string("validation.default_encoding", &self.validation.default_encoding)?;
        validate_range("output.preview_rows", self.output.preview_rows, 1, 10_000)?;
        if let Some(report_path) = &self.output.report_path {
            validate_path("output.report_path", report_path)?;
        }
        Ok(())
    }
}
