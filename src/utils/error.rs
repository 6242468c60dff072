use thiserror::Error;

#[derive(Error, Debug)]
pub enum OcaError {
    #[error("Zip operation failed: {0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("OCA bundle error: {message}")]
    BundleError { message: String },

    #[error("Not supported data set file type: {path}")]
    UnsupportedFileType { path: String },

    #[error("Invalid format pattern '{pattern}' for attribute '{attribute}': {source}")]
    InvalidPattern {
        attribute: String,
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

pub type Result<T> = std::result::Result<T, OcaError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Input,
    Bundle,
    Configuration,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl OcaError {
    pub fn bundle(message: impl Into<String>) -> Self {
        OcaError::BundleError {
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            OcaError::CsvError(_) | OcaError::UnsupportedFileType { .. } => ErrorCategory::Input,
            OcaError::ZipError(_)
            | OcaError::SerializationError(_)
            | OcaError::BundleError { .. }
            | OcaError::InvalidPattern { .. } => ErrorCategory::Bundle,
            OcaError::TomlError(_)
            | OcaError::ConfigError { .. }
            | OcaError::InvalidConfigValueError { .. }
            | OcaError::MissingConfigError { .. } => ErrorCategory::Configuration,
            OcaError::IoError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Configuration => ErrorSeverity::Medium,
            ErrorCategory::Input | ErrorCategory::Bundle => ErrorSeverity::High,
            ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    /// Process exit code for a failed run.
    pub fn exit_code(&self) -> i32 {
        match self.severity() {
            ErrorSeverity::Low => 0,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            OcaError::UnsupportedFileType { .. } => {
                "Use a .csv or .tsv data set. Excel data entry files must have the \"Schema conformant data\" sheet exported to CSV first."
            }
            OcaError::CsvError(_) => "Check that the data set has a header row and consistent quoting.",
            OcaError::ZipError(_) => "Check that the bundle archive is a complete OCA zip bundle containing meta.json.",
            OcaError::SerializationError(_) => "Check that the bundle is valid JSON.",
            OcaError::BundleError { .. } => {
                "Check that the bundle has a capture_base with attributes and an overlays object."
            }
            OcaError::InvalidPattern { .. } => "Fix the attribute format in the bundle's format overlay.",
            OcaError::TomlError(_) | OcaError::ConfigError { .. } => "Check the settings file syntax.",
            OcaError::InvalidConfigValueError { .. } | OcaError::MissingConfigError { .. } => {
                "Check the command line arguments and settings file values."
            }
            OcaError::IoError(_) => "Check that the files exist and are readable.",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            OcaError::IoError(e) => format!("Could not access a file: {}", e),
            OcaError::UnsupportedFileType { path } => {
                format!("The data set '{}' is not a supported file type", path)
            }
            other => other.to_string(),
        }
    }
}
