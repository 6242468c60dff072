use crate::core::bundle::{json_to_text, OcaBundle};
use crate::core::data_set::DataSet;
use crate::core::matchers::{match_character_encoding, FormatMatcher};
use crate::core::report::{quoted_list, ErrorTable, ValidationReport};
use crate::domain::model::{
    AttributeError, AttributeIssue, BundleWarning, CHE_ERR_MSG, EC_ERR_MSG, EC_FORMAT_ERR_MSG,
    DEFAULT_ENCODING, FORMAT_ERR_MSG, MISSING_MSG, NOT_A_LIST_MSG, OCA_VERSION,
};
use crate::utils::error::{OcaError, Result};
use serde_json::Value;
use std::collections::BTreeMap;

/// Shown in format messages when the bundle has no format rule for the attribute.
const NO_FORMAT: &str = "None";

#[derive(Debug, Clone)]
pub struct ValidateOptions {
    pub show_data_preview: bool,
    pub preview_rows: usize,
    pub enable_flagged_alarm: bool,
    pub enable_version_alarm: bool,
    pub oca_version: String,
    /// Encoding of attributes the bundle declares none for.
    pub default_encoding: String,
}

impl Default for ValidateOptions {
    fn default() -> Self {
        Self {
            show_data_preview: false,
            preview_rows: 10,
            enable_flagged_alarm: true,
            enable_version_alarm: true,
            oca_version: OCA_VERSION.to_string(),
            default_encoding: DEFAULT_ENCODING.to_string(),
        }
    }
}

impl OcaBundle {
    /// Unmatched data set columns first (data set order), then missing bundle attributes.
    pub fn validate_attribute(&self, data_set: &DataSet) -> Vec<AttributeError> {
        let unmatched = data_set
            .columns()
            .iter()
            .filter(|column| !self.has_attribute(column))
            .map(|column| AttributeError {
                attribute: column.clone(),
                issue: AttributeIssue::Unmatched,
            });
        let missing = self
            .attributes()
            .iter()
            .filter(|attr| !data_set.has_column(&attr.name))
            .map(|attr| AttributeError {
                attribute: attr.name.clone(),
                issue: AttributeIssue::Missing,
            });
        unmatched.chain(missing).collect()
    }

    /// Checks every cell against its attribute's type and format, and flags empty
    /// cells of mandatory attributes.
    pub fn validate_format(&self, data_set: &DataSet) -> Result<ErrorTable> {
        let mut errors = ErrorTable::new();

        for attr in self.attributes() {
            let rows = errors.entry(attr.name.clone()).or_default();
            let Some(column) = data_set.column_index(&attr.name) else {
                continue;
            };

            let pattern = self.attribute_format(&attr.name);
            let matcher = FormatMatcher::new(&attr.attr_type, pattern).map_err(|source| {
                OcaError::InvalidPattern {
                    attribute: attr.name.clone(),
                    pattern: pattern.unwrap_or_default().to_string(),
                    source,
                }
            })?;
            let pattern = pattern.unwrap_or(NO_FORMAT);
            let mandatory = self.is_mandatory(&attr.name);
            let has_entry_codes = self.has_entry_codes(&attr.name);

            for row in 0..data_set.len() {
                let Some(entry) = data_set.cell_str(row, column) else {
                    if mandatory {
                        rows.insert(row, MISSING_MSG.to_string());
                    }
                    continue;
                };

                if attr.attr_type.array {
                    if let Some(message) = check_array(&matcher, pattern, &entry) {
                        rows.insert(row, message);
                    }
                } else if !matcher.matches(&entry) {
                    let message = if has_entry_codes {
                        format!("{} Supported format for entry code is: {}.", EC_FORMAT_ERR_MSG, pattern)
                    } else {
                        format!("{} Supported format: {}.", FORMAT_ERR_MSG, pattern)
                    };
                    rows.insert(row, message);
                }
            }

            tracing::debug!("Format check of {}: {} error(s)", attr.name, rows.len());
        }

        Ok(errors)
    }

    /// Every non-empty cell of an attribute with entry codes must be one of the codes.
    pub fn validate_entry_code(&self, data_set: &DataSet) -> ErrorTable {
        let mut errors = ErrorTable::new();

        for (attr, codes) in self.entry_codes() {
            let rows = errors.entry(attr.clone()).or_default();
            let Some(column) = data_set.column_index(attr) else {
                continue;
            };
            for row in 0..data_set.len() {
                let Some(entry) = data_set.cell_str(row, column) else {
                    continue;
                };
                if !codes.contains(&entry) {
                    rows.insert(
                        row,
                        format!("{} Entry codes allowed: [{}].", EC_ERR_MSG, quoted_list(codes)),
                    );
                }
            }
        }

        errors
    }

    /// Every non-empty cell must be valid in its attribute's declared character encoding.
    pub fn validate_encoding(&self, data_set: &DataSet, default_encoding: &str) -> ErrorTable {
        let mut errors = ErrorTable::new();

        for attr in self.attributes() {
            let rows = errors.entry(attr.name.clone()).or_default();
            let Some(column) = data_set.column_index(&attr.name) else {
                continue;
            };
            let encoding = self.character_encoding_or(&attr.name, default_encoding);
            for row in 0..data_set.len() {
                let Some(entry) = data_set.cell(row, column) else {
                    continue;
                };
                if !match_character_encoding(entry, &encoding) {
                    rows.insert(
                        row,
                        format!("{} Supported character encoding: {}.", CHE_ERR_MSG, encoding),
                    );
                }
            }
        }

        errors
    }

    pub fn flagged_warnings(&self) -> Vec<BundleWarning> {
        self.flagged_attributes()
            .into_iter()
            .map(|attribute| BundleWarning::FlaggedAttribute { attribute })
            .collect()
    }

    /// Overlays whose `type` carries a version other than `expected`.
    pub fn version_warnings(&self, expected: &str) -> Vec<BundleWarning> {
        self.overlay_names()
            .into_iter()
            .filter_map(|overlay| {
                let version = self.overlay_version(overlay)?;
                (version != expected).then(|| BundleWarning::VersionMismatch {
                    overlay: overlay.to_string(),
                    version,
                })
            })
            .collect()
    }

    /// Runs every validation and collects the results in one report.
    pub fn validate(&self, data_set: &DataSet, options: &ValidateOptions) -> Result<ValidationReport> {
        if options.show_data_preview {
            tracing::info!("Data set preview:\n{}", data_set.preview(options.preview_rows));
        }

        let mut warnings = Vec::new();
        if options.enable_flagged_alarm {
            warnings.extend(self.flagged_warnings());
        }
        if options.enable_version_alarm {
            warnings.extend(self.version_warnings(&options.oca_version));
        }
        for warning in &warnings {
            tracing::warn!("{}", warning);
        }

        let report = ValidationReport {
            attribute_errors: self.validate_attribute(data_set),
            format_errors: self.validate_format(data_set)?,
            entry_code_errors: self.validate_entry_code(data_set),
            encoding_errors: self.validate_encoding(data_set, &options.default_encoding),
            warnings,
            rows_checked: data_set.len(),
            validated_at: Some(chrono::Utc::now().to_rfc3339()),
        };

        tracing::info!(
            "Validated {} row(s): {} error(s) in {} column(s)",
            report.rows_checked,
            report.error_count(),
            report.error_columns().len()
        );
        Ok(report)
    }
}

/// An array cell must be a JSON array whose items all match the format.
fn check_array(matcher: &FormatMatcher, pattern: &str, entry: &str) -> Option<String> {
    let items = match serde_json::from_str::<Value>(entry) {
        Ok(Value::Array(items)) => items,
        _ => return Some(NOT_A_LIST_MSG.to_string()),
    };
    items
        .iter()
        .map(json_to_text)
        .any(|item| !matcher.matches(&item))
        .then(|| format!("{} Supported format: {}.", FORMAT_ERR_MSG, pattern))
}

/// Attribute names mapped to their row errors, for callers that only need counts.
pub fn error_counts(table: &ErrorTable) -> BTreeMap<&str, usize> {
    table
        .iter()
        .map(|(attr, rows)| (attr.as_str(), rows.len()))
        .collect()
}
