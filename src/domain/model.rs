use serde::{Deserialize, Serialize};
use std::fmt;

/// OCA Technical Specification version the validator targets.
pub const OCA_VERSION: &str = "1.0";

/// Character encoding assumed when a bundle does not declare one.
pub const DEFAULT_ENCODING: &str = "utf-8";

/// Sets with more entries than this are summarized by count in overviews.
pub const ERR_THRESHOLD: usize = 5;

pub const ATTR_UNMATCH_MSG: &str = "Unmatched attribute (attribute not found in the OCA Bundle).";
pub const ATTR_MISSING_MSG: &str = "Missing attribute (attribute not found in the data set).";
pub const MISSING_MSG: &str = "Missing mandatory attribute.";
pub const NOT_A_LIST_MSG: &str = "Valid array required.";
pub const FORMAT_ERR_MSG: &str = "Format mismatch.";
pub const EC_FORMAT_ERR_MSG: &str = " Entry code format mismatch (manually fix the attribute format).";
pub const EC_ERR_MSG: &str = "One of the entry codes required.";
pub const CHE_ERR_MSG: &str = "Character encoding mismatch.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BaseType {
    Text,
    Numeric,
    DateTime,
    Boolean,
    Other(String),
}

/// Attribute type as declared in a capture base, e.g. `Numeric` or `Array[DateTime]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeType {
    pub base: BaseType,
    pub array: bool,
}

impl AttributeType {
    pub fn parse(type_str: &str) -> Self {
        let base = if type_str.contains("DateTime") {
            BaseType::DateTime
        } else if type_str.contains("Numeric") {
            BaseType::Numeric
        } else if type_str.contains("Text") {
            BaseType::Text
        } else if type_str.contains("Boolean") {
            BaseType::Boolean
        } else {
            BaseType::Other(type_str.to_string())
        };

        Self {
            base,
            array: type_str.contains("Array"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    pub name: String,
    pub attr_type: AttributeType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeIssue {
    /// Present in the bundle, absent from the data set.
    Missing,
    /// Present in the data set, absent from the bundle.
    Unmatched,
}

impl AttributeIssue {
    pub fn message(self) -> &'static str {
        match self {
            AttributeIssue::Missing => ATTR_MISSING_MSG,
            AttributeIssue::Unmatched => ATTR_UNMATCH_MSG,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeError {
    pub attribute: String,
    pub issue: AttributeIssue,
}

impl fmt::Display for AttributeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.attribute, self.issue.message())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BundleWarning {
    FlaggedAttribute { attribute: String },
    VersionMismatch { overlay: String, version: String },
}

impl fmt::Display for BundleWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BundleWarning::FlaggedAttribute { attribute } => {
                write!(f, "Contains flagged data. Please check attribute {}", attribute)
            }
            BundleWarning::VersionMismatch { overlay, version } => write!(
                f,
                "Overlay {} has a different OCA specification version ({}).",
                overlay, version
            ),
        }
    }
}
