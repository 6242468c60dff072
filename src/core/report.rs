use crate::domain::model::{AttributeError, AttributeIssue, BundleWarning};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write;

/// Exit code of a run whose data set does not conform to the bundle.
pub const EXIT_INVALID_DATA_SET: i32 = 4;

/// Row-level errors of one validation: attribute name -> row index -> message.
pub type ErrorTable = BTreeMap<String, BTreeMap<usize, String>>;

/// Result set of validating a data set against an OCA bundle.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub attribute_errors: Vec<AttributeError>,
    pub format_errors: ErrorTable,
    pub entry_code_errors: ErrorTable,
    pub encoding_errors: ErrorTable,
    pub warnings: Vec<BundleWarning>,
    pub rows_checked: usize,
    pub validated_at: Option<String>,
}

/// `'a', 'b'`: the quoting used for attribute sets and entry code lists in messages.
pub(crate) fn quoted_list<I, T>(items: I) -> String
where
    I: IntoIterator<Item = T>,
    T: AsRef<str>,
{
    items
        .into_iter()
        .map(|item| format!("'{}'", item.as_ref()))
        .collect::<Vec<_>>()
        .join(", ")
}

fn describe_set(set: &BTreeSet<String>, threshold: usize) -> String {
    if set.len() > threshold {
        format!("{} attributes", set.len())
    } else {
        format!("{{{}}}", quoted_list(set))
    }
}

impl ValidationReport {
    fn attributes_with(&self, issue: AttributeIssue) -> BTreeSet<String> {
        self.attribute_errors
            .iter()
            .filter(|err| err.issue == issue)
            .map(|err| err.attribute.clone())
            .collect()
    }

    /// Found in the bundle but not in the data set.
    pub fn missing_attributes(&self) -> BTreeSet<String> {
        self.attributes_with(AttributeIssue::Missing)
    }

    /// Found in the data set but not in the bundle.
    pub fn unmatched_attributes(&self) -> BTreeSet<String> {
        self.attributes_with(AttributeIssue::Unmatched)
    }

    fn row_tables(&self) -> [&ErrorTable; 3] {
        [&self.format_errors, &self.entry_code_errors, &self.encoding_errors]
    }

    pub fn error_columns(&self) -> BTreeSet<String> {
        self.row_tables()
            .into_iter()
            .flat_map(|table| table.iter())
            .filter(|(_, rows)| !rows.is_empty())
            .map(|(attr, _)| attr.clone())
            .collect()
    }

    pub fn error_rows(&self) -> BTreeSet<usize> {
        self.row_tables()
            .into_iter()
            .flat_map(|table| table.values())
            .flat_map(|rows| rows.keys().copied())
            .collect()
    }

    pub fn error_count(&self) -> usize {
        self.attribute_errors.len()
            + self
                .row_tables()
                .into_iter()
                .flat_map(|table| table.values())
                .map(BTreeMap::len)
                .sum::<usize>()
    }

    pub fn is_valid(&self) -> bool {
        self.error_count() == 0
    }

    /// 0 when the data set conforms, [`EXIT_INVALID_DATA_SET`] otherwise.
    pub fn exit_code(&self) -> i32 {
        if self.is_valid() {
            0
        } else {
            EXIT_INVALID_DATA_SET
        }
    }

    /// Short summary. Sets larger than `threshold` are shown as a count.
    pub fn overview(&self, threshold: usize) -> String {
        let error_columns = self.error_columns();
        let error_rows = self.error_rows();
        let mut out = String::new();

        if self.attribute_errors.is_empty() && error_columns.is_empty() && error_rows.is_empty() {
            return "No error was found.".to_string();
        }

        if !self.attribute_errors.is_empty() {
            let _ = writeln!(
                out,
                "Attribute error found. {} found in the OCA Bundle but not in the data set; {} found in the data set but not in the OCA Bundle.",
                describe_set(&self.missing_attributes(), threshold),
                describe_set(&self.unmatched_attributes(), threshold),
            );
        }

        if !error_columns.is_empty() || !error_rows.is_empty() {
            let columns = if error_columns.len() > threshold {
                format!("{} attributes", error_columns.len())
            } else {
                format!("the following attribute(s): {}", describe_set(&error_columns, threshold))
            };
            let _ = writeln!(out, "Found {} problematic row(s) in {}", error_rows.len(), columns);
        }

        out.trim_end().to_string()
    }

    /// Row-by-row format and entry code errors of one attribute.
    pub fn column_detail(&self, attribute: &str) -> String {
        if self.error_columns().is_empty() {
            return "No error was found.".to_string();
        }

        let mut out = String::new();
        match self.format_errors.get(attribute).filter(|rows| !rows.is_empty()) {
            Some(rows) => {
                let _ = writeln!(out, "Format error(s) would occur in the following row(s):");
                for (row, message) in rows {
                    let _ = writeln!(out, "row {} : {}", row, message);
                }
            }
            None => {
                let _ = writeln!(out, "No format error found in the column.");
            }
        }

        if let Some(rows) = self.entry_code_errors.get(attribute).filter(|rows| !rows.is_empty()) {
            let _ = writeln!(out, "Entry code error(s) would occur in the following rows:");
            for (row, message) in rows {
                let _ = writeln!(out, "row {} : {}", row, message);
            }
        }

        if let Some(rows) = self.encoding_errors.get(attribute).filter(|rows| !rows.is_empty()) {
            let _ = writeln!(out, "Character encoding error(s) would occur in the following rows:");
            for (row, message) in rows {
                let _ = writeln!(out, "row {} : {}", row, message);
            }
        }

        out.trim_end().to_string()
    }

    /// Detail of the alphabetically first column with errors.
    pub fn first_error_column(&self) -> String {
        match self.error_columns().into_iter().next() {
            Some(first) => format!(
                "The first problematic column is: {}\n{}",
                first,
                self.column_detail(&first)
            ),
            None => "No error was found.".to_string(),
        }
    }
}
