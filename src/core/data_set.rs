use crate::utils::error::{OcaError, Result};
use crate::utils::validation::file_extension;
use csv::{ByteRecord, ReaderBuilder};
use std::io::Read;
use std::path::Path;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// A tabular data set to be validated against an OCA bundle.
///
/// Cells are kept as raw bytes so the character encoding overlay can be
/// checked against what is actually stored in the file.
#[derive(Debug, Clone, Default)]
pub struct DataSet {
    columns: Vec<String>,
    rows: Vec<ByteRecord>,
}

impl DataSet {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let delimiter = Self::delimiter_for(&path.to_string_lossy())?;
        let file = std::fs::File::open(path)?;
        Self::from_reader(file, delimiter)
    }

    /// Picks the field delimiter from the file extension.
    pub fn delimiter_for(path: &str) -> Result<u8> {
        match file_extension(path).as_deref() {
            Some("csv") => Ok(b','),
            Some("tsv") => Ok(b'\t'),
            _ => Err(OcaError::UnsupportedFileType {
                path: path.to_string(),
            }),
        }
    }

    pub fn from_bytes(data: &[u8], delimiter: u8) -> Result<Self> {
        Self::from_reader(data, delimiter)
    }

    pub fn from_reader<R: Read>(reader: R, delimiter: u8) -> Result<Self> {
        let mut reader = ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let columns = reader
            .byte_headers()?
            .iter()
            .enumerate()
            .map(|(i, header)| {
                let header = if i == 0 {
                    header.strip_prefix(UTF8_BOM).unwrap_or(header)
                } else {
                    header
                };
                String::from_utf8_lossy(header).into_owned()
            })
            .collect::<Vec<_>>();

        let mut rows = Vec::new();
        for record in reader.byte_records() {
            rows.push(record?);
        }

        tracing::debug!("Loaded data set with {} columns and {} rows", columns.len(), rows.len());
        Ok(Self { columns, rows })
    }

    /// Builds a data set from in-memory text, one inner vector per row.
    pub fn from_rows<S: AsRef<str>>(columns: &[S], rows: &[Vec<S>]) -> Self {
        Self {
            columns: columns.iter().map(|c| c.as_ref().to_string()).collect(),
            rows: rows
                .iter()
                .map(|row| row.iter().map(|cell| cell.as_ref().as_bytes()).collect())
                .collect(),
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// Raw bytes of a cell, `None` when the cell is empty or the row is short.
    pub fn cell(&self, row: usize, column: usize) -> Option<&[u8]> {
        self.rows
            .get(row)
            .and_then(|record| record.get(column))
            .filter(|bytes| !bytes.is_empty())
    }

    /// Cell decoded as text (invalid UTF-8 is replaced).
    pub fn cell_str(&self, row: usize, column: usize) -> Option<String> {
        self.cell(row, column)
            .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
    }

    /// Renders the first `max_rows` rows as an aligned text table.
    pub fn preview(&self, max_rows: usize) -> String {
        let shown: Vec<Vec<String>> = (0..self.rows.len().min(max_rows))
            .map(|row| {
                (0..self.columns.len())
                    .map(|col| self.cell_str(row, col).unwrap_or_else(|| "NaN".to_string()))
                    .collect()
            })
            .collect();

        let row_label_width = shown.len().saturating_sub(1).to_string().len();
        let widths: Vec<usize> = self
            .columns
            .iter()
            .enumerate()
            .map(|(col, name)| {
                shown
                    .iter()
                    .map(|row| row[col].chars().count())
                    .chain(std::iter::once(name.chars().count()))
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        let mut out = String::new();
        out.push_str(&" ".repeat(row_label_width));
        for (name, width) in self.columns.iter().zip(&widths) {
            out.push_str(&format!("  {:>width$}", name, width = *width));
        }
        out.push('\n');
        for (i, row) in shown.iter().enumerate() {
            out.push_str(&format!("{:<width$}", i, width = row_label_width));
            for (cell, width) in row.iter().zip(&widths) {
                out.push_str(&format!("  {:>width$}", cell, width = *width));
            }
            out.push('\n');
        }
        if self.rows.len() > max_rows {
            out.push_str(&format!("... {} more row(s)\n", self.rows.len() - max_rows));
        }
        out.push_str(&format!("[{} rows x {} columns]", self.rows.len(), self.columns.len()));
        out
    }
}
