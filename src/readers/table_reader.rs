use crate::error::{ProcessingError, Result};
use crate::models::Table;
use calamine::{open_workbook_auto, Reader};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableFormat {
    Delimited(u8),
    Spreadsheet,
}

impl TableFormat {
    /// Pick a format from the file extension; unknown extensions read as CSV
    pub fn detect(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
            .unwrap_or_default();

        match ext.as_str() {
            "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => TableFormat::Spreadsheet,
            "tsv" | "tab" => TableFormat::Delimited(b'\t'),
            _ => TableFormat::Delimited(b','),
        }
    }
}

/// Reads delimited text or the first worksheet of a spreadsheet into a [`Table`]
pub struct TableReader {
    format: Option<TableFormat>,
}

impl TableReader {
    pub fn new() -> Self {
        Self { format: None }
    }

    pub fn with_format(format: TableFormat) -> Self {
        Self {
            format: Some(format),
        }
    }

    pub fn read(&self, path: &Path) -> Result<Table> {
        let format = self.format.unwrap_or_else(|| TableFormat::detect(path));

        match format {
            TableFormat::Delimited(delimiter) => self.read_delimited(path, delimiter),
            TableFormat::Spreadsheet => self.read_spreadsheet(path),
        }
    }

    fn read_delimited(&self, path: &Path, delimiter: u8) -> Result<Table> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .flexible(true)
            .has_headers(true)
            .from_path(path)?;

        let headers: Vec<String> = reader
            .headers()?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            rows.push(record.iter().map(|cell| cell.to_string()).collect());
        }

        Ok(Table::with_rows(headers, rows))
    }

    fn read_spreadsheet(&self, path: &Path) -> Result<Table> {
        let mut workbook = open_workbook_auto(path)?;
        let range = workbook.worksheet_range_at(0).ok_or_else(|| {
            ProcessingError::MissingData(format!("{} has no worksheets", path.display()))
        })??;

        let mut rows = range
            .rows()
            .map(|row| row.iter().map(|cell| cell.to_string()).collect::<Vec<String>>());

        let headers: Vec<String> = match rows.next() {
            Some(header) => header.iter().map(|h| h.trim().to_string()).collect(),
            None => Vec::new(),
        };

        Ok(Table::with_rows(headers, rows.collect()))
    }
}

impl Default for TableReader {
    fn default() -> Self {
        Self::new()
    }
}
