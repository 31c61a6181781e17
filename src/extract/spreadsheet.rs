//! XLSX / XLS adapter built on `calamine`.
//!
//! Worksheets are read in workbook order and rows in sheet order. Each row
//! becomes one line: its non-empty cells, stringified, joined with a single
//! space. Rows without any value are skipped. Formula cells yield the value
//! cached in the file, never the formula text.

use super::TextExtractor;
use crate::error::ExtractionError;
use calamine::{Data, DataType, Reader, Xls, Xlsx};
use std::fmt::Display;
use std::io::{Cursor, Read, Seek};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flavor {
    Xlsx,
    /// Legacy BIFF `.xls`.
    Xls,
}

pub struct SpreadsheetExtractor {
    flavor: Flavor,
}

impl SpreadsheetExtractor {
    pub fn xlsx() -> Self {
        Self {
            flavor: Flavor::Xlsx,
        }
    }

    pub fn xls() -> Self {
        Self {
            flavor: Flavor::Xls,
        }
    }

    fn error(&self, detail: String) -> ExtractionError {
        match self.flavor {
            Flavor::Xlsx => ExtractionError::Xlsx(detail),
            Flavor::Xls => ExtractionError::Xls(detail),
        }
    }
}

impl TextExtractor for SpreadsheetExtractor {
    fn name(&self) -> &'static str {
        match self.flavor {
            Flavor::Xlsx => "xlsx",
            Flavor::Xls => "xls",
        }
    }

    fn extract(&self, bytes: &[u8]) -> Result<String, ExtractionError> {
        let cursor = Cursor::new(bytes);
        let result = match self.flavor {
            Flavor::Xlsx => Xlsx::new(cursor)
                .map_err(|e| format!("cannot open workbook: {e}"))
                .and_then(flatten_workbook),
            Flavor::Xls => Xls::new(cursor)
                .map_err(|e| format!("cannot open workbook: {e}"))
                .and_then(flatten_workbook),
        };
        result.map_err(|detail| self.error(detail))
    }
}

fn flatten_workbook<RS, R>(mut workbook: R) -> Result<String, String>
where
    RS: Read + Seek,
    R: Reader<RS>,
    R::Error: Display,
{
    let mut lines = Vec::new();
    for name in workbook.sheet_names() {
        let range = workbook
            .worksheet_range(&name)
            .map_err(|e| format!("sheet '{name}': {e}"))?;
        for row in range.rows() {
            let line = row
                .iter()
                .filter_map(cell_text)
                .collect::<Vec<_>>()
                .join(" ");
            if !line.is_empty() {
                lines.push(line);
            }
        }
    }
    Ok(lines.join("\n"))
}

/// Text of a non-empty cell; empty strings count as empty. Whole floats print without a fraction (`2`, not
/// `2.0`); booleans print as `True` / `False`; dates as `YYYY-MM-DD HH:MM:SS`.
fn cell_text(cell: &Data) -> Option<String> {
    match cell {
        Data::Empty => None,
        Data::String(s) if s.is_empty() => None,
        Data::String(s) => Some(s.clone()),
        Data::Float(f) => Some(f.to_string()),
        Data::Int(i) => Some(i.to_string()),
        Data::Bool(b) => Some(if *b { "True" } else { "False" }.to_string()),
        Data::DateTime(_) => cell
            .as_datetime()
            .map(|dt| dt.to_string())
            .or_else(|| Some(cell.to_string())),
        other => Some(other.to_string()),
    }
}
