//! Plain-text and CSV adapters.

use super::TextExtractor;
use crate::error::ExtractionError;

/// `.txt`: the bytes must be valid UTF-8 and are returned verbatim.
pub struct PlainTextExtractor;

impl TextExtractor for PlainTextExtractor {
    fn name(&self) -> &'static str {
        "txt"
    }

    fn extract(&self, bytes: &[u8]) -> Result<String, ExtractionError> {
        std::str::from_utf8(bytes)
            .map(str::to_owned)
            .map_err(|e| ExtractionError::Txt(format!("not valid UTF-8: {e}")))
    }
}

/// `.csv`: comma-delimited rows flattened to one line per row.
///
/// Within a row, cells that are empty or whitespace-only are dropped and the
/// rest are joined with a single space; rows with nothing left are skipped.
/// Rows may have differing lengths.
pub struct CsvExtractor;

impl TextExtractor for CsvExtractor {
    fn name(&self) -> &'static str {
        "csv"
    }

    fn extract(&self, bytes: &[u8]) -> Result<String, ExtractionError> {
        let text = std::str::from_utf8(bytes)
            .map_err(|e| ExtractionError::Csv(format!("not valid UTF-8: {e}")))?;

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(text.as_bytes());

        let mut lines = Vec::new();
        for (idx, record) in reader.records().enumerate() {
            let record =
                record.map_err(|e| ExtractionError::Csv(format!("row {}: {e}", idx + 1)))?;
            let line = record
                .iter()
                .filter(|cell| !cell.trim().is_empty())
                .collect::<Vec<_>>()
                .join(" ");
            if !line.is_empty() {
                lines.push(line);
            }
        }
        Ok(lines.join("\n"))
    }
}
