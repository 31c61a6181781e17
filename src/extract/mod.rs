//! Format-dispatching text extraction.
//!
//! The format of an upload is decided by its filename extension alone,
//! compared case-insensitively against a fixed allow-list. Each format has one
//! [`TextExtractor`] adapter, and every adapter translates its library's
//! failures into a single [`ExtractionError`] variant, so nothing
//! library-specific crosses this module boundary.
//!
//! ```text
//! "Scan.JPG" ──▶ FileFormat::Jpg ──▶ OcrExtractor (decode → tesseract)   ──▶ text
//! "q3.xlsx"  ──▶ FileFormat::Xlsx ──▶ SpreadsheetExtractor (calamine)     ──▶ text
//! "a.doc"    ──▶ ExtractionError::UnsupportedFormat (no adapter runs)
//! ```
//!
//! All adapters are synchronous and may block (pdfium, calamine, a tesseract
//! child process); the orchestrator runs them on tokio's blocking pool.

pub mod docx;
pub mod ocr;
pub mod pdf;
pub mod spreadsheet;
pub mod text;

use crate::config::OcrConfig;
use crate::error::ExtractionError;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// The upload formats the classifier accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileFormat {
    Pdf,
    Png,
    Jpg,
    Jpeg,
    Docx,
    Txt,
    Xlsx,
    Xls,
    Csv,
}

impl FileFormat {
    /// Every accepted format, in allow-list order.
    pub const ALL: [FileFormat; 9] = [
        FileFormat::Pdf,
        FileFormat::Png,
        FileFormat::Jpg,
        FileFormat::Jpeg,
        FileFormat::Docx,
        FileFormat::Txt,
        FileFormat::Xlsx,
        FileFormat::Xls,
        FileFormat::Csv,
    ];

    /// Lower-case extension without the dot.
    pub fn extension(&self) -> &'static str {
        match self {
            FileFormat::Pdf => "pdf",
            FileFormat::Png => "png",
            FileFormat::Jpg => "jpg",
            FileFormat::Jpeg => "jpeg",
            FileFormat::Docx => "docx",
            FileFormat::Txt => "txt",
            FileFormat::Xlsx => "xlsx",
            FileFormat::Xls => "xls",
            FileFormat::Csv => "csv",
        }
    }

    /// Match an extension (no dot) case-insensitively.
    pub fn from_extension(ext: &str) -> Option<Self> {
        let ext = ext.to_ascii_lowercase();
        Self::ALL.into_iter().find(|f| f.extension() == ext)
    }

    /// Format of a filename, taken from the text after its last `.`.
    ///
    /// Names without a dot have no format.
    pub fn from_filename(filename: &str) -> Option<Self> {
        let (_, ext) = filename.rsplit_once('.')?;
        Self::from_extension(ext)
    }

    pub fn is_image(&self) -> bool {
        matches!(self, FileFormat::Png | FileFormat::Jpg | FileFormat::Jpeg)
    }
}

impl fmt::Display for FileFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// `true` when the filename's extension is on the allow-list.
pub fn allowed_file(filename: &str) -> bool {
    FileFormat::from_filename(filename).is_some()
}

/// Converts the raw bytes of one format into plain text.
pub trait TextExtractor: Send + Sync {
    /// Short adapter name used in logs.
    fn name(&self) -> &'static str;

    fn extract(&self, bytes: &[u8]) -> Result<String, ExtractionError>;
}

/// Maps each [`FileFormat`] to its adapter.
///
/// Read-only once built, so one registry can serve concurrent requests.
#[derive(Clone)]
pub struct ExtractorRegistry {
    extractors: HashMap<FileFormat, Arc<dyn TextExtractor>>,
}

impl ExtractorRegistry {
    /// Registry with the built-in adapter for every allow-listed format.
    pub fn new(ocr_config: &OcrConfig) -> Self {
        let ocr: Arc<dyn TextExtractor> = Arc::new(ocr::OcrExtractor::new(ocr_config.clone()));
        let mut registry = Self {
            extractors: HashMap::new(),
        };
        registry.register(FileFormat::Pdf, Arc::new(pdf::PdfExtractor));
        registry.register(FileFormat::Png, Arc::clone(&ocr));
        registry.register(FileFormat::Jpg, Arc::clone(&ocr));
        registry.register(FileFormat::Jpeg, ocr);
        registry.register(FileFormat::Docx, Arc::new(docx::DocxExtractor));
        registry.register(FileFormat::Txt, Arc::new(text::PlainTextExtractor));
        registry.register(FileFormat::Xlsx, Arc::new(spreadsheet::SpreadsheetExtractor::xlsx()));
        registry.register(FileFormat::Xls, Arc::new(spreadsheet::SpreadsheetExtractor::xls()));
        registry.register(FileFormat::Csv, Arc::new(text::CsvExtractor));
        registry
    }

    /// Replace the adapter for `format`.
    pub fn register(&mut self, format: FileFormat, extractor: Arc<dyn TextExtractor>) {
        self.extractors.insert(format, extractor);
    }

    /// Extract text from `bytes` using the adapter registered for `format`.
    pub fn extract(&self, format: FileFormat, bytes: &[u8]) -> Result<String, ExtractionError> {
        let extractor = self.extractors.get(&format).ok_or_else(|| {
            ExtractionError::UnsupportedFormat {
                filename: format!("*.{format}"),
            }
        })?;
        debug!("Extracting {} bytes with {} adapter", bytes.len(), extractor.name());
        extractor.extract(bytes)
    }

    /// Resolve the format from `filename`, then extract.
    ///
    /// Unknown extensions fail with [`ExtractionError::UnsupportedFormat`]
    /// before any adapter sees the bytes.
    pub fn extract_file(&self, filename: &str, bytes: &[u8]) -> Result<String, ExtractionError> {
        let format =
            FileFormat::from_filename(filename).ok_or_else(|| ExtractionError::UnsupportedFormat {
                filename: filename.to_string(),
            })?;
        self.extract(format, bytes)
    }
}

impl Default for ExtractorRegistry {
    fn default() -> Self {
        Self::new(&OcrConfig::default())
    }
}

impl fmt::Debug for ExtractorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut formats: Vec<&str> = self.extractors.keys().map(|k| k.extension()).collect();
        formats.sort_unstable();
        f.debug_struct("ExtractorRegistry")
            .field("formats", &formats)
            .finish()
    }
}
