//! PDF adapter: the text layer of every page, via pdfium.
//!
//! Pages are joined with `\n` in page order; a page without a text layer
//! contributes an empty string, so scanned PDFs usually come back blank and
//! are then rejected as empty content by the orchestrator.
//!
//! ## Library lookup
//!
//! 1. `PDFIUM_LIB_PATH`, when set, names the pdfium shared library file.
//! 2. The platform library name in the working directory (`./libpdfium.so`).
//! 3. The system library search path.

use super::TextExtractor;
use crate::error::ExtractionError;
use pdfium_render::prelude::*;
use std::path::PathBuf;
use tracing::debug;

/// Environment variable naming an explicit pdfium library file.
pub const PDFIUM_LIB_PATH_ENV: &str = "PDFIUM_LIB_PATH";

pub struct PdfExtractor;

impl TextExtractor for PdfExtractor {
    fn name(&self) -> &'static str {
        "pdf"
    }

    fn extract(&self, bytes: &[u8]) -> Result<String, ExtractionError> {
        let pdfium = bind_pdfium()?;
        let document = pdfium
            .load_pdf_from_byte_slice(bytes, None)
            .map_err(|e| ExtractionError::Pdf(format!("cannot open document: {e}")))?;

        let pages = document.pages();
        debug!("PDF loaded: {} pages", pages.len());

        let mut texts = Vec::with_capacity(pages.len() as usize);
        for (idx, page) in pages.iter().enumerate() {
            let text = page
                .text()
                .map_err(|e| ExtractionError::Pdf(format!("page {}: {e}", idx + 1)))?;
            texts.push(text.all());
        }
        Ok(texts.join("\n"))
    }
}

fn bind_pdfium() -> Result<Pdfium, ExtractionError> {
    let bindings = match std::env::var(PDFIUM_LIB_PATH_ENV) {
        Ok(path) if !path.is_empty() => {
            let path = PathBuf::from(path);
            debug!("Binding pdfium from {}", path.display());
            Pdfium::bind_to_library(&path)
        }
        _ => Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
            .or_else(|_| Pdfium::bind_to_system_library()),
    }
    .map_err(|e| ExtractionError::Pdf(format!("pdfium library unavailable: {e}")))?;

    Ok(Pdfium::new(bindings))
}
