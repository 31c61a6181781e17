//! PNG / JPEG adapter: decode the image, then OCR it with tesseract.
//!
//! The upload is decoded first so an unreadable image is reported as
//! [`ExtractionError::InvalidImage`] without starting the OCR engine. The
//! decoded image is re-encoded as PNG into a temporary file and handed to
//! `tesseract <file> stdout -l <lang>`; its stdout, trimmed, is the text.

use super::TextExtractor;
use crate::config::OcrConfig;
use crate::error::ExtractionError;
use image::{DynamicImage, ImageFormat};
use std::io::{Cursor, Write};
use std::process::{Command, Stdio};
use tracing::debug;

pub struct OcrExtractor {
    config: OcrConfig,
}

impl OcrExtractor {
    pub fn new(config: OcrConfig) -> Self {
        Self { config }
    }

    fn run_tesseract(&self, png: &[u8]) -> Result<String, ExtractionError> {
        let mut file = tempfile::Builder::new()
            .prefix("docclass-ocr-")
            .suffix(".png")
            .tempfile()
            .map_err(|e| ExtractionError::Ocr(format!("cannot create temp file: {e}")))?;
        file.write_all(png)
            .and_then(|_| file.flush())
            .map_err(|e| ExtractionError::Ocr(format!("cannot write temp file: {e}")))?;

        let cmd = &self.config.tesseract_cmd;
        let output = Command::new(cmd)
            .arg(file.path())
            .arg("stdout")
            .arg("-l")
            .arg(&self.config.language)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| {
                ExtractionError::Ocr(format!("cannot run '{}': {e}", cmd.display()))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ExtractionError::Ocr(format!(
                "tesseract exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

impl TextExtractor for OcrExtractor {
    fn name(&self) -> &'static str {
        "ocr"
    }

    fn extract(&self, bytes: &[u8]) -> Result<String, ExtractionError> {
        let img = image::load_from_memory(bytes)
            .map_err(|e| ExtractionError::InvalidImage(e.to_string()))?;
        debug!("Decoded image {}x{} for OCR", img.width(), img.height());

        let png = encode_png(&img).map_err(|e| ExtractionError::Ocr(e.to_string()))?;
        self.run_tesseract(&png)
    }
}

fn encode_png(img: &DynamicImage) -> Result<Vec<u8>, image::ImageError> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)?;
    Ok(buf)
}
