//! DOCX adapter: body paragraphs of `word/document.xml`, in document order.
//!
//! Only paragraphs that are direct children of `w:body` are read; text inside
//! tables, headers, footers and text boxes is not part of the output. Within a
//! paragraph, `w:t` runs are concatenated, `w:tab` becomes a tab and
//! `w:br`/`w:cr` a newline. Paragraphs are joined with `\n`, so an empty
//! paragraph shows up as an empty line.

use super::TextExtractor;
use crate::error::ExtractionError;
use roxmltree::{Document, Node};
use std::io::{Cursor, Read};
use zip::ZipArchive;

const W_NAMESPACE: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";
const DOCUMENT_PART: &str = "word/document.xml";

pub struct DocxExtractor;

impl TextExtractor for DocxExtractor {
    fn name(&self) -> &'static str {
        "docx"
    }

    fn extract(&self, bytes: &[u8]) -> Result<String, ExtractionError> {
        let xml = read_document_part(bytes)?;
        let doc = Document::parse(&xml)
            .map_err(|e| ExtractionError::Docx(format!("malformed {DOCUMENT_PART}: {e}")))?;

        let body = doc
            .descendants()
            .find(|n| n.has_tag_name((W_NAMESPACE, "body")))
            .ok_or_else(|| ExtractionError::Docx("document has no body".into()))?;

        let paragraphs: Vec<String> = body
            .children()
            .filter(|n| n.has_tag_name((W_NAMESPACE, "p")))
            .map(paragraph_text)
            .collect();

        Ok(paragraphs.join("\n"))
    }
}

fn read_document_part(bytes: &[u8]) -> Result<String, ExtractionError> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| ExtractionError::Docx(format!("not a DOCX (zip) container: {e}")))?;

    let mut part = archive
        .by_name(DOCUMENT_PART)
        .map_err(|e| ExtractionError::Docx(format!("missing {DOCUMENT_PART}: {e}")))?;

    let mut xml = String::new();
    part.read_to_string(&mut xml)
        .map_err(|e| ExtractionError::Docx(format!("unreadable {DOCUMENT_PART}: {e}")))?;
    Ok(xml)
}

fn paragraph_text(paragraph: Node<'_, '_>) -> String {
    let mut text = String::new();
    for node in paragraph.descendants().filter(|n| n.is_element()) {
        if node.tag_name().namespace() != Some(W_NAMESPACE) {
            continue;
        }
        match node.tag_name().name() {
            "t" => text.push_str(node.text().unwrap_or("")),
            "tab" => text.push('\t'),
            "br" | "cr" => text.push('\n'),
            _ => {}
        }
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::SimpleFileOptions;
    use zip::{CompressionMethod, ZipWriter};

    /// Minimal DOCX whose body contains the given paragraph XML fragments.
    fn docx_with_body(body: &str) -> Vec<u8> {
        let xml = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="{W_NAMESPACE}"><w:body>{body}<w:sectPr/></w:body></w:document>"#
        );
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let opts = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
        zip.start_file(DOCUMENT_PART, opts).unwrap();
        zip.write_all(xml.as_bytes()).unwrap();
        zip.finish().unwrap().into_inner()
    }

    #[test]
    fn paragraphs_joined_in_order() {
        let bytes = docx_with_body(
            "<w:p><w:r><w:t>INVOICE</w:t></w:r></w:p>\
             <w:p/>\
             <w:p><w:r><w:t xml:space=\"preserve\">Total: </w:t></w:r><w:r><w:t>42</w:t></w:r></w:p>",
        );
        let text = DocxExtractor.extract(&bytes).unwrap();
        assert_eq!(text, "INVOICE\n\nTotal: 42");
    }

    #[test]
    fn tabs_and_breaks_inside_a_paragraph() {
        let bytes = docx_with_body(
            "<w:p><w:r><w:t>Name</w:t><w:tab/><w:t>Bob</w:t><w:br/><w:t>Line 2</w:t></w:r></w:p>",
        );
        assert_eq!(DocxExtractor.extract(&bytes).unwrap(), "Name\tBob\nLine 2");
    }

    #[test]
    fn table_text_is_not_a_body_paragraph() {
        let bytes = docx_with_body(
            "<w:p><w:r><w:t>Before</w:t></w:r></w:p>\
             <w:tbl><w:tr><w:tc><w:p><w:r><w:t>Cell</w:t></w:r></w:p></w:tc></w:tr></w:tbl>\
             <w:p><w:r><w:t>After</w:t></w:r></w:p>",
        );
        assert_eq!(DocxExtractor.extract(&bytes).unwrap(), "Before\nAfter");
    }

    #[test]
    fn not_a_zip_is_docx_error() {
        let err = DocxExtractor.extract(b"plain text, not a zip").unwrap_err();
        assert!(matches!(err, ExtractionError::Docx(_)), "got: {err:?}");
    }

    #[test]
    fn zip_without_document_part_is_docx_error() {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let opts = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
        zip.start_file("other.txt", opts).unwrap();
        zip.write_all(b"x").unwrap();
        let bytes = zip.finish().unwrap().into_inner();

        let err = DocxExtractor.extract(&bytes).unwrap_err();
        assert!(err.to_string().contains("word/document.xml"), "got: {err}");
    }
}
