//! Input resolution: turn a user-supplied path or URL into an
//! [`UploadedDocument`].
//!
//! The filename matters as much as the bytes, since it selects the extractor.
//! Local files keep their own name. For URLs the last path segment is used
//! when it has an extension; otherwise the extension is guessed from the
//! response `Content-Type`.

use crate::error::InputError;
use crate::extract::FileFormat;
use crate::output::UploadedDocument;
use reqwest::header::CONTENT_TYPE;
use reqwest::Url;
use std::path::Path;
use tracing::{debug, info};

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Load `input` from disk, or download it when it is an http(s) URL.
pub async fn resolve_input(input: &str, timeout_secs: u64) -> Result<UploadedDocument, InputError> {
    if is_url(input) {
        download_url(input, timeout_secs).await
    } else {
        read_local(Path::new(input)).await
    }
}

async fn read_local(path: &Path) -> Result<UploadedDocument, InputError> {
    let bytes = tokio::fs::read(path).await.map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => InputError::FileNotFound {
            path: path.to_path_buf(),
        },
        std::io::ErrorKind::PermissionDenied => InputError::PermissionDenied {
            path: path.to_path_buf(),
        },
        _ => InputError::ReadFailed {
            path: path.to_path_buf(),
            source: e,
        },
    })?;

    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    debug!("Read {} bytes from {}", bytes.len(), path.display());
    Ok(UploadedDocument::new(filename, bytes))
}

async fn download_url(url: &str, timeout_secs: u64) -> Result<UploadedDocument, InputError> {
    let parsed = Url::parse(url).map_err(|e| InputError::InvalidUrl {
        url: url.to_string(),
        reason: e.to_string(),
    })?;
    info!("Downloading document from: {}", url);

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| InputError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    let response = client.get(parsed.clone()).send().await.map_err(|e| {
        if e.is_timeout() {
            InputError::DownloadTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            InputError::DownloadFailed {
                url: url.to_string(),
                reason: e.to_string(),
            }
        }
    })?;

    if !response.status().is_success() {
        return Err(InputError::DownloadFailed {
            url: url.to_string(),
            reason: format!("HTTP {}", response.status()),
        });
    }

    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);
    let filename = filename_for(&parsed, content_type.as_deref());

    let bytes = response.bytes().await.map_err(|e| {
        if e.is_timeout() {
            InputError::DownloadTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            InputError::DownloadFailed {
                url: url.to_string(),
                reason: e.to_string(),
            }
        }
    })?;

    info!("Downloaded {} bytes as '{}'", bytes.len(), filename);
    Ok(UploadedDocument::new(filename, bytes.to_vec()))
}

/// Name a downloaded document: the URL's last segment if it carries an
/// extension, else `download.<ext>` from the content type, else `download`.
fn filename_for(url: &Url, content_type: Option<&str>) -> String {
    if let Some(last) = url.path_segments().and_then(|mut s| s.next_back()) {
        if !last.is_empty() && last.contains('.') {
            return last.to_string();
        }
    }

    match content_type.and_then(format_for_content_type) {
        Some(format) => format!("download.{}", format.extension()),
        None => "download".to_string(),
    }
}

fn format_for_content_type(content_type: &str) -> Option<FileFormat> {
    let mime = content_type.split(';').next()?.trim().to_ascii_lowercase();
    let format = match mime.as_str() {
        "application/pdf" => FileFormat::Pdf,
        "image/png" => FileFormat::Png,
        "image/jpeg" | "image/jpg" => FileFormat::Jpg,
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document" => {
            FileFormat::Docx
        }
        "text/plain" => FileFormat::Txt,
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet" => FileFormat::Xlsx,
        "application/vnd.ms-excel" => FileFormat::Xls,
        "text/csv" => FileFormat::Csv,
        _ => return None,
    };
    Some(format)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_url() {
        assert!(is_url("https://example.com/doc.pdf"));
        assert!(is_url("http://example.com/doc.pdf"));
        assert!(!is_url("/tmp/doc.pdf"));
        assert!(!is_url("doc.pdf"));
        assert!(!is_url(""));
    }

    #[test]
    fn url_segment_with_extension_wins() {
        let url = Url::parse("https://example.com/files/Q3-report.XLSX?dl=1").unwrap();
        assert_eq!(filename_for(&url, Some("application/pdf")), "Q3-report.XLSX");
    }

    #[test]
    fn content_type_supplies_missing_extension() {
        let url = Url::parse("https://example.com/download/1234").unwrap();
        assert_eq!(
            filename_for(&url, Some("application/pdf; charset=binary")),
            "download.pdf"
        );
        assert_eq!(filename_for(&url, Some("text/csv")), "download.csv");
        assert_eq!(filename_for(&url, Some("application/zip")), "download");
        assert_eq!(filename_for(&url, None), "download");
    }

    #[tokio::test]
    async fn local_file_keeps_its_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("memo.TXT");
        std::fs::write(&path, "hello").unwrap();

        let doc = resolve_input(path.to_str().unwrap(), 5).await.unwrap();
        assert_eq!(doc.filename, "memo.TXT");
        assert_eq!(doc.bytes, b"hello");
    }

    #[tokio::test]
    async fn missing_file_is_not_found() {
        let err = resolve_input("/definitely/not/here.pdf", 5).await.unwrap_err();
        assert!(matches!(err, InputError::FileNotFound { .. }), "got: {err:?}");
    }

    #[tokio::test]
    async fn malformed_url_is_rejected_before_download() {
        let err = resolve_input("http://exa mple.com/x.pdf", 5).await.unwrap_err();
        assert!(matches!(err, InputError::InvalidUrl { .. }), "got: {err:?}");
    }
}
