//! Upload resolution: turn a user-supplied path or URL into an [`Upload`].
//!
//! The media type is decided here, before any decoding: from the file
//! extension first, falling back to the `Content-Type` header for URL
//! downloads. Anything that is not `.txt`, `.docx` or `.pdf` is rejected with
//! [`SkrivError::UnsupportedFormat`] without reading further.

use crate::error::SkrivError;
use crate::pipeline::decode::MediaType;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// A single uploaded file, fully read into memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upload {
    pub bytes: Vec<u8>,
    pub media_type: MediaType,
    pub filename: String,
}

impl Upload {
    /// Build an upload from in-memory bytes, typing it by `filename`'s
    /// extension.
    pub fn from_bytes(bytes: Vec<u8>, filename: impl Into<String>) -> Result<Self, SkrivError> {
        let filename = filename.into();
        let media_type = media_type_for_path(Path::new(&filename))?;
        Ok(Self {
            bytes,
            media_type,
            filename,
        })
    }
}

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Resolve `input` (local path or http(s) URL) into an [`Upload`].
pub async fn resolve_upload(input: &str, timeout_secs: u64) -> Result<Upload, SkrivError> {
    if is_url(input) {
        download_url(input, timeout_secs).await
    } else {
        read_local(input).await
    }
}

fn media_type_for_path(path: &Path) -> Result<MediaType, SkrivError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default();
    MediaType::from_extension(ext).ok_or_else(|| SkrivError::UnsupportedFormat {
        media_type: if ext.is_empty() {
            "(no extension)".to_string()
        } else {
            format!(".{ext}")
        },
    })
}

async fn read_local(path_str: &str) -> Result<Upload, SkrivError> {
    let path = PathBuf::from(path_str);
    let media_type = media_type_for_path(&path)?;

    let bytes = match tokio::fs::read(&path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(SkrivError::PermissionDenied { path });
        }
        Err(_) => return Err(SkrivError::FileNotFound { path }),
    };

    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path_str.to_string());

    debug!(
        "Resolved local upload: {} ({}, {} bytes)",
        path.display(),
        media_type.label(),
        bytes.len()
    );
    Ok(Upload {
        bytes,
        media_type,
        filename,
    })
}

async fn download_url(url: &str, timeout_secs: u64) -> Result<Upload, SkrivError> {
    info!("Downloading upload from: {}", url);

    let failed = |reason: String| SkrivError::DownloadFailed {
        url: url.to_string(),
        reason,
    };

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| failed(e.to_string()))?;

    let response = client.get(url).send().await.map_err(|e| {
        if e.is_timeout() {
            SkrivError::DownloadTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            failed(e.to_string())
        }
    })?;

    if !response.status().is_success() {
        return Err(failed(format!("HTTP {}", response.status())));
    }

    let filename = filename_from_url(url);
    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let media_type = match media_type_for_path(Path::new(&filename)) {
        Ok(mt) => mt,
        Err(by_extension) => match content_type {
            Some(ct) => MediaType::from_mime(&ct)
                .ok_or(SkrivError::UnsupportedFormat { media_type: ct })?,
            None => return Err(by_extension),
        },
    };

    let bytes = response.bytes().await.map_err(|e| {
        if e.is_timeout() {
            SkrivError::DownloadTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            failed(e.to_string())
        }
    })?;

    info!("Downloaded {} bytes ({})", bytes.len(), media_type.label());
    Ok(Upload {
        bytes: bytes.to_vec(),
        media_type,
        filename,
    })
}

/// Last path segment of the URL, or a generic name.
fn filename_from_url(url: &str) -> String {
    if let Ok(parsed) = reqwest::Url::parse(url) {
        if let Some(mut segments) = parsed.path_segments() {
            if let Some(last) = segments.next_back() {
                if !last.is_empty() {
                    return last.to_string();
                }
            }
        }
    }
    "upload".to_string()
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
    fn filename_from_url_path() {
        assert_eq!(filename_from_url("https://x.org/files/uppsats.docx"), "uppsats.docx");
        assert_eq!(filename_from_url("https://x.org/"), "upload");
    }

    #[test]
    fn from_bytes_types_by_extension() {
        let up = Upload::from_bytes(b"hej".to_vec(), "anteckning.TXT").unwrap();
        assert_eq!(up.media_type, MediaType::PlainText);

        let err = Upload::from_bytes(vec![], "bild.png").unwrap_err();
        assert!(matches!(err, SkrivError::UnsupportedFormat { media_type } if media_type == ".png"));
    }

    #[tokio::test]
    async fn local_file_is_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("utkast.txt");
        std::fs::write(&path, "Hello world").unwrap();

        let up = resolve_upload(path.to_str().unwrap(), 5).await.unwrap();
        assert_eq!(up.bytes, b"Hello world");
        assert_eq!(up.filename, "utkast.txt");
        assert_eq!(up.media_type, MediaType::PlainText);
    }

    #[tokio::test]
    async fn missing_file_is_reported() {
        let err = resolve_upload("/definitely/not/here.pdf", 5).await.unwrap_err();
        assert!(matches!(err, SkrivError::FileNotFound { .. }));
    }

    #[tokio::test]
    async fn unknown_extension_rejected_before_reading() {
        // The file does not exist; the extension check must fire first.
        let err = resolve_upload("/nowhere/slides.pptx", 5).await.unwrap_err();
        assert!(matches!(err, SkrivError::UnsupportedFormat { .. }));
    }
}
