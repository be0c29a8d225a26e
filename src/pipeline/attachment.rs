//! Attachment ingestion: a user-supplied path or URL → text or image input
//! for the analysis call.
//!
//! Validation happens before anything expensive: the type is decided from
//! the file extension (or, for extensionless URLs, the `Content-Type`
//! header) and the size is checked against
//! [`ReportConfig::max_attachment_bytes`] before the content is read.
//!
//! | Kind        | Extensions        | Forwarded as                    |
//! |-------------|-------------------|---------------------------------|
//! | PDF         | `pdf`             | text extracted with pdfium      |
//! | Text        | `txt`, `md`       | UTF-8 text (lossy)              |
//! | Word        | `doc`, `docx`     | UTF-8 text (lossy)              |
//! | Image       | `png`, `jpg/jpeg` | base64 vision input             |
//!
//! Word files are read as raw text, so only the readable runs of a `.docx`
//! survive. That is enough context for a proposal and avoids a document
//! parser for a rarely used path.
//!
//! ## Why spawn_blocking for PDFs?
//!
//! pdfium is a C++ library with thread-local state; it is driven from the
//! blocking pool so the runtime's worker threads never stall on it.

use crate::config::ReportConfig;
use crate::error::ProposalError;
use crate::pipeline::encode::encode_attachment_image;
use edgequake_llm::ImageData;
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

/// Supported attachment types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachmentKind {
    Pdf,
    Text,
    Word,
    Png,
    Jpeg,
}

impl AttachmentKind {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "pdf" => Some(Self::Pdf),
            "txt" | "md" | "markdown" => Some(Self::Text),
            "doc" | "docx" => Some(Self::Word),
            "png" => Some(Self::Png),
            "jpg" | "jpeg" => Some(Self::Jpeg),
            _ => None,
        }
    }

    /// Kind from a `Content-Type` value; parameters are ignored.
    pub fn from_mime(mime: &str) -> Option<Self> {
        let essence = mime.split(';').next().unwrap_or("").trim();
        match essence.to_ascii_lowercase().as_str() {
            "application/pdf" => Some(Self::Pdf),
            "text/plain" | "text/markdown" => Some(Self::Text),
            "application/msword"
            | "application/vnd.openxmlformats-officedocument.wordprocessingml.document" => {
                Some(Self::Word)
            }
            "image/png" => Some(Self::Png),
            "image/jpeg" | "image/jpg" => Some(Self::Jpeg),
            _ => None,
        }
    }

    pub fn mime(&self) -> &'static str {
        match self {
            Self::Pdf => "application/pdf",
            Self::Text => "text/plain",
            Self::Word => "application/msword",
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
        }
    }

    pub fn is_image(&self) -> bool {
        matches!(self, Self::Png | Self::Jpeg)
    }
}

/// What the analysis call receives from an attachment.
#[derive(Debug, Clone)]
pub enum AttachmentContent {
    Text(String),
    Image(ImageData),
}

/// A validated, decoded attachment.
#[derive(Debug, Clone)]
pub struct Attachment {
    /// File name, used in logs and error messages.
    pub name: String,
    pub kind: AttachmentKind,
    /// Size in bytes as received.
    pub size: u64,
    pub content: AttachmentContent,
}

impl Attachment {
    pub fn text(&self) -> Option<&str> {
        match &self.content {
            AttachmentContent::Text(t) => Some(t),
            AttachmentContent::Image(_) => None,
        }
    }

    pub fn image(&self) -> Option<&ImageData> {
        match &self.content {
            AttachmentContent::Image(i) => Some(i),
            AttachmentContent::Text(_) => None,
        }
    }
}

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Load and decode an attachment from a local path or HTTP(S) URL.
pub async fn load_attachment(
    input: &str,
    config: &ReportConfig,
) -> Result<Attachment, ProposalError> {
    if is_url(input) {
        download_attachment(input, config).await
    } else {
        load_local(Path::new(input), config).await
    }
}

/// Decode attachment bytes that arrived some other way (e.g. a form upload).
///
/// The kind is taken from `name`'s extension.
pub async fn attachment_from_bytes(
    name: &str,
    bytes: Vec<u8>,
    config: &ReportConfig,
) -> Result<Attachment, ProposalError> {
    let path = PathBuf::from(name);
    let kind = kind_for_path(&path)?;
    check_size(&path, bytes.len() as u64, config.max_attachment_bytes)?;
    decode(name.to_string(), kind, bytes).await
}

fn kind_for_path(path: &Path) -> Result<AttachmentKind, ProposalError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default();
    AttachmentKind::from_extension(ext).ok_or_else(|| ProposalError::UnsupportedAttachment {
        path: path.to_path_buf(),
        extension: ext.to_string(),
    })
}

fn check_size(path: &Path, size: u64, limit: u64) -> Result<(), ProposalError> {
    if size > limit {
        return Err(ProposalError::AttachmentTooLarge {
            path: path.to_path_buf(),
            size,
            limit,
        });
    }
    Ok(())
}

async fn load_local(path: &Path, config: &ReportConfig) -> Result<Attachment, ProposalError> {
    let meta = tokio::fs::metadata(path)
        .await
        .map_err(|_| ProposalError::AttachmentNotFound {
            path: path.to_path_buf(),
        })?;
    if !meta.is_file() {
        return Err(ProposalError::AttachmentNotFound {
            path: path.to_path_buf(),
        });
    }
    let kind = kind_for_path(path)?;
    check_size(path, meta.len(), config.max_attachment_bytes)?;

    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| ProposalError::AttachmentUnreadable {
            path: path.to_path_buf(),
            detail: e.to_string(),
        })?;
    debug!("Read attachment {} ({} bytes)", path.display(), bytes.len());

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    decode(name, kind, bytes).await
}

async fn download_attachment(
    url: &str,
    config: &ReportConfig,
) -> Result<Attachment, ProposalError> {
    let name = extract_filename(url);
    let from_url = Path::new(&name)
        .extension()
        .and_then(|e| e.to_str())
        .and_then(AttachmentKind::from_extension);
    let limit = config.max_attachment_bytes;
    let secs = config.download_timeout_secs;
    let failed = |reason: String| ProposalError::DownloadFailed {
        url: url.to_string(),
        reason,
    };

    info!("Downloading attachment from: {}", url);

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(secs))
        .build()
        .map_err(|e| failed(e.to_string()))?;

    let response = client.get(url).send().await.map_err(|e| {
        if e.is_timeout() {
            ProposalError::DownloadTimeout {
                url: url.to_string(),
                secs,
            }
        } else {
            failed(e.to_string())
        }
    })?;

    if !response.status().is_success() {
        return Err(failed(format!("HTTP {}", response.status())));
    }

    let kind = match from_url {
        Some(kind) => kind,
        None => response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .and_then(AttachmentKind::from_mime)
            .ok_or_else(|| ProposalError::UnsupportedAttachment {
                path: PathBuf::from(url),
                extension: Path::new(&name)
                    .extension()
                    .and_then(|e| e.to_str())
                    .unwrap_or_default()
                    .to_string(),
            })?,
    };

    if let Some(len) = response.content_length() {
        check_size(Path::new(url), len, limit)?;
    }

    let bytes = response.bytes().await.map_err(|e| {
        if e.is_timeout() {
            ProposalError::DownloadTimeout {
                url: url.to_string(),
                secs,
            }
        } else {
            failed(e.to_string())
        }
    })?;
    check_size(Path::new(url), bytes.len() as u64, limit)?;

    info!("Downloaded {} ({} bytes)", name, bytes.len());
    decode(name, kind, bytes.to_vec()).await
}

/// Turn raw bytes into attachment content.
async fn decode(
    name: String,
    kind: AttachmentKind,
    bytes: Vec<u8>,
) -> Result<Attachment, ProposalError> {
    let size = bytes.len() as u64;
    let content = match kind {
        AttachmentKind::Pdf => {
            let pdf_name = name.clone();
            let text = tokio::task::spawn_blocking(move || extract_pdf_text(&pdf_name, &bytes))
                .await
                .map_err(|e| ProposalError::Internal(format!("PDF text task panicked: {e}")))??;
            AttachmentContent::Text(text)
        }
        AttachmentKind::Text | AttachmentKind::Word => {
            AttachmentContent::Text(String::from_utf8_lossy(&bytes).into_owned())
        }
        AttachmentKind::Png | AttachmentKind::Jpeg => {
            AttachmentContent::Image(encode_attachment_image(&name, &bytes, kind.mime())?)
        }
    };
    Ok(Attachment {
        name,
        kind,
        size,
        content,
    })
}

/// Bind pdfium: `PDFIUM_LIB_PATH` (a directory) first, then the system
/// library.
fn bind_pdfium() -> Result<Pdfium, PdfiumError> {
    let bindings = match std::env::var("PDFIUM_LIB_PATH") {
        Ok(dir) if !dir.is_empty() => {
            Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(&dir))?
        }
        _ => Pdfium::bind_to_system_library()?,
    };
    Ok(Pdfium::new(bindings))
}

/// Blocking PDF text extraction, pages joined by blank lines.
fn extract_pdf_text(name: &str, bytes: &[u8]) -> Result<String, ProposalError> {
    let unreadable = |detail: String| ProposalError::AttachmentUnreadable {
        path: PathBuf::from(name),
        detail,
    };

    let pdfium = bind_pdfium().map_err(|e| unreadable(format!("pdfium unavailable: {e:?}")))?;
    let document = pdfium
        .load_pdf_from_byte_slice(bytes, None)
        .map_err(|e| unreadable(format!("{e:?}")))?;

    let mut pages_text = Vec::new();
    for page in document.pages().iter() {
        let text = page.text().map_err(|e| unreadable(format!("{e:?}")))?;
        pages_text.push(text.all());
    }
    info!("Extracted text from {} PDF pages of {}", pages_text.len(), name);
    Ok(pages_text.join("\n\n"))
}

/// Last URL path segment with an extension, or `attachment`.
fn extract_filename(url: &str) -> String {
    if let Ok(parsed) = reqwest::Url::parse(url) {
        if let Some(mut segments) = parsed.path_segments() {
            if let Some(last) = segments.next_back() {
                if !last.is_empty() && last.contains('.') {
                    return last.to_string();
                }
            }
        }
    }
    "attachment".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn config() -> ReportConfig {
        ReportConfig::default()
    }

    #[test]
    fn test_is_url() {
        assert!(is_url("https://example.com/brief.pdf"));
        assert!(is_url("http://example.com/brief.pdf"));
        assert!(!is_url("/tmp/brief.pdf"));
        assert!(!is_url(""));
    }

    #[test]
    fn kinds_by_extension_and_mime() {
        assert_eq!(AttachmentKind::from_extension("PDF"), Some(AttachmentKind::Pdf));
        assert_eq!(AttachmentKind::from_extension("docx"), Some(AttachmentKind::Word));
        assert_eq!(AttachmentKind::from_extension("exe"), None);
        assert_eq!(
            AttachmentKind::from_mime("text/plain; charset=utf-8"),
            Some(AttachmentKind::Text)
        );
        assert!(AttachmentKind::Jpeg.is_image());
    }

    #[test]
    fn filename_from_url() {
        assert_eq!(extract_filename("https://x.io/files/brief.pdf?sig=1"), "brief.pdf");
        assert_eq!(extract_filename("https://x.io/download"), "attachment");
    }

    #[tokio::test]
    async fn text_file_is_read_lossily() {
        let mut f = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
        f.write_all(b"Fleet tracker for 40 vans \xff").unwrap();
        let a = load_attachment(f.path().to_str().unwrap(), &config())
            .await
            .unwrap();
        assert_eq!(a.kind, AttachmentKind::Text);
        assert!(a.text().unwrap().starts_with("Fleet tracker for 40 vans"));
        assert!(a.image().is_none());
    }

    #[tokio::test]
    async fn missing_file_is_not_found() {
        let err = load_attachment("/nonexistent/brief.pdf", &config())
            .await
            .unwrap_err();
        assert!(matches!(err, ProposalError::AttachmentNotFound { .. }));
    }

    #[tokio::test]
    async fn unsupported_extension_is_rejected() {
        let f = tempfile::Builder::new().suffix(".exe").tempfile().unwrap();
        let err = load_attachment(f.path().to_str().unwrap(), &config())
            .await
            .unwrap_err();
        assert!(matches!(err, ProposalError::UnsupportedAttachment { .. }));
    }

    #[tokio::test]
    async fn oversized_bytes_are_rejected_before_decoding() {
        let config = ReportConfig::builder().max_attachment_bytes(4).build().unwrap();
        let err = attachment_from_bytes("notes.md", b"12345".to_vec(), &config)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ProposalError::AttachmentTooLarge { size: 5, limit: 4, .. }
        ));
    }

    #[tokio::test]
    async fn pdf_text_extraction_skips_without_pdfium() {
        if bind_pdfium().is_err() {
            println!("SKIP — pdfium library not available");
            return;
        }
        let err = attachment_from_bytes("broken.pdf", b"%PDF-1.4 garbage".to_vec(), &config())
            .await
            .unwrap_err();
        assert!(matches!(err, ProposalError::AttachmentUnreadable { .. }));
    }
}
