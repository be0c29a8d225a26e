//! Error types for the proposal-pdf library.
//!
//! Every fatal failure is a [`ProposalError`]. Rendering never produces one:
//! a malformed or incomplete analysis degrades to empty sections instead
//! (see [`crate::analysis`]).
//!
//! Each variant carries operator-level detail in its `Display` output, which
//! is what gets logged. The text a client is allowed to see comes from
//! [`ProposalError::user_message`], which collapses every variant of a class
//! into one generic notice.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the proposal-pdf library.
#[derive(Debug, Error)]
pub enum ProposalError {
    // ── Lead validation ───────────────────────────────────────────────────
    /// A required lead field is empty or missing.
    #[error("Missing required field '{field}'")]
    MissingLeadField { field: &'static str },

    /// The email address is not plausibly an address.
    #[error("Invalid email address '{email}'")]
    InvalidEmail { email: String },

    /// The project description is below the minimum length.
    #[error("Project description is too short ({chars} characters, {words} words); at least {min_chars} characters and {min_words} words are required")]
    DescriptionTooShort {
        chars: usize,
        words: usize,
        min_chars: usize,
        min_words: usize,
    },

    // ── Attachment errors ─────────────────────────────────────────────────
    /// Attachment file was not found at the given path.
    #[error("Attachment not found: '{path}'")]
    AttachmentNotFound { path: PathBuf },

    /// Attachment exceeds the configured size limit.
    #[error("Attachment '{path}' is {size} bytes; the limit is {limit} bytes")]
    AttachmentTooLarge { path: PathBuf, size: u64, limit: u64 },

    /// Attachment type is not one of PDF, DOC, DOCX, TXT, MD, PNG or JPEG.
    #[error("Unsupported attachment type '{extension}' for '{path}'\nSupported: pdf, doc, docx, txt, md, png, jpg")]
    UnsupportedAttachment { path: PathBuf, extension: String },

    /// The attachment exists but its content could not be read.
    #[error("Failed to read attachment '{path}': {detail}")]
    AttachmentUnreadable { path: PathBuf, detail: String },

    /// HTTP URL was syntactically valid but download failed.
    #[error("Failed to download '{url}': {reason}")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'")]
    DownloadTimeout { url: String, secs: u64 },

    // ── LLM errors ────────────────────────────────────────────────────────
    /// The configured provider is not initialised (missing API key etc.).
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    /// Every attempt at the analysis call failed.
    #[error("Analysis failed after {attempts} attempts: {detail}")]
    AnalysisFailed { attempts: u32, detail: String },

    /// The model answered with nothing usable.
    #[error("Analysis response was empty")]
    EmptyAnalysis,

    /// The model answered, but not with a recognisable analysis document.
    #[error("Analysis response is not a valid analysis document: {detail}")]
    MalformedAnalysis { detail: String },

    // ── Storage errors ────────────────────────────────────────────────────
    /// The lead could not be persisted.
    #[error("Failed to store lead: {detail}")]
    LeadStoreFailed { detail: String },

    /// The session payload could not be written or read.
    #[error("Session store error for key '{key}': {detail}")]
    SessionStoreFailed { key: String, detail: String },

    // ── Export errors ─────────────────────────────────────────────────────
    /// No usable TrueType/OpenType font for the built-in rasteriser.
    #[error("No usable font found (tried: {tried})\nSet PROPOSAL_FONT=/path/to/font.ttf")]
    FontUnavailable { tried: String },

    /// A page could not be rasterised; the whole export is abandoned.
    #[error("Rasterisation failed for page {page}: {detail}")]
    RasterisationFailed { page: usize, detail: String },

    /// Page images could not be assembled into a PDF.
    #[error("PDF assembly failed: {detail}")]
    PdfAssemblyFailed { detail: String },

    /// An export is already running on this exporter.
    #[error("An export is already in progress")]
    ExportInProgress,

    /// There is no composed report to export.
    #[error("No report to export: the analysis document is missing")]
    NoReport,

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write an output file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Coarse error classes, used to pick the client-facing notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Bad submitter input, reported before any network call.
    Validation,
    /// Analysis generation failed.
    Generation,
    /// Rendering or exporting the proposal failed.
    Export,
    /// Storage, configuration or anything else.
    Internal,
}

impl ProposalError {
    /// Which class this error belongs to.
    pub fn class(&self) -> ErrorClass {
        use ProposalError::*;
        match self {
            MissingLeadField { .. }
            | InvalidEmail { .. }
            | DescriptionTooShort { .. }
            | AttachmentNotFound { .. }
            | AttachmentTooLarge { .. }
            | UnsupportedAttachment { .. }
            | AttachmentUnreadable { .. }
            | DownloadFailed { .. }
            | DownloadTimeout { .. } => ErrorClass::Validation,
            ProviderNotConfigured { .. }
            | AnalysisFailed { .. }
            | EmptyAnalysis
            | MalformedAnalysis { .. } => ErrorClass::Generation,
            FontUnavailable { .. }
            | RasterisationFailed { .. }
            | PdfAssemblyFailed { .. }
            | ExportInProgress
            | NoReport
            | OutputWriteFailed { .. } => ErrorClass::Export,
            LeadStoreFailed { .. }
            | SessionStoreFailed { .. }
            | InvalidConfig(_)
            | Internal(_) => ErrorClass::Internal,
        }
    }

    /// The notice shown to the person viewing the proposal.
    ///
    /// Validation errors are specific (the submitter has to fix something);
    /// every other class gets one generic, retry-able message so no internal
    /// detail leaks to the client.
    pub fn user_message(&self) -> String {
        match self.class() {
            ErrorClass::Validation => self.to_string(),
            ErrorClass::Generation => {
                "Something went wrong generating your analysis. Please try again.".to_string()
            }
            ErrorClass::Export => "Failed to export PDF. Please try again.".to_string(),
            ErrorClass::Internal => "Something went wrong. Please try again.".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_field_display() {
        let e = ProposalError::MissingLeadField { field: "email" };
        assert!(e.to_string().contains("email"));
        assert_eq!(e.class(), ErrorClass::Validation);
    }

    #[test]
    fn rasterisation_failure_hides_detail_from_viewer() {
        let e = ProposalError::RasterisationFailed {
            page: 3,
            detail: "font cache poisoned".into(),
        };
        assert!(e.to_string().contains("page 3"));
        let notice = e.user_message();
        assert!(!notice.contains("font cache"), "got: {notice}");
        assert!(notice.contains("export"));
    }

    #[test]
    fn generation_errors_share_one_notice() {
        let a = ProposalError::EmptyAnalysis.user_message();
        let b = ProposalError::MalformedAnalysis {
            detail: "expected value at line 1".into(),
        }
        .user_message();
        assert_eq!(a, b);
        assert!(!b.contains("line 1"));
    }

    #[test]
    fn attachment_too_large_display() {
        let e = ProposalError::AttachmentTooLarge {
            path: PathBuf::from("brief.pdf"),
            size: 6_000_000,
            limit: 5_242_880,
        };
        let msg = e.user_message();
        assert!(msg.contains("brief.pdf"), "got: {msg}");
        assert!(msg.contains("5242880"));
    }
}
