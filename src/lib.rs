//! # proposal-pdf
//!
//! Turn a project description into a branded, multi-page proposal PDF.
//!
//! A prospective client describes a project (optionally attaching a brief).
//! A language model writes a structured analysis as JSON; this crate
//! captures the lead, lays the analysis out over a fixed sequence of A4
//! pages (cover, company profile, scope, plan, commercials, deliverables,
//! global presence, contact), rasterises each page and assembles the images
//! into one PDF.
//!
//! ## Pipeline Overview
//!
//! ```text
//! ProjectSubmission
//!  │
//!  ├─ 1. Validate   description, country, contact fields, attachment
//!  ├─ 2. Lead       LeadStore (JSON lines file or REST collection)
//!  ├─ 3. Analysis   chat call with retry → AnalysisDocument (flat | structured)
//!  ├─ 4. Session    {client, analysis} under "aiReportData"
//!  ├─ 5. Compose    page descriptors: blocks, tables, lettered lists, pagination
//!  ├─ 6. Raster     one RGBA image per page (sequential, spawn_blocking)
//!  └─ 7. Assemble   A4 PDF, `<Brand>_Project_Analysis_<Client_Name>.pdf`
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use proposal_pdf::{compose_report, sample_report, PdfExporter, ReportConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ReportConfig::default();
//!     let input = sample_report();
//!     let today = chrono::Local::now().date_naive();
//!     let report = compose_report(&input.client, input.analysis.as_ref(), &config, today)
//!         .ok_or("no analysis")?;
//!
//!     let exporter = PdfExporter::with_layout_rasterizer(config)?;
//!     let path = exporter.export_to_file(&report, ".").await?;
//!     eprintln!("wrote {}", path.display());
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `proposal` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! proposal-pdf = { version = "0.3", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod analysis;
pub mod brand;
pub mod config;
pub mod error;
pub mod export;
pub mod funnel;
pub mod html;
pub mod lead;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod session;
pub mod stream;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use analysis::{sample_report, AnalysisDocument, ClientRecord, ReportInput, SchemaVariant};
pub use brand::BrandProfile;
pub use config::{ReportConfig, ReportConfigBuilder};
pub use error::{ErrorClass, ProposalError};
pub use export::{export_filename, PdfExporter};
pub use funnel::{analyze, resolve_provider, submit_project, FunnelOutcome, ProjectSubmission};
pub use html::{render_html, write_html};
pub use lead::{HttpLeadStore, JsonlLeadStore, LeadRecord, LeadStatus, LeadStore, LeadSubmission};
pub use pipeline::compose::{compose_report, ComposedReport, PageDescriptor, PageKind, PagePayload};
pub use pipeline::llm::{AnalysisRequest, GeneratedAnalysis};
pub use pipeline::raster::{CaptureOptions, LayoutRasterizer, PageRasterizer};
pub use progress::{ExportProgressCallback, NoopProgressCallback, ProgressCallback};
pub use session::{load_report_input, LoadedReport, ReportOrigin, SessionStore, SESSION_KEY};
pub use stream::raster_stream;
