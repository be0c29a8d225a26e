//! Integration tests for report composition and export, through the public
//! API only.
//!
//! No network and no fonts are needed: a stub rasteriser stands in for the
//! layout painter. The one test that paints real pages skips when no system
//! font can be found.
//!
//! Run with:
//!   cargo test --test report -- --nocapture

use async_trait::async_trait;
use chrono::NaiveDate;
use image::{Rgba, RgbaImage};
use proposal_pdf::pipeline::compose::Section;
use proposal_pdf::pipeline::section::{Block, Marker};
use proposal_pdf::{
    compose_report, export_filename, load_report_input, sample_report, AnalysisDocument,
    CaptureOptions, ClientRecord, ComposedReport, LayoutRasterizer, PageDescriptor, PageKind,
    PagePayload, PageRasterizer, PdfExporter, ProposalError, ReportConfig, ReportOrigin,
    SessionStore,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

// ── Test helpers ─────────────────────────────────────────────────────────────

fn date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 16).unwrap()
}

fn client() -> ClientRecord {
    ClientRecord {
        name: "Alex   Morgan".into(),
        email: "alex.morgan@example.com".into(),
        contact_number: "+1 555 0100".into(),
        country: "United States".into(),
        currency_code: "USD".into(),
        flag_glyph: "🇺🇸".into(),
    }
}

fn compose(doc: &AnalysisDocument, config: &ReportConfig) -> ComposedReport {
    compose_report(&client(), Some(doc), config, date()).expect("analysis present")
}

fn sections(page: &PageDescriptor) -> &[Section] {
    match &page.payload {
        PagePayload::Sections(s) => s,
        other => panic!("page {} is not a section page: {other:?}", page.number),
    }
}

/// Solid-colour pages; optionally fails on one page number.
struct StubRasterizer {
    fail_on: Option<usize>,
    calls: AtomicUsize,
}

impl StubRasterizer {
    fn new(fail_on: Option<usize>) -> Arc<Self> {
        Arc::new(Self {
            fail_on,
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl PageRasterizer for StubRasterizer {
    async fn capture(
        &self,
        page: &PageDescriptor,
        options: &CaptureOptions,
    ) -> Result<RgbaImage, ProposalError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_on == Some(page.number) {
            return Err(ProposalError::RasterisationFailed {
                page: page.number,
                detail: "stub failure".into(),
            });
        }
        let (w, h) = options.raster_size();
        Ok(RgbaImage::from_pixel(w / 8, h / 8, Rgba([240, 240, 240, 255])))
    }
}

// ── Composition ──────────────────────────────────────────────────────────────

#[test]
fn flat_report_page_order() {
    let config = ReportConfig::default();
    let input = sample_report();
    let report = compose(input.analysis.as_ref().unwrap(), &config);

    let kinds: Vec<PageKind> = report.pages.iter().map(|p| p.kind).collect();
    assert_eq!(kinds.first(), Some(&PageKind::Cover));
    assert_eq!(kinds.get(1), Some(&PageKind::Profile));
    assert_eq!(kinds.last(), Some(&PageKind::Contact));
    assert!(kinds.contains(&PageKind::Commercials));
    assert!(kinds.contains(&PageKind::Deliverables));

    for (i, page) in report.pages.iter().enumerate() {
        assert_eq!(page.number, i + 1);
        assert_eq!(page.page_id, format!("pdf-page-{}", i + 1));
    }
    assert_eq!(report.filename, "Talentronaut_Project_Analysis_Alex_Morgan.pdf");
}

#[test]
fn long_scope_continues_on_dimmed_pages() {
    let scope: String = (1..=60).map(|i| format!("- Task {i}\n")).collect();
    let doc = AnalysisDocument::from_json_str(
        &serde_json::json!({ "projectName": "Big Build", "scopeOfWork": scope }).to_string(),
    )
    .unwrap();
    let config = ReportConfig::builder()
        .first_page_capacity(15)
        .continuation_capacity(25)
        .build()
        .unwrap();
    let report = compose(&doc, &config);

    let continuations: Vec<&PageDescriptor> = report
        .pages
        .iter()
        .filter(|p| p.kind == PageKind::ContinuationContent)
        .collect();
    // 60 lines: 15 on the first page, then 25 + 20.
    assert_eq!(continuations.len(), 2);
    for page in &continuations {
        let s = sections(page);
        assert_eq!(s.len(), 1);
        assert!(s[0].dimmed);
        assert_eq!(s[0].title, "Scope of Work (Continued)");
    }
    assert_eq!(sections(continuations[1])[0].blocks.len(), 20);

    for page in &continuations {
        assert_eq!(page.heading.as_deref(), Some("03 • Project Details (Cont.)"));
        match &sections(page)[0].blocks[0] {
            Block::Bullet { marker, .. } => assert_eq!(*marker, Marker::Letter('a')),
            other => panic!("expected a lettered bullet, got {other:?}"),
        }
    }
    let plan = report
        .pages
        .iter()
        .find(|p| p.heading.as_deref().is_some_and(|h| h.ends_with("Plan & Technology")))
        .expect("plan page");
    assert_eq!(plan.heading.as_deref(), Some("04 • Plan & Technology"));
    assert_eq!(plan.number, 6);
}

#[test]
fn structured_report_tolerates_missing_fields() {
    let doc = AnalysisDocument::from_json_str(
        r#"{
            "projectUnderstanding": {"summary": "Clinic booking", "businessObjectives": "Fewer no-shows"},
            "technicalArchitecture": {"frontend": "React", "backend": null},
            "projectPhases": [{"phaseName": "Discovery", "activities": ["Workshops"]}]
        }"#,
    )
    .unwrap();
    let report = compose(&doc, &ReportConfig::default());

    let arch = report
        .pages
        .iter()
        .find(|p| p.heading.as_deref().is_some_and(|h| h.ends_with("Technical Architecture")))
        .expect("architecture page");
    let security = sections(arch)
        .iter()
        .find(|s| s.title == "Security Considerations")
        .expect("security section");
    assert!(security.blocks.is_empty());

    let stack = sections(arch)
        .iter()
        .find(|s| s.title == "Technology Stack")
        .unwrap();
    assert_eq!(
        stack.blocks,
        vec![Block::KeyValue {
            label: "Frontend".into(),
            value: " React".into()
        }]
    );
}

#[test]
fn no_analysis_means_no_report() {
    assert!(compose_report(&client(), None, &ReportConfig::default(), date()).is_none());
}

#[test]
fn filenames_collapse_whitespace() {
    let expected = "Talentronaut_Project_Analysis_Alex_Morgan.pdf";
    assert_eq!(export_filename("Talentronaut", "Alex Morgan"), expected);
    assert_eq!(export_filename("Talentronaut", "Alex   Morgan"), expected);
}

// ── Export ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn export_produces_one_pdf_page_per_report_page() {
    let config = ReportConfig::default();
    let input = sample_report();
    let report = compose(input.analysis.as_ref().unwrap(), &config);
    let stub = StubRasterizer::new(None);
    let exporter = PdfExporter::new(stub.clone(), config);

    let bytes = exporter.export(&report).await.unwrap();
    assert!(bytes.starts_with(b"%PDF"));
    let text = String::from_utf8_lossy(&bytes);
    assert!(text.contains(&format!("/Count {}", report.page_count())));
    assert_eq!(stub.calls.load(Ordering::SeqCst), report.page_count());
    assert!(!exporter.is_exporting());
}

#[tokio::test]
async fn failing_page_aborts_the_whole_export() {
    let config = ReportConfig::default();
    let input = sample_report();
    let report = compose(input.analysis.as_ref().unwrap(), &config);
    assert!(report.page_count() >= 3);
    let stub = StubRasterizer::new(Some(3));
    let exporter = PdfExporter::new(stub.clone(), config);

    let err = exporter.export(&report).await.unwrap_err();
    assert!(matches!(err, ProposalError::RasterisationFailed { page: 3, .. }));
    assert_eq!(err.user_message(), "Failed to export PDF. Please try again.");
    assert_eq!(stub.calls.load(Ordering::SeqCst), 3);
    assert!(!exporter.is_exporting());

    // The flag was released: a retry with a healthy rasteriser succeeds.
    let retry = PdfExporter::new(StubRasterizer::new(None), ReportConfig::default());
    assert!(retry.export(&report).await.is_ok());
}

#[tokio::test]
async fn session_payload_feeds_the_exporter() {
    let dir = tempfile::tempdir().unwrap();
    let store = SessionStore::new(dir.path().join("session"));
    store.save_report_input(&sample_report()).await.unwrap();

    let config = ReportConfig::builder().fallback_delay_ms(0).build().unwrap();
    let loaded = load_report_input(&store, &config).await;
    assert_eq!(loaded.origin, ReportOrigin::Session);

    let report = compose_report(
        &loaded.input.client,
        loaded.input.analysis.as_ref(),
        &config,
        date(),
    )
    .unwrap();
    let exporter = PdfExporter::new(StubRasterizer::new(None), config);
    let path = exporter.export_to_file(&report, dir.path()).await.unwrap();
    assert_eq!(path.file_name().unwrap().to_string_lossy(), report.filename);
    assert!(std::fs::read(&path).unwrap().starts_with(b"%PDF"));
}

#[tokio::test]
async fn layout_rasterizer_paints_every_page() {
    let config = ReportConfig::builder().pixel_ratio(1.0).build().unwrap();
    let rasterizer = match LayoutRasterizer::from_config(&config) {
        Ok(r) => r,
        Err(e) => {
            println!("SKIP — {e}");
            return;
        }
    };
    let input = sample_report();
    let report = compose(input.analysis.as_ref().unwrap(), &config);
    let exporter = PdfExporter::new(Arc::new(rasterizer), config);
    let bytes = exporter.export(&report).await.unwrap();
    assert!(bytes.starts_with(b"%PDF"));
}
