//! Export pipeline: composed report → PDF bytes.
//!
//! Pages are rasterised strictly one after another in composition order,
//! then assembled into one A4 PDF. The export is all-or-nothing: the first
//! failing page aborts the run and no bytes are produced.
//!
//! One [`PdfExporter`] runs one export at a time. A second call while one
//! is in flight is rejected with [`ProposalError::ExportInProgress`] rather
//! than queued; the in-flight flag is released by a drop guard, so every
//! exit path clears it, including errors and a dropped future.

use crate::config::ReportConfig;
use crate::error::ProposalError;
use crate::pipeline::assemble::assemble_pdf;
use crate::pipeline::compose::ComposedReport;
use crate::pipeline::raster::{CaptureOptions, LayoutRasterizer, PageRasterizer};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// `<Brand>_Project_Analysis_<ClientName>.pdf`, whitespace runs collapsed
/// to `_`.
pub fn export_filename(brand: &str, client_name: &str) -> String {
    let collapse = |s: &str| s.split_whitespace().collect::<Vec<_>>().join("_");
    format!(
        "{}_Project_Analysis_{}.pdf",
        collapse(brand),
        collapse(client_name)
    )
}

/// Clears the exporting flag when dropped.
struct ExportGuard<'a>(&'a AtomicBool);

impl Drop for ExportGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Rasterises composed reports and assembles them into PDFs.
pub struct PdfExporter {
    rasterizer: Arc<dyn PageRasterizer>,
    config: ReportConfig,
    exporting: AtomicBool,
}

impl PdfExporter {
    pub fn new(rasterizer: Arc<dyn PageRasterizer>, config: ReportConfig) -> Self {
        Self {
            rasterizer,
            config,
            exporting: AtomicBool::new(false),
        }
    }

    /// An exporter using the built-in [`LayoutRasterizer`].
    pub fn with_layout_rasterizer(config: ReportConfig) -> Result<Self, ProposalError> {
        let rasterizer = LayoutRasterizer::from_config(&config)?;
        Ok(Self::new(Arc::new(rasterizer), config))
    }

    pub fn config(&self) -> &ReportConfig {
        &self.config
    }

    pub fn rasterizer(&self) -> Arc<dyn PageRasterizer> {
        Arc::clone(&self.rasterizer)
    }

    /// True while an export is running.
    pub fn is_exporting(&self) -> bool {
        self.exporting.load(Ordering::Acquire)
    }

    fn begin(&self) -> Result<ExportGuard<'_>, ProposalError> {
        self.exporting
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| ExportGuard(&self.exporting))
            .map_err(|_| ProposalError::ExportInProgress)
    }

    /// Export when there is a report; [`ProposalError::NoReport`] otherwise.
    pub async fn export_report(
        &self,
        report: Option<&ComposedReport>,
    ) -> Result<Vec<u8>, ProposalError> {
        match report {
            Some(report) => self.export(report).await,
            None => Err(ProposalError::NoReport),
        }
    }

    /// Rasterise every page in order and assemble the PDF.
    pub async fn export(&self, report: &ComposedReport) -> Result<Vec<u8>, ProposalError> {
        let _guard = self.begin()?;
        let start = Instant::now();
        let total = report.page_count();
        let cb = self.config.progress_callback.as_ref();
        info!("Exporting {} ({} pages)", report.filename, total);

        if total == 0 {
            return Err(ProposalError::NoReport);
        }
        if let Some(cb) = cb {
            cb.on_export_start(total);
        }

        let opts = CaptureOptions::new(&self.config, report);
        let mut images = Vec::with_capacity(total);
        for page in &report.pages {
            if let Some(cb) = cb {
                cb.on_page_start(page.number, total);
            }
            let captured = self
                .rasterizer
                .capture(page, &opts)
                .await
                .and_then(|img| {
                    if img.width() == 0 || img.height() == 0 {
                        Err(ProposalError::RasterisationFailed {
                            page: page.number,
                            detail: "empty capture".into(),
                        })
                    } else {
                        Ok(img)
                    }
                });
            match captured {
                Ok(img) => {
                    debug!(
                        "Page {}/{} captured at {}x{}",
                        page.number,
                        total,
                        img.width(),
                        img.height()
                    );
                    if let Some(cb) = cb {
                        cb.on_page_complete(page.number, total, (img.width() * img.height()) as usize);
                    }
                    images.push(img);
                }
                Err(e) => {
                    warn!("Export aborted at page {}/{}: {}", page.number, total, e);
                    if let Some(cb) = cb {
                        cb.on_page_error(page.number, total, &e.to_string());
                    }
                    return Err(e);
                }
            }
        }

        let title = report
            .filename
            .trim_end_matches(".pdf")
            .replace('_', " ");
        let bytes = tokio::task::spawn_blocking(move || assemble_pdf(&images, &title))
            .await
            .map_err(|e| ProposalError::Internal(format!("PDF assembly task panicked: {e}")))??;

        info!(
            "Exported {} pages → {} bytes in {:?}",
            total,
            bytes.len(),
            start.elapsed()
        );
        if let Some(cb) = cb {
            cb.on_export_complete(total, bytes.len());
        }
        Ok(bytes)
    }

    /// Export and write the PDF to `path` atomically (temp file + rename).
    ///
    /// When `path` is an existing directory, the report's filename is
    /// appended.
    pub async fn export_to_file(
        &self,
        report: &ComposedReport,
        path: impl AsRef<Path>,
    ) -> Result<PathBuf, ProposalError> {
        let mut path = path.as_ref().to_path_buf();
        if path.is_dir() {
            path.push(&report.filename);
        }
        let bytes = self.export(report).await?;
        write_atomic(&path, &bytes).await?;
        info!("Wrote {}", path.display());
        Ok(path)
    }
}

/// Write `bytes` to `path` via a sibling temp file and a rename.
pub(crate) async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), ProposalError> {
    let write_failed = |source: std::io::Error| ProposalError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(write_failed)?;
    }
    let mut tmp_name = path.as_os_str().to_os_string();
    tmp_name.push(".tmp");
    let tmp_path = PathBuf::from(tmp_name);
    tokio::fs::write(&tmp_path, bytes).await.map_err(write_failed)?;
    tokio::fs::rename(&tmp_path, path).await.map_err(write_failed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::sample_report;
    use crate::pipeline::compose::{compose_report, PageDescriptor};
    use crate::progress::ExportProgressCallback;
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use image::{Rgba, RgbaImage};
    use std::sync::atomic::AtomicUsize;
    use std::sync::Mutex;
    use tokio::time::{sleep, Duration};

    /// Small solid pages; fails on `fail_on` and sleeps `delay_ms` per page.
    #[derive(Default)]
    struct StubRasterizer {
        fail_on: Option<usize>,
        delay_ms: u64,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl PageRasterizer for StubRasterizer {
        async fn capture(
            &self,
            page: &PageDescriptor,
            _options: &CaptureOptions,
        ) -> Result<RgbaImage, ProposalError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.delay_ms > 0 {
                sleep(Duration::from_millis(self.delay_ms)).await;
            }
            if self.fail_on == Some(page.number) {
                return Err(ProposalError::RasterisationFailed {
                    page: page.number,
                    detail: "stub failure".into(),
                });
            }
            Ok(RgbaImage::from_pixel(20, 28, Rgba([255, 255, 255, 255])))
        }
    }

    #[derive(Default)]
    struct Recorder(Mutex<Vec<String>>);

    impl ExportProgressCallback for Recorder {
        fn on_export_start(&self, total_pages: usize) {
            self.0.lock().unwrap().push(format!("start {total_pages}"));
        }
        fn on_page_complete(&self, page_num: usize, _total: usize, _pixels: usize) {
            self.0.lock().unwrap().push(format!("page {page_num}"));
        }
        fn on_page_error(&self, page_num: usize, _total: usize, _error: &str) {
            self.0.lock().unwrap().push(format!("error {page_num}"));
        }
        fn on_export_complete(&self, total_pages: usize, _pdf_bytes: usize) {
            self.0.lock().unwrap().push(format!("done {total_pages}"));
        }
    }

    fn report() -> ComposedReport {
        let input = sample_report();
        let date = NaiveDate::from_ymd_opt(2026, 10, 16).unwrap();
        compose_report(&input.client, input.analysis.as_ref(), &ReportConfig::default(), date)
            .unwrap()
    }

    #[test]
    fn filename_collapses_whitespace() {
        assert_eq!(
            export_filename("Talentronaut", "Alex Morgan"),
            "Talentronaut_Project_Analysis_Alex_Morgan.pdf"
        );
        assert_eq!(
            export_filename("Talentronaut", "  Alex   Morgan "),
            "Talentronaut_Project_Analysis_Alex_Morgan.pdf"
        );
    }

    #[tokio::test]
    async fn exports_every_page_in_order() {
        let rec = Arc::new(Recorder::default());
        let config = ReportConfig::builder()
            .progress_callback(rec.clone())
            .build()
            .unwrap();
        let stub = Arc::new(StubRasterizer::default());
        let exporter = PdfExporter::new(stub.clone(), config);
        let report = report();

        let pdf = exporter.export(&report).await.unwrap();
        assert!(pdf.starts_with(b"%PDF-"));
        assert_eq!(stub.calls.load(Ordering::SeqCst), report.page_count());
        assert!(!exporter.is_exporting());

        let events = rec.0.lock().unwrap().clone();
        let n = report.page_count();
        assert_eq!(events.first().unwrap(), &format!("start {n}"));
        assert_eq!(events.last().unwrap(), &format!("done {n}"));
        let pages: Vec<String> = (1..=n).map(|i| format!("page {i}")).collect();
        assert_eq!(&events[1..=n], pages.as_slice());
    }

    #[tokio::test]
    async fn failure_on_page_three_of_seven_yields_nothing() {
        let rec = Arc::new(Recorder::default());
        let config = ReportConfig::builder()
            .progress_callback(rec.clone())
            .build()
            .unwrap();
        let stub = Arc::new(StubRasterizer {
            fail_on: Some(3),
            ..Default::default()
        });
        let exporter = PdfExporter::new(stub.clone(), config);
        let mut report = report();
        report.pages.truncate(7);

        let err = exporter.export(&report).await.unwrap_err();
        assert!(matches!(err, ProposalError::RasterisationFailed { page: 3, .. }));
        assert_eq!(stub.calls.load(Ordering::SeqCst), 3);
        assert!(!exporter.is_exporting());
        let events = rec.0.lock().unwrap().clone();
        assert_eq!(events.last().unwrap(), "error 3");
        assert!(!events.iter().any(|e| e.starts_with("done")));
    }

    #[tokio::test]
    async fn concurrent_export_is_rejected_not_queued() {
        let stub = Arc::new(StubRasterizer {
            delay_ms: 30,
            ..Default::default()
        });
        let exporter = Arc::new(PdfExporter::new(stub, ReportConfig::default()));
        let report = Arc::new(report());

        let first = {
            let exporter = Arc::clone(&exporter);
            let report = Arc::clone(&report);
            tokio::spawn(async move { exporter.export(&report).await })
        };
        sleep(Duration::from_millis(10)).await;

        assert!(exporter.is_exporting());
        let second = exporter.export(&report).await;
        assert!(matches!(second, Err(ProposalError::ExportInProgress)));

        assert!(first.await.unwrap().is_ok());
        assert!(!exporter.is_exporting());
    }

    #[tokio::test]
    async fn missing_report_is_no_report() {
        let exporter = PdfExporter::new(Arc::new(StubRasterizer::default()), ReportConfig::default());
        assert!(matches!(
            exporter.export_report(None).await,
            Err(ProposalError::NoReport)
        ));
        assert!(!exporter.is_exporting());
    }

    #[tokio::test]
    async fn export_to_directory_uses_report_filename() {
        let dir = tempfile::tempdir().unwrap();
        let exporter = PdfExporter::new(Arc::new(StubRasterizer::default()), ReportConfig::default());
        let path = exporter.export_to_file(&report(), dir.path()).await.unwrap();
        assert_eq!(
            path.file_name().unwrap(),
            "Talentronaut_Project_Analysis_Alex_Morgan.pdf"
        );
        let bytes = std::fs::read(&path).unwrap();
        assert!(bytes.starts_with(b"%PDF-"));
        assert!(!path.with_extension("pdf.tmp").exists());
    }
}
