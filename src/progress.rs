//! Progress-callback trait for per-page export events.
//!
//! Inject an [`Arc<dyn ExportProgressCallback>`] via
//! [`crate::config::ReportConfigBuilder::progress_callback`] to receive
//! events while the exporter rasterises each page.
//!
//! Pages are always rasterised one at a time and in order, so events arrive
//! in page order: `on_export_start`, then `on_page_start` /
//! `on_page_complete` for each page, then `on_export_complete`. A failing
//! page fires `on_page_error` and the export stops there; no
//! `on_export_complete` follows.
//!
//! # Example
//!
//! ```rust
//! use proposal_pdf::{ExportProgressCallback, ReportConfig};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct Counter(AtomicUsize);
//!
//! impl ExportProgressCallback for Counter {
//!     fn on_page_complete(&self, page_num: usize, total_pages: usize, _pixels: usize) {
//!         self.0.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("page {page_num}/{total_pages}");
//!     }
//! }
//!
//! let config = ReportConfig::builder()
//!     .progress_callback(Arc::new(Counter(AtomicUsize::new(0))))
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called by the exporter as it works through the pages.
///
/// All methods default to no-ops; override only what you need.
pub trait ExportProgressCallback: Send + Sync {
    /// Called once before the first page is rasterised.
    fn on_export_start(&self, total_pages: usize) {
        let _ = total_pages;
    }

    /// Called before page `page_num` (1-indexed) is rasterised.
    fn on_page_start(&self, page_num: usize, total_pages: usize) {
        let _ = (page_num, total_pages);
    }

    /// Called after a page has been captured.
    ///
    /// `pixels` is the pixel count of the captured image.
    fn on_page_complete(&self, page_num: usize, total_pages: usize, pixels: usize) {
        let _ = (page_num, total_pages, pixels);
    }

    /// Called when a page fails; the export is abandoned after this.
    fn on_page_error(&self, page_num: usize, total_pages: usize, error: &str) {
        let _ = (page_num, total_pages, error);
    }

    /// Called once after the PDF has been assembled.
    fn on_export_complete(&self, total_pages: usize, pdf_bytes: usize) {
        let _ = (total_pages, pdf_bytes);
    }
}

/// The default when no callback is configured.
pub struct NoopProgressCallback;

impl ExportProgressCallback for NoopProgressCallback {}

/// The type stored in [`crate::config::ReportConfig`].
pub type ProgressCallback = Arc<dyn ExportProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<String>>,
    }

    impl ExportProgressCallback for Recorder {
        fn on_export_start(&self, total_pages: usize) {
            self.events.lock().unwrap().push(format!("start {total_pages}"));
        }

        fn on_page_error(&self, page_num: usize, _total_pages: usize, error: &str) {
            self.events
                .lock()
                .unwrap()
                .push(format!("error {page_num}: {error}"));
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_export_start(7);
        cb.on_page_start(1, 7);
        cb.on_page_complete(1, 7, 1588 * 2246);
        cb.on_page_error(2, 7, "font missing");
        cb.on_export_complete(7, 1024);
    }

    #[test]
    fn overridden_methods_receive_events_others_default() {
        let rec = Recorder::default();
        rec.on_export_start(3);
        rec.on_page_start(1, 3);
        rec.on_page_complete(1, 3, 10);
        rec.on_page_error(2, 3, "boom");
        assert_eq!(
            *rec.events.lock().unwrap(),
            vec!["start 3".to_string(), "error 2: boom".to_string()]
        );
    }

    #[test]
    fn arc_dyn_callback_works() {
        let cb: ProgressCallback = Arc::new(NoopProgressCallback);
        cb.on_export_start(2);
        cb.on_export_complete(2, 99);
    }
}
