//! Streaming rasterisation: emit page images as they are captured.
//!
//! ## Why stream?
//!
//! A full export holds every page image in memory until assembly. A
//! preview, a thumbnail strip or a caller writing PNGs to disk wants each
//! page as soon as it exists instead. [`raster_stream`] yields one
//! `(page_number, image)` per page, always in composition order: pages are
//! captured with `then`, one at a time, never with `buffer_unordered`.
//!
//! The stream does not take the exporter's in-flight flag; it is read-only
//! over the report and may run next to an export.

use crate::config::ReportConfig;
use crate::error::ProposalError;
use crate::pipeline::compose::ComposedReport;
use crate::pipeline::raster::{CaptureOptions, PageRasterizer};
use futures::stream::{self, StreamExt};
use image::RgbaImage;
use std::pin::Pin;
use std::sync::Arc;
use tokio_stream::Stream;
use tracing::debug;

/// A boxed stream of captured pages.
pub type PageImageStream<'a> =
    Pin<Box<dyn Stream<Item = Result<(usize, RgbaImage), ProposalError>> + Send + 'a>>;

/// Rasterise `report` page by page.
///
/// A failing page is yielded as an `Err`; later pages are still attempted,
/// so a caller that wants all-or-nothing should stop at the first error.
pub fn raster_stream<'a>(
    rasterizer: Arc<dyn PageRasterizer>,
    report: &'a ComposedReport,
    config: &ReportConfig,
) -> PageImageStream<'a> {
    let opts = Arc::new(CaptureOptions::new(config, report));
    let total = report.page_count();

    let s = stream::iter(report.pages.iter()).then(move |page| {
        let rasterizer = Arc::clone(&rasterizer);
        let opts = Arc::clone(&opts);
        async move {
            let img = rasterizer.capture(page, &opts).await?;
            debug!("Streamed page {}/{}", page.number, total);
            Ok((page.number, img))
        }
    });
    Box::pin(s)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::sample_report;
    use crate::pipeline::compose::{compose_report, PageDescriptor};
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use image::Rgba;

    struct FailOn(usize);

    #[async_trait]
    impl PageRasterizer for FailOn {
        async fn capture(
            &self,
            page: &PageDescriptor,
            _options: &CaptureOptions,
        ) -> Result<RgbaImage, ProposalError> {
            if page.number == self.0 {
                return Err(ProposalError::RasterisationFailed {
                    page: page.number,
                    detail: "stub".into(),
                });
            }
            Ok(RgbaImage::from_pixel(4, 4, Rgba([0, 0, 0, 255])))
        }
    }

    #[tokio::test]
    async fn pages_arrive_in_order() {
        let input = sample_report();
        let config = ReportConfig::default();
        let date = NaiveDate::from_ymd_opt(2026, 10, 16).unwrap();
        let report = compose_report(&input.client, input.analysis.as_ref(), &config, date).unwrap();

        let results: Vec<_> = raster_stream(Arc::new(FailOn(2)), &report, &config)
            .collect()
            .await;
        assert_eq!(results.len(), report.page_count());
        assert!(matches!(results[1], Err(ProposalError::RasterisationFailed { page: 2, .. })));
        let numbers: Vec<usize> = results
            .iter()
            .filter_map(|r| r.as_ref().ok().map(|(n, _)| *n))
            .collect();
        assert_eq!(numbers[0], 1);
        assert!(numbers.windows(2).all(|w| w[0] < w[1]));
    }
}
