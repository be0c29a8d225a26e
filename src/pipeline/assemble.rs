//! PDF assembly: page images → A4 PDF bytes.
//!
//! One page per image, in order. Each image is flattened onto white,
//! Flate-compressed and placed top-left, scaled to the full page width with
//! its aspect ratio kept. A capture taller than A4 runs off the bottom edge.

use crate::error::ProposalError;
use image::RgbaImage;
use pdf_writer::{Content, Filter, Finish, Name, Pdf, Rect, Ref, TextStr};
use tracing::debug;

/// A4 width in points.
pub const A4_WIDTH_PT: f32 = 595.28;
/// A4 height in points.
pub const A4_HEIGHT_PT: f32 = 841.89;

const IMAGE_NAME: &[u8] = b"Im1";

/// RGB bytes of `img` composited over white.
pub fn flatten_on_white(img: &RgbaImage) -> Vec<u8> {
    img.pixels()
        .flat_map(|p| {
            let a = p[3] as u16;
            let over = |c: u8| ((c as u16 * a + 255 * (255 - a) + 127) / 255) as u8;
            [over(p[0]), over(p[1]), over(p[2])]
        })
        .collect()
}

/// Where an image of `px_w`×`px_h` lands on the page: `(width, height, y)`
/// in points, with `y` the bottom edge in PDF coordinates.
pub fn placement(px_w: u32, px_h: u32) -> (f32, f32, f32) {
    let w = A4_WIDTH_PT;
    let h = px_h as f32 * A4_WIDTH_PT / px_w.max(1) as f32;
    (w, h, A4_HEIGHT_PT - h)
}

/// Assemble page images into a PDF titled `title`.
pub fn assemble_pdf(images: &[RgbaImage], title: &str) -> Result<Vec<u8>, ProposalError> {
    if images.is_empty() {
        return Err(ProposalError::PdfAssemblyFailed {
            detail: "no pages to assemble".into(),
        });
    }
    if let Some((i, _)) = images
        .iter()
        .enumerate()
        .find(|(_, img)| img.width() == 0 || img.height() == 0)
    {
        return Err(ProposalError::PdfAssemblyFailed {
            detail: format!("page {} has an empty image", i + 1),
        });
    }

    let mut next_id = 1;
    let mut alloc = || {
        let r = Ref::new(next_id);
        next_id += 1;
        r
    };

    let mut pdf = Pdf::new();
    let catalog_id = alloc();
    let pages_id = alloc();
    let info_id = alloc();

    let mut page_ids = Vec::with_capacity(images.len());
    for img in images {
        let page_id = alloc();
        let image_id = alloc();
        let content_id = alloc();
        page_ids.push(page_id);

        let (w, h) = img.dimensions();
        let compressed = miniz_oxide::deflate::compress_to_vec_zlib(&flatten_on_white(img), 6);
        let mut xobj = pdf.image_xobject(image_id, &compressed);
        xobj.filter(Filter::FlateDecode);
        xobj.width(w as i32);
        xobj.height(h as i32);
        xobj.color_space().device_rgb();
        xobj.bits_per_component(8);
        xobj.finish();

        let (render_w, render_h, y) = placement(w, h);
        let mut content = Content::new();
        content.save_state();
        content.transform([render_w, 0.0, 0.0, render_h, 0.0, y]);
        content.x_object(Name(IMAGE_NAME));
        content.restore_state();
        pdf.stream(content_id, &content.finish());

        let mut page = pdf.page(page_id);
        page.media_box(Rect::new(0.0, 0.0, A4_WIDTH_PT, A4_HEIGHT_PT))
            .parent(pages_id)
            .contents(content_id);
        page.resources().x_objects().pair(Name(IMAGE_NAME), image_id);
        page.finish();
    }

    pdf.catalog(catalog_id).pages(pages_id);
    pdf.pages(pages_id)
        .kids(page_ids.iter().copied())
        .count(page_ids.len() as i32);
    pdf.document_info(info_id)
        .title(TextStr(title))
        .producer(TextStr(concat!("proposal-pdf ", env!("CARGO_PKG_VERSION"))));

    let bytes = pdf.finish();
    debug!("Assembled {} pages into {} bytes", images.len(), bytes.len());
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn page(w: u32, h: u32) -> RgbaImage {
        RgbaImage::from_pixel(w, h, Rgba([255, 252, 251, 255]))
    }

    #[test]
    fn assembles_one_page_per_image() {
        let pdf = assemble_pdf(&[page(40, 56), page(40, 56), page(40, 56)], "Proposal").unwrap();
        assert!(pdf.starts_with(b"%PDF-"));
        let text = String::from_utf8_lossy(&pdf);
        assert!(text.contains("/Count 3"));
        assert_eq!(text.matches("/MediaBox").count(), 3);
    }

    #[test]
    fn empty_input_is_an_error() {
        let err = assemble_pdf(&[], "x").unwrap_err();
        assert!(matches!(err, ProposalError::PdfAssemblyFailed { .. }));
    }

    #[test]
    fn transparent_pixels_become_white() {
        let mut img = RgbaImage::from_pixel(2, 1, Rgba([0, 0, 0, 0]));
        img.put_pixel(1, 0, Rgba([10, 20, 30, 255]));
        assert_eq!(flatten_on_white(&img), vec![255, 255, 255, 10, 20, 30]);
    }

    #[test]
    fn a4_capture_fills_the_page_from_the_top() {
        let (w, h, y) = placement(1588, 2246);
        assert_eq!(w, A4_WIDTH_PT);
        assert!((h - A4_HEIGHT_PT).abs() < 1.0, "height {h}");
        assert!((y + h - A4_HEIGHT_PT).abs() < 1e-3);
    }
}
