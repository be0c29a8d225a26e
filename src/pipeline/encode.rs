//! Image attachments → base64 `ImageData` for the analysis request.
//!
//! Screenshots and phone photos routinely exceed what a vision model needs.
//! Anything with an edge longer than [`MAX_IMAGE_EDGE`] is downscaled and
//! re-encoded as PNG; smaller images are forwarded byte-for-byte.

use crate::error::ProposalError;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use edgequake_llm::ImageData;
use image::imageops::FilterType;
use image::GenericImageView;
use std::io::Cursor;
use std::path::PathBuf;
use tracing::debug;

/// Longest edge forwarded to the model, in pixels.
pub const MAX_IMAGE_EDGE: u32 = 2048;

/// Encode an image attachment. `mime` is the declared type and is kept
/// unless the image has to be re-encoded.
pub fn encode_attachment_image(
    name: &str,
    bytes: &[u8],
    mime: &str,
) -> Result<ImageData, ProposalError> {
    let unreadable = |detail: String| ProposalError::AttachmentUnreadable {
        path: PathBuf::from(name),
        detail,
    };

    let img = image::load_from_memory(bytes).map_err(|e| unreadable(e.to_string()))?;
    let (w, h) = img.dimensions();

    let (payload, mime) = if w.max(h) > MAX_IMAGE_EDGE {
        let scaled = img.resize(MAX_IMAGE_EDGE, MAX_IMAGE_EDGE, FilterType::Triangle);
        let mut buf = Vec::new();
        scaled
            .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
            .map_err(|e| unreadable(e.to_string()))?;
        debug!(
            "Downscaled {name} from {w}x{h} to {}x{}",
            scaled.width(),
            scaled.height()
        );
        (buf, "image/png")
    } else {
        (bytes.to_vec(), mime)
    };

    let b64 = STANDARD.encode(&payload);
    debug!("Encoded {name} → {} bytes base64", b64.len());
    Ok(ImageData::new(b64, mime).with_detail("high"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, Rgba, RgbaImage};

    fn png(w: u32, h: u32) -> Vec<u8> {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(w, h, Rgba([255, 0, 0, 255])));
        let mut buf = Vec::new();
        img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
            .unwrap();
        buf
    }

    #[test]
    fn small_image_is_forwarded_verbatim() {
        let bytes = png(10, 10);
        let data = encode_attachment_image("sketch.png", &bytes, "image/png").unwrap();
        assert_eq!(data.mime_type, "image/png");
        assert_eq!(STANDARD.decode(&data.data).unwrap(), bytes);
    }

    #[test]
    fn large_image_is_downscaled() {
        let bytes = png(MAX_IMAGE_EDGE * 2, 16);
        let data = encode_attachment_image("wide.jpg", &bytes, "image/jpeg").unwrap();
        assert_eq!(data.mime_type, "image/png");
        let decoded = image::load_from_memory(&STANDARD.decode(&data.data).unwrap()).unwrap();
        assert_eq!(decoded.width(), MAX_IMAGE_EDGE);
    }

    #[test]
    fn garbage_is_unreadable() {
        let err = encode_attachment_image("x.png", b"not an image", "image/png").unwrap_err();
        assert!(matches!(err, ProposalError::AttachmentUnreadable { .. }));
    }
}
