//! Image encoding: `DynamicImage` → `data:image/png;base64,…` URI.
//!
//! Embedding images inline keeps the output a single self-contained file.
//! PNG is lossless, so line art and text inside figures stay crisp.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::{imageops::FilterType, DynamicImage};
use std::io::Cursor;
use tracing::debug;

/// Encode an image as a PNG data URI, downscaling so neither edge exceeds
/// `max_pixels`.
pub fn encode_data_uri(img: &DynamicImage, max_pixels: u32) -> Result<String, image::ImageError> {
    let scaled;
    let img = if img.width() > max_pixels || img.height() > max_pixels {
        scaled = img.resize(max_pixels, max_pixels, FilterType::Triangle);
        debug!(
            "Downscaled image {}x{} → {}x{}",
            img.width(),
            img.height(),
            scaled.width(),
            scaled.height()
        );
        &scaled
    } else {
        img
    };

    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)?;

    let b64 = STANDARD.encode(&buf);
    debug!("Encoded image → {} bytes base64", b64.len());

    Ok(format!("data:image/png;base64,{b64}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    fn solid(w: u32, h: u32) -> DynamicImage {
        DynamicImage::ImageRgba8(RgbaImage::from_pixel(w, h, Rgba([255, 0, 0, 255])))
    }

    fn decode(uri: &str) -> DynamicImage {
        let b64 = uri.strip_prefix("data:image/png;base64,").expect("png data uri");
        let bytes = STANDARD.decode(b64).expect("valid base64");
        image::load_from_memory(&bytes).expect("valid png")
    }

    #[test]
    fn encode_small_image() {
        let uri = encode_data_uri(&solid(10, 10), 4096).expect("encode should succeed");
        let back = decode(&uri);
        assert_eq!((back.width(), back.height()), (10, 10));
    }

    #[test]
    fn large_image_is_downscaled_keeping_aspect() {
        let uri = encode_data_uri(&solid(400, 200), 100).unwrap();
        let back = decode(&uri);
        assert_eq!((back.width(), back.height()), (100, 50));
    }
}
