//! The encode seam: one quality-parameterized attempt at serializing a
//! rendered surface.
//!
//! [`SurfaceEncoder`] is the single interface the quality search talks to —
//! it sees only `attempt(surface, mime, quality) → bytes`, so alternative
//! search policies (or a mock for tests) can be substituted without touching
//! the rest of the pipeline.
//!
//! The production implementation is [`RasterEncoder`]:
//!
//! | Output MIME | Crate / encoder |
//! |---|---|
//! | `image/jpeg` | `image::codecs::jpeg::JpegEncoder` (quality 1–100) |
//! | `image/webp` | `webp` (libwebp, lossy, quality 0–100) |
//! | `image/png` | `image` PNG encoder (quality parameter ignored) |

use crate::mime::{MIME_JPEG, MIME_PNG, MIME_WEBP};
use image::{DynamicImage, ImageEncoder};
use std::io::Cursor;
use thiserror::Error;

/// An encode attempt produced no usable output. Fatal to the call.
#[derive(Error, Debug)]
#[error("{0}")]
pub struct EncodeError(pub String);

/// One encode attempt. Quality is in `[0, 1]`; formats without a quality
/// parameter ignore it.
pub trait SurfaceEncoder: Sync {
    fn encode(
        &self,
        surface: &DynamicImage,
        mime: &str,
        quality: f32,
    ) -> Result<Vec<u8>, EncodeError>;
}

/// Production encoder backed by the `image` and `webp` crates.
pub struct RasterEncoder;

impl RasterEncoder {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RasterEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl SurfaceEncoder for RasterEncoder {
    fn encode(
        &self,
        surface: &DynamicImage,
        mime: &str,
        quality: f32,
    ) -> Result<Vec<u8>, EncodeError> {
        let quality = quality.clamp(0.0, 1.0);
        if mime.eq_ignore_ascii_case(MIME_JPEG) {
            encode_jpeg(surface, quality)
        } else if mime.eq_ignore_ascii_case(MIME_WEBP) {
            encode_webp(surface, quality)
        } else if mime.eq_ignore_ascii_case(MIME_PNG) {
            encode_png(surface)
        } else {
            Err(EncodeError(format!("unsupported output format: {mime}")))
        }
    }
}

fn encode_jpeg(surface: &DynamicImage, quality: f32) -> Result<Vec<u8>, EncodeError> {
    // JPEG has no alpha channel; flatten before encoding
    let rgb = surface.to_rgb8();
    let mut bytes = Vec::new();
    let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(
        Cursor::new(&mut bytes),
        (quality * 100.0).round().clamp(1.0, 100.0) as u8,
    );
    encoder
        .write_image(
            rgb.as_raw(),
            rgb.width(),
            rgb.height(),
            image::ExtendedColorType::Rgb8,
        )
        .map_err(|e| EncodeError(format!("JPEG encode failed: {e}")))?;
    Ok(bytes)
}

fn encode_webp(surface: &DynamicImage, quality: f32) -> Result<Vec<u8>, EncodeError> {
    let rgba = surface.to_rgba8();
    let encoder = webp::Encoder::from_rgba(&rgba, rgba.width(), rgba.height());
    // encode_simple, not encode: the latter unwraps internally and panics on
    // libwebp failures such as a dimension over the 16383 format limit
    let encoded = encoder
        .encode_simple(false, quality * 100.0)
        .map_err(|e| EncodeError(format!("WebP encode failed: {e:?}")))?;
    Ok(encoded.to_vec())
}

fn encode_png(surface: &DynamicImage) -> Result<Vec<u8>, EncodeError> {
    let mut bytes = Vec::new();
    surface
        .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
        .map_err(|e| EncodeError(format!("PNG encode failed: {e}")))?;
    Ok(bytes)
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Mock encoder that fabricates payloads of scripted sizes.
    ///
    /// Sizes are consumed front-to-back per attempt; the last one repeats.
    /// Uses Mutex (not RefCell) so it stays Sync like the production encoder.
    pub struct MockEncoder {
        sizes: Mutex<Vec<usize>>,
        attempts: Mutex<Vec<(String, f32)>>,
    }

    impl MockEncoder {
        pub fn with_sizes(sizes: Vec<usize>) -> Self {
            Self {
                sizes: Mutex::new(sizes),
                attempts: Mutex::new(Vec::new()),
            }
        }

        /// An encoder that always yields zero bytes — drives the
        /// no-usable-output failure path.
        pub fn empty_output() -> Self {
            Self::with_sizes(vec![0])
        }

        /// Every `(mime, quality)` pair attempted, in order.
        pub fn attempts(&self) -> Vec<(String, f32)> {
            self.attempts.lock().unwrap().clone()
        }
    }

    impl SurfaceEncoder for MockEncoder {
        fn encode(
            &self,
            _surface: &DynamicImage,
            mime: &str,
            quality: f32,
        ) -> Result<Vec<u8>, EncodeError> {
            self.attempts
                .lock()
                .unwrap()
                .push((mime.to_string(), quality));

            let mut sizes = self.sizes.lock().unwrap();
            let size = if sizes.len() > 1 {
                sizes.remove(0)
            } else {
                sizes.first().copied().unwrap_or(0)
            };
            Ok(vec![0u8; size])
        }
    }

    /// Deterministic high-detail surface — compresses poorly, so quality
    /// differences show up in output size.
    fn noisy_surface(width: u32, height: u32) -> DynamicImage {
        let img = image::RgbImage::from_fn(width, height, |x, y| {
            let v = x.wrapping_mul(31).wrapping_add(y.wrapping_mul(17));
            image::Rgb([(v % 256) as u8, ((v / 3) % 256) as u8, ((v / 7) % 256) as u8])
        });
        DynamicImage::ImageRgb8(img)
    }

    #[test]
    fn jpeg_lower_quality_is_smaller() {
        let surface = noisy_surface(128, 128);
        let encoder = RasterEncoder::new();
        let high = encoder.encode(&surface, "image/jpeg", 0.9).unwrap();
        let low = encoder.encode(&surface, "image/jpeg", 0.1).unwrap();
        assert!(!high.is_empty());
        assert!(low.len() < high.len());
    }

    #[test]
    fn jpeg_output_is_decodable() {
        let surface = noisy_surface(64, 48);
        let bytes = RasterEncoder::new()
            .encode(&surface, "image/jpeg", 0.82)
            .unwrap();
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!(decoded.width(), 64);
        assert_eq!(decoded.height(), 48);
    }

    #[test]
    fn webp_lower_quality_is_smaller() {
        let surface = noisy_surface(128, 128);
        let encoder = RasterEncoder::new();
        let high = encoder.encode(&surface, "image/webp", 0.9).unwrap();
        let low = encoder.encode(&surface, "image/webp", 0.1).unwrap();
        assert!(!high.is_empty());
        assert!(low.len() < high.len());
    }

    #[test]
    fn png_ignores_quality() {
        let surface = noisy_surface(32, 32);
        let encoder = RasterEncoder::new();
        let a = encoder.encode(&surface, "image/png", 0.82).unwrap();
        let b = encoder.encode(&surface, "image/png", 0.4).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn webp_dimension_over_format_limit_is_an_error_not_a_panic() {
        // libwebp caps each dimension at 16383
        let surface = DynamicImage::ImageRgb8(image::RgbImage::new(16_384, 1));
        let result = RasterEncoder::new().encode(&surface, "image/webp", 0.82);
        assert!(result.is_err());
    }

    #[test]
    fn unsupported_format_errors() {
        let surface = noisy_surface(8, 8);
        let result = RasterEncoder::new().encode(&surface, "image/svg+xml", 0.82);
        assert!(result.is_err());
    }

    #[test]
    fn mock_scripted_sizes_then_repeat() {
        let mock = MockEncoder::with_sizes(vec![100, 50]);
        let surface = noisy_surface(8, 8);
        assert_eq!(mock.encode(&surface, "image/jpeg", 0.82).unwrap().len(), 100);
        assert_eq!(mock.encode(&surface, "image/jpeg", 0.74).unwrap().len(), 50);
        assert_eq!(mock.encode(&surface, "image/jpeg", 0.66).unwrap().len(), 50);
        assert_eq!(mock.attempts().len(), 3);
    }
}
