//! The compression pipeline: classify → decode → skip-evaluate → plan →
//! render → quality-search → package.
//!
//! One call to [`compress`] takes an arbitrary binary resource and either
//! returns a complete [`CompressionResult`] or fails with a
//! [`CompressError`] — never a half-built result. Per call:
//!
//! ```text
//! Init → Classified ── reject ──→ Done(skip, not-image)
//!   │
//! Decoded → SkipEvaluated ── skip ──→ Done(skip, already-small)
//!   │
//! Planned → Rendered → QualitySearch(≤ 6 encodes) → Done(compressed | size-floor-reached)
//! ```
//!
//! Any decode/render/encode failure is fatal to the call; the caller decides
//! whether to fall back to uploading the original or to reject the upload.
//! `size-floor-reached` is *not* a failure — it says the sweep hit the
//! quality floor while still over budget, which the caller may surface as a
//! soft warning.
//!
//! ## Resource model
//!
//! Decoded and rendered surfaces are local to the call stack and dropped by
//! scope on every exit path — success, skip, error, or cancellation. Calls
//! share no mutable state, so callers may run any number of them in parallel
//! with no coordination (the CLI batch command does exactly that).

use crate::encoder::{EncodeError, RasterEncoder, SurfaceEncoder};
use crate::mime;
use crate::naming;
use crate::orientation::Orientation;
use crate::planning::{self, Dimensions};
use image::DynamicImage;
use image::imageops::FilterType;
use serde::Serialize;
use std::io::Cursor;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::SystemTime;
use thiserror::Error;

/// Default upper bound on the longest edge, in pixels.
pub const DEFAULT_MAX_DIMENSION: u32 = 1920;
/// Default soft byte budget the quality search tries to reach.
pub const DEFAULT_TARGET_BYTES: u64 = 800_000;
/// Default threshold under which (combined with the dimension check)
/// compression is skipped entirely.
pub const DEFAULT_SKIP_BELOW_BYTES: u64 = 500_000;

/// First quality the search encodes at.
pub const INITIAL_QUALITY: f32 = 0.82;
/// Quality floor — the search never goes below this, trading further size
/// reduction for a visual-fidelity floor.
pub const MIN_QUALITY: f32 = 0.4;
/// Linear step the search decrements by. With the bounds above the sweep is
/// at most six encodes, never unbounded.
pub const QUALITY_STEP: f32 = 0.08;

/// Decode guard: refuse to materialize surfaces over this many pixels.
/// Untrusted input can declare enormous dimensions in a tiny header.
const MAX_SOURCE_PIXELS: u64 = 100_000_000;

/// Fatal pipeline errors. None are retried internally; all propagate to the
/// caller with no partial result.
#[derive(Error, Debug)]
pub enum CompressError {
    /// Bytes could not be interpreted as an image (corrupt data, truncated
    /// stream, unsupported subformat, or over the decode guard).
    #[error("failed to decode image: {0}")]
    Decode(String),
    /// A drawing target could not be allocated.
    #[error("failed to allocate render surface: {0}")]
    SurfaceCreation(String),
    /// An encode attempt produced no usable output.
    #[error("failed to encode image: {0}")]
    Encode(#[from] EncodeError),
    /// The caller's cancellation signal fired before an encode attempt.
    #[error("compression canceled")]
    Canceled,
}

/// The input binary resource. Immutable once read.
#[derive(Debug, Clone)]
pub struct SourceImage {
    pub bytes: Vec<u8>,
    /// Declared MIME type — what the caller's upload surface believes this
    /// is. The classifier trusts the declaration; the decoder does not.
    pub mime_type: String,
    pub filename: String,
}

impl SourceImage {
    pub fn new(bytes: Vec<u8>, mime_type: impl Into<String>, filename: impl Into<String>) -> Self {
        Self {
            bytes,
            mime_type: mime_type.into(),
            filename: filename.into(),
        }
    }

    pub fn byte_size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

/// Per-call configuration. No process-wide state beyond the defaults.
#[derive(Debug, Clone)]
pub struct CompressionOptions {
    /// Upper bound on the longest edge, in pixels.
    pub max_dimension: u32,
    /// Soft upper bound the quality search tries to reach.
    pub target_bytes: u64,
    /// Payloads at or under this (when dimensions are also in bounds and no
    /// orientation correction is pending) skip compression entirely.
    pub skip_below_bytes: u64,
    /// Force the output encoding format instead of deriving it from the
    /// source type.
    pub output_mime_type: Option<String>,
    /// Re-apply the EXIF orientation transform when rendering. Off by
    /// default: most modern decode layers auto-correct, and correcting twice
    /// double-rotates portrait images. Enable only when your decode layer
    /// leaves pixels sensor-side-up.
    pub apply_orientation_correction: bool,
}

impl Default for CompressionOptions {
    fn default() -> Self {
        Self {
            max_dimension: DEFAULT_MAX_DIMENSION,
            target_bytes: DEFAULT_TARGET_BYTES,
            skip_below_bytes: DEFAULT_SKIP_BELOW_BYTES,
            output_mime_type: None,
            apply_orientation_correction: false,
        }
    }
}

/// Why the pipeline terminated the way it did. Exactly one applies per call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum CompressionReason {
    /// Declared MIME type is not in the image family; nothing was decoded.
    NotImage,
    /// Dimensions and byte size were already within budget.
    AlreadySmall,
    /// The search found a candidate at or under the byte budget.
    Compressed,
    /// The sweep exhausted its quality steps while still over budget.
    /// A successful, if suboptimal, outcome — not an error.
    SizeFloorReached,
}

impl CompressionReason {
    /// Whether the output bytes are the input bytes, untouched.
    pub fn is_skip(self) -> bool {
        matches!(self, Self::NotImage | Self::AlreadySmall)
    }
}

/// One attempt of the quality search. Transient: superseded by the next
/// attempt or promoted into the final result.
#[derive(Debug, Clone)]
pub struct EncodedCandidate {
    pub bytes: Vec<u8>,
    pub quality_used: f32,
    pub mime_type: String,
}

/// The sole artifact returned to the caller. Never mutated after
/// construction.
#[derive(Debug, Clone)]
pub struct CompressionResult {
    /// The replacement payload. Byte-identical to the input when `skipped`.
    pub bytes: Vec<u8>,
    pub filename: String,
    pub mime_type: String,
    /// Output surface dimensions. `None` only for `not-image`, where
    /// rejection happens before any decode; otherwise both components ≥ 1.
    pub dimensions: Option<Dimensions>,
    pub original_size: u64,
    pub compressed_size: u64,
    pub skipped: bool,
    pub reason: CompressionReason,
    /// Quality of the promoted candidate; `None` when nothing was encoded.
    pub quality_used: Option<f32>,
    /// Fresh modification timestamp set by the packager.
    pub modified_at: SystemTime,
}

/// Cooperative cancellation signal, checked before every encode attempt.
///
/// Clone freely — clones share the flag. Cancellation surfaces as
/// [`CompressError::Canceled`]; transient surfaces are released by scope.
#[derive(Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_canceled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Run the full pipeline with the production encoder and no cancellation.
pub fn compress(
    source: &SourceImage,
    options: &CompressionOptions,
) -> Result<CompressionResult, CompressError> {
    compress_with_encoder(&RasterEncoder::new(), source, options, &CancelToken::new())
}

/// Run the full pipeline against a specific encoder (allows testing the
/// search without real encodes) and an external cancellation signal.
pub fn compress_with_encoder(
    encoder: &impl SurfaceEncoder,
    source: &SourceImage,
    options: &CompressionOptions,
    cancel: &CancelToken,
) -> Result<CompressionResult, CompressError> {
    // Classifier runs before any decode: non-images short-circuit with the
    // input untouched and no decode-failure noise.
    if !mime::is_image_mime(&source.mime_type) {
        return Ok(skip_result(
            source,
            CompressionReason::NotImage,
            None,
            source.filename.clone(),
        ));
    }

    let surface = decode(&source.bytes)?;
    let natural = Dimensions::new(surface.width(), surface.height());

    let orientation = if options.apply_orientation_correction {
        Orientation::read_from_bytes(&source.bytes)
    } else {
        Orientation::Normal
    };

    // Encoding is the expensive step — bail before any render/encode work
    // when the input is already within budget.
    if planning::should_skip(
        natural,
        source.byte_size(),
        options.max_dimension,
        options.skip_below_bytes,
        !orientation.is_normal(),
    ) {
        return Ok(skip_result(
            source,
            CompressionReason::AlreadySmall,
            Some(natural),
            naming::output_filename(&source.filename, &source.mime_type),
        ));
    }

    let target = planning::plan_dimensions(natural, options.max_dimension);
    let rendered = render(&surface, target, orientation)?;
    drop(surface);
    let output_dims = Dimensions::new(rendered.width(), rendered.height());

    let output_mime =
        mime::select_output_mime(&source.mime_type, options.output_mime_type.as_deref());
    let (candidate, reason) =
        quality_search(encoder, &rendered, &output_mime, options.target_bytes, cancel)?;
    drop(rendered);

    let filename = naming::output_filename(&source.filename, &output_mime);
    Ok(CompressionResult {
        compressed_size: candidate.bytes.len() as u64,
        bytes: candidate.bytes,
        filename,
        mime_type: candidate.mime_type,
        dimensions: Some(output_dims),
        original_size: source.byte_size(),
        skipped: false,
        reason,
        quality_used: Some(candidate.quality_used),
        modified_at: SystemTime::now(),
    })
}

fn skip_result(
    source: &SourceImage,
    reason: CompressionReason,
    dimensions: Option<Dimensions>,
    filename: String,
) -> CompressionResult {
    CompressionResult {
        bytes: source.bytes.clone(),
        filename,
        mime_type: source.mime_type.clone(),
        dimensions,
        original_size: source.byte_size(),
        compressed_size: source.byte_size(),
        skipped: true,
        reason,
        quality_used: None,
        modified_at: SystemTime::now(),
    }
}

/// Decode source bytes into a raster surface.
///
/// Header dimensions are read first so oversized declarations are rejected
/// before the full-surface allocation.
fn decode(bytes: &[u8]) -> Result<DynamicImage, CompressError> {
    let reader = image::ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| CompressError::Decode(format!("unrecognized image data: {e}")))?;
    let (width, height) = reader
        .into_dimensions()
        .map_err(|e| CompressError::Decode(format!("could not read image dimensions: {e}")))?;

    let pixels = (width as u64)
        .checked_mul(height as u64)
        .ok_or_else(|| CompressError::Decode("image dimensions overflow".to_string()))?;
    if pixels > MAX_SOURCE_PIXELS {
        return Err(CompressError::Decode(format!(
            "image too large to decode safely: {pixels} pixels (limit {MAX_SOURCE_PIXELS})"
        )));
    }

    image::load_from_memory(bytes)
        .map_err(|e| CompressError::Decode(format!("image decode failed: {e}")))
}

/// Draw the decoded surface at the planned dimensions, applying the
/// orientation transform.
fn render(
    surface: &DynamicImage,
    target: Dimensions,
    orientation: Orientation,
) -> Result<DynamicImage, CompressError> {
    // The draw target is width*height*4 bytes; refuse targets whose size
    // can't be represented before asking the allocator for them.
    (target.width as u64)
        .checked_mul(target.height as u64)
        .and_then(|pixels| pixels.checked_mul(4))
        .ok_or_else(|| {
            CompressError::SurfaceCreation("render target size overflows".to_string())
        })?;

    let natural = Dimensions::new(surface.width(), surface.height());
    let redrawn = if target == natural {
        surface.clone()
    } else {
        surface.resize_exact(target.width, target.height, FilterType::Lanczos3)
    };
    Ok(orientation.apply(redrawn))
}

/// Bounded linear sweep over encode quality.
///
/// Encodes once at [`INITIAL_QUALITY`], then steps down by [`QUALITY_STEP`]
/// (clamped at [`MIN_QUALITY`]) while the candidate exceeds `target_bytes`
/// and quality headroom remains. Each new candidate replaces the previous
/// one; intermediate candidates are never returned.
fn quality_search(
    encoder: &impl SurfaceEncoder,
    surface: &DynamicImage,
    output_mime: &str,
    target_bytes: u64,
    cancel: &CancelToken,
) -> Result<(EncodedCandidate, CompressionReason), CompressError> {
    let mut quality = INITIAL_QUALITY;
    let mut candidate = attempt(encoder, surface, output_mime, quality, cancel)?;

    while candidate.bytes.len() as u64 > target_bytes && quality > MIN_QUALITY + QUALITY_STEP {
        quality = (quality - QUALITY_STEP).max(MIN_QUALITY);
        candidate = attempt(encoder, surface, output_mime, quality, cancel)?;
    }

    let reason = if candidate.bytes.len() as u64 <= target_bytes {
        CompressionReason::Compressed
    } else {
        CompressionReason::SizeFloorReached
    };
    Ok((candidate, reason))
}

fn attempt(
    encoder: &impl SurfaceEncoder,
    surface: &DynamicImage,
    output_mime: &str,
    quality: f32,
    cancel: &CancelToken,
) -> Result<EncodedCandidate, CompressError> {
    if cancel.is_canceled() {
        return Err(CompressError::Canceled);
    }

    let bytes = encoder.encode(surface, output_mime, quality)?;
    if bytes.is_empty() {
        return Err(EncodeError("encoder produced no output".to_string()).into());
    }
    Ok(EncodedCandidate {
        bytes,
        quality_used: quality,
        mime_type: output_mime.to_string(),
    })
}
