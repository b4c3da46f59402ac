//! # snapfit
//!
//! Client-side image normalization: fit uploads into dimension and byte
//! budgets before they reach the network.
//!
//! An upload form accepts whatever the user picks — a 45 MB straight-off-
//! the-camera JPEG, a screenshot, a text file with a `.jpg` name. snapfit
//! deterministically turns that into a budget-compliant replacement (or a
//! clean refusal) through one bounded pipeline:
//!
//! ```text
//! classify → decode → skip-evaluate → plan dimensions
//!          → render (orientation-aware) → quality search → package
//! ```
//!
//! The caller hands over `{bytes, declared MIME, filename}` and gets back a
//! drop-in replacement of the same shape, plus why the pipeline stopped
//! (`compressed`, `already-small`, `not-image`, or `size-floor-reached`).
//! Nothing here touches the network or any server-side state.
//!
//! ```no_run
//! use snapfit::{CompressionOptions, SourceImage, compress};
//!
//! # fn main() -> Result<(), snapfit::CompressError> {
//! let source = SourceImage::new(std::fs::read("drill.jpg").unwrap(), "image/jpeg", "drill.jpg");
//! let result = compress(&source, &CompressionOptions::default())?;
//! assert!(result.compressed_size <= result.original_size || result.skipped);
//! # Ok(())
//! # }
//! ```
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`mime`] | image-family classifier, output format selection, MIME ↔ extension mapping |
//! | [`planning`] | pure dimension planning and skip evaluation (unit testable, no I/O) |
//! | [`orientation`] | the 8 EXIF orientation codes, tag reading, and correction transforms |
//! | [`encoder`] | the pluggable encode seam and the production JPEG/WebP/PNG encoder |
//! | [`compress`] | pipeline orchestration, options, result and error types, cancellation |
//! | [`naming`] | output filename derivation for the result packager |
//! | [`output`] | CLI report formatting and the batch report manifest |
//!
//! # Design Decisions
//!
//! ## Bounded Quality Search
//!
//! The search is a fixed linear sweep: encode at 0.82, step down by 0.08 to
//! a floor of 0.4 while over `target_bytes` — at most six encodes, never an
//! unbounded loop, even on adversarial input. Hitting the floor while still
//! over budget is a *successful* outcome (`size-floor-reached`): the byte
//! budget is soft, and degrading gracefully beats rejecting the upload. The
//! sweep sits behind a one-method trait
//! ([`encoder::SurfaceEncoder`]) so a different policy (e.g. a
//! binary search over quality) can be swapped in without touching the
//! pipeline.
//!
//! ## Orientation Is Opt-In
//!
//! Most decode layers already apply the EXIF Orientation tag; re-applying
//! it double-rotates portrait shots. The transform therefore hides behind
//! [`CompressionOptions::apply_orientation_correction`], default off, and a
//! pending correction is the one thing that forces a re-render of an
//! otherwise-in-budget image.
//!
//! ## Skip Before Work
//!
//! Classification (cheap string check) runs before decode; skip evaluation
//! (pure arithmetic) runs before render and encode. A 50 KB thumbnail or a
//! mislabeled text file never pays for an encode.
//!
//! ## Pure-Rust Imaging
//!
//! Decode, resize (Lanczos3), and JPEG/PNG encoding use the `image` crate;
//! lossy WebP uses libwebp via the `webp` crate. No ImageMagick, no system
//! binaries to install.

pub mod compress;
pub mod encoder;
pub mod mime;
pub mod naming;
pub mod orientation;
pub mod output;
pub mod planning;

pub use compress::{
    CancelToken, CompressError, CompressionOptions, CompressionReason, CompressionResult,
    EncodedCandidate, SourceImage, compress, compress_with_encoder,
};
pub use encoder::{RasterEncoder, SurfaceEncoder};
pub use orientation::Orientation;
pub use planning::Dimensions;
