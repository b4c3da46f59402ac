//! EXIF orientation model and correction transforms.
//!
//! Phone cameras usually store pixels sensor-side-up and record how the
//! device was held in EXIF tag 0x0112 (Orientation). The tag takes one of 8
//! standard codes; codes 5–8 transpose the surface, so a corrected output
//! swaps width and height relative to the unrotated target.
//!
//! Whether correction runs at all is a configuration decision
//! ([`CompressionOptions::apply_orientation_correction`]). Most modern decode
//! layers already apply the tag automatically, and applying this transform on
//! top of an already-corrected surface double-rotates portrait images — the
//! default is therefore *off*, and a caller whose decode layer does not
//! auto-correct opts in explicitly.
//!
//! [`CompressionOptions::apply_orientation_correction`]: crate::compress::CompressionOptions

use image::DynamicImage;
use std::io::Cursor;

/// One of the 8 standard EXIF orientation codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    /// 1 — upright, no correction needed.
    Normal,
    /// 2 — mirrored horizontally.
    FlipHorizontal,
    /// 3 — rotated 180°.
    Rotate180,
    /// 4 — mirrored vertically.
    FlipVertical,
    /// 5 — mirrored then rotated 90° CW (transpose).
    Transpose,
    /// 6 — rotated 90° CW.
    Rotate90,
    /// 7 — mirrored then rotated 270° CW (transverse).
    Transverse,
    /// 8 — rotated 270° CW.
    Rotate270,
}

impl Orientation {
    /// Map a raw EXIF code to an orientation. Out-of-range codes (including
    /// the reserved 0) are treated as normal.
    pub fn from_exif_code(code: u32) -> Self {
        match code {
            2 => Self::FlipHorizontal,
            3 => Self::Rotate180,
            4 => Self::FlipVertical,
            5 => Self::Transpose,
            6 => Self::Rotate90,
            7 => Self::Transverse,
            8 => Self::Rotate270,
            _ => Self::Normal,
        }
    }

    /// Read the orientation tag from raw image bytes.
    ///
    /// Missing or unreadable EXIF data means no correction is pending, so
    /// this never fails — it degrades to [`Orientation::Normal`].
    pub fn read_from_bytes(bytes: &[u8]) -> Self {
        let mut cursor = Cursor::new(bytes);
        let Ok(reader) = exif::Reader::new().read_from_container(&mut cursor) else {
            return Self::Normal;
        };

        reader
            .get_field(exif::Tag::Orientation, exif::In::PRIMARY)
            .and_then(|field| field.value.get_uint(0))
            .map(Self::from_exif_code)
            .unwrap_or(Self::Normal)
    }

    /// Whether any correction is pending.
    pub fn is_normal(self) -> bool {
        self == Self::Normal
    }

    /// Codes 5–8 transpose the surface: the corrected output's width and
    /// height are swapped relative to the unrotated dimensions.
    pub fn swaps_dimensions(self) -> bool {
        matches!(
            self,
            Self::Transpose | Self::Rotate90 | Self::Transverse | Self::Rotate270
        )
    }

    /// Apply the correction to a decoded surface so it appears upright.
    pub fn apply(self, img: DynamicImage) -> DynamicImage {
        match self {
            Self::Normal => img,
            Self::FlipHorizontal => img.fliph(),
            Self::Rotate180 => img.rotate180(),
            Self::FlipVertical => img.flipv(),
            Self::Transpose => img.rotate90().fliph(),
            Self::Rotate90 => img.rotate90(),
            Self::Transverse => img.rotate270().fliph(),
            Self::Rotate270 => img.rotate270(),
        }
    }
}
