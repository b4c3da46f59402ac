//! Pure calculation functions for dimension planning and skip evaluation.
//!
//! All functions here are pure and testable without any I/O or images.

use serde::Serialize;

/// Width/height pair for a decoded or planned surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// The larger of width and height — the single scalar bounded by
    /// `max_dimension`.
    pub fn longest_edge(self) -> u32 {
        self.width.max(self.height)
    }

    /// Swap width and height (orientation codes 5–8 transpose the surface).
    pub fn swapped(self) -> Self {
        Self {
            width: self.height,
            height: self.width,
        }
    }
}

/// Compute target dimensions for a re-render, preserving aspect ratio.
///
/// When the longest edge exceeds `max_dimension` the image is scaled down so
/// that edge lands exactly on the limit. When it is already within bounds the
/// scale is exactly 1 — an image is never upscaled, even when something else
/// (e.g. a pending orientation correction) forces a re-render.
///
/// Each target dimension is rounded and clamped to a minimum of 1 pixel, so
/// extreme aspect ratios cannot round a dimension down to zero.
///
/// # Examples
/// ```
/// # use snapfit::planning::{Dimensions, plan_dimensions};
/// // 4000x3000 bounded at 1920 → 1920x1440
/// let planned = plan_dimensions(Dimensions::new(4000, 3000), 1920);
/// assert_eq!(planned, Dimensions::new(1920, 1440));
///
/// // Already within bounds → unchanged
/// let planned = plan_dimensions(Dimensions::new(500, 500), 1920);
/// assert_eq!(planned, Dimensions::new(500, 500));
/// ```
pub fn plan_dimensions(natural: Dimensions, max_dimension: u32) -> Dimensions {
    let longest = natural.longest_edge();
    if longest <= max_dimension {
        return natural;
    }

    let scale = max_dimension as f64 / longest as f64;
    Dimensions {
        width: ((natural.width as f64 * scale).round() as u32).max(1),
        height: ((natural.height as f64 * scale).round() as u32).max(1),
    }
}

/// Decide whether compression can be skipped entirely.
///
/// Skip requires all three to hold: the longest edge is within
/// `max_dimension`, the original payload is at or under `skip_below_bytes`,
/// and no orientation correction is pending. Encoding is the expensive step,
/// so this runs before any render/encode work.
pub fn should_skip(
    natural: Dimensions,
    original_size: u64,
    max_dimension: u32,
    skip_below_bytes: u64,
    orientation_pending: bool,
) -> bool {
    natural.longest_edge() <= max_dimension
        && original_size <= skip_below_bytes
        && !orientation_pending
}

#[cfg(test)]
mod tests {
    use super::*;

    // =========================================================================
    // plan_dimensions tests
    // =========================================================================

    #[test]
    fn downscales_landscape_to_limit() {
        // 4000x3000 at max 1920 → 1920x1440
        let planned = plan_dimensions(Dimensions::new(4000, 3000), 1920);
        assert_eq!(planned, Dimensions::new(1920, 1440));
    }

    #[test]
    fn downscales_portrait_to_limit() {
        // 3000x4000 at max 1920 → 1440x1920
        let planned = plan_dimensions(Dimensions::new(3000, 4000), 1920);
        assert_eq!(planned, Dimensions::new(1440, 1920));
    }

    #[test]
    fn within_bounds_never_upscales() {
        // The in-bounds branch is scale = 1, not max(1, longest/max) —
        // a small image stays at its natural size
        let planned = plan_dimensions(Dimensions::new(500, 500), 1920);
        assert_eq!(planned, Dimensions::new(500, 500));
    }

    #[test]
    fn exactly_at_limit_unchanged() {
        let planned = plan_dimensions(Dimensions::new(1920, 1080), 1920);
        assert_eq!(planned, Dimensions::new(1920, 1080));
    }

    #[test]
    fn one_pixel_over_limit_scales() {
        let planned = plan_dimensions(Dimensions::new(1921, 1080), 1920);
        assert_eq!(planned.width, 1920);
        // 1080 * 1920/1921 = 1079.44 → 1079
        assert_eq!(planned.height, 1079);
    }

    #[test]
    fn extreme_aspect_clamps_to_one_pixel() {
        // 100000x2 at max 1000: height would round to 0 without the clamp
        let planned = plan_dimensions(Dimensions::new(100_000, 2), 1000);
        assert_eq!(planned.width, 1000);
        assert_eq!(planned.height, 1);
    }

    #[test]
    fn aspect_ratio_preserved_within_rounding() {
        let natural = Dimensions::new(3872, 2592);
        let planned = plan_dimensions(natural, 1920);
        let natural_aspect = natural.width as f64 / natural.height as f64;
        let planned_aspect = planned.width as f64 / planned.height as f64;
        assert!((natural_aspect - planned_aspect).abs() < 0.01);
        assert_eq!(planned.longest_edge(), 1920);
    }

    #[test]
    fn longest_edge_picks_larger() {
        assert_eq!(Dimensions::new(1920, 1080).longest_edge(), 1920);
        assert_eq!(Dimensions::new(1080, 1920).longest_edge(), 1920);
        assert_eq!(Dimensions::new(512, 512).longest_edge(), 512);
    }

    #[test]
    fn swapped_exchanges_components() {
        assert_eq!(
            Dimensions::new(1920, 1080).swapped(),
            Dimensions::new(1080, 1920)
        );
    }

    // =========================================================================
    // should_skip tests
    // =========================================================================

    #[test]
    fn skips_small_in_bounds_image() {
        assert!(should_skip(
            Dimensions::new(500, 500),
            50_000,
            1920,
            500_000,
            false
        ));
    }

    #[test]
    fn no_skip_when_over_dimension_limit() {
        assert!(!should_skip(
            Dimensions::new(4000, 3000),
            50_000,
            1920,
            500_000,
            false
        ));
    }

    #[test]
    fn no_skip_when_over_byte_threshold() {
        assert!(!should_skip(
            Dimensions::new(500, 500),
            600_000,
            1920,
            500_000,
            false
        ));
    }

    #[test]
    fn no_skip_when_orientation_pending() {
        // Orientation correction alone forces a re-render even when
        // dimensions and size are already within budget
        assert!(!should_skip(
            Dimensions::new(500, 500),
            50_000,
            1920,
            500_000,
            true
        ));
    }

    #[test]
    fn boundary_values_still_skip() {
        // Both checks are inclusive
        assert!(should_skip(
            Dimensions::new(1920, 1080),
            500_000,
            1920,
            500_000,
            false
        ));
    }
}
