//! MIME classification and mapping.
//!
//! The classifier is the first gate of the pipeline: anything whose declared
//! MIME type is not in the `image/` family is rejected before a single byte
//! is decoded. Running this check first avoids wasted decode work and keeps
//! decode-failure noise out of the picture for plainly non-image uploads.
//!
//! Also owns the two MIME-derived decisions the rest of the pipeline needs:
//!
//! - **Output format selection**: an explicit override wins; otherwise a
//!   source already in a quality-parameterized lossy format (JPEG, WebP)
//!   keeps its format, and everything else is re-encoded as JPEG.
//! - **File extension derivation**: the MIME subtype with any structured
//!   suffix stripped (`svg+xml` → `svg`), used when the packager renames the
//!   output file.

/// Default lossy output format for sources that aren't already lossy.
pub const MIME_JPEG: &str = "image/jpeg";
pub const MIME_WEBP: &str = "image/webp";
pub const MIME_PNG: &str = "image/png";

/// Whether a declared MIME type belongs to the image family.
///
/// This is a prefix check on the declared type only — it does not sniff
/// bytes. A mislabeled file that passes here will still fail cleanly in the
/// decoder.
pub fn is_image_mime(mime: &str) -> bool {
    mime.starts_with("image/")
}

/// Whether encoding to this MIME type accepts a variable quality parameter.
///
/// JPEG and WebP are the two formats with quality-parameterized lossy
/// encoders; only they can participate meaningfully in the quality search.
pub fn supports_lossy_quality(mime: &str) -> bool {
    mime.eq_ignore_ascii_case(MIME_JPEG) || mime.eq_ignore_ascii_case(MIME_WEBP)
}

/// Select the output MIME type for a compression call.
///
/// Priority: caller override → source format if lossy → JPEG.
pub fn select_output_mime(source_mime: &str, requested: Option<&str>) -> String {
    if let Some(mime) = requested {
        return mime.to_string();
    }
    if supports_lossy_quality(source_mime) {
        source_mime.to_string()
    } else {
        MIME_JPEG.to_string()
    }
}

/// Derive a file extension from a MIME type's subtype.
///
/// Structured-syntax suffixes and parameters are stripped:
/// - `image/svg+xml` → `svg`
/// - `image/webp; charset=binary` → `webp`
///
/// Falls back to `bin` when the type has no usable subtype.
pub fn extension_for_mime(mime: &str) -> String {
    let subtype = mime
        .split('/')
        .nth(1)
        .map(|s| s.split(';').next().unwrap_or(s).trim())
        .map(|s| s.split('+').next().unwrap_or(s))
        .unwrap_or("");

    if subtype.is_empty() {
        "bin".to_string()
    } else {
        subtype.to_ascii_lowercase()
    }
}

/// Map a file extension to a declared MIME type.
///
/// The library's classifier contract is declared-MIME-based (the browser
/// caller knows the type from its file input); the CLI only has a path, so
/// it derives the declaration from the extension. Unknown extensions map to
/// `application/octet-stream`, which the classifier rejects.
pub fn mime_for_extension(ext: &str) -> &'static str {
    match ext.to_ascii_lowercase().as_str() {
        "jpg" | "jpeg" => MIME_JPEG,
        "png" => MIME_PNG,
        "webp" => MIME_WEBP,
        "gif" => "image/gif",
        "bmp" => "image/bmp",
        "tif" | "tiff" => "image/tiff",
        "svg" => "image/svg+xml",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_family_accepted() {
        assert!(is_image_mime("image/jpeg"));
        assert!(is_image_mime("image/png"));
        assert!(is_image_mime("image/svg+xml"));
    }

    #[test]
    fn non_image_rejected() {
        assert!(!is_image_mime("text/plain"));
        assert!(!is_image_mime("application/pdf"));
        assert!(!is_image_mime("application/octet-stream"));
        assert!(!is_image_mime(""));
    }

    #[test]
    fn lossy_formats_are_jpeg_and_webp() {
        assert!(supports_lossy_quality("image/jpeg"));
        assert!(supports_lossy_quality("image/webp"));
        assert!(!supports_lossy_quality("image/png"));
        assert!(!supports_lossy_quality("image/gif"));
    }

    #[test]
    fn override_wins_output_selection() {
        assert_eq!(
            select_output_mime("image/jpeg", Some("image/webp")),
            "image/webp"
        );
        // Override is honored even for non-lossy targets
        assert_eq!(
            select_output_mime("image/jpeg", Some("image/png")),
            "image/png"
        );
    }

    #[test]
    fn lossy_source_keeps_format() {
        assert_eq!(select_output_mime("image/jpeg", None), "image/jpeg");
        assert_eq!(select_output_mime("image/webp", None), "image/webp");
    }

    #[test]
    fn non_lossy_source_forced_to_jpeg() {
        assert_eq!(select_output_mime("image/png", None), "image/jpeg");
        assert_eq!(select_output_mime("image/bmp", None), "image/jpeg");
    }

    #[test]
    fn extension_from_plain_subtype() {
        assert_eq!(extension_for_mime("image/jpeg"), "jpeg");
        assert_eq!(extension_for_mime("image/webp"), "webp");
    }

    #[test]
    fn extension_strips_structured_suffix() {
        assert_eq!(extension_for_mime("image/svg+xml"), "svg");
    }

    #[test]
    fn extension_strips_parameters() {
        assert_eq!(extension_for_mime("image/webp; charset=binary"), "webp");
    }

    #[test]
    fn extension_fallback_for_malformed_type() {
        assert_eq!(extension_for_mime("image"), "bin");
        assert_eq!(extension_for_mime("image/"), "bin");
    }

    #[test]
    fn extension_to_mime_roundtrip() {
        assert_eq!(mime_for_extension("JPG"), "image/jpeg");
        assert_eq!(mime_for_extension("jpeg"), "image/jpeg");
        assert_eq!(mime_for_extension("png"), "image/png");
        assert_eq!(mime_for_extension("txt"), "application/octet-stream");
    }
}
