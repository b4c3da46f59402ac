//! Output filename derivation for the result packager.
//!
//! The compressed replacement keeps the upload's base name, gains a fixed
//! `-compressed` suffix, and takes its extension from the *output* MIME
//! subtype — the original extension is stripped, since the search may have
//! re-encoded to a different format (`photo.png` → `photo-compressed.jpeg`).

use crate::mime::extension_for_mime;

/// Fixed suffix appended to the base name of every packaged output.
pub const COMPRESSED_SUFFIX: &str = "-compressed";

/// Derive the output filename from the original name and the output MIME.
///
/// Only the last extension is stripped; a leading dot is part of the name
/// (`.hidden` has no extension). An empty input name falls back to `upload`.
pub fn output_filename(original: &str, output_mime: &str) -> String {
    let stem = file_stem(original);
    let stem = if stem.is_empty() { "upload" } else { stem };
    format!(
        "{stem}{COMPRESSED_SUFFIX}.{}",
        extension_for_mime(output_mime)
    )
}

/// The name up to (not including) the last `.`, when that dot isn't the
/// first character.
fn file_stem(name: &str) -> &str {
    match name.rfind('.') {
        Some(pos) if pos > 0 => &name[..pos],
        _ => name,
    }
}
