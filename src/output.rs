//! CLI output formatting and the batch report manifest.
//!
//! Each surface has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure — no I/O, no side effects.
//!
//! ```text
//! drill.jpg → drill-compressed.jpeg
//!     2.9 MB → 625.1 KB (image/jpeg, quality 0.74)
//!     1920x1440
//! receipt.txt: skipped (not-image), 4.2 KB
//! ```
//!
//! Batch runs additionally serialize a `report.json` manifest so other
//! tooling can consume the outcome per file.

use crate::compress::{CompressError, CompressionReason, CompressionResult};
use crate::planning::Dimensions;
use serde::Serialize;
use std::time::UNIX_EPOCH;

/// Outcome of one batch item, serialized into the report manifest.
#[derive(Debug, Serialize)]
pub struct ReportEntry {
    pub source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<CompressionReason>,
    pub original_size: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compressed_size: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<Dimensions>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quality: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified_at_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ReportEntry {
    pub fn from_result(source: impl Into<String>, result: &CompressionResult) -> Self {
        Self {
            source: source.into(),
            output: Some(result.filename.clone()),
            reason: Some(result.reason),
            original_size: result.original_size,
            compressed_size: Some(result.compressed_size),
            dimensions: result.dimensions,
            quality: result.quality_used,
            modified_at_ms: result
                .modified_at
                .duration_since(UNIX_EPOCH)
                .ok()
                .map(|d| d.as_millis() as u64),
            error: None,
        }
    }

    pub fn from_error(source: impl Into<String>, original_size: u64, error: &CompressError) -> Self {
        Self {
            source: source.into(),
            output: None,
            reason: None,
            original_size,
            compressed_size: None,
            dimensions: None,
            quality: None,
            modified_at_ms: None,
            error: Some(error.to_string()),
        }
    }

    pub fn failed(&self) -> bool {
        self.error.is_some()
    }
}

/// The batch report manifest: per-file entries plus tallies.
#[derive(Debug, Serialize)]
pub struct BatchReport {
    pub compressed: usize,
    pub skipped: usize,
    pub failed: usize,
    pub entries: Vec<ReportEntry>,
}

impl BatchReport {
    pub fn new(entries: Vec<ReportEntry>) -> Self {
        let failed = entries.iter().filter(|e| e.failed()).count();
        let skipped = entries
            .iter()
            .filter(|e| e.reason.is_some_and(|r| r.is_skip()))
            .count();
        let compressed = entries.len() - failed - skipped;
        Self {
            compressed,
            skipped,
            failed,
            entries,
        }
    }
}

/// Short label for a termination reason, matching the serialized form.
pub fn reason_label(reason: CompressionReason) -> &'static str {
    match reason {
        CompressionReason::NotImage => "not-image",
        CompressionReason::AlreadySmall => "already-small",
        CompressionReason::Compressed => "compressed",
        CompressionReason::SizeFloorReached => "size-floor-reached",
    }
}

/// Human-readable byte count (decimal units, one decimal place).
pub fn format_bytes(bytes: u64) -> String {
    if bytes < 1_000 {
        format!("{bytes} B")
    } else if bytes < 1_000_000 {
        format!("{:.1} KB", bytes as f64 / 1_000.0)
    } else {
        format!("{:.1} MB", bytes as f64 / 1_000_000.0)
    }
}

/// Format one compression outcome for the terminal.
pub fn format_result(source_name: &str, result: &CompressionResult) -> Vec<String> {
    if result.skipped {
        return vec![format!(
            "{}: skipped ({}), {}",
            source_name,
            reason_label(result.reason),
            format_bytes(result.original_size)
        )];
    }

    let mut lines = vec![format!("{} → {}", source_name, result.filename)];
    let quality = result
        .quality_used
        .map(|q| format!(", quality {q:.2}"))
        .unwrap_or_default();
    lines.push(format!(
        "    {} → {} ({}{})",
        format_bytes(result.original_size),
        format_bytes(result.compressed_size),
        result.mime_type,
        quality
    ));
    if let Some(dims) = result.dimensions {
        lines.push(format!("    {}x{}", dims.width, dims.height));
    }
    if result.reason == CompressionReason::SizeFloorReached {
        lines.push("    quality floor reached while still over budget".to_string());
    }
    lines
}

pub fn print_result(source_name: &str, result: &CompressionResult) {
    for line in format_result(source_name, result) {
        println!("{line}");
    }
}

/// Format the closing summary of a batch run.
pub fn format_batch_summary(report: &BatchReport) -> Vec<String> {
    vec![format!(
        "Compressed {}, skipped {}, failed {} ({} files)",
        report.compressed,
        report.skipped,
        report.failed,
        report.entries.len()
    )]
}

pub fn print_batch_summary(report: &BatchReport) {
    for line in format_batch_summary(report) {
        println!("{line}");
    }
}
