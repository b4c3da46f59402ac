use clap::{Parser, Subcommand};
use rayon::prelude::*;
use snapfit::compress::{
    DEFAULT_MAX_DIMENSION, DEFAULT_SKIP_BELOW_BYTES, DEFAULT_TARGET_BYTES,
};
use snapfit::output::{BatchReport, ReportEntry};
use snapfit::{CompressionOptions, SourceImage, compress, mime, output};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Shared budget flags for commands that compress images.
#[derive(clap::Args, Clone)]
struct BudgetArgs {
    /// Upper bound on the longest edge, in pixels
    #[arg(long, default_value_t = DEFAULT_MAX_DIMENSION)]
    max_dimension: u32,

    /// Soft byte budget the quality search tries to reach
    #[arg(long, default_value_t = DEFAULT_TARGET_BYTES)]
    target_bytes: u64,

    /// Skip compression entirely for in-bounds images at or under this size
    #[arg(long, default_value_t = DEFAULT_SKIP_BELOW_BYTES)]
    skip_below_bytes: u64,

    /// Force the output format (e.g. image/webp) instead of deriving it
    /// from the source type
    #[arg(long)]
    output_mime: Option<String>,

    /// Re-apply the EXIF orientation tag when rendering. Only for decode
    /// layers that don't auto-correct — enabling it on top of one that does
    /// double-rotates portrait images
    #[arg(long)]
    orientation_correction: bool,
}

impl BudgetArgs {
    fn to_options(&self) -> CompressionOptions {
        CompressionOptions {
            max_dimension: self.max_dimension,
            target_bytes: self.target_bytes,
            skip_below_bytes: self.skip_below_bytes,
            output_mime_type: self.output_mime.clone(),
            apply_orientation_correction: self.orientation_correction,
        }
    }
}

#[derive(Parser)]
#[command(name = "snapfit")]
#[command(about = "Fit images into dimension and byte budgets before upload")]
#[command(long_about = "\
Fit images into dimension and byte budgets before upload

Takes arbitrary files and produces budget-compliant replacements: images over
the dimension limit are downscaled (longest edge capped, aspect preserved),
then re-encoded at decreasing quality until the byte budget is met or the
quality floor (0.4) is reached. Small, in-bounds images pass through
untouched; non-image files are returned as-is and flagged.

Defaults: longest edge 1920 px, target 800 KB, skip-below 500 KB.")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Compress a single file
    Compress {
        /// Input image
        input: PathBuf,

        /// Output path (default: next to the input, with the derived name)
        #[arg(long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        budget: BudgetArgs,
    },
    /// Compress every file under a directory, writing a report manifest
    Batch {
        /// Directory to walk for input files
        input_dir: PathBuf,

        /// Directory for compressed outputs and report.json
        #[arg(long, default_value = "compressed")]
        output_dir: PathBuf,

        #[command(flatten)]
        budget: BudgetArgs,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Command::Compress {
            input,
            output,
            budget,
        } => {
            let source = read_source(&input)?;
            let result = compress(&source, &budget.to_options())?;
            let out_path = output.unwrap_or_else(|| input.with_file_name(&result.filename));
            std::fs::write(&out_path, &result.bytes)?;
            output::print_result(&source.filename, &result);
        }
        Command::Batch {
            input_dir,
            output_dir,
            budget,
        } => {
            std::fs::create_dir_all(&output_dir)?;
            let options = budget.to_options();

            let files: Vec<PathBuf> = WalkDir::new(&input_dir)
                .sort_by_file_name()
                .into_iter()
                .filter_map(|entry| entry.ok())
                .filter(|entry| entry.file_type().is_file())
                .map(|entry| entry.into_path())
                .collect();

            // Calls are independent — no coordination needed across files
            let outcomes: Vec<(ReportEntry, Vec<String>)> = files
                .par_iter()
                .map(|path| batch_one(path, &input_dir, &output_dir, &options))
                .collect();

            let mut entries = Vec::with_capacity(outcomes.len());
            for (entry, lines) in outcomes {
                for line in lines {
                    println!("{line}");
                }
                entries.push(entry);
            }

            let report = BatchReport::new(entries);
            let json = serde_json::to_string_pretty(&report)?;
            std::fs::write(output_dir.join("report.json"), json)?;
            output::print_batch_summary(&report);
        }
    }

    Ok(())
}

/// Read a file into a SourceImage, deriving the declared MIME type from the
/// extension (unknown extensions become octet-stream, which the classifier
/// rejects).
fn read_source(path: &Path) -> std::io::Result<SourceImage> {
    let bytes = std::fs::read(path)?;
    let filename = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("upload")
        .to_string();
    let ext = path.extension().and_then(|ext| ext.to_str()).unwrap_or("");
    Ok(SourceImage::new(bytes, mime::mime_for_extension(ext), filename))
}

/// Compress one batch item. Failures become report entries, not an aborted
/// run.
fn batch_one(
    path: &Path,
    input_dir: &Path,
    output_dir: &Path,
    options: &CompressionOptions,
) -> (ReportEntry, Vec<String>) {
    let display = path
        .strip_prefix(input_dir)
        .unwrap_or(path)
        .display()
        .to_string();

    let source = match read_source(path) {
        Ok(source) => source,
        Err(e) => {
            let entry = ReportEntry {
                source: display.clone(),
                output: None,
                reason: None,
                original_size: 0,
                compressed_size: None,
                dimensions: None,
                quality: None,
                modified_at_ms: None,
                error: Some(format!("read failed: {e}")),
            };
            return (entry, vec![format!("{display}: read failed: {e}")]);
        }
    };

    match compress(&source, options) {
        Ok(result) => {
            // Mirror the input's subdirectory under output_dir: two inputs
            // both named photo.jpg in different directories must not clobber
            // each other's output
            let relative_dir = Path::new(&display)
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .map(Path::to_path_buf);
            let dest_dir = match &relative_dir {
                Some(parent) => output_dir.join(parent),
                None => output_dir.to_path_buf(),
            };
            let relative_output = match &relative_dir {
                Some(parent) => parent.join(&result.filename).display().to_string(),
                None => result.filename.clone(),
            };
            let written = std::fs::create_dir_all(&dest_dir)
                .and_then(|_| std::fs::write(dest_dir.join(&result.filename), &result.bytes));
            if let Err(e) = written {
                let entry = ReportEntry {
                    source: display.clone(),
                    output: Some(relative_output),
                    reason: Some(result.reason),
                    original_size: result.original_size,
                    compressed_size: Some(result.compressed_size),
                    dimensions: result.dimensions,
                    quality: result.quality_used,
                    modified_at_ms: None,
                    error: Some(format!("write failed: {e}")),
                };
                return (entry, vec![format!("{display}: write failed: {e}")]);
            }
            let lines = output::format_result(&display, &result);
            let mut entry = ReportEntry::from_result(display, &result);
            entry.output = Some(relative_output);
            (entry, lines)
        }
        Err(e) => {
            let lines = vec![format!("{display}: failed: {e}")];
            (
                ReportEntry::from_error(display, source.byte_size(), &e),
                lines,
            )
        }
    }
}
