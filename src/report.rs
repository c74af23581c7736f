//! Plain-text info report shown next to the animation.

use std::fmt::Write;
use std::path::Path;

use crate::error::MetadataError;
use crate::parser::{GifMetadata, MetadataExtractor};

/// Format parsed metadata as an indented text report.
pub fn format_report(meta: &GifMetadata) -> String {
    let mut out = String::from("=== Parsed GIF Information ===\n");

    for (section, entries) in &meta.headers {
        let _ = writeln!(out, "\n{}:", section);
        for (key, (value, description)) in entries {
            let _ = writeln!(out, "  {}: {} ({})", key, value, description);
        }
    }

    out.push_str("\n=== Frames Information ===\n");
    for (idx, frame) in meta.frames.iter().enumerate() {
        let _ = writeln!(out, "Frame {}:", idx + 1);
        for (key, value) in frame {
            let _ = writeln!(out, "  {}: {}", key, value);
        }
    }

    out
}

/// Text shown in place of the report when extraction fails.
pub fn error_report(err: &MetadataError) -> String {
    format!("Error parsing GIF info: {}", err)
}

/// Run `extractor` on `path` and format the outcome.
///
/// Extraction failures become an error report rather than an error.
pub fn build_report<M: MetadataExtractor + ?Sized>(extractor: &M, path: &Path) -> String {
    match extractor.extract(path) {
        Ok(meta) => format_report(&meta),
        Err(err) => {
            tracing::warn!("metadata extraction failed for {}: {}", path.display(), err);
            error_report(&err)
        }
    }
}
