//! Turn the final model response into a report document and deliver it.

use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::{info, warn};

use crate::error::ReportError;
use crate::gemini::GenerateContentResponse;

use super::extract::extract_text;

pub const NO_ACTIVITY_REPORT: &str = "# Activity Report\n\nNo activity found in the provided logs.\n";
pub const NO_RESPONSE_REPORT: &str = "# Activity Report\n\nNo response generated by AI.\n";
pub const EXTRACTION_FAILED_REPORT: &str =
    "# Activity Report\n\nError: Could not extract text content from AI response.\n";

/// How the report content was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportKind {
    /// Text produced by the model.
    Generated,
    NoActivity,
    NoResponse,
    ExtractionFailed,
}

impl ReportKind {
    pub fn is_placeholder(self) -> bool {
        self != ReportKind::Generated
    }
}

/// A finished report document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub content: String,
    pub kind: ReportKind,
    /// Where the report was written, if a destination was given.
    pub path: Option<PathBuf>,
}

/// Pick the document for a final response, substituting a placeholder when
/// nothing usable came back.
pub fn resolve_content(response: Option<&GenerateContentResponse>) -> (String, ReportKind) {
    let Some(response) = response else {
        warn!("No response received for the final prompt");
        return (NO_RESPONSE_REPORT.to_string(), ReportKind::NoResponse);
    };

    let text = extract_text(Some(response));
    if text.is_empty() {
        warn!("Final response contained no text parts");
        return (
            EXTRACTION_FAILED_REPORT.to_string(),
            ReportKind::ExtractionFailed,
        );
    }

    (text, ReportKind::Generated)
}

/// Write `content` to `destination` when one is given, otherwise hand it back.
pub fn finalize(
    content: String,
    kind: ReportKind,
    destination: Option<&Path>,
) -> Result<Report, ReportError> {
    let Some(destination) = destination else {
        return Ok(Report {
            content,
            kind,
            path: None,
        });
    };

    write_atomic(destination, &content)?;
    info!("Report written to {}", destination.display());

    Ok(Report {
        content,
        kind,
        path: Some(destination.to_path_buf()),
    })
}

/// Replace `path` with `content` in one step. On failure the previous file,
/// if any, is left as it was.
pub fn write_atomic(path: &Path, content: &str) -> Result<(), ReportError> {
    let write_error = |source: std::io::Error| ReportError::Write {
        path: path.to_path_buf(),
        source,
    };

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut file = NamedTempFile::new_in(dir).map_err(write_error)?;
    file.write_all(content.as_bytes()).map_err(write_error)?;
    file.as_file().sync_all().map_err(write_error)?;
    file.persist(path).map_err(|e| write_error(e.error))?;

    Ok(())
}
