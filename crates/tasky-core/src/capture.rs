//! Collaborators consulted while building a new task.

use thiserror::Error;
use ulid::Ulid;

pub const DEFAULT_COMMENT_MARKER: &str = "#";

/// Seed text for interactive capture; every marker line is dropped afterwards.
pub const DESCRIPTION_TEMPLATE: &str =
    "\n# Write task description above this line\n# These lines will be removed\n";

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("Description capture IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("No editor found; set $EDITOR or `editor` in config")]
    EditorNotFound,
    #[error("Invalid editor command: {0}")]
    EditorCommand(String),
    #[error("Editor failed: {0}")]
    EditorFailed(String),
}

pub trait DescriptionCapture {
    /// Returns raw multi-line text, comment lines included.
    fn capture_text(&mut self) -> Result<String, CaptureError>;
}

pub trait BlobAllocator {
    fn new_blob_index(&mut self) -> String;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct UlidAllocator;

impl BlobAllocator for UlidAllocator {
    fn new_blob_index(&mut self) -> String {
        Ulid::new().to_string()
    }
}

/// Capture that always answers with the same text.
#[derive(Debug, Clone, Default)]
pub struct FixedCapture {
    text: String,
    calls: usize,
}

impl FixedCapture {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            calls: 0,
        }
    }

    pub fn calls(&self) -> usize {
        self.calls
    }
}

impl DescriptionCapture for FixedCapture {
    fn capture_text(&mut self) -> Result<String, CaptureError> {
        self.calls += 1;
        Ok(self.text.clone())
    }
}

/// Drops lines starting with `marker`. Blank lines between paragraphs are
/// kept; blank lines at either end are trimmed.
pub fn strip_comments(text: &str, marker: &str) -> String {
    let kept: Vec<&str> = text
        .lines()
        .filter(|line| marker.is_empty() || !line.starts_with(marker))
        .collect();
    kept.join("\n").trim_matches('\n').to_string()
}
