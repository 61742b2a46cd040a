use std::fs;
use std::io::Write;
use std::process::Command;

use tasky_core::capture::{CaptureError, DescriptionCapture, DESCRIPTION_TEMPLATE};
use tempfile::NamedTempFile;

const FALLBACK_EDITORS: [&str; 4] = ["nvim", "vim", "vi", "nano"];

/// Captures a description by opening the template in the user's editor.
#[derive(Debug, Clone, Default)]
pub struct EditorCapture {
    configured: Option<String>,
}

impl EditorCapture {
    pub fn new(configured: Option<String>) -> Self {
        Self { configured }
    }

    fn resolve_command(&self) -> Result<Vec<String>, CaptureError> {
        let raw = self
            .configured
            .clone()
            .or_else(|| std::env::var("VISUAL").ok())
            .or_else(|| std::env::var("EDITOR").ok())
            .filter(|value| !value.trim().is_empty());
        if let Some(raw) = raw {
            let parts =
                shell_words::split(&raw).map_err(|err| CaptureError::EditorCommand(err.to_string()))?;
            if parts.is_empty() {
                return Err(CaptureError::EditorCommand(raw));
            }
            return Ok(parts);
        }
        FALLBACK_EDITORS
            .iter()
            .find_map(|name| which::which(name).ok())
            .map(|path| vec![path.to_string_lossy().to_string()])
            .ok_or(CaptureError::EditorNotFound)
    }
}

impl DescriptionCapture for EditorCapture {
    fn capture_text(&mut self) -> Result<String, CaptureError> {
        let mut file = NamedTempFile::new()?;
        file.write_all(DESCRIPTION_TEMPLATE.as_bytes())?;
        file.flush()?;

        let parts = self.resolve_command()?;
        let (program, args) = parts
            .split_first()
            .ok_or(CaptureError::EditorNotFound)?;
        let status = Command::new(program)
            .args(args)
            .arg(file.path())
            .status()
            .map_err(|err| CaptureError::EditorFailed(format!("{program}: {err}")))?;
        if !status.success() {
            return Err(CaptureError::EditorFailed(format!(
                "{program} exited with {status}"
            )));
        }
        Ok(fs::read_to_string(file.path())?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configured_command_is_split_like_a_shell() {
        let capture = EditorCapture::new(Some("code --wait \"my dir\"".to_string()));
        assert_eq!(
            capture.resolve_command().expect("command"),
            vec!["code", "--wait", "my dir"]
        );
    }

    #[test]
    fn unbalanced_quotes_are_rejected() {
        let capture = EditorCapture::new(Some("vim \"oops".to_string()));
        assert!(matches!(
            capture.resolve_command(),
            Err(CaptureError::EditorCommand(_))
        ));
    }

    #[cfg(unix)]
    #[test]
    fn editor_that_leaves_file_alone_returns_template() {
        let mut capture = EditorCapture::new(Some("true".to_string()));
        assert_eq!(capture.capture_text().expect("capture"), DESCRIPTION_TEMPLATE);
    }

    #[cfg(unix)]
    #[test]
    fn failing_editor_is_an_error() {
        let mut capture = EditorCapture::new(Some("false".to_string()));
        assert!(matches!(
            capture.capture_text(),
            Err(CaptureError::EditorFailed(_))
        ));
    }
}
