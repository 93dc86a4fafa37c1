//! Leading-blank-line normalization.
//!
//! Completion endpoints often start their answer with a newline. Exactly one
//! leading empty line is dropped; everything after it is left untouched.

use std::path::Path;

use recast_core::{Error, Result};

/// `text` without its first line, if that line is empty.
pub fn strip_leading_blank_line(text: &str) -> &str {
    text.strip_prefix("\r\n")
        .or_else(|| text.strip_prefix('\n'))
        .unwrap_or(text)
}

/// Rewrite the file at `path` without its leading empty line.
///
/// Returns whether the file changed.
pub fn normalize_file(path: &Path) -> Result<bool> {
    let content = std::fs::read_to_string(path).map_err(|e| Error::filesystem(path, e))?;
    let stripped = strip_leading_blank_line(&content);
    if stripped.len() == content.len() {
        return Ok(false);
    }
    std::fs::write(path, stripped).map_err(|e| Error::filesystem(path, e))?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drops_exactly_one_empty_line() {
        assert_eq!(strip_leading_blank_line("\nline1\nline2"), "line1\nline2");
        assert_eq!(strip_leading_blank_line("\n\nline1"), "\nline1");
        assert_eq!(strip_leading_blank_line("\r\nline1"), "line1");
    }

    #[test]
    fn leaves_other_text_alone() {
        assert_eq!(strip_leading_blank_line("line1\n\nline2"), "line1\n\nline2");
        assert_eq!(strip_leading_blank_line("  \nline1"), "  \nline1");
        assert_eq!(strip_leading_blank_line(""), "");
    }

    #[test]
    fn normalizes_file_in_place() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.py");
        std::fs::write(&path, "\nline1\nline2").unwrap();

        assert!(normalize_file(&path).unwrap());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "line1\nline2");

        assert!(!normalize_file(&path).unwrap());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "line1\nline2");
    }

    #[test]
    fn missing_file_is_filesystem_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = normalize_file(&dir.path().join("absent.py")).unwrap_err();
        assert!(err.is_filesystem());
    }
}
