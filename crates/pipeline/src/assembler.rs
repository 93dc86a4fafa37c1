//! Assembler: concatenates transformed chunks into the output file.

use std::path::Path;

use recast_core::{Error, Result, TransformedChunk};
use tracing::info;

use crate::normalize::normalize_file;

/// Write every `rewritten` text, in ascending index order and with no
/// separators, to `output_path` (overwriting it), then strip the file's
/// leading blank line.
pub fn assemble(chunks: &[TransformedChunk], output_path: &Path) -> Result<()> {
    let mut ordered: Vec<&TransformedChunk> = chunks.iter().collect();
    ordered.sort_by_key(|c| c.index);

    let content: String = ordered.iter().map(|c| c.rewritten.as_str()).collect();

    if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| Error::filesystem(parent, e))?;
    }
    std::fs::write(output_path, &content).map_err(|e| Error::filesystem(output_path, e))?;
    normalize_file(output_path)?;

    info!(
        path = %output_path.display(),
        chunks = ordered.len(),
        bytes = content.len(),
        "Output assembled"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transformed(index: usize, rewritten: &str) -> TransformedChunk {
        TransformedChunk {
            index,
            summary: String::new(),
            rewritten: rewritten.into(),
        }
    }

    #[test]
    fn concatenates_in_index_order() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out.py");
        let chunks = vec![transformed(1, "b()\n"), transformed(0, "a()\n")];

        assemble(&chunks, &out).unwrap();
        assert_eq!(std::fs::read_to_string(&out).unwrap(), "a()\nb()\n");
    }

    #[test]
    fn only_the_files_first_blank_line_is_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out.py");
        let chunks = vec![transformed(0, "\nline1\n"), transformed(1, "\nline2")];

        assemble(&chunks, &out).unwrap();
        assert_eq!(std::fs::read_to_string(&out).unwrap(), "line1\n\nline2");
    }

    #[test]
    fn overwrites_existing_output() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("nested").join("out.py");
        std::fs::create_dir_all(out.parent().unwrap()).unwrap();
        std::fs::write(&out, "stale content that is longer\n").unwrap();

        assemble(&[transformed(0, "fresh\n")], &out).unwrap();
        assert_eq!(std::fs::read_to_string(&out).unwrap(), "fresh\n");
    }
}
