use std::path::Path;

use super::RagError;

const TEXT_EXTENSIONS: [&str; 4] = ["txt", "md", "markdown", "text"];

/// Read a plain text or Markdown document
pub fn load_document(path: impl AsRef<Path>) -> Result<String, RagError> {
    let path = path.as_ref();
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default();
    if !TEXT_EXTENSIONS.contains(&extension.as_str()) {
        return Err(RagError::UnsupportedFormat(path.to_path_buf()));
    }
    std::fs::read_to_string(path).map_err(|source| RagError::Io {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_text_and_reject_pdf() {
        let dir = tempfile::tempdir().unwrap();
        let notes = dir.path().join("notes.MD");
        std::fs::write(&notes, "# Notes\nChunk me.").unwrap();
        assert_eq!(load_document(&notes).unwrap(), "# Notes\nChunk me.");

        let pdf = dir.path().join("paper.pdf");
        std::fs::write(&pdf, b"%PDF-1.4").unwrap();
        assert!(matches!(load_document(&pdf), Err(RagError::UnsupportedFormat(_))));

        assert!(matches!(
            load_document(dir.path().join("missing.txt")),
            Err(RagError::Io { .. })
        ));
    }
}
