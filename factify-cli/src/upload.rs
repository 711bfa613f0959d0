use std::path::Path;

use anyhow::Context;
use factify_core::types::UploadFile;

/// Reads a file for upload, guessing its MIME type from the extension.
pub fn load(path: &Path) -> anyhow::Result<UploadFile> {
    let bytes =
        std::fs::read(path).with_context(|| format!("failed to read: {}", path.display()))?;
    anyhow::ensure!(!bytes.is_empty(), "file is empty: {}", path.display());

    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "upload".to_string());
    let mime_type = mime_guess::from_path(path)
        .first_or_octet_stream()
        .essence_str()
        .to_string();

    Ok(UploadFile {
        filename,
        mime_type,
        bytes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guesses_mime_from_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("article.pdf");
        std::fs::write(&path, b"%PDF-1.4").unwrap();

        let f = load(&path).unwrap();
        assert_eq!(f.filename, "article.pdf");
        assert_eq!(f.mime_type, "application/pdf");
        assert_eq!(f.bytes, b"%PDF-1.4");
    }

    #[test]
    fn unknown_extension_is_octet_stream() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blob.zzz");
        std::fs::write(&path, b"x").unwrap();
        assert_eq!(load(&path).unwrap().mime_type, "application/octet-stream");
    }

    #[test]
    fn empty_or_missing_files_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let empty = dir.path().join("empty.txt");
        std::fs::write(&empty, b"").unwrap();
        assert!(load(&empty).is_err());
        assert!(load(&dir.path().join("nope.txt")).is_err());
    }
}
