//! Plain-text reading with legacy-encoding fallback
//! Older court archives are frequently Windows-1252, not UTF-8

use std::path::Path;

use super::{IngestError, IngestResult};

/// Read a text file as UTF-8, falling back to Windows-1252.
pub fn extract_text(path: &Path) -> IngestResult<String> {
    let bytes = std::fs::read(path)?;

    let text = match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(e) => {
            tracing::debug!(
                "{} is not valid UTF-8, decoding as Windows-1252",
                path.display()
            );
            let bytes = e.into_bytes();
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(&bytes);
            decoded.into_owned()
        }
    };

    if text.trim().is_empty() {
        return Err(IngestError::Empty(path.display().to_string()));
    }

    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reads_utf8() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("peticao.txt");
        std::fs::write(&path, "Ação trabalhista nº 123").unwrap();

        let text = extract_text(&path).unwrap();
        assert!(text.contains("Ação"));
    }

    #[test]
    fn test_decodes_windows_1252() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sentenca.txt");
        // "Ação" encoded as Windows-1252 (0xE7 = ç, 0xE3 = ã)
        std::fs::write(&path, b"A\xE7\xE3o trabalhista").unwrap();

        let text = extract_text(&path).unwrap();
        assert_eq!(text, "Ação trabalhista");
    }

    #[test]
    fn test_empty_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vazio.txt");
        std::fs::write(&path, "   \n  ").unwrap();

        let result = extract_text(&path);
        assert!(matches!(result, Err(IngestError::Empty(_))));
    }
}
