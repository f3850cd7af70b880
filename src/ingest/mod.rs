//! Document ingestion adapters
//! Thin text-extraction wrappers around PDF, DOCX and plain-text files,
//! with distinguishable errors for unreadable, corrupted, empty and
//! password-protected inputs

pub mod docx;
pub mod pdf;
pub mod text;

use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Unsupported file type: {0}")]
    Unsupported(String),
    #[error("Document is password-protected: {0}")]
    Encrypted(String),
    #[error("Document is corrupted or invalid: {0}")]
    Corrupted(String),
    #[error("Document contains no extractable text: {0}")]
    Empty(String),
    #[error("PDF library unavailable: {0}")]
    PdfLibrary(String),
}

pub type IngestResult<T> = Result<T, IngestError>;

/// Extract the full text of a case document, dispatching on extension.
pub fn read_document(path: &Path) -> IngestResult<String> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default();

    match extension.as_str() {
        "pdf" => pdf::extract_text(path),
        "docx" => docx::extract_text(path),
        "txt" => text::extract_text(path),
        other => Err(IngestError::Unsupported(if other.is_empty() {
            path.display().to_string()
        } else {
            other.to_string()
        })),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_extension() {
        let result = read_document(Path::new("/tmp/arquivo.xlsx"));
        assert!(matches!(result, Err(IngestError::Unsupported(ext)) if ext == "xlsx"));
    }

    #[test]
    fn test_no_extension() {
        let result = read_document(Path::new("/tmp/arquivo"));
        assert!(matches!(result, Err(IngestError::Unsupported(_))));
    }

    #[test]
    fn test_missing_txt_file_is_io_error() {
        let result = read_document(Path::new("/nonexistent/arquivo.txt"));
        assert!(matches!(result, Err(IngestError::Io(_))));
    }
}
