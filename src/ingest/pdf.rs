//! PDF text extraction via PDFium
//! Binds the system library, or the one named by PDFIUM_DYNAMIC_LIB_PATH

use std::path::Path;

use pdfium_render::prelude::*;

use super::{IngestError, IngestResult};

fn bind_pdfium() -> IngestResult<Pdfium> {
    let bindings = match std::env::var("PDFIUM_DYNAMIC_LIB_PATH") {
        Ok(dir) => Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(
            Path::new(&dir),
        )),
        Err(_) => Pdfium::bind_to_system_library(),
    }
    .map_err(|e| IngestError::PdfLibrary(e.to_string()))?;

    Ok(Pdfium::new(bindings))
}

/// Extract all page text from a PDF, pages separated by blank lines.
pub fn extract_text(path: &Path) -> IngestResult<String> {
    if !path.exists() {
        return Err(IngestError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            path.display().to_string(),
        )));
    }

    let pdfium = bind_pdfium()?;

    let document = pdfium
        .load_pdf_from_file(path, None)
        .map_err(|e| classify_open_error(path, &e))?;

    let mut pages_text: Vec<String> = Vec::new();
    for page in document.pages().iter() {
        match page.text() {
            Ok(text) => pages_text.push(text.all()),
            Err(e) => {
                tracing::warn!("Failed to read text from a page of {}: {}", path.display(), e);
            }
        }
    }

    let text = pages_text.join("\n\n");
    if text.trim().is_empty() {
        return Err(IngestError::Empty(path.display().to_string()));
    }

    tracing::debug!(
        "Extracted {} characters from {} PDF pages",
        text.len(),
        pages_text.len()
    );

    Ok(text)
}

/// Password-protected documents get their own category so callers can
/// report them distinctly from plain corruption.
fn classify_open_error(path: &Path, error: &PdfiumError) -> IngestError {
    let message = error.to_string();
    let lowered = message.to_lowercase();

    if lowered.contains("password") || lowered.contains("security") {
        IngestError::Encrypted(path.display().to_string())
    } else {
        IngestError::Corrupted(format!("{}: {}", path.display(), message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_is_io_error() {
        let result = extract_text(Path::new("/nonexistent/processo.pdf"));
        assert!(matches!(result, Err(IngestError::Io(_))));
    }
}
