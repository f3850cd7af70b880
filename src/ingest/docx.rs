//! DOCX text extraction
//! Walks document paragraphs and tables; table rows come out pipe-joined
//! so payroll tables remain readable as text

use std::path::Path;

use super::{IngestError, IngestResult};

/// Extract the text content of a DOCX file, one line per paragraph or
/// table row.
pub fn extract_text(path: &Path) -> IngestResult<String> {
    let bytes = std::fs::read(path)?;

    let doc = docx_rs::read_docx(&bytes).map_err(|e| classify_parse_error(path, &e))?;

    let mut lines: Vec<String> = Vec::new();
    for child in &doc.document.children {
        match child {
            docx_rs::DocumentChild::Paragraph(paragraph) => {
                let line = paragraph_text(paragraph);
                if !line.trim().is_empty() {
                    lines.push(line);
                }
            }
            docx_rs::DocumentChild::Table(table) => {
                lines.extend(table_rows(table));
            }
            _ => {}
        }
    }

    let text = lines.join("\n");
    if text.trim().is_empty() {
        return Err(IngestError::Empty(path.display().to_string()));
    }

    let word_count = text.split_whitespace().count();
    if word_count < 10 {
        tracing::warn!(
            "DOCX {} contains very little text ({} words), file may be truncated",
            path.display(),
            word_count
        );
    }

    Ok(text)
}

fn classify_parse_error(path: &Path, error: &impl std::fmt::Display) -> IngestError {
    let message = error.to_string().to_lowercase();

    if message.contains("password") || message.contains("encrypted") || message.contains("protected")
    {
        IngestError::Encrypted(path.display().to_string())
    } else {
        IngestError::Corrupted(format!("{}: {}", path.display(), error))
    }
}

fn paragraph_text(paragraph: &docx_rs::Paragraph) -> String {
    let mut text = String::new();

    for child in &paragraph.children {
        match child {
            docx_rs::ParagraphChild::Run(run) => push_run_text(run, &mut text),
            docx_rs::ParagraphChild::Hyperlink(link) => {
                for nested in &link.children {
                    if let docx_rs::ParagraphChild::Run(run) = nested {
                        push_run_text(run, &mut text);
                    }
                }
            }
            _ => {}
        }
    }

    text
}

fn push_run_text(run: &docx_rs::Run, text: &mut String) {
    for child in &run.children {
        match child {
            docx_rs::RunChild::Text(t) => text.push_str(&t.text),
            docx_rs::RunChild::Tab(_) => text.push('\t'),
            docx_rs::RunChild::Break(_) => text.push('\n'),
            _ => {}
        }
    }
}

fn table_rows(table: &docx_rs::Table) -> Vec<String> {
    let mut rows: Vec<String> = Vec::new();

    for row in &table.rows {
        let docx_rs::TableChild::TableRow(table_row) = row;

        let cells: Vec<String> = table_row
            .cells
            .iter()
            .map(|cell| {
                let docx_rs::TableRowChild::TableCell(table_cell) = cell;
                table_cell
                    .children
                    .iter()
                    .filter_map(|content| match content {
                        docx_rs::TableCellContent::Paragraph(p) => Some(paragraph_text(p)),
                        _ => None,
                    })
                    .collect::<Vec<_>>()
                    .join(" ")
                    .trim()
                    .to_string()
            })
            .collect();

        if cells.iter().any(|c| !c.is_empty()) {
            rows.push(cells.join(" | "));
        }
    }

    rows
}
