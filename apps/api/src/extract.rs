//! Text extraction from uploaded resume documents (PDF and DOCX).

use std::path::Path;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Could not read the document: {0}")]
    Unreadable(String),

    #[error(
        "Could not extract text from resume. The file may be a scanned or image-only \
         document; export a text-based version and try again."
    )]
    Empty,
}

/// Supported upload formats, selected by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Pdf,
    Docx,
}

impl SourceFormat {
    pub fn from_filename(filename: &str) -> Option<Self> {
        match file_extension(filename)?.as_str() {
            "pdf" => Some(SourceFormat::Pdf),
            "docx" => Some(SourceFormat::Docx),
            _ => None,
        }
    }

    pub fn mime(&self) -> &'static str {
        match self {
            SourceFormat::Pdf => "application/pdf",
            SourceFormat::Docx => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
        }
    }
}

/// Lowercased extension of a filename, without the dot.
pub fn file_extension(filename: &str) -> Option<String> {
    Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_lowercase)
}

/// Extracts plain text from the document at `path`.
///
/// Fails with `Unreadable` when the document cannot be parsed and with the
/// distinct `Empty` condition when parsing succeeds but yields no text
/// (common with scanned PDFs). No retry; a failure here is terminal for the
/// request.
pub fn extract_text(path: &Path, format: SourceFormat) -> Result<String, ExtractError> {
    let bytes = std::fs::read(path).map_err(|e| ExtractError::Unreadable(e.to_string()))?;

    let text = match format {
        SourceFormat::Pdf => pdf_extract::extract_text_from_mem(&bytes)
            .map_err(|e| ExtractError::Unreadable(e.to_string()))?,
        SourceFormat::Docx => docx_text(&bytes)?,
    };

    let text = text.trim();
    if text.is_empty() {
        return Err(ExtractError::Empty);
    }
    Ok(text.to_string())
}

/// Collects the text runs of every paragraph in a DOCX body, one paragraph
/// per line.
fn docx_text(bytes: &[u8]) -> Result<String, ExtractError> {
    let docx = docx_rs::read_docx(bytes).map_err(|e| ExtractError::Unreadable(e.to_string()))?;

    let mut text = String::new();
    for child in docx.document.children {
        if let docx_rs::DocumentChild::Paragraph(paragraph) = child {
            for paragraph_child in paragraph.children {
                if let docx_rs::ParagraphChild::Run(run) = paragraph_child {
                    for run_child in run.children {
                        if let docx_rs::RunChild::Text(t) = run_child {
                            text.push_str(&t.text);
                        }
                    }
                }
            }
            text.push('\n');
        }
    }
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::io::{Cursor, Write};

    use docx_rs::{Docx, Paragraph, Run};
    use tempfile::NamedTempFile;

    fn docx_fixture(lines: &[&str]) -> Vec<u8> {
        let mut docx = Docx::new();
        for line in lines {
            docx = docx.add_paragraph(Paragraph::new().add_run(Run::new().add_text(*line)));
        }
        let mut cursor = Cursor::new(Vec::new());
        docx.build().pack(&mut cursor).unwrap();
        cursor.into_inner()
    }

    fn write_temp(bytes: &[u8]) -> NamedTempFile {
        let mut temp = NamedTempFile::new().unwrap();
        temp.write_all(bytes).unwrap();
        temp.flush().unwrap();
        temp
    }

    #[test]
    fn test_format_from_pdf_extension() {
        assert_eq!(
            SourceFormat::from_filename("resume.pdf"),
            Some(SourceFormat::Pdf)
        );
        assert_eq!(
            SourceFormat::from_filename("RESUME.PDF"),
            Some(SourceFormat::Pdf)
        );
    }

    #[test]
    fn test_format_from_docx_extension() {
        assert_eq!(
            SourceFormat::from_filename("resume.docx"),
            Some(SourceFormat::Docx)
        );
    }

    #[test]
    fn test_format_rejects_other_extensions() {
        assert_eq!(SourceFormat::from_filename("resume.txt"), None);
        assert_eq!(SourceFormat::from_filename("resume.doc"), None);
        assert_eq!(SourceFormat::from_filename("resume"), None);
    }

    #[test]
    fn test_file_extension_uses_last_dot() {
        assert_eq!(file_extension("a.b.pdf"), Some("pdf".to_string()));
        assert_eq!(file_extension("noext"), None);
    }

    #[test]
    fn test_docx_extraction_contains_expected_text() {
        let bytes = docx_fixture(&[
            "Jane Doe — Senior Engineer",
            "Reduced latency by 40% through caching",
        ]);
        let temp = write_temp(&bytes);

        let text = extract_text(temp.path(), SourceFormat::Docx).unwrap();
        assert!(text.contains("Jane Doe"));
        assert!(text.contains("Reduced latency by 40%"));
    }

    #[test]
    fn test_docx_paragraphs_are_separate_lines() {
        let bytes = docx_fixture(&["first", "second"]);
        let temp = write_temp(&bytes);

        let text = extract_text(temp.path(), SourceFormat::Docx).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines, vec!["first", "second"]);
    }

    #[test]
    fn test_docx_without_text_is_empty_error() {
        let bytes = docx_fixture(&[]);
        let temp = write_temp(&bytes);

        let err = extract_text(temp.path(), SourceFormat::Docx).unwrap_err();
        assert!(matches!(err, ExtractError::Empty));
    }

    #[test]
    fn test_garbage_pdf_is_unreadable() {
        let temp = write_temp(b"not a pdf at all");
        let err = extract_text(temp.path(), SourceFormat::Pdf).unwrap_err();
        assert!(matches!(err, ExtractError::Unreadable(_)));
    }

    #[test]
    fn test_empty_and_unreadable_messages_are_distinct() {
        let empty = ExtractError::Empty.to_string();
        let unreadable = ExtractError::Unreadable("boom".to_string()).to_string();
        assert_ne!(empty, unreadable);
        assert!(empty.contains("scanned"));
    }
}
