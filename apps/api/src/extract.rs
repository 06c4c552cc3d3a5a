//! Text extraction for uploaded documents. Formats are recognized by filename
//! suffix; an unsupported suffix is a caller-visible validation error, while a
//! failed extraction of a supported format is a processing failure (no document
//! exists without text).

use std::io::{Cursor, Read};

use quick_xml::events::Event;

use crate::errors::AppError;

const SUPPORTED_EXTENSIONS: &[&str] = &[".pdf", ".docx", ".txt"];

pub fn is_supported(filename: &str) -> bool {
    let lower = filename.to_lowercase();
    SUPPORTED_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
}

pub fn extract_text(content: &[u8], filename: &str) -> Result<String, AppError> {
    let lower = filename.to_lowercase();
    if lower.ends_with(".pdf") {
        pdf_extract::extract_text_from_mem(content)
            .map_err(|e| AppError::Processing(format!("PDF extraction failed for {filename}: {e}")))
    } else if lower.ends_with(".docx") {
        extract_docx(content)
            .map_err(|e| AppError::Processing(format!("DOCX extraction failed for {filename}: {e}")))
    } else if lower.ends_with(".txt") {
        Ok(String::from_utf8_lossy(content).into_owned())
    } else {
        Err(AppError::Validation(
            "Invalid file type. Only PDF, DOCX, TXT allowed.".to_string(),
        ))
    }
}

/// A .docx is a zip archive; the document body lives in `word/document.xml`.
/// Text runs are concatenated and `w:p` paragraph ends become newlines.
fn extract_docx(content: &[u8]) -> anyhow::Result<String> {
    let mut archive = zip::ZipArchive::new(Cursor::new(content))?;
    let mut xml = String::new();
    archive
        .by_name("word/document.xml")?
        .read_to_string(&mut xml)?;

    let mut reader = quick_xml::Reader::from_str(&xml);
    let mut text = String::new();
    loop {
        match reader.read_event() {
            Ok(Event::Text(t)) => {
                if let Ok(s) = t.unescape() {
                    text.push_str(&s);
                }
            }
            Ok(Event::End(e)) if e.name().as_ref() == b"w:p" => text.push('\n'),
            Ok(Event::Eof) => break,
            Err(e) => return Err(e.into()),
            Ok(_) => {}
        }
    }
    Ok(text)
}
