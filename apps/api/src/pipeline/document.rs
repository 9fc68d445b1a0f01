//! Document Reader — plain text from an uploaded document.
//!
//! Only failing to open the file is fatal. A corrupt or unparseable rich
//! document degrades to a lossy text decode of its raw bytes.

use std::io::{self, Cursor, Read};
use std::path::Path;

use quick_xml::events::Event;
use quick_xml::Reader;
use thiserror::Error;
use tracing::{debug, warn};

use crate::pipeline::PipelineError;

const DOCX_BODY: &str = "word/document.xml";

#[derive(Debug, Error)]
enum RichTextError {
    #[error("archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("PDF error: {0}")]
    Pdf(String),
}

pub struct DocumentReader;

impl DocumentReader {
    /// Reads `path`, dispatching on its own extension.
    pub fn read_path(path: &Path) -> Result<String, PipelineError> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default();
        Self::read(path, extension)
    }

    /// Reads `path` as the format named by `declared_extension`.
    pub fn read(path: &Path, declared_extension: &str) -> Result<String, PipelineError> {
        let bytes = std::fs::read(path).map_err(|source| PipelineError::UnreadableDocument {
            path: path.to_path_buf(),
            source,
        })?;

        let extension = declared_extension.trim_start_matches('.').to_ascii_lowercase();
        let parsed = match extension.as_str() {
            "docx" => extract_docx(&bytes),
            "pdf" => extract_pdf(&bytes),
            _ => return Ok(decode_lossy(&bytes)),
        };

        match parsed {
            Ok(text) => {
                debug!("Extracted {} chars from .{extension} document", text.len());
                Ok(text)
            }
            Err(e) => {
                warn!(
                    "Could not parse {} as .{extension} ({e}), decoding raw bytes instead",
                    path.display()
                );
                Ok(decode_lossy(&bytes))
            }
        }
    }
}

fn decode_lossy(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

/// Paragraph text of a Word document, one paragraph per line.
fn extract_docx(bytes: &[u8]) -> Result<String, RichTextError> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))?;
    let mut xml = String::new();
    archive.by_name(DOCX_BODY)?.read_to_string(&mut xml)?;
    Ok(docx_paragraphs(&xml)?)
}

fn docx_paragraphs(xml: &str) -> Result<String, quick_xml::Error> {
    let mut reader = Reader::from_str(xml);
    let mut paragraphs = Vec::new();
    let mut current = String::new();
    let mut in_text = false;

    loop {
        match reader.read_event()? {
            Event::Start(e) if e.name().as_ref() == b"w:t" => in_text = true,
            Event::End(e) => match e.name().as_ref() {
                b"w:t" => in_text = false,
                b"w:p" => paragraphs.push(std::mem::take(&mut current)),
                _ => {}
            },
            Event::Empty(e) => match e.name().as_ref() {
                b"w:tab" => current.push('\t'),
                b"w:br" => current.push('\n'),
                b"w:p" => paragraphs.push(String::new()),
                _ => {}
            },
            Event::Text(t) if in_text => current.push_str(&t.unescape()?),
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(paragraphs.join("\n"))
}

/// Per-page text of a PDF, one page per line block.
fn extract_pdf(bytes: &[u8]) -> Result<String, RichTextError> {
    // pdf-extract panics on some malformed inputs
    let pages = std::panic::catch_unwind(|| pdf_extract::extract_text_from_mem_by_pages(bytes))
        .map_err(|_| RichTextError::Pdf("parser panicked".to_string()))?
        .map_err(|e| RichTextError::Pdf(e.to_string()))?;
    Ok(pages.join("\n"))
}
