//! services/api/src/adapters/extract.rs
//!
//! Implements the `TextExtractor` port: per-MIME-type plain-text extraction
//! from uploaded bytes, ahead of keyword analysis.

use async_trait::async_trait;
use docvault_core::domain::ALLOWED_MIME_TYPES;
use docvault_core::ports::{PortError, PortResult, TextExtractor};
use tracing::debug;

const PDF_MIME: &str = ALLOWED_MIME_TYPES[0];
const DOCX_MIME: &str = ALLOWED_MIME_TYPES[1];

/// Extracts text with `lopdf` for PDFs and `docx-rs` for DOCX files.
/// Image types carry no text; they yield an empty string.
#[derive(Clone, Default)]
pub struct DocumentTextExtractor;

impl DocumentTextExtractor {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl TextExtractor for DocumentTextExtractor {
    async fn extract_text(&self, content: &[u8], mimetype: &str) -> PortResult<String> {
        let mimetype = mimetype.to_string();
        let content = content.to_vec();
        // Parsing is CPU-bound; keep it off the async workers.
        tokio::task::spawn_blocking(move || match mimetype.as_str() {
            PDF_MIME => extract_pdf_text(&content),
            DOCX_MIME => extract_docx_text(&content),
            _ => Ok(String::new()),
        })
        .await
        .map_err(|e| PortError::ExternalService(format!("extraction task failed: {}", e)))?
    }
}

/// Walks every page, first through last inclusive, concatenating each page's
/// text. A page that fails to decode is skipped rather than failing the
/// whole document.
fn extract_pdf_text(content: &[u8]) -> PortResult<String> {
    let doc = lopdf::Document::load_mem(content)
        .map_err(|e| PortError::Validation(format!("unreadable PDF: {}", e)))?;

    let mut text = String::new();
    for page_number in doc.get_pages().keys() {
        match doc.extract_text(&[*page_number]) {
            Ok(page_text) => text.push_str(&page_text),
            Err(e) => debug!("no text for PDF page {}: {}", page_number, e),
        }
    }
    Ok(text)
}

fn extract_docx_text(content: &[u8]) -> PortResult<String> {
    let doc = docx_rs::read_docx(content)
        .map_err(|e| PortError::Validation(format!("unreadable DOCX: {}", e)))?;

    let mut text = String::new();
    for child in doc.document.children {
        if let docx_rs::DocumentChild::Paragraph(paragraph) = child {
            for child in paragraph.children {
                if let docx_rs::ParagraphChild::Run(run) = child {
                    for child in run.children {
                        if let docx_rs::RunChild::Text(t) = child {
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
